//! The memory layout shared by the voxel builder, the flattened buffer and any device kernel that
//! reads the buffer. Keep every offset computation in this module.

use super::Cell;

/// The deepest supported subdivision, i.e., grids have at most `2^MAX_DEPTH` cells per axis.
pub const MAX_DEPTH: u32 = 8;

/// Returns the number of cells along each axis of a grid with the given subdivision depth.
#[inline]
pub fn side_for_depth(depth: u32) -> usize {
    debug_assert!(depth <= MAX_DEPTH);

    1 << depth
}

/// Returns the subdivision depth of a grid with the given number of cells per axis, or None if
/// no supported depth yields that side.
pub fn depth_for_side(side: usize) -> Option<u32> {
    if side.is_power_of_two() && side.trailing_zeros() <= MAX_DEPTH {
        Some(side.trailing_zeros())
    } else {
        None
    }
}

/// Returns the linear index of the cell, i.e., `x * side² + y * side + z`.
///
/// # Arguments
/// * `cell` - The coordinates of the cell.
/// * `side` - The number of cells along each axis.
#[inline]
pub fn flat_index(cell: Cell, side: usize) -> usize {
    let [x, y, z] = cell;
    debug_assert!(x < side && y < side && z < side);

    (x * side + y) * side + z
}

/// Inverse of [`flat_index`].
#[inline]
pub fn cell_of(index: usize, side: usize) -> Cell {
    [index / (side * side), (index / side) % side, index % side]
}

/// Returns the number of cells of a grid, which is also the length of the offset table at the
/// start of a flattened buffer.
#[inline]
pub fn num_cells(side: usize) -> usize {
    side * side * side
}
