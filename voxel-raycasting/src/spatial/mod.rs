//! Spatial indices for fast raycasting.
//!
//! The scene is sorted into a uniform voxel grid built by recursive octree subdivision. The grid
//! exists in two layouts: [`VoxelGrid`] with one list per cell, and [`FlattenedVoxels`] with all
//! lists packed into a single buffer as uploaded to compute devices. Both implement
//! [`VoxelStorage`], so the same traversal runs over either of them.

mod flatten;
pub mod layout;
mod octree;
mod traversal;

pub use flatten::*;
pub use octree::*;
pub use traversal::*;

use nalgebra_glm::Vec3;

use crate::math::AABB;

/// The integer coordinates of a voxel in the grid.
pub type Cell = [usize; 3];

/// Read access to a uniform voxel grid that maps each cell to the triangles overlapping it.
pub trait VoxelStorage {
    /// Returns the bounding volume covered by the grid.
    fn aabb(&self) -> &AABB;

    /// Returns the number of cells along each axis.
    fn side(&self) -> usize;

    /// Returns the indices of the triangles overlapping the given cell.
    ///
    /// # Arguments
    /// * `cell` - The coordinates of the cell, each in 0..side.
    fn voxel(&self, cell: Cell) -> &[u32];

    /// Returns the size of a single voxel.
    fn voxel_dims(&self) -> Vec3 {
        self.aabb().get_size() / self.side() as f32
    }

    /// Returns the bounding volume of the given cell.
    ///
    /// # Arguments
    /// * `cell` - The coordinates of the cell.
    fn voxel_aabb(&self, cell: Cell) -> AABB {
        block_aabb(self.aabb(), self.side(), cell, 1)
    }
}

/// Returns the bounding volume of a cubic block of cells. Both corners are computed from the grid
/// origin, so adjacent blocks share their boundaries exactly and every block contains the blocks
/// nested inside it.
///
/// # Arguments
/// * `aabb` - The bounding volume of the whole grid.
/// * `side` - The number of cells along each axis of the grid.
/// * `origin` - The cell with the lowest coordinates in the block.
/// * `size` - The number of cells along each axis of the block.
pub fn block_aabb(aabb: &AABB, side: usize, origin: Cell, size: usize) -> AABB {
    let dims = aabb.get_size() / side as f32;
    let corner = |offset: usize| {
        let index = Vec3::new(
            (origin[0] + offset) as f32,
            (origin[1] + offset) as f32,
            (origin[2] + offset) as f32,
        );

        aabb.min + index.component_mul(&dims)
    };

    AABB {
        min: corner(0),
        max: corner(size),
    }
}
