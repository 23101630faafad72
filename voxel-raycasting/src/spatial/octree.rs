use log::debug;
use serde::{Deserialize, Serialize};

use crate::{math::AABB, Error, Result};

use super::{block_aabb, layout, Cell, VoxelStorage};

/// A uniform voxel grid with `side³` cells, each holding the indices of the triangles that
/// overlap it. The cells are stored in a flat arena in the order given by [`layout::flat_index`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoxelGrid {
    aabb: AABB,
    side: usize,
    cells: Vec<Vec<u32>>,
}

impl VoxelGrid {
    /// Builds the grid by recursively splitting the bounding volume into eight octants until the
    /// given depth is reached. Every octant keeps the candidates of its parent for which the
    /// predicate holds, so the predicate is only evaluated for triangles that survived all
    /// enclosing octants.
    ///
    /// # Arguments
    /// * `indices` - The candidate triangle indices.
    /// * `overlaps` - Returns true if the triangle with the given index overlaps the box.
    /// * `bounds` - The bounding volume covered by the grid.
    /// * `depth` - The number of subdivisions, i.e., the grid has `2^depth` cells per axis.
    pub fn build<F>(indices: &[u32], overlaps: F, bounds: AABB, depth: u32) -> Self
    where
        F: Fn(u32, &AABB) -> bool,
    {
        let side = layout::side_for_depth(depth);
        let mut builder = Builder {
            aabb: bounds,
            side,
            cells: vec![Vec::new(); layout::num_cells(side)],
            overlaps,
        };

        builder.split(indices, [0, 0, 0], side);

        let grid = Self {
            aabb: bounds,
            side,
            cells: builder.cells,
        };

        debug!(
            "Built voxel grid with {}^3 cells, {} non-empty, {} references in total",
            grid.side,
            grid.cells.iter().filter(|c| !c.is_empty()).count(),
            grid.num_references()
        );

        grid
    }

    /// Returns the lists of all cells in the order of their flat index.
    #[inline]
    pub fn cells(&self) -> &[Vec<u32>] {
        &self.cells
    }

    /// Returns the total number of triangle references over all cells.
    pub fn num_references(&self) -> usize {
        self.cells.iter().map(|c| c.len()).sum()
    }

    /// Checks that the grid has a supported side, one list per cell and only references
    /// triangles below the given count.
    ///
    /// # Arguments
    /// * `num_triangles` - The number of triangles of the scene the grid was built over.
    pub fn validate(&self, num_triangles: usize) -> Result<()> {
        if layout::depth_for_side(self.side).is_none() {
            return Err(Error::DeserializationError(
                format!("Unsupported grid side {}", self.side).into(),
            ));
        }

        let num_cells = layout::num_cells(self.side);
        if self.cells.len() != num_cells {
            return Err(Error::DeserializationError(
                format!("Expected {} cells, got {}", num_cells, self.cells.len()).into(),
            ));
        }

        for (i, cell) in self.cells.iter().enumerate() {
            if let Some(t) = cell.iter().find(|t| **t as usize >= num_triangles) {
                return Err(Error::DeserializationError(
                    format!(
                        "Cell {} references triangle {}, but there are only {}",
                        i, t, num_triangles
                    )
                    .into(),
                ));
            }
        }

        Ok(())
    }
}

impl VoxelStorage for VoxelGrid {
    #[inline]
    fn aabb(&self) -> &AABB {
        &self.aabb
    }

    #[inline]
    fn side(&self) -> usize {
        self.side
    }

    #[inline]
    fn voxel(&self, cell: Cell) -> &[u32] {
        &self.cells[layout::flat_index(cell, self.side)]
    }
}

struct Builder<F> {
    aabb: AABB,
    side: usize,
    cells: Vec<Vec<u32>>,
    overlaps: F,
}

impl<F> Builder<F>
where
    F: Fn(u32, &AABB) -> bool,
{
    /// Filters the candidates against the block and descends into its octants.
    ///
    /// # Arguments
    /// * `candidates` - The triangles that overlap the parent block.
    /// * `origin` - The cell with the lowest coordinates in the block.
    /// * `size` - The number of cells along each axis of the block.
    fn split(&mut self, candidates: &[u32], origin: Cell, size: usize) {
        let bounds = block_aabb(&self.aabb, self.side, origin, size);
        let inside: Vec<u32> = candidates
            .iter()
            .copied()
            .filter(|i| (self.overlaps)(*i, &bounds))
            .collect();

        if size == 1 {
            self.cells[layout::flat_index(origin, self.side)] = inside;
            return;
        }

        if inside.is_empty() {
            return;
        }

        let half = size / 2;
        for octant in 0..8 {
            let child = [
                origin[0] + half * ((octant >> 2) & 1),
                origin[1] + half * ((octant >> 1) & 1),
                origin[2] + half * (octant & 1),
            ];

            self.split(&inside, child, half);
        }
    }
}
