use serde::{Deserialize, Serialize};

use crate::{math::AABB, Error, Result};

use super::{layout, Cell, VoxelGrid, VoxelStorage};

/// The voxel grid packed into a single `u32` buffer, the layout that is uploaded to compute
/// devices.
///
/// The first `side³` entries form an offset table. The entry at [`layout::flat_index`] of a cell
/// holds the position of the cell's payload in the buffer. A payload is the number of triangles
/// followed by their indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlattenedVoxels {
    aabb: AABB,
    side: usize,
    data: Vec<u32>,
}

impl VoxelGrid {
    /// Packs the grid into the flattened device layout.
    pub fn flatten(&self) -> FlattenedVoxels {
        let num_cells = layout::num_cells(self.side());
        let mut data = vec![0u32; num_cells];
        data.reserve(num_cells + self.num_references());

        for (i, cell) in self.cells().iter().enumerate() {
            data[i] = data.len() as u32;
            data.push(cell.len() as u32);
            data.extend_from_slice(cell);
        }

        FlattenedVoxels {
            aabb: *self.aabb(),
            side: self.side(),
            data,
        }
    }
}

impl FlattenedVoxels {
    /// Returns the raw buffer including the offset table.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Writes the flattened voxels to the given writer.
    ///
    /// # Arguments
    /// * `writer` - The writer to write the data to.
    pub fn write<W: std::io::Write>(&self, writer: W) -> Result<()> {
        bincode::serialize_into(writer, self).map_err(|e| Error::SerializationError(Box::new(e)))
    }

    /// Reads flattened voxels from the given reader and checks that every offset and payload lies
    /// within the buffer.
    ///
    /// # Arguments
    /// * `reader` - The reader to read the data from.
    pub fn read_from<R: std::io::Read>(reader: R) -> Result<Self> {
        let voxels: Self = bincode::deserialize_from(reader)
            .map_err(|e| Error::DeserializationError(Box::new(e)))?;

        voxels.validate()?;

        Ok(voxels)
    }

    fn validate(&self) -> Result<()> {
        if layout::depth_for_side(self.side).is_none() {
            return Err(Error::DeserializationError(
                format!("Unsupported grid side {}", self.side).into(),
            ));
        }

        let num_cells = layout::num_cells(self.side);
        if self.data.len() < num_cells {
            return Err(Error::DeserializationError(
                format!(
                    "Buffer of length {} is too short for {} cells",
                    self.data.len(),
                    num_cells
                )
                .into(),
            ));
        }

        for (i, offset) in self.data[..num_cells].iter().enumerate() {
            let offset = *offset as usize;
            let end = self
                .data
                .get(offset)
                .map(|count| offset + 1 + *count as usize);

            match end {
                Some(end) if offset >= num_cells && end <= self.data.len() => {}
                _ => {
                    return Err(Error::DeserializationError(
                        format!("Cell {} has an invalid payload at {}", i, offset).into(),
                    ))
                }
            }
        }

        Ok(())
    }
}

impl VoxelStorage for FlattenedVoxels {
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
        let offset = self.data[layout::flat_index(cell, self.side)] as usize;
        let count = self.data[offset] as usize;

        &self.data[offset + 1..offset + 1 + count]
    }
}
