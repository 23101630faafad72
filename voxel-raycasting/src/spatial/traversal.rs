use std::ops::ControlFlow;

use nalgebra_glm::Vec3;

use crate::math::{clamp, ray_box_intersection, Ray};

use super::{Cell, VoxelStorage};

/// The part of the ray that lies inside a single voxel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelSpan {
    /// The coordinates of the voxel.
    pub cell: Cell,

    /// The distance along the ray at which the ray enters the voxel.
    pub entry: f32,

    /// The distance along the ray at which the ray leaves the voxel.
    pub exit: f32,
}

/// How a traversal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOutcome {
    /// The visitor stopped the traversal.
    Stopped,

    /// The ray left the grid or never entered it.
    Exhausted,
}

/// Walks the ray through the voxel grid with a 3D-DDA and calls the visitor for every voxel the
/// ray passes, in order of increasing distance. Empty voxels are visited as well. If the origin
/// of the ray lies outside of the grid, the walk starts where the ray enters the grid.
///
/// When the ray crosses several voxel boundaries at the same distance, the step is taken along the
/// lowest axis first.
///
/// # Arguments
/// * `storage` - The voxel grid to walk through.
/// * `ray` - The ray to follow.
/// * `visitor` - Called with the ray, the triangles of the voxel and the span of the ray inside
///               the voxel. Returning `ControlFlow::Break` stops the traversal.
pub fn traverse<S, F>(storage: &S, ray: &Ray, mut visitor: F) -> TraversalOutcome
where
    S: VoxelStorage + ?Sized,
    F: FnMut(&Ray, &[u32], &VoxelSpan) -> ControlFlow<()>,
{
    let aabb = storage.aabb();
    let side = storage.side();

    let t_start = if aabb.contains_point(ray.pos()) {
        0f32
    } else {
        match ray_box_intersection(aabb, ray) {
            Some((t_min, t_max)) if 0f32 <= t_min && t_min <= t_max => t_min,
            _ => return TraversalOutcome::Exhausted,
        }
    };

    let start = ray.at(t_start);
    let dims = storage.voxel_dims();

    // the start cell, clamped for points on the upper boundary of the grid
    let relative = (start - aabb.min).component_div(&dims);
    let mut cell: [i64; 3] = [0; 3];
    for (axis, c) in cell.iter_mut().enumerate() {
        *c = clamp(relative[axis].floor() as i64, 0, side as i64 - 1);
    }

    let mut step = [1i64; 3];
    let mut just_out = [side as i64; 3];
    let mut t_max = Vec3::zeros();
    let mut t_delta = Vec3::zeros();

    let voxel = storage.voxel_aabb(to_cell(&cell));
    for axis in 0..3 {
        let boundary = if ray.is_negative(axis) {
            step[axis] = -1;
            just_out[axis] = -1;
            voxel.min[axis]
        } else {
            voxel.max[axis]
        };

        t_max[axis] = t_start + non_nan(((boundary - start[axis]) * ray.inv_dir()[axis]).abs());
        t_delta[axis] = non_nan((dims[axis] * ray.inv_dir()[axis]).abs());
    }

    let mut entry = t_start;
    loop {
        let mut axis = 0;
        for i in 1..3 {
            if t_max[i] < t_max[axis] {
                axis = i;
            }
        }

        let span = VoxelSpan {
            cell: to_cell(&cell),
            entry,
            exit: t_max[axis],
        };

        if visitor(ray, storage.voxel(span.cell), &span).is_break() {
            return TraversalOutcome::Stopped;
        }

        cell[axis] += step[axis];
        if cell[axis] == just_out[axis] {
            return TraversalOutcome::Exhausted;
        }

        entry = t_max[axis];
        t_max[axis] += t_delta[axis];
    }
}

#[inline]
fn to_cell(cell: &[i64; 3]) -> Cell {
    [cell[0] as usize, cell[1] as usize, cell[2] as usize]
}

/// Replaces NaN, which results from zero direction components, by infinity.
#[inline]
fn non_nan(t: f32) -> f32 {
    if t.is_nan() {
        f32::INFINITY
    } else {
        t
    }
}
