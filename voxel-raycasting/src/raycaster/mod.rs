//! Ray and point queries against a triangulated scene.

mod naive_raycaster;
mod voxel_raycaster;

pub use naive_raycaster::*;
pub use voxel_raycaster::*;

use serde::{Deserialize, Serialize};

use crate::math::TriangleIntersection;

/// The intersection of a ray with a triangle of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    /// The index of the triangle that was hit.
    pub triangle: u32,

    /// The distance and barycentric coordinates of the hit.
    pub hit: TriangleIntersection,
}

impl Intersection {
    /// Returns the distance of the hit along the ray.
    #[inline]
    pub fn t(&self) -> f32 {
        self.hit.t
    }
}

/// Keeps the closer of the current best and the candidate hit. Ties keep the current best.
#[inline]
fn closer(best: Option<Intersection>, candidate: Intersection) -> Option<Intersection> {
    match best {
        Some(best) if best.t() <= candidate.t() => Some(best),
        _ => Some(candidate),
    }
}
