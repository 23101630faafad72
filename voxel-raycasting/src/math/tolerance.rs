use serde::{Deserialize, Serialize};

/// The tolerance policy shared by all predicates. Every tolerance-guarded branch reads its
/// epsilon from here instead of using a hard-coded constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// ULPs within which a ray/triangle determinant or hit distance counts as zero. Callers that
    /// bounce rays off surfaces may want a looser value to avoid self-intersections.
    pub intersection_ulp: u32,

    /// ULPs within which a barycentric coordinate counts as lying on a triangle edge.
    pub degenerate_ulp: u32,

    /// Absolute padding added around each voxel before testing triangles against it.
    pub overlap_padding: f32,
}

impl Tolerances {
    pub const DEFAULT_ULP: u32 = 10;
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            intersection_ulp: Self::DEFAULT_ULP,
            degenerate_ulp: Self::DEFAULT_ULP,
            overlap_padding: 0.001,
        }
    }
}
