use serde::{Deserialize, Serialize};

/// The number of frequency bands a surface is described with.
pub const BANDS: usize = 8;

/// The acoustic properties of a wall, given per frequency band.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Surface {
    /// The fraction of incident energy absorbed by the wall.
    pub absorption: [f32; BANDS],

    /// The fraction of reflected energy scattered diffusely.
    pub scattering: [f32; BANDS],
}

impl Surface {
    pub fn new(absorption: [f32; BANDS], scattering: [f32; BANDS]) -> Self {
        Self {
            absorption,
            scattering,
        }
    }

    /// Creates a surface with the same coefficients in every band.
    ///
    /// # Arguments
    /// * `absorption` - The absorption coefficient of all bands.
    /// * `scattering` - The scattering coefficient of all bands.
    pub fn uniform(absorption: f32, scattering: f32) -> Self {
        Self::new([absorption; BANDS], [scattering; BANDS])
    }
}
