use std::f32::consts::PI;

use nalgebra_glm::Vec3;
use rand::Rng;

/// Maps a height and an azimuth to a point on the unit sphere.
///
/// # Arguments
/// * `z` - The height of the point in [-1, 1].
/// * `theta` - The azimuth of the point in radians.
pub fn sphere_point(z: f32, theta: f32) -> Vec3 {
    let r = (1f32 - z * z).max(0f32).sqrt();
    Vec3::new(r * theta.cos(), r * theta.sin(), z)
}

/// Draws a direction uniformly distributed on the unit sphere.
pub fn random_direction<R: Rng>(rng: &mut R) -> Vec3 {
    let z = rng.random_range(-1f32..=1f32);
    let theta = rng.random_range(0f32..2f32 * PI);

    sphere_point(z, theta)
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn test_sphere_point() {
        assert_eq!(sphere_point(1.0, 0.3), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(sphere_point(0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));

        let p = sphere_point(0.0, PI / 2.0);
        assert!((p - Vec3::new(0.0, 1.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn test_random_direction() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut mean = Vec3::zeros();

        for _ in 0..10000 {
            let d = random_direction(&mut rng);
            assert!((d.norm() - 1.0).abs() < 1e-5);
            mean += d;
        }

        mean /= 10000.0;
        assert!(mean.norm() < 0.05);
    }
}
