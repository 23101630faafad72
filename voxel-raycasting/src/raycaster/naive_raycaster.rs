use crate::{
    math::{ray_triangle_intersection, Ray},
    Scene,
};

use super::{closer, Intersection};

/// Finds the nearest hit by testing every triangle of the scene. Serves as the reference for the
/// voxel accelerated queries.
///
/// # Arguments
/// * `scene` - The scene to cast the ray into.
/// * `ray` - The ray to cast.
/// * `ignore` - Optionally, a triangle that is skipped, e.g., the one the ray starts on.
/// * `ulp` - The tolerance of the ray/triangle test.
pub fn brute_force_nearest_hit<S>(
    scene: &Scene<S>,
    ray: &Ray,
    ignore: Option<u32>,
    ulp: u32,
) -> Option<Intersection> {
    (0..scene.triangles().len() as u32)
        .filter(|i| Some(*i) != ignore)
        .filter_map(|i| {
            ray_triangle_intersection(&scene.triangle_vec3(i as usize), ray, ulp)
                .map(|hit| Intersection { triangle: i, hit })
        })
        .fold(None, closer)
}

#[cfg(test)]
mod test {
    use nalgebra_glm::Vec3;

    use crate::{math::AABB, Surface};

    use super::*;

    #[test]
    fn test_brute_force_box() {
        let scene = Scene::from_box(
            &AABB::from_corners(&Vec3::new(0.0, 0.0, 0.0), &Vec3::new(4.0, 3.0, 6.0)),
            Surface::default(),
        );

        let ray = Ray::new(Vec3::new(1.0, 2.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
        let hit = brute_force_nearest_hit(&scene, &ray, None, 10).unwrap();
        assert_eq!(hit.triangle, 7);
        assert_eq!(hit.t(), 3.0);

        // skipping the wall lets the ray escape
        assert!(brute_force_nearest_hit(&scene, &ray, Some(7), 10).is_none());

        let ray = Ray::new(Vec3::new(10.0, 2.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(brute_force_nearest_hit(&scene, &ray, None, 10).is_none());
    }
}
