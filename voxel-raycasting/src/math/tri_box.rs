use nalgebra_glm::{abs, comp_add, cross, dot, Vec3};

use super::{TriangleVec3, AABB};

/// Half of the edge length of the cube the separating axis test is carried out against.
const HALF_EXTENT: f32 = 0.5;

/// Tests whether the triangle overlaps the given box.
///
/// The triangle is translated and scaled into the frame in which the box is the unit cube centred
/// at the origin, and then tested with [`triangle_unit_cube_overlap`].
///
/// # Arguments
/// * `triangle` - The triangle to test.
/// * `aabb` - The box to test against.
pub fn triangle_box_overlap(triangle: &TriangleVec3, aabb: &AABB) -> bool {
    let center = aabb.get_center();
    let size = aabb.get_size();

    let local = TriangleVec3(triangle.0.map(|p| (p - center).component_div(&size)));
    triangle_unit_cube_overlap(&local)
}

/// Separating axis test between the triangle and the cube with half-extent 0.5 centred at the
/// origin. The candidate axes are the nine cross products of the cube edges with the triangle
/// edges, the three cube face normals and the triangle normal.
///
/// # Arguments
/// * `triangle` - The triangle in the frame of the unit cube.
pub fn triangle_unit_cube_overlap(triangle: &TriangleVec3) -> bool {
    let v = &triangle.0;
    let f = [v[1] - v[0], v[2] - v[1], v[0] - v[2]];
    let half = Vec3::new(HALF_EXTENT, HALF_EXTENT, HALF_EXTENT);

    // the cross products of the cube axes with the triangle edges
    for axis in 0..3 {
        for edge in f.iter() {
            let mut a = Vec3::zeros();
            a[axis] = 1f32;
            let a = cross(&a, edge);

            let p0 = dot(&a, &v[0]);
            let p1 = dot(&a, &v[1]);
            let p2 = dot(&a, &v[2]);

            let r = comp_add(&component_mul_abs(&a, &half));
            let min = p0.min(p1).min(p2);
            let max = p0.max(p1).max(p2);

            if min > r || max < -r {
                return false;
            }
        }
    }

    // the face normals of the cube, i.e., the triangle bounds against the cube bounds
    let (min, max) = triangle.bounds();
    if (0..3).any(|i| max[i] < -HALF_EXTENT || HALF_EXTENT < min[i]) {
        return false;
    }

    // the triangle normal, a NaN normal of a degenerate triangle never overlaps
    let normal = cross(&f[0], &f[2]).normalize();
    let dist = dot(&normal, &v[0]);
    let r = comp_add(&component_mul_abs(&normal, &half));

    dist.abs() <= r
}

#[inline]
fn component_mul_abs(a: &Vec3, b: &Vec3) -> Vec3 {
    abs(a).component_mul(b)
}
