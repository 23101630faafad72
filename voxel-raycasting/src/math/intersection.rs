use nalgebra_glm::{cross, dot, Vec3};
use serde::{Deserialize, Serialize};

use super::{almost_equal, Ray, TriangleVec3, AABB};

/// The result of a ray/triangle intersection test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangleIntersection {
    /// The distance along the ray, i.e., ray.pos + t * ray.dir is the intersection point.
    pub t: f32,

    /// The barycentric coordinate along the first edge.
    pub u: f32,

    /// The barycentric coordinate along the second edge.
    pub v: f32,
}

impl TriangleIntersection {
    /// Returns true if the intersection lies on, or within tolerance of, an edge or vertex of the
    /// triangle. Such hits cannot be used for counting crossings.
    ///
    /// # Arguments
    /// * `ulp` - The tolerance in units in the last place.
    pub fn is_degenerate(&self, ulp: u32) -> bool {
        let near_edge = |x: f32| almost_equal(x, 0f32, ulp) || almost_equal(x, 1f32, ulp);

        near_edge(self.u) || near_edge(self.v) || near_edge(self.u + self.v)
    }
}

/// Determines the parametric interval in which the ray overlaps the given box using the slab
/// method. Returns None if the ray (as an infinite line) misses the box. The returned distances
/// may be negative if the box lies partly or completely behind the ray origin.
///
/// # Arguments
/// * `aabb` - The box to compute the intersection with.
/// * `ray` - The ray to compute the intersection with.
pub fn ray_box_intersection(aabb: &AABB, ray: &Ray) -> Option<(f32, f32)> {
    let pos = ray.pos();
    let inv = ray.inv_dir();

    // the near corner on each axis is selected by the sign of the direction
    let near = |axis: usize| aabb.corner(ray.is_negative(axis) as usize)[axis];
    let far = |axis: usize| aabb.corner(!ray.is_negative(axis) as usize)[axis];

    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;

    for axis in 0..3 {
        // a ray parallel to the slab that lies in one of its planes yields 0 * inf
        let t_axis_min = or_if_nan((near(axis) - pos[axis]) * inv[axis], f32::NEG_INFINITY);
        let t_axis_max = or_if_nan((far(axis) - pos[axis]) * inv[axis], f32::INFINITY);

        if t_min > t_axis_max || t_axis_min > t_max {
            return None;
        }

        if t_axis_min > t_min {
            t_min = t_axis_min;
        }

        if t_axis_max < t_max {
            t_max = t_axis_max;
        }
    }

    Some((t_min, t_max))
}

#[inline]
fn or_if_nan(t: f32, replacement: f32) -> f32 {
    if t.is_nan() {
        replacement
    } else {
        t
    }
}

/// Returns the shortest positive distance along the ray to the boundary of the box. If the ray
/// starts inside the box, this is the distance to the wall the ray leaves through.
///
/// # Arguments
/// * `aabb` - The box to compute the intersection with.
/// * `ray` - The ray to compute the intersection with.
pub fn first_positive_hit(aabb: &AABB, ray: &Ray) -> Option<f32> {
    let (t_min, t_max) = ray_box_intersection(aabb, ray)?;

    if 0f32 < t_min {
        Some(t_min)
    } else if 0f32 < t_max {
        Some(t_max)
    } else {
        None
    }
}

/// Returns true if the ray overlaps the box somewhere inside the open interval (t0, t1).
///
/// # Arguments
/// * `aabb` - The box to compute the intersection with.
/// * `ray` - The ray to compute the intersection with.
/// * `t0` - The lower end of the interval along the ray.
/// * `t1` - The upper end of the interval along the ray.
pub fn ray_box_overlaps_interval(aabb: &AABB, ray: &Ray, t0: f32, t1: f32) -> bool {
    match ray_box_intersection(aabb, ray) {
        Some((t_min, t_max)) => t0 < t_max && t_min < t1,
        None => false,
    }
}

/// Determines the intersection between the given triangle and ray using the algorithm of Möller
/// and Trumbore. Returns None if the ray is parallel to the triangle plane, misses the triangle
/// or the hit lies behind (or within tolerance of) the ray origin.
///
/// # Arguments
/// * `triangle` - The triangle to compute the intersection with.
/// * `ray` - The ray to compute the intersection with.
/// * `ulp` - The tolerance for the determinant and distance tests.
pub fn ray_triangle_intersection(
    triangle: &TriangleVec3,
    ray: &Ray,
    ulp: u32,
) -> Option<TriangleIntersection> {
    let e0: Vec3 = triangle[1] - triangle[0];
    let e1: Vec3 = triangle[2] - triangle[0];

    let pvec = cross(ray.dir(), &e1);
    let det = dot(&e0, &pvec);

    // the ray is parallel to the plane of the triangle
    if almost_equal(det, 0f32, ulp) {
        return None;
    }

    let inv_det = 1f32 / det;
    let tvec: Vec3 = ray.pos() - triangle[0];
    let u = inv_det * dot(&tvec, &pvec);

    if !(0f32..=1f32).contains(&u) {
        return None;
    }

    let qvec = cross(&tvec, &e0);
    let v = inv_det * dot(ray.dir(), &qvec);

    if v < 0f32 || 1f32 < u + v {
        return None;
    }

    let t = inv_det * dot(&e1, &qvec);

    // hits behind or directly at the origin are rejected to avoid self-intersections
    if t < 0f32 || almost_equal(t, 0f32, ulp) {
        return None;
    }

    Some(TriangleIntersection { t, u, v })
}

/// Computes the squared distance between the point and the closest point on the triangle.
///
/// The closest point is found by classifying the projection of the point into one of the seven
/// regions around the triangle (interior, three edges, three vertices).
///
/// # Arguments
/// * `triangle` - The triangle.
/// * `point` - The point to compute the distance to.
pub fn point_triangle_distance_squared(triangle: &TriangleVec3, point: &Vec3) -> f32 {
    let diff: Vec3 = point - triangle[0];
    let e0: Vec3 = triangle[1] - triangle[0];
    let e1: Vec3 = triangle[2] - triangle[0];
    let a00 = dot(&e0, &e0);
    let a01 = dot(&e0, &e1);
    let a11 = dot(&e1, &e1);
    let b0 = -dot(&diff, &e0);
    let b1 = -dot(&diff, &e1);
    let det = a00 * a11 - a01 * a01;

    let mut t0 = a01 * b1 - a11 * b0;
    let mut t1 = a01 * b0 - a00 * b1;

    // clamps the parameter along a single edge starting at the first vertex
    let edge_param = |b: f32, a: f32| {
        if 0f32 <= b {
            0f32
        } else if a <= -b {
            1f32
        } else {
            -b / a
        }
    };

    // parameter along the edge opposite to the first vertex
    let opposite_param = |numer: f32| {
        let denom = a00 - 2f32 * a01 + a11;
        if denom <= numer {
            1f32
        } else {
            numer / denom
        }
    };

    if t0 + t1 <= det {
        if t0 < 0f32 {
            if t1 < 0f32 && b0 < 0f32 {
                // region 4
                t1 = 0f32;
                t0 = if a00 <= -b0 { 1f32 } else { -b0 / a00 };
            } else {
                // region 3, or region 4 resolved onto the second edge
                t0 = 0f32;
                t1 = edge_param(b1, a11);
            }
        } else if t1 < 0f32 {
            // region 5
            t1 = 0f32;
            t0 = edge_param(b0, a00);
        } else {
            // region 0, the interior
            let inv_det = 1f32 / det;
            t0 *= inv_det;
            t1 *= inv_det;
        }
    } else if t0 < 0f32 {
        // region 2
        let tmp0 = a01 + b0;
        let tmp1 = a11 + b1;
        if tmp0 < tmp1 {
            t0 = opposite_param(tmp1 - tmp0);
            t1 = 1f32 - t0;
        } else {
            t0 = 0f32;
            t1 = if tmp1 <= 0f32 {
                1f32
            } else {
                edge_param(b1, a11)
            };
        }
    } else if t1 < 0f32 {
        // region 6
        let tmp0 = a01 + b1;
        let tmp1 = a00 + b0;
        if tmp0 < tmp1 {
            t1 = opposite_param(tmp1 - tmp0);
            t0 = 1f32 - t1;
        } else {
            t1 = 0f32;
            t0 = if tmp1 <= 0f32 {
                1f32
            } else {
                edge_param(b0, a00)
            };
        }
    } else {
        // region 1
        let numer = a11 + b1 - a01 - b0;
        if numer <= 0f32 {
            t0 = 0f32;
            t1 = 1f32;
        } else {
            t0 = opposite_param(numer);
            t1 = 1f32 - t0;
        }
    }

    let closest: Vec3 = triangle[0] + e0 * t0 + e1 * t1;
    let d: Vec3 = point - closest;
    dot(&d, &d)
}
