use nalgebra_glm::{cross, dot, normalize, Vec3};

/// A triangle resolved to its three positions in space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleVec3(pub [Vec3; 3]);

impl TriangleVec3 {
    pub fn new(p0: Vec3, p1: Vec3, p2: Vec3) -> Self {
        Self([p0, p1, p2])
    }

    /// Returns the unit normal of the triangle. The orientation follows the winding order.
    pub fn normal(&self) -> Vec3 {
        let [p0, p1, p2] = &self.0;
        normalize(&cross(&(p1 - p0), &(p2 - p0)))
    }

    /// Returns the component-wise minimum and maximum of the vertices.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let [p0, p1, p2] = &self.0;
        (
            nalgebra_glm::min3(p0, p1, p2),
            nalgebra_glm::max3(p0, p1, p2),
        )
    }

    /// Mirrors every vertex of this triangle on the plane of the given triangle.
    ///
    /// # Arguments
    /// * `plane` - The triangle whose plane acts as the mirror.
    pub fn mirrored(&self, plane: &TriangleVec3) -> Self {
        Self(self.0.map(|p| mirror(&p, plane)))
    }
}

impl std::ops::Index<usize> for TriangleVec3 {
    type Output = Vec3;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Mirrors the point on the plane spanned by the given triangle.
///
/// # Arguments
/// * `p` - The point to mirror.
/// * `plane` - The triangle whose plane acts as the mirror.
pub fn mirror(p: &Vec3, plane: &TriangleVec3) -> Vec3 {
    let n = plane.normal();
    p - n * dot(&n, &(p - plane[0])) * 2f32
}

#[cfg(test)]
mod test {
    use super::*;

    fn tri(p0: [f32; 3], p1: [f32; 3], p2: [f32; 3]) -> TriangleVec3 {
        TriangleVec3::new(p0.into(), p1.into(), p2.into())
    }

    #[test]
    fn test_normal() {
        let cases = [
            (tri([0., 0., 0.], [0., 1., 0.], [0., 0., 1.]), Vec3::new(1., 0., 0.)),
            (tri([0., 0., 0.], [0., 0., 1.], [1., 0., 0.]), Vec3::new(0., 1., 0.)),
            (tri([0., 0., 0.], [1., 0., 0.], [0., 1., 0.]), Vec3::new(0., 0., 1.)),
            (tri([0., 0., 0.], [0., 0., 1.], [0., 1., 0.]), Vec3::new(-1., 0., 0.)),
            (tri([0., 0., 0.], [1., 0., 0.], [0., 0., 1.]), Vec3::new(0., -1., 0.)),
            (tri([0., 0., 0.], [0., 1., 0.], [1., 0., 0.]), Vec3::new(0., 0., -1.)),
        ];

        for (t, n) in cases.iter() {
            assert_eq!(t.normal(), *n);
        }

        let n = tri([-1., 0., 1.], [0., 1., 0.], [1., 0., -1.]).normal();
        assert!((n - normalize(&Vec3::new(-1., 0., -1.))).norm() < 1e-6);
    }

    #[test]
    fn test_mirror() {
        let wall = tri([0., 0., 0.], [0., 1., 0.], [0., 0., 1.]);
        assert_eq!(mirror(&Vec3::new(-100., 0., 0.), &wall), Vec3::new(100., 0., 0.));

        let flipped = tri([0., 0., 0.], [0., 0., 1.], [0., 1., 0.]);
        assert_eq!(
            mirror(&Vec3::new(-100., 0., 0.), &flipped),
            Vec3::new(100., 0., 0.)
        );

        let slanted = tri([-1., 0., 1.], [0., 1., 0.], [1., 0., -1.]);
        let p = mirror(&Vec3::new(-1., 0., -1.), &slanted);
        assert!((p - Vec3::new(1., 0., 1.)).norm() < 1e-4);

        let image = tri([-1., 0., 0.], [-1., 1., 0.], [-2., 0., 0.]).mirrored(&wall);
        assert_eq!(image, tri([1., 0., 0.], [1., 1., 0.], [2., 0., 0.]));
    }

    #[test]
    fn test_bounds() {
        let (min, max) = tri([1., -2., 0.], [0., 1., 5.], [3., 0., -1.]).bounds();
        assert_eq!(min, Vec3::new(0., -2., -1.));
        assert_eq!(max, Vec3::new(3., 1., 5.));
    }
}
