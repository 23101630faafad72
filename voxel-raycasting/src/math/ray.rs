use nalgebra_glm::{normalize, Vec3};

/// A single ray that starts at pos and goes into infinity along dir.
///
/// The direction is normalized exactly once, on construction. The reciprocal direction and the
/// per-axis sign are precomputed for the slab test and the grid traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pos: Vec3,
    dir: Vec3,
    inv_dir: Vec3,
    negative: [bool; 3],
}

impl Ray {
    /// Creates a new ray starting at the given position and going along the given direction.
    ///
    /// # Arguments
    /// * `pos` - The start position of the ray.
    /// * `dir` - The direction of the ray. Does not need to be normalized, but must not be zero.
    pub fn new(pos: Vec3, dir: Vec3) -> Self {
        debug_assert!(dir != Vec3::zeros(), "ray direction must not be zero");

        let dir = normalize(&dir);
        let inv_dir = Vec3::new(1f32 / dir.x, 1f32 / dir.y, 1f32 / dir.z);
        let negative = [
            dir.x.is_sign_negative(),
            dir.y.is_sign_negative(),
            dir.z.is_sign_negative(),
        ];

        Self {
            pos,
            dir,
            inv_dir,
            negative,
        }
    }

    /// Creates a new ray spanned by the two positions x0 and x1.
    ///
    /// # Arguments
    /// * `x0` - The start position of the ray
    /// * `x1` - The next position along the line of the ray.
    pub fn from_pos(x0: &Vec3, x1: &Vec3) -> Self {
        Self::new(*x0, x1 - x0)
    }

    /// Returns the start position of the ray.
    #[inline]
    pub fn pos(&self) -> &Vec3 {
        &self.pos
    }

    /// Returns the unit-length direction of the ray.
    #[inline]
    pub fn dir(&self) -> &Vec3 {
        &self.dir
    }

    /// Returns the component-wise reciprocal of the direction.
    #[inline]
    pub fn inv_dir(&self) -> &Vec3 {
        &self.inv_dir
    }

    /// Returns true if the direction has its sign bit set on the given axis.
    #[inline]
    pub fn is_negative(&self, axis: usize) -> bool {
        self.negative[axis]
    }

    /// Returns the point at distance t along the ray.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.pos + self.dir * t
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_direction_is_normalized() {
        let ray = Ray::new(Vec3::zeros(), Vec3::new(3.0, 0.0, 4.0));
        assert!((ray.dir().norm() - 1.0).abs() < 1e-6);
        assert_eq!(*ray.dir(), Vec3::new(0.6, 0.0, 0.8));
        assert_eq!(ray.inv_dir().y, f32::INFINITY);
        assert!(!ray.is_negative(0));

        let ray = Ray::from_pos(&Vec3::new(1.0, 1.0, 1.0), &Vec3::new(1.0, -1.0, 1.0));
        assert_eq!(*ray.dir(), Vec3::new(0.0, -1.0, 0.0));
        assert!(ray.is_negative(1));
        assert_eq!(ray.at(2.0), Vec3::new(1.0, -1.0, 1.0));
    }
}
