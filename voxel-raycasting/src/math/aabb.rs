use std::fmt;
use std::fmt::Display;

use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

/// An AABB bounding volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AABB {
    /// the corner with the lower coordinates
    pub min: glm::Vec3,
    /// the corner with the upper coordinates
    pub max: glm::Vec3,
}

impl AABB {
    /// Creates a new empty bounding volume
    pub fn new() -> Self {
        let min = glm::vec3(f32::MAX, f32::MAX, f32::MAX);
        let max = glm::vec3(f32::MIN, f32::MIN, f32::MIN);

        AABB { min, max }
    }

    /// Creates the bounding volume spanned by two arbitrary corners. The corners do not need to
    /// be ordered, the component-wise minimum and maximum are taken.
    ///
    /// # Arguments
    /// * `a` - The first corner.
    /// * `b` - The opposite corner.
    pub fn from_corners(a: &glm::Vec3, b: &glm::Vec3) -> Self {
        AABB {
            min: glm::min2(a, b),
            max: glm::max2(a, b),
        }
    }

    /// Creates a new bounding volume from the given iterator of vec3 positions.
    ///
    /// # Arguments
    /// * `positions` - The iterator of vec3 positions to create the bounding volume from.
    pub fn from_iter<I>(positions: I) -> Self
    where
        I: Iterator<Item = glm::Vec3>,
    {
        let mut result = AABB::new();

        result.extend_iter(positions);

        result
    }

    /// Returns true if the bbox is empty and false otherwise.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Extends the bounding volume with the given position
    ///
    ///* `p` - The position about which the volume is extended
    pub fn extend_pos(&mut self, p: &glm::Vec3) {
        self.min = glm::min2(&self.min, p);
        self.max = glm::max2(&self.max, p);
    }

    /// Extends the bounding volume from the given iterator of vec3 positions.
    pub fn extend_iter<I>(&mut self, positions: I)
    where
        I: Iterator<Item = glm::Vec3>,
    {
        positions.for_each(|p| self.extend_pos(&p))
    }

    /// Returns a copy of the volume grown by the given amount on every side.
    ///
    /// # Arguments
    /// * `padding` - The distance to add on each side of each axis.
    pub fn padded(&self, padding: f32) -> Self {
        let padding = glm::vec3(padding, padding, padding);

        AABB {
            min: self.min - padding,
            max: self.max + padding,
        }
    }

    /// Computes and returns the bounding box center
    #[inline]
    pub fn get_center(&self) -> glm::Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Computes and returns the bounding box size
    #[inline]
    pub fn get_size(&self) -> glm::Vec3 {
        self.max - self.min
    }

    /// Returns the i-th corner, i.e., i==0 => min and i==1 => max.
    ///
    /// # Arguments
    /// * `i` - The index of the corner to return.
    #[inline]
    pub fn corner(&self, i: usize) -> &glm::Vec3 {
        debug_assert!(i < 2);

        if i == 0 {
            &self.min
        } else {
            &self.max
        }
    }

    /// Returns true if the point lies inside or on the boundary of the volume.
    #[inline]
    pub fn contains_point(&self, p: &glm::Vec3) -> bool {
        self.min[0] <= p[0]
            && p[0] <= self.max[0]
            && self.min[1] <= p[1]
            && p[1] <= self.max[1]
            && self.min[2] <= p[2]
            && p[2] <= self.max[2]
    }

    /// Returns true if the point lies strictly inside the volume.
    #[inline]
    pub fn strictly_contains_point(&self, p: &glm::Vec3) -> bool {
        (0..3).all(|i| self.min[i] < p[i] && p[i] < self.max[i])
    }
}

impl Default for AABB {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

fn vec3_to_string(f: &mut fmt::Formatter<'_>, v: &glm::Vec3) -> fmt::Result {
    write!(f, "({}, {}, {})", v[0], v[1], v[2])
}

impl Display for AABB {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        vec3_to_string(f, &self.min)?;
        write!(f, "-")?;
        vec3_to_string(f, &self.max)
    }
}

#[cfg(test)]
mod test {
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn test_from_corners_is_ordered() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..1000 {
            let a = glm::vec3(
                rng.random_range(-10f32..10f32),
                rng.random_range(-10f32..10f32),
                rng.random_range(-10f32..10f32),
            );
            let b = glm::vec3(
                rng.random_range(-10f32..10f32),
                rng.random_range(-10f32..10f32),
                rng.random_range(-10f32..10f32),
            );

            let ab = AABB::from_corners(&a, &b);
            let ba = AABB::from_corners(&b, &a);

            assert_eq!(ab, ba);
            assert!(!ab.is_empty());
            assert!((0..3).all(|i| ab.min[i] <= ab.max[i]));
        }
    }

    #[test]
    fn test_padded() {
        let aabb = AABB::from_corners(&glm::vec3(0.0, 0.0, 0.0), &glm::vec3(4.0, 3.0, 6.0));

        let padded = aabb.padded(0.5);
        assert_eq!(padded.min, glm::vec3(-0.5, -0.5, -0.5));
        assert_eq!(padded.max, glm::vec3(4.5, 3.5, 6.5));
        assert_eq!(padded.get_center(), aabb.get_center());
        assert_ne!(padded, aabb);
    }

    #[test]
    fn test_empty_extend() {
        let mut aabb = AABB::new();
        assert!(aabb.is_empty());

        aabb.extend_pos(&glm::vec3(1.0, 2.0, 3.0));
        aabb.extend_pos(&glm::vec3(-1.0, 0.0, 5.0));

        assert_eq!(aabb.min, glm::vec3(-1.0, 0.0, 3.0));
        assert_eq!(aabb.max, glm::vec3(1.0, 2.0, 5.0));
        assert!(aabb.strictly_contains_point(&glm::vec3(0.0, 1.0, 4.0)));
        assert!(!aabb.strictly_contains_point(&glm::vec3(1.0, 1.0, 4.0)));
        assert!(aabb.contains_point(&glm::vec3(1.0, 1.0, 4.0)));
        assert_eq!(format!("{}", aabb), "(-1, 0, 3)-(1, 2, 5)");
    }
}
