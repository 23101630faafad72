mod aabb;
mod intersection;
mod ray;
mod tolerance;
mod tri_box;
mod triangle;

pub use aabb::*;
pub use intersection::*;
pub use ray::*;
pub use tolerance::*;
pub use tri_box::*;
pub use triangle::*;

/// Constraint a value to lie between two further values
///
/// # Arguments
/// * `x` - The value to constraint.
/// * `min_value` - The lower bound for the value constraint.
/// * `max_value` - The upper bound for the value constraint.
#[inline]
pub fn clamp<T>(x: T, min_value: T, max_value: T) -> T
where
    T: PartialOrd,
{
    if x < min_value {
        min_value
    } else if x > max_value {
        max_value
    } else {
        x
    }
}

/// Returns true if x and y are equal up to the given number of units in the last place, relative
/// to their magnitude. Values closer than the smallest normal float are always equal.
///
/// The same comparison is used by every tolerance-guarded predicate, so that all callers agree on
/// what "zero" means.
///
/// # Arguments
/// * `x` - The first value.
/// * `y` - The second value.
/// * `ulp` - The number of units in the last place the values may differ.
#[inline]
pub fn almost_equal(x: f32, y: f32, ulp: u32) -> bool {
    let abs_diff = (x - y).abs();
    abs_diff < f32::EPSILON * (x + y).abs() * ulp as f32 || abs_diff < f32::MIN_POSITIVE
}
