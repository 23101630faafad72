//! Voxel accelerated ray and point queries on triangulated scenes.
//!
//! A [`Scene`] is sorted into a uniform voxel grid by recursive octree subdivision. Rays are walked
//! through the grid in order of distance to answer nearest hit, crossing count, containment and
//! visibility queries. The grid can be exported in a flat buffer layout for compute devices that
//! run the same traversal.

mod config;
mod error;
pub mod math;
pub mod raycaster;
mod scene;
pub mod spatial;
mod utils;

pub use config::*;
pub use error::*;
pub use raycaster::{Intersection, VoxelisedScene};
pub use scene::*;
pub use utils::{random_direction, sphere_point};
