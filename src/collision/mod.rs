//! Collision modules: spatial grid, region partitioning, and pairwise resolution.

pub mod grid;
pub mod partition;
pub mod resolver;

pub use grid::SpatialGrid;
pub use partition::{Quadrant, RegionPartition, RegionPartitioner, PASS_COUNT};
pub use resolver::{CollisionResolver, SweepStats};
