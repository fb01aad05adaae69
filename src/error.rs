//! Error types for the Verlet Grid engine.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SimError>;

/// Conditions that stop an engine from being built.
///
/// Everything here is raised before the first tick; a running simulation
/// only degrades (see [`CellCapacity::Fixed`](crate::CellCapacity)) and never
/// returns an error.
#[derive(Debug, Error)]
pub enum SimError {
    /// A configuration value is outside its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Partitioning produced a leaf region too small for a race-free quadrant sweep.
    #[error(
        "subdivision depth {depth} yields a {width}x{height} cell region, minimum is {min}x{min}"
    )]
    RegionTooSmall {
        depth: u32,
        width: usize,
        height: usize,
        min: usize,
    },

    /// The requested subdivision depth exceeds the supported maximum.
    #[error("subdivision depth {depth} exceeds maximum of {max}")]
    DepthTooLarge { depth: u32, max: u32 },

    /// The grid has no interior left once the halo ring is removed.
    #[error("grid of {width}x{height} cells has no interior")]
    GridTooSmall { width: usize, height: usize },

    /// The worker pool could not be created.
    #[cfg(feature = "parallel")]
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
