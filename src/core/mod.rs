//! Core types describing particles, grid coordinates, and shared settings.

pub mod particles;
pub mod types;

pub use particles::ParticlesSoA;
pub use types::{BoundaryShape, CellCapacity, CellCoord, CellRange, IntegrationScheme};
