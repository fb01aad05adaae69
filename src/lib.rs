//! Verlet Grid – 2D particle engine for Rust.
//!
//! Particles are advanced with position Verlet integration, binned into a
//! uniform grid every tick, and collided in four checkerboard passes. Within
//! a pass each worker owns one quadrant of a disjoint grid region, so the
//! particle arrays are shared between threads without locks.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod input;
pub mod render;
pub mod utils;
pub mod world;

pub use glam::Vec2;

pub use collision::{
    grid::SpatialGrid,
    partition::{Quadrant, RegionPartition, RegionPartitioner},
    resolver::{CollisionResolver, SweepStats},
};
pub use config::SimulationConfig;
pub use self::core::{
    particles::ParticlesSoA,
    types::{BoundaryShape, CellCapacity, CellCoord, CellRange, IntegrationScheme},
};
pub use dynamics::{
    constraints::BoundaryConstraint,
    forces::{ForceGenerator, ForceRegistry, GravityForce, PointerForce},
    integrator::Integrator,
};
pub use error::{Result, SimError};
pub use input::{window_to_domain, InputHandle, PointerState};
pub use render::{NoopSink, ParticleSink};
pub use utils::profiling::TickProfiler;
pub use world::{EnginePhase, PhaseObserver, SimulationEngine, TickReport};
