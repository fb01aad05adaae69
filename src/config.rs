//! Global configuration constants and runtime settings for the Verlet Grid engine.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    core::types::{BoundaryShape, CellCapacity, IntegrationScheme},
    error::{Result, SimError},
};

/// Half extent of the square simulation domain `[-1, 1]^2`.
pub const DOMAIN_HALF_EXTENT: f32 = 1.0;

/// Default particle radius in domain units.
pub const DEFAULT_PARTICLE_RADIUS: f32 = 0.01;

/// Default gravity vector applied to every particle (Y-up).
pub const DEFAULT_GRAVITY: [f32; 2] = [0.0, -2.0];

/// Default integration timestep (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// Upper bound on fixed ticks drained from the accumulator per `step` call.
pub const DEFAULT_MAX_TICKS_PER_STEP: u32 = 8;

/// Default restitution used by the pairwise impulse response.
pub const DEFAULT_RESTITUTION: f32 = 0.5;

/// Fraction of the overlap each particle of a contact is pushed by.
pub const DEFAULT_SEPARATION_FACTOR: f32 = 0.5;

/// Default gain of the pointer attraction/repulsion force.
pub const DEFAULT_POINTER_STRENGTH: f32 = 4.0;

/// Default recursion depth of the region partitioner (`2^d` workers).
pub const DEFAULT_SUBDIVISION_DEPTH: u32 = 2;

/// Deepest subdivision accepted; `2^10` workers is far past any real core count.
pub const MAX_SUBDIVISION_DEPTH: u32 = 10;

/// Smallest width/height (in cells) of a leaf region.
///
/// Both halves of a leaf must be at least two cells wide so the 1-cell halo
/// around one region's active quadrant never reaches the active quadrant of
/// its neighbour.
pub const MIN_REGION_EXTENT: usize = 4;

/// Distance under which a contact normal is considered degenerate.
pub const CONTACT_EPSILON: f32 = 1e-6;

/// Frame budget used for the "tick took too long" warning.
pub const DEFAULT_FRAME_BUDGET_MS: f32 = 1000.0 / 60.0;

/// Runtime configuration of a [`SimulationEngine`](crate::SimulationEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub particle_radius: f32,
    pub gravity: Vec2,
    pub time_step: f32,
    pub max_ticks_per_step: u32,
    pub restitution: f32,
    pub separation_factor: f32,
    pub pointer_strength: f32,
    pub subdivision_depth: u32,
    pub integration: IntegrationScheme,
    pub boundary: BoundaryShape,
    pub cell_capacity: CellCapacity,
    pub frame_budget_ms: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            particle_radius: DEFAULT_PARTICLE_RADIUS,
            gravity: Vec2::from_array(DEFAULT_GRAVITY),
            time_step: DEFAULT_TIME_STEP,
            max_ticks_per_step: DEFAULT_MAX_TICKS_PER_STEP,
            restitution: DEFAULT_RESTITUTION,
            separation_factor: DEFAULT_SEPARATION_FACTOR,
            pointer_strength: DEFAULT_POINTER_STRENGTH,
            subdivision_depth: DEFAULT_SUBDIVISION_DEPTH,
            integration: IntegrationScheme::Fixed,
            boundary: BoundaryShape::Square,
            cell_capacity: CellCapacity::Dynamic,
            frame_budget_ms: DEFAULT_FRAME_BUDGET_MS,
        }
    }
}

impl SimulationConfig {
    /// Returns a copy with gravity switched off.
    pub fn without_gravity(mut self) -> Self {
        self.gravity = Vec2::ZERO;
        self
    }

    /// Edge length of one grid cell: a particle diameter.
    pub fn cell_size(&self) -> f32 {
        2.0 * self.particle_radius
    }

    /// Number of cells along each axis of the square domain.
    pub fn grid_dimension(&self) -> usize {
        let extent = 2.0 * DOMAIN_HALF_EXTENT;
        // Shave float noise so 2.0 / 0.02 lands on 100 rather than 101.
        let cells = (extent / self.cell_size() - 1e-4).ceil();
        cells.max(1.0) as usize
    }

    /// Checks every field for values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let r = self.particle_radius;
        if !r.is_finite() || r <= 0.0 || r > 0.5 * DOMAIN_HALF_EXTENT {
            return Err(SimError::InvalidConfig(format!(
                "particle_radius must be in (0, {}], got {r}",
                0.5 * DOMAIN_HALF_EXTENT
            )));
        }
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if self.max_ticks_per_step == 0 {
            return Err(SimError::InvalidConfig(
                "max_ticks_per_step must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(SimError::InvalidConfig(format!(
                "restitution must be in [0, 1], got {}",
                self.restitution
            )));
        }
        if !(self.separation_factor > 0.0 && self.separation_factor <= 0.5) {
            return Err(SimError::InvalidConfig(format!(
                "separation_factor must be in (0, 0.5], got {}",
                self.separation_factor
            )));
        }
        if !self.gravity.is_finite() || !self.pointer_strength.is_finite() {
            return Err(SimError::InvalidConfig(
                "gravity and pointer_strength must be finite".to_string(),
            ));
        }
        if let CellCapacity::Fixed(0) = self.cell_capacity {
            return Err(SimError::InvalidConfig(
                "fixed cell capacity must hold at least one particle".to_string(),
            ));
        }
        if self.subdivision_depth > MAX_SUBDIVISION_DEPTH {
            return Err(SimError::DepthTooLarge {
                depth: self.subdivision_depth,
                max: MAX_SUBDIVISION_DEPTH,
            });
        }
        Ok(())
    }
}
