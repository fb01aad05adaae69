use glam::Vec2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    config::DOMAIN_HALF_EXTENT,
    core::{particles::ParticlesSoA, types::BoundaryShape},
};

/// Keeps particle centres at least one radius inside the domain edge.
///
/// Only the current position is moved, so a particle crossing the wall loses
/// the normal component of its implicit velocity over the following tick.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryConstraint {
    pub shape: BoundaryShape,
    pub radius: f32,
    parallel: bool,
}

impl BoundaryConstraint {
    pub fn new(shape: BoundaryShape, radius: f32) -> Self {
        Self {
            shape,
            radius,
            parallel: cfg!(feature = "parallel"),
        }
    }

    pub fn set_parallel(&mut self, enabled: bool) {
        self.parallel = enabled;
    }

    /// Largest coordinate (square) or distance from the origin (circle) a centre may reach.
    pub fn limit(&self) -> f32 {
        DOMAIN_HALF_EXTENT - self.radius
    }

    #[inline]
    pub fn project(&self, position: Vec2) -> Vec2 {
        let limit = self.limit();
        match self.shape {
            BoundaryShape::Square => position.clamp(Vec2::splat(-limit), Vec2::splat(limit)),
            BoundaryShape::Circle => {
                let distance = position.length();
                if distance > limit {
                    position * (limit / distance)
                } else {
                    position
                }
            }
        }
    }

    /// Returns true when `position` already satisfies the boundary.
    pub fn contains(&self, position: Vec2) -> bool {
        let limit = self.limit();
        match self.shape {
            BoundaryShape::Square => position.abs().max_element() <= limit,
            BoundaryShape::Circle => position.length() <= limit + 1e-6,
        }
    }

    pub fn apply(&self, particles: &mut ParticlesSoA) {
        #[cfg(feature = "parallel")]
        if self.parallel {
            particles
                .positions
                .par_iter_mut()
                .for_each(|position| *position = self.project(*position));
            return;
        }

        for position in particles.positions.iter_mut() {
            *position = self.project(*position);
        }
    }
}
