use glam::Vec2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    core::{particles::ParticlesSoA, types::IntegrationScheme},
    dynamics::forces::ForceRegistry,
    input::PointerState,
};

/// Multipliers applied to the implicit velocity and the acceleration in one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepCoefficients {
    pub velocity_scale: f32,
    pub acceleration_scale: f32,
}

/// Position Verlet integrator for the particle arrays.
#[derive(Debug, Clone)]
pub struct Integrator {
    pub scheme: IntegrationScheme,
    previous_dt: Option<f32>,
    parallel: bool,
}

impl Integrator {
    pub fn new(scheme: IntegrationScheme) -> Self {
        Self {
            scheme,
            previous_dt: None,
            parallel: cfg!(feature = "parallel"),
        }
    }

    pub fn set_parallel(&mut self, enabled: bool) {
        self.parallel = enabled;
    }

    /// Forgets the last step length; the next step is treated as the first.
    pub fn reset(&mut self) {
        self.previous_dt = None;
    }

    /// Coefficients for a step of length `dt` given the previous step length.
    pub fn coefficients(
        scheme: IntegrationScheme,
        dt: f32,
        previous_dt: Option<f32>,
    ) -> StepCoefficients {
        match scheme {
            IntegrationScheme::Fixed => StepCoefficients {
                velocity_scale: 1.0,
                acceleration_scale: dt * dt,
            },
            IntegrationScheme::TimeCorrected => {
                let prev = previous_dt.filter(|p| *p > 0.0).unwrap_or(dt);
                StepCoefficients {
                    velocity_scale: dt / prev,
                    acceleration_scale: dt * (dt + prev) * 0.5,
                }
            }
        }
    }

    #[inline]
    fn integrate_particle(
        position: &mut Vec2,
        previous: &mut Vec2,
        forces: &ForceRegistry,
        pointer: &PointerState,
        step: StepCoefficients,
    ) {
        let velocity = *position - *previous;
        let acceleration = forces.acceleration(*position, pointer);
        *previous = *position;
        *position += velocity * step.velocity_scale + acceleration * step.acceleration_scale;
    }

    /// Advances every particle by `dt`. Each particle is written independently.
    pub fn step(
        &mut self,
        particles: &mut ParticlesSoA,
        forces: &ForceRegistry,
        pointer: &PointerState,
        dt: f32,
    ) {
        let step = Self::coefficients(self.scheme, dt, self.previous_dt);
        self.previous_dt = Some(dt);

        let ParticlesSoA {
            positions,
            previous,
        } = particles;

        #[cfg(feature = "parallel")]
        if self.parallel {
            positions
                .par_iter_mut()
                .zip(previous.par_iter_mut())
                .for_each(|(position, previous)| {
                    Self::integrate_particle(position, previous, forces, pointer, step)
                });
            return;
        }

        for (position, previous) in positions.iter_mut().zip(previous.iter_mut()) {
            Self::integrate_particle(position, previous, forces, pointer, step);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::forces::GravityForce;
    use approx::assert_abs_diff_eq;

    #[test]
    fn particles_at_rest_without_forces_do_not_drift() {
        let mut particles =
            ParticlesSoA::from_positions(vec![Vec2::new(0.3, -0.2), Vec2::new(-0.7, 0.9)]);
        let expected = particles.clone();
        let mut integrator = Integrator::new(IntegrationScheme::Fixed);
        for _ in 0..10 {
            integrator.step(
                &mut particles,
                &ForceRegistry::new(),
                &PointerState::default(),
                1.0 / 60.0,
            );
        }
        assert_eq!(particles, expected);
    }

    #[test]
    fn constant_velocity_is_preserved() {
        let mut particles = ParticlesSoA::new();
        particles.push(Vec2::ZERO, Vec2::new(0.01, 0.0));
        let mut integrator = Integrator::new(IntegrationScheme::Fixed);
        integrator.set_parallel(false);
        integrator.step(
            &mut particles,
            &ForceRegistry::new(),
            &PointerState::default(),
            1.0 / 60.0,
        );
        assert_abs_diff_eq!(particles.positions[0].x, 0.01, epsilon = 1e-7);
        assert_abs_diff_eq!(particles.velocity(0).x, 0.01, epsilon = 1e-7);
    }

    #[test]
    fn gravity_adds_dt_squared_displacement() {
        let mut particles = ParticlesSoA::from_positions(vec![Vec2::ZERO]);
        let mut forces = ForceRegistry::new();
        forces.add_force(GravityForce::new(Vec2::new(0.0, -2.0)));
        let dt = 0.1;
        let mut integrator = Integrator::new(IntegrationScheme::Fixed);
        integrator.step(&mut particles, &forces, &PointerState::default(), dt);
        assert_abs_diff_eq!(particles.positions[0].y, -2.0 * dt * dt, epsilon = 1e-7);
    }

    #[test]
    fn time_corrected_scales_velocity_by_dt_ratio() {
        let step = Integrator::coefficients(IntegrationScheme::TimeCorrected, 0.02, Some(0.01));
        assert_abs_diff_eq!(step.velocity_scale, 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(step.acceleration_scale, 0.02 * 0.03 * 0.5, epsilon = 1e-9);

        let first = Integrator::coefficients(IntegrationScheme::TimeCorrected, 0.02, None);
        let fixed = Integrator::coefficients(IntegrationScheme::Fixed, 0.02, None);
        assert_eq!(first, fixed);
    }
}
