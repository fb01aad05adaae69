//! Particle dynamics: Verlet integration, external forces, and boundary constraints.

pub mod constraints;
pub mod forces;
pub mod integrator;

pub use constraints::BoundaryConstraint;
pub use forces::{ForceGenerator, ForceRegistry, GravityForce, PointerForce};
pub use integrator::{Integrator, StepCoefficients};
