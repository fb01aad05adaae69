use glam::Vec2;

use crate::input::PointerState;

/// Trait describing an external acceleration field applied to particles.
pub trait ForceGenerator: Send + Sync {
    fn acceleration(&self, position: Vec2, pointer: &PointerState) -> Vec2;
}

/// Constant gravity.
pub struct GravityForce {
    pub gravity: Vec2,
}

impl GravityForce {
    pub fn new(gravity: Vec2) -> Self {
        Self { gravity }
    }
}

impl ForceGenerator for GravityForce {
    fn acceleration(&self, _position: Vec2, _pointer: &PointerState) -> Vec2 {
        self.gravity
    }
}

/// Spring-like pull towards the pointer while the primary button is held,
/// push away while the secondary button is held.
pub struct PointerForce {
    pub strength: f32,
}

impl PointerForce {
    pub fn new(strength: f32) -> Self {
        Self { strength }
    }
}

impl ForceGenerator for PointerForce {
    fn acceleration(&self, position: Vec2, pointer: &PointerState) -> Vec2 {
        let pull = (pointer.position - position) * self.strength;
        let mut acceleration = Vec2::ZERO;
        if pointer.primary {
            acceleration += pull;
        }
        if pointer.secondary {
            acceleration -= pull;
        }
        acceleration
    }
}

/// Collection of forces summed into one acceleration per particle.
pub struct ForceRegistry {
    forces: Vec<Box<dyn ForceGenerator>>,
}

impl Default for ForceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ForceRegistry {
    pub fn new() -> Self {
        Self { forces: Vec::new() }
    }

    pub fn add_force<F: ForceGenerator + 'static>(&mut self, force: F) {
        self.forces.push(Box::new(force));
    }

    pub fn clear(&mut self) {
        self.forces.clear();
    }

    pub fn len(&self) -> usize {
        self.forces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    pub fn acceleration(&self, position: Vec2, pointer: &PointerState) -> Vec2 {
        self.forces
            .iter()
            .map(|force| force.acceleration(position, pointer))
            .fold(Vec2::ZERO, |sum, a| sum + a)
    }
}
