use glam::Vec2;

/// Structure-of-Arrays storage for Verlet particles.
///
/// A particle is identified by its index. Velocity is never stored: it is the
/// difference between `positions[i]` and `previous[i]`. The particle count is
/// fixed once the engine owns the storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticlesSoA {
    pub positions: Vec<Vec2>,
    pub previous: Vec<Vec2>,
}

impl ParticlesSoA {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            previous: Vec::with_capacity(capacity),
        }
    }

    /// Stationary particles at the given positions.
    pub fn from_positions(positions: Vec<Vec2>) -> Self {
        let previous = positions.clone();
        Self {
            positions,
            previous,
        }
    }

    /// A `columns x rows` lattice starting at `origin`, `spacing` apart, at rest.
    pub fn block(columns: usize, rows: usize, origin: Vec2, spacing: f32) -> Self {
        let mut particles = Self::with_capacity(columns * rows);
        for row in 0..rows {
            for column in 0..columns {
                let offset = Vec2::new(column as f32, row as f32) * spacing;
                particles.push(origin + offset, Vec2::ZERO);
            }
        }
        particles
    }

    /// Appends a particle moving by `velocity` per tick.
    pub fn push(&mut self, position: Vec2, velocity: Vec2) -> usize {
        self.positions.push(position);
        self.previous.push(position - velocity);
        self.positions.len() - 1
    }

    /// Overrides the implicit velocity of every particle.
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        for (position, previous) in self.positions.iter().zip(self.previous.iter_mut()) {
            *previous = *position - velocity;
        }
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// True when every particle has both a current and a previous position.
    #[inline]
    pub fn is_consistent(&self) -> bool {
        self.positions.len() == self.previous.len()
    }

    #[inline]
    pub fn velocity(&self, index: usize) -> Vec2 {
        self.positions[index] - self.previous[index]
    }

    /// Positions as a flat `[x0, y0, x1, y1, ...]` slice for buffer uploads.
    pub fn positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Sum of squared per-tick displacements; zero when everything is at rest.
    pub fn kinetic_energy(&self) -> f32 {
        self.positions
            .iter()
            .zip(self.previous.iter())
            .map(|(p, q)| (*p - *q).length_squared())
            .sum::<f32>()
            * 0.5
    }
}
