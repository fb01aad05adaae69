use std::marker::PhantomData;

use glam::Vec2;
use log::warn;

use crate::{
    collision::grid::SpatialGrid,
    config::CONTACT_EPSILON,
    core::{particles::ParticlesSoA, types::CellRange},
};

/// Counters produced by one sweep over a cell range.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub pairs_tested: usize,
    pub contacts_resolved: usize,
}

impl SweepStats {
    pub fn merge(self, other: Self) -> Self {
        Self {
            pairs_tested: self.pairs_tested + other.pairs_tested,
            contacts_resolved: self.contacts_resolved + other.contacts_resolved,
        }
    }
}

/// Pointer wrapper giving collision workers access to the particle arrays.
///
/// # Safety
///
/// Workers of one pass only ever touch particles binned into the 3x3
/// neighbourhoods of their own quadrant cells, and the region partition
/// guarantees those neighbourhoods are disjoint across workers. Concurrent
/// reads and writes through this wrapper therefore never hit the same slot.
pub(crate) struct SharedParticles<'a> {
    positions: *mut Vec2,
    previous: *mut Vec2,
    len: usize,
    _marker: PhantomData<&'a mut ParticlesSoA>,
}

unsafe impl Send for SharedParticles<'_> {}
unsafe impl Sync for SharedParticles<'_> {}

impl<'a> SharedParticles<'a> {
    /// Only the first `min(positions, previous)` particles are reachable.
    pub(crate) fn new(particles: &'a mut ParticlesSoA) -> Self {
        Self {
            positions: particles.positions.as_mut_ptr(),
            previous: particles.previous.as_mut_ptr(),
            len: particles.positions.len().min(particles.previous.len()),
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    unsafe fn load(&self, index: usize) -> (Vec2, Vec2) {
        assert!(index < self.len, "particle {index} out of {}", self.len);
        (
            self.positions.add(index).read(),
            self.previous.add(index).read(),
        )
    }

    #[inline(always)]
    unsafe fn store(&self, index: usize, position: Vec2, previous: Vec2) {
        assert!(index < self.len, "particle {index} out of {}", self.len);
        self.positions.add(index).write(position);
        self.previous.add(index).write(previous);
    }
}

/// Narrow-phase response for equal-radius, equal-mass particles.
#[derive(Debug, Clone, Copy)]
pub struct CollisionResolver {
    pub radius: f32,
    pub restitution: f32,
    pub separation_factor: f32,
}

impl CollisionResolver {
    pub fn new(radius: f32, restitution: f32, separation_factor: f32) -> Self {
        Self {
            radius,
            restitution,
            separation_factor,
        }
    }

    /// Resolves one particle pair given as `(position, previous)` states.
    ///
    /// Returns `None` when the particles do not overlap. Otherwise both are
    /// pushed apart along the contact normal by `separation_factor` of the
    /// overlap each, an impulse is applied if they are approaching, and the
    /// previous positions are rewritten so the implicit velocity carries the
    /// post-impulse value rather than the positional push.
    #[inline]
    pub fn resolve_pair(
        &self,
        (pos_a, prev_a): (Vec2, Vec2),
        (pos_b, prev_b): (Vec2, Vec2),
    ) -> Option<((Vec2, Vec2), (Vec2, Vec2))> {
        let min_distance = 2.0 * self.radius;
        let delta = pos_a - pos_b;
        let distance_sq = delta.length_squared();
        if distance_sq >= min_distance * min_distance {
            return None;
        }

        let distance = distance_sq.sqrt();
        let normal = if distance > CONTACT_EPSILON {
            delta / distance
        } else {
            Vec2::Y
        };

        let mut velocity_a = pos_a - prev_a;
        let mut velocity_b = pos_b - prev_b;

        let push = normal * ((min_distance - distance) * self.separation_factor);
        let pos_a = pos_a + push;
        let pos_b = pos_b - push;

        let approach = (velocity_a - velocity_b).dot(normal);
        if approach < 0.0 {
            // Equal masses: each side takes half of the restitution impulse.
            let impulse = -(1.0 + self.restitution) * approach * 0.5;
            velocity_a += normal * impulse;
            velocity_b -= normal * impulse;
        }

        Some((
            (pos_a, pos_a - velocity_a),
            (pos_b, pos_b - velocity_b),
        ))
    }

    /// Sweeps every cell of `range`, resolving all pairs in each 3x3 neighbourhood.
    ///
    /// A pair whose particles sit in neighbouring cells is seen once per cell
    /// of `range` whose neighbourhood covers both, and is resolved each time.
    /// Later visits usually find it already separated.
    ///
    /// `grid` must have been rebuilt from `particles`; a grid binned from a
    /// different particle count is refused and nothing is resolved.
    pub fn resolve_pass(
        &self,
        particles: &mut ParticlesSoA,
        grid: &SpatialGrid,
        range: CellRange,
    ) -> SweepStats {
        if !particles.is_consistent() || grid.particle_count() != particles.len() {
            warn!(
                "Skipping collision pass: grid holds {} particle(s), arrays hold {}/{}",
                grid.particle_count(),
                particles.positions.len(),
                particles.previous.len()
            );
            return SweepStats::default();
        }

        let shared = SharedParticles::new(particles);
        let mut scratch = Vec::new();
        // SAFETY: `shared` is derived from an exclusive borrow and used by this thread only.
        unsafe { self.resolve_range_shared(grid, range, &shared, &mut scratch) }
    }

    /// Worker body of a collision pass.
    ///
    /// # Safety
    ///
    /// No other thread may access particles in the 3x3 neighbourhood of any
    /// cell of `range` while this runs. Indices stored in `grid` past
    /// `particles.len()` panic rather than read out of bounds.
    pub(crate) unsafe fn resolve_range_shared(
        &self,
        grid: &SpatialGrid,
        range: CellRange,
        particles: &SharedParticles<'_>,
        scratch: &mut Vec<u32>,
    ) -> SweepStats {
        let mut stats = SweepStats::default();

        for cell in range.cells() {
            scratch.clear();
            grid.gather_neighborhood(cell, scratch);

            let count = scratch.len();
            for a in 0..count {
                for b in (a + 1)..count {
                    let i = scratch[a] as usize;
                    let j = scratch[b] as usize;
                    stats.pairs_tested += 1;

                    if let Some((state_i, state_j)) =
                        self.resolve_pair(particles.load(i), particles.load(j))
                    {
                        particles.store(i, state_i.0, state_i.1);
                        particles.store(j, state_j.0, state_j.1);
                        stats.contacts_resolved += 1;
                    }
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CellCapacity;
    use approx::assert_abs_diff_eq;

    const R: f32 = 0.01;

    #[test]
    fn separated_pair_is_untouched() {
        let resolver = CollisionResolver::new(R, 0.5, 0.5);
        let a = (Vec2::ZERO, Vec2::ZERO);
        let b = (Vec2::new(0.03, 0.0), Vec2::new(0.03, 0.0));
        assert!(resolver.resolve_pair(a, b).is_none());
    }

    #[test]
    fn coincident_particles_separate_vertically() {
        let resolver = CollisionResolver::new(R, 0.5, 0.5);
        let state = (Vec2::ZERO, Vec2::ZERO);
        let ((pa, _), (pb, _)) = resolver.resolve_pair(state, state).unwrap();
        assert_abs_diff_eq!(pa.y, R, epsilon = 1e-6);
        assert_abs_diff_eq!(pb.y, -R, epsilon = 1e-6);
        assert_eq!(pa.x, 0.0);
    }

    #[test]
    fn push_does_not_inject_velocity() {
        let resolver = CollisionResolver::new(R, 1.0, 0.5);
        let a = (Vec2::ZERO, Vec2::ZERO);
        let b = (Vec2::new(0.01, 0.0), Vec2::new(0.01, 0.0));
        let ((pa, qa), (pb, qb)) = resolver.resolve_pair(a, b).unwrap();
        assert_eq!(pa - qa, Vec2::ZERO);
        assert_eq!(pb - qb, Vec2::ZERO);
        assert_abs_diff_eq!(pb.x - pa.x, 2.0 * R, epsilon = 1e-6);
    }

    #[test]
    fn inelastic_impulse_cancels_approach_velocity() {
        let resolver = CollisionResolver::new(R, 0.0, 0.5);
        let velocity = Vec2::new(0.004, 0.0);
        let a = (Vec2::new(-0.009, 0.0), Vec2::new(-0.009, 0.0) - velocity);
        let b = (Vec2::new(0.009, 0.0), Vec2::new(0.009, 0.0) + velocity);
        let ((pa, qa), (pb, qb)) = resolver.resolve_pair(a, b).unwrap();
        let relative = (pa - qa) - (pb - qb);
        assert_abs_diff_eq!(relative.x, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn elastic_impulse_reverses_approach_velocity() {
        let resolver = CollisionResolver::new(R, 1.0, 0.5);
        let velocity = Vec2::new(0.004, 0.0);
        let a = (Vec2::new(-0.009, 0.0), Vec2::new(-0.009, 0.0) - velocity);
        let b = (Vec2::new(0.009, 0.0), Vec2::new(0.009, 0.0) + velocity);
        let ((pa, qa), (pb, qb)) = resolver.resolve_pair(a, b).unwrap();
        assert_abs_diff_eq!((pa - qa).x, -velocity.x, epsilon = 1e-6);
        assert_abs_diff_eq!((pb - qb).x, velocity.x, epsilon = 1e-6);
    }

    #[test]
    fn receding_pair_keeps_its_velocity() {
        let resolver = CollisionResolver::new(R, 0.5, 0.5);
        let velocity = Vec2::new(0.002, 0.0);
        let a = (Vec2::new(-0.005, 0.0), Vec2::new(-0.005, 0.0) + velocity);
        let b = (Vec2::new(0.005, 0.0), Vec2::new(0.005, 0.0) - velocity);
        let ((pa, qa), (pb, qb)) = resolver.resolve_pair(a, b).unwrap();
        assert_abs_diff_eq!((pa - qa).x, -velocity.x, epsilon = 1e-6);
        assert_abs_diff_eq!((pb - qb).x, velocity.x, epsilon = 1e-6);
    }

    #[test]
    fn stale_grid_is_refused() {
        let mut grid = SpatialGrid::new(Vec2::splat(-1.0), 2.0 * R, 100, 100, CellCapacity::Dynamic);
        grid.rebuild(&ParticlesSoA::from_positions(vec![Vec2::ZERO; 3]));

        let mut particles = ParticlesSoA::from_positions(vec![Vec2::ZERO]);
        let resolver = CollisionResolver::new(R, 0.5, 0.5);
        let stats = resolver.resolve_pass(&mut particles, &grid, grid.interior());

        assert_eq!(stats, SweepStats::default());
        assert_eq!(particles.positions, vec![Vec2::ZERO]);
    }

    #[test]
    fn mismatched_arrays_are_refused() {
        let mut particles = ParticlesSoA::from_positions(vec![Vec2::ZERO, Vec2::new(0.005, 0.0)]);
        let mut grid = SpatialGrid::new(Vec2::splat(-1.0), 2.0 * R, 100, 100, CellCapacity::Dynamic);
        grid.rebuild(&particles);
        particles.previous.pop();

        let resolver = CollisionResolver::new(R, 0.5, 0.5);
        let stats = resolver.resolve_pass(&mut particles, &grid, grid.interior());
        assert_eq!(stats, SweepStats::default());
        assert_eq!(particles.positions[1], Vec2::new(0.005, 0.0));
    }

    #[test]
    #[should_panic(expected = "out of")]
    fn shared_view_bounds_checks_indices() {
        let mut particles = ParticlesSoA::from_positions(vec![Vec2::ZERO, Vec2::X]);
        particles.previous.pop();
        let shared = SharedParticles::new(&mut particles);
        // SAFETY: single-threaded; index 1 has no previous position.
        unsafe {
            shared.load(1);
        }
    }

    #[test]
    fn pair_straddling_two_cells_is_seen_from_both() {
        let mut particles =
            ParticlesSoA::from_positions(vec![Vec2::new(0.0195, 0.01), Vec2::new(0.0205, 0.01)]);
        let mut grid = SpatialGrid::new(Vec2::splat(-1.0), 2.0 * R, 100, 100, CellCapacity::Dynamic);
        grid.rebuild(&particles);
        let left = grid.cell_of_particle(0).unwrap();
        let right = grid.cell_of_particle(1).unwrap();
        assert_eq!(right.x, left.x + 1);
        assert_eq!(right.y, left.y);

        let resolver = CollisionResolver::new(R, 0.5, 0.5);
        let stats = resolver.resolve_pass(
            &mut particles,
            &grid,
            CellRange::new(left.x, right.x + 1, left.y, left.y + 1),
        );

        assert_eq!(stats.pairs_tested, 2);
        assert!(stats.contacts_resolved >= 1);
        let distance = particles.positions[0].distance(particles.positions[1]);
        assert!(distance >= 2.0 * R - 1e-5, "distance = {distance}");
    }

    #[test]
    fn pass_over_shared_cell_separates_overlap() {
        let mut particles =
            ParticlesSoA::from_positions(vec![Vec2::new(0.001, 0.001), Vec2::new(0.006, 0.001)]);
        let mut grid = SpatialGrid::new(Vec2::splat(-1.0), 2.0 * R, 100, 100, CellCapacity::Dynamic);
        grid.rebuild(&particles);

        let resolver = CollisionResolver::new(R, 0.5, 0.5);
        let cell = grid.cell_of(particles.positions[0]);
        let stats = resolver.resolve_pass(
            &mut particles,
            &grid,
            CellRange::new(cell.x, cell.x + 1, cell.y, cell.y + 1),
        );

        assert_eq!(stats.contacts_resolved, 1);
        let distance = particles.positions[0].distance(particles.positions[1]);
        assert!(distance >= 2.0 * R - 1e-5, "distance = {distance}");
    }
}
