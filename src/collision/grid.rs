use glam::Vec2;
use log::warn;

use crate::core::{
    particles::ParticlesSoA,
    types::{CellCapacity, CellCoord, CellRange},
};

/// Uniform grid binning particle indices into square cells.
///
/// Cells are stored as one contiguous bucket arena: `cell_start[c]..cell_start[c + 1]`
/// indexes the particles of cell `c` inside `entries`. The arena is rebuilt with a
/// counting sort every tick and its allocations are reused, so a cell can never
/// overflow under [`CellCapacity::Dynamic`].
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    domain_min: Vec2,
    width: usize,
    height: usize,
    capacity: CellCapacity,
    cell_start: Vec<u32>,
    entries: Vec<u32>,
    particle_cells: Vec<u32>,
    cursor: Vec<u32>,
    overflow_count: usize,
}

impl SpatialGrid {
    pub fn new(
        domain_min: Vec2,
        cell_size: f32,
        width: usize,
        height: usize,
        capacity: CellCapacity,
    ) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let cells = width * height;
        Self {
            cell_size,
            domain_min,
            width,
            height,
            capacity,
            cell_start: vec![0; cells + 1],
            entries: Vec::new(),
            particle_cells: Vec::new(),
            cursor: vec![0; cells],
            overflow_count: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of particles the last rebuild binned (or dropped).
    pub fn particle_count(&self) -> usize {
        self.particle_cells.len()
    }

    /// Particles dropped by the last rebuild because a fixed-capacity cell was full.
    pub fn overflow_count(&self) -> usize {
        self.overflow_count
    }

    /// Cells that are not on the outer halo ring.
    pub fn interior(&self) -> CellRange {
        CellRange::new(
            1,
            self.width.saturating_sub(1),
            1,
            self.height.saturating_sub(1),
        )
    }

    /// Cell containing `position`, clamped onto the grid.
    pub fn cell_of(&self, position: Vec2) -> CellCoord {
        let local = (position - self.domain_min) / self.cell_size;
        CellCoord::new(
            clamp_axis(local.x, self.width),
            clamp_axis(local.y, self.height),
        )
    }

    #[inline]
    fn cell_id(&self, cell: CellCoord) -> usize {
        cell.y * self.width + cell.x
    }

    /// Particle indices stored in `cell`, in ascending index order.
    #[inline]
    pub fn cell(&self, cell: CellCoord) -> &[u32] {
        let id = self.cell_id(cell);
        let start = self.cell_start[id] as usize;
        let end = self.cell_start[id + 1] as usize;
        &self.entries[start..end]
    }

    /// Cell the particle was binned into by the last rebuild.
    pub fn cell_of_particle(&self, index: usize) -> Option<CellCoord> {
        self.particle_cells.get(index).map(|&id| {
            let id = id as usize;
            CellCoord::new(id % self.width, id / self.width)
        })
    }

    /// Appends every particle index of the 3x3 block around `center` to `out`.
    pub fn gather_neighborhood(&self, center: CellCoord, out: &mut Vec<u32>) {
        let x0 = center.x.saturating_sub(1);
        let y0 = center.y.saturating_sub(1);
        let x1 = (center.x + 1).min(self.width - 1);
        let y1 = (center.y + 1).min(self.height - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                out.extend_from_slice(self.cell(CellCoord::new(x, y)));
            }
        }
    }

    /// Clears every cell and re-bins all particles.
    pub fn rebuild(&mut self, particles: &ParticlesSoA) {
        let count = particles.len();
        self.particle_cells.clear();
        self.particle_cells.reserve(count);
        self.cell_start.fill(0);

        for &position in &particles.positions {
            let id = self.cell_id(self.cell_of(position));
            self.particle_cells.push(id as u32);
            self.cell_start[id + 1] += 1;
        }

        let limit = match self.capacity {
            CellCapacity::Dynamic => u32::MAX,
            CellCapacity::Fixed(capacity) => capacity.min(u32::MAX as usize) as u32,
        };

        self.overflow_count = 0;
        for id in 0..self.cursor.len() {
            let stored = self.cell_start[id + 1];
            if stored > limit {
                self.overflow_count += (stored - limit) as usize;
            }
            self.cell_start[id + 1] = self.cell_start[id] + stored.min(limit);
        }

        let cells = self.cursor.len();
        let total = self.cell_start[cells] as usize;
        self.entries.clear();
        self.entries.resize(total, 0);
        self.cursor.copy_from_slice(&self.cell_start[..cells]);

        for (index, &id) in self.particle_cells.iter().enumerate() {
            let id = id as usize;
            let slot = self.cursor[id];
            if slot < self.cell_start[id + 1] {
                self.entries[slot as usize] = index as u32;
                self.cursor[id] = slot + 1;
            }
        }

        if self.overflow_count > 0 {
            warn!(
                "Spatial grid dropped {} particle(s) from full cells (capacity {})",
                self.overflow_count, limit
            );
        }
    }
}

#[inline]
fn clamp_axis(value: f32, cells: usize) -> usize {
    if value.is_nan() || value < 0.0 {
        return 0;
    }
    (value as usize).min(cells - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_grid(capacity: CellCapacity) -> SpatialGrid {
        SpatialGrid::new(Vec2::splat(-1.0), 0.5, 4, 4, capacity)
    }

    #[test]
    fn cell_of_clamps_outside_positions() {
        let grid = unit_grid(CellCapacity::Dynamic);
        assert_eq!(grid.cell_of(Vec2::new(-1.0, -1.0)), CellCoord::new(0, 0));
        assert_eq!(grid.cell_of(Vec2::new(-0.25, 0.75)), CellCoord::new(1, 3));
        assert_eq!(grid.cell_of(Vec2::new(5.0, -5.0)), CellCoord::new(3, 0));
        assert_eq!(grid.cell_of(Vec2::new(1.0, 1.0)), CellCoord::new(3, 3));
    }

    #[test]
    fn rebuild_bins_every_particle_once() {
        let mut grid = unit_grid(CellCapacity::Dynamic);
        let particles = ParticlesSoA::from_positions(vec![
            Vec2::new(-0.9, -0.9),
            Vec2::new(0.1, 0.1),
            Vec2::new(-0.8, -0.7),
            Vec2::new(0.2, 0.2),
        ]);
        grid.rebuild(&particles);

        assert_eq!(grid.cell(CellCoord::new(0, 0)), &[0, 2]);
        assert_eq!(grid.cell(CellCoord::new(2, 2)), &[1, 3]);
        assert_eq!(grid.cell_of_particle(1), Some(CellCoord::new(2, 2)));
        assert_eq!(grid.overflow_count(), 0);
    }

    #[test]
    fn fixed_capacity_drops_overflow() {
        let mut grid = unit_grid(CellCapacity::Fixed(2));
        let particles = ParticlesSoA::from_positions(vec![Vec2::new(0.1, 0.1); 5]);
        grid.rebuild(&particles);

        assert_eq!(grid.cell(CellCoord::new(2, 2)), &[0, 1]);
        assert_eq!(grid.overflow_count(), 3);
    }

    #[test]
    fn zero_dimensions_collapse_to_a_single_cell() {
        let mut grid = SpatialGrid::new(Vec2::splat(-1.0), 0.5, 0, 0, CellCapacity::Dynamic);
        assert_eq!((grid.width(), grid.height()), (1, 1));
        assert!(grid.interior().is_empty());

        let particles = ParticlesSoA::from_positions(vec![Vec2::new(0.3, -0.7), Vec2::ZERO]);
        grid.rebuild(&particles);
        assert_eq!(grid.cell_of(Vec2::new(5.0, 5.0)), CellCoord::new(0, 0));
        assert_eq!(grid.cell(CellCoord::new(0, 0)), &[0, 1]);
        assert_eq!(grid.particle_count(), 2);

        let mut out = Vec::new();
        grid.gather_neighborhood(CellCoord::new(0, 0), &mut out);
        assert_eq!(out, vec![0, 1]);
    }

    #[test]
    fn neighborhood_is_clipped_at_grid_edges() {
        let mut grid = unit_grid(CellCapacity::Dynamic);
        let particles = ParticlesSoA::from_positions(vec![
            Vec2::new(-0.9, -0.9),
            Vec2::new(-0.4, -0.4),
            Vec2::new(0.9, 0.9),
        ]);
        grid.rebuild(&particles);

        let mut out = Vec::new();
        grid.gather_neighborhood(CellCoord::new(0, 0), &mut out);
        assert_eq!(out, vec![0, 1]);
    }
}
