use serde::{Deserialize, Serialize};

/// Common math types re-exported for convenience.
pub use glam::Vec2;

/// Integer coordinates of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: usize,
    pub y: usize,
}

impl CellCoord {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Half-open rectangle of cell coordinates `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub x0: usize,
    pub x1: usize,
    pub y0: usize,
    pub y1: usize,
}

impl CellRange {
    pub fn new(x0: usize, x1: usize, y0: usize, y1: usize) -> Self {
        Self { x0, x1, y0, y1 }
    }

    pub fn width(&self) -> usize {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> usize {
        self.y1.saturating_sub(self.y0)
    }

    pub fn cell_count(&self) -> usize {
        self.width() * self.height()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    pub fn contains(&self, cell: CellCoord) -> bool {
        (self.x0..self.x1).contains(&cell.x) && (self.y0..self.y1).contains(&cell.y)
    }

    /// Grows the range by `by` cells on every side (saturating at zero).
    pub fn expanded(&self, by: usize) -> Self {
        Self {
            x0: self.x0.saturating_sub(by),
            x1: self.x1 + by,
            y0: self.y0.saturating_sub(by),
            y1: self.y1 + by,
        }
    }

    pub fn intersects(&self, other: &CellRange) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    /// Iterates cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (self.y0..self.y1).flat_map(move |y| (self.x0..self.x1).map(move |x| CellCoord::new(x, y)))
    }
}

/// Verlet update form used by the integrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntegrationScheme {
    /// `x' = x + v + a * dt^2`, meant for a constant tick length.
    #[default]
    Fixed,
    /// `x' = x + v * (dt / dt_prev) + a * dt * (dt + dt_prev) / 2`, tolerant of varying dt.
    TimeCorrected,
}

/// Shape particles are confined to after every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoundaryShape {
    /// The square `[-1 + r, 1 - r]^2`.
    #[default]
    Square,
    /// The disc of radius `1 - r` around the origin.
    Circle,
}

/// Storage policy for grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellCapacity {
    /// Cells hold any number of particles.
    #[default]
    Dynamic,
    /// Cells hold at most this many particles; extra entries are dropped for the tick.
    Fixed(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_intersection_is_half_open() {
        let a = CellRange::new(0, 4, 0, 4);
        let b = CellRange::new(4, 8, 0, 4);
        assert!(!a.intersects(&b));
        assert!(a.expanded(1).intersects(&b));
    }

    #[test]
    fn range_cells_visit_every_cell_once() {
        let range = CellRange::new(2, 5, 1, 3);
        let cells: Vec<_> = range.cells().collect();
        assert_eq!(cells.len(), range.cell_count());
        assert_eq!(cells[0], CellCoord::new(2, 1));
        assert_eq!(cells[cells.len() - 1], CellCoord::new(4, 2));
    }
}
