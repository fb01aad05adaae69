use log::debug;

use crate::{
    config::{MAX_SUBDIVISION_DEPTH, MIN_REGION_EXTENT},
    core::types::CellRange,
    error::{Result, SimError},
};

/// Number of checkerboard passes per tick.
pub const PASS_COUNT: usize = 4;

/// One of the four halves-of-halves of a region.
///
/// "Top" is the low-`y` half of the grid rows, "left" the low-`x` half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    pub const ALL: [Quadrant; PASS_COUNT] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    /// Quadrant active during `pass` (0..4).
    pub fn for_pass(pass: usize) -> Quadrant {
        Self::ALL[pass % PASS_COUNT]
    }

    /// Cells of `region` belonging to this quadrant, split at the region midpoint.
    pub fn of(self, region: &CellRange) -> CellRange {
        let mid_x = region.x0 + region.width() / 2;
        let mid_y = region.y0 + region.height() / 2;
        match self {
            Quadrant::TopLeft => CellRange::new(region.x0, mid_x, region.y0, mid_y),
            Quadrant::TopRight => CellRange::new(mid_x, region.x1, region.y0, mid_y),
            Quadrant::BottomLeft => CellRange::new(region.x0, mid_x, mid_y, region.y1),
            Quadrant::BottomRight => CellRange::new(mid_x, region.x1, mid_y, region.y1),
        }
    }
}

/// Leaf regions of one subdivision, plus the quadrant ranges each pass activates.
#[derive(Debug, Clone)]
pub struct RegionPartition {
    depth: u32,
    regions: Vec<CellRange>,
    passes: [Vec<CellRange>; PASS_COUNT],
}

impl RegionPartition {
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Leaf regions, one per worker.
    pub fn regions(&self) -> &[CellRange] {
        &self.regions
    }

    pub fn worker_count(&self) -> usize {
        self.regions.len()
    }

    /// Quadrant ranges processed concurrently during `pass`, in region order.
    pub fn pass(&self, pass: usize) -> &[CellRange] {
        &self.passes[pass % PASS_COUNT]
    }
}

/// Recursively bisects the grid interior into `2^depth` leaf regions.
///
/// Splits alternate between the x axis (even levels) and the y axis (odd
/// levels). Every leaf must be at least [`MIN_REGION_EXTENT`] cells wide and
/// tall: with both halves of every leaf at least two cells across, the 3x3
/// neighbourhoods swept by two regions' same-named quadrants can never share a
/// cell, so a pass needs no locking.
#[derive(Debug, Clone, Copy)]
pub struct RegionPartitioner {
    pub depth: u32,
}

impl RegionPartitioner {
    pub fn new(depth: u32) -> Self {
        Self { depth }
    }

    pub fn partition(&self, interior: CellRange) -> Result<RegionPartition> {
        if self.depth > MAX_SUBDIVISION_DEPTH {
            return Err(SimError::DepthTooLarge {
                depth: self.depth,
                max: MAX_SUBDIVISION_DEPTH,
            });
        }

        let mut regions = Vec::with_capacity(1 << self.depth);
        bisect(interior, self.depth, 0, &mut regions);

        if let Some(small) = regions
            .iter()
            .find(|r| r.width() < MIN_REGION_EXTENT || r.height() < MIN_REGION_EXTENT)
        {
            return Err(SimError::RegionTooSmall {
                depth: self.depth,
                width: small.width(),
                height: small.height(),
                min: MIN_REGION_EXTENT,
            });
        }

        let passes: [Vec<CellRange>; PASS_COUNT] =
            Quadrant::ALL.map(|quadrant| regions.iter().map(|r| quadrant.of(r)).collect());

        debug!(
            "Partitioned {}x{} interior into {} region(s) at depth {}",
            interior.width(),
            interior.height(),
            regions.len(),
            self.depth
        );

        Ok(RegionPartition {
            depth: self.depth,
            regions,
            passes,
        })
    }
}

fn bisect(range: CellRange, remaining: u32, level: u32, out: &mut Vec<CellRange>) {
    if remaining == 0 {
        out.push(range);
        return;
    }

    let (low, high) = if level % 2 == 0 {
        let mid = range.x0 + range.width() / 2;
        (
            CellRange::new(range.x0, mid, range.y0, range.y1),
            CellRange::new(mid, range.x1, range.y0, range.y1),
        )
    } else {
        let mid = range.y0 + range.height() / 2;
        (
            CellRange::new(range.x0, range.x1, range.y0, mid),
            CellRange::new(range.x0, range.x1, mid, range.y1),
        )
    };

    bisect(low, remaining - 1, level + 1, out);
    bisect(high, remaining - 1, level + 1, out);
}
