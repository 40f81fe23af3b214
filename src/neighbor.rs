//! Uniform-grid neighbor search for the SPH passes.
//!
//! The fluid domain is bounded, so cells live in a dense array built with a
//! counting sort instead of a hash map. Candidates come back sorted by
//! particle index, which keeps kernel sums in the same order as the
//! all-pairs scan and therefore bit-identical to it.

use crate::error::{PhysicsError, PhysicsResult};
use crate::float::Float;
use crate::vec::Vec2;
use alloc::vec;
use alloc::vec::Vec as AllocVec;

/// How the fluid solver finds particles within the smoothing radius.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum NeighborSearch {
    /// Test every pair. O(n²), fine for tens to low hundreds of particles.
    #[default]
    BruteForce,
    /// Bin particles into radius-sized cells and test the 3x3 block around each.
    Grid,
}

/// Dense uniform grid covering an axis-aligned domain.
#[derive(Clone, Debug)]
pub struct NeighborGrid<F: Float> {
    origin: Vec2<F>,
    inv_cell: F,
    cols: usize,
    rows: usize,
    cell_start: AllocVec<usize>,
    entries: AllocVec<usize>,
}

/// Upper bound on grid cells; a finer grid is a configuration error.
pub const MAX_GRID_CELLS: usize = 1 << 22;

impl<F: Float> NeighborGrid<F> {
    /// Columns and rows needed to tile `[min, max]` with `cell_size` cells,
    /// or `None` when the grid would exceed [`MAX_GRID_CELLS`].
    pub fn dimensions_for(min: Vec2<F>, max: Vec2<F>, cell_size: F) -> Option<(usize, usize)> {
        let cell_size = cell_size.max(F::from_f32(1e-6));
        let span = |lo: F, hi: F| {
            let n = ((hi - lo).max(F::zero()) / cell_size).ceil().to_f64().max(1.0);
            if n.is_finite() && n <= MAX_GRID_CELLS as f64 { Some(n as usize) } else { None }
        };
        let cols = span(min.x, max.x)?;
        let rows = span(min.y, max.y)?;
        cols.checked_mul(rows).filter(|&cells| cells <= MAX_GRID_CELLS)?;
        Some((cols, rows))
    }

    /// `cell_size` must be at least the query radius.
    pub fn new(min: Vec2<F>, max: Vec2<F>, cell_size: F) -> PhysicsResult<Self> {
        let (cols, rows) = Self::dimensions_for(min, max, cell_size)
            .ok_or(PhysicsError::InvalidParameter("neighbor_search"))?;
        Ok(NeighborGrid {
            origin: min,
            inv_cell: F::one() / cell_size.max(F::from_f32(1e-6)),
            cols,
            rows,
            cell_start: vec![0; cols * rows + 1],
            entries: AllocVec::new(),
        })
    }

    fn cell_coord(&self, value: F, origin: F, count: usize) -> usize {
        let c = ((value - origin) * self.inv_cell).floor().to_f64();
        if c.is_nan() || c < 0.0 {
            0
        } else {
            (c as usize).min(count - 1)
        }
    }

    fn cell_of(&self, p: Vec2<F>) -> (usize, usize) {
        (
            self.cell_coord(p.x, self.origin.x, self.cols),
            self.cell_coord(p.y, self.origin.y, self.rows),
        )
    }

    /// Re-bin every point. Points outside the domain land in the edge cells.
    pub fn rebuild(&mut self, points: &[Vec2<F>]) {
        let cells = self.cols * self.rows;
        self.cell_start.clear();
        self.cell_start.resize(cells + 1, 0);

        for &p in points {
            let (cx, cy) = self.cell_of(p);
            self.cell_start[cy * self.cols + cx + 1] += 1;
        }
        for i in 0..cells {
            self.cell_start[i + 1] += self.cell_start[i];
        }

        self.entries.clear();
        self.entries.resize(points.len(), 0);
        let mut cursor = self.cell_start.clone();
        for (i, &p) in points.iter().enumerate() {
            let (cx, cy) = self.cell_of(p);
            let slot = &mut cursor[cy * self.cols + cx];
            self.entries[*slot] = i;
            *slot += 1;
        }
    }

    /// Indices in the 3x3 cell block around `point`, ascending.
    pub fn candidates(&self, point: Vec2<F>, out: &mut AllocVec<usize>) {
        out.clear();
        let (cx, cy) = self.cell_of(point);
        for y in cy.saturating_sub(1)..=(cy + 1).min(self.rows - 1) {
            for x in cx.saturating_sub(1)..=(cx + 1).min(self.cols - 1) {
                let cell = y * self.cols + x;
                out.extend_from_slice(&self.entries[self.cell_start[cell]..self.cell_start[cell + 1]]);
            }
        }
        out.sort_unstable();
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }
}
