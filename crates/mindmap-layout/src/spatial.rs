#![forbid(unsafe_code)]

//! Uniform spatial grid over node boxes.
//!
//! Each box is inserted into every fixed-size cell it overlaps. Point queries
//! touch a single cell; neighborhood queries touch a `(2r + 1)²` block of
//! cells around the point. Both are independent of the total node count as
//! long as node density is roughly uniform, which holds for tree layouts.
//!
//! Boxes spanning more than [`MAX_CELLS_PER_ENTRY`] cells (a very long label)
//! are kept in a separate list that every query scans, so a single huge node
//! cannot blow up the cell map.

use mindmap_core::geometry::{Bounds, Point};
use mindmap_core::node::NodeId;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Boxes covering more cells than this go to the oversized list.
pub const MAX_CELLS_PER_ENTRY: i64 = 64;

type CellKey = (i32, i32);

/// Grid of node boxes keyed by integer cell coordinates.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: FxHashMap<CellKey, SmallVec<[u32; 8]>>,
    entries: Vec<(NodeId, Bounds)>,
    oversized: Vec<u32>,
}

impl SpatialGrid {
    /// Create an empty grid. Non-positive sizes fall back to 1.
    #[must_use]
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };
        Self {
            cell_size,
            cells: FxHashMap::default(),
            entries: Vec::new(),
            oversized: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Cell containing `p` (floor division).
    #[inline]
    #[must_use]
    pub fn cell_of(&self, p: Point) -> CellKey {
        (self.axis_cell(p.x), self.axis_cell(p.y))
    }

    #[inline]
    fn axis_cell(&self, value: f64) -> i32 {
        // `as` saturates out-of-range values and maps NaN to 0.
        (value / self.cell_size).floor() as i32
    }

    /// Insert a box. Returns its entry index.
    pub fn insert(&mut self, id: NodeId, bounds: Bounds) -> usize {
        let slot = self.entries.len();
        let slot_u32 = slot as u32;
        self.entries.push((id, bounds));

        let (x0, y0) = (self.axis_cell(bounds.min_x), self.axis_cell(bounds.min_y));
        let (x1, y1) = (self.axis_cell(bounds.max_x), self.axis_cell(bounds.max_y));
        let span = (i64::from(x1) - i64::from(x0) + 1) * (i64::from(y1) - i64::from(y0) + 1);
        if span > MAX_CELLS_PER_ENTRY {
            self.oversized.push(slot_u32);
            return slot;
        }
        for ix in x0..=x1 {
            for iy in y0..=y1 {
                self.cells.entry((ix, iy)).or_default().push(slot_u32);
            }
        }
        slot
    }

    /// Entry by index.
    #[inline]
    #[must_use]
    pub fn entry(&self, slot: usize) -> Option<(&NodeId, Bounds)> {
        self.entries.get(slot).map(|(id, b)| (id, *b))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Entries registered in the cell containing `p`, in insertion order.
    ///
    /// These are candidates; callers still test containment.
    #[must_use]
    pub fn query_point(&self, p: Point) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .cells
            .get(&self.cell_of(p))
            .map(|slots| slots.iter().map(|&s| s as usize).collect())
            .unwrap_or_default();
        out.extend(self.oversized.iter().map(|&s| s as usize));
        out.sort_unstable();
        out
    }

    /// Entries in the `(2 * radius + 1)²` block of cells around `p`,
    /// deduplicated and in insertion order.
    #[must_use]
    pub fn query_radius(&self, p: Point, radius: u32) -> Vec<usize> {
        let (cx, cy) = self.cell_of(p);
        let r = i32::try_from(radius).unwrap_or(i32::MAX);
        let mut seen = FxHashSet::default();
        for ix in cx.saturating_sub(r)..=cx.saturating_add(r) {
            for iy in cy.saturating_sub(r)..=cy.saturating_add(r) {
                if let Some(slots) = self.cells.get(&(ix, iy)) {
                    seen.extend(slots.iter().map(|&s| s as usize));
                }
            }
        }
        seen.extend(self.oversized.iter().map(|&s| s as usize));
        let mut out: Vec<usize> = seen.into_iter().collect();
        out.sort_unstable();
        out
    }

    /// Entries whose box intersects `rect`, in insertion order.
    #[must_use]
    pub fn query_rect(&self, rect: Bounds) -> Vec<usize> {
        let (x0, y0) = (self.axis_cell(rect.min_x), self.axis_cell(rect.min_y));
        let (x1, y1) = (self.axis_cell(rect.max_x), self.axis_cell(rect.max_y));
        let mut seen = FxHashSet::default();
        let cells = (i64::from(x1) - i64::from(x0) + 1) * (i64::from(y1) - i64::from(y0) + 1);
        if cells as usize > self.cells.len() {
            // Query wider than the populated area: walk the cells instead.
            for ((ix, iy), slots) in &self.cells {
                if (x0..=x1).contains(ix) && (y0..=y1).contains(iy) {
                    seen.extend(slots.iter().map(|&s| s as usize));
                }
            }
        } else {
            for ix in x0..=x1 {
                for iy in y0..=y1 {
                    if let Some(slots) = self.cells.get(&(ix, iy)) {
                        seen.extend(slots.iter().map(|&s| s as usize));
                    }
                }
            }
        }
        seen.extend(self.oversized.iter().map(|&s| s as usize));
        let mut out: Vec<usize> = seen
            .into_iter()
            .filter(|&s| self.entries[s].1.intersects(&rect))
            .collect();
        out.sort_unstable();
        out
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(240.0)
    }
}
