#![forbid(unsafe_code)]

//! Left-to-right tiered tree layout.
//!
//! # Algorithm
//!
//! 1. **Flatten**: one pre-order walk records every node with its parent,
//!    depth level, visibility (no collapsed ancestor) and estimated size.
//! 2. **Level widths**: the maximum width per level over visible nodes. All
//!    nodes of a level share one left edge, so columns line up across
//!    different parents. The root is centered on `x = 0`; each next level
//!    starts `horizontal_gap` after the previous level's widest node.
//! 3. **Subtree heights** (bottom-up): `max(own height, children's subtree
//!    heights + vertical gaps)`. A tall parent never compresses its children
//!    and a tall child subtree is never clipped by a short parent.
//! 4. **Placement** (top-down): children are stacked in order, vertically
//!    centered on their parent's `y`.
//!
//! Children of a collapsed node are still positioned (as if the node were
//! expanded) and marked `visible: false`, so a toggle only flips visibility
//! at render time. They do not contribute to their ancestors' subtree
//! heights nor to level widths, except on a level that has no visible node
//! at all.
//!
//! The computation is a deterministic function of `(tree, config)`. Every
//! pass is iterative, so very deep chains are fine.

use std::sync::Arc;

use mindmap_core::geometry::{Bounds, Point, Size};
use mindmap_core::node::{Node, NodeId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use web_time::Instant;

use crate::config::LayoutConfig;
use crate::measure::{SizeCache, SizeCacheStats};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Computed placement of one node. `x`/`y` is the node's center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Depth from the root (root = 0).
    pub level: usize,
    /// `false` when any ancestor is collapsed.
    pub visible: bool,
}

impl Position {
    #[inline]
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[inline]
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::from_center(self.center(), self.size())
    }

    #[inline]
    #[must_use]
    pub fn left(&self) -> f64 {
        self.x - self.width / 2.0
    }

    #[inline]
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width / 2.0
    }

    #[inline]
    #[must_use]
    pub fn top(&self) -> f64 {
        self.y - self.height / 2.0
    }

    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

// ---------------------------------------------------------------------------
// PositionMap
// ---------------------------------------------------------------------------

/// Layout result: positions in tree pre-order plus an id index.
///
/// Serializes as a plain list so it can cross a worker boundary; the index
/// is rebuilt on deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Position>", into = "Vec<Position>")]
pub struct PositionMap {
    entries: Vec<Position>,
    index: FxHashMap<NodeId, usize>,
}

impl PositionMap {
    /// Build a map from positions already in pre-order.
    #[must_use]
    pub fn from_entries(entries: Vec<Position>) -> Self {
        let mut index = FxHashMap::with_capacity_and_hasher(entries.len(), Default::default());
        for (i, position) in entries.iter().enumerate() {
            index.insert(position.id.clone(), i);
        }
        Self { entries, index }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Position> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Positions in pre-order.
    pub fn iter(&self) -> std::slice::Iter<'_, Position> {
        self.entries.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Position] {
        &self.entries
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

    /// Positions of visible nodes, in pre-order.
    pub fn visible(&self) -> impl Iterator<Item = &Position> + '_ {
        self.entries.iter().filter(|p| p.visible)
    }

    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.visible().count()
    }

    /// Bounding box of all visible nodes; `None` when nothing is visible.
    #[must_use]
    pub fn content_bounds(&self) -> Option<Bounds> {
        self.visible()
            .map(Position::bounds)
            .reduce(|acc, b| acc.union(&b))
    }
}

impl PartialEq for PositionMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl From<Vec<Position>> for PositionMap {
    fn from(entries: Vec<Position>) -> Self {
        Self::from_entries(entries)
    }
}

impl From<PositionMap> for Vec<Position> {
    fn from(map: PositionMap) -> Self {
        map.entries
    }
}

impl<'a> IntoIterator for &'a PositionMap {
    type Item = &'a Position;
    type IntoIter = std::slice::Iter<'a, Position>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// LayoutEngine
// ---------------------------------------------------------------------------

/// One node as seen by the passes.
struct Slot<'a> {
    node: &'a Node,
    level: usize,
    visible: bool,
    size: Size,
    children: SmallVec<[usize; 4]>,
}

/// Layout engine that keeps its size cache between passes.
///
/// Use one engine per tree being edited; re-running [`compute`](Self::compute)
/// after an edit only re-measures texts that changed.
///
/// ```
/// use mindmap_core::node::Node;
/// use mindmap_layout::{LayoutConfig, LayoutEngine};
///
/// let root = Node::new("r", "Root").child(Node::new("a", "A"));
/// let mut engine = LayoutEngine::new(LayoutConfig::default());
/// let positions = engine.compute(Some(&root));
/// assert_eq!(positions.len(), 2);
/// assert_eq!(positions.get("r").map(|p| p.x), Some(0.0));
/// ```
#[derive(Debug)]
pub struct LayoutEngine {
    config: LayoutConfig,
    fingerprint: u64,
    sizes: SizeCache,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl LayoutEngine {
    #[must_use]
    pub fn new(config: LayoutConfig) -> Self {
        Self::with_cache(config, SizeCache::default())
    }

    /// Engine using a caller-provided (e.g. smaller) size cache.
    #[must_use]
    pub fn with_cache(config: LayoutConfig, sizes: SizeCache) -> Self {
        Self {
            fingerprint: config.fingerprint(),
            config,
            sizes,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Replace the config. Cached sizes are invalidated only when a field
    /// actually changed.
    pub fn set_config(&mut self, config: LayoutConfig) {
        let fingerprint = config.fingerprint();
        if fingerprint != self.fingerprint {
            self.sizes.invalidate_all();
            self.fingerprint = fingerprint;
        }
        self.config = config;
    }

    #[must_use]
    pub fn cache_stats(&self) -> SizeCacheStats {
        self.sizes.stats()
    }

    /// Lay out the tree. `None` yields an empty map.
    pub fn compute(&mut self, root: Option<&Node>) -> PositionMap {
        let Some(root) = root else {
            return PositionMap::default();
        };
        let start = Instant::now();
        let span = tracing::debug_span!(
            target: "mindmap.layout",
            "layout.compute",
            node_count = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        )
        .entered();
        let before = self.sizes.stats();

        let slots = self.flatten(root);
        let level_left = self.level_left_edges(&slots);
        let subtree_heights = self.subtree_heights(&slots);
        let ys = self.assign_y(&slots, &subtree_heights);

        let mut visible_count = 0usize;
        let entries: Vec<Position> = slots
            .iter()
            .zip(ys)
            .map(|(slot, y)| {
                visible_count += usize::from(slot.visible);
                Position {
                    id: slot.node.id().clone(),
                    x: level_left[slot.level] + slot.size.width / 2.0,
                    y,
                    width: slot.size.width,
                    height: slot.size.height,
                    level: slot.level,
                    visible: slot.visible,
                }
            })
            .collect();

        let after = self.sizes.stats();
        let duration_us = start.elapsed().as_micros() as u64;
        span.record("node_count", entries.len() as u64);
        span.record("duration_us", duration_us);
        tracing::debug!(
            target: "mindmap.layout",
            node_count = entries.len() as u64,
            visible_count = visible_count as u64,
            duration_us = duration_us,
            cache_hits = after.hits.saturating_sub(before.hits),
            cache_misses = after.misses.saturating_sub(before.misses),
            "layout pass completed"
        );

        PositionMap::from_entries(entries)
    }

    /// Pass 1: pre-order slots with sizes and visibility.
    fn flatten<'a>(&mut self, root: &'a Node) -> Vec<Slot<'a>> {
        let mut slots: Vec<Slot<'a>> = Vec::new();
        // (node, parent slot, level, visible)
        let mut stack: Vec<(&'a Node, Option<usize>, usize, bool)> = vec![(root, None, 0, true)];
        while let Some((node, parent, level, visible)) = stack.pop() {
            let index = slots.len();
            let font_size = node
                .style()
                .and_then(|s| s.font_size)
                .filter(|f| f.is_finite() && *f > 0.0)
                .unwrap_or(self.config.font_size);
            let size = self
                .sizes
                .get_or_measure(node.text(), font_size, &self.config);
            slots.push(Slot {
                node,
                level,
                visible,
                size,
                children: SmallVec::new(),
            });
            if let Some(parent) = parent {
                slots[parent].children.push(index);
            }
            let child_visible = visible && !node.is_collapsed();
            for child in node.children().iter().rev() {
                stack.push((child.as_ref(), Some(index), level + 1, child_visible));
            }
        }
        slots
    }

    /// Pass 2: shared left edge of every level.
    fn level_left_edges(&self, slots: &[Slot<'_>]) -> Vec<f64> {
        let depth = slots.iter().map(|s| s.level).max().unwrap_or(0) + 1;
        let mut visible_max: Vec<Option<f64>> = vec![None; depth];
        let mut hidden_max = vec![0.0_f64; depth];
        for slot in slots {
            let width = slot.size.width;
            if slot.visible {
                let entry = &mut visible_max[slot.level];
                *entry = Some(entry.map_or(width, |w| w.max(width)));
            } else {
                hidden_max[slot.level] = hidden_max[slot.level].max(width);
            }
        }

        let root_width = slots.first().map_or(0.0, |s| s.size.width);
        let mut left = -root_width / 2.0;
        let mut edges = Vec::with_capacity(depth);
        for level in 0..depth {
            edges.push(left);
            let width = visible_max[level].unwrap_or(hidden_max[level]);
            left += width + self.config.horizontal_gap;
        }
        edges
    }

    /// Pass 3: subtree heights, children before parents.
    fn subtree_heights(&self, slots: &[Slot<'_>]) -> Vec<f64> {
        let gap = self.config.vertical_gap;
        let mut heights = vec![0.0_f64; slots.len()];
        // Pre-order puts every child after its parent, so reverse order
        // visits children first.
        for i in (0..slots.len()).rev() {
            let slot = &slots[i];
            let own = slot.size.height;
            heights[i] = if slot.node.is_collapsed() || slot.children.is_empty() {
                own
            } else {
                own.max(stacked_height(&slot.children, &heights, gap))
            };
        }
        heights
    }

    /// Pass 4: center `y` of every node.
    fn assign_y(&self, slots: &[Slot<'_>], heights: &[f64]) -> Vec<f64> {
        let gap = self.config.vertical_gap;
        let mut ys = vec![0.0_f64; slots.len()];
        for (i, slot) in slots.iter().enumerate() {
            if slot.children.is_empty() {
                continue;
            }
            let total = stacked_height(&slot.children, heights, gap);
            let mut cursor = ys[i] - total / 2.0;
            for &child in &slot.children {
                ys[child] = cursor + heights[child] / 2.0;
                cursor += heights[child] + gap;
            }
        }
        ys
    }
}

fn stacked_height(children: &[usize], heights: &[f64], gap: f64) -> f64 {
    let sum: f64 = children.iter().map(|&c| heights[c]).sum();
    sum + gap * children.len().saturating_sub(1) as f64
}

/// Stateless layout of `root` with `config`.
///
/// Equivalent to a fresh [`LayoutEngine`] per call, with a cache sized to
/// the tree so nothing is evicted; prefer the engine when laying out the
/// same tree repeatedly.
#[must_use]
pub fn compute_layout(root: Option<&Node>, config: &LayoutConfig) -> PositionMap {
    let capacity = root.map_or(1, Node::node_count);
    LayoutEngine::with_cache(config.clone(), SizeCache::new(capacity)).compute(root)
}

/// Convenience for callers holding the root as an `Arc`.
#[must_use]
pub fn compute_layout_arc(root: Option<&Arc<Node>>, config: &LayoutConfig) -> PositionMap {
    compute_layout(root.map(Arc::as_ref), config)
}
