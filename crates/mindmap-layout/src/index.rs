#![forbid(unsafe_code)]

//! Derived geometry indexes over a laid-out tree.
//!
//! [`GeometryIndex::build`] walks the tree once and, using the position map
//! of the same tree, records:
//!
//! - `id -> node` and `id -> parent id`,
//! - `id -> visible child ids` (children whose position is visible),
//! - `id -> subtree bounds` aggregated bottom-up over the visible part of
//!   each subtree (only for visible nodes),
//! - a [`SpatialGrid`] of every visible node box.
//!
//! The position map may be stale (an async layout for an older tree). Ids
//! without a position are skipped rather than treated as errors, so a
//! lookup for them simply returns `None`.

use std::sync::Arc;

use mindmap_core::geometry::Bounds;
use mindmap_core::node::{Node, NodeId};
use rustc_hash::FxHashMap;

use crate::engine::PositionMap;
use crate::spatial::SpatialGrid;

/// Lookup tables derived from `(tree, positions)`.
#[derive(Debug, Clone)]
pub struct GeometryIndex {
    root_id: Option<NodeId>,
    nodes: FxHashMap<NodeId, Arc<Node>>,
    parents: FxHashMap<NodeId, NodeId>,
    visible_children: FxHashMap<NodeId, Vec<NodeId>>,
    subtree_bounds: FxHashMap<NodeId, Bounds>,
    grid: SpatialGrid,
}

impl GeometryIndex {
    /// Index with nothing in it.
    #[must_use]
    pub fn empty(cell_size: f64) -> Self {
        Self {
            root_id: None,
            nodes: FxHashMap::default(),
            parents: FxHashMap::default(),
            visible_children: FxHashMap::default(),
            subtree_bounds: FxHashMap::default(),
            grid: SpatialGrid::new(cell_size),
        }
    }

    /// Build every index in one pre-order walk plus one reverse pass.
    #[must_use]
    pub fn build(root: Option<&Arc<Node>>, positions: &PositionMap, cell_size: f64) -> Self {
        let mut index = Self::empty(cell_size);
        let Some(root) = root else {
            return index;
        };
        index.root_id = Some(root.id().clone());

        let capacity = positions.len();
        index.nodes.reserve(capacity);
        index.parents.reserve(capacity);

        let mut order: Vec<&Arc<Node>> = Vec::with_capacity(capacity);
        let mut stack: Vec<&Arc<Node>> = vec![root];
        while let Some(node) = stack.pop() {
            order.push(node);
            index.nodes.insert(node.id().clone(), Arc::clone(node));

            let mut visible = Vec::new();
            for child in node.children() {
                index.parents.insert(child.id().clone(), node.id().clone());
                if positions.get(child.id().as_str()).is_some_and(|p| p.visible) {
                    visible.push(child.id().clone());
                }
            }
            if !visible.is_empty() {
                index.visible_children.insert(node.id().clone(), visible);
            }
            stack.extend(node.children().iter().rev());
        }

        for node in order.iter().rev() {
            let Some(position) = positions.get(node.id().as_str()).filter(|p| p.visible) else {
                continue;
            };
            let own = position.bounds();
            let bounds = index
                .visible_children(node.id().as_str())
                .iter()
                .filter_map(|child| index.subtree_bounds.get(child))
                .fold(own, |acc, b| acc.union(b));
            index.subtree_bounds.insert(node.id().clone(), bounds);
        }

        for position in positions.visible() {
            if index.nodes.contains_key(position.id.as_str()) {
                index.grid.insert(position.id.clone(), position.bounds());
            }
        }

        index
    }

    #[inline]
    #[must_use]
    pub fn root_id(&self) -> Option<&NodeId> {
        self.root_id.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Arc<Node>> {
        self.nodes.get(id)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Parent id; `None` for the root or an unknown id.
    #[inline]
    #[must_use]
    pub fn parent_id(&self, id: &str) -> Option<&NodeId> {
        self.parents.get(id)
    }

    /// Visible children in tree order; empty for unknown ids.
    #[must_use]
    pub fn visible_children(&self, id: &str) -> &[NodeId] {
        self.visible_children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Bounding box of the visible part of `id`'s subtree.
    #[inline]
    #[must_use]
    pub fn subtree_bounds(&self, id: &str) -> Option<Bounds> {
        self.subtree_bounds.get(id).copied()
    }

    /// Lowest y reached by the visible part of `id`'s subtree.
    #[inline]
    #[must_use]
    pub fn subtree_bottom(&self, id: &str) -> Option<f64> {
        self.subtree_bounds(id).map(|b| b.max_y)
    }

    /// Whether `id` is `ancestor` or one of its descendants.
    ///
    /// Walks parent links, O(depth).
    #[must_use]
    pub fn is_in_subtree(&self, id: &str, ancestor: &str) -> bool {
        let mut current = id;
        loop {
            if current == ancestor {
                return true;
            }
            match self.parents.get(current) {
                Some(parent) => current = parent.as_str(),
                None => return false,
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Number of indexed nodes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::engine::compute_layout_arc;

    fn sample() -> Arc<Node> {
        Node::new("r", "Root")
            .child(
                Node::new("a", "Alpha")
                    .child(Node::new("a1", "A one"))
                    .child(Node::new("a2", "A two")),
            )
            .child(
                Node::new("b", "Beta")
                    .collapsed(true)
                    .child(Node::new("b1", "B one")),
            )
            .into_arc()
    }

    fn build(root: &Arc<Node>) -> (PositionMap, GeometryIndex) {
        let positions = compute_layout_arc(Some(root), &LayoutConfig::default());
        let index = GeometryIndex::build(Some(root), &positions, 240.0);
        (positions, index)
    }

    #[test]
    fn parent_and_node_maps() {
        let root = sample();
        let (_, index) = build(&root);
        assert_eq!(index.len(), 6);
        assert_eq!(index.root_id().unwrap(), "r");
        assert_eq!(index.parent_id("a2").unwrap(), "a");
        assert_eq!(index.parent_id("b1").unwrap(), "b");
        assert!(index.parent_id("r").is_none());
        assert_eq!(index.node("a1").unwrap().text(), "A one");
    }

    #[test]
    fn visible_children_skip_collapsed() {
        let root = sample();
        let (_, index) = build(&root);
        let ids: Vec<_> = index.visible_children("a").iter().map(NodeId::as_str).collect();
        assert_eq!(ids, vec!["a1", "a2"]);
        assert!(index.visible_children("b").is_empty());
        assert!(index.visible_children("missing").is_empty());
    }

    #[test]
    fn subtree_bounds_enclose_visible_descendants() {
        let root = sample();
        let (positions, index) = build(&root);
        let a = index.subtree_bounds("a").unwrap();
        for id in ["a", "a1", "a2"] {
            let p = positions.get(id).unwrap().bounds();
            assert!(a.contains(mindmap_core::geometry::Point::new(p.min_x, p.min_y)));
            assert!(a.contains(mindmap_core::geometry::Point::new(p.max_x, p.max_y)));
        }
        // Collapsed subtree is just the node itself.
        assert_eq!(
            index.subtree_bounds("b").unwrap(),
            positions.get("b").unwrap().bounds()
        );
        assert!(index.subtree_bounds("b1").is_none());
        assert_eq!(
            index.subtree_bottom("r"),
            Some(index.subtree_bounds("r").unwrap().max_y)
        );
    }

    #[test]
    fn grid_holds_visible_nodes_only() {
        let root = sample();
        let (_, index) = build(&root);
        assert_eq!(index.grid().len(), 5);
    }

    #[test]
    fn subtree_membership() {
        let root = sample();
        let (_, index) = build(&root);
        assert!(index.is_in_subtree("a2", "a"));
        assert!(index.is_in_subtree("a", "a"));
        assert!(index.is_in_subtree("b1", "r"));
        assert!(!index.is_in_subtree("b1", "a"));
        assert!(!index.is_in_subtree("missing", "a"));
    }

    #[test]
    fn stale_positions_are_tolerated() {
        let root = sample();
        let positions = compute_layout_arc(Some(&root), &LayoutConfig::default());
        let edited = mindmap_core::tree_ops::add_child_node(&root, "a", Node::new("new", "New"));
        let index = GeometryIndex::build(Some(&edited), &positions, 240.0);
        assert!(index.contains("new"));
        assert!(index.subtree_bounds("new").is_none());
        assert_eq!(index.visible_children("a").len(), 2);
    }

    #[test]
    fn empty_tree() {
        let index = GeometryIndex::build(None, &PositionMap::default(), 240.0);
        assert!(index.is_empty());
        assert!(index.root_id().is_none());
    }
}
