#![forbid(unsafe_code)]

//! Per-frame render plan.
//!
//! [`RenderPlan::build`] reads a [`ViewState`] and produces everything a
//! host needs to draw one frame in screen coordinates: the nodes that
//! intersect the viewport, the connectors touching them, the drag ghost and
//! the drop preview. The plan borrows from the engine and never mutates it.
//!
//! Paint order is edges, nodes, drop preview, ghost; [`RenderPlan::paint`]
//! drives a [`CanvasPainter`] in that order.

use mindmap_core::event::PointerTarget;
use mindmap_core::geometry::{Bounds, Point, Size};
use mindmap_core::node::{NodeId, NodeStyle};
use mindmap_layout::cull::visible_in_viewport;
use mindmap_layout::engine::Position;
use mindmap_layout::hit_test::HitKind;
use mindmap_runtime::engine::ViewState;
use mindmap_runtime::transform::ViewTransform;
use rustc_hash::FxHashSet;

use crate::edge::EdgeCurve;

/// Screen-space radius of the collapse toggle drawn on a node's right edge.
pub const TOGGLE_RADIUS: f64 = 8.0;

/// One node to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView<'a> {
    pub id: &'a NodeId,
    pub text: &'a str,
    /// Screen rectangle.
    pub rect: Bounds,
    pub level: usize,
    pub selected: bool,
    pub editing: bool,
    /// The node is being dragged (draw it dimmed; the ghost follows the
    /// pointer).
    pub dragging: bool,
    /// The node is the current drop target.
    pub drop_target: bool,
    pub child_count: usize,
    pub collapsed: bool,
    /// Collapse toggle hit box, present when the node has children.
    pub toggle: Option<Bounds>,
    pub style: Option<&'a NodeStyle>,
}

/// One parent-to-child connector.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeView<'a> {
    pub parent: &'a NodeId,
    pub child: &'a NodeId,
    /// Screen-space curve.
    pub curve: EdgeCurve,
}

/// Box following the pointer during a drag.
#[derive(Debug, Clone, PartialEq)]
pub struct GhostView<'a> {
    pub id: &'a NodeId,
    pub text: &'a str,
    pub rect: Bounds,
}

/// Where the dragged node would land if released now.
#[derive(Debug, Clone, PartialEq)]
pub struct DropPreview<'a> {
    pub target: &'a NodeId,
    pub insert_index: usize,
    pub kind: HitKind,
    /// Target rectangle (screen).
    pub target_rect: Option<Bounds>,
    /// Insertion marker (screen), from the landing point to the right by
    /// the ghost width.
    pub marker: Option<(Point, Point)>,
    /// The dragged node drawn where it would be laid out.
    pub landing: Option<LandingView<'a>>,
}

/// Predicted placement of the dragged node.
#[derive(Debug, Clone, PartialEq)]
pub struct LandingView<'a> {
    pub text: &'a str,
    /// Screen rectangle.
    pub rect: Bounds,
    /// Depth the node would have after the drop.
    pub level: usize,
}

/// Receives the plan in paint order.
///
/// Hosts implement this against their drawing surface.
pub trait CanvasPainter {
    fn edge(&mut self, edge: &EdgeView<'_>);
    fn node(&mut self, node: &NodeView<'_>);
    fn drop_preview(&mut self, preview: &DropPreview<'_>);
    fn ghost(&mut self, ghost: &GhostView<'_>);
}

/// Everything visible in one frame.
#[derive(Debug, Clone, Default)]
pub struct RenderPlan<'a> {
    pub transform: ViewTransform,
    pub nodes: Vec<NodeView<'a>>,
    pub edges: Vec<EdgeView<'a>>,
    pub ghost: Option<GhostView<'a>>,
    pub drop_preview: Option<DropPreview<'a>>,
}

impl<'a> RenderPlan<'a> {
    /// Cull and project `state` into screen space.
    #[must_use]
    pub fn build(state: &ViewState<'a>) -> Self {
        let transform = state.transform;
        let world = transform.world_viewport(state.viewport);
        let culled = visible_in_viewport(state.geometry, state.positions, world);

        let drag = state.drag;
        let dragged = drag.map(|d| &d.node_id);
        let target = drag.and_then(|d| d.drop_target.as_ref()).map(|t| &t.target_id);

        let nodes: Vec<NodeView<'a>> = culled
            .iter()
            .filter_map(|&position| {
                let node = state.geometry.node(position.id.as_str())?;
                let rect = screen_rect(&transform, position);
                let child_count = node.children().len();
                Some(NodeView {
                    id: &position.id,
                    text: node.text(),
                    rect,
                    level: position.level,
                    selected: state.selected == Some(&position.id),
                    editing: state.editing == Some(&position.id),
                    dragging: dragged == Some(&position.id),
                    drop_target: target == Some(&position.id),
                    child_count,
                    collapsed: node.is_collapsed(),
                    toggle: (child_count > 0).then(|| {
                        Bounds::from_center(
                            Point::new(rect.max_x, rect.center().y),
                            Size::new(TOGGLE_RADIUS * 2.0, TOGGLE_RADIUS * 2.0),
                        )
                    }),
                    style: node.style(),
                })
            })
            .collect();

        let edges = collect_edges(state, &culled, &transform);

        let ghost = drag.and_then(|d| {
            let node = state.geometry.node(d.node_id.as_str())?;
            Some(GhostView {
                id: &d.node_id,
                text: node.text(),
                rect: project(&transform, d.ghost),
            })
        });

        let drop_preview = drag.and_then(|d| {
            let drop = d.drop_target.as_ref()?;
            let target_rect = state
                .positions
                .get(drop.target_id.as_str())
                .map(|p| screen_rect(&transform, p));
            let marker = d.landing.map(|landing| {
                let start = transform.world_to_screen(landing);
                (start, Point::new(start.x + d.ghost.width() * transform.scale, start.y))
            });
            let landing = d.preview.as_ref().map(|preview| LandingView {
                text: &preview.text,
                rect: screen_rect(&transform, &preview.position),
                level: preview.position.level,
            });
            Some(DropPreview {
                target: &drop.target_id,
                insert_index: drop.insert_index,
                kind: drop.kind,
                target_rect,
                marker,
                landing,
            })
        });

        #[cfg(feature = "tracing")]
        tracing::trace!(
            target: "mindmap.render",
            nodes = nodes.len() as u64,
            edges = edges.len() as u64,
            dragging = drag.is_some(),
            "render plan built"
        );

        Self {
            transform,
            nodes,
            edges,
            ghost,
            drop_preview,
        }
    }

    /// Drive `painter` in paint order.
    pub fn paint(&self, painter: &mut impl CanvasPainter) {
        for edge in &self.edges {
            painter.edge(edge);
        }
        for node in &self.nodes {
            painter.node(node);
        }
        if let Some(preview) = &self.drop_preview {
            painter.drop_preview(preview);
        }
        if let Some(ghost) = &self.ghost {
            painter.ghost(ghost);
        }
    }

    /// What a host pointer event at `screen` lands on.
    ///
    /// Collapse toggles win over node bodies; anything else is canvas.
    #[must_use]
    pub fn pointer_target(&self, screen: Point) -> PointerTarget {
        if let Some(node) = self
            .nodes
            .iter()
            .rev()
            .find(|n| n.toggle.is_some_and(|t| t.contains(screen)))
        {
            return PointerTarget::ToggleButton(node.id.clone());
        }
        self.nodes
            .iter()
            .rev()
            .find(|n| n.rect.contains(screen))
            .map_or(PointerTarget::Canvas, |n| PointerTarget::Node(n.id.clone()))
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&NodeView<'a>> {
        self.nodes.iter().find(|n| n.id.as_str() == id)
    }
}

fn project(transform: &ViewTransform, world: Bounds) -> Bounds {
    let min = transform.world_to_screen(Point::new(world.min_x, world.min_y));
    let max = transform.world_to_screen(Point::new(world.max_x, world.max_y));
    Bounds::new(min.x, min.y, max.x, max.y)
}

fn screen_rect(transform: &ViewTransform, position: &Position) -> Bounds {
    project(transform, position.bounds())
}

/// Edges with at least one culled endpoint, each once.
fn collect_edges<'a>(
    state: &ViewState<'a>,
    culled: &[&'a Position],
    transform: &ViewTransform,
) -> Vec<EdgeView<'a>> {
    let shown: FxHashSet<&str> = culled.iter().map(|p| p.id.as_str()).collect();
    let mut edges = Vec::new();
    let mut push = |parent: &'a Position, child: &'a Position| {
        let start = transform.world_to_screen(Point::new(parent.right(), parent.y));
        let end = transform.world_to_screen(Point::new(child.left(), child.y));
        edges.push(EdgeView {
            parent: &parent.id,
            child: &child.id,
            curve: EdgeCurve::connect(start, end),
        });
    };
    for &position in culled {
        for child_id in state.geometry.visible_children(position.id.as_str()) {
            if let Some(child) = state.positions.get(child_id.as_str()) {
                push(position, child);
            }
        }
        // Parent off screen: the child side owns the edge.
        if let Some(parent_id) = state.geometry.parent_id(position.id.as_str())
            && !shown.contains(parent_id.as_str())
            && let Some(parent) = state.positions.get(parent_id.as_str())
        {
            push(parent, position);
        }
    }
    edges
}
