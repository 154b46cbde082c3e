//! The render plan shows exactly the visible nodes that touch the screen.

use std::sync::Arc;

use mindmap_core::geometry::{Bounds, Point, Size};
use mindmap_core::node::Node;
use mindmap_runtime::{EngineConfig, MindMapEngine, ViewTransform};
use mindmap_widgets::RenderPlan;
use proptest::prelude::*;

const VIEWPORT: Size = Size::new(800.0, 600.0);

/// Three levels with `fanout` children per node; every third branch
/// collapsed.
fn wide_tree(fanout: usize) -> Arc<Node> {
    let mut root = Node::new("root", "Root");
    for i in 0..fanout {
        let mut branch = Node::new(format!("b{i}"), format!("Branch {i}"));
        for j in 0..fanout {
            branch = branch.child(Node::new(format!("b{i}-{j}"), format!("Leaf {i}.{j}")));
        }
        root = root.child(branch.collapsed(i % 3 == 2));
    }
    root.into_arc()
}

fn on_screen(rect: &Bounds) -> bool {
    rect.intersects(&Bounds::new(0.0, 0.0, VIEWPORT.width, VIEWPORT.height))
}

proptest! {
    #[test]
    fn plan_matches_brute_force(
        fanout in 1usize..9,
        pan_x in -1500.0f64..1500.0,
        pan_y in -1500.0f64..1500.0,
        scale in 0.1f64..3.0,
    ) {
        let mut engine = MindMapEngine::new(Some(wide_tree(fanout)), VIEWPORT, EngineConfig::default());
        engine.set_transform(ViewTransform::new(pan_x, pan_y, scale));
        let state = engine.view_state();
        let plan = RenderPlan::build(&state);

        let transform = state.transform;
        let expected: Vec<&str> = state
            .positions
            .visible()
            .filter(|p| {
                let b = p.bounds();
                let min = transform.world_to_screen(Point::new(b.min_x, b.min_y));
                let max = transform.world_to_screen(Point::new(b.max_x, b.max_y));
                // Stay clear of rounding at the exact boundary.
                on_screen(&Bounds::new(min.x, min.y, max.x, max.y).inflate(-1e-6))
            })
            .map(|p| p.id.as_str())
            .collect();
        let mut shown: Vec<&str> = plan.nodes.iter().map(|n| n.id.as_str()).collect();
        for id in &expected {
            prop_assert!(shown.contains(id), "missing {}", id);
        }
        for node in &plan.nodes {
            prop_assert!(on_screen(&node.rect.inflate(1e-6)), "{} is off screen", node.id);
        }
        shown.sort_unstable();
        shown.dedup();
        prop_assert_eq!(shown.len(), plan.nodes.len());
    }

    #[test]
    fn every_edge_touches_a_shown_node(
        fanout in 1usize..7,
        pan_x in -800.0f64..800.0,
        pan_y in -800.0f64..800.0,
    ) {
        let mut engine = MindMapEngine::new(Some(wide_tree(fanout)), VIEWPORT, EngineConfig::default());
        engine.set_transform(ViewTransform::new(pan_x, pan_y, 1.0));
        let state = engine.view_state();
        let plan = RenderPlan::build(&state);
        for edge in &plan.edges {
            prop_assert!(plan.node(edge.parent.as_str()).is_some() || plan.node(edge.child.as_str()).is_some());
        }
        let mut pairs: Vec<(&str, &str)> =
            plan.edges.iter().map(|e| (e.parent.as_str(), e.child.as_str())).collect();
        let total = pairs.len();
        pairs.sort_unstable();
        pairs.dedup();
        prop_assert_eq!(pairs.len(), total, "edges must not repeat");
    }
}
