//! End-to-end engine behavior driven through input events and callbacks.

use std::sync::Arc;
use std::time::Duration;

use mindmap_core::event::{
    InputEvent, KeyCode, KeyEvent, MouseButton, PointerEvent, PointerEventKind, PointerTarget,
    WheelEvent,
};
use mindmap_core::geometry::{Point, Size};
use mindmap_core::node::Node;
use mindmap_core::tree_ops::find_node;
use mindmap_runtime::{
    EngineConfig, InteractionMode, MindMapEngine, TreeAction, Transition, ViewTransform,
};

const VIEWPORT: Size = Size::new(800.0, 600.0);

fn engine(root: Arc<Node>) -> MindMapEngine {
    MindMapEngine::new(Some(root), VIEWPORT, EngineConfig::default())
}

fn pointer(kind: PointerEventKind, at: Point) -> InputEvent {
    InputEvent::Pointer(PointerEvent::new(kind, at.x, at.y))
}

fn screen_center(engine: &MindMapEngine, id: &str) -> Point {
    let position = engine.positions().get(id).expect("laid out");
    engine.view_state().transform.world_to_screen(position.center())
}

fn child_ids(node: &Node) -> Vec<&str> {
    node.children().iter().map(|c| c.id().as_str()).collect()
}

#[test]
fn adding_two_children_keeps_order() {
    let mut e = engine(Node::new("r", "Root").into_arc());
    let first = Node::new("c1", "Child1");
    let second = Node::new("c2", "Child2");
    assert_eq!(
        e.apply(TreeAction::AddChild { parent_id: "r".into(), node: first }),
        Transition::Applied
    );
    assert_eq!(
        e.apply(TreeAction::AddChild { parent_id: "r".into(), node: second }),
        Transition::Applied
    );

    let root = e.root().expect("tree");
    let texts: Vec<&str> = root.children().iter().map(|c| c.text()).collect();
    assert_eq!(texts, ["Child1", "Child2"]);
    assert!(!root.is_collapsed());
    assert_eq!(e.positions().len(), 3);
}

#[test]
fn keyboard_created_children_get_fresh_ids() {
    let mut e = engine(Node::new("r", "Root").into_arc());
    for _ in 0..3 {
        e.select(Some("r".into()));
        e.push_input(InputEvent::Key(KeyEvent::new(KeyCode::Tab)));
    }
    let root = e.root().expect("tree");
    assert_eq!(root.children().len(), 3);
    assert!(root.validate_ids().is_ok());
    assert!(root.children().iter().all(|c| c.text() == "New node"));
}

#[test]
fn invalid_moves_leave_tree_and_history_untouched() {
    let root = Node::new("r", "Root")
        .child(Node::new("A", "A").child(Node::new("B", "B")))
        .into_arc();
    let mut e = engine(root.clone());

    let noop = e.apply(TreeAction::Move {
        node_id: "A".into(),
        target_parent_id: "r".into(),
        target_index: None,
    });
    assert_eq!(noop, Transition::Unchanged);
    let cycle = e.apply(TreeAction::Move {
        node_id: "r".into(),
        target_parent_id: "B".into(),
        target_index: None,
    });
    assert_eq!(cycle, Transition::Unchanged);

    assert!(Arc::ptr_eq(e.root().expect("tree"), &root));
    assert!(!e.view_state().can_undo);
}

#[test]
fn dragging_beside_childless_node_reparents_it() {
    let root = Node::new("r", "Root")
        .child(Node::new("X", "Dragged"))
        .child(Node::new("Y", "Target"))
        .into_arc();
    let mut e = engine(root);
    let grab = screen_center(&e, "X");
    let y = e.positions().get("Y").expect("laid out").clone();
    let slot = e
        .view_state()
        .transform
        .world_to_screen(Point::new(y.right() + 100.0, y.y + 10.0));

    e.start_drag("X".into(), grab.x, grab.y);
    e.push_input(pointer(PointerEventKind::Move, slot));
    e.frame();

    let state = e.view_state();
    assert_eq!(state.mode, InteractionMode::DraggingNode);
    let target = state.drag.and_then(|d| d.drop_target.as_ref()).expect("drop target");
    assert_eq!(target.target_id, "Y");
    assert_eq!(target.insert_index, 0);

    e.push_input(pointer(PointerEventKind::Up(MouseButton::Left), slot));
    let root = e.root().expect("tree");
    assert_eq!(child_ids(root), ["Y"]);
    let y = find_node(root, "Y").expect("Y");
    assert_eq!(child_ids(y), ["X"]);
    assert_eq!(e.view_state().mode, InteractionMode::Idle);

    // One undo restores the original shape.
    e.undo();
    assert_eq!(child_ids(e.root().expect("tree")), ["X", "Y"]);
}

#[test]
fn drop_over_nothing_abandons_drag() {
    let root = Node::new("r", "Root").child(Node::new("a", "A")).into_arc();
    let mut e = engine(root.clone());
    let grab = screen_center(&e, "a");
    let far = Point::new(grab.x + 5000.0, grab.y + 5000.0);
    e.start_drag("a".into(), grab.x, grab.y);
    e.push_input(pointer(PointerEventKind::Move, far));
    e.push_input(pointer(PointerEventKind::Up(MouseButton::Left), far));
    assert!(Arc::ptr_eq(e.root().expect("tree"), &root));
    assert!(e.view_state().drag.is_none());
}

#[test]
fn escape_cancels_drag_without_moving() {
    let root = Node::new("r", "Root")
        .child(Node::new("a", "A"))
        .child(Node::new("b", "B"))
        .into_arc();
    let mut e = engine(root.clone());
    let grab = screen_center(&e, "a");
    let over_b = screen_center(&e, "b");
    e.start_drag("a".into(), grab.x, grab.y);
    e.push_input(pointer(PointerEventKind::Move, over_b));
    e.frame();
    assert_eq!(e.view_state().mode, InteractionMode::DraggingNode);

    e.push_input(InputEvent::Key(KeyEvent::new(KeyCode::Escape)));
    assert_eq!(e.view_state().mode, InteractionMode::Idle);
    e.push_input(pointer(PointerEventKind::Up(MouseButton::Left), over_b));
    assert!(Arc::ptr_eq(e.root().expect("tree"), &root));
}

#[test]
fn wheel_zoom_keeps_world_point_under_cursor() {
    let mut e = engine(Node::new("r", "Root").into_arc());
    e.set_transform(ViewTransform::new(350.0, 250.0, 1.0));
    let anchor = Point::new(400.0, 300.0);
    let world = e.view_state().transform.screen_to_world(anchor);
    assert_eq!(world, Point::new(50.0, 50.0));

    e.push_input(InputEvent::Wheel(WheelEvent::new(anchor.x, anchor.y, 120.0)));
    e.frame();

    let t = e.view_state().transform;
    assert!((t.scale - 0.9).abs() < 1e-12);
    let back = t.world_to_screen(world);
    assert!((back.x - anchor.x).abs() < 1e-9);
    assert!((back.y - anchor.y).abs() < 1e-9);
}

#[test]
fn wheel_ticks_in_one_frame_compound() {
    let mut e = engine(Node::new("r", "Root").into_arc());
    for _ in 0..4 {
        e.push_input(InputEvent::Wheel(WheelEvent::new(400.0, 300.0, -120.0)));
    }
    let outcome = e.frame();
    assert_eq!(outcome.events, 1);
    assert!((e.view_state().transform.scale - 1.1_f64.powi(4)).abs() < 1e-12);
}

#[test]
fn canvas_drag_pans_and_clears_selection_only_on_click() {
    let root = Node::new("r", "Root").child(Node::new("a", "A")).into_arc();
    let mut e = engine(root);
    e.select(Some("a".into()));
    let before = e.view_state().transform;

    let start = Point::new(20.0, 20.0);
    let down = PointerEvent::new(PointerEventKind::Down(MouseButton::Left), start.x, start.y)
        .with_target(PointerTarget::Canvas);
    e.push_input(InputEvent::Pointer(down.clone()));
    e.push_input(pointer(PointerEventKind::Move, Point::new(80.0, 50.0)));
    e.frame();
    assert_eq!(e.view_state().mode, InteractionMode::Panning);
    e.push_input(pointer(PointerEventKind::Up(MouseButton::Left), Point::new(80.0, 50.0)));

    let after = e.view_state().transform;
    assert_eq!(after, before.panned(60.0, 30.0));
    assert_eq!(e.view_state().selected.map(|id| id.as_str()), Some("a"));

    e.push_input(InputEvent::Pointer(down));
    e.push_input(pointer(PointerEventKind::Up(MouseButton::Left), start));
    assert!(e.view_state().selected.is_none());
}

#[test]
fn large_trees_lay_out_off_thread() {
    let mut config = EngineConfig::default();
    config.interaction.async_layout_threshold = 8;
    let mut node = Node::new("n0", "leaf");
    for i in 1..20 {
        node = Node::new(format!("n{i}"), format!("node {i}")).child(node);
    }
    let mut e = MindMapEngine::new(Some(node.into_arc()), VIEWPORT, config);

    assert!(e.wait_for_layout(Duration::from_secs(10)));
    assert_eq!(e.positions().len(), 20);
    assert!(!e.layout_pending());

    // Edits keep serving the previous positions until the reply lands.
    e.apply(TreeAction::AddChild {
        parent_id: "n19".into(),
        node: Node::new("extra", "Extra"),
    });
    assert_eq!(e.root().expect("tree").node_count(), 21);
    assert!(e.wait_for_layout(Duration::from_secs(10)));
    assert_eq!(e.positions().len(), 21);
    assert!(e.geometry().contains("extra"));
}

#[test]
fn collapse_toggle_hides_descendants_from_geometry() {
    let root = Node::new("r", "Root")
        .child(Node::new("a", "A").child(Node::new("a1", "A1")))
        .into_arc();
    let mut e = engine(root);
    assert!(e.positions().get("a1").is_some_and(|p| p.visible));

    let toggle = PointerEvent::new(PointerEventKind::Down(MouseButton::Left), 0.0, 0.0)
        .with_target(PointerTarget::ToggleButton("a".into()));
    e.push_input(InputEvent::Pointer(toggle));
    assert!(find_node(e.root().expect("tree"), "a").is_some_and(|a| a.is_collapsed()));
    assert!(e.positions().get("a1").is_some_and(|p| !p.visible));

    e.toggle_collapse("a".into());
    assert!(e.positions().get("a1").is_some_and(|p| p.visible));
}

#[test]
fn resize_keeps_view_center() {
    let mut e = engine(Node::new("r", "Root").into_arc());
    let before = e.view_state().transform;
    e.push_input(InputEvent::Resize(Size::new(1000.0, 800.0)));
    let after = e.view_state().transform;
    assert_eq!(after, before.panned(100.0, 100.0));
    assert_eq!(e.view_state().viewport, Size::new(1000.0, 800.0));
}

#[test]
fn deleting_edited_node_leaves_edit_mode() {
    let root = Node::new("r", "Root").child(Node::new("a", "A")).into_arc();
    let mut e = engine(root);
    e.start_edit("a".into());
    e.select(Some("a".into()));
    e.request_delete("a".into());
    e.confirm_delete(true);
    assert_eq!(e.view_state().mode, InteractionMode::Idle);
    assert!(e.view_state().editing.is_none());
}
