#![forbid(unsafe_code)]

//! The mind-map engine: history, layout, geometry and interaction wired
//! into one event loop.
//!
//! # Data flow
//!
//! ```text
//! host input ──▶ FrameCoalescer ──▶ CanvasController ──▶ CanvasIntent
//!                                          │                   │
//!                                   transform/drag             ▼
//!                                          │               History ──▶ present tree
//!                                          ▼                                 │
//!                      view_state() ◀── GeometryIndex ◀── LayoutScheduler ◀──┘
//! ```
//!
//! Every effective tree change schedules a layout. Small trees are laid out
//! inline; large ones go to the worker and the engine keeps serving pointer
//! interaction from the last installed position map until the reply for the
//! newest tree arrives in [`frame`](MindMapEngine::frame).

use std::sync::Arc;
use std::time::Duration;

use mindmap_core::event::{InputEvent, MouseButton, PointerEvent, PointerEventKind, PointerTarget};
use mindmap_core::event_coalescer::FrameCoalescer;
use mindmap_core::geometry::Size;
use mindmap_core::node::{Node, NodeId, TreeLoadError};
use mindmap_layout::engine::PositionMap;
use mindmap_layout::index::GeometryIndex;
use mindmap_layout::worker::{LayoutOutcome, LayoutScheduler};
use web_time::Instant;

use crate::action::{HistoryCommand, TreeAction};
use crate::config::EngineConfig;
use crate::controller::{
    CanvasController, CanvasIntent, DragPreview, DragSession, InteractionMode, Scene,
};
use crate::history::{History, Transition};
use crate::transform::ViewTransform;

/// Everything the presentation layer reads, borrowed from the engine.
#[derive(Debug, Clone, Copy)]
pub struct ViewState<'a> {
    pub root: Option<&'a Arc<Node>>,
    pub positions: &'a PositionMap,
    pub geometry: &'a GeometryIndex,
    /// Transform to paint with (includes an in-progress direct pan).
    pub transform: ViewTransform,
    /// Bumped whenever the committed transform changes.
    pub transform_revision: u64,
    pub viewport: Size,
    pub mode: InteractionMode,
    pub selected: Option<&'a NodeId>,
    pub editing: Option<&'a NodeId>,
    pub drag: Option<&'a DragSession>,
    /// Where the dragged node would be laid out if dropped now.
    pub preview: Option<&'a DragPreview>,
    /// Node awaiting delete confirmation.
    pub pending_delete: Option<&'a NodeId>,
    /// A layout for the present tree is still being computed.
    pub layout_pending: bool,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Summary of one [`MindMapEngine::frame`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Buffered events handled this frame.
    pub events: usize,
    /// A new position map was installed.
    pub layout_installed: bool,
}

/// The mind-map engine.
#[derive(Debug)]
pub struct MindMapEngine {
    config: EngineConfig,
    history: History,
    scheduler: LayoutScheduler,
    /// Tree whose layout is being computed off-thread.
    scheduled_root: Option<Arc<Node>>,
    positions: PositionMap,
    geometry: GeometryIndex,
    controller: CanvasController,
    coalescer: FrameCoalescer,
    pending_delete: Option<NodeId>,
    /// Root id the view was last auto-centered for.
    centered_for: Option<NodeId>,
}

impl MindMapEngine {
    /// Create an engine for `initial` on a canvas of `viewport` pixels and
    /// lay it out.
    #[must_use]
    pub fn new(initial: Option<Arc<Node>>, viewport: Size, config: EngineConfig) -> Self {
        let scheduler = LayoutScheduler::new(
            config.layout.clone(),
            config.interaction.async_layout_threshold,
        );
        let controller = CanvasController::new(
            config.interaction.clone(),
            config.view.clone(),
            viewport,
        );
        let mut engine = Self {
            history: History::new(initial, config.history.clone()),
            scheduler,
            scheduled_root: None,
            positions: PositionMap::default(),
            geometry: GeometryIndex::empty(config.interaction.hit_test.cell_size),
            controller,
            coalescer: FrameCoalescer::new(),
            pending_delete: None,
            centered_for: None,
            config,
        };
        engine.relayout();
        engine
    }

    /// Create an engine from a nested JSON tree.
    pub fn from_json_str(
        json: &str,
        viewport: Size,
        config: EngineConfig,
    ) -> Result<Self, TreeLoadError> {
        let root = Node::from_json_str(json)?;
        Ok(Self::new(Some(root), viewport, config))
    }

    // ====================================================================
    // Query
    // ====================================================================

    #[must_use]
    pub fn root(&self) -> Option<&Arc<Node>> {
        self.history.present()
    }

    #[must_use]
    pub fn positions(&self) -> &PositionMap {
        &self.positions
    }

    #[must_use]
    pub fn geometry(&self) -> &GeometryIndex {
        &self.geometry
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn controller(&self) -> &CanvasController {
        &self.controller
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn pending_delete(&self) -> Option<&NodeId> {
        self.pending_delete.as_ref()
    }

    /// Whether a layout for the present tree is outstanding.
    #[must_use]
    pub fn layout_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// The presentation contract.
    #[must_use]
    pub fn view_state(&self) -> ViewState<'_> {
        ViewState {
            root: self.history.present(),
            positions: &self.positions,
            geometry: &self.geometry,
            transform: self.controller.render_transform(),
            transform_revision: self.controller.transform_revision(),
            viewport: self.controller.viewport(),
            mode: self.controller.mode(),
            selected: self.controller.selected(),
            editing: self.controller.editing(),
            drag: self.controller.drag(),
            preview: self.controller.drag().and_then(|d| d.preview.as_ref()),
            pending_delete: self.pending_delete.as_ref(),
            layout_pending: self.scheduler.is_pending(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        }
    }

    // ====================================================================
    // Input
    // ====================================================================

    /// Feed one raw input event.
    ///
    /// Pointer moves and wheel ticks are buffered until the next
    /// [`frame`](Self::frame); anything else is handled now, after the
    /// buffered events so ordering is preserved.
    pub fn push_input(&mut self, event: InputEvent) {
        match self.coalescer.push(event) {
            None => {}
            Some(wheel @ InputEvent::Wheel(_)) => self.process(&wheel),
            Some(other) => {
                for pending in self.coalescer.flush() {
                    self.process(&pending);
                }
                self.process(&other);
            }
        }
    }

    /// One animation frame: install a finished off-thread layout and handle
    /// the buffered pointer move and wheel ticks.
    pub fn frame(&mut self) -> FrameOutcome {
        let start = Instant::now();
        let layout_installed = match self.scheduler.poll() {
            Some(positions) => {
                let root = self.scheduled_root.take();
                self.install(root, positions);
                true
            }
            None => self.recover_lost_layout(),
        };
        let pending = self.coalescer.flush();
        let events = pending.len();
        for event in &pending {
            self.process(event);
        }
        tracing::trace!(
            target: "mindmap.engine",
            events = events as u64,
            layout_installed,
            duration_us = start.elapsed().as_micros() as u64,
            "frame processed"
        );
        FrameOutcome {
            events,
            layout_installed,
        }
    }

    /// Block up to `timeout` for an outstanding off-thread layout.
    ///
    /// Returns `true` once the present tree's positions are installed.
    pub fn wait_for_layout(&mut self, timeout: Duration) -> bool {
        if !self.scheduler.is_pending() {
            return true;
        }
        match self.scheduler.wait(timeout) {
            Some(positions) => {
                let root = self.scheduled_root.take();
                self.install(root, positions);
                true
            }
            None => self.recover_lost_layout(),
        }
    }

    /// The worker died with a request in flight: schedule the tree again.
    ///
    /// Returns `true` if positions were installed.
    fn recover_lost_layout(&mut self) -> bool {
        if self.scheduled_root.is_none() || self.scheduler.is_pending() {
            return false;
        }
        tracing::debug!(target: "mindmap.engine", "rescheduling layout after worker loss");
        self.scheduled_root = None;
        self.relayout();
        !self.scheduler.is_pending()
    }

    fn process(&mut self, event: &InputEvent) {
        let scene = Scene {
            positions: &self.positions,
            index: &self.geometry,
            node_count: self.geometry.len(),
        };
        let intents = self.controller.handle(event, &scene);
        for intent in intents {
            self.run_intent(intent);
        }
    }

    fn run_intent(&mut self, intent: CanvasIntent) {
        match intent {
            CanvasIntent::AddChild { parent_id } => {
                let node = self.history.fresh_node();
                let new_id = node.id().clone();
                if self.apply(TreeAction::AddChild { parent_id, node }) == Transition::Applied {
                    self.controller.select(Some(new_id));
                }
            }
            CanvasIntent::AddSibling { node_id } => {
                let node = self.history.fresh_node();
                let new_id = node.id().clone();
                if self.apply(TreeAction::AddSibling { node_id, node }) == Transition::Applied {
                    self.controller.select(Some(new_id));
                }
            }
            CanvasIntent::RequestDelete { node_id } => self.request_delete(node_id),
            CanvasIntent::ToggleCollapse { node_id } => {
                self.apply(TreeAction::ToggleCollapse { node_id });
            }
            CanvasIntent::Move {
                node_id,
                target_parent_id,
                target_index,
            } => {
                self.apply(TreeAction::Move {
                    node_id,
                    target_parent_id,
                    target_index: Some(target_index),
                });
            }
            CanvasIntent::Undo => {
                self.dispatch(HistoryCommand::Undo);
            }
            CanvasIntent::Redo => {
                self.dispatch(HistoryCommand::Redo);
            }
        }
    }

    // ====================================================================
    // Tree edits
    // ====================================================================

    /// Apply one tree action through history.
    pub fn apply(&mut self, action: TreeAction) -> Transition {
        self.dispatch(HistoryCommand::Apply(action))
    }

    /// Run one history transition and relayout if the tree changed.
    pub fn dispatch(&mut self, command: HistoryCommand) -> Transition {
        let transition = self.history.dispatch(command);
        if transition.changed_tree() {
            tracing::debug!(
                target: "mindmap.engine",
                transition = ?transition,
                node_count = self.history.present().map_or(0, |r| r.node_count()) as u64,
                "tree changed"
            );
            self.relayout();
        }
        transition
    }

    pub fn undo(&mut self) -> Transition {
        self.dispatch(HistoryCommand::Undo)
    }

    pub fn redo(&mut self) -> Transition {
        self.dispatch(HistoryCommand::Redo)
    }

    /// Replace the tree and forget all history.
    pub fn reset(&mut self, root: Option<Arc<Node>>) -> Transition {
        self.pending_delete = None;
        self.dispatch(HistoryCommand::Reset(root))
    }

    /// Replace the tree with one parsed from nested JSON.
    pub fn load_json(&mut self, json: &str) -> Result<Transition, TreeLoadError> {
        let root = Node::from_json_str(json)?;
        Ok(self.reset(Some(root)))
    }

    /// Hold `node_id` for deletion until [`confirm_delete`](Self::confirm_delete).
    ///
    /// The root cannot be deleted and unknown ids are ignored.
    pub fn request_delete(&mut self, node_id: NodeId) {
        let Some(root) = self.history.present() else {
            return;
        };
        if root.id() == &node_id || mindmap_core::tree_ops::find_node(root, node_id.as_str()).is_none()
        {
            return;
        }
        tracing::debug!(target: "mindmap.engine", node_id = %node_id, "delete requested");
        self.pending_delete = Some(node_id);
    }

    /// Resolve the pending delete. On confirmation the node is deleted and
    /// the selection cleared.
    pub fn confirm_delete(&mut self, confirmed: bool) -> Transition {
        let Some(node_id) = self.pending_delete.take() else {
            return Transition::Unchanged;
        };
        tracing::debug!(
            target: "mindmap.engine",
            node_id = %node_id,
            confirmed,
            "delete resolved"
        );
        if !confirmed {
            return Transition::Unchanged;
        }
        let transition = self.apply(TreeAction::Delete { node_id });
        if transition == Transition::Applied {
            self.controller.select(None);
        }
        transition
    }

    // ====================================================================
    // Presentation callbacks
    // ====================================================================

    pub fn select(&mut self, node_id: Option<NodeId>) {
        self.controller.select(node_id);
    }

    pub fn toggle_collapse(&mut self, node_id: NodeId) -> Transition {
        self.apply(TreeAction::ToggleCollapse { node_id })
    }

    pub fn start_edit(&mut self, node_id: NodeId) {
        if self.geometry.contains(node_id.as_str()) {
            self.controller.start_edit(node_id);
        }
    }

    /// Commit edited text and leave edit mode.
    pub fn finish_edit(&mut self, node_id: NodeId, text: &str) -> Transition {
        if self.controller.editing() == Some(&node_id) {
            self.controller.stop_edit();
        }
        self.apply(TreeAction::SetText {
            node_id,
            text: text.to_owned(),
        })
    }

    /// Leave edit mode without changing the text.
    pub fn cancel_edit(&mut self) {
        self.controller.stop_edit();
    }

    /// Begin a node press at a screen point, as if the pointer went down on
    /// the node. The drag starts once the pointer moves past the threshold.
    pub fn start_drag(&mut self, node_id: NodeId, screen_x: f64, screen_y: f64) {
        let down = PointerEvent::new(PointerEventKind::Down(MouseButton::Left), screen_x, screen_y)
            .with_target(PointerTarget::Node(node_id));
        self.push_input(InputEvent::Pointer(down));
    }

    /// Keyboard focus entered or left a host text field.
    pub fn set_text_input_focused(&mut self, focused: bool) {
        self.controller.set_text_input_focused(focused);
    }

    /// Replace the committed view transform.
    pub fn set_transform(&mut self, transform: ViewTransform) {
        self.controller.set_transform(transform);
    }

    /// Fit every visible node into the viewport.
    pub fn fit_to_view(&mut self, margin: f64) {
        if let Some(bounds) = self.positions.content_bounds() {
            let transform = ViewTransform::fit_bounds(
                bounds,
                self.controller.viewport(),
                margin,
                &self.config.view,
            );
            self.controller.set_transform(transform);
        }
    }

    /// Swap configuration; layout settings take effect with a relayout.
    pub fn set_config(&mut self, config: EngineConfig) {
        let layout_changed = config.layout != self.config.layout;
        self.scheduler.set_config(config.layout.clone());
        self.scheduler
            .set_async_threshold(config.interaction.async_layout_threshold);
        self.controller
            .set_config(config.interaction.clone(), config.view.clone());
        self.history.set_config(config.history.clone());
        self.config = config;
        if layout_changed {
            self.relayout();
        }
    }

    // ====================================================================
    // Layout plumbing
    // ====================================================================

    fn relayout(&mut self) {
        let root = self.history.present().cloned();
        match self.scheduler.schedule(root.as_ref()) {
            LayoutOutcome::Ready(positions) => {
                self.scheduled_root = None;
                self.install(root, positions);
            }
            LayoutOutcome::Pending { request_id } => {
                tracing::trace!(target: "mindmap.engine", request_id, "layout pending");
                self.scheduled_root = root;
            }
        }
    }

    fn install(&mut self, root: Option<Arc<Node>>, positions: PositionMap) {
        self.geometry = GeometryIndex::build(
            root.as_ref(),
            &positions,
            self.config.interaction.hit_test.cell_size,
        );
        self.positions = positions;
        self.controller.reconcile(&self.geometry);
        if self
            .pending_delete
            .as_ref()
            .is_some_and(|id| !self.geometry.contains(id.as_str()))
        {
            self.pending_delete = None;
        }
        self.auto_center(root.as_deref());
    }

    /// Center the root once per distinct root id.
    fn auto_center(&mut self, root: Option<&Node>) {
        let Some(root) = root else {
            self.centered_for = None;
            return;
        };
        if self.centered_for.as_ref() == Some(root.id()) {
            return;
        }
        let Some(position) = self.positions.get(root.id().as_str()) else {
            return;
        };
        let transform = self
            .controller
            .transform()
            .center_on(position.center(), self.controller.viewport());
        self.controller.set_transform(transform);
        self.centered_for = Some(root.id().clone());
        tracing::debug!(target: "mindmap.engine", root_id = %root.id(), "view auto-centered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindmap_core::event::{KeyCode, KeyEvent};
    use mindmap_core::geometry::Point;

    fn engine(root: Arc<Node>) -> MindMapEngine {
        MindMapEngine::new(Some(root), Size::new(800.0, 600.0), EngineConfig::default())
    }

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code))
    }

    #[test]
    fn initial_layout_centers_root() {
        let e = engine(Node::new("r", "Root").into_arc());
        assert_eq!(e.positions().len(), 1);
        assert_eq!(e.view_state().transform, ViewTransform::new(400.0, 300.0, 1.0));
    }

    #[test]
    fn hidden_nodes_count_toward_direct_pan() {
        use mindmap_core::event::{MouseButton, PointerEvent, PointerEventKind, PointerTarget};

        let mut config = EngineConfig::default();
        config.interaction.direct_pan_threshold = 4;
        let mut hidden = Node::new("b", "Branch").collapsed(true);
        for i in 0..4 {
            hidden = hidden.child(Node::new(format!("b{i}"), "leaf"));
        }
        let root = Node::new("r", "Root").child(hidden).into_arc();
        let mut e = MindMapEngine::new(Some(root), Size::new(800.0, 600.0), config);
        assert_eq!(e.positions().visible_count(), 2);
        let committed = e.controller().transform();

        let pointer = |kind, x, y| {
            InputEvent::Pointer(PointerEvent::new(kind, x, y).with_target(PointerTarget::Canvas))
        };
        e.push_input(pointer(PointerEventKind::Down(MouseButton::Left), 10.0, 10.0));
        e.push_input(pointer(PointerEventKind::Move, 60.0, 10.0));
        e.frame();
        assert_eq!(e.controller().transform(), committed);
        assert_eq!(e.view_state().transform.translate_x, committed.translate_x + 50.0);

        e.push_input(pointer(PointerEventKind::Up(MouseButton::Left), 60.0, 10.0));
        assert_eq!(e.controller().transform().translate_x, committed.translate_x + 50.0);
    }

    #[test]
    fn auto_center_runs_once_per_root() {
        let mut e = engine(Node::new("r", "Root").into_arc());
        e.set_transform(ViewTransform::new(10.0, 10.0, 1.0));
        e.select(Some("r".into()));
        e.push_input(key(KeyCode::Tab));
        assert_eq!(e.view_state().transform, ViewTransform::new(10.0, 10.0, 1.0));

        e.reset(Some(Node::new("other", "Other").into_arc()));
        assert_eq!(e.view_state().transform, ViewTransform::new(400.0, 300.0, 1.0));
    }

    #[test]
    fn tab_adds_child_and_selects_it() {
        let mut e = engine(Node::new("r", "Root").into_arc());
        e.select(Some("r".into()));
        e.push_input(key(KeyCode::Tab));
        let root = e.root().unwrap();
        assert_eq!(root.children().len(), 1);
        let child = root.children()[0].id().clone();
        assert_eq!(e.view_state().selected, Some(&child));
        assert!(e.positions().contains(child.as_str()));
    }

    #[test]
    fn enter_on_root_is_a_no_op() {
        let mut e = engine(Node::new("r", "Root").into_arc());
        e.select(Some("r".into()));
        e.push_input(key(KeyCode::Enter));
        assert_eq!(e.root().unwrap().node_count(), 1);
        assert!(!e.history().can_undo());
    }

    #[test]
    fn delete_waits_for_confirmation() {
        let root = Node::new("r", "Root").child(Node::new("a", "A")).into_arc();
        let mut e = engine(root);
        e.select(Some("a".into()));
        e.push_input(key(KeyCode::Delete));
        assert_eq!(e.pending_delete().map(NodeId::as_str), Some("a"));
        assert_eq!(e.root().unwrap().node_count(), 2);

        assert_eq!(e.confirm_delete(false), Transition::Unchanged);
        assert_eq!(e.root().unwrap().node_count(), 2);
        assert_eq!(e.view_state().selected.map(NodeId::as_str), Some("a"));

        e.push_input(key(KeyCode::Backspace));
        assert_eq!(e.confirm_delete(true), Transition::Applied);
        assert_eq!(e.root().unwrap().node_count(), 1);
        assert!(e.view_state().selected.is_none());
        assert!(e.pending_delete().is_none());
    }

    #[test]
    fn root_delete_is_never_requested() {
        let mut e = engine(Node::new("r", "Root").into_arc());
        e.select(Some("r".into()));
        e.push_input(key(KeyCode::Delete));
        assert!(e.pending_delete().is_none());
    }

    #[test]
    fn finish_edit_sets_text_and_leaves_edit_mode() {
        let root = Node::new("r", "Root").child(Node::new("a", "A")).into_arc();
        let mut e = engine(root);
        e.start_edit("a".into());
        assert_eq!(e.view_state().mode, InteractionMode::EditingNode);
        assert_eq!(e.finish_edit("a".into(), "Renamed"), Transition::Applied);
        assert_eq!(e.view_state().mode, InteractionMode::Idle);
        let a = mindmap_core::tree_ops::find_node(e.root().unwrap(), "a").unwrap();
        assert_eq!(a.text(), "Renamed");
    }

    #[test]
    fn moves_are_buffered_until_frame() {
        let root = Node::new("r", "Root").child(Node::new("a", "A")).into_arc();
        let mut e = engine(root);
        let t = e.view_state().transform;
        let a = t.world_to_screen(e.positions().get("a").unwrap().center());
        e.start_drag("a".into(), a.x, a.y);
        for dy in 1..=5 {
            e.push_input(InputEvent::Pointer(PointerEvent::new(
                PointerEventKind::Move,
                a.x,
                a.y + f64::from(dy) * 20.0,
            )));
        }
        assert_eq!(e.view_state().mode, InteractionMode::Idle);
        let outcome = e.frame();
        assert_eq!(outcome.events, 1);
        assert_eq!(e.view_state().mode, InteractionMode::DraggingNode);
        let drag = e.view_state().drag.unwrap();
        assert_eq!(drag.pointer, Point::new(a.x, a.y + 100.0));
    }

    #[test]
    fn release_flushes_pending_move_first() {
        let root = Node::new("r", "Root")
            .child(Node::new("a", "A"))
            .child(Node::new("b", "B"))
            .into_arc();
        let mut e = engine(root);
        let t = e.view_state().transform;
        let a = t.world_to_screen(e.positions().get("a").unwrap().center());
        let b = e.positions().get("b").unwrap().clone();
        let drop_at = t.world_to_screen(Point::new(b.right() + 100.0, b.y));
        e.start_drag("a".into(), a.x, a.y);
        e.push_input(InputEvent::Pointer(PointerEvent::new(
            PointerEventKind::Move,
            drop_at.x,
            drop_at.y,
        )));
        e.push_input(InputEvent::Pointer(PointerEvent::new(
            PointerEventKind::Up(MouseButton::Left),
            drop_at.x,
            drop_at.y,
        )));
        let root = e.root().unwrap();
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.children()[0].id(), "b");
        assert_eq!(root.children()[0].children()[0].id(), "a");
    }

    #[test]
    fn undo_redo_shortcuts_drive_history() {
        let mut e = engine(Node::new("r", "Root").into_arc());
        e.select(Some("r".into()));
        e.push_input(key(KeyCode::Tab));
        e.select(Some("r".into()));
        let ctrl = mindmap_core::event::Modifiers::CTRL;
        e.push_input(InputEvent::Key(KeyEvent::new(KeyCode::Char('z')).with_modifiers(ctrl)));
        assert_eq!(e.root().unwrap().node_count(), 1);
        e.push_input(InputEvent::Key(KeyEvent::new(KeyCode::Char('y')).with_modifiers(ctrl)));
        assert_eq!(e.root().unwrap().node_count(), 2);
        assert_eq!(e.positions().len(), 2);
    }

    #[test]
    fn empty_engine_is_inert() {
        let mut e = MindMapEngine::new(None, Size::new(800.0, 600.0), EngineConfig::default());
        assert!(e.positions().is_empty());
        e.push_input(key(KeyCode::Tab));
        e.frame();
        assert!(e.root().is_none());
        assert_eq!(e.view_state().transform, ViewTransform::IDENTITY);
    }

    #[test]
    fn json_load_resets_history() {
        let mut e = engine(Node::new("r", "Root").into_arc());
        e.select(Some("r".into()));
        e.push_input(key(KeyCode::Tab));
        assert!(e.history().can_undo());
        e.load_json(r#"{"id":"m","text":"Map","children":[{"id":"c","text":"C"}]}"#)
            .unwrap();
        assert!(!e.history().can_undo());
        assert_eq!(e.positions().len(), 2);
        assert!(e.load_json("{").is_err());
    }
}
