#![forbid(unsafe_code)]

//! Canvas interaction state machine.
//!
//! [`CanvasController`] turns coalesced input events into view changes
//! (pan, zoom, resize) it applies itself, and [`CanvasIntent`]s for the
//! engine (tree edits, history, delete requests). It never touches the tree;
//! everything it knows about geometry comes from the [`Scene`] borrowed for
//! each event.
//!
//! # State Machine
//!
//! ```text
//!              down on canvas               up
//!   ┌──────┐ ─────────────────▶ ┌─────────┐ ──▶ Idle
//!   │ Idle │                    │ Panning │
//!   └──────┘ ◀───────────────── └─────────┘
//!      │  down on node   ┌───────┐  moved ≥ threshold  ┌──────────────┐
//!      └───────────────▶ │ press │ ──────────────────▶ │ DraggingNode │
//!                        └───────┘                     └──────────────┘
//!                          │ up: click                   │ up: drop or abandon
//!                          ▼                             ▼
//!                         Idle                          Idle
//!
//!   start_edit ──▶ EditingNode (blocks shortcuts and drag start)
//! ```
//!
//! # Failure Modes
//!
//! Geometry lookups tolerate stale ids: if the dragged node disappears from
//! the scene mid-drag, the drag is abandoned and no move is emitted.

use mindmap_core::event::{
    InputEvent, KeyEvent, MouseButton, PointerEvent, PointerEventKind, PointerTarget, WheelEvent,
};
use mindmap_core::geometry::{Bounds, Point, Size};
use mindmap_core::node::NodeId;
use mindmap_layout::engine::{Position, PositionMap};
use mindmap_layout::hit_test::{DropTarget, resolve_drop_target};
use mindmap_layout::index::GeometryIndex;

use crate::config::InteractionConfig;
use crate::keymap::{KeyContext, Shortcut, resolve_shortcut};
use crate::transform::{ViewConfig, ViewTransform};

/// Geometry the controller reads while handling one event.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub positions: &'a PositionMap,
    pub index: &'a GeometryIndex,
    /// Nodes in the current tree, visible or not.
    pub node_count: usize,
}

/// Current interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Panning,
    DraggingNode,
    EditingNode,
}

/// Request for the engine, produced by input handling.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasIntent {
    AddChild { parent_id: NodeId },
    AddSibling { node_id: NodeId },
    /// Ask the user to confirm deleting `node_id`.
    RequestDelete { node_id: NodeId },
    ToggleCollapse { node_id: NodeId },
    Move {
        node_id: NodeId,
        target_parent_id: NodeId,
        target_index: usize,
    },
    Undo,
    Redo,
}

/// A node drag past the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub node_id: NodeId,
    /// Latest pointer position (screen).
    pub pointer: Point,
    /// Node center minus pointer at press time (screen).
    pub grab_offset: Point,
    /// Box following the pointer (world).
    pub ghost: Bounds,
    pub drop_target: Option<DropTarget>,
    /// Where the node would land under `drop_target` (world, left edge and
    /// vertical insertion line).
    pub landing: Option<Point>,
    /// The dragged node laid out at its landing spot.
    pub preview: Option<DragPreview>,
}

/// Synthesized layout of the dragged node at its predicted place.
#[derive(Debug, Clone, PartialEq)]
pub struct DragPreview {
    /// World box one level below the drop target, left-aligned with the
    /// target's child column and centered on the insertion line.
    pub position: Position,
    pub text: String,
}

/// A node press that has not moved far enough to be a drag.
#[derive(Debug, Clone, PartialEq)]
struct Press {
    node_id: NodeId,
    origin: Point,
    grab_offset: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PanSession {
    origin: Point,
    start: ViewTransform,
    /// Frames bypass the committed transform until release.
    direct: bool,
    live: ViewTransform,
    travelled: f64,
}

/// Pan/zoom, selection, edit and drag state of the canvas.
#[derive(Debug, Clone)]
pub struct CanvasController {
    config: InteractionConfig,
    view: ViewConfig,
    transform: ViewTransform,
    /// Bumped on every committed transform change.
    transform_revision: u64,
    viewport: Size,
    selected: Option<NodeId>,
    editing: Option<NodeId>,
    text_input_focused: bool,
    press: Option<Press>,
    pan: Option<PanSession>,
    drag: Option<DragSession>,
}

impl CanvasController {
    #[must_use]
    pub fn new(config: InteractionConfig, view: ViewConfig, viewport: Size) -> Self {
        let transform = ViewTransform::new(0.0, 0.0, view.clamp_scale(view.initial_scale));
        Self {
            config,
            view,
            transform,
            transform_revision: 0,
            viewport,
            selected: None,
            editing: None,
            text_input_focused: false,
            press: None,
            pan: None,
            drag: None,
        }
    }

    // ====================================================================
    // Query
    // ====================================================================

    #[must_use]
    pub fn mode(&self) -> InteractionMode {
        if self.drag.is_some() {
            InteractionMode::DraggingNode
        } else if self.pan.is_some() {
            InteractionMode::Panning
        } else if self.editing.is_some() {
            InteractionMode::EditingNode
        } else {
            InteractionMode::Idle
        }
    }

    /// Committed transform.
    #[must_use]
    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    /// Transform to paint with: the side-channel pan frame while a direct
    /// pan is in progress, the committed transform otherwise.
    #[must_use]
    pub fn render_transform(&self) -> ViewTransform {
        match &self.pan {
            Some(pan) if pan.direct => pan.live,
            _ => self.transform,
        }
    }

    #[must_use]
    pub fn transform_revision(&self) -> u64 {
        self.transform_revision
    }

    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    #[must_use]
    pub fn selected(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn editing(&self) -> Option<&NodeId> {
        self.editing.as_ref()
    }

    #[must_use]
    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    #[must_use]
    pub fn view_config(&self) -> &ViewConfig {
        &self.view
    }

    // ====================================================================
    // Direct manipulation
    // ====================================================================

    pub fn set_config(&mut self, config: InteractionConfig, view: ViewConfig) {
        self.config = config;
        self.view = view;
    }

    /// Replace the committed transform.
    pub fn set_transform(&mut self, transform: ViewTransform) {
        if transform != self.transform {
            self.transform = transform;
            self.transform_revision += 1;
        }
    }

    pub fn select(&mut self, id: Option<NodeId>) {
        self.selected = id;
    }

    pub fn set_text_input_focused(&mut self, focused: bool) {
        self.text_input_focused = focused;
    }

    /// Enter text editing for `id`. Any drag in progress is abandoned.
    pub fn start_edit(&mut self, id: NodeId) {
        if let Some(drag) = self.drag.take() {
            log_abandoned(&drag.node_id, "edit started");
        }
        self.press = None;
        self.selected = Some(id.clone());
        self.editing = Some(id);
    }

    /// Leave text editing. Returns the id that was being edited.
    pub fn stop_edit(&mut self) -> Option<NodeId> {
        self.editing.take()
    }

    /// Drop references to ids that no longer exist after a tree change.
    pub fn reconcile(&mut self, index: &GeometryIndex) {
        if self.selected.as_ref().is_some_and(|id| !index.contains(id.as_str())) {
            self.selected = None;
        }
        if self.editing.as_ref().is_some_and(|id| !index.contains(id.as_str())) {
            self.editing = None;
        }
        if self.press.as_ref().is_some_and(|p| !index.contains(p.node_id.as_str())) {
            self.press = None;
        }
        if self.drag.as_ref().is_some_and(|d| !index.contains(d.node_id.as_str()))
            && let Some(drag) = self.drag.take()
        {
            log_abandoned(&drag.node_id, "stale node");
        }
    }

    // ====================================================================
    // Event handling
    // ====================================================================

    /// Handle one (coalesced) input event.
    pub fn handle(&mut self, event: &InputEvent, scene: &Scene<'_>) -> Vec<CanvasIntent> {
        let mut intents = Vec::new();
        match event {
            InputEvent::Pointer(pointer) => self.on_pointer(pointer, scene, &mut intents),
            InputEvent::Wheel(wheel) => self.on_wheel(wheel),
            InputEvent::Key(key) => self.on_key(key, &mut intents),
            InputEvent::Resize(size) => self.on_resize(*size),
            InputEvent::Focus(focused) => {
                if !focused {
                    self.on_focus_lost();
                }
            }
        }
        intents
    }

    fn on_pointer(&mut self, event: &PointerEvent, scene: &Scene<'_>, out: &mut Vec<CanvasIntent>) {
        match event.kind {
            PointerEventKind::Down(button) => self.on_down(button, event, scene, out),
            PointerEventKind::Move => self.on_move(event.position, scene),
            PointerEventKind::Up(_) => self.on_up(event.position, scene, out),
        }
    }

    fn on_down(
        &mut self,
        button: MouseButton,
        event: &PointerEvent,
        scene: &Scene<'_>,
        out: &mut Vec<CanvasIntent>,
    ) {
        if self.drag.is_some() || self.pan.is_some() {
            return;
        }
        match (&event.target, button) {
            (PointerTarget::ToggleButton(id), MouseButton::Left) => {
                out.push(CanvasIntent::ToggleCollapse {
                    node_id: id.clone(),
                });
            }
            (PointerTarget::Node(id), MouseButton::Left) => {
                self.selected = Some(id.clone());
                if self.editing.is_some() {
                    return;
                }
                let Some(position) = scene.positions.get(id.as_str()) else {
                    return;
                };
                let center = self.transform.world_to_screen(position.center());
                self.press = Some(Press {
                    node_id: id.clone(),
                    origin: event.position,
                    grab_offset: Point::new(
                        center.x - event.position.x,
                        center.y - event.position.y,
                    ),
                });
            }
            (PointerTarget::Canvas, MouseButton::Left | MouseButton::Middle) => {
                self.pan = Some(PanSession {
                    origin: event.position,
                    start: self.transform,
                    direct: scene.node_count > self.config.direct_pan_threshold,
                    live: self.transform,
                    travelled: 0.0,
                });
            }
            _ => {}
        }
    }

    fn on_move(&mut self, position: Point, scene: &Scene<'_>) {
        if let Some(pan) = self.pan.as_mut() {
            let dx = position.x - pan.origin.x;
            let dy = position.y - pan.origin.y;
            pan.travelled = pan.travelled.max(position.distance(pan.origin));
            let next = pan.start.panned(dx, dy);
            if pan.direct {
                pan.live = next;
            } else {
                self.set_transform(next);
            }
            return;
        }

        let past_threshold = self
            .press
            .as_ref()
            .is_some_and(|press| position.distance(press.origin) >= self.config.drag_threshold);
        if past_threshold && let Some(press) = self.press.take() {
            self.begin_drag(press, position, scene);
        }

        if self.drag.is_some() {
            self.update_drag(position, scene);
        }
    }

    fn begin_drag(&mut self, press: Press, position: Point, scene: &Scene<'_>) {
        let Some(node) = scene.positions.get(press.node_id.as_str()) else {
            return;
        };
        tracing::debug!(
            target: "mindmap.interaction",
            node_id = %press.node_id,
            "drag started"
        );
        let ghost = Bounds::from_center(node.center(), node.size());
        self.drag = Some(DragSession {
            node_id: press.node_id,
            pointer: position,
            grab_offset: press.grab_offset,
            ghost,
            drop_target: None,
            landing: None,
            preview: None,
        });
    }

    fn update_drag(&mut self, position: Point, scene: &Scene<'_>) {
        let Some(drag) = self.drag.as_ref() else {
            return;
        };
        let (node_id, grab_offset) = (drag.node_id.clone(), drag.grab_offset);
        let Some(node) = scene.positions.get(node_id.as_str()) else {
            self.drag = None;
            log_abandoned(&node_id, "stale node");
            return;
        };
        let world = self.transform.screen_to_world(position);
        let ghost_center = self.transform.screen_to_world(Point::new(
            position.x + grab_offset.x,
            position.y + grab_offset.y,
        ));
        let hit_test = &self.config.hit_test;
        let drop_target =
            resolve_drop_target(scene.index, scene.positions, node_id.as_str(), world, hit_test);
        let landing = drop_target.as_ref().and_then(|target| {
            landing_point(scene, target, node_id.as_str(), hit_test.slot_offset_x)
        });
        let preview = drop_target
            .as_ref()
            .zip(landing)
            .and_then(|(target, landing)| drag_preview(scene, node, target, landing));
        if let Some(drag) = self.drag.as_mut() {
            drag.pointer = position;
            drag.ghost = Bounds::from_center(ghost_center, node.size());
            drag.drop_target = drop_target;
            drag.landing = landing;
            drag.preview = preview;
        }
    }

    fn on_up(&mut self, position: Point, scene: &Scene<'_>, out: &mut Vec<CanvasIntent>) {
        if let Some(pan) = self.pan.take() {
            if pan.direct {
                self.set_transform(pan.live);
            }
            if pan.travelled < self.config.drag_threshold {
                self.selected = None;
            }
            return;
        }

        if self.press.take().is_some() {
            // A click: selection already happened on press.
            return;
        }

        if self.drag.is_some() {
            self.update_drag(position, scene);
        }
        let Some(drag) = self.drag.take() else {
            return;
        };
        match drag.drop_target {
            Some(target) => {
                tracing::debug!(
                    target: "mindmap.interaction",
                    node_id = %drag.node_id,
                    target_id = %target.target_id,
                    insert_index = target.insert_index as u64,
                    "drop committed"
                );
                out.push(CanvasIntent::Move {
                    node_id: drag.node_id,
                    target_parent_id: target.target_id,
                    target_index: target.insert_index,
                });
            }
            None => log_abandoned(&drag.node_id, "no target"),
        }
    }

    fn on_wheel(&mut self, wheel: &WheelEvent) {
        if self.pan.is_some() {
            return;
        }
        let per_tick = if wheel.is_zoom_out() {
            self.view.zoom_out_factor
        } else {
            self.view.zoom_in_factor
        };
        let ticks = i32::try_from(wheel.ticks.max(1)).unwrap_or(i32::MAX);
        let factor = per_tick.powi(ticks);
        let outcome = self.transform.zoom_by(factor, wheel.position, &self.view);
        if outcome.clamped {
            tracing::debug!(
                target: "mindmap.interaction",
                requested = self.transform.scale * factor,
                scale = outcome.transform.scale,
                "zoom clamped"
            );
        }
        self.set_transform(outcome.transform);
    }

    fn on_key(&mut self, key: &KeyEvent, out: &mut Vec<CanvasIntent>) {
        let context = KeyContext::new()
            .with_selection(self.selected.is_some())
            .with_editing(self.editing.is_some())
            .with_text_focus(self.text_input_focused);
        let Some(shortcut) = resolve_shortcut(key, &context) else {
            return;
        };
        if shortcut == Shortcut::Cancel {
            self.cancel();
            return;
        }
        let Some(selected) = self.selected.clone() else {
            return;
        };
        out.push(match shortcut {
            Shortcut::AddSibling => CanvasIntent::AddSibling { node_id: selected },
            Shortcut::AddChild => CanvasIntent::AddChild {
                parent_id: selected,
            },
            Shortcut::RequestDelete => CanvasIntent::RequestDelete { node_id: selected },
            Shortcut::Undo => CanvasIntent::Undo,
            Shortcut::Redo => CanvasIntent::Redo,
            Shortcut::Cancel => return,
        });
    }

    /// Escape: abandon a drag first, then an edit.
    fn cancel(&mut self) {
        self.press = None;
        if let Some(drag) = self.drag.take() {
            log_abandoned(&drag.node_id, "cancelled");
        } else if self.editing.take().is_some() {
            tracing::trace!(target: "mindmap.interaction", "edit cancelled");
        }
    }

    fn on_resize(&mut self, size: Size) {
        let next = self.transform.resized(self.viewport, size);
        self.viewport = size;
        if let Some(pan) = self.pan.as_mut() {
            let dx = next.translate_x - self.transform.translate_x;
            let dy = next.translate_y - self.transform.translate_y;
            pan.start = pan.start.panned(dx, dy);
            pan.live = pan.live.panned(dx, dy);
        }
        self.set_transform(next);
    }

    fn on_focus_lost(&mut self) {
        self.press = None;
        if let Some(drag) = self.drag.take() {
            log_abandoned(&drag.node_id, "focus lost");
        }
        if let Some(pan) = self.pan.take()
            && pan.direct
        {
            self.set_transform(pan.live);
        }
    }
}

fn log_abandoned(node_id: &NodeId, reason: &'static str) {
    tracing::debug!(
        target: "mindmap.interaction",
        node_id = %node_id,
        reason,
        "drag abandoned"
    );
}

/// Left edge and insertion line of a drop, in world space.
fn landing_point(
    scene: &Scene<'_>,
    drop: &DropTarget,
    dragged: &str,
    slot_offset_x: f64,
) -> Option<Point> {
    let target = scene.positions.get(drop.target_id.as_str())?;
    let children: Vec<&NodeId> = scene
        .index
        .visible_children(drop.target_id.as_str())
        .iter()
        .filter(|c| c.as_str() != dragged)
        .collect();
    let Some(first) = children.first() else {
        return Some(Point::new(target.right() + slot_offset_x, target.y));
    };
    let x = scene.positions.get(first.as_str())?.left();
    let y = match children.get(drop.insert_index) {
        Some(next) => scene.index.subtree_bounds(next.as_str())?.min_y,
        None => scene.index.subtree_bottom(children.last()?.as_str())?,
    };
    Some(Point::new(x, y))
}

fn drag_preview(
    scene: &Scene<'_>,
    dragged: &Position,
    drop: &DropTarget,
    landing: Point,
) -> Option<DragPreview> {
    let target = scene.positions.get(drop.target_id.as_str())?;
    let text = scene.index.node(dragged.id.as_str())?.text().to_owned();
    Some(DragPreview {
        position: Position {
            id: dragged.id.clone(),
            x: landing.x + dragged.width / 2.0,
            y: landing.y,
            width: dragged.width,
            height: dragged.height,
            level: target.level + 1,
            visible: true,
        },
        text,
    })
}
