#![forbid(unsafe_code)]

//! Canonical canvas input events.
//!
//! The host (browser glue, a native shell, or a test) translates its raw
//! input into these types. Coordinates are screen pixels relative to the
//! canvas' top-left corner.
//!
//! # Design Notes
//!
//! - Pointer events carry what the host's hit-testing already knows about
//!   the element under the pointer ([`PointerTarget`]), so a press on a
//!   node's collapse toggle is never mistaken for a drag start.
//! - `KeyEventKind` defaults to `Press`.
//! - `Modifiers` use bitflags for easy combination.

use bitflags::bitflags;

use crate::geometry::{Point, Size};
use crate::node::NodeId;

/// Canonical input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer press, move, or release.
    Pointer(PointerEvent),

    /// Wheel scroll (zoom).
    Wheel(WheelEvent),

    /// A keyboard event.
    Key(KeyEvent),

    /// Canvas resized.
    Resize(Size),

    /// Focus gained (`true`) or lost (`false`).
    Focus(bool),
}

/// What the pointer is over, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PointerTarget {
    /// Empty canvas.
    #[default]
    Canvas,
    /// The body of a node.
    Node(NodeId),
    /// The collapse/expand toggle of a node.
    ToggleButton(NodeId),
}

/// Pointer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Kind of pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    Down(MouseButton),
    Move,
    Up(MouseButton),
}

/// A pointer event in screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub position: Point,
    pub target: PointerTarget,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// Create a pointer event over empty canvas with no modifiers.
    #[must_use]
    pub fn new(kind: PointerEventKind, x: f64, y: f64) -> Self {
        Self {
            kind,
            position: Point::new(x, y),
            target: PointerTarget::Canvas,
            modifiers: Modifiers::NONE,
        }
    }

    /// Set the element under the pointer.
    #[must_use]
    pub fn with_target(mut self, target: PointerTarget) -> Self {
        self.target = target;
        self
    }

    /// Set the modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Whether this is a move event (the only coalescable kind).
    #[inline]
    #[must_use]
    pub fn is_move(&self) -> bool {
        matches!(self.kind, PointerEventKind::Move)
    }
}

/// A wheel event. Positive `delta_y` scrolls down (zoom out).
///
/// `ticks` counts how many raw wheel events were merged into this one by the
/// coalescer; a raw event always has `ticks == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    pub position: Point,
    pub delta_y: f64,
    pub ticks: u32,
    pub modifiers: Modifiers,
}

impl WheelEvent {
    #[must_use]
    pub fn new(x: f64, y: f64, delta_y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            delta_y,
            ticks: 1,
            modifiers: Modifiers::NONE,
        }
    }

    /// Whether this scrolls toward zoom-out.
    #[inline]
    #[must_use]
    pub fn is_zoom_out(&self) -> bool {
        self.delta_y > 0.0
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// Press, repeat, or release.
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with no modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if Shift is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Ctrl on Linux/Windows or Cmd on macOS.
    #[must_use]
    pub const fn command(&self) -> bool {
        self.modifiers.intersects(Modifiers::CTRL.union(Modifiers::SUPER))
    }
}

/// Key codes the canvas reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Delete,
    Up,
    Down,
    Left,
    Right,
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Repeat,
    Release,
}

bitflags! {
    /// Modifier keys held during an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}
