#![forbid(unsafe_code)]

//! Runtime: history, view transform, interaction and the engine loop.
//!
//! # Role in the mind-map engine
//! `mindmap-runtime` is the stateful layer. It turns host input events into
//! tree edits and view changes, keeps bounded undo/redo history of tree
//! snapshots, and schedules layout whenever the present tree changes.
//!
//! # Primary responsibilities
//! - **History**: past/present/future snapshots with a depth limit.
//! - **TreeAction**: serializable edit commands replayed through history.
//! - **ViewTransform**: pan/zoom with anchored zoom and scale limits.
//! - **CanvasController**: selection, edit mode, panning and node drag with
//!   live drop-target resolution.
//! - **Keymap**: shortcut resolution gated on selection and focus.
//! - **EngineConfig**: every tunable, loadable from TOML or JSON.
//! - **MindMapEngine**: the wiring, exposing a borrowed [`ViewState`].
//!
//! # How it fits in the system
//! The engine owns a `mindmap-layout` scheduler and geometry index and
//! applies `mindmap-core` tree operations through history. A presentation
//! layer reads [`MindMapEngine::view_state`] each frame and reports user
//! gestures back through the engine's callback methods.

pub mod action;
pub mod config;
pub mod controller;
pub mod engine;
pub mod history;
pub mod keymap;
pub mod transform;

pub use action::{HistoryCommand, TreeAction};
pub use config::{ConfigError, EngineConfig, InteractionConfig};
pub use controller::{
    CanvasController, CanvasIntent, DragPreview, DragSession, InteractionMode, Scene,
};
pub use engine::{FrameOutcome, MindMapEngine, ViewState};
pub use history::{History, HistoryConfig, Transition};
pub use keymap::{KeyContext, Shortcut, resolve_shortcut};
pub use transform::{ViewConfig, ViewTransform, ZoomOutcome};
