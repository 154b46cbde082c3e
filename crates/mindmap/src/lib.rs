#![forbid(unsafe_code)]

//! Mind-map layout and spatial interaction engine: public facade.
//!
//! This crate provides the stable surface area for users. It re-exports the
//! common types of the internal crates, a small prelude, and the top-level
//! [`Error`]/[`Result`].
//!
//! ```rust,ignore
//! use mindmap::prelude::*;
//!
//! let config = EngineConfig::load_validated_toml_file("mindmap.toml")?;
//! let mut engine = mindmap::open_tree_file("map.json", Size::new(1280.0, 800.0), config)?;
//! engine.push_input(InputEvent::Key(KeyEvent::new(KeyCode::Tab)));
//! engine.frame();
//! let state = engine.view_state();
//! RenderPlan::build(&state).paint(&mut my_painter);
//! ```

use std::path::Path;

pub mod error;
#[cfg(feature = "logging")]
pub mod logging;

pub use error::{Error, Result};

// --- Core re-exports -------------------------------------------------------

pub use mindmap_core::event::{
    InputEvent, KeyCode, KeyEvent, KeyEventKind, Modifiers, MouseButton, PointerEvent,
    PointerEventKind, PointerTarget, WheelEvent,
};
pub use mindmap_core::{Bounds, Node, NodeId, NodeStyle, Point, Size, TreeLoadError};

// --- Layout re-exports -----------------------------------------------------

pub use mindmap_layout::{
    DropTarget, GeometryIndex, HitKind, HitTestConfig, LayoutConfig, LayoutEngine,
    LayoutWorkerError, Position, PositionMap, compute_layout,
};

// --- Runtime re-exports ----------------------------------------------------

pub use mindmap_runtime::{
    ConfigError, EngineConfig, HistoryCommand, InteractionConfig, InteractionMode, MindMapEngine,
    Transition, TreeAction, ViewConfig, ViewState, ViewTransform,
};

// --- Widget re-exports -----------------------------------------------------

pub use mindmap_widgets::{CanvasCallbacks, CanvasPainter, RenderPlan};

/// Load a nested-JSON tree from disk and start an engine on it.
pub fn open_tree_file(
    path: impl AsRef<Path>,
    viewport: Size,
    config: EngineConfig,
) -> Result<MindMapEngine> {
    let json = std::fs::read_to_string(path.as_ref())?;
    Ok(MindMapEngine::from_json_str(&json, viewport, config)?)
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        CanvasCallbacks, CanvasPainter, EngineConfig, Error, InputEvent, KeyCode, KeyEvent,
        MindMapEngine, Node, NodeId, Point, PointerEvent, PointerEventKind, RenderPlan, Result,
        Size, TreeAction, ViewTransform, WheelEvent,
    };

    pub use crate::{core, layout, runtime, widgets};
}

pub use mindmap_core as core;
pub use mindmap_layout as layout;
pub use mindmap_runtime as runtime;
pub use mindmap_widgets as widgets;
