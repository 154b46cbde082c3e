#![forbid(unsafe_code)]

//! Presentation contract for the mind-map engine.
//!
//! A host canvas builds a [`RenderPlan`] from the engine's view state each
//! frame, paints it through a [`CanvasPainter`], and reports gestures back
//! through [`CanvasCallbacks`].

pub mod callbacks;
pub mod edge;
pub mod plan;

pub use callbacks::CanvasCallbacks;
pub use edge::EdgeCurve;
pub use plan::{
    CanvasPainter, DropPreview, EdgeView, GhostView, LandingView, NodeView, RenderPlan,
    TOGGLE_RADIUS,
};
