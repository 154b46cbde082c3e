#![forbid(unsafe_code)]

//! Core: node model, tree operations, geometry, and input events.
//!
//! # Role in the mind-map engine
//! `mindmap-core` is the data layer. It owns the immutable [`node::Node`]
//! tree and the pure operations that produce new versions of it, plus the
//! canonical input event types the interaction controller consumes.
//!
//! # Primary responsibilities
//! - **Node / NodeId**: the tree entity, JSON loading and id validation.
//! - **tree_ops**: path-copying edits that return the input root unchanged
//!   when a request is invalid.
//! - **IdGenerator**: fresh ids for created and duplicated nodes.
//! - **Geometry**: `f64` points, sizes and bounding boxes in layout space.
//! - **Events**: pointer, wheel, key, resize and focus events, and the
//!   per-frame coalescer for pointer moves and wheel ticks.
//!
//! # How it fits in the system
//! `mindmap-layout` turns a tree into positions and spatial indexes;
//! `mindmap-runtime` wraps tree operations in undo/redo history and drives
//! them from input events. Neither needs anything from this crate beyond
//! plain data and pure functions.

pub mod event;
pub mod event_coalescer;
pub mod geometry;
pub mod id;
pub mod node;
pub mod tree_ops;

pub use geometry::{Bounds, Point, Size};
pub use node::{Node, NodeId, NodeStyle, TreeLoadError};
