#![forbid(unsafe_code)]

//! Layout: tiered tree layout, geometry indexes and hit-testing.
//!
//! # Role in the mind-map engine
//! `mindmap-layout` turns an immutable node tree into absolute positions and
//! the spatial indexes that make drag-and-drop and culling cheap on large
//! trees.
//!
//! # Primary responsibilities
//! - **LayoutEngine / compute_layout**: deterministic left-to-right tiered
//!   layout with memoized text sizes.
//! - **GeometryIndex**: parent map, visible-children map, subtree bounds and
//!   a uniform [`SpatialGrid`] of visible node boxes.
//! - **Hit-testing**: exact and proximity drop-target resolution plus
//!   insertion-index resolution.
//! - **Culling**: subtree-pruned viewport queries.
//! - **LayoutScheduler**: off-thread layout for large trees with
//!   last-request-wins reply filtering.
//!
//! # How it fits in the system
//! The runtime crate feeds each new tree version to the scheduler, rebuilds
//! the [`GeometryIndex`] when positions arrive, and queries hit-testing on
//! every coalesced pointer move during a drag.

pub mod config;
pub mod cull;
pub mod engine;
pub mod index;
pub mod measure;
pub mod spatial;
pub mod worker;

pub use config::{HitTestConfig, LayoutConfig};
pub use cull::visible_in_viewport;
pub use engine::{LayoutEngine, Position, PositionMap, compute_layout, compute_layout_arc};
pub use hit_test::{DropTarget, HitKind, node_at, resolve_drop_target, resolve_insert_index};
pub use index::GeometryIndex;
pub use measure::{SizeCache, SizeCacheStats, estimate_node_size};
pub use spatial::SpatialGrid;
pub use worker::{
    LayoutOutcome, LayoutRequest, LayoutResponse, LayoutScheduler, LayoutWorker, LayoutWorkerError,
};
