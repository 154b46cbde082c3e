#![forbid(unsafe_code)]

//! Undo/redo history over immutable tree snapshots.
//!
//! [`History`] is the past/present/future state machine driven by
//! [`HistoryCommand`]. Snapshots are `Arc<Node>` roots; path-copy edits
//! share every untouched subtree, so a hundred snapshots of a large tree
//! cost little more than one copy plus the edited paths.
//!
//! # Architecture
//!
//! ```text
//! apply(e3)
//! ┌──────────────────────────────────────────────┐
//! │ past:    [t0, t1, t2]                        │
//! │ present: t3                                  │
//! │ future:  []                                  │
//! └──────────────────────────────────────────────┘
//!
//! undo() x2
//! ┌──────────────────────────────────────────────┐
//! │ past:    [t0]                                │
//! │ present: t1                                  │
//! │ future:  [t2, t3]                            │
//! └──────────────────────────────────────────────┘
//!
//! apply(e4), new branch, clears future
//! ┌──────────────────────────────────────────────┐
//! │ past:    [t0, t1]                            │
//! │ present: t4                                  │
//! │ future:  []                                  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! 1. `past.len() <= config.max_depth` after every transition.
//! 2. An action whose result is `Arc::ptr_eq` to `present` changes nothing.
//! 3. `future` is cleared by every effective apply.
//! 4. `reset` forgets both stacks.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use mindmap_core::id::IdGenerator;
use mindmap_core::node::Node;
use serde::{Deserialize, Serialize};

use crate::action::{HistoryCommand, TreeAction};

/// History limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of past snapshots kept; the oldest is dropped first.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

impl HistoryConfig {
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Validate the config, returning a list of human-readable errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        if self.max_depth == 0 {
            vec!["history.max_depth must be > 0".into()]
        } else {
            Vec::new()
        }
    }
}

/// What a command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A new snapshot became present.
    Applied,
    /// The command had no effect.
    Unchanged,
    Undone,
    Redone,
    Reset,
}

impl Transition {
    /// Whether `present` may have changed.
    #[must_use]
    pub const fn changed_tree(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// The past/present/future state machine.
pub struct History {
    past: VecDeque<Arc<Node>>,
    present: Option<Arc<Node>>,
    /// Next redo at the front.
    future: VecDeque<Arc<Node>>,
    config: HistoryConfig,
    ids: IdGenerator,
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("past_depth", &self.past.len())
            .field("present", &self.present.as_ref().map(|r| r.id()))
            .field("future_depth", &self.future.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(None, HistoryConfig::default())
    }
}

impl History {
    /// Start with `initial` as present and empty stacks.
    #[must_use]
    pub fn new(initial: Option<Arc<Node>>, config: HistoryConfig) -> Self {
        Self {
            past: VecDeque::new(),
            present: initial,
            future: VecDeque::new(),
            config,
            ids: IdGenerator::default(),
        }
    }

    /// Replace the id generator used for created and duplicated nodes.
    #[must_use]
    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    // ====================================================================
    // Transitions
    // ====================================================================

    /// Run one transition.
    pub fn dispatch(&mut self, command: HistoryCommand) -> Transition {
        match command {
            HistoryCommand::Apply(action) => self.apply(&action),
            HistoryCommand::Undo => self.undo(),
            HistoryCommand::Redo => self.redo(),
            HistoryCommand::Reset(root) => self.reset(root),
        }
    }

    /// Apply `action` to the present tree.
    pub fn apply(&mut self, action: &TreeAction) -> Transition {
        let Some(present) = self.present.as_ref() else {
            tracing::trace!(
                target: "mindmap.history",
                action = action.kind(),
                "apply without tree ignored"
            );
            return Transition::Unchanged;
        };
        let next = action.apply(present, &mut self.ids);
        if Arc::ptr_eq(&next, present) {
            tracing::trace!(target: "mindmap.history", action = action.kind(), "history no-op");
            return Transition::Unchanged;
        }
        if let Some(previous) = self.present.replace(next) {
            self.past.push_back(previous);
        }
        self.future.clear();
        self.enforce_depth();
        tracing::debug!(
            target: "mindmap.history",
            action = action.kind(),
            past_depth = self.past.len() as u64,
            "history apply"
        );
        Transition::Applied
    }

    /// Step back one snapshot. No-op when there is no past.
    pub fn undo(&mut self) -> Transition {
        let Some(previous) = self.past.pop_back() else {
            return Transition::Unchanged;
        };
        if let Some(current) = self.present.replace(previous) {
            self.future.push_front(current);
        }
        tracing::debug!(
            target: "mindmap.history",
            past_depth = self.past.len() as u64,
            future_depth = self.future.len() as u64,
            "history undo"
        );
        Transition::Undone
    }

    /// Step forward one snapshot. No-op when there is no future.
    pub fn redo(&mut self) -> Transition {
        let Some(next) = self.future.pop_front() else {
            return Transition::Unchanged;
        };
        if let Some(current) = self.present.replace(next) {
            self.past.push_back(current);
        }
        self.enforce_depth();
        tracing::debug!(
            target: "mindmap.history",
            past_depth = self.past.len() as u64,
            future_depth = self.future.len() as u64,
            "history redo"
        );
        Transition::Redone
    }

    /// Replace the whole state; all history is forgotten.
    pub fn reset(&mut self, root: Option<Arc<Node>>) -> Transition {
        self.past.clear();
        self.future.clear();
        self.present = root;
        tracing::debug!(
            target: "mindmap.history",
            root = self.present.as_ref().map(|r| r.id().as_str()),
            "history reset"
        );
        Transition::Reset
    }

    // ====================================================================
    // Query
    // ====================================================================

    #[must_use]
    pub fn present(&self) -> Option<&Arc<Node>> {
        self.present.as_ref()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Replace the limits; excess past snapshots are dropped immediately.
    pub fn set_config(&mut self, config: HistoryConfig) {
        self.config = config;
        self.enforce_depth();
    }

    /// A new leaf with an id unused in the present tree.
    pub fn fresh_node(&mut self) -> Node {
        self.ids.fresh_node(self.present.as_deref())
    }

    fn enforce_depth(&mut self) {
        while self.past.len() > self.config.max_depth {
            self.past.pop_front();
        }
    }
}
