#![forbid(unsafe_code)]

//! Fresh node id generation.

use std::collections::HashSet;

use crate::node::{Node, NodeId};

/// Text given to nodes created by "add child" / "add sibling".
pub const DEFAULT_NODE_TEXT: &str = "New node";

/// Produces `"{prefix}{n}"` ids with a monotonically increasing counter.
///
/// The counter never goes backwards, so ids handed out by one generator are
/// unique among themselves; [`next_unused`](Self::next_unused) additionally
/// skips ids that already exist in a tree.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: String,
    next: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new("node-")
    }
}

impl IdGenerator {
    /// Create a generator starting at 1.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }

    /// Next id not contained in `taken`.
    pub fn next_unused(&mut self, taken: &HashSet<&str>) -> NodeId {
        loop {
            let candidate = format!("{}{}", self.prefix, self.next);
            self.next = self.next.saturating_add(1);
            if !taken.contains(candidate.as_str()) {
                return NodeId::new(candidate);
            }
        }
    }

    /// Next id not used anywhere in `root`'s tree.
    pub fn next_for(&mut self, root: Option<&Node>) -> NodeId {
        let taken: HashSet<&str> = root
            .map(|r| r.iter().map(|(n, _)| n.id().as_str()).collect())
            .unwrap_or_default();
        self.next_unused(&taken)
    }

    /// A new leaf with a fresh id and the default text.
    pub fn fresh_node(&mut self, root: Option<&Node>) -> Node {
        Node::new(self.next_for(root), DEFAULT_NODE_TEXT)
    }
}
