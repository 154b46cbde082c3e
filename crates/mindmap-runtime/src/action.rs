#![forbid(unsafe_code)]

//! Typed tree edits and history commands.
//!
//! A [`TreeAction`] names one tree operation together with its arguments.
//! Applying it never fails: an action that does not apply to the tree (an
//! unknown id, a cyclic move, deleting the root) returns the root unchanged
//! and the history machine records nothing.

use std::sync::Arc;

use mindmap_core::id::IdGenerator;
use mindmap_core::node::{Node, NodeId};
use mindmap_core::tree_ops;

/// One edit of the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeAction {
    /// Append `node` to `parent_id`'s children and expand the parent.
    AddChild { parent_id: NodeId, node: Node },
    /// Insert `node` right after `node_id`. No-op on the root.
    AddSibling { node_id: NodeId, node: Node },
    /// Remove `node_id` and its descendants. No-op on the root.
    Delete { node_id: NodeId },
    /// Re-parent `node_id` under `target_parent_id` at `target_index`
    /// (append when `None` or out of range).
    Move {
        node_id: NodeId,
        target_parent_id: NodeId,
        target_index: Option<usize>,
    },
    SetText { node_id: NodeId, text: String },
    ToggleCollapse { node_id: NodeId },
    SetCollapsed { node_id: NodeId, collapsed: bool },
    /// Insert a fresh-id copy of `node_id`'s subtree right after it.
    DuplicateSubtree { node_id: NodeId },
}

impl TreeAction {
    /// Short stable name, used as a log field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AddChild { .. } => "add_child",
            Self::AddSibling { .. } => "add_sibling",
            Self::Delete { .. } => "delete",
            Self::Move { .. } => "move",
            Self::SetText { .. } => "set_text",
            Self::ToggleCollapse { .. } => "toggle_collapse",
            Self::SetCollapsed { .. } => "set_collapsed",
            Self::DuplicateSubtree { .. } => "duplicate_subtree",
        }
    }

    /// Run the action against `root`.
    ///
    /// The result is `Arc::ptr_eq` to `root` exactly when nothing changed.
    #[must_use]
    pub fn apply(&self, root: &Arc<Node>, ids: &mut IdGenerator) -> Arc<Node> {
        match self {
            Self::AddChild { parent_id, node } => {
                tree_ops::add_child_node(root, parent_id.as_str(), node.clone())
            }
            Self::AddSibling { node_id, node } => {
                tree_ops::add_sibling_node(root, node_id.as_str(), node.clone())
            }
            Self::Delete { node_id } => {
                tree_ops::delete_subtree(root, node_id.as_str()).unwrap_or_else(|| Arc::clone(root))
            }
            Self::Move {
                node_id,
                target_parent_id,
                target_index,
            } => tree_ops::move_node(
                root,
                node_id.as_str(),
                target_parent_id.as_str(),
                *target_index,
            ),
            Self::SetText { node_id, text } => tree_ops::set_text(root, node_id.as_str(), text),
            Self::ToggleCollapse { node_id } => tree_ops::toggle_collapsed(root, node_id.as_str()),
            Self::SetCollapsed { node_id, collapsed } => {
                tree_ops::set_collapsed(root, node_id.as_str(), *collapsed)
            }
            Self::DuplicateSubtree { node_id } => {
                tree_ops::duplicate_subtree(root, node_id.as_str(), ids)
            }
        }
    }
}

/// The single input of the history state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryCommand {
    Apply(TreeAction),
    Undo,
    Redo,
    /// Replace the whole state with a new tree and forget all history.
    Reset(Option<Arc<Node>>),
}

impl From<TreeAction> for HistoryCommand {
    fn from(action: TreeAction) -> Self {
        Self::Apply(action)
    }
}
