#![forbid(unsafe_code)]

//! Mind-map node model.
//!
//! A [`Node`] owns its children through [`Arc`] so that tree operations can
//! copy only the path from the root to the edited node and share every
//! untouched subtree with the previous version. Two trees are "the same
//! version" exactly when their roots are [`Arc::ptr_eq`].
//!
//! # Example
//!
//! ```
//! use mindmap_core::node::Node;
//!
//! let root = Node::new("r", "Root")
//!     .child(Node::new("a", "Alpha").child(Node::new("b", "Beta")))
//!     .child(Node::new("c", "Gamma"))
//!     .into_arc();
//!
//! assert_eq!(root.children().len(), 2);
//! assert_eq!(root.node_count(), 4);
//! assert_eq!(root.depth(), 3);
//! ```
//!
//! # Invariants
//!
//! 1. Ids are unique across the tree (checked by [`Node::from_json_str`]).
//! 2. The structure is acyclic by construction; `move_node` refuses to move a
//!    node into its own subtree.
//! 3. Fields are only changed through [`crate::tree_ops`], which always returns
//!    a new root.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Stable, unique identifier of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create an id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Optional per-node visual override.
///
/// Only `font_size` participates in layout; the colors are passed through to
/// the presentation layer untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
}

/// A node in the mind-map tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) children: Vec<Arc<Node>>,
    #[serde(default)]
    pub(crate) collapsed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) style: Option<NodeStyle>,
}

impl Node {
    /// Create a leaf node.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            children: Vec::new(),
            collapsed: false,
            style: None,
        }
    }

    /// Append a child node.
    #[must_use]
    pub fn child(mut self, node: Node) -> Self {
        self.children.push(Arc::new(node));
        self
    }

    /// Replace the children.
    #[must_use]
    pub fn with_children(mut self, nodes: Vec<Node>) -> Self {
        self.children = nodes.into_iter().map(Arc::new).collect();
        self
    }

    /// Set the collapsed flag.
    #[must_use]
    pub fn collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = collapsed;
        self
    }

    /// Attach a style override.
    #[must_use]
    pub fn with_style(mut self, style: NodeStyle) -> Self {
        self.style = Some(style);
        self
    }

    /// Wrap into an [`Arc`] so it can serve as a tree root.
    #[must_use]
    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[Arc<Node>] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    #[inline]
    #[must_use]
    pub fn style(&self) -> Option<&NodeStyle> {
        self.style.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Children that take part in layout: empty when collapsed.
    #[inline]
    #[must_use]
    pub fn visible_children(&self) -> &[Arc<Node>] {
        if self.collapsed { &[] } else { &self.children }
    }

    /// Pre-order traversal yielding each node with its depth (root = 0).
    #[must_use]
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            stack: vec![(self, 0)],
        }
    }

    /// Total number of nodes in this subtree, including hidden ones.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Number of levels in this subtree (a leaf has depth 1).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.iter().map(|(_, level)| level + 1).max().unwrap_or(1)
    }

    /// Parse a tree from nested JSON and validate its ids.
    ///
    /// Nesting depth is unbounded; the stack grows on the heap as the parser
    /// descends.
    pub fn from_json_str(json: &str) -> Result<Arc<Self>, TreeLoadError> {
        let mut de = serde_json::Deserializer::from_str(json);
        de.disable_recursion_limit();
        let root = Self::deserialize(serde_stacker::Deserializer::new(&mut de))
            .map_err(TreeLoadError::Json)?;
        de.end().map_err(TreeLoadError::Json)?;
        root.validate_ids()?;
        Ok(Arc::new(root))
    }

    /// Serialize the tree to compact JSON.
    pub fn to_json_string(&self) -> Result<String, TreeLoadError> {
        serde_json::to_string(self).map_err(TreeLoadError::Json)
    }

    /// Check that every id is non-empty and unique.
    pub fn validate_ids(&self) -> Result<(), TreeLoadError> {
        let mut seen = HashSet::with_capacity(64);
        for (node, _) in self.iter() {
            if node.id.as_str().is_empty() {
                return Err(TreeLoadError::EmptyId);
            }
            if !seen.insert(node.id.as_str()) {
                return Err(TreeLoadError::DuplicateId(node.id.clone()));
            }
        }
        Ok(())
    }
}

/// Pre-order iterator over a subtree.
#[derive(Debug)]
pub struct PreOrder<'a> {
    stack: Vec<(&'a Node, usize)>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (&'a Node, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, level) = self.stack.pop()?;
        // Reverse so the first child is visited first.
        for child in node.children.iter().rev() {
            self.stack.push((child, level + 1));
        }
        Some((node, level))
    }
}

/// Errors raised while loading a tree from external data.
#[derive(Debug)]
pub enum TreeLoadError {
    /// Malformed JSON or a shape that does not match [`Node`].
    Json(serde_json::Error),
    /// The same id appears more than once.
    DuplicateId(NodeId),
    /// A node has an empty id.
    EmptyId,
}

impl fmt::Display for TreeLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "tree JSON error: {e}"),
            Self::DuplicateId(id) => write!(f, "duplicate node id: {id}"),
            Self::EmptyId => f.write_str("node id must not be empty"),
        }
    }
}

impl std::error::Error for TreeLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::DuplicateId(_) | Self::EmptyId => None,
        }
    }
}
