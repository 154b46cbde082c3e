#![forbid(unsafe_code)]

//! Persistent tree operations.
//!
//! Every operation takes the current root by reference and returns a new
//! root. Only the nodes on the path from the root to the edited node are
//! copied; all other subtrees are shared with the input through [`Arc`].
//!
//! # No-op contract
//!
//! Operations never panic and never report errors. When the request is
//! invalid (unknown id, a move that would create a cycle, a sibling for the
//! root, an id that already exists) the input root is returned as-is, so
//! `Arc::ptr_eq(&before, &after)` tells the caller nothing changed. The
//! history machine relies on this to skip no-op edits.
//!
//! # Complexity
//!
//! Lookups are a depth-first walk, O(n). Edits are O(n) to locate the target
//! plus O(depth · fan-out) to copy the path. Traversals use an explicit
//! stack, so very deep chains do not exhaust the call stack.

use std::collections::HashSet;
use std::sync::Arc;

use crate::id::IdGenerator;
use crate::node::{Node, NodeId};

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Depth-first search for a node by id.
#[must_use]
pub fn find_node<'a>(root: &'a Arc<Node>, id: &str) -> Option<&'a Arc<Node>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.id == *id {
            return Some(node);
        }
        stack.extend(node.children.iter().rev());
    }
    None
}

/// Parent of the node with `id`; `None` for the root or an unknown id.
#[must_use]
pub fn find_parent<'a>(root: &'a Arc<Node>, id: &str) -> Option<&'a Arc<Node>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.children.iter().any(|c| c.id == *id) {
            return Some(node);
        }
        stack.extend(node.children.iter().rev());
    }
    None
}

/// Whether `id` lies in the subtree rooted at `ancestor_id` (inclusive).
#[must_use]
pub fn subtree_contains(root: &Arc<Node>, ancestor_id: &str, id: &str) -> bool {
    find_node(root, ancestor_id).is_some_and(|ancestor| find_node(ancestor, id).is_some())
}

/// Child-index path from the root to `id`. Empty for the root itself.
fn path_to(root: &Node, id: &str) -> Option<Vec<usize>> {
    if root.id == *id {
        return Some(Vec::new());
    }
    // Each frame is (node, next child index to visit).
    let mut frames: Vec<(&Node, usize)> = vec![(root, 0)];
    let mut path: Vec<usize> = Vec::new();
    while let Some(frame) = frames.last_mut() {
        let node = frame.0;
        let index = frame.1;
        frame.1 += 1;
        if let Some(child) = node.children.get(index) {
            path.push(index);
            if child.id == *id {
                return Some(path);
            }
            frames.push((child.as_ref(), 0));
        } else {
            frames.pop();
            path.pop();
        }
    }
    None
}

/// Rebuild the ancestors along `path`, installing `replacement` at its end.
fn rebuild_path(root: &Arc<Node>, path: &[usize], replacement: Arc<Node>) -> Arc<Node> {
    let mut ancestors: Vec<&Arc<Node>> = Vec::with_capacity(path.len());
    let mut current = root;
    for &index in path {
        ancestors.push(current);
        current = &current.children[index];
    }
    let mut rebuilt = replacement;
    for (ancestor, &index) in ancestors.iter().zip(path).rev() {
        let mut copy = Node::clone(ancestor);
        copy.children[index] = rebuilt;
        rebuilt = Arc::new(copy);
    }
    rebuilt
}

/// Locate `id`, let `edit` produce a replacement, and splice it in.
///
/// `edit` returning `None` leaves the tree untouched.
fn edit_at(
    root: &Arc<Node>,
    id: &str,
    edit: impl FnOnce(&Arc<Node>) -> Option<Node>,
) -> Arc<Node> {
    let Some(path) = path_to(root, id) else {
        return Arc::clone(root);
    };
    let target = node_at(root, &path);
    match edit(target) {
        Some(replacement) => rebuild_path(root, &path, Arc::new(replacement)),
        None => Arc::clone(root),
    }
}

fn node_at<'a>(root: &'a Arc<Node>, path: &[usize]) -> &'a Arc<Node> {
    let mut current = root;
    for &index in path {
        current = &current.children[index];
    }
    current
}

fn collect_ids(root: &Node) -> HashSet<&str> {
    root.iter().map(|(n, _)| n.id.as_str()).collect()
}

/// True when any id of `incoming` already exists in `root`.
fn collides(root: &Node, incoming: &Node) -> bool {
    let existing = collect_ids(root);
    let mut seen = HashSet::new();
    incoming
        .iter()
        .any(|(n, _)| existing.contains(n.id.as_str()) || !seen.insert(n.id.as_str()))
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

/// Shallow-copy the node with `id` and apply `mutator` to the copy.
///
/// Returns `root` itself when `id` is not found. The mutator must not change
/// the node's id.
pub fn update_node(root: &Arc<Node>, id: &str, mutator: impl FnOnce(&mut Node)) -> Arc<Node> {
    edit_at(root, id, |target| {
        let mut copy = Node::clone(target);
        mutator(&mut copy);
        debug_assert!(copy.id == *id, "update_node mutator changed the node id");
        Some(copy)
    })
}

/// Remove the subtree rooted at `id`.
///
/// Returns `None` when `id` is the root (deleting the root is not allowed;
/// callers must guard). Returns `root` itself when `id` is unknown.
#[must_use]
pub fn delete_subtree(root: &Arc<Node>, id: &str) -> Option<Arc<Node>> {
    if root.id == *id {
        return None;
    }
    let Some(mut path) = path_to(root, id) else {
        return Some(Arc::clone(root));
    };
    let index = path.pop()?;
    let parent = node_at(root, &path);
    let mut copy = Node::clone(parent);
    copy.children.remove(index);
    Some(rebuild_path(root, &path, Arc::new(copy)))
}

/// Append `new_node` to the children of `parent_id` and expand the parent.
///
/// No-op when the parent is unknown or any id in `new_node` already exists.
pub fn add_child_node(root: &Arc<Node>, parent_id: &str, new_node: Node) -> Arc<Node> {
    if collides(root, &new_node) {
        return Arc::clone(root);
    }
    edit_at(root, parent_id, |parent| {
        let mut copy = Node::clone(parent);
        copy.children.push(Arc::new(new_node));
        copy.collapsed = false;
        Some(copy)
    })
}

/// Insert `new_node` directly after `node_id` in its parent's children.
///
/// No-op for the root (it has no siblings), an unknown id, or a colliding id.
pub fn add_sibling_node(root: &Arc<Node>, node_id: &str, new_node: Node) -> Arc<Node> {
    if root.id == *node_id || collides(root, &new_node) {
        return Arc::clone(root);
    }
    let Some(mut path) = path_to(root, node_id) else {
        return Arc::clone(root);
    };
    let Some(index) = path.pop() else {
        return Arc::clone(root);
    };
    let parent = node_at(root, &path);
    let mut copy = Node::clone(parent);
    copy.children.insert(index + 1, Arc::new(new_node));
    rebuild_path(root, &path, Arc::new(copy))
}

/// Re-parent the subtree at `node_id` under `target_parent_id`.
///
/// The subtree is inserted at `target_index`, or appended when the index is
/// omitted or past the end. The moved subtree itself is shared, not copied.
/// A collapsed target is expanded so the moved node stays visible.
///
/// Rejected (returns `root`) when:
/// - `node_id` is the root,
/// - `node_id == target_parent_id`,
/// - the target lies inside the moved subtree (cycle guard),
/// - either id is unknown,
/// - the node would end up exactly where it already is.
pub fn move_node(
    root: &Arc<Node>,
    node_id: &str,
    target_parent_id: &str,
    target_index: Option<usize>,
) -> Arc<Node> {
    if root.id == *node_id || node_id == target_parent_id {
        return Arc::clone(root);
    }
    let Some(mut node_path) = path_to(root, node_id) else {
        return Arc::clone(root);
    };
    let moving = Arc::clone(node_at(root, &node_path));
    if find_node(&moving, target_parent_id).is_some() {
        return Arc::clone(root);
    }
    let Some(current_index) = node_path.pop() else {
        return Arc::clone(root);
    };
    let current_parent = node_at(root, &node_path);
    let Some(target) = find_node(root, target_parent_id) else {
        return Arc::clone(root);
    };

    let same_parent = Arc::ptr_eq(current_parent, target);
    let len_after_removal = if same_parent {
        target.children.len() - 1
    } else {
        target.children.len()
    };
    let final_index = target_index
        .filter(|&i| i <= len_after_removal)
        .unwrap_or(len_after_removal);
    if same_parent && final_index == current_index {
        return Arc::clone(root);
    }

    let Some(without) = delete_subtree(root, node_id) else {
        return Arc::clone(root);
    };
    edit_at(&without, target_parent_id, |target| {
        let mut copy = Node::clone(target);
        copy.children.insert(final_index, moving);
        copy.collapsed = false;
        Some(copy)
    })
}

/// Replace the text of `id`. No-op when the text is unchanged.
pub fn set_text(root: &Arc<Node>, id: &str, text: &str) -> Arc<Node> {
    edit_at(root, id, |target| {
        (target.text != text).then(|| {
            let mut copy = Node::clone(target);
            copy.text = text.to_owned();
            copy
        })
    })
}

/// Set the collapsed flag. No-op when it already has that value.
pub fn set_collapsed(root: &Arc<Node>, id: &str, collapsed: bool) -> Arc<Node> {
    edit_at(root, id, |target| {
        (target.collapsed != collapsed).then(|| {
            let mut copy = Node::clone(target);
            copy.collapsed = collapsed;
            copy
        })
    })
}

/// Flip the collapsed flag of `id`.
pub fn toggle_collapsed(root: &Arc<Node>, id: &str) -> Arc<Node> {
    update_node(root, id, |node| node.collapsed = !node.collapsed)
}

/// Deep-copy `node` giving every copied node a fresh id from `ids`.
///
/// `taken` lists ids the copies must avoid (normally every id of the tree
/// the clone will be inserted into).
#[must_use]
pub fn clone_subtree(node: &Node, ids: &mut IdGenerator, taken: &HashSet<&str>) -> Node {
    let children = node
        .children
        .iter()
        .map(|child| Arc::new(clone_subtree(child, ids, taken)))
        .collect();
    Node {
        id: ids.next_unused(taken),
        text: node.text.clone(),
        children,
        collapsed: node.collapsed,
        style: node.style.clone(),
    }
}

/// Insert a fresh-id copy of `id`'s subtree directly after it.
///
/// No-op for the root or an unknown id.
pub fn duplicate_subtree(root: &Arc<Node>, id: &str, ids: &mut IdGenerator) -> Arc<Node> {
    if root.id == *id {
        return Arc::clone(root);
    }
    let Some(source) = find_node(root, id) else {
        return Arc::clone(root);
    };
    let copy = {
        let taken = collect_ids(root);
        clone_subtree(source, ids, &taken)
    };
    add_sibling_node(root, id, copy)
}

/// Ids of the path from the root down to `id` (inclusive).
#[must_use]
pub fn ancestor_ids(root: &Arc<Node>, id: &str) -> Option<Vec<NodeId>> {
    let path = path_to(root, id)?;
    let mut out = Vec::with_capacity(path.len() + 1);
    let mut current = root;
    out.push(current.id.clone());
    for index in path {
        current = &current.children[index];
        out.push(current.id.clone());
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// r -> [a -> [a1, a2], b]
    fn sample() -> Arc<Node> {
        Node::new("r", "Root")
            .child(
                Node::new("a", "A")
                    .child(Node::new("a1", "A1"))
                    .child(Node::new("a2", "A2")),
            )
            .child(Node::new("b", "B"))
            .into_arc()
    }

    fn child_ids(node: &Node) -> Vec<&str> {
        node.children().iter().map(|c| c.id().as_str()).collect()
    }

    #[test]
    fn find_node_and_parent() {
        let root = sample();
        assert_eq!(find_node(&root, "a2").unwrap().text(), "A2");
        assert!(find_node(&root, "zz").is_none());
        assert_eq!(find_parent(&root, "a2").unwrap().id(), "a");
        assert!(find_parent(&root, "r").is_none());
        assert!(find_parent(&root, "zz").is_none());
    }

    #[test]
    fn update_shares_untouched_subtrees() {
        let root = sample();
        let next = update_node(&root, "a1", |n| n.text = "changed".into());
        assert!(!Arc::ptr_eq(&root, &next));
        assert_eq!(find_node(&next, "a1").unwrap().text(), "changed");
        // Sibling subtree `b` is shared, edited path is copied.
        assert!(Arc::ptr_eq(&root.children()[1], &next.children()[1]));
        assert!(!Arc::ptr_eq(&root.children()[0], &next.children()[0]));
        assert!(Arc::ptr_eq(
            &root.children()[0].children()[1],
            &next.children()[0].children()[1]
        ));
    }

    #[test]
    fn update_unknown_id_returns_same_root() {
        let root = sample();
        let next = update_node(&root, "missing", |n| n.text = "x".into());
        assert!(Arc::ptr_eq(&root, &next));
    }

    #[test]
    fn delete_removes_subtree() {
        let root = sample();
        let next = delete_subtree(&root, "a").unwrap();
        assert_eq!(child_ids(&next), vec!["b"]);
        assert!(find_node(&next, "a1").is_none());
        assert_eq!(root.node_count(), 5);
        assert_eq!(next.node_count(), 2);
    }

    #[test]
    fn delete_root_returns_none_and_unknown_is_noop() {
        let root = sample();
        assert!(delete_subtree(&root, "r").is_none());
        let same = delete_subtree(&root, "zz").unwrap();
        assert!(Arc::ptr_eq(&root, &same));
    }

    #[test]
    fn add_child_appends_and_expands() {
        let root = Node::new("r", "Root").collapsed(true).into_arc();
        let one = add_child_node(&root, "r", Node::new("c1", "Child1"));
        let two = add_child_node(&one, "r", Node::new("c2", "Child2"));
        assert_eq!(child_ids(&two), vec!["c1", "c2"]);
        assert!(!two.is_collapsed());
    }

    #[test]
    fn add_child_rejects_duplicate_or_unknown_parent() {
        let root = sample();
        assert!(Arc::ptr_eq(
            &root,
            &add_child_node(&root, "a", Node::new("b", "dup"))
        ));
        assert!(Arc::ptr_eq(
            &root,
            &add_child_node(&root, "nope", Node::new("n", "N"))
        ));
    }

    #[test]
    fn add_sibling_inserts_after() {
        let root = sample();
        let next = add_sibling_node(&root, "a1", Node::new("s", "S"));
        assert_eq!(
            child_ids(find_node(&next, "a").unwrap()),
            vec!["a1", "s", "a2"]
        );
    }

    #[test]
    fn add_sibling_to_root_is_noop() {
        let root = sample();
        let next = add_sibling_node(&root, "r", Node::new("s", "S"));
        assert!(Arc::ptr_eq(&root, &next));
    }

    #[test]
    fn move_to_other_parent_with_index() {
        let root = sample();
        let next = move_node(&root, "b", "a", Some(1));
        assert_eq!(child_ids(&next), vec!["a"]);
        assert_eq!(
            child_ids(find_node(&next, "a").unwrap()),
            vec!["a1", "b", "a2"]
        );
    }

    #[test]
    fn move_shares_moved_subtree() {
        let root = sample();
        let a = Arc::clone(&root.children()[0]);
        let next = move_node(&root, "a", "b", None);
        let moved = find_node(&next, "a").unwrap();
        assert!(Arc::ptr_eq(&a, moved));
    }

    #[test]
    fn move_out_of_range_index_appends() {
        let root = sample();
        let next = move_node(&root, "a1", "b", Some(99));
        assert_eq!(child_ids(find_node(&next, "b").unwrap()), vec!["a1"]);
    }

    #[test]
    fn move_reorders_within_parent() {
        let root = sample();
        let next = move_node(&root, "a1", "a", Some(1));
        assert_eq!(child_ids(find_node(&next, "a").unwrap()), vec!["a2", "a1"]);
        let back = move_node(&next, "a1", "a", Some(0));
        assert_eq!(child_ids(find_node(&back, "a").unwrap()), vec!["a1", "a2"]);
    }

    #[test]
    fn move_to_current_position_is_noop() {
        let root = Node::new("r", "Root")
            .child(Node::new("a", "A").child(Node::new("b", "B")))
            .into_arc();
        assert!(Arc::ptr_eq(&root, &move_node(&root, "a", "r", None)));
        assert!(Arc::ptr_eq(&root, &move_node(&root, "a", "r", Some(0))));
    }

    #[test]
    fn move_rejects_cycles_root_and_self() {
        let root = Node::new("r", "Root")
            .child(Node::new("a", "A").child(Node::new("b", "B")))
            .into_arc();
        assert!(Arc::ptr_eq(&root, &move_node(&root, "r", "b", None)));
        assert!(Arc::ptr_eq(&root, &move_node(&root, "a", "b", None)));
        assert!(Arc::ptr_eq(&root, &move_node(&root, "a", "a", None)));
        assert!(Arc::ptr_eq(&root, &move_node(&root, "a", "zz", None)));
        assert!(Arc::ptr_eq(&root, &move_node(&root, "zz", "r", None)));
    }

    #[test]
    fn move_into_collapsed_target_expands_it() {
        let root = Node::new("r", "Root")
            .child(Node::new("a", "A").collapsed(true).child(Node::new("a1", "A1")))
            .child(Node::new("b", "B"))
            .into_arc();
        let next = move_node(&root, "b", "a", None);
        let a = find_node(&next, "a").unwrap();
        assert!(!a.is_collapsed());
        assert_eq!(child_ids(a), vec!["a1", "b"]);
    }

    #[test]
    fn set_text_same_value_is_noop() {
        let root = sample();
        assert!(Arc::ptr_eq(&root, &set_text(&root, "a", "A")));
        let next = set_text(&root, "a", "Alpha");
        assert_eq!(find_node(&next, "a").unwrap().text(), "Alpha");
    }

    #[test]
    fn collapse_helpers() {
        let root = sample();
        assert!(Arc::ptr_eq(&root, &set_collapsed(&root, "a", false)));
        let collapsed = set_collapsed(&root, "a", true);
        assert!(find_node(&collapsed, "a").unwrap().is_collapsed());
        let toggled = toggle_collapsed(&collapsed, "a");
        assert!(!find_node(&toggled, "a").unwrap().is_collapsed());
    }

    #[test]
    fn duplicate_subtree_uses_fresh_ids() {
        let root = sample();
        let mut ids = IdGenerator::new("n");
        let next = duplicate_subtree(&root, "a", &mut ids);
        assert_eq!(child_ids(&next).len(), 3);
        let copy = &next.children()[1];
        assert_ne!(copy.id(), "a");
        assert_eq!(copy.text(), "A");
        assert_eq!(copy.children().len(), 2);
        assert!(next.validate_ids().is_ok());
        assert!(Arc::ptr_eq(&root, &duplicate_subtree(&root, "r", &mut ids)));
    }

    #[test]
    fn subtree_contains_and_ancestors() {
        let root = sample();
        assert!(subtree_contains(&root, "a", "a2"));
        assert!(subtree_contains(&root, "a", "a"));
        assert!(!subtree_contains(&root, "a", "b"));
        let path = ancestor_ids(&root, "a2").unwrap();
        assert_eq!(path, vec![NodeId::new("r"), NodeId::new("a"), NodeId::new("a2")]);
        assert!(ancestor_ids(&root, "zz").is_none());
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let mut node = Node::new("n0", "leaf");
        for i in 1..2_000 {
            node = Node::new(format!("n{i}"), "x").child(node);
        }
        let root = node.into_arc();
        assert!(find_node(&root, "n0").is_some());
        let next = set_text(&root, "n0", "deep");
        assert_eq!(find_node(&next, "n0").unwrap().text(), "deep");
    }
}
