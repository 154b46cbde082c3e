#![forbid(unsafe_code)]

//! Actions a presentation layer reports back.
//!
//! The presentation layer never edits the tree or positions directly; every
//! gesture it recognizes goes through [`CanvasCallbacks`].

use mindmap_core::node::NodeId;
use mindmap_runtime::engine::MindMapEngine;

/// Gesture callbacks emitted by a canvas host.
pub trait CanvasCallbacks {
    /// Select a node, or clear the selection with `None`.
    fn on_select(&mut self, node_id: Option<NodeId>);

    fn on_toggle_collapse(&mut self, node_id: NodeId);

    /// Enter text editing for a node (usually a double click).
    fn on_start_edit(&mut self, node_id: NodeId);

    /// Commit edited text.
    fn on_finish_edit(&mut self, node_id: NodeId, text: &str);

    /// Leave text editing without committing.
    fn on_cancel_edit(&mut self) {}

    /// A node was pressed at a screen point; it becomes a drag once the
    /// pointer moves far enough.
    fn on_start_drag(&mut self, node_id: NodeId, screen_x: f64, screen_y: f64);

    /// Answer to a pending delete confirmation.
    fn on_confirm_delete(&mut self, _confirmed: bool) {}
}

impl CanvasCallbacks for MindMapEngine {
    fn on_select(&mut self, node_id: Option<NodeId>) {
        self.select(node_id);
    }

    fn on_toggle_collapse(&mut self, node_id: NodeId) {
        self.toggle_collapse(node_id);
    }

    fn on_start_edit(&mut self, node_id: NodeId) {
        self.start_edit(node_id);
    }

    fn on_finish_edit(&mut self, node_id: NodeId, text: &str) {
        self.finish_edit(node_id, text);
    }

    fn on_cancel_edit(&mut self) {
        self.cancel_edit();
    }

    fn on_start_drag(&mut self, node_id: NodeId, screen_x: f64, screen_y: f64) {
        self.start_drag(node_id, screen_x, screen_y);
    }

    fn on_confirm_delete(&mut self, confirmed: bool) {
        self.confirm_delete(confirmed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindmap_core::geometry::Size;
    use mindmap_core::node::Node;
    use mindmap_runtime::{EngineConfig, InteractionMode};

    fn engine() -> MindMapEngine {
        let root = Node::new("r", "Root").child(Node::new("a", "A")).into_arc();
        MindMapEngine::new(Some(root), Size::new(640.0, 480.0), EngineConfig::default())
    }

    #[test]
    fn trait_object_is_usable() {
        let mut e = engine();
        let callbacks: &mut dyn CanvasCallbacks = &mut e;
        callbacks.on_select(Some("a".into()));
        callbacks.on_select(None);
        assert!(e.view_state().selected.is_none());
    }

    #[test]
    fn edit_round_trip_through_callbacks() {
        let mut e = engine();
        e.on_start_edit("a".into());
        assert_eq!(e.view_state().mode, InteractionMode::EditingNode);
        e.on_finish_edit("a".into(), "Renamed");
        assert_eq!(e.view_state().mode, InteractionMode::Idle);
        let a = &e.root().unwrap().children()[0];
        assert_eq!(a.text(), "Renamed");

        e.on_start_edit("a".into());
        e.on_cancel_edit();
        assert!(e.view_state().editing.is_none());
    }

    #[test]
    fn toggle_and_select() {
        let mut e = engine();
        e.on_select(Some("a".into()));
        assert_eq!(e.view_state().selected.map(NodeId::as_str), Some("a"));
        e.on_toggle_collapse("r".into());
        assert!(e.root().unwrap().is_collapsed());
        // The selected node is now hidden but still in the tree.
        assert!(e.positions().get("a").is_some_and(|p| !p.visible));
    }

    #[test]
    fn confirm_delete_through_callbacks() {
        let mut e = engine();
        e.request_delete("a".into());
        e.on_confirm_delete(true);
        assert_eq!(e.root().unwrap().node_count(), 1);
    }
}
