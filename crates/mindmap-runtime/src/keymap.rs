#![forbid(unsafe_code)]

//! Keyboard shortcut resolution.
//!
//! Maps a key press to a [`Shortcut`] given the canvas state at the moment
//! of the press. Shortcuts only fire when a node is selected, nothing is
//! being edited, and keyboard focus is not in a text field; Escape is the
//! exception and always resolves so an edit or drag can be abandoned.
//!
//! | Key                              | Shortcut          |
//! |----------------------------------|-------------------|
//! | Enter                            | `AddSibling`      |
//! | Tab                              | `AddChild`        |
//! | Delete / Backspace               | `RequestDelete`   |
//! | Ctrl/Cmd+Z                       | `Undo`            |
//! | Ctrl/Cmd+Shift+Z, Ctrl/Cmd+Y     | `Redo`            |
//! | Escape                           | `Cancel`          |

use mindmap_core::event::{KeyCode, KeyEvent, KeyEventKind};

/// Canvas flags consulted when resolving a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyContext {
    /// A node is selected.
    pub has_selection: bool,
    /// A node's text is being edited.
    pub editing: bool,
    /// Keyboard focus is inside a host text field.
    pub text_input_focused: bool,
}

impl KeyContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            has_selection: false,
            editing: false,
            text_input_focused: false,
        }
    }

    #[must_use]
    pub const fn with_selection(mut self, selected: bool) -> Self {
        self.has_selection = selected;
        self
    }

    #[must_use]
    pub const fn with_editing(mut self, editing: bool) -> Self {
        self.editing = editing;
        self
    }

    #[must_use]
    pub const fn with_text_focus(mut self, focused: bool) -> Self {
        self.text_input_focused = focused;
        self
    }

    /// Whether editing shortcuts may fire.
    #[must_use]
    pub const fn shortcuts_enabled(&self) -> bool {
        self.has_selection && !self.editing && !self.text_input_focused
    }
}

/// Canvas-level command produced by a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shortcut {
    AddSibling,
    AddChild,
    /// Delete the selection once the user confirms.
    RequestDelete,
    Undo,
    Redo,
    /// Abandon the current edit or drag.
    Cancel,
}

/// Resolve `event` in `context`.
#[must_use]
pub fn resolve_shortcut(event: &KeyEvent, context: &KeyContext) -> Option<Shortcut> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    if event.code == KeyCode::Escape {
        return Some(Shortcut::Cancel);
    }
    if !context.shortcuts_enabled() {
        return None;
    }

    if event.command() {
        return match event.code {
            KeyCode::Char(c) => match c.to_ascii_lowercase() {
                'z' if event.shift() => Some(Shortcut::Redo),
                'z' => Some(Shortcut::Undo),
                'y' => Some(Shortcut::Redo),
                _ => None,
            },
            _ => None,
        };
    }

    match event.code {
        KeyCode::Enter => Some(Shortcut::AddSibling),
        KeyCode::Tab => Some(Shortcut::AddChild),
        KeyCode::Delete | KeyCode::Backspace => Some(Shortcut::RequestDelete),
        _ => None,
    }
}
