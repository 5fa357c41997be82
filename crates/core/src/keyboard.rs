//! Selection and keyboard controller.
//!
//! Translates discrete key events into [`TimelineEngine`] calls. Events
//! that originate inside a text field are ignored so typing a prompt never
//! deletes frames. Reserved shortcuts for actions that do not exist yet
//! (undo, redo, duplicate, select-all) are intercepted and reported as
//! [`KeyOutcome::NotImplemented`] instead of falling through to the host.

use crate::timeline::TimelineEngine;
use crate::types::FrameId;

// ---------------------------------------------------------------------------
// Input events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    ArrowUp,
    ArrowDown,
    Escape,
    Char(char),
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Where keyboard focus was when the key was pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Timeline,
    TextInput,
    TextArea,
    Select,
}

impl Focus {
    fn is_text_entry(self) -> bool {
        matches!(self, Self::TextInput | Self::TextArea | Self::Select)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    pub focus: Focus,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
            focus: Focus::Timeline,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn in_focus(mut self, focus: Focus) -> Self {
        self.focus = focus;
        self
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Shortcuts that are claimed but have no behavior yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedShortcut {
    Undo,
    Redo,
    Duplicate,
    SelectAll,
}

impl ReservedShortcut {
    fn from_event(event: &KeyEvent) -> Option<Self> {
        if !event.modifiers.command() {
            return None;
        }
        let Key::Char(c) = event.key else {
            return None;
        };
        match c.to_ascii_lowercase() {
            'z' if event.modifiers.shift => Some(Self::Redo),
            'z' => Some(Self::Undo),
            'd' => Some(Self::Duplicate),
            'a' => Some(Self::SelectAll),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Duplicate => "duplicate",
            Self::SelectAll => "select all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    RemovedFrame(FrameId),
    SelectedFrame(FrameId),
    ClearedSelection,
    /// Arrow at either end of the timeline: consumed, nothing changed.
    NoMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not ours: let the host handle it.
    Ignored,
    Handled {
        action: KeyAction,
        /// The host should suppress its native behavior for this key.
        prevent_default: bool,
    },
    NotImplemented(ReservedShortcut),
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct KeyboardController;

impl KeyboardController {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, engine: &mut TimelineEngine, event: &KeyEvent) -> KeyOutcome {
        if event.focus.is_text_entry() {
            return KeyOutcome::Ignored;
        }
        if let Some(shortcut) = ReservedShortcut::from_event(event) {
            return KeyOutcome::NotImplemented(shortcut);
        }

        match event.key {
            Key::Delete | Key::Backspace => Self::delete_selected(engine),
            Key::ArrowUp => Self::step(engine, Direction::Up),
            Key::ArrowDown => Self::step(engine, Direction::Down),
            Key::Escape => {
                engine.select_frame(None);
                handled(KeyAction::ClearedSelection)
            }
            Key::Char(_) | Key::Other => KeyOutcome::Ignored,
        }
    }

    fn delete_selected(engine: &mut TimelineEngine) -> KeyOutcome {
        let Some(frame) = engine.selected_frame() else {
            return KeyOutcome::Ignored;
        };
        if frame.is_placeholder() {
            return KeyOutcome::Ignored;
        }
        let id = frame.id;
        engine.remove_frame(id);
        handled(KeyAction::RemovedFrame(id))
    }

    /// Move the frame selection one slot among concrete frames. With nothing
    /// (or a non-concrete item) selected, `Down` lands on the first frame.
    fn step(engine: &mut TimelineEngine, direction: Direction) -> KeyOutcome {
        let frames = engine.concrete_frames();
        let current = engine
            .selection()
            .frame_id()
            .and_then(|id| frames.iter().position(|f| f.id == id));

        let next = match (direction, current) {
            (Direction::Up, Some(idx)) if idx > 0 => Some(idx - 1),
            (Direction::Down, Some(idx)) if idx + 1 < frames.len() => Some(idx + 1),
            (Direction::Down, None) if !frames.is_empty() => Some(0),
            _ => None,
        };

        let target = next.map(|idx| frames[idx].id);
        match target {
            Some(id) => {
                engine.select_frame(Some(id));
                handled(KeyAction::SelectedFrame(id))
            }
            None => handled(KeyAction::NoMove),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Up,
    Down,
}

fn handled(action: KeyAction) -> KeyOutcome {
    KeyOutcome::Handled {
        action,
        prevent_default: true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
