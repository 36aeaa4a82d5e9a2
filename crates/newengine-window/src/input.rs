use bitflags::bitflags;

use crate::editor::TextRange;
use crate::geom::{Point, PointF};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT   = 1 << 0;
        const CTRL    = 1 << 1;
        const ALT     = 1 << 2;
        const SUPER   = 1 << 3;
        const COMMAND = 1 << 4;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyName {
    Tab,
    Enter,
    Escape,
    Space,
    Backspace,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    Function(u8),
    Character(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyState {
    Press,
    Release,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub name: KeyName,
    pub modifiers: Modifiers,
    pub state: KeyState,
}

impl KeyEvent {
    #[inline]
    pub fn press(name: KeyName, modifiers: Modifiers) -> Self {
        Self {
            name,
            modifiers,
            state: KeyState::Press,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Press,
    Release,
    Move,
    Scroll,
    Leave,
    Cancel,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u8 {
        const PRIMARY   = 1 << 0;
        const SECONDARY = 1 << 1;
        const TERTIARY  = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub position: PointF,
    pub buttons: Buttons,
    pub scroll: PointF,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    #[inline]
    pub fn new(kind: PointerKind, position: PointF) -> Self {
        Self {
            kind,
            position,
            buttons: Buttons::empty(),
            scroll: PointF::default(),
            modifiers: Modifiers::empty(),
        }
    }
}

/// Input delivered to handlers through the router.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key(KeyEvent),
    Pointer(PointerEvent),
    /// Text committed by an input method.
    Edit { range: TextRange, text: String },
    Selection(TextRange),
    /// The platform wants the snippet to cover this range.
    Snippet(TextRange),
    /// Keyboard focus gained or lost.
    Focus(bool),
    /// Scroll request issued to reveal the focused area.
    Scroll(Point),
    Clipboard { mime: String, data: Vec<u8> },
}
