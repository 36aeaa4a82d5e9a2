//! Translation between winit types and engine types.

use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use winit::event::{MouseButton, MouseScrollDelta, TouchPhase};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::window::{CursorIcon, ImePurpose, Window};

use newengine_window::input::{Buttons, KeyName, Modifiers, PointerKind};
use newengine_window::ops::{CursorShape, InputHint};
use newengine_window::{Dp, Metric, NativeView, PointF, ViewKind};

/// Scroll distance of one wheel notch.
const LINE: Dp = Dp(20.0);

pub(crate) fn key_name(key: &Key) -> Option<KeyName> {
    let name = match key {
        Key::Character(s) => KeyName::Character(s.to_string()),
        Key::Named(n) => match n {
            NamedKey::Tab => KeyName::Tab,
            NamedKey::Enter => KeyName::Enter,
            NamedKey::Escape => KeyName::Escape,
            NamedKey::Space => KeyName::Space,
            NamedKey::Backspace => KeyName::Backspace,
            NamedKey::Delete => KeyName::Delete,
            NamedKey::Home => KeyName::Home,
            NamedKey::End => KeyName::End,
            NamedKey::PageUp => KeyName::PageUp,
            NamedKey::PageDown => KeyName::PageDown,
            NamedKey::ArrowUp => KeyName::Up,
            NamedKey::ArrowDown => KeyName::Down,
            NamedKey::ArrowLeft => KeyName::Left,
            NamedKey::ArrowRight => KeyName::Right,
            NamedKey::F1 => KeyName::Function(1),
            NamedKey::F2 => KeyName::Function(2),
            NamedKey::F3 => KeyName::Function(3),
            NamedKey::F4 => KeyName::Function(4),
            NamedKey::F5 => KeyName::Function(5),
            NamedKey::F6 => KeyName::Function(6),
            NamedKey::F7 => KeyName::Function(7),
            NamedKey::F8 => KeyName::Function(8),
            NamedKey::F9 => KeyName::Function(9),
            NamedKey::F10 => KeyName::Function(10),
            NamedKey::F11 => KeyName::Function(11),
            NamedKey::F12 => KeyName::Function(12),
            _ => return None,
        },
        _ => return None,
    };
    Some(name)
}

pub(crate) fn modifiers(state: ModifiersState) -> Modifiers {
    let mut m = Modifiers::empty();
    m.set(Modifiers::SHIFT, state.shift_key());
    m.set(Modifiers::CTRL, state.control_key());
    m.set(Modifiers::ALT, state.alt_key());
    m.set(Modifiers::SUPER, state.super_key());
    let command = if cfg!(target_os = "macos") {
        state.super_key()
    } else {
        state.control_key()
    };
    m.set(Modifiers::COMMAND, command);
    m
}

/// Text typed with these held is a shortcut, not input.
#[inline]
pub(crate) fn is_shortcut(m: Modifiers) -> bool {
    m.intersects(Modifiers::CTRL | Modifiers::SUPER)
}

/// Printable text carried by a key press.
pub(crate) fn typed_text(text: &str) -> Option<&str> {
    if text.is_empty() || text.chars().any(char::is_control) {
        return None;
    }
    Some(text)
}

pub(crate) fn button(b: MouseButton) -> Buttons {
    match b {
        MouseButton::Left => Buttons::PRIMARY,
        MouseButton::Right => Buttons::SECONDARY,
        MouseButton::Middle => Buttons::TERTIARY,
        _ => Buttons::empty(),
    }
}

/// Wheel deltas in pixels, positive when the content should move down or right.
pub(crate) fn scroll(delta: MouseScrollDelta, metric: &Metric) -> PointF {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => {
            let line = metric.dp(LINE) as f32;
            PointF::new(-x * line, -y * line)
        }
        MouseScrollDelta::PixelDelta(p) => PointF::new(-p.x as f32, -p.y as f32),
    }
}

pub(crate) fn touch_kind(phase: TouchPhase) -> PointerKind {
    match phase {
        TouchPhase::Started => PointerKind::Press,
        TouchPhase::Moved => PointerKind::Move,
        TouchPhase::Ended => PointerKind::Release,
        TouchPhase::Cancelled => PointerKind::Cancel,
    }
}

/// `None` hides the cursor.
pub(crate) fn cursor_icon(shape: CursorShape) -> Option<CursorIcon> {
    let icon = match shape {
        CursorShape::None => return None,
        CursorShape::Default => CursorIcon::Default,
        CursorShape::Text => CursorIcon::Text,
        CursorShape::Pointer => CursorIcon::Pointer,
        CursorShape::Crosshair => CursorIcon::Crosshair,
        CursorShape::Grab => CursorIcon::Grab,
        CursorShape::Grabbing => CursorIcon::Grabbing,
        CursorShape::Move => CursorIcon::Move,
        CursorShape::NotAllowed => CursorIcon::NotAllowed,
        CursorShape::Wait => CursorIcon::Wait,
        CursorShape::Progress => CursorIcon::Progress,
        CursorShape::ResizeNs => CursorIcon::NsResize,
        CursorShape::ResizeEw => CursorIcon::EwResize,
        CursorShape::ResizeNwse => CursorIcon::NwseResize,
        CursorShape::ResizeNesw => CursorIcon::NeswResize,
    };
    Some(icon)
}

#[inline]
pub(crate) fn ime_purpose(hint: InputHint) -> ImePurpose {
    match hint {
        InputHint::Password => ImePurpose::Password,
        _ => ImePurpose::Normal,
    }
}

pub(crate) fn native_view(window: &Window) -> Option<NativeView> {
    let raw = window.window_handle().ok()?.as_raw();
    let (kind, handle) = match raw {
        RawWindowHandle::Xlib(h) => (ViewKind::Xlib, h.window as usize),
        RawWindowHandle::Xcb(h) => (ViewKind::Xcb, h.window.get() as usize),
        RawWindowHandle::Wayland(h) => (ViewKind::Wayland, h.surface.as_ptr() as usize),
        RawWindowHandle::Win32(h) => (ViewKind::Win32, h.hwnd.get() as usize),
        RawWindowHandle::AppKit(h) => (ViewKind::AppKit, h.ns_view.as_ptr() as usize),
        RawWindowHandle::UiKit(h) => (ViewKind::UiKit, h.ui_view.as_ptr() as usize),
        RawWindowHandle::AndroidNdk(h) => (ViewKind::Android, h.a_native_window.as_ptr() as usize),
        RawWindowHandle::Web(h) => (ViewKind::Web, h.id as usize),
        _ => (ViewKind::Other, 0),
    };
    Some(NativeView { kind, handle })
}
