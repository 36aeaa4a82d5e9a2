//! Boundary between the window engine and a platform backend.

use bitflags::bitflags;
use std::fmt;
use std::sync::Arc;

use crate::editor::ImeState;
use crate::error::{GpuError, WindowResult};
use crate::geom::{Dp, Metric, Point};
use crate::gpu::Context;
use crate::ops::{CursorShape, InputHint};
use crate::window::WindowLink;

bitflags! {
    /// Window manager actions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Actions: u32 {
        const MINIMIZE   = 1 << 0;
        const MAXIMIZE   = 1 << 1;
        const UNMAXIMIZE = 1 << 2;
        const FULLSCREEN = 1 << 3;
        const RAISE      = 1 << 4;
        const CENTER     = 1 << 5;
        const CLOSE      = 1 << 6;
        /// Start an interactive move (title bar drag).
        const MOVE       = 1 << 7;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WindowMode {
    #[default]
    Windowed,
    Fullscreen,
    Minimized,
    Maximized,
}

/// Window configuration as reported by the platform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub title: String,
    pub size: Point,
    pub min_size: Point,
    pub max_size: Point,
    pub mode: WindowMode,
    /// The platform draws decorations.
    pub decorated: bool,
    pub custom_renderer: bool,
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WindowOption {
    Title(String),
    Size(Dp, Dp),
    MinSize(Dp, Dp),
    MaxSize(Dp, Dp),
    Mode(WindowMode),
    Decorated(bool),
    CustomRenderer(bool),
    /// Height of engine-drawn decorations; zero when the engine draws none.
    DecorationHeight(Dp),
}

impl WindowOption {
    pub fn apply(&self, m: &Metric, cnf: &mut Config) {
        match self {
            WindowOption::Title(t) => cnf.title = t.clone(),
            WindowOption::Size(w, h) => cnf.size = Point::new(m.dp(*w), m.dp(*h)),
            WindowOption::MinSize(w, h) => cnf.min_size = Point::new(m.dp(*w), m.dp(*h)),
            WindowOption::MaxSize(w, h) => cnf.max_size = Point::new(m.dp(*w), m.dp(*h)),
            WindowOption::Mode(mode) => cnf.mode = *mode,
            WindowOption::Decorated(d) => cnf.decorated = *d,
            WindowOption::CustomRenderer(c) => cnf.custom_renderer = *c,
            WindowOption::DecorationHeight(_) => {}
        }
    }
}

/// Thread-safe handle that makes the native loop deliver a wakeup event.
#[derive(Clone)]
pub struct Waker(Arc<dyn Fn() + Send + Sync>);

impl Waker {
    #[inline]
    pub fn new(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn wake(&self) {
        (self.0)()
    }
}

impl fmt::Debug for Waker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Waker")
    }
}

/// Native window services used by the engine. Called on the platform thread only.
pub trait Driver {
    /// Deliver frames continuously while `true`.
    fn set_animating(&mut self, anim: bool);

    fn show_text_input(&mut self, show: bool);

    fn set_input_hint(&mut self, hint: InputHint);

    fn new_context(&mut self) -> Result<Box<dyn Context>, GpuError>;

    /// Answer later with a clipboard input event.
    fn read_clipboard(&mut self);

    fn write_clipboard(&mut self, mime: &str, data: &[u8]);

    fn configure(&mut self, options: Vec<WindowOption>);

    fn set_cursor(&mut self, cursor: CursorShape);

    /// Handle used from any thread to wake the native loop.
    fn waker(&self) -> Waker;

    fn perform(&mut self, actions: Actions);

    fn editor_state_changed(&mut self, old: &ImeState, new: &ImeState);

    fn frame_buffer_size(&self) -> Point;
}

/// Creates native windows. Called from the client thread on its first
/// `next_event`; the platform builds `Callbacks` from `link` on its own thread.
pub trait Platform: Send + Sync {
    fn new_window(&self, link: WindowLink, options: Vec<WindowOption>) -> WindowResult<()>;
}
