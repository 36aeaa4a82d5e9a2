//! Events seen by the client and events fed in by the platform.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::driver::Config;
use crate::error::WindowError;
use crate::geom::{Insets, Metric, Point};
use crate::input::InputEvent;
use crate::ops::Ops;
use crate::router::{FocusDirection, InputSource};
use crate::stage::Stage;
use crate::window::fabric::Fabric;

/// What `Window::next_event` returns.
#[derive(Debug)]
pub enum Event {
    Frame(FrameEvent),
    Stage(Stage),
    Config(ConfigEvent),
    View(ViewEvent),
    /// Always the last event of a window.
    Destroy(DestroyEvent),
}

/// A frame is wanted. Draw into an [`Ops`] and hand it over with
/// [`FrameEvent::frame`]; dropping the event skips the frame.
pub struct FrameEvent {
    pub now: Instant,
    pub metric: Metric,
    /// Area available to the client, decorations excluded.
    pub size: Point,
    pub insets: Insets,
    pub source: InputSource,
    pub(crate) sink: Arc<Fabric>,
}

impl FrameEvent {
    /// Submit `ops` and block until the window is done reading them. The
    /// buffer comes back in `ops`, ready for reuse.
    pub fn frame(self, ops: &mut Ops) {
        self.sink.submit_frame(ops);
    }
}

impl fmt::Debug for FrameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameEvent")
            .field("now", &self.now)
            .field("metric", &self.metric)
            .field("size", &self.size)
            .field("insets", &self.insets)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct DestroyEvent {
    /// Set when the window died of an error instead of being closed.
    pub err: Option<WindowError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEvent {
    pub config: Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Xlib,
    Xcb,
    Wayland,
    Win32,
    AppKit,
    UiKit,
    Android,
    Web,
    Other,
}

/// Raw native view, for clients that embed their own renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeView {
    pub kind: ViewKind,
    pub handle: usize,
}

/// The native view was attached (`Some`) or is about to go away (`None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewEvent {
    pub view: Option<NativeView>,
}

/// Frame request from the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRequest {
    pub now: Instant,
    pub metric: Metric,
    /// Full framebuffer size in pixels.
    pub size: Point,
    pub insets: Insets,
    /// The surface changed since the last frame; refresh the context first.
    pub sync: bool,
}

/// Everything a platform backend feeds into `Callbacks::event`.
#[derive(Debug)]
pub enum PlatformEvent {
    Frame(FrameRequest),
    Stage(Stage),
    Config(Config),
    View(ViewEvent),
    /// The native window is gone, with the error that killed it if any.
    Destroy(Option<WindowError>),
    /// The client asked for attention through the driver's waker.
    Wakeup,
    Input(InputEvent),
    /// Draw as soon as possible.
    Redraw,
    /// Move keyboard focus, e.g. on behalf of an accessibility service.
    MoveFocus(FocusDirection),
}
