//! winit backend for `newengine-window`.
//!
//! The winit event loop owns the main thread. [`WinitPlatform`] is the
//! cross-thread handle clients hand to `Window::new`; [`run`] drives the loop
//! until the last window is gone.

mod app;
mod driver;
mod events;

pub use app::{run, WinitLoop, WinitPlatform};
