//! Window event loop and frame synchronization.
//!
//! A [`Window`] lives on the client thread and is driven by
//! [`Window::next_event`]. The native side runs on the platform thread and
//! feeds [`Callbacks`] with [`PlatformEvent`]s; the two meet over a set of
//! channels so that every frame is drawn by the client and consumed by the
//! platform in lock step.

pub mod anim;
pub mod config;
pub mod dispatch;
pub mod driver;
pub mod editor;
pub mod error;
pub mod event;
pub mod geom;
pub mod gpu;
pub mod input;
pub mod mailbox;
pub mod ops;
pub mod router;
pub mod semantic;
pub mod stage;
pub mod window;

pub use config::{ContextConfig, LoggingConfig, WindowConfig};
pub use driver::{Actions, Config, Driver, Platform, WindowMode, WindowOption, Waker};
pub use error::{GpuError, WindowError, WindowResult};
pub use event::{
    ConfigEvent, DestroyEvent, Event, FrameEvent, FrameRequest, NativeView, PlatformEvent,
    ViewEvent, ViewKind,
};
pub use geom::{Dp, Insets, Metric, Point, PointF, Rect, Rgba};
pub use gpu::{
    Backend, Context, ContextBackend, ContextLock, ContextRegistry, Device, DeviceFactory,
    GraphicsApi, NullDeviceFactory, RenderTarget, SurfaceSource,
};
pub use ops::{Op, Ops};
pub use stage::Stage;
pub use window::{Callbacks, Window, WindowHandle, WindowLink};
