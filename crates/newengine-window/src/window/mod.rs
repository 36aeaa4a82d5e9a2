//! The window: client handle, platform entry points and the channels between them.

mod callbacks;
mod decor;
mod engine;
pub(crate) mod fabric;

use crossbeam_channel::{at, bounded, never, select};
use log::{debug, error, info};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

use crate::config::WindowConfig;
use crate::driver::{Actions, Driver, Platform, WindowMode, WindowOption, Waker};
use crate::error::WindowError;
use crate::event::{DestroyEvent, Event};
use crate::geom::Dp;
use crate::gpu::DeviceFactory;
use crate::router::Router;

pub use callbacks::Callbacks;

use fabric::{DriverFn, Fabric, Outgoing};

/// Everything a platform needs to build [`Callbacks`] for a new window.
/// Moved to the platform thread by [`Platform::new_window`].
pub struct WindowLink {
    pub(crate) fabric: Arc<Fabric>,
    pub(crate) router: Arc<Mutex<Router>>,
    pub(crate) devices: Arc<dyn DeviceFactory>,
    pub(crate) config: Arc<WindowConfig>,
}

impl WindowLink {
    #[inline]
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }
}

/// Thread-safe handle for poking a window from outside its event loop.
#[derive(Clone)]
pub struct WindowHandle {
    fabric: Arc<Fabric>,
}

impl WindowHandle {
    /// Request a frame. Coalesces with pending requests.
    pub fn invalidate(&self) {
        if self.fabric.immediate_redraws.offer(()) {
            return;
        }
        if self.fabric.redraws.offer(()) {
            self.fabric.wakeup();
        }
    }

    /// Queue option changes; batches that pile up are merged in order.
    pub fn option(&self, opts: impl IntoIterator<Item = WindowOption>) {
        let opts: Vec<WindowOption> = opts.into_iter().collect();
        if opts.is_empty() {
            return;
        }
        let Some(opts) = self.fabric.extend_initial(opts) else {
            return;
        };
        let fab = &self.fabric;
        let merged = fab.options.merge(
            opts,
            || fab.is_destroyed(),
            |mut old, new| {
                old.extend(new);
                old
            },
        );
        if merged {
            fab.wakeup();
        }
    }

    /// Ask the window manager for `actions`. Mode changes travel as options.
    pub fn perform(&self, actions: Actions) {
        let mut rest = actions;
        let mut opts = Vec::new();
        for (action, mode) in [
            (Actions::MINIMIZE, WindowMode::Minimized),
            (Actions::MAXIMIZE, WindowMode::Maximized),
            (Actions::UNMAXIMIZE, WindowMode::Windowed),
            (Actions::FULLSCREEN, WindowMode::Fullscreen),
        ] {
            if rest.contains(action) {
                rest.remove(action);
                opts.push(WindowOption::Mode(mode));
            }
        }
        self.option(opts);
        if rest.is_empty() {
            return;
        }
        let fab = &self.fabric;
        if fab.actions.merge(rest, || fab.is_destroyed(), |a, b| a | b) {
            fab.wakeup();
        }
    }

    /// Run `f` with the driver on the platform thread and wait for it.
    /// Returns without running `f` if the window is destroyed.
    ///
    /// The platform has to be woken: call this while the window's own
    /// thread is inside `next_event` or a frame, or from a thread other
    /// than the one consuming events.
    pub fn driver_defer(&self, f: impl FnOnce(&mut dyn Driver) + Send + 'static) {
        let (done_tx, done_rx) = bounded::<()>(0);
        let wrapped: DriverFn = Box::new(move |d: &mut dyn Driver| {
            f(d);
            drop(done_tx);
        });
        if self
            .fabric
            .send_unless_closed(self.fabric.driver_funcs.sender(), wrapped)
            .is_err()
        {
            return;
        }
        self.fabric.wakeup();
        select! {
            recv(done_rx) -> _ => {}
            recv(self.fabric.destroy()) -> _ => {}
        }
    }

    /// Run `f` on the platform thread and wait for it.
    pub fn run(&self, f: impl FnOnce() + Send + 'static) {
        self.driver_defer(move |_| f());
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.fabric.is_destroyed()
    }
}

/// Per-window loop state of `next_event`.
#[derive(Default)]
struct Pump {
    created: bool,
    destroyed: bool,
    waker: Option<Waker>,
    deadline: Option<Instant>,
}

/// A native window seen from the client thread.
///
/// Nothing happens until the first [`Window::next_event`], which asks the
/// platform to create the native window.
pub struct Window {
    handle: WindowHandle,
    router: Arc<Mutex<Router>>,
    platform: Arc<dyn Platform>,
    devices: Arc<dyn DeviceFactory>,
    config: Arc<WindowConfig>,
    pump: Pump,
}

impl Window {
    pub fn new(
        platform: Arc<dyn Platform>,
        devices: Arc<dyn DeviceFactory>,
        config: WindowConfig,
    ) -> Self {
        let fabric = Arc::new(Fabric::new(initial_options(&config)));
        Self {
            handle: WindowHandle { fabric },
            router: Arc::new(Mutex::new(Router::new())),
            platform,
            devices,
            config: Arc::new(config),
            pump: Pump::default(),
        }
    }

    #[inline]
    pub fn handle(&self) -> WindowHandle {
        self.handle.clone()
    }

    #[inline]
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    #[inline]
    pub fn invalidate(&self) {
        self.handle.invalidate();
    }

    #[inline]
    pub fn option(&self, opts: impl IntoIterator<Item = WindowOption>) {
        self.handle.option(opts);
    }

    #[inline]
    pub fn perform(&self, actions: Actions) {
        self.handle.perform(actions);
    }

    /// Block for the next event. After `Event::Destroy` every call returns
    /// another `Destroy` without an error.
    pub fn next_event(&mut self) -> Event {
        if self.pump.destroyed {
            return Event::Destroy(DestroyEvent { err: None });
        }
        if !self.pump.created {
            self.pump.created = true;
            if let Err(err) = self.create() {
                error!(target: "window", "window.create failed: {}", err);
                self.handle.fabric.close_destroy();
                self.pump.destroyed = true;
                return Event::Destroy(DestroyEvent { err: Some(err) });
            }
        }

        let fab = self.handle.fabric.clone();
        let no_wakeups = never::<()>();
        loop {
            let wakeups = if self.pump.waker.is_some() {
                fab.wakeups.receiver()
            } else {
                &no_wakeups
            };
            let timer = self.pump.deadline.map_or_else(never, at);
            select! {
                recv(fab.scheduled_redraws.receiver()) -> t => {
                    if let Ok(t) = t {
                        self.pump.deadline = Some(t);
                    }
                }
                recv(fab.out.receiver()) -> msg => match msg {
                    Ok(Outgoing::Flush) => {}
                    Ok(Outgoing::Event(e)) => {
                        if matches!(e, Event::Destroy(_)) {
                            self.pump.destroyed = true;
                        }
                        return e;
                    }
                    Err(_) => {
                        self.pump.destroyed = true;
                        return Event::Destroy(DestroyEvent { err: Some(WindowError::Closed) });
                    }
                },
                recv(timer) -> _ => {
                    self.pump.deadline = None;
                    if fab.redraws.offer(()) {
                        if let Some(w) = &self.pump.waker {
                            w.wake();
                        }
                    }
                }
                recv(wakeups) -> _ => {
                    if let Some(w) = &self.pump.waker {
                        w.wake();
                    }
                }
                recv(fab.wakeup_funcs.receiver()) -> w => {
                    if let Ok(w) = w {
                        debug!(target: "window", "driver {}", if w.is_some() { "attached" } else { "detached" });
                        self.pump.waker = w;
                    }
                }
                recv(fab.destroy()) -> _ => {
                    self.pump.destroyed = true;
                    return Event::Destroy(DestroyEvent { err: None });
                }
            }
        }
    }

    fn create(&mut self) -> Result<(), WindowError> {
        let opts = self.handle.fabric.take_initial().unwrap_or_default();
        let link = WindowLink {
            fabric: self.handle.fabric.clone(),
            router: self.router.clone(),
            devices: self.devices.clone(),
            config: self.config.clone(),
        };
        self.platform.new_window(link, opts)?;
        info!(target: "window", "window.create title='{}'", self.config.title);
        Ok(())
    }
}

fn initial_options(cfg: &WindowConfig) -> Vec<WindowOption> {
    let mut opts = vec![
        WindowOption::Title(cfg.title.clone()),
        WindowOption::Size(Dp(cfg.width), Dp(cfg.height)),
        WindowOption::Decorated(cfg.decorated),
        WindowOption::DecorationHeight(if cfg.decorated {
            cfg.decoration_height()
        } else {
            Dp(0.0)
        }),
    ];
    if cfg.custom_renderer {
        opts.push(WindowOption::CustomRenderer(true));
    }
    opts
}
