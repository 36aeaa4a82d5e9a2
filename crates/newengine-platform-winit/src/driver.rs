//! `Driver` implementation over a winit window.

use log::{debug, trace, warn};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event_loop::EventLoopProxy;
use winit::window::{Fullscreen, Window};

use newengine_window::editor::ImeState;
use newengine_window::input::InputEvent;
use newengine_window::ops::{CursorShape, InputHint};
use newengine_window::{
    Actions, Config, Context, ContextConfig, ContextRegistry, Driver, GpuError, Metric,
    PlatformEvent, Point, WindowMode, WindowOption, Waker,
};

use crate::app::UserEvent;
use crate::events;

pub(crate) type SharedProxy = Arc<Mutex<EventLoopProxy<UserEvent>>>;

pub(crate) struct WinitDriver {
    window: Window,
    proxy: SharedProxy,
    registry: ContextRegistry,
    context: ContextConfig,
    config: Config,
    animating: bool,
    /// The surface changed size since the last frame.
    resized: bool,
    clipboard: Option<(String, Vec<u8>)>,
    /// Events raised from driver calls, fed back once the current event is done.
    pending: VecDeque<PlatformEvent>,
}

impl WinitDriver {
    pub(crate) fn new(
        window: Window,
        proxy: SharedProxy,
        registry: ContextRegistry,
        context: ContextConfig,
    ) -> Self {
        let mut d = Self {
            window,
            proxy,
            registry,
            context,
            config: Config::default(),
            animating: false,
            resized: true,
            clipboard: None,
            pending: VecDeque::new(),
        };
        d.read_native_config();
        d
    }

    #[inline]
    pub(crate) fn window(&self) -> &Window {
        &self.window
    }

    #[inline]
    pub(crate) fn metric(&self) -> Metric {
        Metric::from_scale(self.window.scale_factor())
    }

    #[inline]
    pub(crate) fn is_animating(&self) -> bool {
        self.animating
    }

    #[inline]
    pub(crate) fn take_resized(&mut self) -> bool {
        std::mem::take(&mut self.resized)
    }

    #[inline]
    pub(crate) fn next_pending(&mut self) -> Option<PlatformEvent> {
        self.pending.pop_front()
    }

    /// Re-read what the window manager may have changed behind our back.
    pub(crate) fn surface_changed(&mut self) {
        self.resized = true;
        self.read_native_config();
        self.pending
            .push_back(PlatformEvent::Config(self.config.clone()));
        self.window.request_redraw();
    }

    pub(crate) fn set_focused(&mut self, focused: bool) {
        self.config.focused = focused;
    }

    fn read_native_config(&mut self) {
        let size = self.window.inner_size();
        self.config.size = Point::new(size.width as i32, size.height as i32);
        self.config.title = self.window.title();
        self.config.decorated = self.window.is_decorated();
        self.config.focused = self.window.has_focus();
        self.config.mode = if self.window.fullscreen().is_some() {
            WindowMode::Fullscreen
        } else if self.window.is_minimized() == Some(true) {
            WindowMode::Minimized
        } else if self.window.is_maximized() {
            WindowMode::Maximized
        } else {
            WindowMode::Windowed
        };
    }

    fn apply(&mut self, m: &Metric, o: &WindowOption) {
        let px = |w, h| PhysicalSize::new(m.dp(w).max(0) as u32, m.dp(h).max(0) as u32);
        match o {
            WindowOption::Title(t) => self.window.set_title(t),
            WindowOption::Size(w, h) => {
                let _ = self.window.request_inner_size(px(*w, *h));
            }
            WindowOption::MinSize(w, h) => {
                let s = px(*w, *h);
                self.window
                    .set_min_inner_size((s.width > 0 && s.height > 0).then_some(s));
            }
            WindowOption::MaxSize(w, h) => {
                let s = px(*w, *h);
                self.window
                    .set_max_inner_size((s.width > 0 && s.height > 0).then_some(s));
            }
            WindowOption::Mode(mode) => self.set_mode(*mode),
            WindowOption::Decorated(d) => self.window.set_decorations(*d),
            WindowOption::CustomRenderer(_) | WindowOption::DecorationHeight(_) => {}
        }
    }

    fn set_mode(&mut self, mode: WindowMode) {
        match mode {
            WindowMode::Windowed => {
                self.window.set_fullscreen(None);
                self.window.set_maximized(false);
                self.window.set_minimized(false);
            }
            WindowMode::Fullscreen => self
                .window
                .set_fullscreen(Some(Fullscreen::Borderless(None))),
            WindowMode::Minimized => self.window.set_minimized(true),
            WindowMode::Maximized => {
                self.window.set_fullscreen(None);
                self.window.set_maximized(true);
            }
        }
    }

    fn center(&self) {
        let Some(monitor) = self.window.current_monitor() else {
            return;
        };
        let (area, origin) = (monitor.size(), monitor.position());
        let size = self.window.outer_size();
        let x = origin.x + (area.width as i32 - size.width as i32) / 2;
        let y = origin.y + (area.height as i32 - size.height as i32) / 2;
        self.window.set_outer_position(PhysicalPosition::new(x, y));
    }
}

impl Driver for WinitDriver {
    fn set_animating(&mut self, anim: bool) {
        if anim != self.animating {
            trace!(target: "platform.winit", "animating={}", anim);
        }
        self.animating = anim;
        if anim {
            self.window.request_redraw();
        }
    }

    fn show_text_input(&mut self, show: bool) {
        self.window.set_ime_allowed(show);
    }

    fn set_input_hint(&mut self, hint: InputHint) {
        self.window.set_ime_purpose(events::ime_purpose(hint));
    }

    fn new_context(&mut self) -> Result<Box<dyn Context>, GpuError> {
        self.registry.create(&self.window, &self.context)
    }

    fn read_clipboard(&mut self) {
        // Window-local clipboard; winit has no system clipboard.
        if let Some((mime, data)) = self.clipboard.clone() {
            self.pending
                .push_back(PlatformEvent::Input(InputEvent::Clipboard { mime, data }));
        }
    }

    fn write_clipboard(&mut self, mime: &str, data: &[u8]) {
        self.clipboard = Some((mime.to_string(), data.to_vec()));
    }

    fn configure(&mut self, options: Vec<WindowOption>) {
        let m = self.metric();
        for o in &options {
            self.apply(&m, o);
            o.apply(&m, &mut self.config);
        }
        self.read_native_config();
        debug!(
            target: "platform.winit",
            "configure options={} size={}x{} mode={:?}",
            options.len(),
            self.config.size.x,
            self.config.size.y,
            self.config.mode
        );
        self.pending
            .push_back(PlatformEvent::Config(self.config.clone()));
    }

    fn set_cursor(&mut self, cursor: CursorShape) {
        match events::cursor_icon(cursor) {
            Some(icon) => {
                self.window.set_cursor_visible(true);
                self.window.set_cursor(icon);
            }
            None => self.window.set_cursor_visible(false),
        }
    }

    fn waker(&self) -> Waker {
        let proxy = self.proxy.clone();
        let id = self.window.id();
        Waker::new(move || {
            let _ = proxy.lock().send_event(UserEvent::Wakeup(id));
        })
    }

    fn perform(&mut self, actions: Actions) {
        if actions.contains(Actions::CLOSE) {
            self.pending.push_back(PlatformEvent::Destroy(None));
            return;
        }
        if actions.contains(Actions::MOVE) {
            if let Err(e) = self.window.drag_window() {
                warn!(target: "platform.winit", "drag_window failed: {}", e);
            }
        }
        if actions.contains(Actions::MINIMIZE) {
            self.set_mode(WindowMode::Minimized);
        }
        if actions.contains(Actions::MAXIMIZE) {
            self.set_mode(WindowMode::Maximized);
        }
        if actions.contains(Actions::UNMAXIMIZE) {
            self.set_mode(WindowMode::Windowed);
        }
        if actions.contains(Actions::FULLSCREEN) {
            self.set_mode(WindowMode::Fullscreen);
        }
        if actions.contains(Actions::CENTER) {
            self.center();
        }
        if actions.contains(Actions::RAISE) {
            self.window.focus_window();
        }
    }

    fn editor_state_changed(&mut self, old: &ImeState, new: &ImeState) {
        let (a, b) = (&old.editor.selection.caret, &new.editor.selection.caret);
        if a == b {
            return;
        }
        let height = (b.ascent + b.descent).max(1.0);
        self.window.set_ime_cursor_area(
            PhysicalPosition::new(b.pos.x as f64, (b.pos.y - b.ascent) as f64),
            PhysicalSize::new(1.0, height as f64),
        );
    }

    fn frame_buffer_size(&self) -> Point {
        let s = self.window.inner_size();
        Point::new(s.width as i32, s.height as i32)
    }
}
