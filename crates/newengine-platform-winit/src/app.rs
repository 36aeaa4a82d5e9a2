use crossbeam_channel::{bounded, Sender};
use log::{debug, error, info, trace};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, Ime, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{WindowAttributes, WindowId},
};

use newengine_window::editor::TextRange;
use newengine_window::input::{
    Buttons, InputEvent, KeyEvent, KeyState, Modifiers, PointerEvent, PointerKind,
};
use newengine_window::{
    Callbacks, ContextRegistry, Driver, FrameRequest, Insets, Platform, PlatformEvent, PointF,
    Stage, ViewEvent, WindowError, WindowLink, WindowOption, WindowResult,
};

use crate::driver::{SharedProxy, WinitDriver};
use crate::events;

pub(crate) enum UserEvent {
    Create {
        link: WindowLink,
        options: Vec<WindowOption>,
        reply: Sender<WindowResult<()>>,
    },
    Wakeup(WindowId),
}

/// Creates windows on the winit loop from any thread.
pub struct WinitPlatform {
    proxy: SharedProxy,
}

impl Platform for WinitPlatform {
    /// Blocks until the loop has created (or failed to create) the window.
    fn new_window(&self, link: WindowLink, options: Vec<WindowOption>) -> WindowResult<()> {
        let (reply, rx) = bounded(1);
        self.proxy
            .lock()
            .send_event(UserEvent::Create {
                link,
                options,
                reply,
            })
            .map_err(|_| WindowError::Closed)?;
        rx.recv().map_err(|_| WindowError::Closed)?
    }
}

#[derive(Default)]
struct PointerState {
    position: PointF,
    buttons: Buttons,
    modifiers: Modifiers,
}

impl PointerState {
    fn event(&self, kind: PointerKind) -> PointerEvent {
        PointerEvent {
            buttons: self.buttons,
            modifiers: self.modifiers,
            ..PointerEvent::new(kind, self.position)
        }
    }
}

struct NativeWindow {
    callbacks: Callbacks,
    driver: WinitDriver,
    pointer: PointerState,
}

impl NativeWindow {
    fn event(&mut self, e: PlatformEvent) {
        self.callbacks.event(&mut self.driver, e);
        self.flush();
    }

    /// Feed back what driver calls raised.
    fn flush(&mut self) {
        while let Some(e) = self.driver.next_pending() {
            if self.callbacks.is_destroyed() {
                return;
            }
            self.callbacks.event(&mut self.driver, e);
        }
    }

    fn input(&mut self, e: InputEvent) {
        self.event(PlatformEvent::Input(e));
    }

    fn pointer(&mut self, kind: PointerKind) {
        let e = self.pointer.event(kind);
        self.input(InputEvent::Pointer(e));
    }

    fn frame(&mut self) {
        let size = self.driver.frame_buffer_size();
        if size.x == 0 || size.y == 0 {
            trace!(target: "platform.winit", "frame skipped: empty surface");
            return;
        }
        let req = FrameRequest {
            now: Instant::now(),
            metric: self.driver.metric(),
            size,
            insets: Insets::default(),
            sync: self.driver.take_resized(),
        };
        self.event(PlatformEvent::Frame(req));
    }

    fn typed(&mut self, text: &str) {
        if self.callbacks.is_destroyed() {
            return;
        }
        self.callbacks.editor_insert(&mut self.driver, text);
        self.flush();
    }

    fn ime(&mut self, ime: Ime) {
        match ime {
            Ime::Preedit(text, _) => {
                let st = self.callbacks.editor_state();
                let r = st
                    .compose
                    .unwrap_or(st.editor.selection.range)
                    .normalized();
                self.callbacks.editor_replace(&mut self.driver, r, &text);
                let region = (!text.is_empty())
                    .then(|| TextRange::new(r.start, r.start + text.chars().count()));
                self.callbacks.set_composing_region(region);
            }
            Ime::Commit(text) => {
                match self.callbacks.editor_state().compose {
                    Some(r) => self.callbacks.editor_replace(&mut self.driver, r, &text),
                    None => self.callbacks.editor_insert(&mut self.driver, &text),
                }
                self.callbacks.set_composing_region(None);
            }
            Ime::Enabled | Ime::Disabled => {}
        }
        self.flush();
    }
}

struct App {
    proxy: SharedProxy,
    registry: ContextRegistry,
    windows: HashMap<WindowId, NativeWindow>,
    /// Creation requests that arrived before the loop resumed.
    queued: Vec<(WindowLink, Vec<WindowOption>, Sender<WindowResult<()>>)>,
    resumed: bool,
    launched: bool,
}

impl App {
    fn new(proxy: SharedProxy, registry: ContextRegistry) -> Self {
        Self {
            proxy,
            registry,
            windows: HashMap::new(),
            queued: Vec::new(),
            resumed: false,
            launched: false,
        }
    }

    fn create(&mut self, el: &ActiveEventLoop, link: WindowLink) -> WindowResult<NativeWindow> {
        let cfg = link.config().clone();
        let attrs = WindowAttributes::default()
            .with_title(cfg.title.clone())
            .with_inner_size(LogicalSize::new(cfg.width as f64, cfg.height as f64))
            .with_decorations(cfg.decorated);
        let window = el
            .create_window(attrs)
            .map_err(|e| WindowError::platform(anyhow::anyhow!("create window: {}", e)))?;
        info!(
            target: "platform.winit",
            "window.create id={:?} title='{}'",
            window.id(),
            cfg.title
        );

        let driver = WinitDriver::new(
            window,
            self.proxy.clone(),
            self.registry.clone(),
            cfg.context.clone(),
        );
        let callbacks = Callbacks::new(link);
        callbacks.set_driver(Some(driver.waker()));
        Ok(NativeWindow {
            callbacks,
            driver,
            pointer: PointerState::default(),
        })
    }

    fn open(
        &mut self,
        el: &ActiveEventLoop,
        link: WindowLink,
        options: Vec<WindowOption>,
        reply: Sender<WindowResult<()>>,
    ) {
        let mut nw = match self.create(el, link) {
            Ok(nw) => nw,
            Err(e) => {
                error!(target: "platform.winit", "window.create failed: {}", e);
                let _ = reply.send(Err(e));
                return;
            }
        };
        // The client must be released before any event is delivered to it.
        let _ = reply.send(Ok(()));
        self.launched = true;

        nw.driver.configure(options);
        nw.flush();
        let view = events::native_view(nw.driver.window());
        nw.event(PlatformEvent::View(ViewEvent { view }));
        let stage = if nw.driver.window().has_focus() {
            Stage::Running
        } else {
            Stage::Inactive
        };
        nw.event(PlatformEvent::Stage(stage));
        nw.driver.window().request_redraw();
        self.windows.insert(nw.driver.window().id(), nw);
    }

    fn close(&mut self, id: WindowId) {
        if let Some(mut nw) = self.windows.remove(&id) {
            if !nw.callbacks.is_destroyed() {
                nw.event(PlatformEvent::View(ViewEvent { view: None }));
                nw.event(PlatformEvent::Destroy(None));
            }
            nw.callbacks.set_driver(None);
            info!(target: "platform.winit", "window.close id={:?}", id);
        }
    }

    /// Drop windows the engine tore down; leave once none remain.
    fn reap(&mut self, el: &ActiveEventLoop) {
        let gone: Vec<WindowId> = self
            .windows
            .iter()
            .filter(|(_, nw)| nw.callbacks.is_destroyed())
            .map(|(id, _)| *id)
            .collect();
        for id in gone {
            self.close(id);
        }
        if self.launched && self.windows.is_empty() {
            debug!(target: "platform.winit", "last window closed, exiting");
            el.exit();
        }
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, el: &ActiveEventLoop) {
        self.resumed = true;
        for (link, options, reply) in std::mem::take(&mut self.queued) {
            self.open(el, link, options, reply);
        }
        for nw in self.windows.values_mut() {
            nw.event(PlatformEvent::Stage(Stage::Running));
            nw.driver.window().request_redraw();
        }
    }

    fn suspended(&mut self, el: &ActiveEventLoop) {
        for nw in self.windows.values_mut() {
            nw.event(PlatformEvent::Stage(Stage::Paused));
        }
        self.reap(el);
    }

    fn user_event(&mut self, el: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::Create {
                link,
                options,
                reply,
            } => {
                if self.resumed {
                    self.open(el, link, options, reply);
                } else {
                    self.queued.push((link, options, reply));
                }
            }
            UserEvent::Wakeup(id) => {
                if let Some(nw) = self.windows.get_mut(&id) {
                    nw.event(PlatformEvent::Wakeup);
                }
            }
        }
        self.reap(el);
    }

    fn window_event(&mut self, el: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if matches!(event, WindowEvent::CloseRequested | WindowEvent::Destroyed) {
            self.close(id);
            self.reap(el);
            return;
        }
        let Some(nw) = self.windows.get_mut(&id) else {
            return;
        };

        match event {
            WindowEvent::RedrawRequested => nw.frame(),
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                nw.driver.surface_changed();
                nw.flush();
            }
            WindowEvent::Focused(focused) => {
                nw.driver.set_focused(focused);
                let stage = if focused { Stage::Running } else { Stage::Inactive };
                nw.event(PlatformEvent::Stage(stage));
                nw.input(InputEvent::Focus(focused));
            }
            WindowEvent::Occluded(hidden) => {
                let stage = if hidden { Stage::Paused } else { Stage::Running };
                nw.event(PlatformEvent::Stage(stage));
            }
            WindowEvent::ModifiersChanged(m) => {
                nw.pointer.modifiers = events::modifiers(m.state());
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let Some(name) = events::key_name(&event.logical_key) else {
                    return;
                };
                let state = match event.state {
                    ElementState::Pressed => KeyState::Press,
                    ElementState::Released => KeyState::Release,
                };
                let modifiers = nw.pointer.modifiers;
                nw.input(InputEvent::Key(KeyEvent {
                    name,
                    modifiers,
                    state,
                }));
                if state == KeyState::Press && !events::is_shortcut(modifiers) {
                    if let Some(text) = event.text.as_deref().and_then(events::typed_text) {
                        nw.typed(text);
                    }
                }
            }
            WindowEvent::Ime(ime) => nw.ime(ime),
            WindowEvent::CursorMoved { position, .. } => {
                nw.pointer.position = PointF::new(position.x as f32, position.y as f32);
                nw.pointer(PointerKind::Move);
            }
            WindowEvent::CursorLeft { .. } => nw.pointer(PointerKind::Leave),
            WindowEvent::MouseInput { state, button, .. } => {
                let b = events::button(button);
                let kind = match state {
                    ElementState::Pressed => {
                        nw.pointer.buttons.insert(b);
                        PointerKind::Press
                    }
                    ElementState::Released => {
                        nw.pointer.buttons.remove(b);
                        PointerKind::Release
                    }
                };
                nw.pointer(kind);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let mut e = nw.pointer.event(PointerKind::Scroll);
                e.scroll = events::scroll(delta, &nw.driver.metric());
                nw.input(InputEvent::Pointer(e));
            }
            WindowEvent::Touch(t) => {
                nw.pointer.position = PointF::new(t.location.x as f32, t.location.y as f32);
                let mut e = nw.pointer.event(events::touch_kind(t.phase));
                e.buttons = Buttons::PRIMARY;
                nw.input(InputEvent::Pointer(e));
            }
            _ => {}
        }
        self.reap(el);
    }

    fn about_to_wait(&mut self, _el: &ActiveEventLoop) {
        for nw in self.windows.values() {
            if nw.driver.is_animating() {
                nw.driver.window().request_redraw();
            }
        }
    }
}

/// The winit event loop with its window factory.
///
/// Build it on the main thread, hand [`WinitLoop::platform`] to the client
/// threads, then [`run`] it.
pub struct WinitLoop {
    event_loop: EventLoop<UserEvent>,
    proxy: SharedProxy,
    registry: ContextRegistry,
}

impl WinitLoop {
    pub fn new(registry: ContextRegistry) -> anyhow::Result<Self> {
        let event_loop = EventLoop::<UserEvent>::with_user_event()
            .build()
            .map_err(|e| anyhow::anyhow!("event loop: {}", e))?;
        let proxy = Arc::new(Mutex::new(event_loop.create_proxy()));
        Ok(Self {
            event_loop,
            proxy,
            registry,
        })
    }

    pub fn platform(&self) -> Arc<WinitPlatform> {
        Arc::new(WinitPlatform {
            proxy: self.proxy.clone(),
        })
    }
}

/// Run the loop until every window is closed.
pub fn run(host: WinitLoop) -> anyhow::Result<()> {
    let WinitLoop {
        event_loop,
        proxy,
        registry,
    } = host;
    let mut app = App::new(proxy, registry);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow::anyhow!("event loop: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_events_carry_held_state() {
        let p = PointerState {
            position: PointF::new(3.0, 4.0),
            buttons: Buttons::PRIMARY,
            modifiers: Modifiers::SHIFT,
        };
        let e = p.event(PointerKind::Move);
        assert_eq!(e.kind, PointerKind::Move);
        assert_eq!(e.position, PointF::new(3.0, 4.0));
        assert_eq!(e.buttons, Buttons::PRIMARY);
        assert_eq!(e.modifiers, Modifiers::SHIFT);
        assert_eq!(e.scroll, PointF::default());
    }
}
