//! Platform-side window state: stage, GPU resources and the frame handshake.

use crossbeam_channel::select;
use log::{debug, error, info, trace, warn};
use parking_lot::Mutex;
use std::cell::RefCell;
use std::sync::Arc;
use std::time::Instant;

use crate::anim::{Animation, FrameDeadline};
use crate::config::WindowConfig;
use crate::driver::{Config, Driver, WindowOption};
use crate::editor::ImeState;
use crate::error::{GpuError, WindowError, WindowResult};
use crate::event::{ConfigEvent, DestroyEvent, Event, FrameEvent, FrameRequest, PlatformEvent};
use crate::geom::{Dp, Metric, Point, Rect, Rgba};
use crate::gpu::{Context, ContextLock, Device, DeviceFactory};
use crate::input::{InputEvent, KeyEvent, KeyName, KeyState, Modifiers};
use crate::ops::{CursorShape, FrameContent, Ops};
use crate::router::{FocusDirection, InputSource, Router, TextInputState};
use crate::semantic::Semantics;
use crate::stage::Stage;

use super::decor::Decorations;
use super::fabric::Fabric;

/// Distance scrolled by an arrow key when focus can't move.
const SCROLL_STEP: Dp = Dp(50.0);

/// Callback-side state the engine touches between driver calls.
pub(crate) struct Side<'a> {
    pub semantic: &'a RefCell<Semantics>,
    pub ime: &'a RefCell<ImeState>,
}

enum Attempt {
    Presented(Result<(), GpuError>),
    Failed(GpuError),
}

pub(crate) struct WindowState {
    fabric: Arc<Fabric>,
    router: Arc<Mutex<Router>>,
    devices: Arc<dyn DeviceFactory>,

    ctx: Option<Box<dyn Context>>,
    device: Option<Box<dyn Device>>,
    /// The client renders on its own.
    no_context: bool,
    /// Refresh the context before the next frame.
    stale_surface: bool,

    stage: Stage,
    anim: Animation,
    viewport: Rect,
    metric: Metric,
    cursor: CursorShape,
    decor: Decorations,
    deco_ops: Ops,
    clear_color: Rgba,
    focus_arrows: bool,

    lost_in_a_row: u32,
    lost_warn_every: u32,
}

impl WindowState {
    pub fn new(
        fabric: Arc<Fabric>,
        router: Arc<Mutex<Router>>,
        devices: Arc<dyn DeviceFactory>,
        cfg: &WindowConfig,
    ) -> Self {
        Self {
            fabric,
            router,
            devices,
            ctx: None,
            device: None,
            no_context: cfg.custom_renderer,
            stale_surface: false,
            stage: Stage::Paused,
            anim: Animation::default(),
            viewport: Rect::default(),
            metric: Metric::default(),
            cursor: CursorShape::Default,
            decor: Decorations::new(cfg.decorated, cfg.decoration_height()),
            deco_ops: Ops::new(),
            clear_color: cfg.clear_color,
            focus_arrows: cfg.focus_arrows,
            lost_in_a_row: 0,
            lost_warn_every: cfg.context.device_lost_warn_every.max(1),
        }
    }

    /// Handle one platform event. Returns whether it was consumed.
    pub fn process_event(&mut self, d: &mut dyn Driver, e: PlatformEvent, side: &Side<'_>) -> bool {
        if self.fabric.is_destroyed() {
            trace!(target: "window", "event dropped after destroy: {:?}", e);
            return false;
        }
        match e {
            PlatformEvent::Stage(stage) => {
                if stage < Stage::Inactive {
                    self.destroy_gpu();
                }
                debug!(target: "window", "stage {} -> {}", self.stage, stage);
                self.stage = stage;
                self.update_animation(d);
                self.fabric.deliver(Event::Stage(stage));
                self.wait_ack(d);
            }
            PlatformEvent::Frame(req) => self.process_frame(d, req, side),
            PlatformEvent::Destroy(err) => {
                match &err {
                    Some(e) => error!(target: "window", "destroy cause='{}'", e),
                    None => info!(target: "window", "destroy"),
                }
                self.destroy_gpu();
                self.fabric.deliver(Event::Destroy(DestroyEvent { err }));
                self.fabric.close_destroy();
            }
            PlatformEvent::View(v) => {
                if v.view.is_none() {
                    // The surface goes with the view.
                    self.destroy_gpu();
                }
                debug!(target: "window", "view attached={}", v.view.is_some());
                self.fabric.deliver(Event::View(v));
                self.wait_ack(d);
            }
            PlatformEvent::Config(cnf) => {
                self.decor.config = cnf;
                let config = self.decor.effective_config(&self.metric);
                self.fabric.deliver(Event::Config(ConfigEvent { config }));
            }
            PlatformEvent::Wakeup => {}
            PlatformEvent::Input(ev) => return self.process_input(d, ev),
            PlatformEvent::Redraw => self.request_frame(d),
            PlatformEvent::MoveFocus(dir) => {
                self.move_focus(dir);
                self.request_frame(d);
            }
        }
        true
    }

    /// Run queued driver closures and honor pending redraws.
    pub fn update_state(&mut self, d: &mut dyn Driver) {
        let fab = self.fabric.clone();
        loop {
            select! {
                recv(fab.driver_funcs.receiver()) -> f => {
                    if let Ok(f) = f {
                        f(&mut *d);
                    }
                }
                recv(fab.redraws.receiver()) -> _ => self.request_frame(d),
                default => return,
            }
        }
    }

    /// Forward one batch of options and one batch of actions to the driver.
    pub fn apply_pending(&mut self, d: &mut dyn Driver) {
        if let Some(mut opts) = self.fabric.options.try_take() {
            let mut cnf = Config {
                decorated: self.decor.enabled,
                ..Config::default()
            };
            for o in &opts {
                o.apply(&self.metric, &mut cnf);
            }
            self.decor.enabled = cnf.decorated;
            opts.push(WindowOption::DecorationHeight(self.decor.option_height()));
            debug!(target: "window", "configure options={}", opts.len());
            d.configure(opts);
        }
        if let Some(actions) = self.fabric.actions.try_take() {
            debug!(target: "window", "perform actions={:?}", actions);
            d.perform(actions);
        }
    }

    pub fn request_frame(&mut self, d: &mut dyn Driver) {
        self.anim.set_next_frame(FrameDeadline::Immediate);
        self.update_animation(d);
    }

    pub fn update_animation(&mut self, d: &mut dyn Driver) {
        let step = self.anim.update(self.stage, Instant::now());
        if let Some(t) = step.schedule {
            self.fabric.scheduled_redraws.replace(t);
        }
        if let Some(animating) = step.animating_changed {
            d.set_animating(animating);
        }
    }

    fn process_frame(&mut self, d: &mut dyn Driver, req: FrameRequest, side: &Side<'_>) {
        if req.size == Point::ZERO {
            self.fail(WindowError::ZeroSizedFrame);
            return;
        }
        if !self.stage.is_visible() {
            trace!(target: "window.frame", "frame.skip stage={}", self.stage);
            return;
        }
        self.metric = req.metric;
        self.anim.clear();

        let viewport = Rect::new(
            req.insets.left,
            req.insets.top,
            req.size.x - req.insets.right,
            req.size.y - req.insets.bottom,
        );
        let (old, new) = (self.viewport.size(), viewport.size());
        self.viewport = viewport;
        if new.x < old.x || new.y < old.y {
            self.router.lock().reveal_focus(viewport);
        }

        let mut deco_ops = std::mem::take(&mut self.deco_ops);
        let (size, offset) = self.decor.layout(&self.metric, req.size, &mut deco_ops);
        self.fabric.deliver(Event::Frame(FrameEvent {
            now: req.now,
            metric: req.metric,
            size,
            insets: req.insets,
            source: InputSource::new(self.router.clone()),
            sink: self.fabric.clone(),
        }));

        let body = self.wait_frame(d);
        let res = match body {
            Some(body) => self.render(d, req.size, req.sync, &deco_ops, body, offset),
            None => {
                trace!(target: "window.frame", "frame.skip reason=not_drawn");
                Ok(())
            }
        };
        self.deco_ops = deco_ops;
        if let Err(e) = res {
            self.fail(e);
            return;
        }
        if self.fabric.is_destroyed() {
            return;
        }
        self.after_frame(d, side);
        self.update_cursor(d);
    }

    /// Wait for the client's ops. `None` when it skipped the frame.
    fn wait_frame(&mut self, d: &mut dyn Driver) -> Option<Ops> {
        let fab = self.fabric.clone();
        loop {
            select! {
                recv(fab.driver_funcs.receiver()) -> f => {
                    if let Ok(f) = f {
                        f(&mut *d);
                    }
                }
                recv(fab.frames.receiver()) -> ops => return ops.ok(),
                send(fab.out.sender(), super::fabric::Outgoing::Flush) -> res => {
                    if res.is_ok() {
                        return None;
                    }
                }
                recv(fab.immediate_redraws.receiver()) -> _ => {
                    self.anim.set_next_frame(FrameDeadline::Immediate);
                }
                recv(fab.destroy()) -> _ => return None,
            }
        }
    }

    /// Wait until the client is back in `next_event`.
    fn wait_ack(&mut self, d: &mut dyn Driver) {
        let fab = self.fabric.clone();
        loop {
            select! {
                recv(fab.driver_funcs.receiver()) -> f => {
                    if let Ok(f) = f {
                        f(&mut *d);
                    }
                }
                send(fab.out.sender(), super::fabric::Outgoing::Flush) -> res => {
                    if res.is_ok() {
                        return;
                    }
                }
                recv(fab.immediate_redraws.receiver()) -> _ => self.request_frame(d),
                recv(fab.destroy()) -> _ => return,
            }
        }
    }

    /// Draw and present `body`, retrying through lost devices and stale
    /// surfaces. The buffer goes back to the client once the frame is
    /// presented or given up on.
    fn render(
        &mut self,
        d: &mut dyn Driver,
        size: Point,
        sync: bool,
        deco: &Ops,
        body: Ops,
        offset: Point,
    ) -> WindowResult<()> {
        let res = self.render_body(d, size, sync, deco, &body, offset);
        self.fabric.ack(body);
        res
    }

    fn render_body(
        &mut self,
        d: &mut dyn Driver,
        size: Point,
        sync: bool,
        deco: &Ops,
        body: &Ops,
        offset: Point,
    ) -> WindowResult<()> {
        let mut sync = sync || std::mem::take(&mut self.stale_surface);
        let mut committed = false;
        loop {
            if self.device.is_none() && !self.no_context && self.ctx.is_none() {
                let ctx = d.new_context().map_err(WindowError::ContextCreation)?;
                info!(target: "window.gpu", "context.new api={:?}", ctx.api());
                self.ctx = Some(ctx);
                sync = true;
            }
            if sync {
                if let Some(ctx) = self.ctx.as_deref_mut() {
                    if let Err(e) = ctx.refresh() {
                        if e.is_out_of_date() {
                            debug!(target: "window.gpu", "frame.skip reason=out_of_date");
                            self.stale_surface = true;
                            return Ok(());
                        }
                        self.destroy_gpu();
                        if e.is_device_lost() {
                            self.note_device_lost();
                            continue;
                        }
                        return Err(WindowError::Gpu(e));
                    }
                }
                sync = false;
            }

            let content = FrameContent {
                decorations: Some(deco),
                body: Some(body),
                offset,
            };
            let attempt = match self.ctx.as_deref_mut() {
                None => {
                    self.router.lock().frame(&content, size);
                    return Ok(());
                }
                Some(ctx) => match draw_locked(
                    ctx,
                    &mut self.device,
                    &*self.devices,
                    self.clear_color,
                    &content,
                    size,
                ) {
                    Ok(mut lock) => {
                        if !committed {
                            self.router.lock().frame(&content, size);
                            committed = true;
                        }
                        let res = lock.present();
                        drop(lock);
                        Attempt::Presented(res)
                    }
                    Err(e) => Attempt::Failed(e),
                },
            };

            match attempt {
                Attempt::Presented(Ok(())) => {
                    self.lost_in_a_row = 0;
                    return Ok(());
                }
                Attempt::Presented(Err(e)) if e.is_out_of_date() => {
                    self.stale_surface = true;
                    return Ok(());
                }
                Attempt::Presented(Err(e)) if e.is_device_lost() => {
                    self.destroy_gpu();
                    self.note_device_lost();
                }
                Attempt::Presented(Err(e)) => return Err(WindowError::Gpu(e)),
                Attempt::Failed(e) if e.is_out_of_date() => sync = true,
                Attempt::Failed(e) => {
                    self.destroy_gpu();
                    if !e.is_device_lost() {
                        return Err(WindowError::Gpu(e));
                    }
                    self.note_device_lost();
                }
            }
        }
    }

    fn note_device_lost(&mut self) {
        self.lost_in_a_row += 1;
        if self.lost_in_a_row % self.lost_warn_every == 1 || self.lost_warn_every == 1 {
            warn!(target: "window.gpu", "device.lost in_a_row={}", self.lost_in_a_row);
        } else {
            debug!(target: "window.gpu", "device.lost in_a_row={}", self.lost_in_a_row);
        }
    }

    /// Release device and context, device first and under the context lock.
    fn destroy_gpu(&mut self) {
        if let Some(mut dev) = self.device.take() {
            match self.ctx.as_deref_mut() {
                Some(ctx) => match ContextLock::acquire(ctx) {
                    Ok(_lock) => dev.release(),
                    Err(e) => {
                        warn!(target: "window.gpu", "device.release unlocked: {}", e);
                        dev.release();
                    }
                },
                None => dev.release(),
            }
            debug!(target: "window.gpu", "device.release");
        }
        if let Some(mut ctx) = self.ctx.take() {
            ctx.release();
            info!(target: "window.gpu", "context.release");
        }
    }

    fn fail(&mut self, err: WindowError) {
        error!(target: "window", "destroy cause='{}'", err);
        self.destroy_gpu();
        self.fabric.deliver(Event::Destroy(DestroyEvent { err: Some(err) }));
        self.fabric.close_destroy();
    }

    /// Hand the frame's requests to the driver.
    fn after_frame(&mut self, d: &mut dyn Driver, side: &Side<'_>) {
        side.semantic.borrow_mut().invalidate();
        let (text_input, hint, write, read, editor, wakeup) = {
            let mut r = self.router.lock();
            (
                r.take_text_input_state(),
                r.take_input_hint(),
                r.take_write_clipboard(),
                r.take_read_clipboard(),
                r.editor_state().clone(),
                r.take_wakeup(),
            )
        };
        match text_input {
            TextInputState::Open => d.show_text_input(true),
            TextInputState::Close => d.show_text_input(false),
            TextInputState::Keep => {}
        }
        if let Some(hint) = hint {
            d.set_input_hint(hint);
        }
        if let Some((mime, data)) = write {
            d.write_clipboard(&mime, &data);
        }
        if read {
            d.read_clipboard();
        }
        let changed = {
            let mut ime = side.ime.borrow_mut();
            if ime.editor != editor {
                let old = ime.clone();
                ime.editor = editor;
                Some((old, ime.clone()))
            } else {
                None
            }
        };
        if let Some((old, new)) = changed {
            d.editor_state_changed(&old, &new);
        }
        if let Some(t) = wakeup {
            self.anim.set_next_frame(t);
        }
        self.update_animation(d);
    }

    fn update_cursor(&mut self, d: &mut dyn Driver) {
        let c = self.router.lock().cursor();
        if c != self.cursor {
            self.cursor = c;
            d.set_cursor(c);
        }
    }

    fn process_input(&mut self, d: &mut dyn Driver, e: InputEvent) -> bool {
        let key = match &e {
            InputEvent::Key(k) if k.state == KeyState::Press => Some(k.clone()),
            _ => None,
        };
        let (mut handled, actions) = {
            let mut r = self.router.lock();
            let handled = r.queue(e);
            (handled, r.take_actions())
        };
        if !handled {
            if let Some(dir) = key.and_then(|k| self.focus_direction(&k)) {
                self.move_focus(dir);
                handled = true;
            }
        }
        if !actions.is_empty() {
            debug!(target: "window", "perform actions={:?}", actions);
            d.perform(actions);
        }
        self.update_cursor(d);
        if handled {
            self.request_frame(d);
        }
        handled
    }

    fn focus_direction(&self, k: &KeyEvent) -> Option<FocusDirection> {
        let plain = k.modifiers.is_empty();
        match &k.name {
            KeyName::Tab if plain => Some(FocusDirection::Forward),
            KeyName::Tab if k.modifiers == Modifiers::SHIFT => Some(FocusDirection::Backward),
            KeyName::Up if plain && self.focus_arrows => Some(FocusDirection::Up),
            KeyName::Down if plain && self.focus_arrows => Some(FocusDirection::Down),
            KeyName::Left if plain && self.focus_arrows => Some(FocusDirection::Left),
            KeyName::Right if plain && self.focus_arrows => Some(FocusDirection::Right),
            _ => None,
        }
    }

    /// Move focus, or scroll a bit towards `dir` when there's nothing to move to.
    pub fn move_focus(&mut self, dir: FocusDirection) {
        let mut r = self.router.lock();
        if r.move_focus(dir) {
            r.reveal_focus(self.viewport);
            return;
        }
        let (x, y) = match dir {
            FocusDirection::Left => (-1, 0),
            FocusDirection::Right => (1, 0),
            FocusDirection::Up => (0, -1),
            FocusDirection::Down => (0, 1),
            FocusDirection::Forward | FocusDirection::Backward => return,
        };
        r.scroll_focus(Point::new(x, y).mul(self.metric.dp(SCROLL_STEP)));
    }
}

/// Lock `ctx`, make sure a device exists and draw `content` into the
/// context's target. On success the context stays locked for presenting.
fn draw_locked<'a>(
    ctx: &'a mut dyn Context,
    device: &mut Option<Box<dyn Device>>,
    devices: &dyn DeviceFactory,
    clear: Rgba,
    content: &FrameContent<'_>,
    viewport: Point,
) -> Result<ContextLock<'a>, GpuError> {
    let mut lock = ContextLock::acquire(ctx)?;
    if device.is_none() {
        let api = lock.api();
        *device = Some(devices.new_device(&api)?);
        debug!(target: "window.gpu", "device.new api={:?}", api);
    }
    if let Some(dev) = device.as_deref_mut() {
        dev.clear(clear);
        let target = lock.render_target()?;
        dev.frame(content, &target, viewport)?;
    }
    Ok(lock)
}
