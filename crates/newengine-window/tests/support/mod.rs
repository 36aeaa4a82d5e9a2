//! Scripted platform for driving a window from tests.
//!
//! The platform thread owns the `Callbacks` and a fake driver and executes
//! commands sent by the test thread, which plays the client.

#![allow(dead_code)]

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use newengine_window::driver::Config;
use newengine_window::editor::ImeState;
use newengine_window::ops::{CursorShape, FrameContent, InputHint};
use newengine_window::{
    Actions, Callbacks, Context, Device, DeviceFactory, Driver, Event, FrameRequest, GpuError,
    GraphicsApi, Insets, Metric, Platform, PlatformEvent, Point, RenderTarget, Rgba, Stage,
    Waker, Window, WindowConfig, WindowError, WindowLink, WindowOption, WindowResult,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Everything the fakes observed, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Created(Vec<WindowOption>),
    Wakeup,
    Animating(bool),
    ShowTextInput(bool),
    InputHint(InputHint),
    NewContext,
    ReadClipboard,
    WriteClipboard(String, Vec<u8>),
    Configure(Vec<WindowOption>),
    Cursor(CursorShape),
    Perform(Actions),
    EditorChanged,
    Refresh,
    Present,
    ContextRelease,
    NewDevice,
    DeviceFrame { ops: usize },
    DeviceRelease,
}

pub type Log = Arc<Mutex<Vec<Call>>>;

/// Failures to inject, consumed front to back.
#[derive(Default)]
pub struct Script {
    pub context_error: Option<GpuError>,
    pub refresh_errors: VecDeque<GpuError>,
    pub frame_errors: VecDeque<GpuError>,
    pub present_errors: VecDeque<GpuError>,
}

pub type Shared = Arc<Mutex<Script>>;

type CallFn = Box<dyn FnOnce(&Callbacks, &mut FakeDriver) + Send>;

pub enum Cmd {
    Event(PlatformEvent),
    Wake,
    Call(CallFn),
}

pub struct FakeContext {
    log: Log,
    script: Shared,
}

impl Context for FakeContext {
    fn api(&self) -> GraphicsApi {
        GraphicsApi::Software
    }
    fn render_target(&mut self) -> Result<RenderTarget, GpuError> {
        Ok(RenderTarget::Default)
    }
    fn present(&mut self) -> Result<(), GpuError> {
        self.log.lock().push(Call::Present);
        match self.script.lock().present_errors.pop_front() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
    fn refresh(&mut self) -> Result<(), GpuError> {
        self.log.lock().push(Call::Refresh);
        match self.script.lock().refresh_errors.pop_front() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
    fn release(&mut self) {
        self.log.lock().push(Call::ContextRelease);
    }
    fn lock(&mut self) -> Result<(), GpuError> {
        Ok(())
    }
    fn unlock(&mut self) {}
}

pub struct FakeDevice {
    log: Log,
    script: Shared,
}

impl Device for FakeDevice {
    fn clear(&mut self, _color: Rgba) {}

    fn frame(
        &mut self,
        content: &FrameContent<'_>,
        _target: &RenderTarget,
        _viewport: Point,
    ) -> Result<(), GpuError> {
        let mut ops = 0;
        content.walk(|_, _| ops += 1);
        self.log.lock().push(Call::DeviceFrame { ops });
        match self.script.lock().frame_errors.pop_front() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn release(&mut self) {
        self.log.lock().push(Call::DeviceRelease);
    }
}

pub struct FakeDevices {
    log: Log,
    script: Shared,
}

impl DeviceFactory for FakeDevices {
    fn new_device(&self, _api: &GraphicsApi) -> Result<Box<dyn Device>, GpuError> {
        self.log.lock().push(Call::NewDevice);
        Ok(Box::new(FakeDevice {
            log: self.log.clone(),
            script: self.script.clone(),
        }))
    }
}

pub struct FakeDriver {
    log: Log,
    script: Shared,
    cmds: Sender<Cmd>,
    config: Config,
}

impl Driver for FakeDriver {
    fn set_animating(&mut self, anim: bool) {
        self.log.lock().push(Call::Animating(anim));
    }
    fn show_text_input(&mut self, show: bool) {
        self.log.lock().push(Call::ShowTextInput(show));
    }
    fn set_input_hint(&mut self, hint: InputHint) {
        self.log.lock().push(Call::InputHint(hint));
    }
    fn new_context(&mut self) -> Result<Box<dyn Context>, GpuError> {
        self.log.lock().push(Call::NewContext);
        if let Some(e) = self.script.lock().context_error.take() {
            return Err(e);
        }
        Ok(Box::new(FakeContext {
            log: self.log.clone(),
            script: self.script.clone(),
        }))
    }
    fn read_clipboard(&mut self) {
        self.log.lock().push(Call::ReadClipboard);
    }
    fn write_clipboard(&mut self, mime: &str, data: &[u8]) {
        self.log
            .lock()
            .push(Call::WriteClipboard(mime.to_string(), data.to_vec()));
    }
    fn configure(&mut self, options: Vec<WindowOption>) {
        for o in &options {
            o.apply(&Metric::default(), &mut self.config);
        }
        self.log.lock().push(Call::Configure(options));
        // A real window manager answers with its new configuration.
        let _ = self
            .cmds
            .send(Cmd::Event(PlatformEvent::Config(self.config.clone())));
    }
    fn set_cursor(&mut self, cursor: CursorShape) {
        self.log.lock().push(Call::Cursor(cursor));
    }
    fn waker(&self) -> Waker {
        let cmds = self.cmds.clone();
        Waker::new(move || {
            let _ = cmds.send(Cmd::Wake);
        })
    }
    fn perform(&mut self, actions: Actions) {
        self.log.lock().push(Call::Perform(actions));
    }
    fn editor_state_changed(&mut self, _old: &ImeState, _new: &ImeState) {
        self.log.lock().push(Call::EditorChanged);
    }
    fn frame_buffer_size(&self) -> Point {
        self.config.size
    }
}

pub struct FakePlatform {
    log: Log,
    script: Shared,
    tx: Sender<Cmd>,
    rx: Receiver<Cmd>,
    fail_create: bool,
}

impl Platform for FakePlatform {
    fn new_window(&self, link: WindowLink, options: Vec<WindowOption>) -> WindowResult<()> {
        if self.fail_create {
            return Err(WindowError::platform(anyhow::anyhow!("no display")));
        }
        self.log.lock().push(Call::Created(options));
        let mut driver = FakeDriver {
            log: self.log.clone(),
            script: self.script.clone(),
            cmds: self.tx.clone(),
            config: Config {
                size: Point::new(200, 100),
                ..Config::default()
            },
        };
        let log = self.log.clone();
        let rx = self.rx.clone();
        thread::spawn(move || {
            let cb = Callbacks::new(link);
            cb.set_driver(Some(driver.waker()));
            for cmd in rx.iter() {
                match cmd {
                    Cmd::Event(e) => {
                        cb.event(&mut driver, e);
                    }
                    Cmd::Wake => {
                        log.lock().push(Call::Wakeup);
                        cb.event(&mut driver, PlatformEvent::Wakeup);
                    }
                    Cmd::Call(f) => f(&cb, &mut driver),
                }
                if cb.is_destroyed() {
                    break;
                }
            }
        });
        Ok(())
    }
}

pub struct Harness {
    pub window: Window,
    pub log: Log,
    pub script: Shared,
    tx: Sender<Cmd>,
}

impl Harness {
    pub fn new(cfg: WindowConfig) -> Self {
        Self::build(cfg, false)
    }

    pub fn failing_platform() -> Self {
        Self::build(plain_config(), true)
    }

    fn build(cfg: WindowConfig, fail_create: bool) -> Self {
        init_logging();
        let log: Log = Arc::default();
        let script: Shared = Arc::default();
        let (tx, rx) = unbounded();
        let platform = FakePlatform {
            log: log.clone(),
            script: script.clone(),
            tx: tx.clone(),
            rx,
            fail_create,
        };
        let devices = FakeDevices {
            log: log.clone(),
            script: script.clone(),
        };
        let window = Window::new(Arc::new(platform), Arc::new(devices), cfg);
        Self {
            window,
            log,
            script,
            tx,
        }
    }

    pub fn sender(&self) -> Sender<Cmd> {
        self.tx.clone()
    }

    pub fn send(&self, e: PlatformEvent) {
        let _ = self.tx.send(Cmd::Event(e));
    }

    pub fn call(&self, f: impl FnOnce(&Callbacks, &mut FakeDriver) + Send + 'static) {
        let _ = self.tx.send(Cmd::Call(Box::new(f)));
    }

    #[inline]
    pub fn next(&mut self) -> Event {
        self.window.next_event()
    }

    /// Create the window and bring it to `Running`.
    pub fn start(&mut self) {
        self.send(PlatformEvent::Stage(Stage::Running));
        match self.next() {
            Event::Stage(Stage::Running) => {}
            other => panic!("expected running stage, got {:?}", other),
        }
    }

    /// Wait until everything sent so far was processed by the platform.
    pub fn sync(&mut self) {
        let marker = Config {
            title: "sync-marker".into(),
            ..Config::default()
        };
        self.send(PlatformEvent::Config(marker));
        loop {
            match self.next() {
                Event::Config(c) if c.config.title == "sync-marker" => return,
                Event::Destroy(d) => panic!("destroyed while syncing: {:?}", d.err),
                _ => {}
            }
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.log.lock().iter().filter(|c| pred(c)).count()
    }

    pub fn shutdown(&mut self) {
        self.send(PlatformEvent::Destroy(None));
        loop {
            if let Event::Destroy(_) = self.next() {
                return;
            }
        }
    }
}

pub fn plain_config() -> WindowConfig {
    WindowConfig {
        decorated: false,
        ..WindowConfig::default()
    }
}

pub fn frame_request(w: i32, h: i32) -> PlatformEvent {
    PlatformEvent::Frame(FrameRequest {
        now: Instant::now(),
        metric: Metric::default(),
        size: Point::new(w, h),
        insets: Insets::default(),
        sync: false,
    })
}
