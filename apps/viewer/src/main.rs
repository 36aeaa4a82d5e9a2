use log::{debug, error, info};
use std::sync::Arc;
use std::thread;

use newengine_platform_winit::{run, WinitLoop};
use newengine_window::{
    Actions, ContextRegistry, Event, NullDeviceFactory, Ops, Window, WindowConfig,
};

mod scene;

use scene::Scene;

const CONFIG_PATH: &str = "viewer.toml";

fn main() -> anyhow::Result<()> {
    let mut cfg = WindowConfig::load_or_default(CONFIG_PATH)?;
    let _ = newengine_modules_logging::init(&cfg.logging);
    // No context backends are registered; the client draws nothing on the GPU.
    cfg.custom_renderer = true;

    let host = WinitLoop::new(ContextRegistry::new())?;
    let window = Window::new(host.platform(), Arc::new(NullDeviceFactory), cfg);

    let handle = window.handle();
    ctrlc::set_handler(move || handle.perform(Actions::CLOSE))?;

    let client = thread::Builder::new()
        .name("client".into())
        .spawn(move || client_loop(window))?;

    run(host)?;
    if client.join().is_err() {
        error!(target: "viewer", "client thread panicked");
    }
    Ok(())
}

fn client_loop(mut window: Window) {
    let mut scene = Scene::new();
    let mut ops = Ops::new();
    let mut frames: u64 = 0;
    loop {
        match window.next_event() {
            Event::Frame(ev) => {
                let actions = scene.update(&ev.source);
                if !actions.is_empty() {
                    window.perform(actions);
                }
                ops.reset();
                scene.draw(&mut ops, ev.now, &ev.metric, ev.size);
                ev.frame(&mut ops);
                frames += 1;
                if frames % 120 == 0 {
                    debug!(target: "viewer", "frames={}", frames);
                }
            }
            Event::Stage(stage) => info!(target: "viewer", "stage={}", stage),
            Event::Config(c) => info!(
                target: "viewer",
                "config title='{}' size={}x{} mode={:?}",
                c.config.title,
                c.config.size.x,
                c.config.size.y,
                c.config.mode
            ),
            Event::View(v) => debug!(target: "viewer", "view={:?}", v.view),
            Event::Destroy(d) => {
                match d.err {
                    Some(e) => error!(target: "viewer", "window destroyed: {}", e),
                    None => info!(target: "viewer", "window closed frames={}", frames),
                }
                return;
            }
        }
    }
}
