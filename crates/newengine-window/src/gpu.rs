//! GPU context / device contracts and the context backend registry.

use log::{info, warn};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::config::ContextConfig;
use crate::error::GpuError;
use crate::geom::{Point, Rgba};
use crate::ops::FrameContent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphicsApi {
    OpenGl { es: bool, version: (u8, u8) },
    Vulkan,
    Metal,
    Direct3D11,
    Software,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// Whatever the context presents.
    Default,
    Framebuffer(u32),
    Texture(u64),
}

/// Rendering context bound to a native surface.
///
/// Every call other than `api`, `lock` and `release` must happen between
/// `lock` and `unlock`; use [`ContextLock`].
pub trait Context {
    fn api(&self) -> GraphicsApi;
    fn render_target(&mut self) -> Result<RenderTarget, GpuError>;
    fn present(&mut self) -> Result<(), GpuError>;
    /// Re-sync the surface with the window (after resize or creation).
    fn refresh(&mut self) -> Result<(), GpuError>;
    fn release(&mut self);
    fn lock(&mut self) -> Result<(), GpuError>;
    fn unlock(&mut self);
}

/// Draws frame content into a render target.
pub trait Device {
    fn clear(&mut self, color: Rgba);
    fn frame(
        &mut self,
        content: &FrameContent<'_>,
        target: &RenderTarget,
        viewport: Point,
    ) -> Result<(), GpuError>;
    fn release(&mut self);
}

/// Creates GPU devices for a context's API. Shared by all windows.
pub trait DeviceFactory: Send + Sync {
    fn new_device(&self, api: &GraphicsApi) -> Result<Box<dyn Device>, GpuError>;
}

/// Factory for windows that render on their own.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDeviceFactory;

impl DeviceFactory for NullDeviceFactory {
    fn new_device(&self, api: &GraphicsApi) -> Result<Box<dyn Device>, GpuError> {
        Err(GpuError::Unsupported(format!("no device for {:?}", api)))
    }
}

/// Holds a context locked; unlocks on drop, unwinding included.
pub struct ContextLock<'a> {
    ctx: &'a mut dyn Context,
}

impl<'a> ContextLock<'a> {
    pub fn acquire(ctx: &'a mut dyn Context) -> Result<Self, GpuError> {
        ctx.lock()?;
        Ok(Self { ctx })
    }
}

impl<'a> Deref for ContextLock<'a> {
    type Target = dyn Context + 'a;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &*self.ctx
    }
}

impl<'a> DerefMut for ContextLock<'a> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.ctx
    }
}

impl Drop for ContextLock<'_> {
    fn drop(&mut self) {
        self.ctx.unlock();
    }
}

/// Capability family of a context backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    OpenGlDesktop,
    AngleEgl,
    /// Metal or Vulkan.
    Native,
}

/// Anything a context can be created on.
pub trait SurfaceSource: HasWindowHandle + HasDisplayHandle {}

impl<T: HasWindowHandle + HasDisplayHandle + ?Sized> SurfaceSource for T {}

pub trait ContextBackend: Send + Sync {
    fn id(&self) -> &str;

    fn backend(&self) -> Backend;

    /// Higher wins.
    fn priority(&self) -> i32 {
        0
    }

    fn create(
        &self,
        surface: &dyn SurfaceSource,
        cfg: &ContextConfig,
    ) -> Result<Box<dyn Context>, GpuError>;
}

/// Context backends in priority order.
#[derive(Clone, Default)]
pub struct ContextRegistry {
    backends: Vec<Arc<dyn ContextBackend>>,
}

impl ContextRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Equal priorities keep registration order.
    pub fn register(&mut self, backend: Arc<dyn ContextBackend>) {
        info!(
            target: "window.gpu",
            "backend.register id='{}' kind={:?} priority={}",
            backend.id(),
            backend.backend(),
            backend.priority()
        );
        self.backends.push(backend);
        self.backends.sort_by_key(|b| std::cmp::Reverse(b.priority()));
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.id()).collect()
    }

    /// First backend that manages to create a context.
    pub fn create(
        &self,
        surface: &dyn SurfaceSource,
        cfg: &ContextConfig,
    ) -> Result<Box<dyn Context>, GpuError> {
        let mut failures = Vec::new();
        for b in &self.backends {
            match b.create(surface, cfg) {
                Ok(ctx) => {
                    info!(
                        target: "window.gpu",
                        "context.create backend='{}' api={:?}",
                        b.id(),
                        ctx.api()
                    );
                    return Ok(ctx);
                }
                Err(e) => {
                    warn!(target: "window.gpu", "context.create backend='{}' failed: {}", b.id(), e);
                    failures.push(format!("{}: {}", b.id(), e));
                }
            }
        }
        if failures.is_empty() {
            return Err(GpuError::NoBackend("no backend registered".to_string()));
        }
        Err(GpuError::NoBackend(failures.join("; ")))
    }
}
