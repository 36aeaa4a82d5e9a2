use thiserror::Error;

pub type WindowResult<T> = Result<T, WindowError>;

/// Failures reported by GPU contexts and devices.
#[derive(Debug, Error)]
pub enum GpuError {
    /// The surface no longer matches the window; skip the frame and refresh.
    #[error("surface out of date")]
    OutOfDate,

    /// The driver invalidated the context. Everything must be recreated.
    #[error("gpu device lost")]
    DeviceLost,

    #[error("no context backend available: {0}")]
    NoBackend(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("gpu backend error: {0}")]
    Backend(String),
}

impl GpuError {
    #[inline]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    #[inline]
    pub fn is_out_of_date(&self) -> bool {
        matches!(self, Self::OutOfDate)
    }

    #[inline]
    pub fn is_device_lost(&self) -> bool {
        matches!(self, Self::DeviceLost)
    }
}

/// Fatal window errors. Surfaced to the client only through `DestroyEvent`.
#[derive(Debug, Error)]
pub enum WindowError {
    #[error("gpu error: {0}")]
    Gpu(#[source] GpuError),

    #[error("context creation failed: {0}")]
    ContextCreation(#[source] GpuError),

    #[error("internal error: zero-sized frame")]
    ZeroSizedFrame,

    #[error("platform error: {0}")]
    Platform(#[source] anyhow::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("window closed")]
    Closed,
}

impl WindowError {
    #[inline]
    pub fn platform(e: impl Into<anyhow::Error>) -> Self {
        Self::Platform(e.into())
    }
}

impl From<GpuError> for WindowError {
    #[inline]
    fn from(e: GpuError) -> Self {
        Self::Gpu(e)
    }
}
