use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{WindowError, WindowResult};
use crate::geom::{Dp, Rgba};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_width")]
    pub width: f32,

    #[serde(default = "default_height")]
    pub height: f32,

    /// Ask for decorations. Drawn by the platform when it can, client-side otherwise.
    #[serde(default = "default_true")]
    pub decorated: bool,

    #[serde(default = "default_decoration_height")]
    pub decoration_height_dp: f32,

    #[serde(default = "default_clear_color")]
    pub clear_color: Rgba,

    /// Arrow keys move focus when nothing else handled them.
    #[serde(default = "default_focus_arrows")]
    pub focus_arrows: bool,

    /// The client renders on its own; no context or device is created.
    #[serde(default)]
    pub custom_renderer: bool,

    #[serde(default)]
    pub context: ContextConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Context creation hints.
///
/// Immutable once the window is created; every backend receives it by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_true")]
    pub srgb: bool,

    #[serde(default = "default_true")]
    pub vsync: bool,

    #[serde(default)]
    pub depth_bits: u8,

    #[serde(default)]
    pub stencil_bits: u8,

    #[serde(default)]
    pub samples: u8,

    #[serde(default = "default_gl_version")]
    pub gl_version: (u8, u8),

    #[serde(default)]
    pub debug: bool,

    /// Log a warning after this many consecutive device-lost retries.
    #[serde(default = "default_device_lost_warn_every")]
    pub device_lost_warn_every: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    /// env_logger filter directives, e.g. `"window.gpu=trace,platform.winit=debug"`.
    #[serde(default)]
    pub filter: Option<String>,
}

fn default_title() -> String {
    "NewEngine".to_string()
}
fn default_width() -> f32 {
    800.0
}
fn default_height() -> f32 {
    600.0
}
fn default_true() -> bool {
    true
}
fn default_decoration_height() -> f32 {
    32.0
}
fn default_clear_color() -> Rgba {
    Rgba::WHITE
}
fn default_focus_arrows() -> bool {
    cfg!(any(target_os = "android", target_os = "ios"))
}
fn default_gl_version() -> (u8, u8) {
    (3, 0)
}
fn default_device_lost_warn_every() -> u32 {
    8
}
fn default_level() -> String {
    "info".to_string()
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
            decorated: true,
            decoration_height_dp: default_decoration_height(),
            clear_color: default_clear_color(),
            focus_arrows: default_focus_arrows(),
            custom_renderer: false,
            context: ContextConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            srgb: true,
            vsync: true,
            depth_bits: 0,
            stencil_bits: 0,
            samples: 0,
            gl_version: default_gl_version(),
            debug: false,
            device_lost_warn_every: default_device_lost_warn_every(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            filter: None,
        }
    }
}

impl WindowConfig {
    pub fn load_or_default(path: &str) -> WindowResult<Self> {
        match fs::read_to_string(path) {
            Ok(s) => Self::from_toml(&s)
                .map_err(|e| WindowError::Config(format!("parse {}: {}", path, e))),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    #[inline]
    pub fn decoration_height(&self) -> Dp {
        Dp(self.decoration_height_dp)
    }
}
