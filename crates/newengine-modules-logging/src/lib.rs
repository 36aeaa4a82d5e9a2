//! Logger bootstrap for binaries.
//!
//! Lines look like `[<unix ms>] [LEVEL] [target] message`. `RUST_LOG`, when
//! set, is applied after the configured filter and wins.

use log::{LevelFilter, SetLoggerError};
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use newengine_window::LoggingConfig;

/// Unknown names fall back to `info`.
pub fn level(name: &str) -> LevelFilter {
    name.trim().parse().unwrap_or(LevelFilter::Info)
}

pub fn builder(cfg: &LoggingConfig) -> env_logger::Builder {
    let mut b = env_logger::Builder::new();
    b.filter_level(level(&cfg.level));
    if let Some(f) = &cfg.filter {
        b.parse_filters(f);
    }
    if let Ok(env) = std::env::var("RUST_LOG") {
        b.parse_filters(&env);
    }
    b.format(|buf, record| {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        writeln!(
            buf,
            "[{}] [{}] [{}] {}",
            ms,
            record.level(),
            record.target(),
            record.args()
        )
    });
    b
}

/// Install the global logger. Fails if one is already set.
pub fn init(cfg: &LoggingConfig) -> Result<(), SetLoggerError> {
    builder(cfg).try_init()
}
