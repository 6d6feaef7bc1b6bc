//! Log file setup.
//!
//! The terminal belongs to the UI, so `tracing` output goes to a file.
//! `RUST_LOG` overrides the configured filter.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global subscriber and return the log file path.
pub fn init(cfg: &LoggingConfig) -> anyhow::Result<PathBuf> {
    if let Some(parent) = cfg.file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cfg.file)
        .with_context(|| format!("opening log file {}", cfg.file.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.filter));

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_env_filter(filter)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    Ok(cfg.file.clone())
}
