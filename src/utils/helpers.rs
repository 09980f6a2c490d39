/// Helper utilities for nodewatch

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use super::constants::DEFAULT_LOG_FILTER;

/// Wall-clock label stamped on samples, e.g. `14:03:22`
pub fn display_time(now: DateTime<Local>) -> String {
    now.format("%H:%M:%S").to_string()
}

pub fn now_label() -> String {
    display_time(Local::now())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Log to stderr, honoring RUST_LOG
pub fn init_logging() {
    // try_init: a second subscriber (tests, embedding) is not an error
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .try_init();
}

/// Dashboard log file under the platform data directory
pub fn default_log_path() -> Result<PathBuf> {
    let dir = dirs::data_dir()
        .context("Could not determine the user data directory")?
        .join("nodewatch");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(dir.join("dashboard.log"))
}

/// Log to a file; the TUI owns the terminal so stderr is off limits
pub fn init_file_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_display_time() {
        let dt = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 3).unwrap();
        assert_eq!(display_time(dt), "07:05:03");
    }
}
