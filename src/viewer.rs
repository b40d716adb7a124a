//! Best-effort image viewer integration
//!
//! Opening a stored image in the platform viewer is a convenience side
//! effect; any failure is logged as a warning and otherwise ignored.

use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

/// Open `path` with the platform's default opener. Never fails the caller.
pub fn open(path: &Path) {
    let result = spawn_opener(path);
    match result {
        Ok(_) => debug!(path = %path.display(), "opened in viewer"),
        Err(e) => warn!(path = %path.display(), error = %e, "could not open viewer"),
    }
}

#[cfg(target_os = "macos")]
fn spawn_opener(path: &Path) -> std::io::Result<std::process::Child> {
    Command::new("open").arg(path).spawn()
}

#[cfg(target_os = "windows")]
fn spawn_opener(path: &Path) -> std::io::Result<std::process::Child> {
    Command::new("cmd").args(["/C", "start", ""]).arg(path).spawn()
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn spawn_opener(path: &Path) -> std::io::Result<std::process::Child> {
    Command::new("xdg-open").arg(path).spawn()
}
