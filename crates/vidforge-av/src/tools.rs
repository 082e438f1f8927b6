//! External tool detection.
//!
//! vidforge drives a single external engine, ffmpeg. Its location comes from
//! configuration when that path exists, and from `PATH` otherwise.

use std::path::{Path, PathBuf};
use std::process::Command;

use vidforge_common::{Error, Result};

/// Availability information for a tool, returned by [`check_tool`].
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// First line of `-version` output, if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Locate a tool, preferring a configured path over `PATH` lookup.
///
/// A configured value may be an absolute path or a bare program name; bare
/// names are resolved through `PATH`. If the configured value cannot be
/// found, `name` itself is looked up.
pub fn resolve_tool(name: &str, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        if let Ok(found) = which::which(path) {
            return Ok(found);
        }
        tracing::warn!(
            "Configured {name} path {} not found; falling back to PATH",
            path.display()
        );
    }

    which::which(name)
        .map_err(|_| Error::tool(name, format!("{name} not found; is it installed and in PATH?")))
}

/// Locate the ffmpeg binary.
pub fn resolve_ffmpeg(configured: Option<&Path>) -> Result<PathBuf> {
    resolve_tool("ffmpeg", configured)
}

/// Check whether a tool is available and read its version.
pub fn check_tool(name: &str, configured: Option<&Path>) -> ToolInfo {
    match resolve_tool(name, configured) {
        Ok(path) => {
            let version = detect_version(&path);
            ToolInfo {
                name: name.to_string(),
                available: version.is_some(),
                version,
                path: Some(path),
            }
        }
        Err(_) => ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Run `<tool> -version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = Command::new(path).arg("-version").output().ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}
