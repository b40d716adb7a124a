//! Destination path resolution and stored-image queries
//!
//! [`StorageLayout`] owns the process-wide storage root and computes where a
//! generated image lands: an explicit output path wins, then a project asset
//! directory, then the default timestamped store. It also answers the listing
//! and fuzzy-lookup queries the tool layer exposes.

use crate::request::ValidatedRequest;
use crate::ImageFormat;
use chrono::{SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Maximum length of the sanitized prompt fragment used in filenames.
const PROMPT_FRAGMENT_LEN: usize = 20;

/// Project kinds that follow a public-asset convention.
const PUBLIC_ASSET_KINDS: &[&str] = &["react", "next", "vue", "svelte", "astro"];

/// Storage errors (filesystem failures with the underlying cause attached)
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Directory creation failed
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying cause
        source: io::Error,
    },

    /// Directory listing failed
    #[error("failed to read storage directory {path}: {source}")]
    ReadDir {
        /// Directory that could not be read
        path: PathBuf,
        /// Underlying cause
        source: io::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Filesystem layout for stored images.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    /// Create a layout rooted at `root`. The directory is created lazily, on
    /// first store.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the destination path for one image of a validated request.
    ///
    /// `index` numbers the image within a multi-image request; files after
    /// the first get a `-N` stem suffix so no job overwrites another.
    ///
    /// Decision order, first match wins:
    /// 1. explicit output path (extension derived or overridden to match the
    ///    requested format; a mismatch warns, never fails)
    /// 2. project asset directory (kind convention or explicit subpath)
    /// 3. default storage root with a timestamped filename
    ///
    /// The chosen directory is created idempotently.
    pub fn resolve(&self, request: &ValidatedRequest, index: u32) -> StorageResult<PathBuf> {
        let path = if let Some(explicit) = &request.output_path {
            let path = apply_extension(explicit.clone(), request.format);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                ensure_dir(parent)?;
            }
            path
        } else if let Some(project) = &request.project {
            let asset_dir = match &project.subpath {
                Some(subpath) => project.base.join(subpath),
                None => project.base.join(default_asset_dir(project.kind.as_deref())),
            };
            ensure_dir(&asset_dir)?;
            let filename = format!(
                "{}_{}.{}",
                sanitize_prompt_fragment(&request.prompt),
                request.model.id,
                request.format.extension()
            );
            asset_dir.join(filename)
        } else {
            ensure_dir(&self.root)?;
            let timestamp = filesystem_timestamp();
            let filename = format!(
                "{}_{}_{}.{}",
                timestamp,
                request.model.id,
                sanitize_prompt_fragment(&request.prompt),
                request.format.extension()
            );
            self.root.join(filename)
        };

        Ok(numbered(path, index))
    }

    /// Stored filenames grouped by extension.
    ///
    /// A missing storage directory yields an empty map, not an error.
    pub fn list_stored(&self) -> StorageResult<BTreeMap<String, Vec<String>>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();

        if !self.root.exists() {
            return Ok(grouped);
        }

        let entries = std::fs::read_dir(&self.root).map_err(|source| StorageError::ReadDir {
            path: self.root.clone(),
            source,
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("other")
                .to_ascii_lowercase();
            grouped.entry(ext).or_default().push(name.to_string());
        }

        for names in grouped.values_mut() {
            names.sort();
        }

        Ok(grouped)
    }

    /// Absolute path of a stored file, when it exists.
    pub fn find(&self, filename: &str) -> Option<PathBuf> {
        let path = self.root.join(filename);
        path.is_file().then_some(path)
    }

    /// Fuzzy suggestions for a filename that was not found.
    ///
    /// Case-insensitive substring containment in either direction, capped to
    /// 3 suggestions.
    pub fn suggestions(&self, query: &str) -> Vec<String> {
        let query = query.to_ascii_lowercase();
        let mut matches = Vec::new();

        let Ok(grouped) = self.list_stored() else {
            return matches;
        };

        for name in grouped.values().flatten() {
            let lower = name.to_ascii_lowercase();
            if lower.contains(&query) || query.contains(&lower) {
                matches.push(name.clone());
                if matches.len() == 3 {
                    return matches;
                }
            }
        }

        matches
    }
}

/// Create a directory tree; creating an existing directory is not an error.
fn ensure_dir(path: &Path) -> StorageResult<()> {
    std::fs::create_dir_all(path).map_err(|source| StorageError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Force a path's extension to match the requested format.
///
/// No extension appends one; a mismatched extension keeps the base name but
/// is overridden with a warning; the caller sees the final path either way.
fn apply_extension(path: PathBuf, format: ImageFormat) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        None => path.with_extension(format.extension()),
        Some(ext) if format.matches_extension(ext) => path,
        Some(ext) => {
            warn!(
                requested = %format,
                extension = ext,
                "output path extension disagrees with requested format; overriding"
            );
            path.with_extension(format.extension())
        }
    }
}

/// Conventional asset directory for a project kind.
fn default_asset_dir(kind: Option<&str>) -> &'static str {
    match kind {
        Some(k) if PUBLIC_ASSET_KINDS.contains(&k) => "public/images",
        _ => "assets/images",
    }
}

/// Bounded, alphanumeric-only fragment of the prompt for filenames.
fn sanitize_prompt_fragment(prompt: &str) -> String {
    let fragment: String = prompt
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(PROMPT_FRAGMENT_LEN)
        .collect::<String>()
        .to_ascii_lowercase();

    if fragment.is_empty() {
        "image".to_string()
    } else {
        fragment
    }
}

/// ISO-8601 UTC timestamp with `:` and `.` replaced for filesystem safety.
fn filesystem_timestamp() -> String {
    Utc::now()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Insert a `-N` stem suffix for images after the first in a multi-image
/// request.
fn numbered(path: PathBuf, index: u32) -> PathBuf {
    if index == 0 {
        return path;
    }
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string();
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let filename = if ext.is_empty() {
        format!("{}-{}", stem, index + 1)
    } else {
        format!("{}-{}.{}", stem, index + 1, ext)
    };
    path.with_file_name(filename)
}
