//! # Template Loader
//!
//! Best-effort scan of the template directory at startup. One bad file never stops the
//! scan: it is logged at warn level and reported in the returned list. Only failing to
//! open the directory itself is an error.

use crate::render::{RenderError, TemplateEngine};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What happened to one matching file.
#[derive(Debug)]
pub enum AssetStatus {
    Registered,
    ReadFailed(io::Error),
    Rejected(RenderError),
}

#[derive(Debug)]
pub struct AssetLoad {
    pub file: String,
    /// File name with the suffix stripped.
    pub name: String,
    pub status: AssetStatus,
}

impl AssetLoad {
    pub fn is_registered(&self) -> bool {
        matches!(self.status, AssetStatus::Registered)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("cannot read template directory {}: {source}", dir.display())]
pub struct TemplateLoadError {
    pub dir: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Entries that could be read; each failure is logged and dropped.
fn readable_entries<T>(dir: &Path, entries: impl IntoIterator<Item = io::Result<T>>) -> Vec<T> {
    entries
        .into_iter()
        .filter_map(|entry| {
            entry
                .map_err(|e| {
                    warn!(dir = %dir.display(), error = %e, "Failed to read directory entry")
                })
                .ok()
        })
        .collect()
}

/// Register every `*{suffix}` file in `dir` into `engine`.
///
/// Entries are visited in file-name order. Directories and non-matching names are
/// skipped without a report entry.
pub fn load_templates(
    dir: &Path,
    suffix: &str,
    engine: &TemplateEngine,
) -> Result<Vec<AssetLoad>, TemplateLoadError> {
    let read_dir = fs::read_dir(dir).map_err(|source| TemplateLoadError {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut entries = readable_entries(dir, read_dir);
    entries.sort_by_key(|entry| entry.file_name());

    let mut loads = Vec::new();
    for entry in entries {
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let file = entry.file_name().to_string_lossy().into_owned();
        let Some(name) = file.strip_suffix(suffix).map(str::to_string) else {
            continue;
        };

        let status = match fs::read_to_string(entry.path()) {
            Err(e) => {
                warn!(template = %file, error = %e, "Failed to read template");
                AssetStatus::ReadFailed(e)
            }
            Ok(source) => match engine.load_template(&name, &source) {
                Ok(()) => {
                    debug!(template = %name, "Loaded template");
                    AssetStatus::Registered
                }
                Err(e) => {
                    warn!(template = %file, error = %e, "Failed to register template");
                    AssetStatus::Rejected(e)
                }
            },
        };
        loads.push(AssetLoad { file, name, status });
    }

    Ok(loads)
}
