//! JSON persistence for the source list.
//!
//! The feeds file is a pretty-printed JSON array of [`Source`] values:
//!
//! ```json
//! [
//!   { "name": "Rust Blog", "url": "https://blog.rust-lang.org/feed.xml", "tags": ["rust"] }
//! ]
//! ```
//!
//! The engine itself never touches disk.  Callers load sources before
//! building a [`Reader`](crate::reader::Reader) and save them after editing.

use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::warn;

use crate::error::PersistError;
use crate::registry::{Source, SourceRegistry};

/// Read the source list at `path`.
///
/// A missing or malformed file yields `None`; deciding how to report that is
/// up to the caller.
pub fn load(path: &Path) -> Option<Vec<Source>> {
    match try_load(path) {
        Ok(sources) => Some(sources),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not load feeds file");
            None
        }
    }
}

fn try_load(path: &Path) -> Result<Vec<Source>, PersistError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Read the source list for editing.  Only a missing file counts as empty;
/// a file that exists but cannot be read or parsed is an error.
pub fn load_existing(path: &Path) -> Result<Vec<Source>, PersistError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    try_load(path)
}

/// Load the sources at `path`, apply `edit` to them and save the result.
///
/// Nothing is written unless both the load and the edit succeed.
pub fn edit<T>(
    path: &Path,
    edit: impl FnOnce(&mut SourceRegistry) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let sources = load_existing(path).with_context(|| format!("reading {}", path.display()))?;
    let mut registry = SourceRegistry::create(sources)?;
    let outcome = edit(&mut registry)?;
    let sources: Vec<Source> = registry.all().cloned().collect();
    save(path, &sources).with_context(|| format!("saving {}", path.display()))?;
    Ok(outcome)
}

/// Write `sources` to `path`, creating parent directories as needed.
pub fn save(path: &Path, sources: &[Source]) -> Result<(), PersistError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(sources)?;
    fs::write(path, text)?;
    Ok(())
}
