// src/registry/scaffold.rs

//! Local registry scaffolding
//!
//! The registry layout is fixed: numbered range files covering the name
//! space in equal spans, one index file per letter group, and empty
//! chunk placeholders for sat ranges known to hold no entries yet. Files
//! are created empty and only if missing, so a re-run never touches
//! anything a previous run (or a human) put there.

use crate::config::RegistrySection;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Outcome of one scaffold generation pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScaffoldReport {
    pub created: usize,
    pub skipped: usize,
}

/// The complete placeholder file list for a registry layout, in
/// generation order
pub fn scaffold_file_names(registry: &RegistrySection) -> Vec<String> {
    let mut names = Vec::new();
    for i in 0..registry.range_files {
        let start = i * registry.range_width;
        let end = start + registry.range_width - 1;
        names.push(format!("{start}-{end}.txt"));
    }
    for letter in &registry.index_names {
        names.push(format!("index_{letter}.txt"));
    }
    names.extend(registry.placeholder_chunks.iter().cloned());
    names
}

/// Create every placeholder file under the local registry directory,
/// skipping files that already exist
pub fn generate_scaffold(registry: &RegistrySection) -> Result<ScaffoldReport> {
    let dir = registry.local_dir();
    fs::create_dir_all(&dir)
        .map_err(|e| Error::IoError(format!("Failed to create {}: {e}", dir.display())))?;

    let mut report = ScaffoldReport::default();
    for name in scaffold_file_names(registry) {
        if touch_empty(&dir.join(&name))? {
            report.created += 1;
        } else {
            report.skipped += 1;
        }
    }

    info!(
        "Scaffolded {} files under {} ({} already present)",
        report.created,
        dir.display(),
        report.skipped
    );
    Ok(report)
}

/// Create an empty file unless one exists; reports whether it was created
fn touch_empty(path: &Path) -> Result<bool> {
    if path.exists() {
        debug!("{} already exists, skipping", path.display());
        return Ok(false);
    }
    fs::write(path, "")
        .map_err(|e| Error::IoError(format!("Failed to create {}: {e}", path.display())))?;
    Ok(true)
}
