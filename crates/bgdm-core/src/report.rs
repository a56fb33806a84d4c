//! End-of-run failure report for manual follow-up.

use crate::stats::StatsSnapshot;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Filename written under the run's output directory.
pub const FAILED_ITEMS_FILE: &str = "failed_items.json";

/// Writes the final stats (with the full failed-item list) as JSON under the
/// output directory. Skipped when nothing failed; returns the path written.
pub fn write_failed_items(output_dir: &Path, snapshot: &StatsSnapshot) -> Result<Option<PathBuf>> {
    if snapshot.failed_items.is_empty() {
        return Ok(None);
    }
    let path = output_dir.join(FAILED_ITEMS_FILE);
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(Some(path))
}
