//! Pure mapping from `(scenario, asset)` to remote URL and destination path.
//!
//! The mapping is stateless and configured entirely from the outside (base
//! URL, path template, output layout); the pipeline core never hard-codes a
//! remote scheme.

use anyhow::{Context, Result};
use std::path::PathBuf;
use url::Url;

/// Maximum filename length on Linux (NAME_MAX).
const NAME_MAX: usize = 255;

/// Resolves asset URLs and destination paths for one run.
#[derive(Debug, Clone)]
pub struct AssetMapper {
    base: Url,
    path_template: String,
    output_dir: PathBuf,
    split_by_scenario: bool,
}

impl AssetMapper {
    pub fn new(
        base_url: &str,
        path_template: &str,
        output_dir: PathBuf,
        split_by_scenario: bool,
    ) -> Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("invalid base URL {base_url}"))?;
        Ok(Self {
            base,
            path_template: path_template.to_string(),
            output_dir,
            split_by_scenario,
        })
    }

    /// Remote URL for one asset, from the configured path template.
    pub fn url_for(&self, scenario: &str, asset: &str) -> Result<Url> {
        let path = self
            .path_template
            .replace("{scenario}", scenario)
            .replace("{asset}", asset);
        self.base
            .join(&path)
            .with_context(|| format!("asset path {path} does not join onto {}", self.base))
    }

    /// Destination path under the output directory. Unique per
    /// `(scenario, asset)`, so no two fetches ever target the same file.
    pub fn dest_path(&self, scenario: &str, asset: &str) -> PathBuf {
        let filename = sanitize_filename(asset);
        if self.split_by_scenario {
            self.output_dir
                .join(sanitize_filename(scenario))
                .join(filename)
        } else {
            self.output_dir.join(filename)
        }
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }
}

/// Makes a remote-supplied name safe as a single Linux path component:
/// path separators, whitespace and control characters become `_` (runs
/// collapsed), leading/trailing dots and underscores are trimmed, and the
/// result is cut at NAME_MAX on a char boundary.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let mapped = match c {
            '/' | '\\' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        };
        if mapped == '_' && out.ends_with('_') {
            continue;
        }
        out.push(mapped);
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let mut cut = trimmed.len().min(NAME_MAX);
    while cut > 0 && !trimmed.is_char_boundary(cut) {
        cut -= 1;
    }
    trimmed[..cut].to_string()
}
