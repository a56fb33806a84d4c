use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Operator range for the fetch concurrency limit.
pub const MIN_CONCURRENCY: usize = 1;
pub const MAX_CONCURRENCY: usize = 64;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per asset (including the first).
    pub max_attempts: u32,
    /// Delay in seconds after the first failed attempt; grows linearly.
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.5,
            max_delay_secs: 30,
        }
    }
}

/// Placeholder-response filter. Bodies matching any entry are the remote's
/// "missing asset" marker and are never retried. Kept configurable because
/// the remote can change its placeholder representation at any time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaceholderConfig {
    /// Exact body sizes in bytes that identify a placeholder.
    #[serde(default)]
    pub sizes: Vec<u64>,
    /// Lowercase hex sha256 digests of known placeholder bodies.
    #[serde(default)]
    pub sha256: Vec<String>,
}

/// Global configuration loaded from `~/.config/bgdm/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BgdmConfig {
    /// Remote site base URL.
    pub base_url: String,
    /// Asset path template with `{scenario}` and `{asset}` placeholders,
    /// joined onto `base_url`.
    pub asset_path_template: String,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Default output directory for downloaded images.
    pub output_dir: String,
    /// Concurrent fetches (clamped to 1..=64 at run start).
    pub concurrency: usize,
    /// Scenarios per batch handed from discovery to the engine.
    pub batch_size: usize,
    /// Fixed delay between scenario scans, in milliseconds.
    pub scan_delay_ms: u64,
    /// Total per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Bodies shorter than this are treated as malformed and retried.
    pub min_content_len: u64,
    /// Save into one subdirectory per scenario (false = flat layout).
    pub split_by_scenario: bool,
    /// Placeholder filter; defaults to the remote's known 14084-byte body.
    #[serde(default)]
    pub placeholder: PlaceholderConfig,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for BgdmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://bestdori.com".to_string(),
            asset_path_template: "/assets/jp/bg/{scenario}_rip/{asset}".to_string(),
            user_agent: concat!(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ",
                "AppleWebKit/537.36 (KHTML, like Gecko) ",
                "Chrome/120.0 Safari/537.36"
            )
            .to_string(),
            output_dir: "bestdori_scenarios".to_string(),
            concurrency: 8,
            batch_size: 20,
            scan_delay_ms: 500,
            request_timeout_secs: 60,
            min_content_len: 500,
            split_by_scenario: true,
            placeholder: PlaceholderConfig {
                sizes: vec![14084],
                sha256: Vec::new(),
            },
            retry: None,
        }
    }
}

impl BgdmConfig {
    /// Concurrency clamped to the operator range.
    pub fn clamped_concurrency(&self) -> usize {
        self.concurrency.clamp(MIN_CONCURRENCY, MAX_CONCURRENCY)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("bgdm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BgdmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BgdmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: BgdmConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = BgdmConfig::default();
        assert_eq!(cfg.concurrency, 8);
        assert_eq!(cfg.batch_size, 20);
        assert_eq!(cfg.min_content_len, 500);
        assert_eq!(cfg.scan_delay_ms, 500);
        assert!(cfg.split_by_scenario);
        assert_eq!(cfg.placeholder.sizes, vec![14084]);
        assert!(cfg.placeholder.sha256.is_empty());
        assert!(cfg.retry.is_none());
    }

    #[test]
    fn concurrency_is_clamped() {
        let mut cfg = BgdmConfig::default();
        cfg.concurrency = 0;
        assert_eq!(cfg.clamped_concurrency(), 1);
        cfg.concurrency = 500;
        assert_eq!(cfg.clamped_concurrency(), 64);
        cfg.concurrency = 8;
        assert_eq!(cfg.clamped_concurrency(), 8);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = BgdmConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: BgdmConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.base_url, cfg.base_url);
        assert_eq!(parsed.asset_path_template, cfg.asset_path_template);
        assert_eq!(parsed.concurrency, cfg.concurrency);
        assert_eq!(parsed.placeholder.sizes, cfg.placeholder.sizes);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            base_url = "http://127.0.0.1:8080"
            asset_path_template = "/img/{scenario}/{asset}"
            user_agent = "bgdm-test"
            output_dir = "out"
            concurrency = 2
            batch_size = 5
            scan_delay_ms = 0
            request_timeout_secs = 10
            min_content_len = 100
            split_by_scenario = false
        "#;
        let cfg: BgdmConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.base_url, "http://127.0.0.1:8080");
        assert_eq!(cfg.concurrency, 2);
        assert!(!cfg.split_by_scenario);
        assert!(cfg.placeholder.sizes.is_empty());
        assert!(cfg.retry.is_none());
    }

    #[test]
    fn config_toml_retry_and_placeholder_sections() {
        let toml = r#"
            base_url = "https://example.org"
            asset_path_template = "/a/{scenario}/{asset}"
            user_agent = "bgdm-test"
            output_dir = "out"
            concurrency = 4
            batch_size = 10
            scan_delay_ms = 250
            request_timeout_secs = 30
            min_content_len = 500
            split_by_scenario = true

            [placeholder]
            sizes = [14084, 2048]
            sha256 = ["aa00"]

            [retry]
            max_attempts = 3
            base_delay_secs = 0.25
            max_delay_secs = 15
        "#;
        let cfg: BgdmConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.placeholder.sizes, vec![14084, 2048]);
        assert_eq!(cfg.placeholder.sha256, vec!["aa00".to_string()]);
        let retry = cfg.retry.as_ref().unwrap();
        assert_eq!(retry.max_attempts, 3);
        assert!((retry.base_delay_secs - 0.25).abs() < 1e-9);
        assert_eq!(retry.max_delay_secs, 15);
    }
}
