use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lower bound for the debounce delay
pub const MIN_DEBOUNCE_MS: u64 = 200;
/// Upper bound for the debounce delay
pub const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Configuration from `.tasklink.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub exclude: ExcludeConfig,
    #[serde(default)]
    pub sync: TimingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Folder holding daily notes, relative to the vault root
    #[serde(default = "default_daily_folder")]
    pub folder: String,
    /// chrono format string for the daily note's file stem
    #[serde(default = "default_daily_format")]
    pub format: String,
    /// Heading of the section new tasks are merged into
    #[serde(default = "default_heading")]
    pub heading: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        AggregatorConfig {
            folder: default_daily_folder(),
            format: default_daily_format(),
            heading: default_heading(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_true")]
    pub include_elevated: bool,
    #[serde(default = "default_true")]
    pub include_standard: bool,
    /// Cap on full-scan results (0 = unlimited). Never applied to incremental scans.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            include_elevated: true,
            include_standard: true,
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludeConfig {
    /// Folder prefixes, relative to the vault root
    #[serde(default = "default_excluded_folders")]
    pub folders: Vec<String>,
    /// Full vault-relative paths
    #[serde(default)]
    pub paths: Vec<String>,
    /// File names excluded in any folder
    #[serde(default)]
    pub basenames: Vec<String>,
}

impl Default for ExcludeConfig {
    fn default() -> Self {
        ExcludeConfig {
            folders: default_excluded_folders(),
            paths: Vec::new(),
            basenames: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl TimingConfig {
    /// The debounce delay, clamped to `MIN_DEBOUNCE_MS..=MAX_DEBOUNCE_MS`
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS))
    }
}

fn default_true() -> bool {
    true
}

fn default_daily_folder() -> String {
    "Daily".to_string()
}

fn default_daily_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_heading() -> String {
    "## Tasks".to_string()
}

fn default_max_results() -> usize {
    200
}

fn default_excluded_folders() -> Vec<String> {
    vec!["Templates".to_string()]
}

fn default_debounce_ms() -> u64 {
    1500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: SyncConfig = toml::from_str("").unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.aggregator.heading, "## Tasks");
        assert_eq!(config.scan.max_results, 200);
        assert_eq!(config.exclude.folders, vec!["Templates"]);
    }

    #[test]
    fn partial_tables_keep_field_defaults() {
        let config: SyncConfig = toml::from_str(
            r#"
[scan]
include_standard = false

[exclude]
basenames = ["scratch.md"]
"#,
        )
        .unwrap();
        assert!(config.scan.include_elevated);
        assert!(!config.scan.include_standard);
        assert_eq!(config.scan.max_results, 200);
        assert_eq!(config.exclude.folders, vec!["Templates"]);
        assert_eq!(config.exclude.basenames, vec!["scratch.md"]);
    }

    #[test]
    fn debounce_is_clamped() {
        let low = TimingConfig { debounce_ms: 5 };
        let high = TimingConfig { debounce_ms: 60_000 };
        let ok = TimingConfig { debounce_ms: 750 };
        assert_eq!(low.debounce(), Duration::from_millis(MIN_DEBOUNCE_MS));
        assert_eq!(high.debounce(), Duration::from_millis(MAX_DEBOUNCE_MS));
        assert_eq!(ok.debounce(), Duration::from_millis(750));
    }
}
