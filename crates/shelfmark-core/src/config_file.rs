use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub scan: Option<ScanConfig>,
    pub scoring: Option<ScoringConfig>,
    pub concurrency: Option<ConcurrencyConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Path to a TOML topic-pattern table replacing the built-in one.
    pub patterns_path: Option<String>,
    /// Extra publisher keywords appended to the built-in authority list.
    pub extra_publishers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Upper bound for accepted publication years; defaults to this year.
    pub current_year: Option<i32>,
    /// Enables rating jitter when set; omitted means deterministic ratings.
    pub jitter_seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    pub num_workers: Option<usize>,
}

/// Platform config directory path: `<config_dir>/shelfmark/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("shelfmark").join("config.toml"))
}

/// Load config by cascading CWD `.shelfmark.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(&PathBuf::from(".shelfmark.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &PathBuf) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        scan: Some(ScanConfig {
            patterns_path: overlay
                .scan
                .as_ref()
                .and_then(|s| s.patterns_path.clone())
                .or_else(|| base.scan.as_ref().and_then(|s| s.patterns_path.clone())),
            extra_publishers: overlay
                .scan
                .as_ref()
                .and_then(|s| s.extra_publishers.clone())
                .or_else(|| base.scan.as_ref().and_then(|s| s.extra_publishers.clone())),
        }),
        scoring: Some(ScoringConfig {
            current_year: overlay
                .scoring
                .as_ref()
                .and_then(|s| s.current_year)
                .or_else(|| base.scoring.as_ref().and_then(|s| s.current_year)),
            jitter_seed: overlay
                .scoring
                .as_ref()
                .and_then(|s| s.jitter_seed)
                .or_else(|| base.scoring.as_ref().and_then(|s| s.jitter_seed)),
        }),
        concurrency: Some(ConcurrencyConfig {
            num_workers: overlay
                .concurrency
                .as_ref()
                .and_then(|c| c.num_workers)
                .or_else(|| base.concurrency.as_ref().and_then(|c| c.num_workers)),
        }),
    }
}
