//! Editor configuration: the Formatter's `cols`/`tab`/`rungs` parameters,
//! the display loop's `rows`/`guard_rows`, loaded from an `oxidized.toml`
//! following the same discovery/parsing conventions as the rest of this
//! codebase's `core-*` crates.

use serde::Deserialize;
use std::{fs, path::PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("tab ({tab}) must evenly divide cols ({cols})")]
    TabDoesNotDivideCols { tab: u16, cols: u16 },
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct FormatterConfig {
    pub cols: u16,
    pub tab: u16,
    pub rungs: u16,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            cols: 80,
            tab: 8,
            rungs: 20,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Upper bound on rows painted per frame, independent of the terminal's
    /// reported height (the smaller of the two wins).
    pub rows: u16,
    pub guard_rows: u16,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            // Unbounded by default: the terminal's own height decides.
            rows: u16::MAX,
            guard_rows: 2,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub formatter: FormatterConfig,
    pub display: DisplayConfig,
}

impl Config {
    /// `tab` must evenly divide `cols` (Formatter::new's own invariant,
    /// checked here too so a bad config file fails with a readable message
    /// rather than a panic deep in `core-render`).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.formatter.cols == 0
            || self.formatter.tab == 0
            || self.formatter.cols % self.formatter.tab != 0
        {
            return Err(ConfigError::TabDoesNotDivideCols {
                tab: self.formatter.tab,
                cols: self.formatter.cols,
            });
        }
        Ok(())
    }
}

/// Best-effort config path: prefer a local `oxidized.toml` before falling
/// back to the platform config directory.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("oxidized.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("oxidized").join("oxidized.toml");
    }
    PathBuf::from("oxidized.toml")
}

/// Loads config from `path` (or `discover()`'s default), falling back to
/// `Config::default()` when the file doesn't exist. A present-but-unparseable
/// file is a `ConfigError`, not a silent fallback. The user asked for
/// settings we then failed to honor.
pub fn load_from(path: Option<PathBuf>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(discover);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(target: "core_config", ?path, "no config file found, using defaults");
            return Ok(Config::default());
        }
        Err(e) => return Err(ConfigError::Read { path, source: e }),
    };
    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.clone(),
        source: e,
    })?;
    if let Err(e) = config.validate() {
        warn!(target: "core_config", ?path, error = %e, "config failed validation");
        return Err(e);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_literal_examples() {
        let cfg = Config::default();
        assert_eq!(cfg.formatter.cols, 80);
        assert_eq!(cfg.formatter.tab, 8);
        assert_eq!(cfg.formatter.rungs, 20);
        assert_eq!(cfg.display.guard_rows, 2);
        assert_eq!(cfg.display.rows, u16::MAX, "unconfigured rows must not cap the terminal height");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_oxidized__.toml"))).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn parses_overrides() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[formatter]\ncols = 120\ntab = 4\nrungs = 10\n[display]\nrows = 40\nguard_rows = 3\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.formatter.cols, 120);
        assert_eq!(cfg.formatter.tab, 4);
        assert_eq!(cfg.display.rows, 40);
        assert_eq!(cfg.display.guard_rows, 3);
    }

    #[test]
    fn rejects_tab_that_does_not_divide_cols() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[formatter]\ncols = 80\ntab = 7\n").unwrap();
        let err = load_from(Some(tmp.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ConfigError::TabDoesNotDivideCols { .. }));
    }
}
