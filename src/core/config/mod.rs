//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Configuration has two file scopes:
//! - **Global**: User-level defaults
//! - **Repo**: `.ghpages.toml` at the root of the working copy
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. An explicit path passed by the caller (`--config`)
//! 2. `$GHPAGES_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/ghpages/config.toml`
//! 4. `~/.ghpages/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use ghpages_deploy::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/repo")), None).unwrap();
//! let config = result.config;
//!
//! if let Some(branch) = &config.publisher().branch {
//!     println!("Deploying to: {}", branch);
//! }
//! ```

pub mod schema;

pub use schema::PublisherConfig;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the repository-scoped config.
pub const REPO_CONFIG_FILE: &str = ".ghpages.toml";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("config file not found: {0}")]
    NotFound(PathBuf),
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Files that contributed, lowest precedence first.
    pub sources: Vec<PathBuf>,
}

/// Merged configuration from all file sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    merged: PublisherConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `repo_root` is provided, also loads `.ghpages.toml` from it.
    /// An explicit `global_path` must exist; default locations may be absent.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or fail
    /// validation.
    pub fn load(
        repo_root: Option<&Path>,
        global_path: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut sources = Vec::new();
        let mut merged = PublisherConfig::default();

        let global = match global_path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_global(),
        };

        if let Some(path) = global {
            let config = Self::read_config(&path)?;
            config.validate()?;
            tracing::debug!(path = %path.display(), "loaded global config");
            merged = merged.merged_with(config);
            sources.push(path);
        }

        if let Some(root) = repo_root {
            let path = Self::repo_config_path(root);
            if path.exists() {
                let config = Self::read_config(&path)?;
                config.validate()?;
                tracing::debug!(path = %path.display(), "loaded repo config");
                merged = merged.merged_with(config);
                sources.push(path);
            }
        }

        Ok(ConfigLoadResult {
            config: Config { merged },
            sources,
        })
    }

    fn find_global() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("GHPAGES_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("ghpages/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".ghpages/config.toml"))
            .filter(|path| path.exists())
    }

    fn read_config(path: &Path) -> Result<PublisherConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Path of the repository config for a working copy root.
    pub fn repo_config_path(repo_root: &Path) -> PathBuf {
        repo_root.join(REPO_CONFIG_FILE)
    }

    /// Write the repository config atomically.
    ///
    /// Writes to a temp file next to the target, then renames it into place.
    pub fn write_repo(repo_root: &Path, config: &PublisherConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;

        let path = Self::repo_config_path(repo_root);
        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;
        file.write_all(contents.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        fs::rename(&temp_path, &path).map_err(|e| ConfigError::WriteError {
            path: path.clone(),
            source: e,
        })?;

        Ok(path)
    }

    /// The merged configuration.
    pub fn publisher(&self) -> &PublisherConfig {
        &self.merged
    }

    /// Apply CLI overrides on top of file configuration.
    pub fn with_overrides(self, overrides: PublisherConfig) -> Result<Self, ConfigError> {
        let merged = self.merged.merged_with(overrides);
        merged.validate()?;
        Ok(Self { merged })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_files_give_defaults() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.toml");
        fs::write(&global, "").unwrap();

        let result = Config::load(Some(dir.path()), Some(&global)).unwrap();
        assert_eq!(result.config.publisher(), &PublisherConfig::default());
        assert_eq!(result.sources, vec![global]);
    }

    #[test]
    fn explicit_global_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::load(None, Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn repo_overrides_global() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.toml");
        fs::write(&global, "branch = \"gh-pages\"\nout_dir = \"global\"\n").unwrap();
        fs::write(dir.path().join(REPO_CONFIG_FILE), "out_dir = \"repo\"\n").unwrap();

        let result = Config::load(Some(dir.path()), Some(&global)).unwrap();
        let config = result.config.publisher();
        assert_eq!(config.branch.as_deref(), Some("gh-pages"));
        assert_eq!(config.out_dir.as_deref(), Some("repo"));
        assert_eq!(result.sources.len(), 2);
    }

    #[test]
    fn parse_error_reports_path() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.toml");
        fs::write(&global, "branch = [").unwrap();

        let err = Config::load(None, Some(&global)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { path, .. } if path == global));
    }

    #[test]
    fn invalid_values_rejected_on_load() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.toml");
        fs::write(&global, "").unwrap();
        fs::write(dir.path().join(REPO_CONFIG_FILE), "branch = \"a..b\"\n").unwrap();

        let err = Config::load(Some(dir.path()), Some(&global)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn write_repo_round_trips() {
        let dir = TempDir::new().unwrap();
        let config = PublisherConfig {
            branch: Some("gh-pages".into()),
            out_dir: Some("reports".into()),
            ..Default::default()
        };

        let path = Config::write_repo(dir.path(), &config).unwrap();
        assert_eq!(path, dir.path().join(REPO_CONFIG_FILE));
        assert!(!dir.path().join(".ghpages.toml.tmp").exists());

        let contents = fs::read_to_string(&path).unwrap();
        let parsed: PublisherConfig = toml::from_str(&contents).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn overrides_apply_last() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.toml");
        fs::write(&global, "").unwrap();
        fs::write(dir.path().join(REPO_CONFIG_FILE), "branch = \"gh-pages\"\n").unwrap();

        let config = Config::load(Some(dir.path()), Some(&global))
            .unwrap()
            .config
            .with_overrides(PublisherConfig {
                branch: Some("pages".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(config.publisher().branch.as_deref(), Some("pages"));
    }
}
