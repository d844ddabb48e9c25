//! core::config::schema
//!
//! Configuration schema types.
//!
//! The same schema is used for the global file and the repository file; the
//! repository file overrides the global one key by key.
//!
//! # Validation
//!
//! Config values are validated after parsing (e.g., `branch` must be a valid
//! branch name, `out_dir` must be relative).

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// Publisher configuration.
///
/// # Example
///
/// ```toml
/// branch = "gh-pages"
/// out_dir = "reports"
/// include_commit_hash = true
/// commit_message = "deploy visual report"
/// artifact_deploy = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PublisherConfig {
    /// Branch to deploy to. Without it only the report URL is computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Directory on the branch that receives the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,

    /// Directory to publish (defaults to the working directory base)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<String>,

    /// Commit message (defaults to `deploy: <key>`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,

    /// Append the publish key to the target directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_commit_hash: Option<bool>,

    /// Report path or absolute URL overriding the computed report location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,

    /// Deploy through an Actions artifact and the Pages API as well
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_deploy: Option<bool>,
}

impl PublisherConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(branch) = &self.branch {
            BranchName::new(branch.as_str())
                .map_err(|e| ConfigError::InvalidValue(format!("invalid branch: {}", e)))?;
        }

        if let Some(out_dir) = &self.out_dir {
            let path = Path::new(out_dir);
            if path.is_absolute() || path.components().any(|c| c == Component::ParentDir) {
                return Err(ConfigError::InvalidValue(format!(
                    "out_dir must be a relative path inside the branch: '{}'",
                    out_dir
                )));
            }
        }

        Ok(())
    }

    /// Overlay `other` on top of `self`; keys set in `other` win.
    pub fn merged_with(self, other: PublisherConfig) -> PublisherConfig {
        PublisherConfig {
            branch: other.branch.or(self.branch),
            out_dir: other.out_dir.or(self.out_dir),
            source_dir: other.source_dir.or(self.source_dir),
            commit_message: other.commit_message.or(self.commit_message),
            include_commit_hash: other.include_commit_hash.or(self.include_commit_hash),
            report_path: other.report_path.or(self.report_path),
            artifact_deploy: other.artifact_deploy.or(self.artifact_deploy),
        }
    }
}
