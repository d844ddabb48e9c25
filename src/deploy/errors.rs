//! deploy::errors
//!
//! Error taxonomy of a deployment.

use thiserror::Error;

use crate::git::GitError;
use crate::pages::PagesError;

/// Errors surfaced by [`WorktreeTransaction::run`](super::WorktreeTransaction::run).
///
/// Every variant is returned only after finalization has restored content
/// and removed the staging worktree.
#[derive(Debug, Error)]
pub enum DeployError {
    /// A required option is missing or malformed. Nothing was touched.
    #[error("invalid deploy options: {0}")]
    Validation(String),

    /// Artifact deployment requested outside GitHub Actions or without a
    /// repository identity. Nothing was touched.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A git command failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// The push was rejected again after rebasing onto the remote branch.
    #[error("push to '{branch}' still rejected after rebase")]
    PushConflictExhausted {
        /// Branch being pushed
        branch: String,
        /// Failure of the second push
        #[source]
        source: GitError,
    },

    /// Artifact packaging, upload or Pages deployment failed.
    #[error(transparent)]
    Pages(#[from] PagesError),

    /// A filesystem operation on the content or staging directory failed.
    #[error("{context}")]
    Io {
        /// What was being attempted
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl DeployError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        DeployError::Io {
            context: context.into(),
            source,
        }
    }
}
