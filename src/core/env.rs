//! core::env
//!
//! Process environment captured once per invocation.
//!
//! # Design
//!
//! Every environment variable the deployment reads is collected into a
//! [`DeployEnv`] at the start of a run and passed down explicitly. Nothing
//! below the CLI layer calls `std::env::var`, so transactions can be driven
//! from tests with a hand-built environment.
//!
//! Empty values are treated the same as unset ones.
//!
//! # Example
//!
//! ```
//! use ghpages_deploy::core::env::DeployEnv;
//!
//! let env = DeployEnv::from_lookup(|key| match key {
//!     "GITHUB_ACTIONS" => Some("true".to_string()),
//!     "GITHUB_ACTOR" => Some("octocat".to_string()),
//!     _ => None,
//! });
//!
//! assert!(env.github_actions);
//! assert_eq!(env.commit_identity().name, "octocat");
//! assert_eq!(env.pages_build_version(), "unknown");
//! ```

use std::path::PathBuf;

use crate::core::types::{CommitIdentity, RepoIdentity};

/// Fallback when `RUNNER_TEMP` is not set.
const DEFAULT_TEMP_DIR: &str = "/tmp";

/// Build version reported when `GITHUB_SHA` is not set.
const UNKNOWN_BUILD_VERSION: &str = "unknown";

/// Environment values read by a deployment.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DeployEnv {
    /// `GITHUB_ACTOR`: login of the user that triggered the workflow
    pub actor: Option<String>,
    /// `GITHUB_ACTIONS`: whether we run inside GitHub Actions
    pub github_actions: bool,
    /// `GITHUB_TOKEN`: bearer token for the Pages API
    pub github_token: Option<String>,
    /// `GITHUB_SHA`: commit being built
    pub github_sha: Option<String>,
    /// `RUNNER_TEMP`: scratch directory of the runner
    pub runner_temp: Option<PathBuf>,
    /// `GITHUB_REPOSITORY`: `owner/repo` slug
    pub repository: Option<String>,
    /// `ACTIONS_ID_TOKEN_REQUEST_URL`: OIDC token endpoint
    pub id_token_request_url: Option<String>,
    /// `ACTIONS_ID_TOKEN_REQUEST_TOKEN`: bearer for the OIDC endpoint
    pub id_token_request_token: Option<String>,
    /// `ACTIONS_RUNTIME_TOKEN`: bearer for the artifact service
    pub runtime_token: Option<String>,
    /// `ACTIONS_RESULTS_URL`: base URL of the artifact service
    pub results_url: Option<String>,
}

// Tokens must never reach logs.
impl std::fmt::Debug for DeployEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployEnv")
            .field("actor", &self.actor)
            .field("github_actions", &self.github_actions)
            .field("has_github_token", &self.github_token.is_some())
            .field("github_sha", &self.github_sha)
            .field("runner_temp", &self.runner_temp)
            .field("repository", &self.repository)
            .field("id_token_request_url", &self.id_token_request_url)
            .field("has_id_token_request_token", &self.id_token_request_token.is_some())
            .field("has_runtime_token", &self.runtime_token.is_some())
            .field("results_url", &self.results_url)
            .finish()
    }
}

impl DeployEnv {
    /// Capture the current process environment.
    pub fn from_process() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build an environment from an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Self {
            actor: get("GITHUB_ACTOR"),
            github_actions: get("GITHUB_ACTIONS").is_some(),
            github_token: get("GITHUB_TOKEN"),
            github_sha: get("GITHUB_SHA"),
            runner_temp: get("RUNNER_TEMP").map(PathBuf::from),
            repository: get("GITHUB_REPOSITORY"),
            id_token_request_url: get("ACTIONS_ID_TOKEN_REQUEST_URL"),
            id_token_request_token: get("ACTIONS_ID_TOKEN_REQUEST_TOKEN"),
            runtime_token: get("ACTIONS_RUNTIME_TOKEN"),
            results_url: get("ACTIONS_RESULTS_URL"),
        }
    }

    /// Commit identity for the staging worktree.
    pub fn commit_identity(&self) -> CommitIdentity {
        CommitIdentity::from_actor(self.actor.as_deref())
    }

    /// Directory where temporary archives are written.
    pub fn temp_dir(&self) -> PathBuf {
        self.runner_temp
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMP_DIR))
    }

    /// Value sent as `pages_build_version`.
    pub fn pages_build_version(&self) -> &str {
        self.github_sha.as_deref().unwrap_or(UNKNOWN_BUILD_VERSION)
    }

    /// Repository identity from `GITHUB_REPOSITORY`, if well-formed.
    pub fn repository_identity(&self) -> Option<RepoIdentity> {
        self.repository
            .as_deref()
            .and_then(|slug| RepoIdentity::from_slug(slug).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> DeployEnv {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DeployEnv::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_defaults() {
        let env = env_from(&[]);
        assert!(!env.github_actions);
        assert_eq!(env.temp_dir(), PathBuf::from("/tmp"));
        assert_eq!(env.pages_build_version(), "unknown");
        assert_eq!(env.commit_identity().name, "github-actions[bot]");
        assert!(env.repository_identity().is_none());
    }

    #[test]
    fn empty_values_count_as_unset() {
        let env = env_from(&[("GITHUB_ACTIONS", ""), ("GITHUB_ACTOR", "")]);
        assert!(!env.github_actions);
        assert!(env.actor.is_none());
    }

    #[test]
    fn reads_actions_variables() {
        let env = env_from(&[
            ("GITHUB_ACTIONS", "true"),
            ("GITHUB_ACTOR", "octocat"),
            ("GITHUB_SHA", "abc123"),
            ("RUNNER_TEMP", "/runner/tmp"),
            ("GITHUB_REPOSITORY", "octocat/site"),
        ]);

        assert!(env.github_actions);
        assert_eq!(env.pages_build_version(), "abc123");
        assert_eq!(env.temp_dir(), PathBuf::from("/runner/tmp"));
        assert_eq!(
            env.repository_identity(),
            Some(RepoIdentity::new("octocat", "site"))
        );
        assert_eq!(
            env.commit_identity().email,
            "octocat@users.noreply.github.com"
        );
    }

    #[test]
    fn malformed_repository_slug_ignored() {
        let env = env_from(&[("GITHUB_REPOSITORY", "no-slash")]);
        assert!(env.repository_identity().is_none());
    }

    #[test]
    fn debug_redacts_tokens() {
        let env = env_from(&[
            ("GITHUB_TOKEN", "ghs_secret"),
            ("ACTIONS_RUNTIME_TOKEN", "runtime_secret"),
            ("ACTIONS_ID_TOKEN_REQUEST_TOKEN", "oidc_secret"),
        ]);
        let debug = format!("{:?}", env);
        assert!(!debug.contains("ghs_secret"));
        assert!(!debug.contains("runtime_secret"));
        assert!(!debug.contains("oidc_secret"));
        assert!(debug.contains("has_github_token: true"));
    }
}
