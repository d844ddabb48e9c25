//! git::remote
//!
//! Repository identity resolution.
//!
//! The `owner/repo` pair is taken from `GITHUB_REPOSITORY` when it is set and
//! well-formed, otherwise from the URL of the configured remote. Both SSH
//! (`git@github.com:owner/repo.git`) and HTTPS
//! (`https://github.com/owner/repo.git`) remote forms are recognised; the
//! `.git` suffix is optional.

use std::path::Path;

use super::Repository;
use crate::core::env::DeployEnv;
use crate::core::types::RepoIdentity;

/// Remote consulted when the environment does not name the repository.
pub const DEFAULT_REMOTE: &str = "origin";

const GITHUB_HOST: &str = "github.com";

/// Parse a GitHub remote URL into a repository identity.
///
/// Matches `github.com[:/]owner/repo[.git]` at the end of the URL, so
/// credentials or an `ssh://` scheme in front of the host are accepted.
///
/// # Example
///
/// ```
/// use ghpages_deploy::git::parse_github_remote;
///
/// let id = parse_github_remote("git@github.com:octocat/hello-world.git").unwrap();
/// assert_eq!((id.owner.as_str(), id.repo.as_str()), ("octocat", "hello-world"));
///
/// let id = parse_github_remote("https://github.com/octocat/hello-world").unwrap();
/// assert_eq!(id.repo, "hello-world");
///
/// assert!(parse_github_remote("https://gitlab.com/octocat/hello-world.git").is_none());
/// ```
pub fn parse_github_remote(url: &str) -> Option<RepoIdentity> {
    url.match_indices(GITHUB_HOST).find_map(|(idx, _)| {
        let rest = &url[idx + GITHUB_HOST.len()..];
        let path = rest.strip_prefix(':').or_else(|| rest.strip_prefix('/'))?;
        parse_owner_repo(path)
    })
}

/// Parse "owner/repo.git" or "owner/repo" into an identity.
fn parse_owner_repo(path: &str) -> Option<RepoIdentity> {
    let (owner, repo) = path.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }

    let repo = match repo.strip_suffix(".git") {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => repo,
    };

    Some(RepoIdentity::new(owner, repo))
}

/// Resolves the repository identity for one invocation.
#[derive(Debug, Clone)]
pub struct RepoInfoResolver {
    remote: String,
}

impl Default for RepoInfoResolver {
    fn default() -> Self {
        Self::new(DEFAULT_REMOTE)
    }
}

impl RepoInfoResolver {
    /// Resolver that falls back to the URL of `remote`.
    pub fn new(remote: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
        }
    }

    /// Resolve from the environment, then from `remote_url`.
    ///
    /// `remote_url` is only consulted when the environment gives no answer.
    pub fn resolve_with<F>(&self, env: &DeployEnv, remote_url: F) -> Option<RepoIdentity>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        if let Some(identity) = env.repository_identity() {
            tracing::debug!(%identity, "repository identity from GITHUB_REPOSITORY");
            return Some(identity);
        }

        let url = remote_url(&self.remote)?;
        let identity = parse_github_remote(&url);
        match &identity {
            Some(identity) => {
                tracing::debug!(%identity, remote = %self.remote, "repository identity from remote");
            }
            None => {
                tracing::debug!(url = %url, "remote URL is not a GitHub repository");
            }
        }
        identity
    }

    /// Resolve using the repository containing `work_dir`.
    ///
    /// A missing repository or remote yields `None`, not an error.
    pub fn resolve(&self, env: &DeployEnv, work_dir: &Path) -> Option<RepoIdentity> {
        self.resolve_with(env, |remote| {
            Repository::open(work_dir)
                .and_then(|repo| repo.remote_url(remote))
                .ok()
                .flatten()
        })
    }
}
