//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`RepoIdentity`] - GitHub `owner/repo` pair
//! - [`CommitIdentity`] - Author identity of deployment commits
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so a branch name that reaches a git command line
//! has already passed Git's refname rules.
//!
//! # Examples
//!
//! ```
//! use ghpages_deploy::core::types::{BranchName, RepoIdentity};
//!
//! let branch = BranchName::new("gh-pages").unwrap();
//! assert_eq!(branch.as_str(), "gh-pages");
//!
//! let repo = RepoIdentity::from_slug("octocat/hello-world").unwrap();
//! assert_eq!(repo.owner, "octocat");
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid repository slug: {0}")]
    InvalidRepoSlug(String),
}

/// A validated Git branch name.
///
/// Branch names must conform to Git's refname rules (see `git check-ref-format`):
/// - Cannot be empty
/// - Cannot start with `.` or `-`
/// - Cannot end with `.lock` or `/`
/// - Cannot contain `..`, `@{`, `//`, or ASCII control characters
/// - Cannot contain spaces, `~`, `^`, `:`, `\`, `?`, `*`, `[`
/// - Cannot be exactly `@`
///
/// # Example
///
/// ```
/// use ghpages_deploy::core::types::BranchName;
///
/// let name = BranchName::new("gh-pages").unwrap();
/// assert_eq!(name.as_str(), "gh-pages");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("-pages").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be empty".into(),
            ));
        }

        if name == "@" {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be '@' (reserved)".into(),
            ));
        }

        // A leading '-' would be parsed as an option by git
        if name.starts_with('-') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot start with '-'".into(),
            ));
        }

        if name.ends_with('/') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot end with '/'".into(),
            ));
        }

        for pattern in ["..", "@{", "//"] {
            if name.contains(pattern) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{pattern}'"
                )));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        for c in INVALID_CHARS {
            if name.contains(c) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{c}'"
                )));
            }
        }

        if name.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot contain control characters".into(),
            ));
        }

        for component in name.split('/').filter(|c| !c.is_empty()) {
            if component.starts_with('.') {
                return Err(TypeError::InvalidBranchName(
                    "path component cannot start with '.'".into(),
                ));
            }
            if component.ends_with(".lock") {
                return Err(TypeError::InvalidBranchName(
                    "path component cannot end with '.lock'".into(),
                ));
            }
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the remote-tracking ref for this branch on `remote`.
    pub fn remote_ref(&self, remote: &str) -> String {
        format!("{}/{}", remote, self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A GitHub repository identity.
///
/// Resolved once per invocation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoIdentity {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
}

impl RepoIdentity {
    /// Create an identity from its two halves.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parse an `owner/repo` slug as found in `GITHUB_REPOSITORY`.
    ///
    /// Only the first two `/`-separated segments are considered; both must
    /// be non-empty.
    ///
    /// # Example
    ///
    /// ```
    /// use ghpages_deploy::core::types::RepoIdentity;
    ///
    /// assert!(RepoIdentity::from_slug("octocat/hello").is_ok());
    /// assert!(RepoIdentity::from_slug("octocat/").is_err());
    /// assert!(RepoIdentity::from_slug("octocat").is_err());
    /// ```
    pub fn from_slug(slug: &str) -> Result<Self, TypeError> {
        let mut parts = slug.split('/');
        match (parts.next(), parts.next()) {
            (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => {
                Ok(Self::new(owner, repo))
            }
            _ => Err(TypeError::InvalidRepoSlug(slug.to_string())),
        }
    }
}

impl std::fmt::Display for RepoIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Commit author identity used inside the staging worktree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

impl CommitIdentity {
    /// Fallback identity when no CI actor is known.
    pub const BOT_NAME: &'static str = "github-actions[bot]";

    /// Derive the identity from an optional CI actor login.
    ///
    /// Matches what `actions-gh-pages` configures: the actor and its noreply
    /// address, or the Actions bot.
    ///
    /// # Example
    ///
    /// ```
    /// use ghpages_deploy::core::types::CommitIdentity;
    ///
    /// let id = CommitIdentity::from_actor(Some("octocat"));
    /// assert_eq!(id.email, "octocat@users.noreply.github.com");
    ///
    /// let bot = CommitIdentity::from_actor(None);
    /// assert_eq!(bot.name, "github-actions[bot]");
    /// ```
    pub fn from_actor(actor: Option<&str>) -> Self {
        let name = actor.unwrap_or(Self::BOT_NAME);
        Self {
            name: name.to_string(),
            email: format!("{}@users.noreply.github.com", name),
        }
    }
}
