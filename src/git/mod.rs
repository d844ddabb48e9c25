//! git
//!
//! Git access for the deployment.
//!
//! # Architecture
//!
//! - [`Repository`] (git2) answers read-only questions: where the git
//!   directory is, what a remote points at.
//! - [`CommandRunner`] executes mutating commands (`worktree`, `fetch`,
//!   `commit`, `push`) through the `git` binary, so they honor the user's
//!   credential helpers and hooks configuration.
//! - [`RepoInfoResolver`] turns the environment or a remote URL into an
//!   `owner/repo` identity.
//!
//! # Invariants
//!
//! - Commands run strictly in sequence; no runner call is made concurrently
//!   from within one deployment
//! - Every failure carries the rendered command line

mod interface;
pub mod mock;
mod remote;
mod runner;

pub use interface::{GitError, RepoInfo, Repository};
pub use remote::{parse_github_remote, RepoInfoResolver, DEFAULT_REMOTE};
pub use runner::{escape_double_quotes, CommandRunner, GitCli, GitCommand};
