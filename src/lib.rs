//! ghpages-deploy - Publish generated report directories to a GitHub Pages branch
//!
//! The crate moves a generated directory into an isolated git worktree checked
//! out on a pages branch, commits it, pushes it, and moves the directory back.
//! The caller's own checkout is never touched. An alternate path uploads the
//! same content as an Actions artifact and asks the Pages API to deploy it.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to publisher)
//! - [`publisher`] - Target path and report URL computation, deployment delegation
//! - [`deploy`] - The worktree transaction and push reconciliation
//! - [`pages`] - Artifact packaging, upload, OIDC and Pages deployment API
//! - [`git`] - Command runner and repository identity resolution
//! - [`core`] - Domain types, environment capture, configuration, locking
//!
//! # Correctness Invariants
//!
//! 1. Content taken from the source directory is back in place once a
//!    deployment settles, whatever the outcome
//! 2. The staging worktree is unregistered once a deployment settles
//! 3. Invalid options fail before any command runs

pub mod cli;
pub mod core;
pub mod deploy;
pub mod git;
pub mod pages;
pub mod publisher;
