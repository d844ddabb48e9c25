//! deploy::transaction
//!
//! The worktree deployment transaction.
//!
//! # Lifecycle
//!
//! 1. Validate options (no side effects before this passes)
//! 2. Remove a staging worktree left behind by a crashed run
//! 3. Check out the target branch, or an empty orphan branch, in the
//!    staging worktree
//! 4. Commit as the CI actor through per-command environment, leaving every
//!    git config file untouched
//! 5. Rename the source directory into place and stage everything
//! 6. If nothing changed, move the content back and stop
//! 7. Commit, push (with one rebase retry), optionally deploy the artifact
//! 8. Move the content back
//!
//! # Invariants
//!
//! Once [`WorktreeTransaction::run`] settles, whatever the outcome:
//! - the content is back at the source directory
//! - the staging worktree is unregistered and its directory is gone
//!
//! Both are enforced by [`StagingGuard`], whose `Drop` runs on every exit
//! path. Cleanup failures are logged, never raised, so they cannot mask the
//! error that caused the early exit.
//!
//! # Concurrency
//!
//! The staging directory name is fixed per working copy. Callers must not
//! run two transactions against the same repository at once.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use super::push::{PushOutcome, PushReconciler};
use super::state::WorktreeState;
use super::DeployError;
use crate::core::env::DeployEnv;
use crate::core::types::{BranchName, RepoIdentity};
use crate::git::{CommandRunner, GitCommand, DEFAULT_REMOTE};
use crate::pages::{ArtifactDeployer, PagesDeployment};

/// Staging worktree directory, relative to the repository working copy.
pub const STAGING_DIR: &str = ".gh-pages-worktree";

/// What to deploy and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOptions {
    /// Branch receiving the content
    pub branch: BranchName,
    /// Directory whose content is published (relative paths resolve against
    /// the repository root)
    pub source_dir: PathBuf,
    /// Relative path inside the branch that receives the content
    pub target_dir: String,
    /// Commit message, used verbatim
    pub commit_message: String,
    /// Also deploy through an Actions artifact and the Pages API
    pub artifact_deploy: bool,
    /// Repository identity, required for artifact deployment
    pub repo_info: Option<RepoIdentity>,
}

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// The branch already held identical content; nothing was committed.
    Unchanged,
    /// A commit was pushed.
    Published {
        push: PushOutcome,
        /// Present when artifact deployment ran
        pages: Option<PagesDeployment>,
    },
}

/// Orchestrates one isolated-worktree deployment.
pub struct WorktreeTransaction {
    runner: Arc<dyn CommandRunner>,
    env: DeployEnv,
    repo_root: PathBuf,
    artifact_deployer: Option<ArtifactDeployer>,
}

impl WorktreeTransaction {
    /// Transaction over the working copy at `repo_root`.
    pub fn new(runner: Arc<dyn CommandRunner>, env: DeployEnv, repo_root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            env,
            repo_root: repo_root.into(),
            artifact_deployer: None,
        }
    }

    /// Deployer used when options request artifact deployment.
    pub fn with_artifact_deployer(mut self, deployer: ArtifactDeployer) -> Self {
        self.artifact_deployer = Some(deployer);
        self
    }

    /// Absolute path of the staging worktree.
    pub fn staging_dir(&self) -> PathBuf {
        self.repo_root.join(STAGING_DIR)
    }

    fn resolve_source(&self, source_dir: &Path) -> PathBuf {
        if source_dir.is_absolute() {
            source_dir.to_path_buf()
        } else {
            self.repo_root.join(source_dir)
        }
    }

    /// Check every precondition; returns the artifact deployer when one will run.
    fn validate<'a>(
        &'a self,
        options: &'a DeployOptions,
    ) -> Result<Option<(&'a ArtifactDeployer, &'a RepoIdentity)>, DeployError> {
        let target = Path::new(&options.target_dir);
        // "." and "./" name the worktree root itself
        if target.components().all(|c| c == Component::CurDir) {
            return Err(DeployError::Validation("target_dir is required".into()));
        }

        if target.is_absolute()
            || target
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(DeployError::Validation(format!(
                "target_dir must stay inside the branch: '{}'",
                options.target_dir
            )));
        }

        if !options.artifact_deploy {
            return Ok(None);
        }

        if !self.env.github_actions {
            return Err(DeployError::Configuration(
                "artifact deployment is only available in GitHub Actions".into(),
            ));
        }
        let repo = options.repo_info.as_ref().ok_or_else(|| {
            DeployError::Configuration("repository identity is required for artifact deployment".into())
        })?;
        let deployer = self.artifact_deployer.as_ref().ok_or_else(|| {
            DeployError::Configuration("no artifact deployer configured".into())
        })?;

        Ok(Some((deployer, repo)))
    }

    /// Run the deployment.
    ///
    /// # Errors
    ///
    /// - [`DeployError::Validation`] / [`DeployError::Configuration`] before
    ///   any side effect
    /// - [`DeployError::Git`] when a git command fails
    /// - [`DeployError::PushConflictExhausted`] when the retried push fails
    /// - [`DeployError::Pages`] when artifact deployment fails
    /// - [`DeployError::Io`] when moving content fails
    ///
    /// In every case the content is back at the source directory and the
    /// staging worktree is removed before the error is returned.
    pub async fn run(&self, options: &DeployOptions) -> Result<DeployOutcome, DeployError> {
        let artifact = self.validate(options)?;

        let source = self.resolve_source(&options.source_dir);
        if !source.is_dir() {
            return Err(DeployError::Validation(format!(
                "source directory does not exist: {}",
                source.display()
            )));
        }

        let staging = self.staging_dir();
        let runner = self.runner.as_ref();
        let branch = &options.branch;

        tracing::info!(
            %branch,
            source = %source.display(),
            target = %options.target_dir,
            "deploying"
        );

        if staging.exists() {
            tracing::warn!(path = %staging.display(), "removing staging worktree left by a previous run");
            if let Err(e) = runner.run(&remove_worktree(&staging), None) {
                // Not a registered worktree: clear the directory and any stale registration
                tracing::debug!(error = %e, "staging directory is not a worktree");
                fs::remove_dir_all(&staging).map_err(|e| {
                    DeployError::io(format!("failed to clear {}", staging.display()), e)
                })?;
                runner.run(&GitCommand::new(["worktree", "prune"]), None)?;
            }
        }

        let mut guard = StagingGuard {
            runner,
            staging: staging.clone(),
            source: source.clone(),
            dest: staging.join(&options.target_dir),
            state: WorktreeState::Absent,
        };

        if self.remote_branch_exists(branch) {
            tracing::debug!(%branch, "branch exists on remote, checking it out");
            runner.run(&GitCommand::new(["fetch", DEFAULT_REMOTE, branch.as_str()]), None)?;
            runner.run(
                &GitCommand::new(["worktree", "add"])
                    .path_arg(&staging)
                    .arg(branch.remote_ref(DEFAULT_REMOTE)),
                None,
            )?;
            guard.advance(WorktreeState::Created);
            runner.run(&GitCommand::new(["checkout", "-B", branch.as_str()]), Some(&staging))?;
        } else {
            tracing::debug!(%branch, "branch missing on remote, creating orphan branch");
            runner.run(&GitCommand::new(["worktree", "add", "--detach"]).path_arg(&staging), None)?;
            guard.advance(WorktreeState::Created);
            runner.run(&GitCommand::new(["checkout", "--orphan", branch.as_str()]), Some(&staging))?;
            runner.run(&GitCommand::new(["rm", "-rf", "."]), Some(&staging))?;
        }

        let identity = self.env.commit_identity();

        guard.stage_content()?;
        runner.run(&GitCommand::new(["add", "-A"]), Some(&staging))?;

        // Exit status 0 means the index matches HEAD
        if runner
            .run(&GitCommand::new(["diff", "--cached", "--quiet"]), Some(&staging))
            .is_ok()
        {
            guard.advance(WorktreeState::SkippedNoChange);
            guard.restore_content()?;
            tracing::info!(%branch, "no changes to deploy");
            return Ok(DeployOutcome::Unchanged);
        }

        runner.run(
            &GitCommand::new(["commit", "-m"])
                .quoted(&options.commit_message)
                .identity(&identity),
            Some(&staging),
        )?;
        guard.advance(WorktreeState::Committed);

        let push = PushReconciler::new(runner, DEFAULT_REMOTE)
            .with_identity(&identity)
            .push(branch, &staging)?;
        guard.advance(match push {
            PushOutcome::Direct => WorktreeState::PushedDirectly,
            PushOutcome::AfterRebase => WorktreeState::PushedAfterRebase,
        });
        tracing::info!(%branch, ?push, "pushed");

        let pages = match artifact {
            Some((deployer, repo)) => {
                let archive = deployer.package(&staging)?;
                let artifact_id = deployer.upload(&archive).await?;
                guard.advance(WorktreeState::ArtifactUploaded);
                let deployment = deployer.request_deployment(artifact_id, repo).await?;
                guard.advance(WorktreeState::PagesDeployed);
                drop(archive);
                Some(deployment)
            }
            None => None,
        };

        guard.restore_content()?;
        Ok(DeployOutcome::Published { push, pages })
    }

    /// Whether `branch` exists on the remote, without fetching it.
    ///
    /// A failing lookup counts as "missing", which leads to a fresh orphan
    /// branch. A transient network error can therefore replace the branch
    /// history on the next push; it is kept for compatibility with existing
    /// pages workflows.
    fn remote_branch_exists(&self, branch: &BranchName) -> bool {
        let cmd = GitCommand::new(["ls-remote", "--heads", DEFAULT_REMOTE, branch.as_str()]);
        match self.runner.run(&cmd, None) {
            Ok(out) => !out.is_empty(),
            Err(e) => {
                tracing::warn!(%branch, error = %e, "remote branch lookup failed, treating branch as missing");
                false
            }
        }
    }
}

fn remove_worktree(staging: &Path) -> GitCommand {
    GitCommand::new(["worktree", "remove", "--force"]).path_arg(staging)
}

/// Owns the staging worktree and the moved content for one run.
struct StagingGuard<'a> {
    runner: &'a dyn CommandRunner,
    staging: PathBuf,
    source: PathBuf,
    dest: PathBuf,
    state: WorktreeState,
}

impl StagingGuard<'_> {
    fn advance(&mut self, next: WorktreeState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal worktree transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "worktree state");
        self.state = next;
    }

    /// Rename the source directory into the staging worktree.
    fn stage_content(&mut self) -> Result<(), DeployError> {
        if let Some(parent) = self.dest.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    DeployError::io(format!("failed to create {}", parent.display()), e)
                })?;
            }
        }

        // Whatever occupies the target path is replaced
        if let Ok(meta) = fs::symlink_metadata(&self.dest) {
            let cleared = if meta.is_dir() {
                fs::remove_dir_all(&self.dest)
            } else {
                fs::remove_file(&self.dest)
            };
            cleared.map_err(|e| {
                DeployError::io(format!("failed to clear {}", self.dest.display()), e)
            })?;
        }

        fs::rename(&self.source, &self.dest).map_err(|e| {
            DeployError::io(
                format!(
                    "failed to move {} to {}",
                    self.source.display(),
                    self.dest.display()
                ),
                e,
            )
        })?;
        self.advance(WorktreeState::ContentStaged);
        Ok(())
    }

    /// Move the content back to the source directory.
    fn restore_content(&mut self) -> Result<(), DeployError> {
        fs::rename(&self.dest, &self.source).map_err(|e| {
            DeployError::io(
                format!(
                    "failed to move {} back to {}",
                    self.dest.display(),
                    self.source.display()
                ),
                e,
            )
        })?;
        self.advance(WorktreeState::Restored);
        Ok(())
    }
}

impl Drop for StagingGuard<'_> {
    fn drop(&mut self) {
        if self.state.content_moved() && self.dest.exists() {
            match fs::rename(&self.dest, &self.source) {
                Ok(()) => {
                    tracing::debug!(state = %self.state, "restored content during cleanup");
                    self.state = WorktreeState::Restored;
                }
                Err(e) => tracing::warn!(
                    error = %e,
                    path = %self.dest.display(),
                    "failed to restore content during cleanup"
                ),
            }
        }

        if self.staging.exists() {
            if let Err(e) = self.runner.run(&remove_worktree(&self.staging), None) {
                tracing::warn!(error = %e, "failed to remove staging worktree during cleanup");
                return;
            }
        }
        self.state = WorktreeState::Removed;
    }
}
