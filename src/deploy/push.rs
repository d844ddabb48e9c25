//! deploy::push
//!
//! Push with a single rebase retry.
//!
//! When the remote branch moved between fetch and push (another job
//! deployed concurrently), the first push is rejected. The reconciler pulls
//! with rebase and pushes once more. A persistent conflict therefore costs at
//! most two pushes and one rebase.

use std::path::Path;

use super::DeployError;
use crate::core::types::{BranchName, CommitIdentity};
use crate::git::{CommandRunner, GitCommand};

/// How a push went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Accepted on the first attempt.
    Direct,
    /// Accepted after rebasing onto the remote branch.
    AfterRebase,
}

/// Push/retry-on-conflict policy.
pub struct PushReconciler<'a> {
    runner: &'a dyn CommandRunner,
    remote: &'a str,
    identity: Option<&'a CommitIdentity>,
}

impl<'a> PushReconciler<'a> {
    pub fn new(runner: &'a dyn CommandRunner, remote: &'a str) -> Self {
        Self {
            runner,
            remote,
            identity: None,
        }
    }

    /// Identity for the commits the rebase rewrites.
    pub fn with_identity(mut self, identity: &'a CommitIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Push `branch` from `working_dir`.
    ///
    /// # Errors
    ///
    /// - [`DeployError::Git`] if the rebase pull fails
    /// - [`DeployError::PushConflictExhausted`] if the retried push fails
    pub fn push(&self, branch: &BranchName, working_dir: &Path) -> Result<PushOutcome, DeployError> {
        let push = GitCommand::new(["push", self.remote, branch.as_str()]);

        let first = match self.runner.run(&push, Some(working_dir)) {
            Ok(_) => return Ok(PushOutcome::Direct),
            Err(e) => e,
        };
        tracing::warn!(%branch, error = %first, "push rejected, rebasing onto remote and retrying");

        let mut pull = GitCommand::new(["pull", "--rebase", self.remote, branch.as_str()]);
        if let Some(identity) = self.identity {
            pull = pull.identity(identity);
        }
        self.runner.run(&pull, Some(working_dir))?;

        self.runner
            .run(&push, Some(working_dir))
            .map_err(|source| DeployError::PushConflictExhausted {
                branch: branch.to_string(),
                source,
            })?;

        Ok(PushOutcome::AfterRebase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::MockRunner;

    fn branch() -> BranchName {
        BranchName::new("gh-pages").unwrap()
    }

    #[test]
    fn first_push_succeeds() {
        let runner = MockRunner::without_worktree_emulation();
        let outcome = PushReconciler::new(&runner, "origin")
            .push(&branch(), Path::new("/wt"))
            .unwrap();

        assert_eq!(outcome, PushOutcome::Direct);
        assert_eq!(runner.lines(), vec!["git push origin gh-pages"]);
    }

    #[test]
    fn retries_once_after_rebase() {
        let runner = MockRunner::without_worktree_emulation();
        runner.fail_times("git push", 1);

        let outcome = PushReconciler::new(&runner, "origin")
            .push(&branch(), Path::new("/wt"))
            .unwrap();

        assert_eq!(outcome, PushOutcome::AfterRebase);
        assert_eq!(
            runner.lines(),
            vec![
                "git push origin gh-pages",
                "git pull --rebase origin gh-pages",
                "git push origin gh-pages",
            ]
        );
    }

    #[test]
    fn second_failure_is_exhausted() {
        let runner = MockRunner::without_worktree_emulation();
        runner.fail("git push");

        let err = PushReconciler::new(&runner, "origin")
            .push(&branch(), Path::new("/wt"))
            .unwrap_err();

        assert!(matches!(err, DeployError::PushConflictExhausted { .. }));
        assert_eq!(runner.count("git push"), 2);
        assert_eq!(runner.count("git pull --rebase"), 1);
    }

    #[test]
    fn failed_rebase_stops_before_second_push() {
        let runner = MockRunner::without_worktree_emulation();
        runner.fail("git push");
        runner.fail("git pull");

        let err = PushReconciler::new(&runner, "origin")
            .push(&branch(), Path::new("/wt"))
            .unwrap_err();

        assert!(matches!(err, DeployError::Git(_)));
        assert_eq!(runner.count("git push"), 1);
    }

    #[test]
    fn rebase_commits_as_identity() {
        let runner = MockRunner::without_worktree_emulation();
        runner.fail_times("git push", 1);
        let identity = CommitIdentity::from_actor(Some("octocat"));

        PushReconciler::new(&runner, "origin")
            .with_identity(&identity)
            .push(&branch(), Path::new("/wt"))
            .unwrap();

        let commands = runner.commands();
        let pull = commands
            .iter()
            .find(|c| c.line.starts_with("git pull --rebase"))
            .unwrap();
        assert!(pull
            .env
            .contains(&("GIT_COMMITTER_NAME".to_string(), "octocat".to_string())));
        assert!(commands
            .iter()
            .filter(|c| c.line.starts_with("git push"))
            .all(|c| c.env.is_empty()));
    }

    #[test]
    fn commands_run_in_working_dir() {
        let runner = MockRunner::without_worktree_emulation();
        PushReconciler::new(&runner, "origin")
            .push(&branch(), Path::new("/wt"))
            .unwrap();

        assert!(runner
            .commands()
            .iter()
            .all(|c| c.cwd.as_deref() == Some(Path::new("/wt"))));
    }
}
