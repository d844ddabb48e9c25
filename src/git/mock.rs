//! git::mock
//!
//! Scripted command runner for deterministic testing.
//!
//! # Design
//!
//! [`MockRunner`] records every command it receives and answers from a list
//! of rules matched by prefix against the rendered command line. Unmatched
//! commands succeed with empty output. Worktree creation and removal are
//! emulated on the filesystem so code that checks for the staging directory
//! behaves as it would against real git.
//!
//! # Example
//!
//! ```
//! use ghpages_deploy::git::mock::MockRunner;
//! use ghpages_deploy::git::{CommandRunner, GitCommand};
//!
//! let runner = MockRunner::new();
//! runner.respond("git ls-remote", "abc123\trefs/heads/gh-pages");
//! runner.fail_times("git push", 1);
//!
//! let out = runner.run(&GitCommand::new(["ls-remote", "--heads"]), None).unwrap();
//! assert!(out.contains("gh-pages"));
//! assert!(runner.run(&GitCommand::new(["push"]), None).is_err());
//! assert!(runner.run(&GitCommand::new(["push"]), None).is_ok());
//! assert_eq!(runner.count("git push"), 2);
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{CommandRunner, GitCommand, GitError};

/// A command observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    /// Rendered command line
    pub line: String,
    /// Working directory passed by the caller
    pub cwd: Option<PathBuf>,
    /// Environment overrides carried by the command
    pub env: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
enum Outcome {
    Output(String),
    Fail(String),
}

#[derive(Debug)]
struct Rule {
    prefix: String,
    outcome: Outcome,
    /// `None` means unlimited.
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct MockRunnerInner {
    rules: Vec<Rule>,
    commands: Vec<RecordedCommand>,
}

/// Mock command runner.
///
/// Thread-safe via internal `Arc<Mutex<...>>`; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    inner: Arc<Mutex<MockRunnerInner>>,
    emulate_worktrees: bool,
}

impl MockRunner {
    /// Create a runner that emulates worktree directories.
    pub fn new() -> Self {
        Self {
            inner: Arc::default(),
            emulate_worktrees: true,
        }
    }

    /// Create a runner that never touches the filesystem.
    pub fn without_worktree_emulation() -> Self {
        Self {
            inner: Arc::default(),
            emulate_worktrees: false,
        }
    }

    fn push_rule(&self, prefix: &str, outcome: Outcome, remaining: Option<usize>) {
        let mut inner = self.inner.lock().unwrap();
        inner.rules.push(Rule {
            prefix: prefix.to_string(),
            outcome,
            remaining,
        });
    }

    /// Commands starting with `prefix` succeed with `stdout`.
    pub fn respond(&self, prefix: &str, stdout: &str) {
        self.push_rule(prefix, Outcome::Output(stdout.to_string()), None);
    }

    /// Commands starting with `prefix` always fail.
    pub fn fail(&self, prefix: &str) {
        self.push_rule(prefix, Outcome::Fail(format!("{prefix}: mock failure")), None);
    }

    /// The next `times` commands starting with `prefix` fail.
    pub fn fail_times(&self, prefix: &str, times: usize) {
        self.push_rule(
            prefix,
            Outcome::Fail(format!("{prefix}: mock failure")),
            Some(times),
        );
    }

    /// Every command recorded so far.
    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.inner.lock().unwrap().commands.clone()
    }

    /// Rendered command lines recorded so far.
    pub fn lines(&self) -> Vec<String> {
        self.commands().into_iter().map(|c| c.line).collect()
    }

    /// Number of recorded commands starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.lines().iter().filter(|l| l.starts_with(prefix)).count()
    }

    /// Position of the first recorded command starting with `prefix`.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.lines().iter().position(|l| l.starts_with(prefix))
    }

    fn emulate(&self, command: &GitCommand, cwd: Option<&Path>) {
        let args = command.args();
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
        let target = match args.as_slice() {
            ["worktree", "add", "--detach", path, ..] => Some((true, *path)),
            ["worktree", "add", path, ..] => Some((true, *path)),
            ["worktree", "remove", "--force", path] => Some((false, *path)),
            _ => None,
        };

        if let Some((create, path)) = target {
            let path = match cwd {
                Some(dir) => dir.join(path),
                None => PathBuf::from(path),
            };
            if create {
                let _ = std::fs::create_dir_all(&path);
            } else {
                let _ = std::fs::remove_dir_all(&path);
            }
        }
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, command: &GitCommand, cwd: Option<&Path>) -> Result<String, GitError> {
        let line = command.to_string();

        let outcome = {
            let mut inner = self.inner.lock().unwrap();
            inner.commands.push(RecordedCommand {
                line: line.clone(),
                cwd: cwd.map(Path::to_path_buf),
                env: command.envs().to_vec(),
            });

            inner
                .rules
                .iter_mut()
                .find(|r| line.starts_with(&r.prefix) && r.remaining != Some(0))
                .map(|rule| {
                    if let Some(n) = rule.remaining.as_mut() {
                        *n -= 1;
                    }
                    rule.outcome.clone()
                })
        };

        match outcome {
            Some(Outcome::Fail(stderr)) => Err(GitError::CommandFailed {
                command: line,
                code: Some(1),
                stderr,
            }),
            Some(Outcome::Output(stdout)) => {
                if self.emulate_worktrees {
                    self.emulate(command, cwd);
                }
                Ok(stdout)
            }
            None => {
                if self.emulate_worktrees {
                    self.emulate(command, cwd);
                }
                Ok(String::new())
            }
        }
    }
}
