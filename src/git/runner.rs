//! git::runner
//!
//! Synchronous execution of git commands.
//!
//! # Design
//!
//! [`CommandRunner`] is the seam between the deployment transaction and the
//! `git` binary. Production code uses [`GitCli`]; tests inject
//! [`MockRunner`](super::mock::MockRunner) to script outcomes and observe the
//! exact command sequence.
//!
//! Commands are described by [`GitCommand`], which keeps arguments separate
//! (no shell is involved when running them) and renders a shell-equivalent
//! command line for logs, errors and mocks. Arguments added with
//! [`GitCommand::quoted`] render inside double quotes with embedded `"`
//! escaped, so the rendered line stays well-formed for any message.

use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use super::GitError;
use crate::core::types::CommitIdentity;

/// Escape double quotes for embedding inside a double-quoted argument.
///
/// # Example
///
/// ```
/// use ghpages_deploy::git::escape_double_quotes;
///
/// assert_eq!(escape_double_quotes(r#"say "hi""#), r#"say \"hi\""#);
/// ```
pub fn escape_double_quotes(s: &str) -> String {
    s.replace('"', "\\\"")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Arg {
    value: OsString,
    quoted: bool,
}

/// A git invocation: the arguments after `git`, plus environment overrides
/// for that one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommand {
    args: Vec<Arg>,
    envs: Vec<(String, String)>,
}

impl GitCommand {
    /// Start a command from its leading plain arguments.
    ///
    /// # Example
    ///
    /// ```
    /// use ghpages_deploy::git::GitCommand;
    ///
    /// let cmd = GitCommand::new(["commit", "-m"]).quoted(r#"deploy "v1""#);
    /// assert_eq!(cmd.to_string(), r#"git commit -m "deploy \"v1\"""#);
    /// assert_eq!(cmd.args(), vec!["commit", "-m", r#"deploy "v1""#]);
    /// ```
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args
                .into_iter()
                .map(|a| Arg {
                    value: OsString::from(a.into()),
                    quoted: false,
                })
                .collect(),
            envs: Vec::new(),
        }
    }

    /// Append a plain argument.
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(Arg {
            value: OsString::from(value.into()),
            quoted: false,
        });
        self
    }

    /// Append a path argument, byte for byte.
    pub fn path_arg(mut self, path: &Path) -> Self {
        self.args.push(Arg {
            value: path.as_os_str().to_os_string(),
            quoted: false,
        });
        self
    }

    /// Append an argument that renders double-quoted.
    pub fn quoted(mut self, value: impl Into<String>) -> Self {
        self.args.push(Arg {
            value: OsString::from(value.into()),
            quoted: true,
        });
        self
    }

    /// Set an environment variable for this invocation only.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Author and commit as `identity` without touching any git config.
    pub fn identity(self, identity: &CommitIdentity) -> Self {
        self.env("GIT_AUTHOR_NAME", identity.name.as_str())
            .env("GIT_AUTHOR_EMAIL", identity.email.as_str())
            .env("GIT_COMMITTER_NAME", identity.name.as_str())
            .env("GIT_COMMITTER_EMAIL", identity.email.as_str())
    }

    /// Argument values, lossily decoded for matching and display.
    pub fn args(&self) -> Vec<Cow<'_, str>> {
        self.args.iter().map(|a| a.value.to_string_lossy()).collect()
    }

    /// Argument values exactly as passed to the process.
    pub fn os_args(&self) -> impl Iterator<Item = &OsStr> + '_ {
        self.args.iter().map(|a| a.value.as_os_str())
    }

    /// Environment overrides for this invocation.
    pub fn envs(&self) -> &[(String, String)] {
        &self.envs
    }
}

impl std::fmt::Display for GitCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "git")?;
        for arg in &self.args {
            let value = arg.value.to_string_lossy();
            if arg.quoted {
                write!(f, " \"{}\"", escape_double_quotes(&value))?;
            } else {
                write!(f, " {}", value)?;
            }
        }
        Ok(())
    }
}

/// Executes git commands synchronously.
pub trait CommandRunner: Send + Sync {
    /// Run `command` in `cwd` (or the runner's base directory when `None`).
    ///
    /// Returns trimmed standard output.
    ///
    /// # Errors
    ///
    /// [`GitError::CommandFailed`] on a non-zero exit, [`GitError::Spawn`]
    /// if the process could not be started.
    fn run(&self, command: &GitCommand, cwd: Option<&Path>) -> Result<String, GitError>;
}

/// Runs commands through the `git` binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    base_dir: PathBuf,
}

impl GitCli {
    /// Runner whose default working directory is `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl CommandRunner for GitCli {
    fn run(&self, command: &GitCommand, cwd: Option<&Path>) -> Result<String, GitError> {
        let dir = cwd.unwrap_or(&self.base_dir);
        tracing::debug!(command = %command, cwd = %dir.display(), "running git");

        let output = Command::new("git")
            .args(command.os_args())
            .envs(command.envs().iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(dir)
            // Never block on a credential prompt
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .map_err(|e| GitError::Spawn {
                command: command.to_string(),
                message: e.to_string(),
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(GitError::CommandFailed {
                command: command.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
