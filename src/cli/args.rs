//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--config <path>`: Use this global config file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Only log warnings and errors
//! - `--no-interactive`: Never prompt

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::config::PublisherConfig;

/// ghpages - Publish generated report directories to a GitHub Pages branch
#[derive(Parser, Debug)]
#[command(name = "ghpages")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if ghpages was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Global config file (default: $GHPAGES_CONFIG or ~/.ghpages/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "debug")]
    pub quiet: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_interactive: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Prompts are shown unless disabled or stdin is not a terminal.
    pub fn interactive(&self) -> bool {
        use std::io::IsTerminal;
        !self.no_interactive && !self.quiet && std::io::stdin().is_terminal()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Deploy a directory to the pages branch and print the report URL
    #[command(
        name = "publish",
        long_about = "Deploy a directory to the pages branch and print the report URL.\n\n\
            The directory is moved into an isolated worktree checked out on the pages \
            branch, committed, pushed, and moved back. Your own checkout is never \
            switched. If the content is identical to what the branch already holds, \
            nothing is committed.",
        after_help = "\
EXAMPLES:
    # Publish .reg under reports/<sha> on gh-pages
    ghpages publish $GITHUB_SHA --branch gh-pages --out-dir reports --include-commit-hash

    # Only compute the report URL (no branch configured)
    ghpages publish latest --out-dir reports

    # Deploy through an Actions artifact and the Pages API as well
    ghpages publish $GITHUB_SHA --branch gh-pages --out-dir reports --artifact-deploy"
    )]
    Publish {
        /// Publish key, typically the commit hash
        key: String,

        #[command(flatten)]
        overrides: PublishOverrides,
    },

    /// Fetch a published report (not supported)
    Fetch,

    /// Write a repository config file
    #[command(
        name = "init",
        long_about = "Write .ghpages.toml at the repository root.\n\n\
            Without flags, asks for the branch and output directory. Empty answers \
            are left out of the file."
    )]
    Init {
        /// Branch to deploy to; empty to only generate the report URL
        #[arg(long)]
        branch: Option<String>,

        /// Output directory on the branch
        #[arg(long)]
        out_dir: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
INSTALLATION:
    # Bash
    ghpages completion bash > ~/.local/share/bash-completion/completions/ghpages

    # Zsh
    ghpages completion zsh > \"${fpath[1]}/_ghpages\"

    # Fish
    ghpages completion fish > ~/.config/fish/completions/ghpages.fish

    # PowerShell
    ghpages completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config values settable per invocation; they win over every file.
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishOverrides {
    /// Branch to deploy to
    #[arg(long)]
    pub branch: Option<String>,

    /// Directory on the branch that receives the content
    #[arg(long)]
    pub out_dir: Option<String>,

    /// Directory to publish
    #[arg(long)]
    pub source_dir: Option<String>,

    /// Commit message (default: "deploy: <key>")
    #[arg(long, short = 'm')]
    pub message: Option<String>,

    /// Append the key to the target directory
    #[arg(long)]
    pub include_commit_hash: bool,

    /// Report path or absolute URL
    #[arg(long)]
    pub report_path: Option<String>,

    /// Also deploy through an Actions artifact and the Pages API
    #[arg(long)]
    pub artifact_deploy: bool,
}

impl PublishOverrides {
    /// As a config layer; unset flags leave file values alone.
    pub fn to_config(&self) -> PublisherConfig {
        PublisherConfig {
            branch: self.branch.clone(),
            out_dir: self.out_dir.clone(),
            source_dir: self.source_dir.clone(),
            commit_message: self.message.clone(),
            include_commit_hash: self.include_commit_hash.then_some(true),
            report_path: self.report_path.clone(),
            artifact_deploy: self.artifact_deploy.then_some(true),
        }
    }
}

/// Supported shells for completion.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}
