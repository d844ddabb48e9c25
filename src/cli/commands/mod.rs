//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Async Commands
//!
//! `publish` talks to the network when artifact deployment is enabled, so
//! it builds a tokio runtime and blocks on the publisher. The other
//! commands are synchronous.

mod completion;
mod fetch;
mod init;
mod publish;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use fetch::fetch;
pub use init::init;
pub use publish::publish;

use super::args::Command;
use super::Context;
use anyhow::Result;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Publish { key, overrides } => publish::publish(ctx, &key, &overrides),
        Command::Fetch => fetch::fetch(ctx),
        Command::Init {
            branch,
            out_dir,
            force,
        } => init::init(ctx, branch.as_deref(), out_dir.as_deref(), force),
        Command::Completion { shell } => completion::completion(shell),
    }
}
