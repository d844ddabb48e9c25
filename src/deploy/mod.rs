//! deploy
//!
//! Publishes a directory to a git branch through an isolated worktree.
//!
//! The user's checkout is never switched: the target branch is checked out
//! in a separate staging worktree, the content is renamed into it,
//! committed and pushed, then renamed back. See [`transaction`] for the
//! step-by-step lifecycle and cleanup guarantees.

mod errors;
mod push;
mod state;
pub mod transaction;

pub use errors::DeployError;
pub use push::{PushOutcome, PushReconciler};
pub use state::WorktreeState;
pub use transaction::{DeployOptions, DeployOutcome, WorktreeTransaction, STAGING_DIR};
