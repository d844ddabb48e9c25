//! pages
//!
//! Artifact-based GitHub Pages deployment.
//!
//! # Architecture
//!
//! [`ArtifactDeployer`] drives the phases and talks to three services
//! through traits:
//!
//! - [`ArtifactUploader`]: the Actions artifact service ([`actions`])
//! - [`IdTokenSource`]: the workflow OIDC endpoint ([`actions`])
//! - [`PagesApi`]: `POST /repos/{owner}/{repo}/pages/deployments` ([`github`])
//!
//! [`mock`] provides an in-memory implementation of all three.
//!
//! Nothing here touches git; the deployer only reads the staging tree it is
//! handed.

pub mod actions;
pub mod archive;
mod deployer;
pub mod github;
pub mod mock;
mod traits;

pub use deployer::{ArtifactDeployer, ARTIFACT_NAME, TAR_FILE};
pub use traits::*;

/// User-Agent header value for service requests.
pub(crate) const USER_AGENT_VALUE: &str = "ghpages-deploy";
