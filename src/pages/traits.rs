//! pages::traits
//!
//! Seams between the artifact deployer and the services it talks to.
//!
//! # Design
//!
//! Each service the deployer needs is a small async trait so the real HTTP
//! clients can be swapped for [`mock`](super::mock) implementations in
//! tests. All methods return `Result` and never panic on remote failures.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::RepoIdentity;

/// Errors from artifact packaging, upload and Pages deployment.
#[derive(Debug, Clone, Error)]
pub enum PagesError {
    /// A required environment variable is not set.
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    /// Building the tar archive failed.
    #[error("failed to build archive: {0}")]
    Archive(String),

    /// The artifact service rejected or failed the upload.
    #[error("artifact upload failed: {0}")]
    ArtifactUpload(String),

    /// The OIDC token could not be obtained.
    #[error("failed to obtain OIDC token: {0}")]
    IdToken(String),

    /// The Pages API rejected the deployment request. Carries the response body.
    #[error("pages deployment failed: {0}")]
    PagesDeployment(String),

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),
}

/// Options passed through to the artifact service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    /// Zip compression level, 0 stores entries uncompressed
    pub compression_level: u32,
}

/// Result of an artifact upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse {
    /// Artifact id assigned by the service, absent if it returned none
    pub id: Option<u64>,
    /// Uploaded size in bytes
    pub size: u64,
}

/// Body of `POST /repos/{owner}/{repo}/pages/deployments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateDeploymentRequest {
    pub artifact_id: u64,
    pub pages_build_version: String,
    pub oidc_token: String,
}

/// What the Pages API reports for an accepted deployment.
///
/// Every field is optional; the request counts as accepted on any success
/// status even when the body is not JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PagesDeployment {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub status_url: Option<String>,
    #[serde(default)]
    pub page_url: Option<String>,
}

/// Uploads files as a workflow run artifact.
#[async_trait]
pub trait ArtifactUploader: Send + Sync {
    /// Upload `files` (paths under `root_dir`) as artifact `name`.
    async fn upload_artifact(
        &self,
        name: &str,
        files: &[PathBuf],
        root_dir: &Path,
        options: UploadOptions,
    ) -> Result<UploadResponse, PagesError>;
}

/// Source of the workflow's OIDC identity token.
#[async_trait]
pub trait IdTokenSource: Send + Sync {
    async fn id_token(&self) -> Result<String, PagesError>;
}

/// The GitHub Pages deployments API.
#[async_trait]
pub trait PagesApi: Send + Sync {
    async fn create_deployment(
        &self,
        repo: &RepoIdentity,
        request: &CreateDeploymentRequest,
    ) -> Result<PagesDeployment, PagesError>;
}
