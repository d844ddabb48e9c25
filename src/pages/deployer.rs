//! pages::deployer
//!
//! Publishes a staging tree through GitHub Pages' artifact-based
//! deployment: tarball, artifact upload, OIDC token, deployment request.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::actions::{ActionsArtifactClient, ActionsIdTokenProvider};
use super::archive::{create_tar, TempArchive};
use super::github::GitHubPagesClient;
use super::traits::{
    ArtifactUploader, CreateDeploymentRequest, IdTokenSource, PagesApi, PagesDeployment, PagesError,
    UploadOptions,
};
use crate::core::env::DeployEnv;
use crate::core::types::RepoIdentity;

/// Artifact name the Pages service looks for.
pub const ARTIFACT_NAME: &str = "github-pages";

/// File name of the tarball inside the temp directory.
pub const TAR_FILE: &str = "artifact.tar";

/// Runs the artifact deployment phases against injectable services.
#[derive(Clone)]
pub struct ArtifactDeployer {
    uploader: Arc<dyn ArtifactUploader>,
    tokens: Arc<dyn IdTokenSource>,
    api: Arc<dyn PagesApi>,
    temp_dir: PathBuf,
    build_version: String,
}

impl std::fmt::Debug for ArtifactDeployer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactDeployer")
            .field("temp_dir", &self.temp_dir)
            .field("build_version", &self.build_version)
            .finish_non_exhaustive()
    }
}

impl ArtifactDeployer {
    pub fn new(
        uploader: Arc<dyn ArtifactUploader>,
        tokens: Arc<dyn IdTokenSource>,
        api: Arc<dyn PagesApi>,
        temp_dir: impl Into<PathBuf>,
        build_version: impl Into<String>,
    ) -> Self {
        Self {
            uploader,
            tokens,
            api,
            temp_dir: temp_dir.into(),
            build_version: build_version.into(),
        }
    }

    /// Deployer backed by the real Actions and GitHub services.
    ///
    /// # Errors
    ///
    /// [`PagesError::MissingEnv`] when a runtime variable is absent.
    pub fn from_env(env: &DeployEnv) -> Result<Self, PagesError> {
        Ok(Self::new(
            Arc::new(ActionsArtifactClient::from_env(env)?),
            Arc::new(ActionsIdTokenProvider::from_env(env)?),
            Arc::new(GitHubPagesClient::from_env(env)?),
            env.temp_dir(),
            env.pages_build_version(),
        ))
    }

    /// Where the tarball is written.
    pub fn tar_path(&self) -> PathBuf {
        self.temp_dir.join(TAR_FILE)
    }

    /// Tar the staging tree, leaving out `.git`.
    pub fn package(&self, working_dir: &Path) -> Result<TempArchive, PagesError> {
        create_tar(working_dir, &self.tar_path())
    }

    /// Upload the tarball as the `github-pages` artifact, uncompressed.
    ///
    /// # Errors
    ///
    /// [`PagesError::ArtifactUpload`] when the service returns no artifact id.
    pub async fn upload(&self, archive: &TempArchive) -> Result<u64, PagesError> {
        let response = self
            .uploader
            .upload_artifact(
                ARTIFACT_NAME,
                &[archive.path().to_path_buf()],
                &self.temp_dir,
                UploadOptions { compression_level: 0 },
            )
            .await?;

        let id = response
            .id
            .ok_or_else(|| PagesError::ArtifactUpload("service returned no artifact id".into()))?;
        tracing::info!(artifact_id = id, size = response.size, "artifact uploaded");
        Ok(id)
    }

    /// Fetch an OIDC token and ask the Pages API to deploy `artifact_id`.
    pub async fn request_deployment(
        &self,
        artifact_id: u64,
        repo: &RepoIdentity,
    ) -> Result<PagesDeployment, PagesError> {
        let oidc_token = self.tokens.id_token().await?;
        let request = CreateDeploymentRequest {
            artifact_id,
            pages_build_version: self.build_version.clone(),
            oidc_token,
        };

        let deployment = self.api.create_deployment(repo, &request).await?;
        tracing::info!(
            %repo,
            artifact_id,
            page_url = deployment.page_url.as_deref().unwrap_or(""),
            "pages deployment created"
        );
        Ok(deployment)
    }

    /// All phases in one go. The tarball is deleted whatever the outcome.
    pub async fn deploy(&self, working_dir: &Path, repo: &RepoIdentity) -> Result<PagesDeployment, PagesError> {
        let archive = self.package(working_dir)?;
        let artifact_id = self.upload(&archive).await?;
        self.request_deployment(artifact_id, repo).await
    }
}
