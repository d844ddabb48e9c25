//! pages::mock
//!
//! In-memory artifact service, OIDC source and Pages API for deterministic
//! testing.
//!
//! # Example
//!
//! ```
//! use ghpages_deploy::pages::mock::{MockPagesBackend, PagesOperation};
//! use ghpages_deploy::pages::IdTokenSource;
//!
//! # tokio_test::block_on(async {
//! let backend = MockPagesBackend::new();
//! let token = backend.id_token().await.unwrap();
//! assert_eq!(token, "mock-oidc-token");
//! assert_eq!(backend.operations(), vec![PagesOperation::IdToken]);
//! # });
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{
    ArtifactUploader, CreateDeploymentRequest, IdTokenSource, PagesApi, PagesDeployment, PagesError,
    UploadOptions, UploadResponse,
};
use crate::core::types::RepoIdentity;

/// Which call should fail.
#[derive(Debug, Clone)]
pub enum PagesFailOn {
    Upload(PagesError),
    IdToken(PagesError),
    CreateDeployment(PagesError),
}

/// Recorded call for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagesOperation {
    Upload {
        name: String,
        files: Vec<PathBuf>,
        root_dir: PathBuf,
        compression_level: u32,
        /// Entry names of every tar file uploaded, read at upload time
        tar_entries: Vec<String>,
    },
    IdToken,
    CreateDeployment {
        repo: RepoIdentity,
        request: CreateDeploymentRequest,
    },
}

#[derive(Debug)]
struct MockPagesInner {
    artifact_id: Option<u64>,
    fail_on: Option<PagesFailOn>,
    operations: Vec<PagesOperation>,
}

/// Mock backend implementing [`ArtifactUploader`], [`IdTokenSource`] and
/// [`PagesApi`].
///
/// Thread-safe via internal `Arc<Mutex<...>>`; clones share state.
#[derive(Debug, Clone)]
pub struct MockPagesBackend {
    inner: Arc<Mutex<MockPagesInner>>,
}

impl Default for MockPagesBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPagesBackend {
    /// Backend that accepts everything and assigns artifact id 1.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockPagesInner {
                artifact_id: Some(1),
                fail_on: None,
                operations: Vec::new(),
            })),
        }
    }

    /// Artifact id returned by uploads; `None` simulates a missing id.
    pub fn with_artifact_id(self, id: Option<u64>) -> Self {
        self.inner.lock().unwrap().artifact_id = id;
        self
    }

    /// Make one kind of call fail.
    pub fn fail_on(self, fail_on: PagesFailOn) -> Self {
        self.inner.lock().unwrap().fail_on = Some(fail_on);
        self
    }

    /// Calls recorded so far.
    pub fn operations(&self) -> Vec<PagesOperation> {
        self.inner.lock().unwrap().operations.clone()
    }

    fn record(&self, op: PagesOperation) {
        self.inner.lock().unwrap().operations.push(op);
    }
}

fn tar_entries(path: &Path) -> Vec<String> {
    let Ok(file) = File::open(path) else {
        return Vec::new();
    };
    let mut archive = tar::Archive::new(file);
    let Ok(entries) = archive.entries() else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .filter_map(|e| e.path().ok().map(|p| p.to_string_lossy().into_owned()))
        .collect()
}

#[async_trait]
impl ArtifactUploader for MockPagesBackend {
    async fn upload_artifact(
        &self,
        name: &str,
        files: &[PathBuf],
        root_dir: &Path,
        options: UploadOptions,
    ) -> Result<UploadResponse, PagesError> {
        let entries = files
            .iter()
            .filter(|f| f.extension().is_some_and(|e| e == "tar"))
            .flat_map(|f| tar_entries(f))
            .collect();
        self.record(PagesOperation::Upload {
            name: name.to_string(),
            files: files.to_vec(),
            root_dir: root_dir.to_path_buf(),
            compression_level: options.compression_level,
            tar_entries: entries,
        });

        let inner = self.inner.lock().unwrap();
        if let Some(PagesFailOn::Upload(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        let size = files
            .iter()
            .filter_map(|f| f.metadata().ok())
            .map(|m| m.len())
            .sum();
        Ok(UploadResponse {
            id: inner.artifact_id,
            size,
        })
    }
}

#[async_trait]
impl IdTokenSource for MockPagesBackend {
    async fn id_token(&self) -> Result<String, PagesError> {
        self.record(PagesOperation::IdToken);
        if let Some(PagesFailOn::IdToken(e)) = &self.inner.lock().unwrap().fail_on {
            return Err(e.clone());
        }
        Ok("mock-oidc-token".to_string())
    }
}

#[async_trait]
impl PagesApi for MockPagesBackend {
    async fn create_deployment(
        &self,
        repo: &RepoIdentity,
        request: &CreateDeploymentRequest,
    ) -> Result<PagesDeployment, PagesError> {
        self.record(PagesOperation::CreateDeployment {
            repo: repo.clone(),
            request: request.clone(),
        });
        if let Some(PagesFailOn::CreateDeployment(e)) = &self.inner.lock().unwrap().fail_on {
            return Err(e.clone());
        }
        Ok(PagesDeployment {
            id: Some(request.artifact_id),
            status_url: None,
            page_url: Some(format!("https://{}.github.io/{}/", repo.owner, repo.repo)),
        })
    }
}
