//! pages::actions
//!
//! Clients for the GitHub Actions runtime services: the artifact service
//! (v4 protocol) and the OIDC token endpoint.
//!
//! # Artifact upload
//!
//! 1. Read the workflow run and job backend ids from the `scp` claim of
//!    `ACTIONS_RUNTIME_TOKEN`
//! 2. `CreateArtifact` returns a signed blob URL
//! 3. The files are zipped in memory and `PUT` to that URL
//! 4. `FinalizeArtifact` with the size and SHA-256 returns the artifact id
//!
//! Both services are reached through URLs taken from the environment, so
//! tests point them at a local mock server.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::traits::{ArtifactUploader, IdTokenSource, PagesError, UploadOptions, UploadResponse};
use super::USER_AGENT_VALUE;
use crate::core::env::DeployEnv;

const ARTIFACT_SERVICE: &str = "twirp/github.actions.results.api.v1.ArtifactService";
const ARTIFACT_VERSION: u32 = 4;
const RESULTS_SCOPE_PREFIX: &str = "Actions.Results:";

/// Workflow run and job ids the artifact service files uploads under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendIds {
    pub workflow_run_backend_id: String,
    pub workflow_job_run_backend_id: String,
}

impl BackendIds {
    /// Extract the ids from the runtime token's `scp` claim.
    ///
    /// The claim is a space-separated scope list; the relevant entry reads
    /// `Actions.Results:<run id>:<job id>`. The token signature is not
    /// checked.
    pub fn from_runtime_token(token: &str) -> Result<Self, PagesError> {
        let invalid = |why: &str| PagesError::ArtifactUpload(format!("invalid runtime token: {why}"));

        let payload = token.split('.').nth(1).ok_or_else(|| invalid("not a JWT"))?;
        let decoded = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|_| invalid("payload is not base64"))?;

        #[derive(Deserialize)]
        struct Claims {
            scp: Option<String>,
        }
        let claims: Claims = serde_json::from_slice(&decoded).map_err(|_| invalid("payload is not JSON"))?;
        let scp = claims.scp.ok_or_else(|| invalid("no scp claim"))?;

        for scope in scp.split(' ') {
            let Some(rest) = scope.strip_prefix(RESULTS_SCOPE_PREFIX) else {
                continue;
            };
            if let Some((run, job)) = rest.split_once(':') {
                if !run.is_empty() && !job.is_empty() {
                    return Ok(Self {
                        workflow_run_backend_id: run.to_string(),
                        workflow_job_run_backend_id: job.to_string(),
                    });
                }
            }
            return Err(invalid("malformed Actions.Results scope"));
        }
        Err(invalid("no Actions.Results scope"))
    }
}

#[derive(Serialize)]
struct CreateArtifactRequest<'a> {
    workflow_run_backend_id: &'a str,
    workflow_job_run_backend_id: &'a str,
    name: &'a str,
    version: u32,
}

#[derive(Deserialize)]
struct CreateArtifactResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    signed_upload_url: String,
}

#[derive(Serialize)]
struct FinalizeArtifactRequest<'a> {
    workflow_run_backend_id: &'a str,
    workflow_job_run_backend_id: &'a str,
    name: &'a str,
    size: String,
    hash: String,
}

#[derive(Deserialize)]
struct FinalizeArtifactResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    artifact_id: Option<String>,
}

/// Uploads artifacts to the Actions results service.
pub struct ActionsArtifactClient {
    client: Client,
    results_url: String,
    runtime_token: String,
}

// Custom Debug to avoid exposing runtime_token
impl std::fmt::Debug for ActionsArtifactClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionsArtifactClient")
            .field("results_url", &self.results_url)
            .finish_non_exhaustive()
    }
}

impl ActionsArtifactClient {
    pub fn new(results_url: impl Into<String>, runtime_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            results_url: results_url.into(),
            runtime_token: runtime_token.into(),
        }
    }

    /// Client configured from `ACTIONS_RESULTS_URL` and `ACTIONS_RUNTIME_TOKEN`.
    pub fn from_env(env: &DeployEnv) -> Result<Self, PagesError> {
        let results_url = env
            .results_url
            .clone()
            .ok_or(PagesError::MissingEnv("ACTIONS_RESULTS_URL"))?;
        let runtime_token = env
            .runtime_token
            .clone()
            .ok_or(PagesError::MissingEnv("ACTIONS_RUNTIME_TOKEN"))?;
        Ok(Self::new(results_url, runtime_token))
    }

    fn service_url(&self, method: &str) -> String {
        format!(
            "{}/{}/{}",
            self.results_url.trim_end_matches('/'),
            ARTIFACT_SERVICE,
            method
        )
    }

    fn headers(&self) -> Result<HeaderMap, PagesError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.runtime_token))
            .map_err(|_| PagesError::ArtifactUpload("runtime token is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        Ok(headers)
    }

    async fn call<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: &Req,
    ) -> Result<Resp, PagesError> {
        let response = self
            .client
            .post(self.service_url(method))
            .headers(self.headers()?)
            .json(body)
            .send()
            .await
            .map_err(|e| PagesError::Network(e.to_string()))?;

        let text = success_text(response, PagesError::ArtifactUpload).await?;
        serde_json::from_str(&text)
            .map_err(|e| PagesError::ArtifactUpload(format!("{method}: unexpected response: {e}")))
    }
}

#[async_trait]
impl ArtifactUploader for ActionsArtifactClient {
    async fn upload_artifact(
        &self,
        name: &str,
        files: &[PathBuf],
        root_dir: &Path,
        options: UploadOptions,
    ) -> Result<UploadResponse, PagesError> {
        let ids = BackendIds::from_runtime_token(&self.runtime_token)?;

        let created: CreateArtifactResponse = self
            .call(
                "CreateArtifact",
                &CreateArtifactRequest {
                    workflow_run_backend_id: &ids.workflow_run_backend_id,
                    workflow_job_run_backend_id: &ids.workflow_job_run_backend_id,
                    name,
                    version: ARTIFACT_VERSION,
                },
            )
            .await?;
        if !created.ok || created.signed_upload_url.is_empty() {
            return Err(PagesError::ArtifactUpload("CreateArtifact was not accepted".into()));
        }

        let zip = zip_files(files, root_dir, options)?;
        let size = zip.len() as u64;
        let hash = format!("sha256:{}", hex::encode(Sha256::digest(&zip)));
        tracing::debug!(name, size, %hash, "uploading artifact");

        let response = self
            .client
            .put(created.signed_upload_url.as_str())
            .header("x-ms-blob-type", "BlockBlob")
            .header(CONTENT_TYPE, "application/zip")
            .body(zip)
            .send()
            .await
            .map_err(|e| PagesError::Network(e.to_string()))?;
        success_text(response, PagesError::ArtifactUpload).await?;

        let finalized: FinalizeArtifactResponse = self
            .call(
                "FinalizeArtifact",
                &FinalizeArtifactRequest {
                    workflow_run_backend_id: &ids.workflow_run_backend_id,
                    workflow_job_run_backend_id: &ids.workflow_job_run_backend_id,
                    name,
                    size: size.to_string(),
                    hash,
                },
            )
            .await?;
        if !finalized.ok {
            return Err(PagesError::ArtifactUpload("FinalizeArtifact was not accepted".into()));
        }

        let id = finalized.artifact_id.and_then(|id| id.parse::<u64>().ok());
        Ok(UploadResponse { id, size })
    }
}

/// Zip `files` in memory, naming entries relative to `root_dir`.
fn zip_files(files: &[PathBuf], root_dir: &Path, options: UploadOptions) -> Result<Vec<u8>, PagesError> {
    let entry_options = if options.compression_level == 0 {
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored)
    } else {
        zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .compression_level(Some(i64::from(options.compression_level)))
    };

    let zip_err = |e: zip::result::ZipError| PagesError::ArtifactUpload(format!("zip: {e}"));
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));

    for file in files {
        let rel = file.strip_prefix(root_dir).map_err(|_| {
            PagesError::ArtifactUpload(format!(
                "{} is not under {}",
                file.display(),
                root_dir.display()
            ))
        })?;
        let name = rel.to_string_lossy().replace('\\', "/");
        let bytes = std::fs::read(file)
            .map_err(|e| PagesError::ArtifactUpload(format!("read {}: {e}", file.display())))?;

        writer.start_file(name.as_str(), entry_options).map_err(zip_err)?;
        writer
            .write_all(&bytes)
            .map_err(|e| PagesError::ArtifactUpload(format!("zip: {e}")))?;
    }

    let cursor = writer.finish().map_err(zip_err)?;
    Ok(cursor.into_inner())
}

/// Body of a successful response, or `fail(body)` otherwise.
async fn success_text(response: Response, fail: fn(String) -> PagesError) -> Result<String, PagesError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| PagesError::Network(e.to_string()))?;
    if status.is_success() {
        Ok(text)
    } else {
        Err(fail(format!("{} {}", status.as_u16(), text)))
    }
}

#[derive(Deserialize)]
struct IdTokenResponse {
    value: Option<String>,
}

/// Fetches the workflow's OIDC token.
pub struct ActionsIdTokenProvider {
    client: Client,
    request_url: String,
    request_token: String,
}

// Custom Debug to avoid exposing request_token
impl std::fmt::Debug for ActionsIdTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionsIdTokenProvider")
            .field("request_url", &self.request_url)
            .finish_non_exhaustive()
    }
}

impl ActionsIdTokenProvider {
    pub fn new(request_url: impl Into<String>, request_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            request_url: request_url.into(),
            request_token: request_token.into(),
        }
    }

    /// Provider configured from `ACTIONS_ID_TOKEN_REQUEST_URL` and
    /// `ACTIONS_ID_TOKEN_REQUEST_TOKEN`. Both are only present when the
    /// workflow grants `id-token: write`.
    pub fn from_env(env: &DeployEnv) -> Result<Self, PagesError> {
        let url = env
            .id_token_request_url
            .clone()
            .ok_or(PagesError::MissingEnv("ACTIONS_ID_TOKEN_REQUEST_URL"))?;
        let token = env
            .id_token_request_token
            .clone()
            .ok_or(PagesError::MissingEnv("ACTIONS_ID_TOKEN_REQUEST_TOKEN"))?;
        Ok(Self::new(url, token))
    }
}

#[async_trait]
impl IdTokenSource for ActionsIdTokenProvider {
    async fn id_token(&self) -> Result<String, PagesError> {
        let response = self
            .client
            .get(self.request_url.as_str())
            .bearer_auth(&self.request_token)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, USER_AGENT_VALUE)
            .send()
            .await
            .map_err(|e| PagesError::Network(e.to_string()))?;
        let text = success_text(response, PagesError::IdToken).await?;
        let parsed: IdTokenResponse = serde_json::from_str(&text)
            .map_err(|e| PagesError::IdToken(format!("unexpected response: {e}")))?;

        parsed
            .value
            .filter(|v| !v.is_empty())
            .ok_or_else(|| PagesError::IdToken("response carried no token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn runtime_token(scp: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::json!({ "scp": scp }).to_string());
        format!("{header}.{payload}.signature")
    }

    mod backend_ids {
        use super::*;

        #[test]
        fn parsed_from_scope() {
            let token = runtime_token("Actions.ExampleScope Actions.Results:run-1:job-2");
            let ids = BackendIds::from_runtime_token(&token).unwrap();
            assert_eq!(ids.workflow_run_backend_id, "run-1");
            assert_eq!(ids.workflow_job_run_backend_id, "job-2");
        }

        #[test]
        fn missing_scope_rejected() {
            let token = runtime_token("Actions.GenericRead:abc");
            assert!(matches!(
                BackendIds::from_runtime_token(&token),
                Err(PagesError::ArtifactUpload(_))
            ));
        }

        #[test]
        fn malformed_scope_rejected() {
            let token = runtime_token("Actions.Results:only-run");
            assert!(BackendIds::from_runtime_token(&token).is_err());
        }

        #[test]
        fn non_jwt_rejected() {
            assert!(BackendIds::from_runtime_token("opaque").is_err());
            assert!(BackendIds::from_runtime_token("a.!!!.c").is_err());
        }
    }

    mod zipping {
        use super::*;
        use std::io::Read;

        #[test]
        fn stored_entries_named_relative_to_root() {
            let dir = TempDir::new().unwrap();
            let tar = dir.path().join("artifact.tar");
            std::fs::write(&tar, b"tar bytes").unwrap();

            let bytes = zip_files(&[tar], dir.path(), UploadOptions { compression_level: 0 }).unwrap();

            let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
            assert_eq!(archive.len(), 1);
            let mut entry = archive.by_index(0).unwrap();
            assert_eq!(entry.name(), "artifact.tar");
            assert_eq!(entry.compression(), zip::CompressionMethod::Stored);
            let mut content = String::new();
            entry.read_to_string(&mut content).unwrap();
            assert_eq!(content, "tar bytes");
        }

        #[test]
        fn file_outside_root_rejected() {
            let dir = TempDir::new().unwrap();
            let other = TempDir::new().unwrap();
            let file = other.path().join("x");
            std::fs::write(&file, b"x").unwrap();

            let err = zip_files(&[file], dir.path(), UploadOptions { compression_level: 0 }).unwrap_err();
            assert!(matches!(err, PagesError::ArtifactUpload(_)));
        }
    }

    #[test]
    fn from_env_requires_variables() {
        let env = DeployEnv::default();
        assert!(matches!(
            ActionsArtifactClient::from_env(&env),
            Err(PagesError::MissingEnv("ACTIONS_RESULTS_URL"))
        ));
        assert!(matches!(
            ActionsIdTokenProvider::from_env(&env),
            Err(PagesError::MissingEnv("ACTIONS_ID_TOKEN_REQUEST_URL"))
        ));
    }

    #[test]
    fn debug_hides_tokens() {
        let client = ActionsArtifactClient::new("https://results", "secret-runtime");
        let provider = ActionsIdTokenProvider::new("https://oidc", "secret-request");
        assert!(!format!("{client:?}").contains("secret"));
        assert!(!format!("{provider:?}").contains("secret"));
    }
}
