//! pages::github
//!
//! GitHub Pages deployments API client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;

use super::traits::{CreateDeploymentRequest, PagesApi, PagesDeployment, PagesError};
use super::USER_AGENT_VALUE;
use crate::core::env::DeployEnv;
use crate::core::types::RepoIdentity;

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Creates Pages deployments from uploaded artifacts.
pub struct GitHubPagesClient {
    client: Client,
    token: String,
    /// API base URL (configurable for GitHub Enterprise and tests)
    api_base: String,
}

// Custom Debug to avoid exposing token
impl std::fmt::Debug for GitHubPagesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubPagesClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl GitHubPagesClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Use a different API base URL, e.g. `https://github.example.com/api/v3`.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Client authenticated with `GITHUB_TOKEN`.
    pub fn from_env(env: &DeployEnv) -> Result<Self, PagesError> {
        let token = env
            .github_token
            .clone()
            .ok_or(PagesError::MissingEnv("GITHUB_TOKEN"))?;
        Ok(Self::new(token))
    }

    fn headers(&self) -> Result<HeaderMap, PagesError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))
                .map_err(|_| PagesError::PagesDeployment("token is not a valid header value".into()))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    fn deployments_url(&self, repo: &RepoIdentity) -> String {
        format!(
            "{}/repos/{}/{}/pages/deployments",
            self.api_base.trim_end_matches('/'),
            repo.owner,
            repo.repo
        )
    }
}

#[async_trait]
impl PagesApi for GitHubPagesClient {
    async fn create_deployment(
        &self,
        repo: &RepoIdentity,
        request: &CreateDeploymentRequest,
    ) -> Result<PagesDeployment, PagesError> {
        let response = self
            .client
            .post(self.deployments_url(repo))
            .headers(self.headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| PagesError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PagesError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(PagesError::PagesDeployment(text));
        }

        // Accepted regardless of body shape
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployments_url_uses_api_base() {
        let client = GitHubPagesClient::new("t").with_api_base("http://localhost:9999/");
        assert_eq!(
            client.deployments_url(&RepoIdentity::new("octo", "site")),
            "http://localhost:9999/repos/octo/site/pages/deployments"
        );
    }

    #[test]
    fn from_env_requires_token() {
        assert!(matches!(
            GitHubPagesClient::from_env(&DeployEnv::default()),
            Err(PagesError::MissingEnv("GITHUB_TOKEN"))
        ));
    }

    #[test]
    fn debug_hides_token() {
        let client = GitHubPagesClient::new("ghs_secret");
        assert!(!format!("{client:?}").contains("ghs_secret"));
    }
}
