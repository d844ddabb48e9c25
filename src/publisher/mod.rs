//! publisher
//!
//! Caller-facing entry point: turns configuration and a publish key into a
//! deployment and a report URL.
//!
//! # Example
//!
//! ```ignore
//! use ghpages_deploy::publisher::PublisherFacade;
//!
//! let mut publisher = PublisherFacade::new(runner, env, repo_root, working_dir);
//! publisher.init(&config)?;
//! let result = publisher.publish("3f2a9c1").await?;
//! println!("{}", result.report_url.unwrap_or_default());
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::config::PublisherConfig;
use crate::core::env::DeployEnv;
use crate::core::types::{BranchName, RepoIdentity};
use crate::deploy::{DeployError, DeployOptions, DeployOutcome, WorktreeTransaction};
use crate::git::{CommandRunner, RepoInfoResolver};
use crate::pages::ArtifactDeployer;

/// Conventional working directory of report generators, relative to the
/// repository root. Used as the source directory when none is configured.
pub const DEFAULT_WORKING_DIR: &str = ".reg";

/// Repository config holding only the non-empty answers.
pub fn prepare(branch: Option<&str>, out_dir: Option<&str>) -> PublisherConfig {
    let non_empty = |v: Option<&str>| v.map(str::trim).filter(|v| !v.is_empty()).map(String::from);
    PublisherConfig {
        branch: non_empty(branch),
        out_dir: non_empty(out_dir),
        ..Default::default()
    }
}

/// Settings after defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublisherSettings {
    pub branch: Option<BranchName>,
    pub out_dir: String,
    pub source_dir: Option<PathBuf>,
    pub commit_message: Option<String>,
    pub include_commit_hash: bool,
    pub report_path: Option<String>,
    pub artifact_deploy: bool,
}

impl PublisherSettings {
    /// Apply defaults to a file/CLI configuration.
    ///
    /// An empty branch counts as "not configured".
    pub fn from_config(config: &PublisherConfig) -> Result<Self, DeployError> {
        let branch = config
            .branch
            .as_deref()
            .filter(|b| !b.is_empty())
            .map(BranchName::new)
            .transpose()
            .map_err(|e| DeployError::Configuration(e.to_string()))?;

        Ok(Self {
            branch,
            out_dir: config.out_dir.clone().unwrap_or_default(),
            source_dir: config.source_dir.as_ref().map(PathBuf::from),
            commit_message: config.commit_message.clone(),
            include_commit_hash: config.include_commit_hash.unwrap_or(false),
            report_path: config.report_path.clone(),
            artifact_deploy: config.artifact_deploy.unwrap_or(false),
        })
    }

    /// Directory on the branch that receives the content for `key`.
    ///
    /// Empty when neither `out_dir` nor `include_commit_hash` contribute.
    pub fn target_dir(&self, key: &str) -> String {
        let hash = if self.include_commit_hash { key } else { "" };
        join_non_empty([self.out_dir.as_str(), hash])
    }

    /// Public URL of the published report, always ending in `/`.
    pub fn report_url(&self, repo: &RepoIdentity, target_dir: &str) -> String {
        let mut url = match self.report_path.as_deref() {
            Some(path) if path.starts_with("http") => path.to_string(),
            report_path => {
                let host = format!("https://{}.github.io", repo.owner);
                join_non_empty([
                    host.as_str(),
                    repo.repo.as_str(),
                    report_path.unwrap_or(target_dir),
                ])
            }
        };
        if !url.ends_with('/') {
            url.push('/');
        }
        url
    }
}

fn join_non_empty<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// What a publish produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    /// Where the report can be viewed, if the repository is known
    pub report_url: Option<String>,
    /// Deployment outcome, if a deployment ran
    pub deployment: Option<DeployOutcome>,
}

/// Computes targets and report URLs, delegating deployment to
/// [`WorktreeTransaction`].
pub struct PublisherFacade {
    runner: Arc<dyn CommandRunner>,
    env: DeployEnv,
    repo_root: PathBuf,
    working_dir: PathBuf,
    resolver: RepoInfoResolver,
    artifact_deployer: Option<ArtifactDeployer>,
    settings: PublisherSettings,
}

impl PublisherFacade {
    /// Facade over the working copy at `repo_root`; `working_dir` is the
    /// default source directory.
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        env: DeployEnv,
        repo_root: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            env,
            repo_root: repo_root.into(),
            working_dir: working_dir.into(),
            resolver: RepoInfoResolver::default(),
            artifact_deployer: None,
            settings: PublisherSettings::default(),
        }
    }

    pub fn with_artifact_deployer(mut self, deployer: ArtifactDeployer) -> Self {
        self.artifact_deployer = Some(deployer);
        self
    }

    /// Store the configuration used by later calls.
    pub fn init(&mut self, config: &PublisherConfig) -> Result<(), DeployError> {
        self.settings = PublisherSettings::from_config(config)?;
        tracing::debug!(settings = ?self.settings, "publisher initialised");
        Ok(())
    }

    /// Deploy the content for `key` (when a branch is configured) and
    /// compute its report URL.
    ///
    /// An unknown repository is not an error: a warning is logged and the
    /// result carries no URL.
    pub async fn publish(&self, key: &str) -> Result<PublishResult, DeployError> {
        let Some(repo) = self.resolver.resolve(&self.env, &self.repo_root) else {
            tracing::warn!(
                "Unable to determine repository info. Run inside a GitHub repository or set GITHUB_REPOSITORY."
            );
            return Ok(PublishResult {
                report_url: None,
                deployment: None,
            });
        };

        let target_dir = self.settings.target_dir(key);
        let mut deployment = None;

        if let Some(branch) = &self.settings.branch {
            if target_dir.is_empty() {
                tracing::warn!("Deployment skipped. Set out_dir or enable include_commit_hash.");
            } else {
                let options = DeployOptions {
                    branch: branch.clone(),
                    source_dir: self
                        .settings
                        .source_dir
                        .clone()
                        .unwrap_or_else(|| self.working_dir.clone()),
                    target_dir: target_dir.clone(),
                    commit_message: self
                        .settings
                        .commit_message
                        .clone()
                        .unwrap_or_else(|| format!("deploy: {key}")),
                    artifact_deploy: self.settings.artifact_deploy,
                    repo_info: Some(repo.clone()),
                };
                deployment = Some(self.transaction().run(&options).await?);
            }
        }

        let report_url = self.settings.report_url(&repo, &target_dir);
        tracing::info!(%report_url, "report published");
        Ok(PublishResult {
            report_url: Some(report_url),
            deployment,
        })
    }

    /// Fetching is not supported; logs a warning and succeeds.
    pub fn fetch(&self) -> Result<(), DeployError> {
        tracing::warn!("This publisher only supports publish; fetch is not implemented.");
        Ok(())
    }

    fn transaction(&self) -> WorktreeTransaction {
        let tx = WorktreeTransaction::new(self.runner.clone(), self.env.clone(), self.repo_root.clone());
        match &self.artifact_deployer {
            Some(deployer) => tx.with_artifact_deployer(deployer.clone()),
            None => tx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::{PushOutcome, STAGING_DIR};
    use crate::git::mock::MockRunner;
    use std::fs;
    use tempfile::TempDir;

    fn repo() -> RepoIdentity {
        RepoIdentity::new("octo", "site")
    }

    fn settings(out_dir: &str, include_commit_hash: bool, report_path: Option<&str>) -> PublisherSettings {
        PublisherSettings {
            out_dir: out_dir.into(),
            include_commit_hash,
            report_path: report_path.map(String::from),
            ..Default::default()
        }
    }

    mod target_dir {
        use super::*;

        #[test]
        fn out_dir_and_key() {
            assert_eq!(settings("reports", true, None).target_dir("abc"), "reports/abc");
        }

        #[test]
        fn out_dir_only() {
            assert_eq!(settings("reports", false, None).target_dir("abc"), "reports");
        }

        #[test]
        fn key_only() {
            assert_eq!(settings("", true, None).target_dir("abc"), "abc");
        }

        #[test]
        fn nothing_configured() {
            assert_eq!(settings("", false, None).target_dir("abc"), "");
        }
    }

    mod report_url {
        use super::*;

        #[test]
        fn from_target_dir() {
            let s = settings("reports", true, None);
            assert_eq!(s.report_url(&repo(), "reports/abc"), "https://octo.github.io/site/reports/abc/");
        }

        #[test]
        fn empty_target_dir() {
            let s = settings("", false, None);
            assert_eq!(s.report_url(&repo(), ""), "https://octo.github.io/site/");
        }

        #[test]
        fn relative_report_path_replaces_target() {
            let s = settings("reports", true, Some("latest"));
            assert_eq!(s.report_url(&repo(), "reports/abc"), "https://octo.github.io/site/latest/");
        }

        #[test]
        fn absolute_report_path_used_verbatim() {
            let s = settings("reports", true, Some("https://example.com/report"));
            assert_eq!(s.report_url(&repo(), "reports/abc"), "https://example.com/report/");
        }

        #[test]
        fn trailing_slash_not_doubled() {
            let s = settings("", false, Some("https://example.com/report/"));
            assert_eq!(s.report_url(&repo(), ""), "https://example.com/report/");
        }
    }

    mod settings_from_config {
        use super::*;

        #[test]
        fn defaults_applied() {
            let s = PublisherSettings::from_config(&PublisherConfig::default()).unwrap();
            assert_eq!(s, PublisherSettings::default());
        }

        #[test]
        fn empty_branch_is_unset() {
            let config = PublisherConfig {
                branch: Some(String::new()),
                ..Default::default()
            };
            assert_eq!(PublisherSettings::from_config(&config).unwrap().branch, None);
        }

        #[test]
        fn invalid_branch_rejected() {
            let config = PublisherConfig {
                branch: Some("bad branch".into()),
                ..Default::default()
            };
            assert!(matches!(
                PublisherSettings::from_config(&config),
                Err(DeployError::Configuration(_))
            ));
        }
    }

    mod publish {
        use super::*;

        struct Fixture {
            root: TempDir,
            runner: MockRunner,
        }

        impl Fixture {
            fn new() -> Self {
                let root = TempDir::new().unwrap();
                fs::create_dir_all(root.path().join(".reg")).unwrap();
                fs::write(root.path().join(".reg/index.html"), "report").unwrap();
                let runner = MockRunner::new();
                runner.fail("git diff --cached --quiet");
                Self { root, runner }
            }

            fn facade(&self, env: DeployEnv, config: PublisherConfig) -> PublisherFacade {
                let mut facade = PublisherFacade::new(
                    Arc::new(self.runner.clone()),
                    env,
                    self.root.path(),
                    self.root.path().join(".reg"),
                );
                facade.init(&config).unwrap();
                facade
            }
        }

        fn ci_env() -> DeployEnv {
            DeployEnv {
                repository: Some("octo/site".into()),
                ..Default::default()
            }
        }

        #[tokio::test]
        async fn unknown_repository_returns_no_url() {
            let fx = Fixture::new();
            let config = PublisherConfig {
                branch: Some("gh-pages".into()),
                out_dir: Some("reports".into()),
                ..Default::default()
            };

            let result = fx.facade(DeployEnv::default(), config).publish("abc").await.unwrap();

            assert_eq!(result.report_url, None);
            assert!(fx.runner.lines().is_empty());
        }

        #[tokio::test]
        async fn no_branch_only_computes_url() {
            let fx = Fixture::new();
            let config = PublisherConfig {
                out_dir: Some("reports".into()),
                ..Default::default()
            };

            let result = fx.facade(ci_env(), config).publish("abc").await.unwrap();

            assert_eq!(result.report_url.as_deref(), Some("https://octo.github.io/site/reports/"));
            assert_eq!(result.deployment, None);
            assert!(fx.runner.lines().is_empty());
        }

        #[tokio::test]
        async fn empty_target_skips_deployment() {
            let fx = Fixture::new();
            let config = PublisherConfig {
                branch: Some("gh-pages".into()),
                ..Default::default()
            };

            let result = fx.facade(ci_env(), config).publish("abc").await.unwrap();

            assert_eq!(result.report_url.as_deref(), Some("https://octo.github.io/site/"));
            assert_eq!(result.deployment, None);
            assert!(fx.runner.lines().is_empty());
        }

        #[tokio::test]
        async fn deploys_working_dir_with_default_message() {
            let fx = Fixture::new();
            let config = PublisherConfig {
                branch: Some("gh-pages".into()),
                out_dir: Some("reports".into()),
                include_commit_hash: Some(true),
                ..Default::default()
            };

            let result = fx.facade(ci_env(), config).publish("abc").await.unwrap();

            assert_eq!(
                result.report_url.as_deref(),
                Some("https://octo.github.io/site/reports/abc/")
            );
            assert_eq!(
                result.deployment,
                Some(DeployOutcome::Published {
                    push: PushOutcome::Direct,
                    pages: None
                })
            );
            assert_eq!(fx.runner.count(r#"git commit -m "deploy: abc""#), 1);
            assert!(fx.root.path().join(".reg/index.html").is_file());
            assert!(!fx.root.path().join(STAGING_DIR).exists());
        }

        #[tokio::test]
        async fn custom_source_and_message() {
            let fx = Fixture::new();
            fs::create_dir_all(fx.root.path().join("out")).unwrap();
            fs::write(fx.root.path().join("out/a.txt"), "a").unwrap();
            let config = PublisherConfig {
                branch: Some("gh-pages".into()),
                out_dir: Some("docs".into()),
                source_dir: Some("out".into()),
                commit_message: Some("publish docs".into()),
                ..Default::default()
            };

            fx.facade(ci_env(), config).publish("abc").await.unwrap();

            assert_eq!(fx.runner.count(r#"git commit -m "publish docs""#), 1);
            assert!(fx.root.path().join("out/a.txt").is_file());
        }

        #[tokio::test]
        async fn artifact_without_actions_fails() {
            let fx = Fixture::new();
            let config = PublisherConfig {
                branch: Some("gh-pages".into()),
                out_dir: Some("reports".into()),
                artifact_deploy: Some(true),
                ..Default::default()
            };

            let err = fx.facade(ci_env(), config).publish("abc").await.unwrap_err();

            assert!(matches!(err, DeployError::Configuration(_)));
            assert!(fx.runner.lines().is_empty());
        }
    }

    mod prepare {
        use super::*;

        #[test]
        fn keeps_non_empty_answers() {
            let config = prepare(Some("gh-pages"), Some("reports"));
            assert_eq!(config.branch.as_deref(), Some("gh-pages"));
            assert_eq!(config.out_dir.as_deref(), Some("reports"));
        }

        #[test]
        fn drops_empty_answers() {
            assert_eq!(prepare(Some(""), Some("  ")), PublisherConfig::default());
            assert_eq!(prepare(None, None), PublisherConfig::default());
        }
    }

    #[test]
    fn fetch_is_a_noop() {
        let facade = PublisherFacade::new(
            Arc::new(MockRunner::new()),
            DeployEnv::default(),
            "/nonexistent",
            "/nonexistent",
        );
        assert!(facade.fetch().is_ok());
    }
}
