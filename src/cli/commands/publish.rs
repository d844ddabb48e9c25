//! publish command - Deploy a directory and print its report URL

use crate::cli::args::PublishOverrides;
use crate::cli::Context;
use crate::core::config::Config;
use crate::core::env::DeployEnv;
use crate::core::lock::PublishLock;
use crate::deploy::DeployOutcome;
use crate::git::{GitCli, Repository};
use crate::pages::ArtifactDeployer;
use crate::publisher::{PublisherFacade, DEFAULT_WORKING_DIR};
use anyhow::{Context as _, Result};
use std::sync::Arc;

/// Publish the content for `key`.
///
/// Holds the repository's publish lock for the whole run so two jobs on
/// the same runner cannot share the staging worktree.
pub fn publish(ctx: &Context, key: &str, overrides: &PublishOverrides) -> Result<()> {
    let cwd = ctx.cwd()?;
    let repo = Repository::open(&cwd).context("Failed to open repository")?;
    let info = repo.info()?;

    let loaded = Config::load(Some(&info.work_dir), ctx.config.as_deref())
        .context("Failed to load configuration")?;
    for source in &loaded.sources {
        tracing::debug!(path = %source.display(), "config source");
    }
    let config = loaded
        .config
        .with_overrides(overrides.to_config())
        .context("Invalid command-line option")?;

    let env = DeployEnv::from_process();
    tracing::debug!(?env, "environment");

    let mut publisher = PublisherFacade::new(
        Arc::new(GitCli::new(&info.work_dir)),
        env.clone(),
        &info.work_dir,
        info.work_dir.join(DEFAULT_WORKING_DIR),
    );
    if config.publisher().artifact_deploy == Some(true) && env.github_actions {
        let deployer = ArtifactDeployer::from_env(&env)
            .context("Artifact deployment needs the Actions runtime environment")?;
        publisher = publisher.with_artifact_deployer(deployer);
    }
    publisher.init(config.publisher())?;

    let _lock = PublishLock::acquire(&info.git_dir)?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let result = runtime
        .block_on(publisher.publish(key))
        .context("Deployment failed")?;

    if !ctx.quiet {
        match &result.deployment {
            Some(DeployOutcome::Unchanged) => println!("No changes to deploy."),
            Some(DeployOutcome::Published { pages, .. }) => {
                println!("Deployed '{}'.", key);
                if let Some(page_url) = pages.as_ref().and_then(|p| p.page_url.as_deref()) {
                    println!("Pages deployment: {}", page_url);
                }
            }
            None => {}
        }
    }

    if let Some(url) = &result.report_url {
        println!("{}", url);
    }

    Ok(())
}
