//! fetch command - Not supported by this publisher

use crate::cli::Context;
use crate::core::env::DeployEnv;
use crate::git::GitCli;
use crate::publisher::PublisherFacade;
use anyhow::Result;
use std::sync::Arc;

pub fn fetch(ctx: &Context) -> Result<()> {
    let cwd = ctx.cwd()?;
    let publisher = PublisherFacade::new(Arc::new(GitCli::new(&cwd)), DeployEnv::from_process(), &cwd, &cwd);
    publisher.fetch()?;
    Ok(())
}
