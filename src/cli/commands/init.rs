//! init command - Write the repository config file

use crate::cli::Context;
use crate::core::config::Config;
use crate::git::Repository;
use crate::publisher::prepare;
use anyhow::{bail, Context as _, Result};
use std::io::{self, BufRead, Write};

/// Write `.ghpages.toml` at the repository root.
///
/// Without `branch`/`out_dir` and in interactive mode, asks for both.
/// Empty answers are omitted from the file.
pub fn init(ctx: &Context, branch: Option<&str>, out_dir: Option<&str>, force: bool) -> Result<()> {
    let cwd = ctx.cwd()?;
    let repo = Repository::open(&cwd).context("Failed to open repository")?;
    let info = repo.info()?;

    let path = Config::repo_config_path(&info.work_dir);
    if path.exists() && !force {
        bail!("{} already exists. Use --force to overwrite.", path.display());
    }

    let (branch, out_dir) = if branch.is_none() && out_dir.is_none() && ctx.interactive {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let branch = ask(
            &mut input,
            "Branch name to deploy (leave empty to only generate the report URL): ",
        )?;
        let out_dir = ask(&mut input, "Output directory on the branch: ")?;
        (Some(branch), Some(out_dir))
    } else {
        (branch.map(String::from), out_dir.map(String::from))
    };

    let config = prepare(branch.as_deref(), out_dir.as_deref());
    let written = Config::write_repo(&info.work_dir, &config)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    if !ctx.quiet {
        println!("Wrote {}", written.display());
    }
    Ok(())
}

fn ask(input: &mut impl BufRead, question: &str) -> Result<String> {
    print!("{}", question);
    io::stdout().flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}
