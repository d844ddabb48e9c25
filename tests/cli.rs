//! Integration tests for the `ghpages` binary.
//!
//! These tests exercise the full CLI against real git repositories. The
//! environment is scrubbed so results do not depend on the machine running
//! them (a CI runner sets most of the variables the tool reads).

use std::fs;
use std::path::Path;
use std::process::Command as StdCommand;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SCRUBBED: [&str; 12] = [
    "GITHUB_ACTOR",
    "GITHUB_ACTIONS",
    "GITHUB_TOKEN",
    "GITHUB_SHA",
    "GITHUB_REPOSITORY",
    "RUNNER_TEMP",
    "ACTIONS_ID_TOKEN_REQUEST_URL",
    "ACTIONS_ID_TOKEN_REQUEST_TOKEN",
    "ACTIONS_RUNTIME_TOKEN",
    "ACTIONS_RESULTS_URL",
    "GHPAGES_CONFIG",
    "RUST_LOG",
];

/// Get a command for running ghpages with a clean environment.
fn ghpages(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ghpages").unwrap();
    for var in SCRUBBED {
        cmd.env_remove(var);
    }
    cmd.env("HOME", home).env("XDG_CONFIG_HOME", home.join(".config"));
    cmd
}

fn run_git(dir: &Path, args: &[&str]) {
    let status = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git")
        .status;
    assert!(status.success(), "git {:?} failed", args);
}

/// Bare remote and a clone with one pushed commit, plus a `.reg` report.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        run_git(dir.path(), &["init", "--bare", "remote.git"]);
        run_git(dir.path(), &["clone", "remote.git", "work"]);
        let work = dir.path().join("work");
        run_git(&work, &["config", "user.email", "test@example.com"]);
        run_git(&work, &["config", "user.name", "Test User"]);
        fs::write(work.join("README.md"), "# Test\n").unwrap();
        run_git(&work, &["add", "README.md"]);
        run_git(&work, &["commit", "-m", "Initial commit"]);
        run_git(&work, &["push", "origin", "HEAD"]);

        fs::create_dir_all(work.join(".reg")).unwrap();
        fs::write(work.join(".reg/index.html"), "<h1>report</h1>").unwrap();
        Self { dir }
    }

    fn home(&self) -> std::path::PathBuf {
        self.dir.path().join("home")
    }

    fn work(&self) -> std::path::PathBuf {
        self.dir.path().join("work")
    }

    fn remote(&self) -> std::path::PathBuf {
        self.dir.path().join("remote.git")
    }

    fn cmd(&self) -> Command {
        let mut cmd = ghpages(&self.home());
        cmd.current_dir(self.work());
        cmd
    }
}

#[test]
fn help_flag_works() {
    let home = TempDir::new().unwrap();
    ghpages(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("publish"))
        .stdout(predicate::str::contains("completion"));
}

#[test]
fn version_flag_works() {
    let home = TempDir::new().unwrap();
    ghpages(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ghpages"));
}

#[test]
fn completion_generates_script() {
    let home = TempDir::new().unwrap();
    ghpages(home.path())
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ghpages"));
}

#[test]
fn fetch_warns_and_succeeds() {
    let home = TempDir::new().unwrap();
    ghpages(home.path())
        .current_dir(home.path())
        .arg("fetch")
        .assert()
        .success()
        .stderr(predicate::str::contains("not implemented"));
}

mod init {
    use super::*;

    #[test]
    fn writes_non_empty_answers() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["init", "--branch", "gh-pages", "--out-dir", "reports"])
            .assert()
            .success()
            .stdout(predicate::str::contains(".ghpages.toml"));

        let written = fs::read_to_string(ws.work().join(".ghpages.toml")).unwrap();
        assert!(written.contains(r#"branch = "gh-pages""#));
        assert!(written.contains(r#"out_dir = "reports""#));
    }

    #[test]
    fn empty_branch_is_omitted() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["--no-interactive", "init", "--branch", "", "--out-dir", "reports"])
            .assert()
            .success();

        let written = fs::read_to_string(ws.work().join(".ghpages.toml")).unwrap();
        assert!(!written.contains("branch"));
        assert!(written.contains("out_dir"));
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let ws = Workspace::new();
        fs::write(ws.work().join(".ghpages.toml"), "branch = \"keep\"\n").unwrap();

        ws.cmd()
            .args(["init", "--branch", "gh-pages"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--force"));

        ws.cmd()
            .args(["init", "--branch", "gh-pages", "--force"])
            .assert()
            .success();
        let written = fs::read_to_string(ws.work().join(".ghpages.toml")).unwrap();
        assert!(written.contains("gh-pages"));
    }

    #[test]
    fn fails_outside_repository() {
        let home = TempDir::new().unwrap();
        ghpages(home.path())
            .current_dir(home.path())
            .args(["init", "--branch", "gh-pages"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to open repository"));
    }
}

mod publish {
    use super::*;

    #[test]
    fn prints_report_url_without_branch() {
        let ws = Workspace::new();
        ws.cmd()
            .env("GITHUB_REPOSITORY", "octo/site")
            .args(["publish", "abc", "--out-dir", "reports", "--include-commit-hash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("https://octo.github.io/site/reports/abc/"));
    }

    #[test]
    fn deploys_to_branch() {
        let ws = Workspace::new();
        ws.cmd()
            .env("GITHUB_REPOSITORY", "octo/site")
            .args(["publish", "abc", "--branch", "gh-pages", "--out-dir", "reports"])
            .assert()
            .success()
            .stdout(predicate::str::contains("https://octo.github.io/site/reports/"));

        let output = StdCommand::new("git")
            .args(["show", "gh-pages:reports/index.html"])
            .current_dir(ws.remote())
            .output()
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout), "<h1>report</h1>");
        assert!(ws.work().join(".reg/index.html").is_file());
    }

    #[test]
    fn repo_config_file_is_used() {
        let ws = Workspace::new();
        fs::write(
            ws.work().join(".ghpages.toml"),
            "out_dir = \"from-file\"\nreport_path = \"custom\"\n",
        )
        .unwrap();

        ws.cmd()
            .env("GITHUB_REPOSITORY", "octo/site")
            .args(["publish", "abc"])
            .assert()
            .success()
            .stdout(predicate::str::contains("https://octo.github.io/site/custom/"));
    }

    #[test]
    fn unknown_repository_prints_no_url() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["publish", "abc", "--out-dir", "reports"])
            .assert()
            .success()
            .stdout(predicate::str::contains("github.io").not())
            .stderr(predicate::str::contains("Unable to determine repository info"));
    }

    #[test]
    fn artifact_deploy_outside_actions_fails() {
        let ws = Workspace::new();
        ws.cmd()
            .env("GITHUB_REPOSITORY", "octo/site")
            .args([
                "publish",
                "abc",
                "--branch",
                "gh-pages",
                "--out-dir",
                "reports",
                "--artifact-deploy",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("only available in GitHub Actions"));

        assert!(ws.work().join(".reg/index.html").is_file());
    }

    #[test]
    fn invalid_config_file_is_reported() {
        let ws = Workspace::new();
        fs::write(ws.work().join(".ghpages.toml"), "outDir = \"camel\"\n").unwrap();

        ws.cmd()
            .env("GITHUB_REPOSITORY", "octo/site")
            .args(["publish", "abc"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to load configuration"));
    }
}
