//! Repository fixtures shared by the unit tests.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;

use tempfile::TempDir;

use crate::facade::Facade;

/// Run the git CLI in `dir`, panicking on failure. Returns trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Write `contents` to `rel` under `root`, creating parent directories.
pub fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(path, contents).expect("Failed to write file");
}

/// Empty repository with a local test identity.
pub fn init_repo() -> (TempDir, Facade) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let mut facade = Facade::new();
    facade.init(temp.path(), false).expect("Failed to init repo");
    facade.set_config("user.name", "Test User").unwrap();
    facade.set_config("user.email", "test@example.com").unwrap();
    (temp, facade)
}

/// Repository with `README.md` committed as "Initial commit".
pub fn init_repo_with_commit() -> (TempDir, Facade) {
    let (temp, mut facade) = init_repo();
    write(temp.path(), "README.md", "# Test\n");
    facade.stage(&["README.md"]).unwrap();
    facade.commit("Initial commit", None).unwrap();
    (temp, facade)
}

/// Bare repository registered as `origin` of `work`, with the current
/// branch pushed and tracked.
pub fn bare_remote(work: &Path) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let remote = dir.path().join("remote.git");
    git(dir.path(), &["init", "--bare", "remote.git"]);

    let remote_str = remote.to_str().unwrap();
    git(work, &["remote", "add", "origin", remote_str]);
    git(work, &["push", "-u", "origin", "HEAD"]);

    let branch = git(work, &["symbolic-ref", "--short", "HEAD"]);
    git(&remote, &["symbolic-ref", "HEAD", &format!("refs/heads/{branch}")]);
    (dir, remote)
}

/// Second working copy of `remote`, for simulating another contributor.
pub fn clone_peer(remote: &Path) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    git(dir.path(), &["clone", remote.to_str().unwrap(), "peer"]);

    let peer = dir.path().join("peer");
    git(&peer, &["config", "user.name", "Peer"]);
    git(&peer, &["config", "user.email", "peer@example.com"]);
    (dir, peer)
}
