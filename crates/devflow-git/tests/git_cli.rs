//! Branch lifecycle against a real temporary repository.
//!
//! Each test returns early when `git` is not installed.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use devflow_git::{BranchError, BranchManager, GitCli, VersionControl};
use devflow_models::{Task, TaskKind};
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .unwrap()
        .status;
    assert!(status.success(), "git {:?} failed", args);
}

/// A repository on `main` with one commit.
fn init_repo() -> Option<TempDir> {
    if !GitCli::is_available() {
        eprintln!("git not installed, skipping");
        return None;
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path();
    git(path, &["init", "-q"]);
    git(path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(path, &["config", "user.email", "devflow@example.com"]);
    git(path, &["config", "user.name", "Devflow Test"]);
    git(path, &["config", "commit.gpgsign", "false"]);
    fs::write(path.join("README.md"), "# demo\n").unwrap();
    git(path, &["add", "README.md"]);
    git(path, &["commit", "-q", "-m", "initial"]);
    Some(dir)
}

fn task(slug: &str) -> Task {
    Task::new(slug, TaskKind::FeatureText, slug, "javascript")
}

#[test]
fn test_feature_branch_is_created_and_resumed() {
    let Some(dir) = init_repo() else { return };
    let vcs = Arc::new(GitCli::new(dir.path()));
    let manager = BranchManager::new(vcs.clone(), "origin", None);

    let first = manager.ensure_feature_branch(&task("login-form")).unwrap();
    assert_eq!(first.trunk_name, "main");
    assert_eq!(first.feature_branch_name, "feature/login-form");
    assert!(!first.exists_locally);
    assert_eq!(
        vcs.current_branch().unwrap().as_deref(),
        Some("feature/login-form")
    );

    let second = manager.ensure_feature_branch(&task("login-form")).unwrap();
    assert_eq!(second.feature_branch_name, first.feature_branch_name);
    assert!(second.exists_locally);
}

#[test]
fn test_dirty_tree_is_stashed() {
    let Some(dir) = init_repo() else { return };
    fs::write(dir.path().join("wip.txt"), "unsaved").unwrap();
    let vcs = Arc::new(GitCli::new(dir.path()));

    let state = BranchManager::new(vcs.clone(), "origin", None)
        .ensure_feature_branch(&task("auth"))
        .unwrap();

    assert!(state.stashed);
    assert!(!vcs.has_uncommitted_changes().unwrap());
    assert!(!dir.path().join("wip.txt").exists());
}

#[test]
fn test_stage_commit_and_log() {
    let Some(dir) = init_repo() else { return };
    let vcs = GitCli::new(dir.path());

    fs::write(dir.path().join("auth.py"), "def login(): pass\n").unwrap();
    assert_eq!(vcs.changed_files().unwrap(), vec!["auth.py"]);

    vcs.stage_all().unwrap();
    assert!(vcs.staged_diff().unwrap().contains("def login"));

    let sha = vcs.commit("feat: add login").unwrap();
    assert_eq!(sha.len(), 40);
    assert!(vcs.log(1).unwrap()[0].ends_with("feat: add login"));
}

#[test]
fn test_changed_files_lists_files_inside_new_directories() {
    let Some(dir) = init_repo() else { return };
    let vcs = GitCli::new(dir.path());

    fs::create_dir_all(dir.path().join("src/auth")).unwrap();
    fs::write(dir.path().join("src/auth/login.py"), "def login(): pass\n").unwrap();
    fs::write(dir.path().join("src/auth/with space.py"), "x = 1\n").unwrap();
    fs::write(dir.path().join("README.md"), "# changed\n").unwrap();

    let mut files = vcs.changed_files().unwrap();
    files.sort();
    assert_eq!(
        files,
        vec!["README.md", "src/auth/login.py", "src/auth/with space.py"]
    );
}

#[test]
fn test_commit_with_nothing_staged_fails() {
    let Some(dir) = init_repo() else { return };
    let vcs = GitCli::new(dir.path());
    assert!(vcs.staged_diff().unwrap().is_empty());
    assert!(vcs.commit("nothing").is_err());
}

#[test]
fn test_no_remote_configured() {
    let Some(dir) = init_repo() else { return };
    let vcs = GitCli::new(dir.path());
    assert_eq!(vcs.remote_url("origin").unwrap(), None);
    assert_eq!(vcs.remote_default_branch("origin").unwrap(), None);
    assert!(vcs.push("origin", "main").is_err());
}

#[test]
fn test_plain_directory_is_not_a_repository() {
    if !GitCli::is_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let err = BranchManager::new(Arc::new(GitCli::new(dir.path())), "origin", None)
        .ensure_feature_branch(&task("x"))
        .unwrap_err();
    assert!(matches!(err, BranchError::NotARepository(_)));
}
