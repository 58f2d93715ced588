//! Test infrastructure for pathogen-update integration tests.
#![allow(dead_code)]

use anyhow::{Context, Result};
use pathogen_update::config::{Config, Verbosity};
use pathogen_update::git::run_git;
use pathogen_update::repo::{UpdateCallbacks, UpdateResult, UpdateStep};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub fn test_config() -> Config {
    Config {
        verbosity: Verbosity::Quiet,
    }
}

fn path_arg(path: &Path) -> Result<&str> {
    path.to_str().context("test path is not valid UTF-8")
}

pub fn configure_identity(repo: &Path) -> Result<()> {
    run_git(repo, &["config", "user.email", "test@example.com"])?;
    run_git(repo, &["config", "user.name", "Test User"])?;
    Ok(())
}

/// Initializes a repository with one commit on `branch`.
pub fn init_repo(path: &Path, branch: &str) -> Result<()> {
    std::fs::create_dir_all(path)?;
    run_git(path, &["init", "-b", branch])?;
    configure_identity(path)?;
    commit_file(path, "README.md", "# Plugin\n", "Initial commit")?;
    Ok(())
}

pub fn commit_file(repo: &Path, name: &str, contents: &str, message: &str) -> Result<()> {
    std::fs::write(repo.join(name), contents)?;
    run_git(repo, &["add", name])?;
    run_git(repo, &["commit", "-m", message])?;
    Ok(())
}

pub fn head(repo: &Path) -> Result<String> {
    run_git(repo, &["rev-parse", "HEAD"])
}

/// A bare remote plus a working clone used to publish new commits to it.
/// Cleaned up when dropped.
pub struct Upstream {
    _temp_dir: TempDir,
    bare: PathBuf,
    writer: PathBuf,
}

impl Upstream {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let bare = temp_dir.path().join("remote.git");
        let writer = temp_dir.path().join("writer");

        std::fs::create_dir_all(&bare)?;
        run_git(&bare, &["init", "--bare"])?;

        init_repo(&writer, "master")?;
        run_git(&writer, &["remote", "add", "origin", path_arg(&bare)?])?;
        run_git(&writer, &["push", "-u", "origin", "master"])?;

        Ok(Self {
            _temp_dir: temp_dir,
            bare,
            writer,
        })
    }

    pub fn bare(&self) -> &Path {
        &self.bare
    }

    /// Clones master into `dest`, tracking `origin/master`.
    pub fn clone_into(&self, dest: &Path) -> Result<()> {
        let parent = dest.parent().context("clone destination has no parent")?;
        run_git(
            parent,
            &["clone", "-b", "master", path_arg(&self.bare)?, path_arg(dest)?],
        )?;
        configure_identity(dest)?;
        Ok(())
    }

    /// Publishes a new commit upstream and returns its id.
    pub fn push_commit(&self, file: &str, contents: &str) -> Result<String> {
        commit_file(&self.writer, file, contents, &format!("Update {}", file))?;
        run_git(&self.writer, &["push", "origin", "master"])?;
        head(&self.writer)
    }
}

/// Adds a plugin named `name` to `bundle`, cloned from a fresh upstream.
pub fn add_plugin(bundle: &Path, name: &str) -> Result<Upstream> {
    let upstream = Upstream::new()?;
    upstream.clone_into(&bundle.join(name))?;
    Ok(upstream)
}

/// Adds a plugin and publishes one more upstream commit so it starts behind.
pub fn add_outdated_plugin(bundle: &Path, name: &str) -> Result<Upstream> {
    let upstream = add_plugin(bundle, name)?;
    upstream.push_commit(&format!("{}.vim", name), &format!("\" {}\n", name))?;
    Ok(upstream)
}

/// Records every step and result it is notified about.
#[derive(Clone, Default)]
pub struct RecordingCallbacks {
    pub steps: Arc<Mutex<Vec<UpdateStep>>>,
    pub completed: Arc<Mutex<Vec<PathBuf>>>,
}

impl RecordingCallbacks {
    pub fn steps(&self) -> Vec<UpdateStep> {
        self.steps.lock().expect("steps lock").clone()
    }

    pub fn completed(&self) -> Vec<PathBuf> {
        self.completed.lock().expect("completed lock").clone()
    }
}

impl UpdateCallbacks for RecordingCallbacks {
    fn on_step(&self, step: &UpdateStep) {
        self.steps.lock().expect("steps lock").push(step.clone());
    }

    fn on_complete(&self, result: &UpdateResult) {
        self.completed
            .lock()
            .expect("completed lock")
            .push(result.path.clone());
    }
}
