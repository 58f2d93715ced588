//! Git command wrappers.
//!
//! This module provides a thin wrapper around git CLI commands,
//! handling command execution and error formatting.
//!
//! Every command is rooted at the repository it targets through
//! [`Command::current_dir`]; the process working directory is never
//! changed, so any number of plugins can be updated concurrently.

use crate::constants::ORIGIN_REMOTE;
use anyhow::Context;
use colored::Colorize;
use std::path::Path;
use std::process::{Command, Output};

/// Callback invoked before each git command runs.
pub type GitLogger = fn(&Path, &[&str]);

/// Prints each git command with the repository it runs in.
pub fn verbose_logger(repo: &Path, args: &[&str]) {
    eprintln!(
        "    {} git {} {}",
        "$".dimmed(),
        args.join(" "),
        format!("({})", repo.display()).dimmed()
    );
}

pub fn no_op_logger(_repo: &Path, _args: &[&str]) {}

/// Commits between the local branch and its upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Divergence {
    pub ahead: u32,
    pub behind: u32,
}

impl Divergence {
    #[must_use]
    pub fn is_behind(&self) -> bool {
        self.behind > 0
    }

    /// Both sides have commits the other lacks.
    #[must_use]
    pub fn has_diverged(&self) -> bool {
        self.ahead > 0 && self.behind > 0
    }

    /// Behind with no local commits, so a pull is a plain fast-forward.
    #[must_use]
    pub fn can_fast_forward(&self) -> bool {
        self.is_behind() && self.ahead == 0
    }
}

fn git_output(repo: &Path, args: &[&str]) -> anyhow::Result<Output> {
    Command::new("git")
        .current_dir(repo)
        .args(args)
        // Never block a worker on a credential prompt.
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .with_context(|| format!("Failed to execute git in {}", repo.display()))
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub fn run_git(repo: &Path, args: &[&str]) -> anyhow::Result<String> {
    let output = git_output(repo, args)?;

    if output.status.success() {
        Ok(stdout_of(&output))
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git {} failed: {}", args.join(" "), stderr.trim())
    }
}

/// Like [`run_git`], but a non-zero exit status yields `Ok(None)`.
/// Only a failure to launch git at all is an error.
fn try_git(repo: &Path, args: &[&str]) -> anyhow::Result<Option<String>> {
    let output = git_output(repo, args)?;
    Ok(output.status.success().then(|| stdout_of(&output)))
}

/// Refreshes remote-tracking refs without touching the working tree.
pub fn remote_update(repo: &Path, logger: GitLogger) -> anyhow::Result<()> {
    let args = ["remote", "update", ORIGIN_REMOTE];
    logger(repo, &args);
    run_git(repo, &args).context("Failed to update remote")?;
    Ok(())
}

/// Returns the upstream of the current branch, e.g. `origin/master`.
///
/// `None` when HEAD is detached or the branch tracks nothing.
pub fn upstream(repo: &Path, logger: GitLogger) -> anyhow::Result<Option<String>> {
    let args = ["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{upstream}"];
    logger(repo, &args);
    try_git(repo, &args).context("Failed to resolve upstream branch")
}

pub fn divergence(repo: &Path, logger: GitLogger) -> anyhow::Result<Divergence> {
    let args = ["rev-list", "--left-right", "--count", "HEAD...@{upstream}"];
    logger(repo, &args);
    let output = run_git(repo, &args).context("Failed to compare with upstream")?;
    parse_divergence(&output)
}

/// Parses the `<ahead>\t<behind>` output of `git rev-list --left-right --count`.
pub fn parse_divergence(output: &str) -> anyhow::Result<Divergence> {
    let mut counts = output.split_whitespace().map(str::parse::<u32>);
    match (counts.next(), counts.next(), counts.next()) {
        (Some(Ok(ahead)), Some(Ok(behind)), None) => Ok(Divergence { ahead, behind }),
        _ => anyhow::bail!("Unexpected rev-list output: {:?}", output),
    }
}

pub fn head_commit(repo: &Path, logger: GitLogger) -> anyhow::Result<String> {
    let args = ["rev-parse", "--short", "HEAD"];
    logger(repo, &args);
    run_git(repo, &args).context("Failed to read HEAD commit")
}

pub fn pull(repo: &Path, logger: GitLogger) -> anyhow::Result<()> {
    let args = ["pull"];
    logger(repo, &args);
    run_git(repo, &args).context("Failed to pull from remote")?;
    Ok(())
}
