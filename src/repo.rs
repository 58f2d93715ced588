// Plugin discovery, update logic, result types

use crate::bundle::{BundleDir, ResolveError};
use crate::config::Config;
use crate::constants::{DEFAULT_PLUGIN_NAME, GIT_DIR};
use crate::git::{self, Divergence, GitLogger};
use anyhow::Context;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginStatus {
    Repository,
    NotRepository,
    /// The entry could not be inspected; it is excluded from the update.
    Unreadable(String),
}

/// An immediate child of the bundle directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginCandidate {
    pub name: String,
    pub path: PathBuf,
    pub status: PluginStatus,
}

impl PluginCandidate {
    #[must_use]
    pub fn is_repository(&self) -> bool {
        self.status == PluginStatus::Repository
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStep {
    Started,
    EnteringDirectory,
    RefreshingRemote,
    CheckingUpstream,
    Pulling,
    Completed,
}

impl fmt::Display for UpdateStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            UpdateStep::Started => "Starting update",
            UpdateStep::EnteringDirectory => "Entering plugin directory",
            UpdateStep::RefreshingRemote => "Updating remote origin",
            UpdateStep::CheckingUpstream => "Comparing with upstream",
            UpdateStep::Pulling => "Pulling changes",
            UpdateStep::Completed => "Completed",
        };
        f.write_str(message)
    }
}

#[derive(Debug)]
pub struct UpdateResult {
    pub path: PathBuf,
    pub outcome: UpdateOutcome,
    pub duration: Duration,
}

impl UpdateResult {
    pub fn name(&self) -> &str {
        plugin_name(&self.path)
    }
}

#[derive(Debug)]
struct UpdateError {
    source: anyhow::Error,
    step: UpdateStep,
}

/// What a successful pull changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullSummary {
    pub upstream: String,
    /// Upstream commits missing locally before the pull.
    pub behind: u32,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFailure {
    pub error: String,
    pub step: UpdateStep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated(PullSummary),
    UpToDate,
    /// Detached HEAD or a branch without upstream; nothing to pull from.
    NoUpstream,
    /// Local commits on top of an outdated branch. Never pulled, so no
    /// merge or rebase is forced onto the plugin.
    Diverged(Divergence),
    Failed(UpdateFailure),
}

impl UpdateOutcome {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, UpdateOutcome::Failed(_))
    }

    #[must_use]
    pub fn is_updated(&self) -> bool {
        matches!(self, UpdateOutcome::Updated(_))
    }
}

/// Hooks into the progress of a single plugin update.
///
/// Implementations are created per plugin by [`update_bundle`] and called
/// from that plugin's worker thread.
pub trait UpdateCallbacks {
    fn on_update_start(&self, _plugin_name: &str) {}
    fn on_step(&self, step: &UpdateStep);
    fn on_complete(&self, result: &UpdateResult);
}

/// Last path component, used as the plugin's display name.
pub fn plugin_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_PLUGIN_NAME)
}

/// Whether `path` has an immediate entry named `.git`.
///
/// Both a `.git` directory and a `.git` file (worktrees, submodules) count.
pub fn is_git_repo(path: &Path) -> std::io::Result<bool> {
    for entry in std::fs::read_dir(path)? {
        if entry?.file_name() == GIT_DIR {
            return Ok(true);
        }
    }
    Ok(false)
}

fn classify(path: PathBuf) -> PluginCandidate {
    let name = plugin_name(&path).to_string();
    let status = match std::fs::metadata(&path) {
        Err(err) => PluginStatus::Unreadable(err.to_string()),
        Ok(metadata) if !metadata.is_dir() => PluginStatus::NotRepository,
        Ok(_) => match is_git_repo(&path) {
            Ok(true) => PluginStatus::Repository,
            Ok(false) => PluginStatus::NotRepository,
            Err(err) => PluginStatus::Unreadable(err.to_string()),
        },
    };
    PluginCandidate { name, path, status }
}

/// Placeholder for a listing entry that could not even be named.
pub const UNLISTED_ENTRY_NAME: &str = "<unreadable entry>";

fn unlisted_entry(bundle: &BundleDir, err: &std::io::Error) -> PluginCandidate {
    PluginCandidate {
        name: UNLISTED_ENTRY_NAME.to_string(),
        path: bundle.path().to_path_buf(),
        status: PluginStatus::Unreadable(format!(
            "failed to read an entry of {}: {}",
            bundle.path().display(),
            err
        )),
    }
}

/// Lists the immediate children of the bundle and classifies each one.
///
/// Candidates come back in directory-listing order. A child that cannot be
/// inspected is marked [`PluginStatus::Unreadable`] instead of failing the
/// whole scan.
pub fn discover_plugins(bundle: &BundleDir) -> Result<Vec<PluginCandidate>, ResolveError> {
    let entries = std::fs::read_dir(bundle.path()).map_err(|source| ResolveError::NotFound {
        path: bundle.path().to_path_buf(),
        source,
    })?;

    Ok(entries
        .map(|entry| match entry {
            Ok(entry) => classify(entry.path()),
            Err(err) => unlisted_entry(bundle, &err),
        })
        .collect())
}

/// Paths of the plugins that are git repositories, in listing order.
pub fn find_plugin_repos(bundle: &BundleDir) -> Result<Vec<PathBuf>, ResolveError> {
    Ok(discover_plugins(bundle)?
        .into_iter()
        .filter(PluginCandidate::is_repository)
        .map(|candidate| candidate.path)
        .collect())
}

fn at_step<T>(step: UpdateStep, result: anyhow::Result<T>) -> Result<T, UpdateError> {
    result.map_err(|e| UpdateError { source: e, step })
}

fn ensure_accessible(path: &Path) -> anyhow::Result<()> {
    std::fs::read_dir(path)
        .with_context(|| format!("Cannot enter plugin directory {}", path.display()))?;
    Ok(())
}

/// Updates a single plugin repository.
///
/// Never panics on git failures: any error ends up in
/// [`UpdateOutcome::Failed`] together with the step that failed.
pub fn update<C>(path: &Path, callbacks: &C, config: &Config) -> UpdateResult
where
    C: UpdateCallbacks + ?Sized,
{
    let start = Instant::now();
    callbacks.on_update_start(plugin_name(path));

    let outcome = match do_update(path, callbacks, config.git_logger()) {
        Ok(outcome) => outcome,
        Err(err) => UpdateOutcome::Failed(UpdateFailure {
            error: format!("{:#}", err.source),
            step: err.step,
        }),
    };

    let result = UpdateResult {
        path: path.to_path_buf(),
        outcome,
        duration: start.elapsed(),
    };
    callbacks.on_complete(&result);
    result
}

fn do_update<C>(path: &Path, callbacks: &C, logger: GitLogger) -> Result<UpdateOutcome, UpdateError>
where
    C: UpdateCallbacks + ?Sized,
{
    callbacks.on_step(&UpdateStep::Started);

    callbacks.on_step(&UpdateStep::EnteringDirectory);
    at_step(UpdateStep::EnteringDirectory, ensure_accessible(path))?;

    callbacks.on_step(&UpdateStep::RefreshingRemote);
    at_step(UpdateStep::RefreshingRemote, git::remote_update(path, logger))?;

    callbacks.on_step(&UpdateStep::CheckingUpstream);
    let Some(upstream) = at_step(UpdateStep::CheckingUpstream, git::upstream(path, logger))? else {
        callbacks.on_step(&UpdateStep::Completed);
        return Ok(UpdateOutcome::NoUpstream);
    };
    let divergence = at_step(UpdateStep::CheckingUpstream, git::divergence(path, logger))?;
    if divergence.has_diverged() {
        callbacks.on_step(&UpdateStep::Completed);
        return Ok(UpdateOutcome::Diverged(divergence));
    }
    if !divergence.can_fast_forward() {
        callbacks.on_step(&UpdateStep::Completed);
        return Ok(UpdateOutcome::UpToDate);
    }

    callbacks.on_step(&UpdateStep::Pulling);
    let from = at_step(UpdateStep::Pulling, git::head_commit(path, logger))?;
    at_step(UpdateStep::Pulling, git::pull(path, logger))?;
    let to = at_step(UpdateStep::Pulling, git::head_commit(path, logger))?;

    callbacks.on_step(&UpdateStep::Completed);

    Ok(UpdateOutcome::Updated(PullSummary {
        upstream,
        behind: divergence.behind,
        from,
        to,
    }))
}

/// Updates every plugin concurrently, one worker per plugin.
///
/// Returns once all workers have reported, with results in the same order
/// as `repos`. `make_callbacks` is called on the worker that updates the
/// given plugin.
pub fn update_bundle<C, F>(
    repos: &[PathBuf],
    make_callbacks: F,
    config: &Config,
) -> anyhow::Result<Vec<UpdateResult>>
where
    C: UpdateCallbacks,
    F: Fn(&Path) -> C + Sync,
{
    if repos.is_empty() {
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(repos.len())
        .thread_name(|i| format!("plugin-update-{i}"))
        .build()
        .context("Failed to start plugin update workers")?;

    let (tx, rx) = mpsc::channel();
    let make_callbacks = &make_callbacks;
    pool.scope(|scope| {
        for (index, path) in repos.iter().enumerate() {
            let tx = tx.clone();
            scope.spawn(move |_| {
                let callbacks = make_callbacks(path);
                let result = update(path, &callbacks, config);
                // rx lives until every worker has finished.
                let _ = tx.send((index, result));
            });
        }
    });
    drop(tx);

    let mut slots: Vec<Option<UpdateResult>> = repos.iter().map(|_| None).collect();
    for (index, result) in rx {
        slots[index] = Some(result);
    }
    slots
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .context("A plugin update worker exited without reporting a result")
}
