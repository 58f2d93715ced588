//! Progress bars, colored output, and summary formatting.
//!
//! This module provides visual feedback while plugins are discovered and
//! updated, including the bundle progress bar and the final summary.

use crate::config::Config;
use crate::constants::{MAX_VISIBLE_COMPLETIONS, PROGRESS_TICK_MS};
use crate::repo::{
    PluginCandidate, PluginStatus, UpdateCallbacks, UpdateOutcome, UpdateResult, UpdateStep,
};
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Callbacks that ignore every event, for library callers and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOpCallbacks;

impl UpdateCallbacks for NoOpCallbacks {
    fn on_step(&self, _step: &UpdateStep) {}
    fn on_complete(&self, _result: &UpdateResult) {}
}

/// Prints a plugin header in verbose mode.
pub fn print_plugin_header(config: &Config, plugin_name: &str) {
    if !config.is_verbose() {
        return;
    }
    eprintln!("{}", format!("[{}]", plugin_name).white().bold());
}

/// Prints a step progress message in verbose mode.
/// Plugins update concurrently, so every line carries the plugin name.
pub fn print_step(config: &Config, plugin_name: &str, step: &UpdateStep) {
    if !config.is_verbose() {
        return;
    }
    eprintln!(
        "  {} {}...",
        format!("[{}]", plugin_name).dimmed(),
        step.to_string().dimmed()
    );
}

/// Prints completion status (verbose mode only).
pub fn print_completion_status(config: &Config, result: &UpdateResult) {
    if !config.is_verbose() {
        return;
    }
    eprintln!(
        "  {} {} {}",
        outcome_symbol(&result.outcome),
        result.name(),
        describe_outcome(&result.outcome)
    );
}

fn outcome_symbol(outcome: &UpdateOutcome) -> colored::ColoredString {
    match outcome {
        UpdateOutcome::Updated(_) => "✓".green(),
        UpdateOutcome::UpToDate | UpdateOutcome::NoUpstream | UpdateOutcome::Diverged(_) => {
            "•".dimmed()
        }
        UpdateOutcome::Failed(_) => "✗".red(),
    }
}

fn describe_outcome(outcome: &UpdateOutcome) -> String {
    match outcome {
        UpdateOutcome::Updated(pull) => format!(
            "updated {}..{} ({} from {})",
            pull.from,
            pull.to,
            commit_count(pull.behind),
            pull.upstream
        ),
        UpdateOutcome::UpToDate => "nothing to update".to_string(),
        UpdateOutcome::NoUpstream => "nothing to update (no upstream branch)".to_string(),
        UpdateOutcome::Diverged(divergence) => format!(
            "nothing to update (diverged: {} local, {} upstream)",
            commit_count(divergence.ahead),
            commit_count(divergence.behind)
        ),
        UpdateOutcome::Failed(failure) => {
            format!("failed at {}: {}", failure.step, failure.error)
        }
    }
}

fn commit_count(count: u32) -> String {
    if count == 1 {
        "1 commit".to_string()
    } else {
        format!("{} commits", count)
    }
}

/// The tail of finished plugins shown under the bar, plus running totals.
#[derive(Debug, Default)]
struct RecentCompletions {
    shown: VecDeque<(String, bool)>,
    finished: usize,
    failed: usize,
}

impl RecentCompletions {
    fn record(&mut self, plugin_name: &str, success: bool) {
        self.finished += 1;
        if !success {
            self.failed += 1;
        }
        self.shown.push_back((plugin_name.to_string(), success));
        if self.shown.len() > MAX_VISIBLE_COMPLETIONS {
            self.shown.pop_front();
        }
    }

    /// One line per completion slot. When older completions have scrolled
    /// away, the first slot becomes `...`.
    fn visible_lines(&self) -> Vec<String> {
        let truncated = self.finished > MAX_VISIBLE_COMPLETIONS;
        let mut lines = Vec::with_capacity(MAX_VISIBLE_COMPLETIONS);
        let mut skip = 0;
        if truncated {
            lines.push("...".dimmed().to_string());
            skip = self.shown.len().saturating_sub(MAX_VISIBLE_COMPLETIONS - 1);
        }
        for (name, success) in self.shown.iter().skip(skip) {
            let symbol = if *success { "✓".green() } else { "✗".red() };
            lines.push(format!("{} {}", symbol, name));
        }
        lines.resize(MAX_VISIBLE_COMPLETIONS, String::new());
        lines
    }
}

/// Bundle-wide progress: a counter bar and the last few finished plugins.
///
/// Clones share the same bars, so every worker can hold one.
#[derive(Clone)]
pub struct BundleProgress {
    _multi: Arc<MultiProgress>,
    counter: ProgressBar,
    slots: Vec<ProgressBar>,
    recent: Arc<Mutex<RecentCompletions>>,
}

impl BundleProgress {
    pub fn create_plugin_tracker(&self, plugin_name: &str, config: Config) -> PluginProgressTracker {
        PluginProgressTracker {
            plugin_name: plugin_name.to_string(),
            bundle: self.clone(),
            config,
        }
    }

    pub fn mark_completed(&self, plugin_name: &str, success: bool) {
        self.counter.inc(1);

        // Poisoning only means a worker panicked while holding the lock.
        let mut recent = self
            .recent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        recent.record(plugin_name, success);

        if recent.failed > 0 {
            self.counter
                .set_message(format!("│ {} failed", recent.failed).red().to_string());
        }
        for (slot, line) in self.slots.iter().zip(recent.visible_lines()) {
            slot.set_message(line);
        }
    }

    pub fn finish(&self) {
        self.counter.finish_and_clear();
        self.slots.iter().for_each(ProgressBar::finish_and_clear);
    }
}

/// Per-plugin progress tracker.
/// Implements `UpdateCallbacks` to receive step and completion notifications.
#[derive(Clone)]
pub struct PluginProgressTracker {
    plugin_name: String,
    bundle: BundleProgress,
    config: Config,
}

impl UpdateCallbacks for PluginProgressTracker {
    fn on_update_start(&self, plugin_name: &str) {
        print_plugin_header(&self.config, plugin_name);
    }

    fn on_step(&self, step: &UpdateStep) {
        print_step(&self.config, &self.plugin_name, step);
    }

    fn on_complete(&self, result: &UpdateResult) {
        self.bundle
            .mark_completed(&self.plugin_name, !result.outcome.is_failure());
        print_completion_status(&self.config, result);
    }
}

fn counter_bar(multi: &MultiProgress, total: usize) -> ProgressBar {
    let bar = multi.add(ProgressBar::new(total as u64));
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} plugins {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█░"),
    );
    bar.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_MS));
    bar
}

fn completion_slot(multi: &MultiProgress) -> ProgressBar {
    let slot = multi.add(ProgressBar::new_spinner());
    slot.set_style(
        ProgressStyle::with_template("  {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    slot
}

/// Builds the bundle progress display for `total` plugins.
///
/// Quiet mode has nothing to draw, and in verbose mode the step trace owns
/// stderr, so both get a hidden counter and no slots.
#[must_use]
pub fn create_bundle_progress(total: usize, config: &Config) -> BundleProgress {
    let multi = Arc::new(MultiProgress::new());
    let (counter, slots) = if config.is_quiet() || config.is_verbose() {
        (ProgressBar::hidden(), Vec::new())
    } else {
        let counter = counter_bar(&multi, total);
        let slots: Vec<ProgressBar> = (0..MAX_VISIBLE_COMPLETIONS)
            .map(|_| completion_slot(&multi))
            .collect();
        (counter, slots)
    };

    BundleProgress {
        _multi: multi,
        counter,
        slots,
        recent: Arc::new(Mutex::new(RecentCompletions::default())),
    }
}

pub fn print_bundle_dir(path: &Path, config: &Config) {
    if config.is_quiet() {
        return;
    }
    println!(
        "{} {}",
        "Targeting:".cyan(),
        path.display().to_string().white().bold()
    )
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

pub fn print_error(error: &anyhow::Error) {
    eprintln!("{} {}", "error:".red().bold(), format!("{:#}", error).red());
}

fn discovery_warning(candidate: &PluginCandidate) -> Option<String> {
    match &candidate.status {
        PluginStatus::Unreadable(reason) => Some(format!("skipping {}: {}", candidate.name, reason)),
        _ => None,
    }
}

/// Lists every bundle entry with whether it will be updated.
/// Unreadable entries are always reported, even in quiet mode.
pub fn print_discovery(candidates: &[PluginCandidate], config: &Config) {
    for candidate in candidates {
        if let Some(warning) = discovery_warning(candidate) {
            print_warning(&warning);
            continue;
        }
        match &candidate.status {
            PluginStatus::Repository if !config.is_quiet() => {
                println!("  {} {}", candidate.name.white(), "YES".green().bold());
            }
            PluginStatus::NotRepository if !config.is_quiet() => {
                println!("  {} {}", candidate.name.white(), "NO".dimmed());
            }
            _ => {}
        }
    }
}

/// Prints how many plugins will be updated.
/// An empty bundle ends the run here, so quiet mode still reports it.
pub fn print_plugin_count(count: usize, config: &Config) {
    if config.is_quiet() && count > 0 {
        return;
    }
    let message = plugin_count_line(count);
    if count == 0 {
        println!("{}", message.yellow().bold())
    } else {
        println!("{}", message.dimmed())
    }
}

fn plugin_count_line(count: usize) -> String {
    format!("{} plugins found", count)
}

pub fn print_summary(results: &[UpdateResult], duration: Duration, config: &Config) {
    if config.is_quiet() {
        print_quiet_summary(results);
    } else {
        print_normal_summary(results, duration);
    }
}

fn print_quiet_summary(results: &[UpdateResult]) {
    let updated = results.iter().filter(|r| r.outcome.is_updated()).count();

    // Always print count to stdout
    println!("{}/{} plugins updated", updated, results.len());

    // Print failures to stderr
    for result in results {
        if let UpdateOutcome::Failed(failure) = &result.outcome {
            eprintln!("error: {}: {}", result.path.display(), failure.error);
        }
    }
}

fn print_normal_summary(results: &[UpdateResult], duration: Duration) {
    print_section("Summary");

    let updated: Vec<&UpdateResult> = results.iter().filter(|r| r.outcome.is_updated()).collect();
    let failed: Vec<&UpdateResult> = results.iter().filter(|r| r.outcome.is_failure()).collect();
    let unchanged: Vec<&UpdateResult> = results
        .iter()
        .filter(|r| !r.outcome.is_updated() && !r.outcome.is_failure())
        .collect();

    print_updated(&updated);
    print_unchanged(&unchanged);
    print_failures(&failed);

    println!(
        "{}: {} updated, {} up to date, {} failed in {}",
        "Total".white().bold(),
        updated.len(),
        unchanged.len(),
        failed.len(),
        format_duration(duration)
    );
}

fn format_duration(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f32())
}

fn print_section(title: &str) {
    let line = "=".repeat(50).cyan().dimmed();
    let padding = (50 - title.len()) / 2;
    let centered = format!("{:>width$}", title, width = padding + title.len());
    println!("\n{}\n{}\n{}\n", line, centered.cyan().bold(), line);
}

fn print_updated(updated: &[&UpdateResult]) {
    if updated.is_empty() {
        return;
    }
    println!("{}", format!("Updated ({}):", updated.len()).green().bold());

    for result in updated {
        if let UpdateOutcome::Updated(pull) = &result.outcome {
            println!(
                "  {} {} {} {} in {}",
                "OK".green().bold(),
                result.name().white(),
                format!("{}..{}", pull.from, pull.to).cyan(),
                format!("({})", commit_count(pull.behind)).dimmed(),
                format_duration(result.duration).dimmed(),
            );
        }
    }
    println!();
}

fn print_unchanged(unchanged: &[&UpdateResult]) {
    if unchanged.is_empty() {
        return;
    }
    println!(
        "{}",
        format!("Nothing to update ({}):", unchanged.len()).bold()
    );
    for result in unchanged {
        let note = match result.outcome {
            UpdateOutcome::NoUpstream => " (no upstream)".yellow(),
            UpdateOutcome::Diverged(_) => " (diverged from upstream)".yellow(),
            _ => "".normal(),
        };
        println!("  {}{}", result.name().dimmed(), note);
    }
    println!();
}

fn print_failures(failures: &[&UpdateResult]) {
    if failures.is_empty() {
        return;
    }

    println!("{}", format!("Failed ({}):", failures.len()).red().bold());

    for result in failures {
        if let UpdateOutcome::Failed(failure) = &result.outcome {
            println!(
                "  {} {} {} in {}",
                "FAIL".red().bold(),
                result.name().white(),
                format!("at {}: {}", failure.step, failure.error).red(),
                format_duration(result.duration).dimmed(),
            );
        }
    }
    println!();
}
