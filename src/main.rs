use clap::Parser;
use pathogen_update::cli::Cli;
use pathogen_update::config::Config;
use pathogen_update::{bundle, output, repo};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = cli.config();

    match run(&cli, &config) {
        Ok(code) => code,
        Err(err) => {
            output::print_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &Config) -> anyhow::Result<ExitCode> {
    let bundle = bundle::resolve_bundle_dir(
        cli.bundle_path(),
        cli.vim_version,
        bundle::env_lookup,
        output::print_warning,
    )?;
    output::print_bundle_dir(bundle.path(), config);

    let candidates = repo::discover_plugins(&bundle)?;
    output::print_discovery(&candidates, config);

    let repos: Vec<PathBuf> = candidates
        .into_iter()
        .filter(|candidate| candidate.is_repository())
        .map(|candidate| candidate.path)
        .collect();
    output::print_plugin_count(repos.len(), config);
    if repos.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }

    let start = Instant::now();
    let progress = output::create_bundle_progress(repos.len(), config);
    let results = repo::update_bundle(
        &repos,
        |path| progress.create_plugin_tracker(repo::plugin_name(path), *config),
        config,
    )?;
    progress.finish();

    output::print_summary(&results, start.elapsed(), config);

    if results.iter().any(|result| result.outcome.is_failure()) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
