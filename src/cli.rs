//! Command-line arguments.

use crate::bundle::VimFlavor;
use crate::config::{Config, Verbosity};
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Clone)]
#[command(name = "pathogen-update")]
#[command(about = "Pull upstream changes for every git plugin in a pathogen bundle directory")]
#[command(version)]
pub struct Cli {
    /// Path to the bundle directory
    #[arg(value_name = "PATH", conflicts_with = "plugin_path")]
    pub path: Option<PathBuf>,

    /// Path to your pathogen plugins (same as PATH)
    #[arg(short = 'p', long = "plugin-path", value_name = "PATH")]
    pub plugin_path: Option<PathBuf>,

    /// Editor whose default bundle location is used when no path is given
    #[arg(long = "vim-version", value_enum, default_value_t = VimFlavor::Neovim)]
    pub vim_version: VimFlavor,

    /// Only print the final count and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print every step and git command
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The explicitly requested bundle directory, if any.
    pub fn bundle_path(&self) -> Option<&Path> {
        self.plugin_path.as_deref().or(self.path.as_deref())
    }

    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            verbosity: Verbosity::from_flags(self.quiet, self.verbose),
        }
    }
}
