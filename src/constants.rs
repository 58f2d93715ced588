//! Application-wide constants.
//!
//! Names of directories, environment variables and display limits used
//! throughout the codebase.

/// Progress bar tick interval in milliseconds.
/// Controls how often the spinner/bar animates.
pub const PROGRESS_TICK_MS: u64 = 80;

/// Maximum number of completed plugins to show in the bundle progress display.
pub const MAX_VISIBLE_COMPLETIONS: usize = 5;

/// Git directory name used to detect repositories.
pub const GIT_DIR: &str = ".git";

/// Remote refreshed before checking whether a plugin is behind.
pub const ORIGIN_REMOTE: &str = "origin";

/// Default name used when a plugin name cannot be determined from its path.
pub const DEFAULT_PLUGIN_NAME: &str = "plugin";

pub const HOME_VAR: &str = "HOME";
pub const XDG_CONFIG_HOME_VAR: &str = "XDG_CONFIG_HOME";

/// `$HOME/.config`, used when `XDG_CONFIG_HOME` is not set.
pub const XDG_CONFIG_FALLBACK: &str = ".config";

/// Neovim bundle location relative to the XDG config home.
pub const NVIM_BUNDLE_SUBPATH: [&str; 2] = ["nvim", "bundle"];

/// Vim bundle location relative to `$HOME`.
pub const VIM_BUNDLE_SUBPATH: [&str; 2] = [".vim", "bundle"];
