//! Bundle directory resolution.
//!
//! Turns an explicit path, or the default location of the selected Vim
//! flavor, into a [`BundleDir`] that is known to exist and be readable.

use crate::constants::{
    HOME_VAR, NVIM_BUNDLE_SUBPATH, VIM_BUNDLE_SUBPATH, XDG_CONFIG_FALLBACK, XDG_CONFIG_HOME_VAR,
};
use std::io;
use std::path::{Path, PathBuf};

/// Warning shown when the Neovim default has to guess `$XDG_CONFIG_HOME`.
pub const XDG_INFERRED_WARNING: &str = "$XDG_CONFIG_HOME undefined. Inferring default value...";

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Unable to open {}: {}", .path.display(), .source)]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not a directory", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("${var} is not set, cannot locate the default bundle directory")]
    MissingEnv { var: &'static str },
}

/// Which editor's default bundle location to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum VimFlavor {
    Vim,
    #[default]
    Neovim,
}

/// A directory that existed and could be listed when it was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleDir {
    path: PathBuf,
}

impl BundleDir {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The environment-derived bundle location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultBundlePath {
    pub path: PathBuf,
    /// `$XDG_CONFIG_HOME` was missing and `$HOME/.config` was used instead.
    pub xdg_inferred: bool,
}

/// Opens `path` and confirms it is a directory.
pub fn open_bundle_dir(path: &Path) -> Result<BundleDir, ResolveError> {
    let not_found = |source| ResolveError::NotFound {
        path: path.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(path).map_err(not_found)?;
    if !metadata.is_dir() {
        return Err(ResolveError::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    // Existing but unlistable (e.g. no read permission) counts as not found.
    std::fs::read_dir(path).map_err(not_found)?;

    Ok(BundleDir {
        path: path.to_path_buf(),
    })
}

/// Computes the default bundle location for `flavor`.
///
/// `lookup` reads an environment variable; unset and empty values are
/// treated the same.
pub fn default_bundle_path<F>(
    flavor: VimFlavor,
    lookup: F,
) -> Result<DefaultBundlePath, ResolveError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |var: &str| lookup(var).filter(|value| !value.is_empty());
    let home = || {
        non_empty(HOME_VAR)
            .map(PathBuf::from)
            .ok_or(ResolveError::MissingEnv { var: HOME_VAR })
    };

    match flavor {
        VimFlavor::Vim => Ok(DefaultBundlePath {
            path: VIM_BUNDLE_SUBPATH.iter().fold(home()?, |acc, part| acc.join(part)),
            xdg_inferred: false,
        }),
        VimFlavor::Neovim => {
            let (config_home, xdg_inferred) = match non_empty(XDG_CONFIG_HOME_VAR) {
                Some(xdg) => (PathBuf::from(xdg), false),
                None => (home()?.join(XDG_CONFIG_FALLBACK), true),
            };
            Ok(DefaultBundlePath {
                path: NVIM_BUNDLE_SUBPATH
                    .iter()
                    .fold(config_home, |acc, part| acc.join(part)),
                xdg_inferred,
            })
        }
    }
}

/// Resolves the bundle directory from an explicit path or the flavor default.
///
/// An unusable default is as fatal as an unusable explicit path. `warn`
/// receives the message when `$XDG_CONFIG_HOME` had to be inferred.
pub fn resolve_bundle_dir<F, W>(
    explicit: Option<&Path>,
    flavor: VimFlavor,
    lookup: F,
    warn: W,
) -> Result<BundleDir, ResolveError>
where
    F: Fn(&str) -> Option<String>,
    W: FnOnce(&str),
{
    if let Some(path) = explicit {
        return open_bundle_dir(path);
    }

    let default = default_bundle_path(flavor, lookup)?;
    if default.xdg_inferred {
        warn(XDG_INFERRED_WARNING);
    }
    open_bundle_dir(&default.path)
}

/// Reads a variable from the process environment.
pub fn env_lookup(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| vars.get(var).cloned()
    }

    #[test]
    fn test_neovim_default_uses_xdg_config_home() -> anyhow::Result<()> {
        let env = env_from(&[("HOME", "/home/u"), ("XDG_CONFIG_HOME", "/cfg")]);
        let default = default_bundle_path(VimFlavor::Neovim, env)?;
        assert_eq!(default.path, PathBuf::from("/cfg/nvim/bundle"));
        assert!(!default.xdg_inferred);
        Ok(())
    }

    #[test]
    fn test_neovim_default_infers_xdg_from_home() -> anyhow::Result<()> {
        let unset = default_bundle_path(VimFlavor::Neovim, env_from(&[("HOME", "/home/u")]))?;
        assert_eq!(unset.path, PathBuf::from("/home/u/.config/nvim/bundle"));
        assert!(unset.xdg_inferred);

        let empty = default_bundle_path(
            VimFlavor::Neovim,
            env_from(&[("HOME", "/home/u"), ("XDG_CONFIG_HOME", "")]),
        )?;
        assert_eq!(empty, unset);
        Ok(())
    }

    #[test]
    fn test_vim_default_ignores_xdg() -> anyhow::Result<()> {
        let env = env_from(&[("HOME", "/home/u"), ("XDG_CONFIG_HOME", "/cfg")]);
        let default = default_bundle_path(VimFlavor::Vim, env)?;
        assert_eq!(default.path, PathBuf::from("/home/u/.vim/bundle"));
        assert!(!default.xdg_inferred);
        Ok(())
    }

    #[test]
    fn test_missing_home_is_an_error() {
        let err = default_bundle_path(VimFlavor::Vim, env_from(&[])).unwrap_err();
        assert!(matches!(err, ResolveError::MissingEnv { var: "HOME" }));

        let err = default_bundle_path(VimFlavor::Neovim, env_from(&[])).unwrap_err();
        assert!(matches!(err, ResolveError::MissingEnv { var: "HOME" }));
    }

    #[test]
    fn test_neovim_with_xdg_does_not_need_home() -> anyhow::Result<()> {
        let env = env_from(&[("XDG_CONFIG_HOME", "/cfg")]);
        let default = default_bundle_path(VimFlavor::Neovim, env)?;
        assert_eq!(default.path, PathBuf::from("/cfg/nvim/bundle"));
        Ok(())
    }

    #[test]
    fn test_open_bundle_dir_accepts_directory() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let bundle = open_bundle_dir(dir.path())?;
        assert_eq!(bundle.path(), dir.path());
        Ok(())
    }

    #[test]
    fn test_open_bundle_dir_rejects_missing_path() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let missing = dir.path().join("nope");
        let err = open_bundle_dir(&missing).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { ref path, .. } if path == &missing));
        Ok(())
    }

    #[test]
    fn test_open_bundle_dir_rejects_regular_file() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let file = dir.path().join("vimrc");
        std::fs::write(&file, "set nocompatible\n")?;
        let err = open_bundle_dir(&file).unwrap_err();
        assert!(matches!(err, ResolveError::NotADirectory { .. }));
        assert!(err.to_string().contains("is not a directory"));
        Ok(())
    }

    #[test]
    fn test_resolve_prefers_explicit_path_and_skips_warning() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let mut warned = false;
        let bundle = resolve_bundle_dir(
            Some(dir.path()),
            VimFlavor::Neovim,
            env_from(&[]),
            |_| warned = true,
        )?;
        assert_eq!(bundle.path(), dir.path());
        assert!(!warned);
        Ok(())
    }

    #[test]
    fn test_resolve_default_warns_when_xdg_inferred() -> anyhow::Result<()> {
        let home = TempDir::new()?;
        let bundle_path = home.path().join(".config/nvim/bundle");
        std::fs::create_dir_all(&bundle_path)?;
        let home_str = home.path().to_string_lossy().to_string();

        let mut warning = None;
        let bundle = resolve_bundle_dir(
            None,
            VimFlavor::Neovim,
            env_from(&[("HOME", home_str.as_str())]),
            |msg| warning = Some(msg.to_string()),
        )?;
        assert_eq!(bundle.path(), bundle_path);
        assert_eq!(warning.as_deref(), Some(XDG_INFERRED_WARNING));
        Ok(())
    }

    #[test]
    fn test_resolve_missing_default_is_fatal() -> anyhow::Result<()> {
        let home = TempDir::new()?;
        let home_str = home.path().to_string_lossy().to_string();
        let result = resolve_bundle_dir(
            None,
            VimFlavor::Vim,
            env_from(&[("HOME", home_str.as_str())]),
            |_| {},
        );
        assert!(matches!(result, Err(ResolveError::NotFound { .. })));
        Ok(())
    }
}
