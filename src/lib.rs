//! Pathogen bundle updater library.
//!
//! This crate provides functionality to update Vim/Neovim plugins by:
//! - Resolving the bundle directory from a path or the environment
//! - Discovering the plugins that are git repositories
//! - Refreshing each plugin's remote and checking whether it is behind
//! - Pulling every outdated plugin concurrently

pub mod bundle;
pub mod cli;
pub mod config;
pub mod constants;
pub mod git;
pub mod output;
pub mod repo;
