//! Command implementations

pub mod completions;
pub mod env;
pub mod subst;
pub mod tools;
pub mod tu;
pub mod which;

use std::path::PathBuf;

use anyhow::{Context, Result};

use keel::builder::WhichSearch;
use keel::util::config::{self, Config};
use keel::util::process::SystemRunner;
use keel::BuildEnv;

/// Load the merged configuration for the current directory.
///
/// A `--host` flag (or `KEEL_HOST`) replaces the configured host.
pub fn load_config(host: Option<String>) -> Result<(Config, PathBuf)> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;

    let global = config::global_config_path();
    let mut config = config::load_config(global.as_deref(), &config::project_config_path(&cwd));
    if host.is_some() {
        config.env.host = host;
    }

    Ok((config, cwd))
}

/// Build the environment without running the compiler.
pub fn static_env(host: Option<String>) -> Result<(BuildEnv, PathBuf)> {
    let (config, cwd) = load_config(host)?;
    Ok((config.env_builder().build(), cwd))
}

/// Build the environment, detecting the compiler version if needed.
pub fn detected_env(host: Option<String>) -> Result<(BuildEnv, PathBuf)> {
    let (config, cwd) = load_config(host)?;
    let env = config::build_env(&config, &WhichSearch::new(), &SystemRunner);
    Ok((env, cwd))
}
