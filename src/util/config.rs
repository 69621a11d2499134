//! Configuration file support for keel.
//!
//! keel supports two configuration file locations:
//! - Global: `~/.keel/config.toml` - User-wide defaults
//! - Project: `.keel/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config; command-line flags
//! take precedence over both. The merged result is frozen into a
//! [`BuildEnv`] once, before any task runs.
//!
//! ```toml
//! [env]
//! host = "arm-linux"
//! tools = ["gcc", "subst", "tu"]
//! cc-version = "4.1.2"
//! cflags = ["-O2"]
//!
//! [tu]
//! flag = "-fdump-translation-unit"
//! suffixes = [".tu", ".t00.tu", ".001t.tu"]
//! env = { CCACHE_DISABLE = "1" }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::toolchain::{resolve, PathSearch};
use crate::builder::tu::COMPILER_NAMES;
use crate::core::env::{BuildEnv, BuildEnvBuilder, TuSettings};
use crate::core::tool_request::ToolRequest;
use crate::util::process::CommandRunner;
use crate::util::version::detect_cc_version;

/// keel configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build environment settings
    pub env: EnvConfig,

    /// Translation-unit dump settings
    pub tu: TuConfig,
}

/// Build environment settings (`HOST`, `TOOLS`, `CCVERSION`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EnvConfig {
    /// Cross-compilation prefix (e.g., arm-linux)
    pub host: Option<String>,

    /// Enabled tools
    pub tools: Option<Vec<String>>,

    /// Compiler version; detected with `-dumpversion` when unset
    pub cc_version: Option<String>,

    /// Additional C compiler flags
    pub cflags: Option<Vec<String>>,
}

/// Translation-unit dump settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TuConfig {
    /// Compile command template
    pub command: Option<String>,

    /// Dump flag appended to the compile command
    pub flag: Option<String>,

    /// Candidate dump suffixes, most preferred first
    pub suffixes: Option<Vec<String>>,

    /// Environment overrides for the dump compile
    pub env: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.env.host.is_some() {
            self.env.host = other.env.host;
        }
        if other.env.tools.is_some() {
            self.env.tools = other.env.tools;
        }
        if other.env.cc_version.is_some() {
            self.env.cc_version = other.env.cc_version;
        }
        if other.env.cflags.is_some() {
            self.env.cflags = other.env.cflags;
        }

        if other.tu.command.is_some() {
            self.tu.command = other.tu.command;
        }
        if other.tu.flag.is_some() {
            self.tu.flag = other.tu.flag;
        }
        if other.tu.suffixes.is_some() {
            self.tu.suffixes = other.tu.suffixes;
        }
        self.tu.env.extend(other.tu.env);
    }

    /// Dump settings with configured values applied over the defaults.
    pub fn tu_settings(&self) -> TuSettings {
        let mut tu = TuSettings::default();
        if let Some(ref command) = self.tu.command {
            tu.command = command.clone();
        }
        if let Some(ref flag) = self.tu.flag {
            tu.flag = flag.clone();
        }
        if let Some(ref suffixes) = self.tu.suffixes {
            tu.suffixes = suffixes.clone();
        }
        tu.env
            .extend(self.tu.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        tu
    }

    /// Start a [`BuildEnv`] from this configuration.
    pub fn env_builder(&self) -> BuildEnvBuilder {
        let mut builder = BuildEnv::builder()
            .host(self.env.host.clone())
            .cc_version(self.env.cc_version.clone())
            .cflags(self.env.cflags.clone().unwrap_or_default())
            .tu(self.tu_settings());
        if let Some(ref tools) = self.env.tools {
            builder = builder.tools(tools.iter().cloned());
        }
        builder
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.keel/config.toml)
/// 2. Global config (~/.keel/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global) = global_path {
        config.merge(Config::load_or_default(global));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global keel config directory (~/.keel).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".keel"))
}

/// Get the global config path (~/.keel/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.keel/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".keel").join("config.toml")
}

/// Freeze the configuration into a [`BuildEnv`].
///
/// When the dump extension is enabled and no compiler version is
/// configured, the compiler is resolved and asked for its version once.
/// Detection failures are logged and leave the version unset, which makes
/// the dump extension report itself unavailable.
pub fn build_env(
    config: &Config,
    search: &dyn PathSearch,
    runner: &dyn CommandRunner,
) -> BuildEnv {
    let builder = config.env_builder();
    let env = builder.clone().build();

    if env.cc_version().is_some() || !env.has_tool("tu") {
        return env;
    }

    let Ok(request) = ToolRequest::new(COMPILER_NAMES.iter().copied()) else {
        return env;
    };
    let resolution = resolve(&request, &env, search);
    resolution.log_advisories();

    let Some(cc) = resolution.tool.path() else {
        tracing::debug!("no C compiler found, compiler version left unset");
        return env;
    };

    match detect_cc_version(runner, cc) {
        Ok(version) => builder.cc_version(Some(version)).build(),
        Err(e) => {
            tracing::warn!("could not detect compiler version: {:#}", e);
            env
        }
    }
}
