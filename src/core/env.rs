//! The build environment shared by every extension.
//!
//! A `BuildEnv` is assembled once at startup (from config files, detection
//! and command-line flags) and is read-only afterwards. Every task and
//! capability check receives it by reference.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Compile command used for translation-unit dumps, before the dump flag.
pub const DEFAULT_CC_COMMAND: &str = "$CC $CFLAGS -c -o $TARGET $SOURCE";

/// GCC flag that requests a translation-unit dump.
pub const DEFAULT_DUMP_FLAG: &str = "-fdump-translation-unit";

/// File name suffixes different GCC releases use for the dump, in probe order.
pub const DEFAULT_DUMP_SUFFIXES: &[&str] = &[".tu", ".t00.tu", ".001t.tu"];

/// Tools enabled when the configuration does not list any.
pub const DEFAULT_TOOLS: &[&str] = &["gcc", "subst", "tu"];

/// Settings for the translation-unit dump task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TuSettings {
    /// Compile command template (`$CC`, `$CFLAGS`, `$SOURCE`, `$TARGET`)
    pub command: String,

    /// Flag appended to the compile command to request the dump
    pub flag: String,

    /// Candidate suffixes for the emitted dump, most preferred first
    pub suffixes: Vec<String>,

    /// Environment overrides applied to the dump compile only
    pub env: BTreeMap<String, String>,
}

impl Default for TuSettings {
    fn default() -> Self {
        let mut env = BTreeMap::new();
        // ccache does not understand the dump flag
        env.insert("CCACHE_DISABLE".to_string(), "1".to_string());

        TuSettings {
            command: DEFAULT_CC_COMMAND.to_string(),
            flag: DEFAULT_DUMP_FLAG.to_string(),
            suffixes: DEFAULT_DUMP_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            env,
        }
    }
}

impl TuSettings {
    /// The full dump command template (`TUCOM`).
    pub fn dump_command(&self) -> String {
        if self.flag.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.flag)
        }
    }
}

/// Immutable build environment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildEnv {
    host: Option<String>,
    tools: Vec<String>,
    cc_version: Option<String>,
    cflags: Vec<String>,
    tu: TuSettings,
}

impl BuildEnv {
    /// Start building an environment.
    pub fn builder() -> BuildEnvBuilder {
        BuildEnvBuilder::default()
    }

    /// Cross-compilation prefix (`HOST`), if any.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Enabled tool names (`TOOLS`), in configuration order.
    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    /// Whether a tool is enabled.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t == name)
    }

    /// Detected compiler version (`CCVERSION`), dotted numeric form.
    pub fn cc_version(&self) -> Option<&str> {
        self.cc_version.as_deref()
    }

    /// Extra C compiler flags.
    pub fn cflags(&self) -> &[String] {
        &self.cflags
    }

    /// Translation-unit dump settings.
    pub fn tu(&self) -> &TuSettings {
        &self.tu
    }
}

impl Default for BuildEnv {
    fn default() -> Self {
        BuildEnv::builder().build()
    }
}

/// Builder for [`BuildEnv`].
#[derive(Debug, Clone, Default)]
pub struct BuildEnvBuilder {
    host: Option<String>,
    tools: Option<Vec<String>>,
    cc_version: Option<String>,
    cflags: Vec<String>,
    tu: Option<TuSettings>,
}

impl BuildEnvBuilder {
    /// Set the cross-compilation prefix. An empty prefix means a native build.
    pub fn host(mut self, host: Option<impl Into<String>>) -> Self {
        self.host = host.map(Into::into).filter(|h| !h.trim().is_empty());
        self
    }

    /// Set the enabled tools.
    pub fn tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    /// Set the compiler version.
    pub fn cc_version(mut self, version: Option<impl Into<String>>) -> Self {
        self.cc_version = version.map(Into::into).map(|v| v.trim().to_string());
        self
    }

    /// Set extra C compiler flags.
    pub fn cflags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cflags = flags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the dump task settings.
    pub fn tu(mut self, tu: TuSettings) -> Self {
        self.tu = Some(tu);
        self
    }

    /// Freeze the environment.
    pub fn build(self) -> BuildEnv {
        BuildEnv {
            host: self.host,
            tools: self
                .tools
                .unwrap_or_else(|| DEFAULT_TOOLS.iter().map(|t| t.to_string()).collect()),
            cc_version: self.cc_version.filter(|v| !v.is_empty()),
            cflags: self.cflags,
            tu: self.tu.unwrap_or_default(),
        }
    }
}
