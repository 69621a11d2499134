//! Translation-unit dumps.
//!
//! Compiles a C source with the dump flag appended (`-fdump-translation-unit`
//! by default) and moves the dump the compiler leaves behind to a
//! deterministic path. The task has two outputs: the object file first and
//! the dump second.
//!
//! GCC 3.0 and 4.0 cannot produce the dump, so the extension's capability
//! check rejects them before any task is created. Compiler caches do not
//! understand the dump flag, so the compile runs with the configured
//! environment overrides (`CCACHE_DISABLE=1`) applied to that one command.

use std::path::{Path, PathBuf};

use crate::builder::errors::ExtError;
use crate::builder::task::{Extension, Task, TaskContext};
use crate::core::env::BuildEnv;
use crate::core::tool_request::ToolRequest;
use crate::util::process::ProcessBuilder;
use crate::util::version::parse_version_flexible;

pub mod batch;
pub mod command;
pub mod locate;

pub use batch::{colliding_base_names, run_batch, serialization_warning};
pub use command::{expand_command, CommandVars};
pub use locate::{candidate_dirs, candidates, probe, relocate, ArtifactCandidate, Probe, Relocation};

/// Names accepted for the C compiler, in order.
pub const COMPILER_NAMES: &[&str] = &["gcc", "cc"];

/// Check that a compiler version can produce translation-unit dumps.
pub fn check_dump_support(version: Option<&str>) -> Result<(), ExtError> {
    let Some(raw) = version else {
        return Err(ExtError::UnsupportedCompilerVersion {
            version: "unknown".to_string(),
            reason: "the compiler version was not detected".to_string(),
        });
    };

    let Some(v) = parse_version_flexible(raw) else {
        return Err(ExtError::UnsupportedCompilerVersion {
            version: raw.to_string(),
            reason: "not a dotted numeric version".to_string(),
        });
    };

    let unsupported = v.major < 3 || (v.major == 3 && v.minor == 0) || (v.major == 4 && v.minor == 0);
    if unsupported {
        return Err(ExtError::UnsupportedCompilerVersion {
            version: raw.to_string(),
            reason: format!("GCC {}.{} has no usable dump flag", v.major, v.minor),
        });
    }

    Ok(())
}

/// The `tu` tool kind.
pub struct TuExtension;

impl Extension for TuExtension {
    fn name(&self) -> &'static str {
        "tu"
    }

    fn description(&self) -> &'static str {
        "Compile with a translation-unit dump and collect the dump file"
    }

    fn check(&self, env: &BuildEnv) -> Result<(), ExtError> {
        if !env.has_tool("gcc") {
            return Err(ExtError::MissingPrerequisite {
                tool: self.name().to_string(),
                requires: "gcc".to_string(),
            });
        }
        check_dump_support(env.cc_version())
    }
}

/// Compile one source and collect its translation-unit dump.
#[derive(Debug, Clone)]
pub struct TuTask {
    source: PathBuf,
    object: PathBuf,
    dump: PathBuf,
}

impl TuTask {
    /// Create a task with explicit object and dump paths.
    pub fn new(
        source: impl Into<PathBuf>,
        object: impl Into<PathBuf>,
        dump: impl Into<PathBuf>,
    ) -> Self {
        TuTask {
            source: source.into(),
            object: object.into(),
            dump: dump.into(),
        }
    }

    /// Derive output paths from the source: `<out>/<stem>.o` and `<out>/<file>.tu`.
    pub fn for_source(source: impl Into<PathBuf>, out_dir: &Path) -> Self {
        let source = source.into();
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = source
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let object = out_dir.join(format!("{}.o", stem));
        let dump = out_dir.join(format!("{}.tu", file));
        TuTask::new(source, object, dump)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn object(&self) -> &Path {
        &self.object
    }

    pub fn dump(&self) -> &Path {
        &self.dump
    }

    /// File name the compiler derives the dump name from.
    pub fn base_name(&self) -> Option<&std::ffi::OsStr> {
        self.source.file_name()
    }

    /// Build the dump compile command for a resolved compiler.
    pub fn command(&self, cx: &TaskContext<'_>, cc: &Path) -> ProcessBuilder {
        let tu = cx.env.tu();
        let vars = CommandVars::new()
            .set("CC", cc.display().to_string())
            .set_list("CFLAGS", cx.env.cflags().iter().cloned())
            .set("SOURCE", self.source.display().to_string())
            .set("TARGET", self.object.display().to_string());

        let argv = expand_command(&tu.dump_command(), &vars);
        let (program, args) = match argv.split_first() {
            Some((program, args)) => (PathBuf::from(program), args),
            None => (cc.to_path_buf(), &[][..]),
        };

        let mut cmd = ProcessBuilder::new(program).args(args).cwd(&cx.cwd);
        for (key, value) in &tu.env {
            cmd = cmd.env(key, value);
        }
        cmd
    }
}

impl Task for TuTask {
    fn kind(&self) -> &'static str {
        "tu"
    }

    fn inputs(&self) -> Vec<PathBuf> {
        vec![self.source.clone()]
    }

    fn outputs(&self) -> Vec<PathBuf> {
        vec![self.object.clone(), self.dump.clone()]
    }

    fn describe(&self) -> String {
        format!("TU {} {}", self.dump.display(), self.source.display())
    }

    fn run(&self, cx: &TaskContext<'_>) -> Result<(), ExtError> {
        TuExtension.check(cx.env)?;

        let request = ToolRequest::new(COMPILER_NAMES.iter().copied())?;
        let (_, cc) = cx.resolve(&request).require(&request)?;

        let cmd = self.command(cx, &cc);
        let command = cmd.display_command();
        tracing::debug!("running: {}", command);

        let output = cx.runner.run(&cmd).map_err(|source| ExtError::Spawn {
            command: command.clone(),
            source,
        })?;
        if !output.success() {
            return Err(ExtError::CommandFailed {
                command,
                status: output.code,
                stderr: output.stderr,
            });
        }

        let dirs = candidate_dirs(&cx.cwd, &self.object);
        let target = cx.path(&self.dump);
        match relocate(&self.source, &target, &dirs, &cx.env.tu().suffixes)? {
            Relocation::AlreadyInPlace => {}
            Relocation::Moved { from } => {
                tracing::debug!("collected {} from {}", self.dump.display(), from.display())
            }
        }

        Ok(())
    }
}
