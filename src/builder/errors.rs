//! Error types for the build extensions.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error raised by a build extension task or one of its capability checks.
///
/// None of these are retried here; they propagate to whoever is driving the
/// build and that caller decides whether the dependent step fails.
#[derive(Debug, Error)]
pub enum ExtError {
    #[error("tool not found: `{}`", .request.join("`, `"))]
    ToolNotFound { request: Vec<String> },

    #[error("compiler version `{version}` does not support translation-unit dumps")]
    UnsupportedCompilerVersion { version: String, reason: String },

    #[error("extension `{tool}` requires `{requires}` in the enabled tools")]
    MissingPrerequisite { tool: String, requires: String },

    #[error("side artifact for `{base}` could not be found")]
    ArtifactNotFound {
        base: String,
        dirs: Vec<PathBuf>,
        suffixes: Vec<String>,
    },

    #[error("substitution failed for {}", .path.display())]
    SubstitutionIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to move {} to {}", .from.display(), .to.display())]
    Relocate {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("`{}` is an output of more than one task", .output.display())]
    OutputConflict {
        output: PathBuf,
        first: String,
        second: String,
    },

    #[error("tool request must name at least one tool")]
    EmptyToolRequest,

    #[error("invalid placeholder key `{key}`")]
    InvalidPlaceholderKey { key: String },

    #[error("`{command}` {}", describe_status(.status))]
    CommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("failed to run `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ExtError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            ExtError::ToolNotFound { .. } => diag.with_suggestion(suggestions::TOOL_NOT_FOUND),

            ExtError::UnsupportedCompilerVersion { reason, .. } => diag
                .with_context(reason.clone())
                .with_suggestion(suggestions::UNSUPPORTED_COMPILER),

            ExtError::MissingPrerequisite { requires, .. } => diag.with_suggestion(format!(
                "help: List `{}` before this extension in `tools`",
                requires
            )),

            ExtError::ArtifactNotFound {
                dirs, suffixes, ..
            } => {
                let dirs: Vec<String> = dirs.iter().map(|d| display_dir(d)).collect();
                diag.with_context(format!("looked in: {}", dirs.join(", ")))
                    .with_context(format!("tried suffixes: {}", suffixes.join(", ")))
                    .with_suggestion(suggestions::ARTIFACT_NOT_FOUND)
            }

            ExtError::SubstitutionIo { path, source } => diag
                .with_location(path.clone())
                .with_context(source.to_string()),

            ExtError::Relocate { source, .. } => diag.with_context(source.to_string()),

            ExtError::CommandFailed { stderr, .. } => {
                let mut diag = diag;
                for line in stderr.lines().filter(|l| !l.trim().is_empty()).take(10) {
                    diag = diag.with_context(line.to_string());
                }
                diag
            }

            ExtError::Spawn { source, .. } => diag.with_context(format!("{:#}", source)),

            ExtError::OutputConflict { first, second, .. } => diag
                .with_context(first.clone())
                .with_context(second.clone())
                .with_suggestion(suggestions::OUTPUT_CONFLICT),

            ExtError::EmptyToolRequest | ExtError::InvalidPlaceholderKey { .. } => diag,
        }
    }
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("failed with exit code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

/// The working directory shows up as an empty path; print it as `.`.
pub(crate) fn display_dir(dir: &std::path::Path) -> String {
    if dir.as_os_str().is_empty() {
        ".".to_string()
    } else {
        dir.display().to_string()
    }
}
