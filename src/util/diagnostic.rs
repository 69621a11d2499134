//! User-friendly diagnostic messages.
//!
//! Every error surfaced to the user carries the root cause, the places that
//! were searched or checked, and a suggested fix where one exists.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when a cross tool or native tool cannot be found.
    pub const TOOL_NOT_FOUND: &str =
        "help: Install the toolchain or add its bin directory to PATH";

    /// Suggestion when the configured compiler cannot produce tree dumps.
    pub const UNSUPPORTED_COMPILER: &str =
        "help: Use GCC 4.1 or newer, or set `cc-version` in .keel/config.toml";

    /// Suggestion when a side artifact was not produced where expected.
    pub const ARTIFACT_NOT_FOUND: &str =
        "help: Run `keel tu --verbose` to see the compiler command and probed paths";

    /// Suggestion when dump tasks share a base name and cannot run in parallel.
    pub const SERIALIZE_DUMPS: &str =
        "help: Give each source a unique file name to dump them in parallel";

    /// Suggestion when two tasks would write the same file.
    pub const OUTPUT_CONFLICT: &str =
        "help: Dump sources that share a file name into separate `--out-dir` directories";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    fn with_severity(message: impl Into<String>, severity: Severity) -> Self {
        Diagnostic {
            message: message.into(),
            severity,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Error)
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Warning)
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m".to_string(),
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m".to_string(),
            }
        } else {
            self.severity.to_string()
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            for suggestion in &self.suggestions {
                output.push_str(suggestion);
                output.push('\n');
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
