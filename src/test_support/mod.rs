//! Test utilities and mocks for keel unit tests.
//!
//! Provides a mock command runner and a stub executable search so tasks can
//! be exercised without a real compiler on the machine.
//!
//! # Example
//!
//! ```rust,ignore
//! use keel::test_support::{MockExecutor, MockProcessOutput, StubSearch};
//!
//! #[test]
//! fn test_example() {
//!     let search = StubSearch::new().with("arm-linux-gcc");
//!
//!     let exec = MockExecutor::new();
//!     exec.expect("gcc -dumpversion", MockProcessOutput::success("4.1.2"));
//!
//!     // Use mocks in tests...
//! }
//! ```

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{bail, Result};

use crate::builder::toolchain::PathSearch;
use crate::util::process::{CommandOutput, CommandRunner, ProcessBuilder};

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

impl From<MockProcessOutput> for CommandOutput {
    fn from(mock: MockProcessOutput) -> Self {
        CommandOutput {
            code: Some(mock.status),
            stdout: mock.stdout,
            stderr: mock.stderr,
        }
    }
}

/// Pattern for matching commands in MockExecutor.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command contains substring.
    Contains(String),
    /// Match using a regex pattern.
    Regex(String),
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::Contains(s) => cmd.contains(s),
            CommandPattern::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(cmd))
                .unwrap_or(false),
        }
    }
}

/// Hook invoked with every command the mock runs, before it answers.
pub type RunHook = Arc<dyn Fn(&ProcessBuilder) + Send + Sync>;

#[derive(Default)]
struct ExecutorState {
    expectations: Vec<(CommandPattern, MockProcessOutput)>,
    calls: Vec<String>,
    default_output: Option<MockProcessOutput>,
    hook: Option<RunHook>,
}

/// Mock process executor for testing command execution.
///
/// Records every command line it is asked to run and answers from the
/// registered expectations (first match wins), then the default output.
#[derive(Default)]
pub struct MockExecutor {
    state: Mutex<ExecutorState>,
}

impl MockExecutor {
    /// Create a new mock executor.
    pub fn new() -> Self {
        MockExecutor::default()
    }

    fn state(&self) -> MutexGuard<'_, ExecutorState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&self, cmd: &str, output: MockProcessOutput) -> &Self {
        self.expect_pattern(CommandPattern::Exact(cmd.to_string()), output)
    }

    /// Add an expectation for a command containing a substring.
    pub fn expect_contains(&self, substring: &str, output: MockProcessOutput) -> &Self {
        self.expect_pattern(CommandPattern::Contains(substring.to_string()), output)
    }

    /// Add an expectation with a custom pattern.
    pub fn expect_pattern(&self, pattern: CommandPattern, output: MockProcessOutput) -> &Self {
        self.state().expectations.push((pattern, output));
        self
    }

    /// Set a default output for commands that don't match any expectation.
    pub fn set_default(&self, output: MockProcessOutput) -> &Self {
        self.state().default_output = Some(output);
        self
    }

    /// Run `hook` for every command (e.g. to fake files a compiler writes).
    pub fn on_run(&self, hook: RunHook) -> &Self {
        self.state().hook = Some(hook);
        self
    }

    /// Get all commands that were called.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }
}

impl CommandRunner for MockExecutor {
    fn run(&self, cmd: &ProcessBuilder) -> Result<CommandOutput> {
        let full_cmd = cmd.display_command();

        let (hook, answer) = {
            let mut state = self.state();
            state.calls.push(full_cmd.clone());

            let answer = state
                .expectations
                .iter()
                .find(|(pattern, _)| pattern.matches(&full_cmd))
                .map(|(_, output)| output.clone())
                .or_else(|| state.default_output.clone());
            (state.hook.clone(), answer)
        };

        if let Some(hook) = hook {
            hook(cmd);
        }

        match answer {
            Some(output) => Ok(output.into()),
            None => bail!("unexpected command: {}", full_cmd),
        }
    }
}

/// Executable search over a fixed set of names.
///
/// Every registered name resolves to `/usr/bin/<name>`. All lookups are
/// recorded in order.
#[derive(Default)]
pub struct StubSearch {
    installed: HashSet<String>,
    queries: Mutex<Vec<String>>,
}

impl StubSearch {
    /// A search path with nothing installed.
    pub fn new() -> Self {
        StubSearch::default()
    }

    /// Mark a tool as installed.
    pub fn with(mut self, name: &str) -> Self {
        self.installed.insert(name.to_string());
        self
    }

    /// Names looked up so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

impl PathSearch for StubSearch {
    fn which(&self, name: &str) -> Option<PathBuf> {
        self.queries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(name.to_string());

        self.installed
            .contains(name)
            .then(|| PathBuf::from("/usr/bin").join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_executor_matches_in_order() {
        let exec = MockExecutor::new();
        exec.expect("gcc -dumpversion", MockProcessOutput::success("4.1.2"))
            .expect_contains("-fdump-translation-unit", MockProcessOutput::success(""))
            .expect_pattern(
                CommandPattern::Regex(r"^ar rcs .*\.a".to_string()),
                MockProcessOutput::success(""),
            );

        let out = exec
            .run(&ProcessBuilder::new("gcc").arg("-dumpversion"))
            .unwrap();
        assert_eq!(out.stdout, "4.1.2");

        assert!(exec
            .run(&ProcessBuilder::new("ar").args(["rcs", "libfoo.a"]))
            .unwrap()
            .success());
        assert!(exec.run(&ProcessBuilder::new("ld")).is_err());
        assert_eq!(exec.calls().len(), 3);
    }

    #[test]
    fn test_stub_search_records_queries() {
        let search = StubSearch::new().with("gcc");
        assert_eq!(search.which("gcc"), Some(PathBuf::from("/usr/bin/gcc")));
        assert_eq!(search.which("clang"), None);
        assert_eq!(search.queries(), vec!["gcc", "clang"]);
    }
}
