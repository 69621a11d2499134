//! The boundary between the build extensions and whatever schedules them.
//!
//! A [`Task`] declares its input and output artifacts and an action; the
//! caller owns dependency tracking, staleness and scheduling. An
//! [`Extension`] is a named tool kind that tasks belong to, with a
//! capability check the caller runs before creating any of its tasks.
//!
//! Key principle: registry construction never fails. Availability is checked
//! lazily, against a concrete [`BuildEnv`].

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::builder::errors::ExtError;
use crate::builder::subst::SubstExtension;
use crate::builder::toolchain::{PathSearch, Resolution, Resolver};
use crate::builder::tu::TuExtension;
use crate::core::env::BuildEnv;
use crate::core::tool_request::ToolRequest;
use crate::util::process::CommandRunner;

/// Everything a task needs to run.
pub struct TaskContext<'a> {
    /// The frozen build environment
    pub env: &'a BuildEnv,
    /// Directory relative paths are resolved against and commands run in
    pub cwd: PathBuf,
    /// Subprocess runner
    pub runner: &'a dyn CommandRunner,
    /// Executable search
    pub search: &'a dyn PathSearch,
    resolver: Resolver<'a>,
}

impl<'a> TaskContext<'a> {
    /// Create a task context.
    pub fn new(
        env: &'a BuildEnv,
        cwd: impl Into<PathBuf>,
        runner: &'a dyn CommandRunner,
        search: &'a dyn PathSearch,
    ) -> Self {
        TaskContext {
            env,
            cwd: cwd.into(),
            runner,
            search,
            resolver: Resolver::new(env, search),
        }
    }

    /// Resolve a tool through the shared, memoizing resolver.
    pub fn resolve(&self, request: &ToolRequest) -> Resolution {
        self.resolver.resolve(request)
    }

    /// Resolve a task path against the working directory.
    pub fn path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

/// A unit of work with declared artifacts.
pub trait Task: Send + Sync {
    /// Name of the extension this task belongs to.
    fn kind(&self) -> &'static str;

    /// Artifacts read by the task.
    fn inputs(&self) -> Vec<PathBuf>;

    /// Non-file values the outputs depend on, as `(name, value)` pairs.
    ///
    /// A change in any of these makes the outputs stale, like a changed input.
    fn input_values(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Artifacts written by the task, in declaration order.
    fn outputs(&self) -> Vec<PathBuf>;

    /// One-line description shown while the task runs.
    fn describe(&self) -> String;

    /// Perform the action.
    fn run(&self, cx: &TaskContext<'_>) -> Result<(), ExtError>;
}

/// Reject a set of tasks in which two tasks declare the same output.
pub fn check_distinct_outputs<T: Task>(tasks: &[T]) -> Result<(), ExtError> {
    let mut owners: HashMap<PathBuf, String> = HashMap::new();

    for task in tasks {
        for output in task.outputs() {
            if let Some(first) = owners.insert(output.clone(), task.describe()) {
                return Err(ExtError::OutputConflict {
                    output,
                    first,
                    second: task.describe(),
                });
            }
        }
    }

    Ok(())
}

/// A named tool kind.
pub trait Extension: Send + Sync {
    /// Tool name as listed in `TOOLS`.
    fn name(&self) -> &'static str;

    /// Brief description.
    fn description(&self) -> &'static str;

    /// Check whether the extension can be used with this environment.
    fn check(&self, env: &BuildEnv) -> Result<(), ExtError>;
}

/// Availability of an extension in a given environment.
#[derive(Debug)]
pub enum Availability {
    /// Enabled and usable
    Available,
    /// Not listed in the enabled tools
    Disabled,
    /// Enabled, but its capability check failed
    Unavailable(ExtError),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

/// Registry of the known extensions.
pub struct ExtensionRegistry {
    extensions: BTreeMap<&'static str, Box<dyn Extension>>,
}

impl ExtensionRegistry {
    /// Create a registry with all built-in extensions.
    ///
    /// This always succeeds - no I/O or detection happens here.
    pub fn new() -> Self {
        let mut registry = ExtensionRegistry {
            extensions: BTreeMap::new(),
        };

        registry.register(Box::new(SubstExtension));
        registry.register(Box::new(TuExtension));

        registry
    }

    /// Register an extension. Re-registering a name replaces it.
    pub fn register(&mut self, extension: Box<dyn Extension>) {
        self.extensions.insert(extension.name(), extension);
    }

    /// Get an extension by name.
    pub fn get(&self, name: &str) -> Option<&dyn Extension> {
        self.extensions.get(name).map(|e| e.as_ref())
    }

    /// All registered extensions, in name order.
    pub fn all(&self) -> impl Iterator<Item = &dyn Extension> + '_ {
        self.extensions.values().map(|e| e.as_ref())
    }

    /// Availability of one extension.
    pub fn availability(&self, extension: &dyn Extension, env: &BuildEnv) -> Availability {
        if !env.has_tool(extension.name()) {
            return Availability::Disabled;
        }
        match extension.check(env) {
            Ok(()) => Availability::Available,
            Err(e) => Availability::Unavailable(e),
        }
    }

    /// Check availability of all extensions.
    pub fn check_all(&self, env: &BuildEnv) -> Vec<(&'static str, Availability)> {
        self.all()
            .map(|ext| (ext.name(), self.availability(ext, env)))
            .collect()
    }

    /// Ensure an extension is enabled and usable before creating its tasks.
    pub fn require(&self, name: &str, env: &BuildEnv) -> Result<(), ExtError> {
        let Some(extension) = self.get(name) else {
            return Err(ExtError::MissingPrerequisite {
                tool: name.to_string(),
                requires: name.to_string(),
            });
        };

        match self.availability(extension, env) {
            Availability::Available => Ok(()),
            Availability::Disabled => Err(ExtError::MissingPrerequisite {
                tool: name.to_string(),
                requires: name.to_string(),
            }),
            Availability::Unavailable(e) => Err(e),
        }
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
