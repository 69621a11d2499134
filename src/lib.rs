//! Keel - build-system extensions for C toolchains
//!
//! This crate provides cross-prefixed toolchain lookup, `@KEY@` template
//! substitution and translation-unit dump collection, packaged as tasks a
//! build scheduler can run.

pub mod builder;
pub mod core;
pub mod util;

/// Test utilities and mocks for keel unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides mock implementations for process execution
/// and executable lookup.
#[cfg(test)]
pub mod test_support;

pub use builder::{ExtError, Extension, ExtensionRegistry, Task, TaskContext};
pub use core::{BuildEnv, ToolRequest};
