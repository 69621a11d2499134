//! Core data structures for keel.
//!
//! This module contains the foundational types used throughout keel:
//! - The frozen build environment (host prefix, enabled tools, compiler version)
//! - Tool requests (ordered alias lists)

pub mod env;
pub mod tool_request;

pub use env::{BuildEnv, BuildEnvBuilder, TuSettings};
pub use tool_request::ToolRequest;
