//! Build extensions.
//!
//! This module implements toolchain resolution and the `subst` and `tu`
//! extensions, together with the task boundary they share.

pub mod errors;
pub mod subst;
pub mod task;
pub mod toolchain;
pub mod tu;

pub use errors::ExtError;
pub use subst::{expand, SubstExtension, SubstTask, SubstitutionMap};
pub use task::{Availability, Extension, ExtensionRegistry, Task, TaskContext};
pub use toolchain::{
    cross_candidates, resolve, Advisory, PathSearch, Resolution, ResolvedTool, Resolver,
    WhichSearch,
};
pub use tu::{TuExtension, TuTask};
