//! Running many dump tasks at once.
//!
//! The compiler names the dump after the source's file name and leaves it
//! in the working directory (or next to the object), so two sources with the
//! same file name racing in one directory can pick up each other's dump.
//! Batches with colliding base names run one task at a time, and batches in
//! which two tasks would write the same object or dump are rejected.

use std::collections::BTreeMap;
use std::ffi::OsString;

use rayon::prelude::*;

use crate::builder::errors::ExtError;
use crate::builder::task::{check_distinct_outputs, Task, TaskContext};
use crate::builder::tu::TuTask;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Base names shared by more than one task, in sorted order.
pub fn colliding_base_names(tasks: &[TuTask]) -> Vec<OsString> {
    let mut counts: BTreeMap<OsString, usize> = BTreeMap::new();
    for task in tasks {
        if let Some(name) = task.base_name() {
            *counts.entry(name.to_os_string()).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(name, _)| name)
        .collect()
}

/// Warning to show before a batch that cannot run in parallel.
pub fn serialization_warning(tasks: &[TuTask]) -> Option<Diagnostic> {
    let collisions = colliding_base_names(tasks);
    if collisions.is_empty() {
        return None;
    }

    let names: Vec<String> = collisions
        .iter()
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    Some(
        Diagnostic::warning(format!("sources share file names: {}", names.join(", ")))
            .with_context("translation units are dumped one at a time")
            .with_suggestion(suggestions::SERIALIZE_DUMPS),
    )
}

/// Run a batch of dump tasks.
///
/// Fails with [`ExtError::OutputConflict`] before running anything if two
/// tasks declare the same output. Tasks run in parallel on the rayon pool
/// unless their base names collide. Every task runs to completion; the first
/// error in task order is returned.
pub fn run_batch(tasks: &[TuTask], cx: &TaskContext<'_>) -> Result<(), ExtError> {
    check_distinct_outputs(tasks)?;
    let collisions = colliding_base_names(tasks);

    let results: Vec<Result<(), ExtError>> = if collisions.is_empty() {
        tracing::debug!("running {} dump tasks in parallel", tasks.len());
        tasks.par_iter().map(|task| run_one(task, cx)).collect()
    } else {
        tracing::debug!("running {} dump tasks one at a time", tasks.len());
        tasks.iter().map(|task| run_one(task, cx)).collect()
    };

    results.into_iter().collect()
}

fn run_one(task: &TuTask, cx: &TaskContext<'_>) -> Result<(), ExtError> {
    tracing::info!("{}", task.describe());
    task.run(cx)
}
