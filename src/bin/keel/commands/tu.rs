//! `keel tu` command

use anyhow::Result;

use crate::cli::TuArgs;
use keel::builder::tu::{run_batch, serialization_warning};
use keel::builder::{TuTask, WhichSearch};
use keel::util::diagnostic;
use keel::util::fs::ensure_dir;
use keel::util::process::SystemRunner;
use keel::{ExtensionRegistry, TaskContext};

pub fn execute(args: TuArgs, host: Option<String>, color: bool) -> Result<()> {
    let (env, cwd) = super::detected_env(host)?;
    ExtensionRegistry::new().require("tu", &env)?;

    // Set up rayon thread pool
    if let Some(j) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(j)
            .build_global()
            .ok(); // Ignore if already set
    }

    ensure_dir(&cwd.join(&args.out_dir))?;

    let tasks: Vec<TuTask> = args
        .sources
        .iter()
        .map(|source| TuTask::for_source(source, &args.out_dir))
        .collect();

    if let Some(warning) = serialization_warning(&tasks) {
        diagnostic::emit(&warning, color);
    }

    let search = WhichSearch::new();
    let cx = TaskContext::new(&env, cwd, &SystemRunner, &search);
    run_batch(&tasks, &cx)?;

    tracing::info!("Collected {} translation-unit dumps", tasks.len());
    Ok(())
}
