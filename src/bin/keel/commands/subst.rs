//! `keel subst` command

use anyhow::{anyhow, Result};

use crate::cli::SubstArgs;
use keel::builder::{SubstTask, SubstitutionMap, WhichSearch};
use keel::util::process::SystemRunner;
use keel::{ExtensionRegistry, Task, TaskContext};

pub fn execute(args: SubstArgs, host: Option<String>) -> Result<()> {
    let (env, cwd) = super::static_env(host)?;
    ExtensionRegistry::new().require("subst", &env)?;

    let mut substitutions = match args.params {
        Some(ref path) => SubstitutionMap::from_toml_file(path)?,
        None => SubstitutionMap::new(),
    };
    substitutions.merge(parse_defines(&args.defines)?);

    let mut task = SubstTask::new(args.template, args.output, substitutions);
    if let Some(path) = args.params {
        task = task.with_params_file(path);
    }
    let search = WhichSearch::new();
    let cx = TaskContext::new(&env, cwd, &SystemRunner, &search);

    tracing::info!("{}", task.describe());
    task.run(&cx)?;

    Ok(())
}

fn parse_defines(defines: &[String]) -> Result<SubstitutionMap> {
    let mut map = SubstitutionMap::new();
    for define in defines {
        let (key, value) = define
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid define `{}`: expected KEY=VALUE", define))?;
        map.insert(key, value)?;
    }
    Ok(map)
}
