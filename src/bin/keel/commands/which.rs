//! `keel which` command

use anyhow::Result;

use crate::cli::WhichArgs;
use keel::builder::{resolve, WhichSearch};
use keel::ToolRequest;

pub fn execute(args: WhichArgs, host: Option<String>) -> Result<()> {
    let (env, _) = super::static_env(host)?;
    let request = ToolRequest::new(args.names)?;

    let resolution = resolve(&request, &env, &WhichSearch::new());
    resolution.log_advisories();

    let (name, path) = resolution.require(&request)?;
    println!("{} {}", name, path.display());

    Ok(())
}
