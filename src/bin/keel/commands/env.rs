//! `keel env` command

use anyhow::{Context, Result};

use crate::cli::EnvArgs;

pub fn execute(args: EnvArgs, host: Option<String>) -> Result<()> {
    let (env, _) = super::detected_env(host)?;

    if args.json {
        let json = serde_json::to_string_pretty(&env).context("failed to serialize environment")?;
        println!("{}", json);
    } else {
        let toml = toml::to_string_pretty(&env).context("failed to serialize environment")?;
        print!("{}", toml);
    }

    Ok(())
}
