//! `keel tools` command
//!
//! Lists the extensions and whether they can be used in this environment.

use anyhow::Result;

use keel::builder::Availability;
use keel::ExtensionRegistry;

pub fn execute(host: Option<String>) -> Result<()> {
    let (env, _) = super::detected_env(host)?;
    let registry = ExtensionRegistry::new();

    println!("Extensions:");
    println!();

    for extension in registry.all() {
        let status = match registry.availability(extension, &env) {
            Availability::Available => "available".to_string(),
            Availability::Disabled => "disabled".to_string(),
            Availability::Unavailable(e) => format!("unavailable ({})", e),
        };

        println!("  {} - {}", extension.name(), extension.description());
        println!("    Status:  {}", status);
        println!();
    }

    Ok(())
}
