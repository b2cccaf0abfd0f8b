use crate::apps;
use crate::shell::registry::ResourceKind;
use anyhow::Result;
use colored::*;
use log::info;

pub async fn apps_command() -> Result<()> {
    info!("Listing bundled applications");
    let registry = apps::bundled_registry();

    println!();
    println!("  {}", "Bundled applications:".bright_white().bold());
    for name in registry.names() {
        let title = registry.title_of(&name);
        match registry.manifest(&name) {
            Some(manifest) => {
                println!("  {} {} ({})", "○".bright_yellow(), title.white().bold(), name.cyan());
                for resource in &manifest.resources {
                    let kind = match resource.kind {
                        ResourceKind::Stylesheet => "css",
                        ResourceKind::Script => "js ",
                    };
                    println!("      {} {}", kind.dimmed(), resource.path);
                }
            }
            None => {
                println!(
                    "  {} {} ({}) {}",
                    "●".bright_green(),
                    title.white().bold(),
                    name.cyan(),
                    "built in".bright_green()
                );
            }
        }
    }
    println!();

    Ok(())
}
