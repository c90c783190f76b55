// src/cli/handlers/configure.rs

use anyhow::Result;
use colored::*;

use crate::{
    cli::handlers::open_resolver,
    core::{
        paths, registry,
        resolver::{ResolveMode, Resolver},
        schema,
    },
    models::{ResourceKey, SubcommandDef},
};

/// Persists every path given on the command line for future runs.
/// With no flags, prints what is currently configured.
pub fn handle(def: &'static SubcommandDef, args: Vec<String>) -> Result<i32> {
    let resolver = open_resolver()?;
    let schema = schema::build_subcommand(def, &resolver)?;
    let matches = schema::to_command(&schema).try_get_matches_from(&args)?;
    let parsed = schema::extract(&schema, &matches)?;

    let mut saved = 0;
    for entry in &schema.flags {
        let Some(key) = registry::configure_target(entry.id()) else {
            continue;
        };
        let Some(raw) = parsed.str(entry.id()).filter(|_| parsed.was_supplied(entry.id())) else {
            continue;
        };
        let path = paths::expand_user_path(raw.trim())?;
        let value = path.display().to_string();
        resolver.persist(key, &value)?;
        println!("  {} {}", format!("{}=", key.env_var()).green(), value);
        saved += 1;
    }

    if saved == 0 {
        show_current(&resolver)?;
    } else {
        println!("\n{}", "Paths saved. They will be used by future runs.".bold());
    }
    Ok(0)
}

fn show_current(resolver: &Resolver) -> Result<()> {
    println!("{}", "Configured paths:".bold());
    for key in ResourceKey::ALL {
        match resolver.resolve(key, false, ResolveMode::HelpOnly)? {
            Some(resolved) => println!(
                "  {:<18} {} ({:?})",
                key.env_var(),
                resolved.path.display(),
                resolved.provenance
            ),
            None => println!(
                "  {:<18} {}",
                key.env_var(),
                format!("not set (use {})", key.flag()).dimmed()
            ),
        }
    }
    Ok(())
}
