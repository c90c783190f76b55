// src/cli/handlers/workflow.rs

use anyhow::Result;
use colored::*;

use crate::{
    cli::handlers::open_resolver,
    core::{materializer, schema},
    models::SubcommandDef,
    system::{dispatcher, engine_config, executor},
};

/// Runs one pipeline subcommand: parse, materialize, hand off to the engine.
/// Returns the engine's exit code.
pub fn handle(def: &'static SubcommandDef, args: Vec<String>) -> Result<i32> {
    let resolver = open_resolver()?;

    // 1. Compose the flag surface. Defaults are looked up without prompting,
    //    so `--help` never blocks.
    let schema = schema::build_subcommand(def, &resolver)?;
    let matches = schema::to_command(&schema).try_get_matches_from(&args)?;
    let parsed = schema::extract(&schema, &matches)?;
    log::debug!("Parsed options for '{}': {:?}", def.name, parsed.values);

    // 2. Resolve what this subcommand needs and write config.json.
    let config = materializer::materialize(&parsed, &schema, &resolver)?;

    // 3. Launch the engine.
    let engine = engine_config::load_engine_config()?;
    let status = dispatcher::dispatch(&config, &engine)?;
    let code = executor::exit_code(status);

    if code == 0 {
        log::info!("Workflow '{}' finished.", config.workflow);
    } else {
        eprintln!(
            "\n{}",
            format!("{} exited with status {}.", engine.program, code).yellow()
        );
    }
    Ok(code)
}
