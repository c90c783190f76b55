// src/bin/aviary.rs

use anyhow::Result;
use aviary::{
    cli::{self, Cli, handlers, logging},
    core::registry,
    models::SubcommandDef,
};
use clap::Parser;
use colored::*;
use std::env;

// --- Command Definition and Registry ---

/// Binds a subcommand name to the handler that runs it.
struct CommandDefinition {
    name: &'static str,
    handler: fn(&'static SubcommandDef, Vec<String>) -> Result<i32>,
}

static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "assemble",
        handler: handlers::workflow::handle,
    },
    CommandDefinition {
        name: "recover",
        handler: handlers::workflow::handle,
    },
    CommandDefinition {
        name: "annotate",
        handler: handlers::workflow::handle,
    },
    CommandDefinition {
        name: "genotype",
        handler: handlers::workflow::handle,
    },
    CommandDefinition {
        name: "cluster",
        handler: handlers::workflow::handle,
    },
    CommandDefinition {
        name: "viral",
        handler: handlers::workflow::handle,
    },
    CommandDefinition {
        name: "complete",
        handler: handlers::workflow::handle,
    },
    CommandDefinition {
        name: "isolate",
        handler: handlers::workflow::handle,
    },
    CommandDefinition {
        name: registry::CONFIGURE,
        handler: handlers::configure::handle,
    },
];

fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY.iter().find(|cmd| cmd.name == name)
}

/// Parses global flags, sets up logging and routes to the subcommand handler.
/// Errors are reported centrally; the exit code of a dispatched engine run is
/// this process' exit code.
fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    match run_cli(args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            // Usage errors, `--help` and `--version` keep clap's own output and codes.
            if let Some(clap_err) = e.downcast_ref::<clap::Error>() {
                clap_err.exit();
            }
            // Stderr already gets the message below.
            if logging::logging_to_file() {
                log::error!("{:#}", e);
            }
            eprintln!("\n{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run_cli(args: Vec<String>) -> Result<i32> {
    if cli::wants_banner(&args) {
        print!("{}", cli::render_banner());
        return Ok(0);
    }

    let parsed = Cli::try_parse_from(&args)?;

    // Logging is configured only once the --log target is known to be new.
    logging::init(parsed.verbosity, parsed.log.as_deref())?;
    log::info!("Command - aviary {}", args.join(" "));
    log::info!("Version - {}", env!("CARGO_PKG_VERSION"));

    let mut words = parsed.args.into_iter();
    let Some(name) = words.next() else {
        print!("{}", cli::render_banner());
        return Ok(0);
    };

    let (Some(command), Some(def)) = (find_command(&name), registry::subcommand(&name)) else {
        let err = clap::Error::raw(
            clap::error::ErrorKind::InvalidSubcommand,
            format!(
                "unrecognized subcommand '{}'. Run `aviary --help` for the list.\n",
                name
            ),
        );
        return Err(err.into());
    };

    (command.handler)(def, words.collect())
}
