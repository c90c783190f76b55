// src/core/materializer.rs

use crate::constants::RUN_CONFIG_FILENAME;
use crate::core::paths;
use crate::core::resolver::{ResolveError, ResolveMode, Resolver};
use crate::core::schema::SubcommandSchema;
use crate::models::{
    CondaFrontend, DefaultValue, ExecutionFlags, ParsedOptions, ReadInputs, ResourceLimits,
    RunConfig,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while turning parsed options into a run configuration.
#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("Could not create output directory '{path}': {source}")]
    OutputDirCreateFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid value '{value}' for {flag}.")]
    InvalidResourceValue { flag: String, value: String },
    #[error("--n-cores ({max_cores}) must be greater than or equal to --max-threads ({max_threads}).")]
    InvalidResourceBounds { max_cores: u32, max_threads: u32 },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("Failed to serialize run configuration: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Could not write run configuration to '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

type MaterializeResult<T> = Result<T, MaterializeError>;

/// Flag ids folded into dedicated `RunConfig` fields rather than `params`.
const CONSUMED_IDS: &[&str] = &[
    "max_threads",
    "n_cores",
    "max_memory",
    "pplacer_threads",
    "output",
    "workflow",
    "dryrun",
    "clean",
    "build",
    "conda_frontend",
    "cmds",
    "pe1",
    "pe2",
    "interleaved",
    "coupled",
    "longreads",
    "longread_type",
];

/// Merges parsed options and resolved resource paths into a [`RunConfig`]
/// and writes it to `<output>/config.json`.
///
/// Limits are validated before anything touches the filesystem. Only the
/// resources whose flags appear in `schema` are resolved.
pub fn materialize(
    parsed: &ParsedOptions,
    schema: &SubcommandSchema,
    resolver: &Resolver,
) -> MaterializeResult<RunConfig> {
    let limits = resource_limits(parsed)?;

    let output = prepare_output_dir(parsed.str("output").unwrap_or("./"))?;

    let mut resolved_paths = BTreeMap::new();
    for entry in &schema.flags {
        let DefaultValue::Resource { key, required } = entry.flag.default else {
            continue;
        };
        let flag_value = parsed.str(entry.id());
        if let Some(resolved) =
            resolver.resolve_with_flag(key, flag_value, required, ResolveMode::Execute)?
        {
            log::debug!(
                "{} -> '{}' ({:?})",
                key,
                resolved.path.display(),
                resolved.provenance
            );
            resolved_paths.insert(key, resolved);
        } else {
            log::debug!("{} left unresolved; not required by '{}'.", key, schema.name);
        }
    }

    let params = parsed
        .values
        .iter()
        .filter(|(id, _)| !CONSUMED_IDS.contains(&id.as_str()))
        .filter(|(id, _)| {
            !schema
                .flag(id)
                .is_some_and(|f| matches!(f.flag.default, DefaultValue::Resource { .. }))
        })
        .map(|(id, value)| (id.clone(), value.clone()))
        .collect();

    let workflow = parsed
        .str("workflow")
        .or_else(|| schema.default_workflow())
        .unwrap_or(schema.name)
        .to_string();

    let config = RunConfig {
        subcommand: parsed.subcommand.clone(),
        workflow,
        output,
        limits,
        reads: read_inputs(parsed),
        params,
        paths: resolved_paths,
        execution: execution_flags(parsed),
    };

    write_run_config(&config)?;
    Ok(config)
}

fn parse_limit(parsed: &ParsedOptions, id: &str, flag: &str) -> MaterializeResult<u32> {
    let raw = parsed.str(id).unwrap_or_default();
    raw.trim()
        .parse::<u32>()
        .map_err(|_| MaterializeError::InvalidResourceValue {
            flag: flag.to_string(),
            value: raw.to_string(),
        })
}

fn resource_limits(parsed: &ParsedOptions) -> MaterializeResult<ResourceLimits> {
    let max_threads = parse_limit(parsed, "max_threads", "--max-threads")?;
    let max_cores = parse_limit(parsed, "n_cores", "--n-cores")?;
    let max_memory_gb = parse_limit(parsed, "max_memory", "--max-memory")?;
    let pplacer_threads = parse_limit(parsed, "pplacer_threads", "--pplacer-threads")?;

    if max_cores < max_threads {
        return Err(MaterializeError::InvalidResourceBounds {
            max_cores,
            max_threads,
        });
    }

    Ok(ResourceLimits {
        max_threads,
        max_cores,
        max_memory_gb,
        pplacer_threads,
    })
}

fn prepare_output_dir(raw: &str) -> MaterializeResult<PathBuf> {
    let path = paths::expand_user_path(raw).map_err(|_| MaterializeError::InvalidResourceValue {
        flag: "--output".to_string(),
        value: raw.to_string(),
    })?;
    let create_failed = |source| MaterializeError::OutputDirCreateFailed {
        path: path.display().to_string(),
        source,
    };
    fs::create_dir_all(&path).map_err(create_failed)?;
    dunce::canonicalize(&path).map_err(create_failed)
}

fn read_inputs(parsed: &ParsedOptions) -> ReadInputs {
    ReadInputs {
        pe1: parsed.list("pe1"),
        pe2: parsed.list("pe2"),
        interleaved: parsed.list("interleaved"),
        coupled: parsed.list("coupled"),
        longreads: parsed.list("longreads"),
        longread_type: parsed.str("longread_type").map(str::to_string),
    }
}

fn execution_flags(parsed: &ParsedOptions) -> ExecutionFlags {
    ExecutionFlags {
        dry_run: parsed.flag("dryrun"),
        clean: parsed
            .get("clean")
            .and_then(|v| v.as_bool())
            .unwrap_or(true),
        conda_frontend: parsed
            .str("conda_frontend")
            .and_then(CondaFrontend::parse)
            .unwrap_or_default(),
        build: parsed.flag("build"),
        passthrough: parsed.str("cmds").unwrap_or_default().trim().to_string(),
    }
}

/// Where [`materialize`] writes the configuration for `output`.
pub fn run_config_path(output: &Path) -> PathBuf {
    output.join(RUN_CONFIG_FILENAME)
}

fn write_run_config(config: &RunConfig) -> MaterializeResult<()> {
    let path = run_config_path(&config.output);
    let json = serde_json::to_string_pretty(config)?;
    fs::write(&path, json).map_err(|source| MaterializeError::Write {
        path: path.display().to_string(),
        source,
    })?;
    log::info!("Run configuration written to '{}'.", path.display());
    Ok(())
}
