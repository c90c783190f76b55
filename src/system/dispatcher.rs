// src/system/dispatcher.rs

use crate::constants::BUILD_ONLY_FLAG;
use crate::core::materializer::run_config_path;
use crate::models::{EngineConfig, ResourceKey, RunConfig};
use crate::system::engine_config::EngineConfigError;
use crate::system::executor::{self, ExecutionError};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors raised while building or starting the engine invocation.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Could not parse --snakemake-cmds '{0}'.")]
    PassthroughParse(String),
    #[error("Failed to start the workflow engine: {0}")]
    Spawn(#[from] ExecutionError),
    #[error("Engine settings error: {0}")]
    EngineConfig(#[from] EngineConfigError),
}

/// Engine flags the dispatcher sets itself. Passthrough tokens naming one of
/// these are reported but still forwarded.
const MANAGED_FLAGS: &[&str] = &[
    "--snakefile",
    "-s",
    "--directory",
    "-d",
    "--configfile",
    "--cores",
    "-c",
    "--jobs",
    "-j",
    "--max-threads",
    "--resources",
    "--rerun-incomplete",
    "--nolock",
    "--use-conda",
    "--conda-frontend",
    "--conda-prefix",
    "--dryrun",
    "--dry-run",
    "-n",
    "--notemp",
    "--nt",
    BUILD_ONLY_FLAG,
];

/// One fully translated engine call. Consumed by [`WorkflowInvocation::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowInvocation {
    pub program: String,
    pub args: Vec<String>,
    /// Resolved resource paths exported to the child under their variable names.
    pub env: HashMap<String, String>,
    pub working_dir: PathBuf,
    pub workflow: String,
    /// Set when the engine is asked to plan without changing anything.
    pub dry_run: bool,
}

impl WorkflowInvocation {
    pub fn is_mutating(&self) -> bool {
        !self.dry_run
    }

    /// The command line as it would be typed in a shell.
    pub fn command_line(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.as_str());
        words.extend(self.args.iter().map(String::as_str));
        shlex::try_join(words.iter().copied()).unwrap_or_else(|_| words.join(" "))
    }

    /// Spawns the engine once and waits for it.
    pub fn execute(self) -> Result<ExitStatus, DispatchError> {
        log::info!("Executing: {}", self.command_line());
        let status =
            executor::run_to_completion(&self.program, &self.args, &self.working_dir, &self.env)?;
        Ok(status)
    }
}

fn collides(token: &str) -> Option<&'static str> {
    MANAGED_FLAGS
        .iter()
        .copied()
        .find(|flag| token == *flag || token.strip_prefix(flag).is_some_and(|r| r.starts_with('=')))
}

/// Splits the passthrough string with shell-word rules.
fn passthrough_tokens(passthrough: &str) -> Result<Vec<String>, DispatchError> {
    if passthrough.trim().is_empty() {
        return Ok(Vec::new());
    }
    shlex::split(passthrough).ok_or_else(|| DispatchError::PassthroughParse(passthrough.to_string()))
}

/// Translates a run configuration into the engine command line.
pub fn build_invocation(
    config: &RunConfig,
    engine: &EngineConfig,
) -> Result<WorkflowInvocation, DispatchError> {
    let output = config.output.display().to_string();
    let limits = &config.limits;
    let execution = &config.execution;

    let mut args = vec![
        "--snakefile".to_string(),
        engine.snakefile.display().to_string(),
        "--directory".to_string(),
        output,
        "--configfile".to_string(),
        run_config_path(&config.output).display().to_string(),
        "--cores".to_string(),
        limits.max_cores.to_string(),
        "--max-threads".to_string(),
        limits.max_threads.to_string(),
        "--resources".to_string(),
        format!("mem_mb={}", u64::from(limits.max_memory_gb) * 1024),
        "--rerun-incomplete".to_string(),
        "--nolock".to_string(),
        "--use-conda".to_string(),
        "--conda-frontend".to_string(),
        execution.conda_frontend.as_str().to_string(),
    ];

    if let Some(root) = config.path(ResourceKey::CondaEnvRoot) {
        args.push("--conda-prefix".to_string());
        args.push(root.display().to_string());
    }
    if execution.dry_run {
        args.push("--dryrun".to_string());
    }
    if !execution.clean {
        args.push("--notemp".to_string());
    }
    if execution.build {
        args.push(BUILD_ONLY_FLAG.to_string());
    }

    args.push(config.workflow.clone());

    let extra = passthrough_tokens(&execution.passthrough)?;
    for token in &extra {
        if let Some(managed) = collides(token) {
            log::warn!(
                "--snakemake-cmds passes '{}', which aviary already sets ({}). Keeping both; the engine decides.",
                token,
                managed
            );
        }
    }
    args.extend(extra);

    let env = config
        .paths
        .values()
        .map(|resolved| {
            (
                resolved.key.env_var().to_string(),
                resolved.path.display().to_string(),
            )
        })
        .collect();

    Ok(WorkflowInvocation {
        program: engine.program.clone(),
        args,
        env,
        working_dir: config.output.clone(),
        workflow: config.workflow.clone(),
        dry_run: execution.dry_run,
    })
}

/// Builds and runs the engine for `config`, returning its exit status unchanged.
pub fn dispatch(config: &RunConfig, engine: &EngineConfig) -> Result<ExitStatus, DispatchError> {
    let invocation = build_invocation(config, engine)?;
    if invocation.dry_run {
        log::info!("Dry run: the engine will only report what it would do.");
    }
    invocation.execute()
}
