// src/system/executor.rs

use std::collections::HashMap;
use std::path::Path;
use std::process::{Command as StdCommand, ExitStatus, Stdio};
use thiserror::Error;

/// Errors raised before the child process could start.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("No program specified to run.")]
    EmptyCommand,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
}

/// Runs `program` with `args` to completion, inheriting this process' stdio.
///
/// The child's exit status is returned as-is; a non-zero exit is not an error here.
pub fn run_to_completion(
    program: &str,
    args: &[String],
    cwd: &Path,
    env_vars: &HashMap<String, String>,
) -> Result<ExitStatus, ExecutionError> {
    if program.trim().is_empty() {
        return Err(ExecutionError::EmptyCommand);
    }

    let clean_cwd = dunce::simplified(cwd);
    log::debug!(
        "Spawning '{}' with {} argument(s) in '{}'",
        program,
        args.len(),
        clean_cwd.display()
    );

    let mut child = StdCommand::new(program)
        .args(args)
        .current_dir(clean_cwd)
        .envs(env_vars)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| ExecutionError::CommandFailed(program.to_string(), e))?;

    let status = child
        .wait()
        .map_err(|e| ExecutionError::CommandFailed(program.to_string(), e))?;
    log::debug!("'{}' finished with {}", program, status);
    Ok(status)
}

/// The process exit code that mirrors `status`.
///
/// On Unix a child killed by a signal maps to `128 + signal`, like a shell does.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sh(script: &str) -> ExitStatus {
        let dir = tempdir().unwrap();
        run_to_completion(
            "sh",
            &["-c".to_string(), script.to_string()],
            dir.path(),
            &HashMap::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_exit_code_is_propagated() {
        assert_eq!(exit_code(sh("exit 0")), 0);
        assert_eq!(exit_code(sh("exit 3")), 3);
    }

    #[test]
    fn test_signal_maps_to_128_plus_signal() {
        assert_eq!(exit_code(sh("kill -TERM $$")), 128 + 15);
    }

    #[test]
    fn test_env_vars_reach_the_child() {
        let dir = tempdir().unwrap();
        let env = HashMap::from([("AVIARY_TEST_VALUE".to_string(), "7".to_string())]);
        let status = run_to_completion(
            "sh",
            &["-c".to_string(), "exit $AVIARY_TEST_VALUE".to_string()],
            dir.path(),
            &env,
        )
        .unwrap();
        assert_eq!(exit_code(status), 7);
    }

    #[test]
    fn test_missing_program_is_command_failed() {
        let dir = tempdir().unwrap();
        let err = run_to_completion(
            "aviary-definitely-not-a-program",
            &[],
            dir.path(),
            &HashMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ExecutionError::CommandFailed(..)));
    }

    #[test]
    fn test_empty_program() {
        let dir = tempdir().unwrap();
        let err = run_to_completion("  ", &[], dir.path(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, ExecutionError::EmptyCommand));
    }
}
