// src/constants.rs

use std::time::Duration;

/// The name of the directory holding aviary's persisted settings (inside the user config dir).
pub const CONFIG_DIR_NAME: &str = "aviary";

/// The file holding persisted resource paths (in ~/.config/aviary/).
pub const ENVIRONMENT_FILENAME: &str = "environment.toml";

/// The file describing how to launch the workflow engine (in ~/.config/aviary/).
pub const ENGINE_CONFIG_FILENAME: &str = "engine.toml";

/// The run configuration written into every output directory.
pub const RUN_CONFIG_FILENAME: &str = "config.json";

/// Default engine executable.
pub const DEFAULT_ENGINE_PROGRAM: &str = "snakemake";

/// Overrides the snakefile from `engine.toml` for a single run.
pub const SNAKEFILE_ENV_VAR: &str = "AVIARY_SNAKEFILE";

/// Hard deadline for the interactive path prompt.
pub const PROMPT_TIMEOUT: Duration = Duration::from_secs(20);

/// Width of the diagnostic banners printed to the terminal.
pub const BANNER_WIDTH: usize = 80;

/// Engine flag appended when only conda environments should be built.
pub const BUILD_ONLY_FLAG: &str = "--conda-create-envs-only";
