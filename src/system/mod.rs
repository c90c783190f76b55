//! # System Interaction Layer
//!
//! The boundary between resolved configuration and the external workflow engine.
//!
//! ## Modules
//!
//! - **`dispatcher`**: translates a `RunConfig` into one engine invocation and runs it.
//! - **`engine_config`**: loads (or creates) `engine.toml`, which names the engine
//!   program and the workflow definition it runs.
//! - **`executor`**: spawns a process with inherited stdio and maps its exit status.

pub mod dispatcher;
pub mod engine_config;
pub mod executor;
