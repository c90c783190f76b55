//! # Core Resolution Layer
//!
//! Everything between the command line and the engine call:
//!
//! - **`registry`**: static flag groups and subcommand definitions.
//! - **`schema`**: composes groups into a subcommand's flag surface, lowers it
//!   into clap and extracts parsed values.
//! - **`resolver`**, **`store`**, **`prompt`**: the precedence chain for
//!   external resource paths and its persistence.
//! - **`materializer`**: validates limits and writes the run configuration.
//! - **`paths`**: well-known locations in the user's config and data dirs.

pub mod materializer;
pub mod paths;
pub mod prompt;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod store;
