// src/cli/handlers/mod.rs

use crate::core::prompt::TerminalPrompter;
use crate::core::resolver::Resolver;
use crate::core::store::FileStore;
use anyhow::Result;

pub mod configure;
pub mod workflow;

/// A resolver over the user's persisted store that prompts on the terminal.
pub fn open_resolver() -> Result<Resolver> {
    let store = FileStore::open_default()?;
    log::debug!("Using persisted paths from '{}'", store.path().display());
    Ok(Resolver::new(Box::new(store), Box::new(TerminalPrompter)))
}
