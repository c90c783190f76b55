//! # Environment Path Resolver
//!
//! Resolves the location of an external resource (conda environments, GTDB,
//! EggNOG, ...) through a fixed precedence chain:
//!
//! 1. the value given on the command line for this invocation,
//! 2. the value persisted in the [`PathStore`] by an earlier run,
//! 3. the process environment variable,
//! 4. an interactive prompt with a hard deadline, whose answer is persisted.
//!
//! Step 4 is gated twice: it never runs in [`ResolveMode::HelpOnly`], and in
//! [`ResolveMode::Execute`] it only runs for resources the active subcommand
//! cannot proceed without.

use crate::constants::{BANNER_WIDTH, PROMPT_TIMEOUT};
use crate::core::paths;
use crate::core::prompt::{PromptError, Prompter};
use crate::core::store::{PathStore, StoreError};
use crate::models::{Provenance, ResolvedPath, ResourceKey};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while resolving a resource path.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Timed out waiting for the '{key}' path to be entered.")]
    ResolutionTimeout { key: ResourceKey },
    #[error(
        "No path for '{key}' could be resolved. Use the {flag} flag, set the '{env_var}' environment variable, or run `aviary configure {flag} <path>`."
    )]
    UnresolvedPath {
        key: ResourceKey,
        flag: &'static str,
        env_var: &'static str,
    },
    #[error("Persisted path store error: {0}")]
    Store(#[from] StoreError),
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),
    #[error("Invalid path for '{key}': {source}")]
    InvalidPath {
        key: ResourceKey,
        #[source]
        source: paths::PathError,
    },
}

/// What the caller intends to do with the resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Only displaying defaults (e.g. `--help`). Never blocks on user input.
    HelpOnly,
    /// About to run a workflow. May prompt for required resources.
    Execute,
}

/// Looks up resource paths for one invocation.
///
/// The environment is snapshotted at construction; later changes to the
/// process environment are not seen.
pub struct Resolver {
    store: Box<dyn PathStore>,
    prompter: Box<dyn Prompter>,
    environment: HashMap<String, String>,
    timeout: Duration,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("environment", &self.environment)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Resolver {
    /// Creates a resolver over a snapshot of the current process environment.
    pub fn new(store: Box<dyn PathStore>, prompter: Box<dyn Prompter>) -> Self {
        let environment = ResourceKey::ALL
            .iter()
            .filter_map(|key| {
                env::var(key.env_var())
                    .ok()
                    .map(|value| (key.env_var().to_string(), value))
            })
            .collect();
        Self::with_environment(store, prompter, environment)
    }

    /// Creates a resolver with an explicit environment snapshot.
    pub fn with_environment(
        store: Box<dyn PathStore>,
        prompter: Box<dyn Prompter>,
        environment: HashMap<String, String>,
    ) -> Self {
        Self {
            store,
            prompter,
            environment,
            timeout: PROMPT_TIMEOUT,
        }
    }

    /// Overrides the prompt deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolves `key` from the store, the environment, or (when allowed) the user.
    ///
    /// Returns `Ok(None)` when nothing was found and prompting is not allowed
    /// (help mode, or an optional resource).
    pub fn resolve(
        &self,
        key: ResourceKey,
        required: bool,
        mode: ResolveMode,
    ) -> Result<Option<ResolvedPath>, ResolveError> {
        if let Some(value) = self.store.get(key.env_var())? {
            let value = value.trim();
            if !value.is_empty() {
                log::debug!("Resolved '{}' from persisted store.", key);
                return Ok(Some(ResolvedPath {
                    key,
                    path: PathBuf::from(value),
                    provenance: Provenance::Persisted,
                }));
            }
        }

        if let Some(value) = self.environment.get(key.env_var()) {
            let value = value.trim();
            if !value.is_empty() {
                log::debug!("Resolved '{}' from ${}.", key, key.env_var());
                return Ok(Some(ResolvedPath {
                    key,
                    path: PathBuf::from(value),
                    provenance: Provenance::Environment,
                }));
            }
        }

        if mode == ResolveMode::HelpOnly || !required {
            return Ok(None);
        }

        self.prompt_for(key).map(Some)
    }

    /// Like [`Resolver::resolve`], but a value supplied on the command line wins.
    pub fn resolve_with_flag(
        &self,
        key: ResourceKey,
        flag_value: Option<&str>,
        required: bool,
        mode: ResolveMode,
    ) -> Result<Option<ResolvedPath>, ResolveError> {
        match flag_value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => {
                let path = paths::expand_user_path(raw)
                    .map_err(|source| ResolveError::InvalidPath { key, source })?;
                Ok(Some(ResolvedPath {
                    key,
                    path,
                    provenance: Provenance::Flag,
                }))
            }
            None => self.resolve(key, required, mode),
        }
    }

    /// Writes `path` to the persistent store under the key's identifier.
    /// Writing a value that is already stored succeeds without changing anything.
    pub fn persist(&self, key: ResourceKey, path: &str) -> Result<(), ResolveError> {
        self.store.set(key.env_var(), path)?;
        Ok(())
    }

    fn prompt_for(&self, key: ResourceKey) -> Result<ResolvedPath, ResolveError> {
        eprintln!("{}", render_missing_banner(key));
        let prompt = format!("Input {} now", key.env_var());

        let Some(answer) = self.prompter.read_line(&prompt, self.timeout)? else {
            log::error!("No value entered for {} before the deadline.", key.env_var());
            return Err(ResolveError::ResolutionTimeout { key });
        };

        let trimmed = answer.trim();
        if trimmed.is_empty() {
            return Err(ResolveError::UnresolvedPath {
                key,
                flag: key.flag(),
                env_var: key.env_var(),
            });
        }

        let path = paths::expand_user_path(trimmed)
            .map_err(|source| ResolveError::InvalidPath { key, source })?;
        let stored = path.display().to_string();
        self.persist(key, &stored)?;
        log::info!("Saved {}={} for future runs.", key.env_var(), stored);

        Ok(ResolvedPath {
            key,
            path,
            provenance: Provenance::Prompt,
        })
    }
}

fn centered(text: &str) -> String {
    format!("{:^width$}", text, width = BANNER_WIDTH)
        .trim_end()
        .to_string()
}

/// The diagnostic printed before prompting for a missing resource.
pub fn render_missing_banner(key: ResourceKey) -> String {
    let mut lines = vec![
        String::new(),
        "=".repeat(BANNER_WIDTH),
        centered(" ERROR "),
        "_".repeat(BANNER_WIDTH),
        String::new(),
        centered(&format!(
            "The '{}' environment variable is not defined.",
            key.env_var()
        )),
        String::new(),
        centered(&format!(
            "Please set this variable to {}.",
            key.description()
        )),
    ];
    if let Some(hint) = key.install_hint() {
        lines.push(centered(hint));
    }
    lines.push(centered(&format!("Alternatively, use {} flag.", key.flag())));
    lines.push("=".repeat(BANNER_WIDTH));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::prompt::{ScriptedPrompter, read_with_deadline};
    use crate::core::store::MemoryStore;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    /// Counts writes so tests can assert how often `persist` reached the store.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        writes: Arc<AtomicUsize>,
    }

    impl PathStore for CountingStore {
        fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(name)
        }
        fn set(&self, name: &str, value: &str) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(name, value)
        }
    }

    /// Records whether it was ever asked anything.
    struct TrackingPrompter {
        asked: Rc<Cell<bool>>,
        answer: Option<String>,
    }

    impl Prompter for TrackingPrompter {
        fn read_line(&self, _: &str, _: Duration) -> Result<Option<String>, PromptError> {
            self.asked.set(true);
            Ok(self.answer.clone())
        }
    }

    /// Answers after `delay`, waited on with the production deadline logic.
    struct SlowPrompter {
        delay: Duration,
    }

    impl Prompter for SlowPrompter {
        fn read_line(&self, _: &str, timeout: Duration) -> Result<Option<String>, PromptError> {
            let delay = self.delay;
            read_with_deadline(
                move || {
                    std::thread::sleep(delay);
                    Ok("/late/but/in/time".to_string())
                },
                timeout,
            )
        }
    }

    fn resolver(store: MemoryStore, prompter: impl Prompter + 'static) -> Resolver {
        Resolver::with_environment(Box::new(store), Box::new(prompter), HashMap::new())
    }

    #[test]
    fn test_persisted_value_wins_without_prompting() {
        let asked = Rc::new(Cell::new(false));
        let prompter = TrackingPrompter {
            asked: Rc::clone(&asked),
            answer: None,
        };
        let r = resolver(
            MemoryStore::with(&[("GTDBTK_DATA_PATH", "/db/gtdb")]),
            prompter,
        );
        let resolved = r
            .resolve(ResourceKey::Gtdb, true, ResolveMode::Execute)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.path, PathBuf::from("/db/gtdb"));
        assert_eq!(resolved.provenance, Provenance::Persisted);
        assert!(!asked.get());
    }

    #[test]
    fn test_persisted_value_beats_environment() {
        let env = HashMap::from([("CONDA_ENV_PATH".to_string(), "/env/conda".to_string())]);
        let r = Resolver::with_environment(
            Box::new(MemoryStore::with(&[("CONDA_ENV_PATH", "/stored/conda")])),
            Box::new(ScriptedPrompter::silent()),
            env,
        );
        let resolved = r
            .resolve(ResourceKey::CondaEnvRoot, true, ResolveMode::Execute)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.path, PathBuf::from("/stored/conda"));
    }

    #[test]
    fn test_environment_is_used_when_nothing_is_persisted() {
        let env = HashMap::from([("EGGNOG_DATA_DIR".to_string(), "/env/eggnog".to_string())]);
        let r = Resolver::with_environment(
            Box::new(MemoryStore::new()),
            Box::new(ScriptedPrompter::silent()),
            env,
        );
        let resolved = r
            .resolve(ResourceKey::Eggnog, true, ResolveMode::Execute)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.provenance, Provenance::Environment);
        assert_eq!(resolved.path, PathBuf::from("/env/eggnog"));
    }

    #[test]
    fn test_stored_and_environment_values_are_trimmed() {
        let env = HashMap::from([("EGGNOG_DATA_DIR".to_string(), " /env/eggnog\n".to_string())]);
        let r = Resolver::with_environment(
            Box::new(MemoryStore::with(&[("CONDA_ENV_PATH", "/stored/conda\n")])),
            Box::new(ScriptedPrompter::silent()),
            env,
        );
        let conda = r
            .resolve(ResourceKey::CondaEnvRoot, true, ResolveMode::Execute)
            .unwrap()
            .unwrap();
        assert_eq!(conda.path, PathBuf::from("/stored/conda"));
        let eggnog = r
            .resolve(ResourceKey::Eggnog, true, ResolveMode::Execute)
            .unwrap()
            .unwrap();
        assert_eq!(eggnog.path, PathBuf::from("/env/eggnog"));
    }

    #[test]
    fn test_flag_value_wins_over_everything() {
        let r = resolver(
            MemoryStore::with(&[("GTDBTK_DATA_PATH", "/db/gtdb")]),
            ScriptedPrompter::silent(),
        );
        let resolved = r
            .resolve_with_flag(ResourceKey::Gtdb, Some("/cli/gtdb"), true, ResolveMode::Execute)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.path, PathBuf::from("/cli/gtdb"));
        assert_eq!(resolved.provenance, Provenance::Flag);
    }

    #[test]
    fn test_help_mode_never_prompts() {
        let asked = Rc::new(Cell::new(false));
        let prompter = TrackingPrompter {
            asked: Rc::clone(&asked),
            answer: Some("/should/not/be/used".to_string()),
        };
        let r = resolver(MemoryStore::new(), prompter);
        let resolved = r
            .resolve(ResourceKey::Gtdb, true, ResolveMode::HelpOnly)
            .unwrap();
        assert_eq!(resolved, None);
        assert!(!asked.get());
    }

    #[test]
    fn test_optional_resource_is_not_prompted_for() {
        let asked = Rc::new(Cell::new(false));
        let prompter = TrackingPrompter {
            asked: Rc::clone(&asked),
            answer: Some("/x".to_string()),
        };
        let r = resolver(MemoryStore::new(), prompter);
        let resolved = r
            .resolve(ResourceKey::Enrichm, false, ResolveMode::Execute)
            .unwrap();
        assert_eq!(resolved, None);
        assert!(!asked.get());
    }

    #[test]
    fn test_timeout_fails_with_resolution_timeout() {
        let r = resolver(MemoryStore::new(), ScriptedPrompter::silent());
        let err = r
            .resolve(ResourceKey::Gtdb, true, ResolveMode::Execute)
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::ResolutionTimeout {
                key: ResourceKey::Gtdb
            }
        ));
    }

    #[test]
    fn test_slow_prompt_is_bounded_by_the_deadline() {
        let r = resolver(
            MemoryStore::new(),
            SlowPrompter {
                delay: Duration::from_secs(60),
            },
        )
        .with_timeout(Duration::from_millis(50));
        let started = Instant::now();
        let err = r
            .resolve(ResourceKey::CondaEnvRoot, true, ResolveMode::Execute)
            .unwrap_err();
        assert!(matches!(err, ResolveError::ResolutionTimeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_answer_just_before_deadline_persists_exactly_once() {
        let store = CountingStore::default();
        let writes = Arc::clone(&store.writes);
        let r = Resolver::with_environment(
            Box::new(store),
            Box::new(SlowPrompter {
                delay: Duration::from_millis(20),
            }),
            HashMap::new(),
        )
        .with_timeout(Duration::from_millis(500));

        let resolved = r
            .resolve(ResourceKey::Gtdb, true, ResolveMode::Execute)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.provenance, Provenance::Prompt);
        assert_eq!(resolved.path, PathBuf::from("/late/but/in/time"));
        assert_eq!(writes.load(Ordering::SeqCst), 1);

        // The next lookup is served from the store.
        let again = r
            .resolve(ResourceKey::Gtdb, true, ResolveMode::Execute)
            .unwrap()
            .unwrap();
        assert_eq!(again.provenance, Provenance::Persisted);
        assert_eq!(writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_answer_is_unresolved() {
        let r = resolver(MemoryStore::new(), ScriptedPrompter::answering("   "));
        let err = r
            .resolve(ResourceKey::CondaEnvRoot, true, ResolveMode::Execute)
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::UnresolvedPath {
                key: ResourceKey::CondaEnvRoot,
                flag: "--conda-prefix",
                env_var: "CONDA_ENV_PATH",
            }
        ));
    }

    #[test]
    fn test_persist_twice_is_idempotent() {
        let r = resolver(MemoryStore::new(), ScriptedPrompter::silent());
        r.persist(ResourceKey::Busco, "/db/busco").unwrap();
        r.persist(ResourceKey::Busco, "/db/busco").unwrap();
        let resolved = r
            .resolve(ResourceKey::Busco, false, ResolveMode::HelpOnly)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.path, PathBuf::from("/db/busco"));
    }

    #[test]
    fn test_missing_banner_layout() {
        let banner = render_missing_banner(ResourceKey::Gtdb);
        let lines: Vec<&str> = banner.lines().collect();
        assert_eq!(lines.get(1).copied(), Some("=".repeat(80).as_str()));
        assert_eq!(lines.get(2).map(|l| l.trim()), Some("ERROR"));
        assert_eq!(lines.get(3).copied(), Some("_".repeat(80).as_str()));
        assert!(banner.contains("The 'GTDBTK_DATA_PATH' environment variable is not defined."));
        assert!(banner.contains("https://github.com/Ecogenomics/GTDBTk#installation"));
        assert!(banner.contains("Alternatively, use --gtdb-path flag."));
        assert_eq!(lines.last().copied(), Some("=".repeat(80).as_str()));
        assert!(lines.iter().all(|l| l.len() <= 80));
    }
}
