// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

// --- FLAG SCHEMA MODELS ---
// Static, declarative descriptions of the command-line surface. Everything in
// this section is `'static` data owned by the registry.

/// How many values a flag consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly one value (`--output out/`).
    Scalar,
    /// A fixed number of values (`--assembly scaffolds.fasta`).
    Fixed(usize),
    /// Zero or more values (`--pe-1 a.fq b.fq`).
    List,
    /// A boolean that may be given bare (`--dry-run`) or with a literal (`--clean false`).
    Toggle,
}

/// Where a flag's default comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Absent,
    Value(&'static str),
    /// Looked up lazily through the resolver when the schema is built.
    Resource { key: ResourceKey, required: bool },
}

/// A single command-line flag definition.
#[derive(Debug, Clone, Copy)]
pub struct Flag {
    /// Destination key, also used in the serialized run configuration.
    pub id: &'static str,
    /// Canonical long name, without the leading dashes.
    pub long: &'static str,
    pub short: Option<char>,
    /// Additional long spellings, e.g. the underscore variants.
    pub aliases: &'static [&'static str],
    pub arity: Arity,
    pub default: DefaultValue,
    /// Closed set of accepted values; empty means unrestricted.
    pub choices: &'static [&'static str],
    pub help: &'static str,
    /// Suppressed from help output.
    pub hidden: bool,
    pub required: bool,
}

impl Flag {
    /// A plain scalar flag with no default. Use struct update syntax for the rest.
    pub const fn new(id: &'static str, long: &'static str, help: &'static str) -> Self {
        Self {
            id,
            long,
            short: None,
            aliases: &[],
            arity: Arity::Scalar,
            default: DefaultValue::Absent,
            choices: &[],
            help,
            hidden: false,
            required: false,
        }
    }

    /// Every option string this flag answers to (`-t`, `--max-threads`, `--max_threads`).
    pub fn option_strings(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(2 + self.aliases.len());
        if let Some(short) = self.short {
            names.push(format!("-{}", short));
        }
        names.push(format!("--{}", self.long));
        names.extend(self.aliases.iter().map(|alias| format!("--{}", alias)));
        names
    }

    /// The canonical `--long` spelling, used in error messages.
    pub fn display_name(&self) -> String {
        format!("--{}", self.long)
    }
}

/// A named, reusable bundle of related flags.
#[derive(Debug)]
pub struct OptionGroup {
    pub name: &'static str,
    pub flags: &'static [Flag],
    /// Sets of flag ids of which at most one may be supplied per invocation.
    pub exclusive: &'static [&'static [&'static str]],
}

/// A pipeline stage selectable on the command line.
#[derive(Debug)]
pub struct SubcommandDef {
    pub name: &'static str,
    pub about: &'static str,
    pub epilog: &'static str,
    /// Included groups, in composition order.
    pub groups: &'static [&'static str],
    /// Flags only this subcommand defines.
    pub extra: &'static [Flag],
}

// --- RESOURCE PATH MODELS ---

/// An external database or tooling location the pipeline needs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKey {
    CondaEnvRoot,
    Gtdb,
    Eggnog,
    Checkm2,
    Busco,
    Enrichm,
}

impl ResourceKey {
    pub const ALL: [ResourceKey; 6] = [
        ResourceKey::CondaEnvRoot,
        ResourceKey::Gtdb,
        ResourceKey::Eggnog,
        ResourceKey::Checkm2,
        ResourceKey::Busco,
        ResourceKey::Enrichm,
    ];

    /// The fixed identifier the value is persisted and exported under.
    pub fn env_var(self) -> &'static str {
        match self {
            ResourceKey::CondaEnvRoot => "CONDA_ENV_PATH",
            ResourceKey::Gtdb => "GTDBTK_DATA_PATH",
            ResourceKey::Eggnog => "EGGNOG_DATA_DIR",
            ResourceKey::Checkm2 => "CHECKM2DB",
            ResourceKey::Busco => "BUSCO_DB",
            ResourceKey::Enrichm => "ENRICHM_DB",
        }
    }

    /// The command-line flag that overrides this resource.
    pub fn flag(self) -> &'static str {
        match self {
            ResourceKey::CondaEnvRoot => "--conda-prefix",
            ResourceKey::Gtdb => "--gtdb-path",
            ResourceKey::Eggnog => "--eggnog-db-path",
            ResourceKey::Checkm2 => "--checkm2-db-path",
            ResourceKey::Busco => "--busco-db-path",
            ResourceKey::Enrichm => "--enrichm-db-path",
        }
    }

    /// Human explanation shown in the interactive diagnostic.
    pub fn description(self) -> &'static str {
        match self {
            ResourceKey::CondaEnvRoot => {
                "your default server/home directory conda environment path"
            }
            ResourceKey::Gtdb => "your GTDB-Tk reference data package",
            ResourceKey::Eggnog => "your local EggNOG database files",
            ResourceKey::Checkm2 => "your local CheckM2 database",
            ResourceKey::Busco => "your local BUSCO database files",
            ResourceKey::Enrichm => "your local EnrichM database files",
        }
    }

    /// Optional installation hint printed under the description.
    pub fn install_hint(self) -> Option<&'static str> {
        match self {
            ResourceKey::Gtdb => Some("https://github.com/Ecogenomics/GTDBTk#installation"),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKey::CondaEnvRoot => "conda-env-root",
            ResourceKey::Gtdb => "gtdb",
            ResourceKey::Eggnog => "eggnog",
            ResourceKey::Checkm2 => "checkm2",
            ResourceKey::Busco => "busco",
            ResourceKey::Enrichm => "enrichm",
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which step of the precedence chain produced a path.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    Flag,
    Persisted,
    Environment,
    Prompt,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub key: ResourceKey,
    pub path: PathBuf,
    pub provenance: Provenance,
}

// --- PARSED INPUT MODELS ---

/// A single parsed flag value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Single(String),
    Many(Vec<String>),
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Single(s) => Some(s),
            OptionValue::Many(values) if values.len() == 1 => values.first().map(String::as_str),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// The flags of one subcommand invocation after clap has parsed them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOptions {
    pub subcommand: String,
    pub values: BTreeMap<String, OptionValue>,
    /// Ids given explicitly on the command line (as opposed to defaults).
    pub supplied: BTreeSet<String>,
}

impl ParsedOptions {
    pub fn get(&self, id: &str) -> Option<&OptionValue> {
        self.values.get(id)
    }

    pub fn str(&self, id: &str) -> Option<&str> {
        self.values.get(id).and_then(OptionValue::as_str)
    }

    pub fn flag(&self, id: &str) -> bool {
        self.values
            .get(id)
            .and_then(OptionValue::as_bool)
            .unwrap_or(false)
    }

    pub fn list(&self, id: &str) -> Vec<String> {
        match self.values.get(id) {
            Some(OptionValue::Many(values)) => values.clone(),
            Some(OptionValue::Single(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    pub fn was_supplied(&self, id: &str) -> bool {
        self.supplied.contains(id)
    }
}

// --- RUN CONFIGURATION MODELS ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    pub max_threads: u32,
    pub max_cores: u32,
    pub max_memory_gb: u32,
    pub pplacer_threads: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CondaFrontend {
    Conda,
    #[default]
    Mamba,
}

impl CondaFrontend {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "conda" => Some(CondaFrontend::Conda),
            "mamba" => Some(CondaFrontend::Mamba),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CondaFrontend::Conda => "conda",
            CondaFrontend::Mamba => "mamba",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExecutionFlags {
    pub dry_run: bool,
    pub clean: bool,
    pub conda_frontend: CondaFrontend,
    pub build: bool,
    /// Free-form engine arguments, appended verbatim.
    pub passthrough: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadInputs {
    pub pe1: Vec<String>,
    pub pe2: Vec<String>,
    pub interleaved: Vec<String>,
    pub coupled: Vec<String>,
    pub longreads: Vec<String>,
    pub longread_type: Option<String>,
}

/// The fully merged configuration for one invocation. Written to the output
/// directory and handed to the dispatcher; never mutated afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub subcommand: String,
    pub workflow: String,
    pub output: PathBuf,
    pub limits: ResourceLimits,
    pub reads: ReadInputs,
    /// Per-subcommand parameters, passed through to the engine uninterpreted.
    pub params: BTreeMap<String, OptionValue>,
    pub paths: BTreeMap<ResourceKey, ResolvedPath>,
    pub execution: ExecutionFlags,
}

impl RunConfig {
    pub fn path(&self, key: ResourceKey) -> Option<&PathBuf> {
        self.paths.get(&key).map(|resolved| &resolved.path)
    }
}

// --- ENGINE MODELS ---

/// How to launch the external workflow engine (`engine.toml`).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub program: String,
    pub snakefile: PathBuf,
}
