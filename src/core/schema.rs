// src/core/schema.rs

use crate::core::registry;
use crate::core::resolver::{ResolveMode, Resolver};
use crate::models::{Arity, DefaultValue, Flag, OptionValue, ParsedOptions, SubcommandDef};
use clap::builder::PossibleValuesParser;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

/// Errors raised while composing a subcommand or checking its input.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Option group '{0}' is not registered.")]
    UnknownGroup(String),
    #[error(
        "Subcommand '{subcommand}': flag '{flag}' from group '{second_group}' is already defined by group '{first_group}'."
    )]
    SchemaConflict {
        subcommand: String,
        flag: String,
        first_group: String,
        second_group: String,
    },
    #[error("Arguments {first} and {second} are mutually exclusive; supply only one of them.")]
    ConflictingInput { first: String, second: String },
}

/// One flag as it appears in a composed schema.
#[derive(Debug, Clone)]
pub struct SchemaFlag {
    pub flag: &'static Flag,
    /// The group that introduced the flag, or the subcommand name for its own flags.
    pub origin: &'static str,
    /// Default shown in help. For resource flags this is looked up without prompting.
    pub display_default: Option<String>,
}

impl SchemaFlag {
    pub fn id(&self) -> &'static str {
        self.flag.id
    }
}

/// The complete flag surface of one subcommand.
#[derive(Debug, Clone)]
pub struct SubcommandSchema {
    pub name: &'static str,
    pub about: &'static str,
    pub epilog: &'static str,
    pub groups: Vec<&'static str>,
    pub flags: Vec<SchemaFlag>,
    pub exclusive: Vec<&'static [&'static str]>,
}

impl SubcommandSchema {
    pub fn flag(&self, id: &str) -> Option<&SchemaFlag> {
        self.flags.iter().find(|f| f.flag.id == id)
    }

    /// The workflow target run when `--workflow` is not given.
    pub fn default_workflow(&self) -> Option<&'static str> {
        match self.flag("workflow").map(|f| f.flag.default) {
            Some(DefaultValue::Value(v)) => Some(v),
            _ => None,
        }
    }
}

fn declared_exclusive(sets: &[&'static [&'static str]], id: &str) -> bool {
    sets.iter().any(|set| set.contains(&id))
}

/// Composes `groups` (in order) and `extra` into the schema for `name`.
///
/// A later group may not reintroduce a flag id or option string an earlier one
/// already defined, unless both groups list that id in one of their mutually
/// exclusive sets; in that case the first definition is kept.
pub fn build(
    name: &'static str,
    about: &'static str,
    epilog: &'static str,
    groups: &[&'static str],
    extra: &'static [Flag],
    resolver: &Resolver,
) -> Result<SubcommandSchema, SchemaError> {
    let mut flags: Vec<SchemaFlag> = Vec::new();
    let mut exclusive: Vec<&'static [&'static str]> = Vec::new();
    // id -> (origin, that origin's exclusive sets)
    let mut seen_ids: HashMap<&'static str, (&'static str, &'static [&'static [&'static str]])> =
        HashMap::new();
    let mut seen_strings: HashMap<String, &'static str> = HashMap::new();

    let mut sources: Vec<(&'static str, &'static [Flag], &'static [&'static [&'static str]])> =
        Vec::with_capacity(groups.len() + 1);
    for group_name in groups {
        let group = registry::group(group_name)?;
        sources.push((group.name, group.flags, group.exclusive));
    }
    sources.push((name, extra, &[]));

    for (origin, group_flags, group_exclusive) in sources {
        exclusive.extend(group_exclusive.iter().copied());

        for flag in group_flags {
            if let Some((first_origin, first_exclusive)) = seen_ids.get(flag.id) {
                if declared_exclusive(first_exclusive, flag.id)
                    && declared_exclusive(group_exclusive, flag.id)
                {
                    log::debug!(
                        "'{}' redefined by '{}' as an exclusive alternative; keeping '{}'.",
                        flag.id,
                        origin,
                        first_origin
                    );
                    continue;
                }
                return Err(SchemaError::SchemaConflict {
                    subcommand: name.to_string(),
                    flag: flag.display_name(),
                    first_group: (*first_origin).to_string(),
                    second_group: origin.to_string(),
                });
            }

            for option in flag.option_strings() {
                if let Some(first_origin) = seen_strings.get(&option) {
                    return Err(SchemaError::SchemaConflict {
                        subcommand: name.to_string(),
                        flag: option,
                        first_group: (*first_origin).to_string(),
                        second_group: origin.to_string(),
                    });
                }
                seen_strings.insert(option, origin);
            }
            seen_ids.insert(flag.id, (origin, group_exclusive));

            flags.push(SchemaFlag {
                flag,
                origin,
                display_default: display_default(flag, resolver),
            });
        }
    }

    Ok(SubcommandSchema {
        name,
        about,
        epilog,
        groups: groups.to_vec(),
        flags,
        exclusive,
    })
}

/// Builds the schema for a registered subcommand.
pub fn build_subcommand(
    def: &'static SubcommandDef,
    resolver: &Resolver,
) -> Result<SubcommandSchema, SchemaError> {
    build(def.name, def.about, def.epilog, def.groups, def.extra, resolver)
}

/// Builds every registered subcommand, failing on the first conflict.
pub fn validate_all(resolver: &Resolver) -> Result<Vec<SubcommandSchema>, SchemaError> {
    registry::subcommands()
        .iter()
        .map(|def| build_subcommand(def, resolver))
        .collect()
}

fn display_default(flag: &Flag, resolver: &Resolver) -> Option<String> {
    match flag.default {
        DefaultValue::Absent => None,
        DefaultValue::Value(v) => Some(v.to_string()),
        DefaultValue::Resource { key, required } => {
            match resolver.resolve(key, required, ResolveMode::HelpOnly) {
                Ok(resolved) => resolved.map(|r| r.path.display().to_string()),
                Err(e) => {
                    log::warn!("Could not look up the default for {}: {}", flag.display_name(), e);
                    None
                }
            }
        }
    }
}

/// Help text for one flag. The text is kept verbatim; a ` (default: X)`
/// suffix goes on its first line unless the flag is hidden or the default is
/// absent, empty or `false`.
pub fn render_help(flag: &Flag, display_default: Option<&str>) -> String {
    let suffix = match display_default {
        Some(value) if !flag.hidden && !value.is_empty() && value != "false" => {
            format!(" (default: {})", value)
        }
        _ => return flag.help.to_string(),
    };
    match flag.help.split_once('\n') {
        Some((first, rest)) => format!("{}{}\n{}", first, suffix, rest),
        None => format!("{}{}", flag.help, suffix),
    }
}

/// Accepts the same boolean spellings as the pipeline's historic CLI.
pub fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "true" | "t" | "y" | "1" => Ok(true),
        "no" | "false" | "f" | "n" | "0" => Ok(false),
        _ => Err(format!("Boolean value expected, got '{}'.", value)),
    }
}

fn value_name(flag: &Flag) -> String {
    flag.id.to_ascii_uppercase()
}

fn to_arg(entry: &SchemaFlag) -> Arg {
    let flag = entry.flag;
    let mut arg = Arg::new(flag.id)
        .long(flag.long)
        .help(render_help(flag, entry.display_default.as_deref()))
        .hide(flag.hidden)
        .hide_default_value(true)
        .required(flag.required);

    if let Some(short) = flag.short {
        arg = arg.short(short);
    }
    if !flag.aliases.is_empty() {
        arg = arg.aliases(flag.aliases.iter().copied());
    }

    arg = match flag.arity {
        Arity::Scalar => arg.action(ArgAction::Set).num_args(1).value_name(value_name(flag)),
        Arity::Fixed(n) => arg
            .action(ArgAction::Set)
            .num_args(n)
            .value_name(value_name(flag)),
        Arity::List => arg
            .action(ArgAction::Append)
            .num_args(0..)
            .value_name(value_name(flag)),
        Arity::Toggle => arg
            .action(ArgAction::Set)
            .num_args(0..=1)
            .default_missing_value("true")
            .value_name("BOOL")
            .value_parser(parse_bool),
    };

    if !flag.choices.is_empty() {
        arg = arg
            .value_parser(PossibleValuesParser::new(flag.choices.iter().copied()))
            .value_name(format!("{{{}}}", flag.choices.join(",")))
            .hide_possible_values(true);
    }

    match (flag.arity, flag.default) {
        // List defaults are display-only; an absent list means "none given".
        (Arity::List, _) => arg,
        (_, DefaultValue::Value(v)) => arg.default_value(v),
        (Arity::Toggle, _) => arg.default_value("false"),
        _ => arg,
    }
}

/// Lowers a schema into a clap command that parses the subcommand's own
/// arguments (the subcommand name itself is not expected in `argv`).
pub fn to_command(schema: &SubcommandSchema) -> Command {
    let mut command = Command::new(schema.name)
        .about(schema.about)
        .after_help(schema.epilog)
        .no_binary_name(true)
        .bin_name(format!("aviary {}", schema.name))
        .disable_version_flag(true);
    for entry in &schema.flags {
        command = command.arg(to_arg(entry));
    }
    command
}

/// Collects values from clap matches and enforces the exclusive sets.
pub fn extract(schema: &SubcommandSchema, matches: &ArgMatches) -> Result<ParsedOptions, SchemaError> {
    let mut values = BTreeMap::new();
    let mut supplied = BTreeSet::new();

    for entry in &schema.flags {
        let flag = entry.flag;
        if matches.value_source(flag.id) == Some(ValueSource::CommandLine) {
            supplied.insert(flag.id.to_string());
        }

        let value = match flag.arity {
            Arity::Toggle => matches
                .get_one::<bool>(flag.id)
                .map(|b| OptionValue::Bool(*b)),
            Arity::List => matches
                .get_many::<String>(flag.id)
                .map(|vals| OptionValue::Many(vals.cloned().collect())),
            Arity::Fixed(n) if n > 1 => matches
                .get_many::<String>(flag.id)
                .map(|vals| OptionValue::Many(vals.cloned().collect())),
            Arity::Scalar | Arity::Fixed(_) => matches
                .get_one::<String>(flag.id)
                .map(|s| OptionValue::Single(s.clone())),
        };
        if let Some(value) = value {
            values.insert(flag.id.to_string(), value);
        }
    }

    for set in &schema.exclusive {
        let given: Vec<&SchemaFlag> = schema
            .flags
            .iter()
            .filter(|f| set.contains(&f.flag.id) && supplied.contains(f.flag.id))
            .collect();
        if let [first, second, ..] = given.as_slice() {
            return Err(SchemaError::ConflictingInput {
                first: first.flag.display_name(),
                second: second.flag.display_name(),
            });
        }
    }

    Ok(ParsedOptions {
        subcommand: schema.name.to_string(),
        values,
        supplied,
    })
}
