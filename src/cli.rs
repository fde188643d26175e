//! Clap adapter for settngs.
//!
//! This module is the **optional integration layer** between the
//! framework-agnostic core and the [clap](https://docs.rs/clap) CLI parser.
//! It is compiled only when the `clap` Cargo feature is enabled (on by
//! default).
//!
//! Nothing here is declared with clap's derive API: the [`Command`] is built
//! at runtime from every setting with `cmdline = true`. Each setting becomes
//! one [`Arg`] whose id is the setting's `internal_name`, so parsed values
//! line up with the flat [`Namespace`] without any renaming.
//!
//! - Settings are shown under a help heading named after their group.
//! - Positional `*` settings of groups matching the top-level predicate
//!   (by default, groups whose name contains "runtime") stay at the top
//!   level so they render first.
//! - Exclusive settings of a group form an [`ArgGroup`] that allows at most
//!   one of them.
//!
//! [`parse_cmdline`] seeds a namespace (from nothing, a namespace, or a
//! loaded [`Config`]), applies only what was actually given on the command
//! line, then normalizes the result.

use std::ffi::OsString;
use std::path::Path;

use clap::builder::ValueRange;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command};
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde_json::Value;

use crate::definitions::Definitions;
use crate::error::SettngsError;
use crate::file::parse_file;
use crate::namespace::{Namespace, get_namespace};
use crate::normalize::normalize_config;
use crate::setting::{Action, Nargs, Setting, sanitize_name};
use crate::types::{Config, Scope, Values};

/// Default top-level predicate: the group name contains "runtime", ignoring
/// case.
pub fn is_runtime_group(group: &str) -> bool {
    group.to_lowercase().contains("runtime")
}

/// Starting point for [`parse_cmdline`].
#[derive(Debug, Clone, Default)]
pub enum Seed {
    /// Start from the setting defaults.
    #[default]
    Empty,
    /// Start from a flat namespace, used as is.
    Namespace(Namespace),
    /// Start from canonical values, typically a loaded settings file.
    Values(Config<Values>),
}

impl Seed {
    fn into_namespace(self) -> Result<Namespace, SettngsError> {
        match self {
            Seed::Empty => Ok(Namespace::new()),
            Seed::Namespace(ns) => Ok(ns),
            Seed::Values(config) => {
                Ok(get_namespace(&config, Scope::all().with_defaults(false))?.values)
            }
        }
    }
}

impl From<Namespace> for Seed {
    fn from(ns: Namespace) -> Self {
        Seed::Namespace(ns)
    }
}

impl From<Config<Namespace>> for Seed {
    fn from(config: Config<Namespace>) -> Self {
        Seed::Namespace(config.values)
    }
}

impl From<Config<Values>> for Seed {
    fn from(config: Config<Values>) -> Self {
        Seed::Values(config)
    }
}

/// Long and short flag names of a setting, in declaration order.
struct FlagNames {
    long: Vec<String>,
    short: Vec<char>,
}

fn flag_names(setting: &Setting) -> Result<FlagNames, SettngsError> {
    let mut names = FlagNames {
        long: Vec::new(),
        short: Vec::new(),
    };
    if !setting.flag {
        return Ok(names);
    }
    for name in &setting.names {
        if let Some(long) = name.strip_prefix("--") {
            names.long.push(long.to_string());
        } else if let Some(short) = name.strip_prefix('-') {
            let mut chars = short.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => names.short.push(c),
                _ => return Err(SettngsError::InvalidFlag { name: name.clone() }),
            }
        }
    }
    Ok(names)
}

/// Id of the generated `--no-x` argument of a boolean-optional setting.
/// `None` when the setting has no long flag to negate.
fn negation_id(setting: &Setting) -> Option<String> {
    let has_long = setting.names.iter().any(|n| n.starts_with("--"));
    (setting.action == Action::BooleanOptional && has_long)
        .then(|| format!("no-{}", setting.internal_name))
}

fn num_args(nargs: Option<Nargs>) -> ValueRange {
    match nargs {
        None => ValueRange::new(1),
        Some(Nargs::Optional) => ValueRange::new(0..=1),
        Some(Nargs::ZeroOrMore) => ValueRange::new(0..),
        Some(Nargs::OneOrMore) => ValueRange::new(1..),
        Some(Nargs::Exactly(n)) => ValueRange::new(n),
    }
}

/// Coerce a raw string with the setting's value type, then check choices.
fn value_parser(
    setting: &Setting,
) -> impl Fn(&str) -> Result<Value, String> + Clone + Send + Sync + 'static {
    let value_type = setting.value_type.unwrap_or_default();
    let choices = setting.choices.clone();
    move |raw: &str| {
        let value = value_type.coerce(raw)?;
        if choices.is_empty() || choices.contains(&value) {
            return Ok(value);
        }
        let allowed: Vec<String> = choices.iter().map(Value::to_string).collect();
        Err(format!(
            "invalid choice: '{raw}' (choose from {})",
            allowed.join(", ")
        ))
    }
}

fn is_required(setting: &Setting) -> bool {
    match setting.required {
        Some(required) => required,
        None if setting.flag => false,
        None => !matches!(setting.nargs, Some(Nargs::Optional | Nargs::ZeroOrMore)),
    }
}

/// The clap arguments for one setting: the setting itself, plus `--no-x`
/// for boolean-optional settings.
fn setting_args(setting: &Setting, heading: Option<&str>) -> Result<Vec<Arg>, SettngsError> {
    let names = flag_names(setting)?;
    let mut arg = Arg::new(setting.internal_name.clone());

    let mut long = names.long.iter();
    if let Some(first) = long.next() {
        arg = arg.long(first.clone());
    }
    for alias in long {
        arg = arg.visible_alias(alias.clone());
    }
    let mut short = names.short.iter();
    if let Some(first) = short.next() {
        arg = arg.short(*first);
    }
    for alias in short {
        arg = arg.visible_short_alias(*alias);
    }

    arg = match setting.action {
        Action::Store => arg.action(ArgAction::Set),
        Action::Append | Action::Extend => arg.action(ArgAction::Append),
        Action::StoreConst | Action::StoreTrue | Action::StoreFalse | Action::BooleanOptional => {
            arg.action(ArgAction::SetTrue)
        }
        Action::AppendConst | Action::Count => arg.action(ArgAction::Count),
        Action::Help => arg.action(ArgAction::Help),
    };
    if setting.action.takes_values() {
        arg = arg
            .num_args(num_args(setting.nargs))
            .value_parser(value_parser(setting));
        if let Some(metavar) = &setting.metavar {
            arg = arg.value_name(metavar.clone());
        }
    }

    let mut help = setting.help.clone();
    if setting.action == Action::BooleanOptional
        && !setting.default.is_null()
        && let Some(text) = &mut help
    {
        text.push_str(&format!(" (default: {})", setting.default));
    }
    if let Some(help) = help {
        arg = arg.help(help);
    }
    arg = arg.required(is_required(setting));
    if let Some(heading) = heading {
        arg = arg.help_heading(heading.to_string());
    }

    let Some(negation) = negation_id(setting) else {
        return Ok(vec![arg]);
    };

    let mut negated = Arg::new(negation.clone())
        .action(ArgAction::SetTrue)
        .overrides_with(setting.internal_name.clone());
    let mut long = names.long.iter();
    if let Some(first) = long.next() {
        negated = negated.long(format!("no-{first}"));
    }
    for alias in long {
        negated = negated.visible_alias(format!("no-{alias}"));
    }
    if let Some(heading) = heading {
        negated = negated.help_heading(heading.to_string());
    }
    arg = arg.overrides_with(negation);
    Ok(vec![arg, negated])
}

/// Record every flag `arg` answers to, failing on one already taken.
fn claim_flags(claimed: &mut IndexMap<String, String>, arg: &Arg) -> Result<(), SettngsError> {
    let owner = arg.get_id().to_string();
    let longs = arg
        .get_long()
        .into_iter()
        .chain(arg.get_all_aliases().unwrap_or_default())
        .map(|long| format!("--{long}"));
    let shorts = arg
        .get_short()
        .into_iter()
        .chain(arg.get_all_short_aliases().unwrap_or_default())
        .map(|short| format!("-{short}"));

    for name in longs.chain(shorts) {
        match claimed.entry(name) {
            Entry::Occupied(existing) => {
                return Err(SettngsError::DuplicateFlag {
                    name: existing.key().clone(),
                    existing: existing.get().clone(),
                    duplicate: owner,
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(owner.clone());
            }
        }
    }
    Ok(())
}

/// Build the clap [`Command`] for every command-line setting.
///
/// `top_level_positional` decides, per group name, whether positional `*`
/// settings of that group are kept out of the group's help heading.
pub fn create_command(
    definitions: &Definitions,
    prog: &str,
    description: &str,
    epilog: &str,
    top_level_positional: fn(&str) -> bool,
) -> Result<Command, SettngsError> {
    let mut command = Command::new(prog.to_string()).args_override_self(true);
    if !description.is_empty() {
        command = command.about(description.to_string());
    }
    if !epilog.is_empty() {
        command = command.after_help(epilog.to_string());
    }
    let mut claimed: IndexMap<String, String> = IndexMap::new();
    if definitions
        .settings()
        .any(|s| s.cmdline && s.action == Action::Help)
    {
        command = command.disable_help_flag(true);
    } else {
        claimed.insert("--help".to_string(), "help".to_string());
        claimed.insert("-h".to_string(), "help".to_string());
    }

    let mut exclusive: IndexMap<String, Vec<String>> = IndexMap::new();
    for setting in definitions.settings().filter(|s| s.cmdline) {
        let top_level = !setting.flag
            && setting.nargs == Some(Nargs::ZeroOrMore)
            && top_level_positional(&setting.group);
        let heading = (!setting.group.is_empty() && !top_level).then_some(setting.group.as_str());

        let args = setting_args(setting, heading)?;
        for arg in &args {
            claim_flags(&mut claimed, arg)?;
        }
        if setting.exclusive {
            exclusive
                .entry(setting.group.clone())
                .or_default()
                .extend(args.iter().map(|a| a.get_id().to_string()));
        }
        command = command.args(args);
    }

    for (group, ids) in exclusive {
        command = command.group(
            ArgGroup::new(format!("{}-exclusive", sanitize_name(&group)))
                .args(ids)
                .multiple(false),
        );
    }

    Ok(command)
}

fn given(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// The namespace value as a list to build on; a scalar becomes its only item.
fn existing_list(namespace: &Namespace, name: &str) -> Vec<Value> {
    match namespace.get(name) {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other.clone()],
    }
}

/// Write what the command line said about `setting` into `namespace`.
fn apply_matches(namespace: &mut Namespace, setting: &Setting, matches: &ArgMatches) {
    let id = setting.internal_name.as_str();

    if setting.action == Action::BooleanOptional {
        if given(matches, id) {
            namespace.set(id, Value::Bool(true));
        } else if negation_id(setting).is_some_and(|neg| given(matches, &neg)) {
            namespace.set(id, Value::Bool(false));
        }
        return;
    }
    if !given(matches, id) {
        return;
    }

    let value = match setting.action {
        Action::Store if setting.is_list() => Value::Array(
            matches
                .get_many::<Value>(id)
                .into_iter()
                .flatten()
                .cloned()
                .collect(),
        ),
        Action::Store => matches
            .get_one::<Value>(id)
            .cloned()
            .unwrap_or_else(|| setting.const_value.clone()),
        Action::StoreConst => setting.const_value.clone(),
        Action::StoreTrue => Value::Bool(true),
        Action::StoreFalse => Value::Bool(false),
        Action::Append => {
            let mut items = existing_list(namespace, id);
            for occurrence in matches.get_occurrences::<Value>(id).into_iter().flatten() {
                let values: Vec<Value> = occurrence.cloned().collect();
                if setting.is_list() {
                    items.push(Value::Array(values));
                } else if values.is_empty() {
                    items.push(setting.const_value.clone());
                } else {
                    items.extend(values);
                }
            }
            Value::Array(items)
        }
        Action::Extend => {
            let mut items = existing_list(namespace, id);
            items.extend(matches.get_many::<Value>(id).into_iter().flatten().cloned());
            Value::Array(items)
        }
        Action::AppendConst => {
            let mut items = existing_list(namespace, id);
            let count = usize::from(matches.get_count(id));
            items.extend(std::iter::repeat_n(setting.const_value.clone(), count));
            Value::Array(items)
        }
        Action::Count => {
            let base = namespace.get(id).and_then(Value::as_i64).unwrap_or(0);
            Value::from(base + i64::from(matches.get_count(id)))
        }
        Action::BooleanOptional | Action::Help => return,
    };
    namespace.set(id, value);
}

/// Parse `args` (without the program name) into canonical values.
///
/// Values not given on the command line keep what `seed` holds, falling back
/// to setting defaults. Parse failures, including help requests, are
/// returned as [`SettngsError::Cmdline`]; see
/// [`Manager::exit`](crate::Manager::exit).
pub fn parse_cmdline<I, S>(
    definitions: &Definitions,
    command: Command,
    args: I,
    seed: impl Into<Seed>,
) -> Result<Config<Values>, SettngsError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut namespace = seed.into().into_namespace()?;
    for setting in definitions.settings().filter(|s| s.cmdline) {
        if !namespace.contains(&setting.internal_name) {
            namespace.set(&setting.internal_name, setting.default.clone());
        }
    }

    let argv = std::iter::once(OsString::from(command.get_name().to_string()))
        .chain(args.into_iter().map(Into::into));
    let matches = command.try_get_matches_from(argv)?;

    for setting in definitions.settings().filter(|s| s.cmdline) {
        apply_matches(&mut namespace, setting, &matches);
    }

    normalize_config(
        &Config::new(namespace, definitions.clone()),
        Scope::all(),
    )
}

/// Load the settings file, then let the command line override it.
///
/// The boolean is the file load's success flag.
pub fn parse_config<I, S>(
    definitions: &Definitions,
    command: Command,
    path: &Path,
    args: I,
) -> Result<(Config<Values>, bool), SettngsError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let (file_config, success) = parse_file(definitions, path);
    let config = parse_cmdline(definitions, command, args, file_config)?;
    Ok((normalize_config(&config, Scope::all())?, success))
}
