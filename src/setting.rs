//! Setting declarations.
//!
//! A [`Setting`] is built once, at registration time, from a
//! [`SettingBuilder`] and never changes afterwards. Most of its fields are
//! passed straight through to the command-line adapter; the merge engine only
//! looks at `dest`, `default`, `file`, `cmdline` and `internal_name`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SettngsError;

/// Characters that collapse into a single `_` in [`sanitize_name`].
const SEPARATORS: &str = " -_,.!@#$%^&*(){}[]',.\"<>;:";

/// Collapse every run of separator/punctuation characters into a single
/// underscore and trim underscores from both ends.
///
/// `"Example Group"` becomes `"Example_Group"`, `"--no-verbose"` becomes
/// `"no_verbose"`.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if SEPARATORS.contains(c) {
            if !in_run {
                out.push('_');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out.trim_matches('_').to_string()
}

/// Whether `name` can be used as a key in a flat namespace.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

/// What the command-line adapter does when it meets a setting's flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Store the value(s) following the flag.
    #[default]
    Store,
    /// Store `const_value` when the flag is present.
    StoreConst,
    StoreTrue,
    StoreFalse,
    /// Append each occurrence's value(s) to a list.
    Append,
    /// Append `const_value` once per occurrence.
    AppendConst,
    /// Extend a list with every value of every occurrence.
    Extend,
    /// Count the occurrences of the flag.
    Count,
    /// `--flag` stores `true`, the generated `--no-flag` stores `false`.
    BooleanOptional,
    /// Print help and exit.
    Help,
}

impl Action {
    /// Whether the action consumes values following the flag.
    pub fn takes_values(self) -> bool {
        matches!(self, Action::Store | Action::Append | Action::Extend)
    }
}

/// How many values a setting consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nargs {
    /// `?`: zero or one value.
    Optional,
    /// `*`: any number of values.
    ZeroOrMore,
    /// `+`: at least one value.
    OneOrMore,
    /// Exactly N values, always collected into a list.
    Exactly(usize),
}

impl Nargs {
    /// Whether the parsed result is a list rather than a single value.
    pub fn is_list(self) -> bool {
        !matches!(self, Nargs::Optional)
    }
}

/// Coercion applied to raw command-line strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
    Path,
    /// The raw string is parsed as a JSON document.
    Json,
}

impl ValueType {
    pub fn coerce(self, raw: &str) -> Result<Value, String> {
        match self {
            ValueType::String | ValueType::Path => Ok(Value::String(raw.to_string())),
            ValueType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("invalid integer value: '{raw}'")),
            ValueType::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("invalid float value: '{raw}'")),
            ValueType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
                "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
                _ => Err(format!("invalid boolean value: '{raw}'")),
            },
            ValueType::Json => {
                serde_json::from_str(raw).map_err(|e| format!("invalid JSON value '{raw}': {e}"))
            }
        }
    }
}

/// One declared configurable value.
///
/// Equality is structural. Fields are public for reading; build new settings
/// through [`Setting::builder`].
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    /// Flat namespace key, `{sanitized group}__{dest}`.
    pub internal_name: String,
    /// Key used to look the setting up in its [`Group`](crate::Group).
    pub setting_name: String,
    /// Key used in the canonical values mapping.
    pub dest: String,
    /// Whether any name token starts with `-`.
    pub flag: bool,
    /// Names handed to the command-line adapter. For positional settings the
    /// first name is replaced by `internal_name`.
    pub names: Vec<String>,
    pub action: Action,
    pub nargs: Option<Nargs>,
    pub const_value: Value,
    pub default: Value,
    pub value_type: Option<ValueType>,
    pub choices: Vec<Value>,
    pub required: Option<bool>,
    pub help: Option<String>,
    pub metavar: Option<String>,
    /// Human readable name for GUI hosts. Defaults to `dest`.
    pub display_name: String,
    pub cmdline: bool,
    pub file: bool,
    pub group: String,
    pub exclusive: bool,
}

impl Setting {
    pub fn builder<I, S>(names: I) -> SettingBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SettingBuilder::new(names)
    }

    /// Whether this setting takes part in a view requesting `file` and/or
    /// `cmdline` values.
    pub fn in_scope(&self, file: bool, cmdline: bool) -> bool {
        (self.cmdline && cmdline) || (self.file && file)
    }

    /// Whether the setting produces a list of values on the command line.
    pub fn is_list(&self) -> bool {
        self.nargs.is_some_and(Nargs::is_list)
    }

    /// `(internal_name, setting_name, dest, flag)` for a set of name tokens.
    fn derive_names(
        group: &str,
        names: &[String],
        dest: Option<&str>,
    ) -> Result<(String, String, String, bool), SettngsError> {
        let mut setting_name = None;
        let mut flag = false;

        for name in names {
            if name.starts_with("--") {
                flag = true;
                setting_name = Some(sanitize_name(name));
                break;
            }
            if name.starts_with('-') {
                flag = true;
            }
        }

        let first = names.first().ok_or(SettngsError::MissingNames)?;
        let setting_name = setting_name.unwrap_or_else(|| first.clone());
        let dest = dest.map_or_else(|| setting_name.clone(), str::to_string);
        if !is_identifier(&dest) {
            return Err(SettngsError::InvalidDest { dest });
        }

        let internal_name = format!("{}__{dest}", sanitize_name(group))
            .trim_start_matches('_')
            .to_string();
        Ok((internal_name, setting_name, dest, flag))
    }
}

/// Builder for [`Setting`]. Group and exclusivity are filled in by the
/// [`Manager`](crate::Manager) when the setting is registered.
#[derive(Debug, Clone)]
pub struct SettingBuilder {
    names: Vec<String>,
    action: Action,
    nargs: Option<Nargs>,
    const_value: Value,
    default: Value,
    value_type: Option<ValueType>,
    choices: Vec<Value>,
    required: Option<bool>,
    help: Option<String>,
    metavar: Option<String>,
    dest: Option<String>,
    display_name: Option<String>,
    cmdline: bool,
    file: bool,
}

impl SettingBuilder {
    fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            action: Action::default(),
            nargs: None,
            const_value: Value::Null,
            default: Value::Null,
            value_type: None,
            choices: Vec::new(),
            required: None,
            help: None,
            metavar: None,
            dest: None,
            display_name: None,
            cmdline: true,
            file: true,
        }
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    pub fn nargs(mut self, nargs: Nargs) -> Self {
        self.nargs = Some(nargs);
        self
    }

    pub fn const_value<V: Into<Value>>(mut self, value: V) -> Self {
        self.const_value = value.into();
        self
    }

    pub fn default<V: Into<Value>>(mut self, value: V) -> Self {
        self.default = value.into();
        self
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Placeholder shown in help output. Defaults to the upper-cased `dest`
    /// for actions that take values.
    pub fn metavar(mut self, metavar: &str) -> Self {
        self.metavar = Some(metavar.to_string());
        self
    }

    /// Override the key used in the canonical values mapping.
    pub fn dest(mut self, dest: &str) -> Self {
        self.dest = Some(dest.to_string());
        self
    }

    pub fn display_name(mut self, name: &str) -> Self {
        self.display_name = Some(name.to_string());
        self
    }

    /// Whether the setting can be set on the command line (default: `true`).
    pub fn cmdline(mut self, cmdline: bool) -> Self {
        self.cmdline = cmdline;
        self
    }

    /// Whether the setting is stored in the settings file (default: `true`).
    pub fn file(mut self, file: bool) -> Self {
        self.file = file;
        self
    }

    /// Resolve names and produce the immutable [`Setting`].
    pub fn build(self, group: &str, exclusive: bool) -> Result<Setting, SettngsError> {
        let (internal_name, setting_name, dest, flag) =
            Setting::derive_names(group, &self.names, self.dest.as_deref())?;

        let mut names = self.names;
        if !flag {
            names[0] = internal_name.clone();
        }

        let metavar = match self.metavar {
            Some(m) => Some(m),
            None if self.action.takes_values() => Some(dest.to_uppercase()),
            None => None,
        };

        let default = match (self.action, self.default) {
            (Action::StoreTrue, Value::Null) => Value::Bool(false),
            (Action::StoreFalse, Value::Null) => Value::Bool(true),
            (_, default) => default,
        };

        Ok(Setting {
            display_name: self.display_name.unwrap_or_else(|| dest.clone()),
            internal_name,
            setting_name,
            dest,
            flag,
            names,
            action: self.action,
            nargs: self.nargs,
            const_value: self.const_value,
            default,
            value_type: self.value_type,
            choices: self.choices,
            required: self.required,
            help: self.help,
            metavar,
            cmdline: self.cmdline,
            file: self.file,
            group: group.to_string(),
            exclusive,
        })
    }
}
