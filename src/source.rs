//! Uniform read access over both value representations.
//!
//! Canonical [`Values`] and the flat [`Namespace`] both implement
//! [`OptionSource`], so the merge engine and the view converters pick the
//! representation once at their entry point and then only ask "what is this
//! setting's value" and "what keys does this group hold".

use serde_json::Value;

use crate::definitions::{Definitions, Group};
use crate::error::SettngsError;
use crate::namespace::Namespace;
use crate::setting::{Setting, sanitize_name};
use crate::types::{GroupValues, Scope, Values};

pub trait OptionSource {
    /// The stored value for `setting`, if any.
    fn value_of(&self, setting: &Setting) -> Option<&Value>;

    /// Every key held for `group_name`, keyed by `dest` (or by the raw key for
    /// values without a setting).
    fn group_options(&self, group_name: &str, group: &Group) -> GroupValues;

    /// Names of the groups present in this source.
    fn group_names(&self) -> Vec<String>;

    /// The canonical form of this source under `definitions`.
    fn to_values(&self, definitions: &Definitions, scope: Scope) -> Result<Values, SettngsError>;
}

impl OptionSource for Values {
    fn value_of(&self, setting: &Setting) -> Option<&Value> {
        self.get(&setting.group)?.get(&setting.dest)
    }

    fn group_options(&self, group_name: &str, _group: &Group) -> GroupValues {
        self.get(group_name).cloned().unwrap_or_default()
    }

    fn group_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }

    /// Canonical values are used as they are.
    fn to_values(&self, _definitions: &Definitions, _scope: Scope) -> Result<Values, SettngsError> {
        Ok(self.clone())
    }
}

impl OptionSource for Namespace {
    fn value_of(&self, setting: &Setting) -> Option<&Value> {
        self.get(&setting.internal_name)
    }

    fn group_options(&self, group_name: &str, group: &Group) -> GroupValues {
        let prefix = group_prefix(group_name);
        let mut values = GroupValues::new();
        for (name, value) in self.iter() {
            if let Some(setting) = group.settings().find(|s| &s.internal_name == name) {
                values.insert(setting.dest.clone(), value.clone());
                continue;
            }
            let key = match &prefix {
                Some(prefix) => name.strip_prefix(prefix.as_str()),
                None if !name.contains("__") => Some(name.as_str()),
                None => None,
            };
            if let Some(key) = key {
                values.insert(key.to_string(), value.clone());
            }
        }
        values
    }

    fn group_names(&self) -> Vec<String> {
        let mut groups: Vec<String> = Vec::new();
        for name in self.keys() {
            let group = match name.split_once("__") {
                Some((group, _)) => group.replace('_', " "),
                None => String::new(),
            };
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
        groups
    }

    /// A namespace is normalized first so the same suppression rules apply
    /// whichever representation a view starts from.
    fn to_values(&self, definitions: &Definitions, scope: Scope) -> Result<Values, SettngsError> {
        let config = crate::Config::new(self.clone(), definitions.clone());
        Ok(crate::normalize::normalize_config(&config, scope)?.values)
    }
}

/// Namespace key prefix for keys of `group_name`. `None` for the empty group,
/// whose keys carry no prefix.
pub(crate) fn group_prefix(group_name: &str) -> Option<String> {
    let group = sanitize_name(group_name);
    if group.is_empty() {
        None
    } else {
        Some(format!("{group}__"))
    }
}

/// The current value of `setting` in `source` (falling back to its default)
/// and whether that value equals the default.
pub fn get_option<S: OptionSource + ?Sized>(source: &S, setting: &Setting) -> (Value, bool) {
    let value = source
        .value_of(setting)
        .cloned()
        .unwrap_or_else(|| setting.default.clone());
    let is_default = value == setting.default;
    (value, is_default)
}

/// Every value held for `group_name`, including keys without a setting.
/// Only meaningful for persistent groups.
pub fn get_options<S: OptionSource + ?Sized>(
    source: &S,
    definitions: &Definitions,
    group_name: &str,
) -> GroupValues {
    source.group_options(group_name, &definitions.get_or_ephemeral(group_name))
}

/// Group names present in `source`.
pub fn get_groups<S: OptionSource + ?Sized>(source: &S) -> Vec<String> {
    source.group_names()
}
