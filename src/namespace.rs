//! The flat namespace view.
//!
//! A [`Namespace`] is a single-level mapping keyed by `internal_name`
//! (`{sanitized group}__{dest}`). It is what the command-line adapter reads
//! and writes, and a convenient attribute surface for hosts that do not want
//! to index two levels deep.

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SettngsError;
use crate::setting::sanitize_name;
use crate::source::{OptionSource, get_option};
use crate::types::{Config, Scope};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(IndexMap<String, Value>);

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.0.insert(name.to_string(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<IndexMap<String, Value>> for Namespace {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Namespace {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Namespace under construction. Remembers which `group.key` wrote each name
/// so two different owners of one name fail immediately.
struct NamespaceWriter {
    namespace: Namespace,
    owners: IndexMap<String, String>,
}

impl NamespaceWriter {
    fn new() -> Self {
        Self {
            namespace: Namespace::new(),
            owners: IndexMap::new(),
        }
    }

    fn write(&mut self, name: String, owner: String, value: Value) -> Result<(), SettngsError> {
        match self.owners.entry(name.clone()) {
            Entry::Occupied(existing) if *existing.get() != owner => {
                return Err(SettngsError::DuplicateInternalName {
                    name,
                    existing: existing.get().clone(),
                    duplicate: owner,
                });
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(slot) => {
                slot.insert(owner);
            }
        }
        self.namespace.0.insert(name, value);
        Ok(())
    }
}

/// Synthesized namespace key for an unknown key of a persistent group.
fn unknown_key_name(group_name: &str, key: &str) -> String {
    format!("{}__{}", sanitize_name(group_name), sanitize_name(key))
        .trim_start_matches('_')
        .to_string()
}

/// Expand `config` into a flat namespace.
///
/// Canonical values are expanded as they are; a namespace is normalized
/// first. For persistent groups (when `scope.persistent` is set) every key is
/// written, unknown keys under a synthesized `{group}__{key}` name. Registered
/// settings in scope are written under their `internal_name` unless they are
/// at their default and `scope.default` is off.
pub fn get_namespace<T: OptionSource>(
    config: &Config<T>,
    scope: Scope,
) -> Result<Config<Namespace>, SettngsError> {
    scope.check()?;

    let options = config.values.to_values(&config.definitions, scope)?;
    let definitions =
        crate::normalize::internal_definitions(&config.definitions, &options, scope.persistent);

    let mut writer = NamespaceWriter::new();
    for (group_name, group) in definitions.iter() {
        if group.persistent && scope.persistent {
            for (key, value) in options.group_options(group_name, group) {
                let owner = format!("{group_name}.{key}");
                match group.setting_for_dest(&key) {
                    Some(setting) => {
                        let (value, is_default) = get_option(&options, setting);
                        if setting.in_scope(scope.file, scope.cmdline)
                            && (!is_default || scope.default)
                        {
                            writer.write(setting.internal_name.clone(), owner, value)?;
                        }
                    }
                    None => {
                        let name = unknown_key_name(group_name, &key);
                        if group.settings().any(|s| s.internal_name == name) {
                            tracing::warn!(
                                group = %group_name,
                                key = %key,
                                name = %name,
                                "Skipping unknown key that collides with a setting"
                            );
                            continue;
                        }
                        writer.write(name, owner, value)?;
                    }
                }
            }
        }

        for setting in group.settings() {
            if !setting.in_scope(scope.file, scope.cmdline) {
                continue;
            }
            let (value, is_default) = get_option(&options, setting);
            if !is_default || scope.default {
                let owner = format!("{group_name}.{}", setting.dest);
                writer.write(setting.internal_name.clone(), owner, value)?;
            }
        }
    }

    Ok(Config::new(writer.namespace, config.definitions.clone()))
}
