//! The group registry: group name → [`Group`] of [`Setting`]s.

use std::borrow::Cow;

use indexmap::IndexMap;

use crate::error::SettngsError;
use crate::setting::Setting;

/// A named collection of settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    /// Keys without a matching setting survive normalization.
    pub persistent: bool,
    /// `setting_name` → setting, in registration order.
    pub v: IndexMap<String, Setting>,
}

impl Group {
    pub fn new(persistent: bool) -> Self {
        Self {
            persistent,
            v: IndexMap::new(),
        }
    }

    /// Find the setting owning canonical key `dest`.
    pub fn setting_for_dest(&self, dest: &str) -> Option<&Setting> {
        self.v.values().find(|s| s.dest == dest)
    }

    pub fn settings(&self) -> impl Iterator<Item = &Setting> {
        self.v.values()
    }
}

/// Ordered mapping from group name to [`Group`].
///
/// Lookups of unregistered names go through
/// [`get_or_ephemeral`](Self::get_or_ephemeral), which hands back an empty,
/// non-persistent group without registering it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definitions {
    groups: IndexMap<String, Group>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// The registered group, or a transient empty non-persistent one.
    pub fn get_or_ephemeral(&self, name: &str) -> Cow<'_, Group> {
        match self.groups.get(name) {
            Some(group) => Cow::Borrowed(group),
            None => Cow::Owned(Group::new(false)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Group)> {
        self.groups.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.groups.keys()
    }

    pub fn settings(&self) -> impl Iterator<Item = &Setting> {
        self.groups.values().flat_map(Group::settings)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Register `name` with the given persistence, or confirm an existing
    /// registration agrees with it.
    pub fn declare_group(&mut self, name: &str, persistent: bool) -> Result<(), SettngsError> {
        match self.groups.get(name) {
            Some(group) if group.persistent != persistent => {
                Err(SettngsError::PersistenceMismatch {
                    group: name.to_string(),
                    persistent: group.persistent,
                })
            }
            Some(_) => Ok(()),
            None => {
                self.groups.insert(name.to_string(), Group::new(persistent));
                Ok(())
            }
        }
    }

    /// Add `setting` to its group, creating a non-persistent group if needed.
    ///
    /// Fails if another setting anywhere in the registry already resolves to
    /// the same internal name.
    pub fn add_setting(&mut self, setting: Setting) -> Result<(), SettngsError> {
        if let Some(existing) = self
            .settings()
            .find(|s| s.internal_name == setting.internal_name)
        {
            return Err(SettngsError::DuplicateInternalName {
                name: setting.internal_name.clone(),
                existing: format!("{}.{}", existing.group, existing.setting_name),
                duplicate: format!("{}.{}", setting.group, setting.setting_name),
            });
        }
        self.groups
            .entry(setting.group.clone())
            .or_insert_with(|| Group::new(false))
            .v
            .insert(setting.setting_name.clone(), setting);
        Ok(())
    }

    /// Insert a persistent, settings-free group for `name` unless one is
    /// already registered. Used for groups that only appear in values.
    pub(crate) fn insert_unknown(&mut self, name: &str) {
        if !self.groups.contains_key(name) {
            self.groups.insert(name.to_string(), Group::new(true));
        }
    }
}

impl From<IndexMap<String, Group>> for Definitions {
    fn from(groups: IndexMap<String, Group>) -> Self {
        Self { groups }
    }
}
