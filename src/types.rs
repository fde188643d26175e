use indexmap::IndexMap;
use serde_json::Value;

use crate::definitions::Definitions;
use crate::error::SettngsError;

/// Values for one group: setting `dest` (or unknown key) → value.
pub type GroupValues = IndexMap<String, Value>;

/// Canonical values: group name → [`GroupValues`].
pub type Values = IndexMap<String, GroupValues>;

/// A values snapshot together with the registry it belongs to.
///
/// `T` is either canonical [`Values`] or a flat [`Namespace`](crate::Namespace).
#[derive(Debug, Clone, PartialEq)]
pub struct Config<T> {
    pub values: T,
    pub definitions: Definitions,
}

impl<T> Config<T> {
    pub fn new(values: T, definitions: Definitions) -> Self {
        Self {
            values,
            definitions,
        }
    }
}

impl<T> From<Config<T>> for Definitions {
    fn from(config: Config<T>) -> Self {
        config.definitions
    }
}

/// Which settings a view includes.
///
/// - `file` / `cmdline`: include settings eligible for the settings file
///   and/or the command line. At least one must be set.
/// - `default`: include settings that are still at their default value.
/// - `persistent`: carry keys without a matching setting in persistent
///   groups, and groups that are not registered at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    pub file: bool,
    pub cmdline: bool,
    pub default: bool,
    pub persistent: bool,
}

impl Scope {
    /// Settings stored in the settings file.
    pub fn file() -> Self {
        Self {
            file: true,
            cmdline: false,
            default: true,
            persistent: true,
        }
    }

    /// Settings available on the command line.
    pub fn cmdline() -> Self {
        Self {
            file: false,
            cmdline: true,
            default: true,
            persistent: true,
        }
    }

    /// Every setting.
    pub fn all() -> Self {
        Self {
            file: true,
            cmdline: true,
            default: true,
            persistent: true,
        }
    }

    pub fn with_defaults(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub(crate) fn check(&self) -> Result<(), SettngsError> {
        if !self.file && !self.cmdline {
            return Err(SettngsError::NoScope);
        }
        Ok(())
    }
}
