//! The merge/normalize engine.
//!
//! [`normalize_config`] reconciles each setting's declared default with the
//! value found in a values source (canonical [`Values`] or a flat
//! [`Namespace`]) and decides, per setting, whether the value belongs in the
//! requested view:
//!
//! 1. Persistent groups start from every key the source already holds for
//!    them (only when `scope.persistent` is set), so data without a setting
//!    survives.
//! 2. Each setting in scope writes its current value, unless it is at its
//!    default and defaults were not requested; in that case a stale entry is
//!    removed.
//! 3. Each setting out of scope has its key removed, so a file-only value
//!    never leaks into a command-line view and vice versa.
//!
//! Settings always win over passthrough keys of the same `dest`. Normalizing
//! an already normalized structure with the same scope changes nothing.

use crate::definitions::Definitions;
use crate::error::SettngsError;
use crate::namespace::Namespace;
use crate::setting::sanitize_name;
use crate::source::{OptionSource, get_option};
use crate::types::{Config, GroupValues, Scope, Values};

/// The registry used for one normalize/namespace pass: `definitions` plus,
/// when `persistent` is set, an empty persistent group for every group that
/// only appears in `source`.
///
/// A source group whose sanitized name matches a registered group is that
/// group: namespace keys cannot tell `my group` from `my_group`.
pub(crate) fn internal_definitions<S: OptionSource + ?Sized>(
    definitions: &Definitions,
    source: &S,
    persistent: bool,
) -> Definitions {
    let mut internal = definitions.clone();
    if persistent {
        for name in source.group_names() {
            let sanitized = sanitize_name(&name);
            if definitions.names().any(|g| sanitize_name(g) == sanitized) {
                continue;
            }
            internal.insert_unknown(&name);
        }
    }
    internal
}

/// Produce canonical values for `config` restricted to `scope`.
///
/// Every registered group (and every unknown group, with
/// `scope.persistent`) appears in the result, possibly empty. Use
/// [`clean_config`] to drop empty groups.
pub fn normalize_config<T: OptionSource>(
    config: &Config<T>,
    scope: Scope,
) -> Result<Config<Values>, SettngsError> {
    scope.check()?;

    let options = &config.values;
    let definitions = internal_definitions(&config.definitions, options, scope.persistent);

    let mut normalized = Values::new();
    for (group_name, group) in definitions.iter() {
        let mut group_options = if group.persistent && scope.persistent {
            options.group_options(group_name, group)
        } else {
            GroupValues::new()
        };

        for setting in group.settings() {
            if setting.in_scope(scope.file, scope.cmdline) {
                let (value, is_default) = get_option(options, setting);
                if !is_default || scope.default {
                    group_options.insert(setting.dest.clone(), value);
                } else {
                    group_options.shift_remove(&setting.dest);
                }
            } else {
                group_options.shift_remove(&setting.dest);
            }
        }

        tracing::trace!(group = %group_name, keys = group_options.len(), "normalized group");
        normalized.insert(group_name.clone(), group_options);
    }

    Ok(Config::new(normalized, config.definitions.clone()))
}

/// Normalize with defaults and persistent keys included, then drop empty
/// groups. This is the shape written to the settings file.
pub fn clean_config<T: OptionSource>(
    config: &Config<T>,
    file: bool,
    cmdline: bool,
) -> Result<Values, SettngsError> {
    let scope = Scope {
        file,
        cmdline,
        default: true,
        persistent: true,
    };
    let mut cleaned = normalize_config(config, scope)?.values;
    cleaned.retain(|_, group| !group.is_empty());
    Ok(cleaned)
}

/// Every setting at its default value.
pub fn defaults(definitions: &Definitions) -> Result<Config<Values>, SettngsError> {
    normalize_config(
        &Config::new(Namespace::new(), definitions.clone()),
        Scope::all(),
    )
}
