//! Reading and writing the JSON settings file.
//!
//! The file is a JSON object of group name → object of `dest` → value. Both
//! helpers recover from every storage failure locally: problems are logged
//! and reported through the returned success flag, and the caller continues
//! with default values.
//!
//! - A missing file is not an error; it loads as all defaults.
//! - A file that cannot be read, is not valid JSON, or is not a JSON object
//!   loads as all defaults with `success = false`.
//! - Saving writes the [`clean_config`](crate::clean_config) form with
//!   2-space indentation and a trailing newline, creating parent directories
//!   as needed.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::definitions::Definitions;
use crate::error::SettngsError;
use crate::normalize::{clean_config, normalize_config};
use crate::source::OptionSource;
use crate::types::{Config, GroupValues, Scope, Values};

/// File name used by [`default_settings_path`].
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// `settings.json` inside the platform config directory for `app_name`
/// (XDG on Linux, `~/Library/Application Support` on macOS).
///
/// Returns `None` if no home directory can be determined.
pub fn default_settings_path(app_name: &str) -> Option<PathBuf> {
    let proj = directories::ProjectDirs::from("", "", app_name)?;
    Some(proj.config_dir().join(SETTINGS_FILE_NAME))
}

/// Read canonical values from `path` without normalizing them.
///
/// `Ok(None)` means the file does not exist. Top-level entries that are not
/// objects are not groups and are skipped.
pub fn read_values(path: &Path) -> Result<Option<Values>, SettngsError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(SettngsError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let parsed: Value = serde_json::from_str(&content).map_err(|e| SettngsError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    let Value::Object(map) = parsed else {
        return Err(SettngsError::NotAnObject {
            path: path.to_path_buf(),
        });
    };

    let mut values = Values::new();
    for (group, entries) in map {
        match entries {
            Value::Object(entries) => {
                values.insert(group, entries.into_iter().collect::<GroupValues>());
            }
            other => tracing::warn!(
                path = %path.display(),
                group = %group,
                value = %other,
                "Skipping top-level entry that is not an object"
            ),
        }
    }
    Ok(Some(values))
}

/// Write `values` to `path` as pretty JSON with a trailing newline.
pub fn write_values(values: &Values, path: &Path) -> Result<(), SettngsError> {
    let mut json = serde_json::to_string_pretty(values).map_err(|e| SettngsError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    json.push('\n');

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| SettngsError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    std::fs::write(path, json).map_err(|e| SettngsError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load the settings file at `path`, normalized with file settings.
///
/// Never fails: on any storage problem the returned config holds defaults and
/// the flag is `false`.
pub fn parse_file(definitions: &Definitions, path: &Path) -> (Config<Values>, bool) {
    let (values, success) = match read_values(path) {
        Ok(Some(values)) => (values, true),
        Ok(None) => {
            tracing::info!(path = %path.display(), "No config file found");
            (Values::new(), true)
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to load config file, using defaults"
            );
            (Values::new(), false)
        }
    };

    let config = Config::new(values, definitions.clone());
    match normalize_config(&config, Scope::file()) {
        Ok(normalized) => (normalized, success),
        // Scope::file() always passes the scope check.
        Err(_) => (Config::new(Values::new(), definitions.clone()), false),
    }
}

/// Save the file settings of `config` to `path`.
///
/// Returns `false` (after logging) if the file could not be written.
pub fn save_file<T: OptionSource>(config: &Config<T>, path: &Path) -> bool {
    let result = clean_config(config, true, false).and_then(|values| write_values(&values, path));
    match result {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Saved config file");
            true
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to save config file");
            false
        }
    }
}
