use std::path::PathBuf;
use thiserror::Error;

/// Broad class of a [`SettngsError`].
///
/// Configuration and usage errors are programming mistakes in the host
/// application and surface immediately. Storage errors never reach callers of
/// the file helpers; they are logged and reduced to a success flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Usage,
    Storage,
    Cmdline,
}

#[derive(Debug, Error)]
pub enum SettngsError {
    #[error("A setting needs at least one name")]
    MissingNames,

    #[error("Cannot use '{dest}' in a namespace: it is not a valid identifier")]
    InvalidDest { dest: String },

    #[error("Internal name '{name}' is used by both {existing} and {duplicate}")]
    DuplicateInternalName {
        name: String,
        existing: String,
        duplicate: String,
    },

    #[error("Group '{group}' already exists and is {}", persistence(.persistent))]
    PersistenceMismatch { group: String, persistent: bool },

    #[error("Sub groups are not allowed: '{group}' was declared inside '{parent}'")]
    NestedGroup { group: String, parent: String },

    #[error("Invalid flag '{name}': short flags must be a single character")]
    InvalidFlag { name: String },

    #[error("Flag '{name}' is used by both {existing} and {duplicate}")]
    DuplicateFlag {
        name: String,
        existing: String,
        duplicate: String,
    },

    #[error("Invalid parameters: you must set either file or cmdline to true")]
    NoScope,

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{path} does not contain a JSON object")]
    NotAnObject { path: PathBuf },

    #[cfg(feature = "clap")]
    #[error(transparent)]
    Cmdline(#[from] clap::Error),
}

fn persistence(persistent: &bool) -> &'static str {
    if *persistent {
        "persistent"
    } else {
        "not persistent"
    }
}

impl SettngsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SettngsError::MissingNames
            | SettngsError::InvalidDest { .. }
            | SettngsError::DuplicateInternalName { .. }
            | SettngsError::PersistenceMismatch { .. }
            | SettngsError::NestedGroup { .. }
            | SettngsError::InvalidFlag { .. }
            | SettngsError::DuplicateFlag { .. } => ErrorKind::Configuration,
            SettngsError::NoScope => ErrorKind::Usage,
            SettngsError::Io { .. } | SettngsError::Json { .. } | SettngsError::NotAnObject { .. } => {
                ErrorKind::Storage
            }
            #[cfg(feature = "clap")]
            SettngsError::Cmdline(_) => ErrorKind::Cmdline,
        }
    }
}
