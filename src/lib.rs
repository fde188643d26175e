//! Declare settings once; get a command line, a JSON settings file, and a
//! flat namespace out of them.
//!
//! ```ignore
//! let mut manager = Manager::new("This is an example", "goodbye!");
//! manager.add_group("example", false, |m| {
//!     m.add_setting(Setting::builder(["--hello"]).default("world"))
//! })?;
//!
//! let (config, _loaded) = manager.parse_config(&path, std::env::args_os().skip(1))?;
//! println!("Hello {}", config.values["example"]["hello"]);
//! manager.save_file(&config, &path);
//! ```
//!
//! Every [`Setting`] belongs to a named group and says whether it can be set
//! on the command line, stored in the settings file, or both. From that one
//! declaration settngs builds the clap parser, decides what is written to
//! disk, and keeps the two consistent.
//!
//! # Two views of the same values
//!
//! - **Canonical values** ([`Values`]): group name → setting `dest` →
//!   value. This is the shape of the settings file.
//! - **Flat namespace** ([`Namespace`]): `{group}__{dest}` → value, with
//!   the group name sanitized (`Example Group` becomes `Example_Group`).
//!   This is the shape the command-line parser works in.
//!
//! Both implement [`OptionSource`], and every operation accepts either.
//! [`get_namespace`] converts canonical values to a namespace;
//! [`normalize_config`] converts either to canonical values.
//!
//! # Normalizing
//!
//! [`normalize_config`] is the engine every other operation is built on. A
//! [`Scope`] selects which settings the result includes:
//!
//! ```text
//! file        settings stored in the settings file
//! cmdline     settings available on the command line
//! default     also settings still at their default value
//! persistent  also keys without a setting in persistent groups
//! ```
//!
//! At least one of `file` and `cmdline` must be set. Normalizing is
//! idempotent: running it again with the same scope changes nothing.
//!
//! # Persistent groups
//!
//! A group registered with [`Manager::add_persistent_group`] keeps keys it
//! has no setting for. That lets several programs (or several versions of
//! one program) share a settings file without dropping each other's values.
//! Groups that appear in the values but are not registered at all are
//! treated the same way.
//!
//! # Files
//!
//! [`parse_file`] and [`save_file`] never fail. A missing file loads as all
//! defaults. A file that cannot be read or parsed also loads as all
//! defaults, but the returned flag is `false` and the problem is logged
//! through `tracing`. Saving writes only file settings, skips empty groups,
//! and reports failure through its return value.
//!
//! # Clap adapter
//!
//! With the `clap` feature (on by default), [`create_command`] builds a
//! [`clap::Command`] at runtime from every command-line setting, and
//! [`parse_cmdline`] runs it on top of a seed (usually the loaded file).
//! Only values actually given on the command line replace the seed.
//!
//! # Code generation
//!
//! With the `codegen` feature (on by default), [`generate_ns`] and
//! [`generate_dict`] emit serde structs mirroring the two views, for hosts
//! that want typed access.
//!
//! # Error handling
//!
//! Registration and scope mistakes return [`SettngsError`] immediately; see
//! [`ErrorKind`] for how variants are classified. Command-line errors carry
//! the [`clap::Error`]; [`Manager::exit`] prints it and exits with
//! [`EXIT_CODE`].

pub mod error;
pub mod types;

#[cfg(feature = "clap")]
mod cli;
#[cfg(feature = "codegen")]
mod codegen;
mod definitions;
mod file;
mod manager;
mod namespace;
mod normalize;
mod setting;
mod source;

#[cfg(test)]
mod fixtures;

#[cfg(feature = "clap")]
pub use cli::{Seed, create_command, is_runtime_group, parse_cmdline, parse_config};
#[cfg(feature = "codegen")]
pub use codegen::{generate_dict, generate_ns, guess_type};
pub use definitions::{Definitions, Group};
pub use error::{ErrorKind, SettngsError};
pub use file::{
    SETTINGS_FILE_NAME, default_settings_path, parse_file, read_values, save_file, write_values,
};
#[cfg(feature = "clap")]
pub use manager::exit_code;
pub use manager::{EXIT_CODE, Manager};
pub use namespace::{Namespace, get_namespace};
pub use normalize::{clean_config, defaults, normalize_config};
pub use setting::{Action, Nargs, Setting, SettingBuilder, ValueType, sanitize_name};
pub use source::{OptionSource, get_groups, get_option, get_options};
pub use types::{Config, GroupValues, Scope, Values};
