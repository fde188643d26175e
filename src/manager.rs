//! The [`Manager`]: register settings by group, then load, parse and save
//! them.
//!
//! Registration happens through closures so that every setting added inside
//! one picks up that group's name and exclusivity:
//!
//! ```ignore
//! let mut manager = Manager::new("My tool", "");
//! manager.add_group("output", false, |m| {
//!     m.add_setting(Setting::builder(["--color"]).default("auto"))
//! })?;
//! manager.add_persistent_group("plugins", false, |m| {
//!     m.add_setting(Setting::builder(["--enabled"]).default(true))
//! })?;
//! ```
//!
//! Every other method delegates to the free function of the same name with
//! the manager's registry.

use std::path::Path;

use crate::definitions::Definitions;
use crate::error::SettngsError;
use crate::file;
use crate::namespace::{self, Namespace};
use crate::normalize;
use crate::setting::SettingBuilder;
use crate::source::OptionSource;
use crate::types::{Config, Scope, Values};

#[cfg(feature = "clap")]
use {
    crate::cli::{self, Seed},
    std::ffi::OsString,
};

/// Exit code used by [`Manager::exit`] for command-line errors.
pub const EXIT_CODE: i32 = 99;

#[derive(Debug, Clone)]
pub struct Manager {
    description: String,
    epilog: String,
    prog: String,
    definitions: Definitions,
    /// Name and exclusivity of the group being registered.
    current_group: Option<(String, bool)>,
    #[cfg(feature = "clap")]
    top_level_positional: fn(&str) -> bool,
}

fn default_prog() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .map(Path::new)
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

impl Manager {
    pub fn new(description: &str, epilog: &str) -> Self {
        Self::from_definitions(description, epilog, Definitions::new())
    }

    /// Start from an existing registry, or the registry of a [`Config`].
    pub fn from_definitions(
        description: &str,
        epilog: &str,
        definitions: impl Into<Definitions>,
    ) -> Self {
        Self {
            description: description.to_string(),
            epilog: epilog.to_string(),
            prog: default_prog(),
            definitions: definitions.into(),
            current_group: None,
            #[cfg(feature = "clap")]
            top_level_positional: cli::is_runtime_group,
        }
    }

    /// Program name shown in help and usage (default: the file name of the
    /// running executable).
    pub fn with_prog(mut self, prog: &str) -> Self {
        self.prog = prog.to_string();
        self
    }

    /// Decide which groups keep their positional `*` settings at the top
    /// level of the help output (default: groups containing "runtime").
    #[cfg(feature = "clap")]
    pub fn with_top_level_positional(mut self, predicate: fn(&str) -> bool) -> Self {
        self.top_level_positional = predicate;
        self
    }

    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    pub fn prog(&self) -> &str {
        &self.prog
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn epilog(&self) -> &str {
        &self.epilog
    }

    /// Pair `values` with this manager's registry.
    pub fn config<T>(&self, values: T) -> Config<T> {
        Config::new(values, self.definitions.clone())
    }

    /// Register a setting in the current group (or the unnamed top-level
    /// group outside of [`add_group`](Self::add_group)).
    pub fn add_setting(&mut self, setting: SettingBuilder) -> Result<(), SettngsError> {
        let (group, exclusive) = match &self.current_group {
            Some((name, exclusive)) => (name.as_str(), *exclusive),
            None => ("", false),
        };
        let setting = setting.build(group, exclusive)?;
        self.definitions.add_setting(setting)
    }

    /// Register the settings added by `group` under `name`.
    ///
    /// With `exclusive`, at most one of the group's settings may be given on
    /// the command line.
    pub fn add_group<F>(&mut self, name: &str, exclusive: bool, group: F) -> Result<(), SettngsError>
    where
        F: FnOnce(&mut Manager) -> Result<(), SettngsError>,
    {
        self.register_group(name, false, exclusive, group)
    }

    /// Like [`add_group`](Self::add_group), but keys in the stored file that
    /// have no setting in this group are kept rather than dropped.
    pub fn add_persistent_group<F>(
        &mut self,
        name: &str,
        exclusive: bool,
        group: F,
    ) -> Result<(), SettngsError>
    where
        F: FnOnce(&mut Manager) -> Result<(), SettngsError>,
    {
        self.register_group(name, true, exclusive, group)
    }

    fn register_group<F>(
        &mut self,
        name: &str,
        persistent: bool,
        exclusive: bool,
        group: F,
    ) -> Result<(), SettngsError>
    where
        F: FnOnce(&mut Manager) -> Result<(), SettngsError>,
    {
        if let Some((parent, _)) = &self.current_group {
            return Err(SettngsError::NestedGroup {
                group: name.to_string(),
                parent: parent.clone(),
            });
        }
        self.definitions.declare_group(name, persistent)?;

        self.current_group = Some((name.to_string(), exclusive));
        let result = group(self);
        self.current_group = None;
        result
    }

    pub fn defaults(&self) -> Result<Config<Values>, SettngsError> {
        normalize::defaults(&self.definitions)
    }

    pub fn normalize_config<T: OptionSource>(
        &self,
        config: &Config<T>,
        scope: Scope,
    ) -> Result<Config<Values>, SettngsError> {
        normalize::normalize_config(config, scope)
    }

    pub fn clean_config<T: OptionSource>(
        &self,
        config: &Config<T>,
        file: bool,
        cmdline: bool,
    ) -> Result<Values, SettngsError> {
        normalize::clean_config(config, file, cmdline)
    }

    pub fn get_namespace<T: OptionSource>(
        &self,
        config: &Config<T>,
        scope: Scope,
    ) -> Result<Config<Namespace>, SettngsError> {
        namespace::get_namespace(config, scope)
    }

    pub fn parse_file(&self, path: &Path) -> (Config<Values>, bool) {
        file::parse_file(&self.definitions, path)
    }

    pub fn save_file<T: OptionSource>(&self, config: &Config<T>, path: &Path) -> bool {
        file::save_file(config, path)
    }

    /// The clap command for every command-line setting.
    #[cfg(feature = "clap")]
    pub fn command(&self) -> Result<clap::Command, SettngsError> {
        cli::create_command(
            &self.definitions,
            &self.prog,
            &self.description,
            &self.epilog,
            self.top_level_positional,
        )
    }

    /// Parse `args` (without the program name) on top of `seed`.
    #[cfg(feature = "clap")]
    pub fn parse_cmdline<I, S>(
        &self,
        args: I,
        seed: impl Into<Seed>,
    ) -> Result<Config<Values>, SettngsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        cli::parse_cmdline(&self.definitions, self.command()?, args, seed)
    }

    /// Load `path`, then parse `args` on top of it. The boolean is the file
    /// load's success flag.
    #[cfg(feature = "clap")]
    pub fn parse_config<I, S>(
        &self,
        path: &Path,
        args: I,
    ) -> Result<(Config<Values>, bool), SettngsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        cli::parse_config(&self.definitions, self.command()?, path, args)
    }

    /// Terminate the process after a failed parse.
    ///
    /// Help and version output are printed to stdout and exit with 0. Every
    /// other error is printed to stderr and exits with [`EXIT_CODE`].
    #[cfg(feature = "clap")]
    pub fn exit(&self, err: SettngsError) -> ! {
        let code = exit_code(&err);
        match err {
            SettngsError::Cmdline(e) => {
                let _ = e.print();
            }
            other => eprintln!("{}: error: {other}", self.prog),
        }
        std::process::exit(code)
    }

    #[cfg(feature = "codegen")]
    pub fn generate_ns(&self) -> (String, String) {
        crate::codegen::generate_ns(&self.definitions)
    }

    #[cfg(feature = "codegen")]
    pub fn generate_dict(&self) -> (String, String) {
        crate::codegen::generate_dict(&self.definitions)
    }
}

/// Process exit code for `err`: 0 for help/version requests,
/// [`EXIT_CODE`] otherwise.
#[cfg(feature = "clap")]
pub fn exit_code(err: &SettngsError) -> i32 {
    match err {
        SettngsError::Cmdline(e) if !e.use_stderr() => 0,
        _ => EXIT_CODE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setting::Setting;
    use serde_json::json;

    #[test]
    fn settings_outside_groups_go_to_the_unnamed_group() {
        let mut manager = Manager::new("", "");
        manager
            .add_setting(Setting::builder(["--test"]).default("x"))
            .unwrap();
        let setting = manager.definitions().settings().next().unwrap();
        assert_eq!(setting.group, "");
        assert_eq!(setting.internal_name, "test");
    }

    #[test]
    fn group_name_and_exclusivity_are_applied() {
        let mut manager = Manager::new("", "");
        manager
            .add_group("fmt", true, |m| {
                m.add_setting(Setting::builder(["--json"]))
            })
            .unwrap();
        manager
            .add_setting(Setting::builder(["--after"]))
            .unwrap();

        let settings: Vec<_> = manager.definitions().settings().collect();
        assert_eq!(settings[0].group, "fmt");
        assert!(settings[0].exclusive);
        assert_eq!(settings[1].group, "");
        assert!(!settings[1].exclusive);
    }

    #[test]
    fn nested_groups_are_rejected() {
        let mut manager = Manager::new("", "");
        let err = manager
            .add_group("outer", false, |m| m.add_group("inner", false, |_| Ok(())))
            .unwrap_err();
        assert!(matches!(
            err,
            SettngsError::NestedGroup { ref group, ref parent } if group == "inner" && parent == "outer"
        ));
        // The failed registration does not leave the manager inside a group.
        manager.add_group("next", false, |_| Ok(())).unwrap();
    }

    #[test]
    fn persistence_must_agree() {
        let mut manager = Manager::new("", "");
        manager.add_persistent_group("p", false, |_| Ok(())).unwrap();
        manager.add_persistent_group("p", false, |_| Ok(())).unwrap();
        let err = manager.add_group("p", false, |_| Ok(())).unwrap_err();
        assert!(matches!(err, SettngsError::PersistenceMismatch { persistent: true, .. }));

        manager.add_group("plain", false, |_| Ok(())).unwrap();
        let err = manager
            .add_persistent_group("plain", false, |_| Ok(()))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Group 'plain' already exists and is not persistent"
        );
    }

    #[test]
    fn duplicate_settings_are_rejected() {
        let mut manager = Manager::new("", "");
        let err = manager
            .add_group("tst", false, |m| {
                m.add_setting(Setting::builder(["--test"]))?;
                m.add_setting(Setting::builder(["--test"]))
            })
            .unwrap_err();
        assert!(matches!(err, SettngsError::DuplicateInternalName { .. }));
    }

    #[test]
    fn from_config_definitions() {
        let mut manager = Manager::new("", "");
        manager
            .add_group("tst", false, |m| {
                m.add_setting(Setting::builder(["--test"]).default("hello"))
            })
            .unwrap();
        let config = manager.defaults().unwrap();

        let copy = Manager::from_definitions("", "", config);
        assert_eq!(copy.definitions(), manager.definitions());
        assert_eq!(
            copy.defaults().unwrap().values["tst"]["test"],
            json!("hello")
        );
    }

    #[cfg(feature = "clap")]
    mod cmdline {
        use super::*;
        use crate::cli::Seed;
        use crate::fixtures::test::{example_manager, run_example};
        use std::fs;
        use tempfile::TempDir;

        fn settings_text(hello: &str, verbose: bool, test: bool, extra: bool) -> String {
            let extra = if extra { ",\n    \"hello\": \"world\"" } else { "" };
            format!(
                "{{\n  \"example\": {{\n    \"hello\": \"{hello}\",\n    \"verbose\": {verbose}\n  }},\n  \"persistent\": {{\n    \"test\": {test}{extra}\n  }}\n}}\n"
            )
        }

        #[test]
        fn example_scenario() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("settings.json");
            fs::write(&path, "").unwrap();

            let run = |args: &[&str]| {
                let mut out = Vec::new();
                run_example(args, &path, &mut out).unwrap();
                String::from_utf8(out).unwrap()
            };
            let saved = format!("Successfully saved settings to {}\n", path.display());
            let verbose = "example__verbose=true\n";
            let file = || fs::read_to_string(&path).unwrap();

            assert_eq!(run(&[]), "Hello world\n");
            assert_eq!(file(), "");

            assert_eq!(run(&["--hello", "lordwelch"]), "Hello lordwelch\n");
            assert_eq!(file(), "");

            assert_eq!(
                run(&["--hello", "lordwelch", "-s"]),
                format!("Hello lordwelch\n{saved}")
            );
            assert_eq!(file(), settings_text("lordwelch", false, false, false));

            assert_eq!(run(&[]), "Hello lordwelch\n");
            assert_eq!(run(&["-v"]), format!("Hello lordwelch\n{verbose}"));
            assert_eq!(file(), settings_text("lordwelch", false, false, false));

            assert_eq!(
                run(&["-v", "-s"]),
                format!("Hello lordwelch\n{saved}{verbose}")
            );
            assert_eq!(file(), settings_text("lordwelch", true, false, false));
            assert_eq!(run(&[]), format!("Hello lordwelch\n{verbose}"));

            // A key without a setting in the persistent group survives.
            fs::write(&path, settings_text("lordwelch", true, false, true)).unwrap();
            assert_eq!(run(&[]), format!("Hello lordwelch\n{verbose}"));
            assert_eq!(file(), settings_text("lordwelch", true, false, true));

            assert_eq!(run(&["--no-verbose", "-t"]), "Hello lordwelch\n");
            assert_eq!(file(), settings_text("lordwelch", true, false, true));

            assert_eq!(
                run(&["--no-verbose", "-s", "-t"]),
                format!("Hello lordwelch\n{saved}")
            );
            assert_eq!(file(), settings_text("lordwelch", false, true, true));

            assert_eq!(
                run(&["--hello", "world", "--no-verbose", "--no-test", "-s"]),
                format!("Hello world\n{saved}")
            );
            assert_eq!(file(), settings_text("world", false, false, true));

            assert_eq!(run(&[]), "Hello world\n");
            assert_eq!(file(), settings_text("world", false, false, true));
        }

        #[test]
        fn parse_config_reports_load_failure() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("settings.json");
            fs::write(&path, "not json").unwrap();

            let (config, success) = example_manager()
                .parse_config(&path, ["--hello", "there"])
                .unwrap();
            assert!(!success);
            assert_eq!(config.values["example"]["hello"], json!("there"));
            assert_eq!(config.values["persistent"]["test"], json!(false));
        }

        #[test]
        fn help_uses_description_and_epilog() {
            let help = example_manager().command().unwrap().render_help().to_string();
            assert!(help.contains("This is an example"));
            assert!(help.contains("goodbye!"));
            assert!(help.contains("--no-verbose"));
            assert!(help.contains("example:"));
        }

        #[test]
        fn exit_codes() {
            let manager = example_manager();
            let help = manager.parse_cmdline(["--help"], Seed::Empty).unwrap_err();
            assert_eq!(exit_code(&help), 0);
            let bad = manager.parse_cmdline(["--nope"], Seed::Empty).unwrap_err();
            assert_eq!(exit_code(&bad), EXIT_CODE);
            assert_eq!(exit_code(&SettngsError::NoScope), EXIT_CODE);
        }

        #[test]
        fn custom_prog_is_used_in_usage() {
            let manager = example_manager().with_prog("my-tool");
            assert_eq!(manager.prog(), "my-tool");
            let usage = manager.command().unwrap().render_usage().to_string();
            assert!(usage.contains("my-tool"));
        }
    }
}
