#[cfg(test)]
pub mod test {
    use std::sync::{Arc, Mutex};

    use serde_json::Value;

    use crate::definitions::Definitions;
    use crate::setting::SettingBuilder;
    use crate::types::{GroupValues, Values};

    #[cfg(feature = "clap")]
    use {
        crate::error::SettngsError,
        crate::manager::Manager,
        crate::setting::{Action, Setting},
        crate::types::Scope,
        std::io::Write,
        std::path::Path,
    };

    /// Registry built from `(group, builder)` pairs, none of them exclusive.
    pub fn definitions_with(settings: &[(&str, SettingBuilder)]) -> Definitions {
        let mut defs = Definitions::new();
        for (group, builder) in settings {
            defs.add_setting(builder.clone().build(group, false).unwrap())
                .unwrap();
        }
        defs
    }

    /// Canonical values from a JSON object of JSON objects.
    pub fn values(json: Value) -> Values {
        let Value::Object(groups) = json else {
            panic!("expected a JSON object");
        };
        groups
            .into_iter()
            .map(|(name, group)| match group {
                Value::Object(group) => (name, group.into_iter().collect::<GroupValues>()),
                other => panic!("group {name} is not an object: {other}"),
            })
            .collect()
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` with a subscriber that records every event, returning
    /// `f`'s result and the formatted log output.
    pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        (result, logs)
    }

    /// The example application's registry: a plain `example` group and a
    /// persistent group.
    #[cfg(feature = "clap")]
    pub fn example_manager() -> Manager {
        let mut manager = Manager::new("This is an example", "goodbye!").with_prog("settngs");
        manager
            .add_group("example", false, |m| {
                m.add_setting(Setting::builder(["--hello"]).default("world"))?;
                m.add_setting(
                    Setting::builder(["--save", "-s"])
                        .default(false)
                        .action(Action::StoreTrue)
                        .file(false),
                )?;
                m.add_setting(
                    Setting::builder(["--verbose", "-v"])
                        .default(false)
                        .action(Action::BooleanOptional),
                )
            })
            .unwrap();
        manager
            .add_persistent_group("persistent", false, |m| {
                m.add_setting(
                    Setting::builder(["--test", "-t"])
                        .default(false)
                        .action(Action::BooleanOptional),
                )
            })
            .unwrap();
        manager
    }

    /// One run of the example application against the settings file at
    /// `path`, writing what it prints to `out`.
    #[cfg(feature = "clap")]
    pub fn run_example(args: &[&str], path: &Path, out: &mut impl Write) -> Result<(), SettngsError> {
        let manager = example_manager();

        let (file_config, _) = manager.parse_file(path);
        let file_namespace = manager.get_namespace(&file_config, Scope::all())?;

        let merged = manager.parse_cmdline(args.iter().copied(), file_namespace)?;
        let namespace = manager.get_namespace(&merged, Scope::all())?.values;

        writeln!(out, "Hello {}", merged.values["example"]["hello"].as_str().unwrap()).unwrap();
        if namespace.get("example__save") == Some(&Value::Bool(true)) {
            if manager.save_file(&merged, path) {
                writeln!(out, "Successfully saved settings to {}", path.display()).unwrap();
            } else {
                writeln!(out, "Failed saving settings to {}", path.display()).unwrap();
            }
        }
        if let Some(verbose) = namespace.get("example__verbose").filter(|v| **v == Value::Bool(true)) {
            writeln!(out, "example__verbose={verbose}").unwrap();
        }
        Ok(())
    }

    #[cfg(feature = "clap")]
    #[test]
    fn example_registry_shape() {
        let manager = example_manager();
        let defs = manager.definitions();
        assert!(!defs.get("example").unwrap().persistent);
        assert!(defs.get("persistent").unwrap().persistent);
        let names: Vec<&str> = defs.settings().map(|s| s.internal_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["example__hello", "example__save", "example__verbose", "persistent__test"]
        );
    }

    #[test]
    fn values_helper_keeps_order() {
        let vals = values(serde_json::json!({"b": {"y": 1, "x": 2}, "a": {}}));
        assert_eq!(vals.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(vals["b"].keys().collect::<Vec<_>>(), vec!["y", "x"]);
    }
}
