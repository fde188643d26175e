use settngs::{Action, Manager, SettngsError, Setting};

/// Settings shown on every run.
fn example_group(manager: &mut Manager) -> Result<(), SettngsError> {
    manager.add_setting(Setting::builder(["--hello"]).default("world").help("Who to greet"))?;
    manager.add_setting(
        Setting::builder(["--save", "-s"])
            .default(false)
            .action(Action::StoreTrue)
            .file(false)
            .help("Save the merged settings to settings.json"),
    )?;
    manager.add_setting(
        Setting::builder(["--verbose", "-v"])
            .default(false)
            .action(Action::BooleanOptional)
            .help("Print the verbose flag"),
    )
}

/// Keys in this group survive even when no setting declares them.
fn persistent_group(manager: &mut Manager) -> Result<(), SettngsError> {
    manager.add_setting(
        Setting::builder(["--test", "-t"])
            .default(false)
            .action(Action::BooleanOptional)
            .help("A persisted toggle"),
    )
}

pub fn manager() -> Result<Manager, SettngsError> {
    let mut manager = Manager::new("This is an example", "goodbye!");
    manager.add_group("example", false, example_group)?;
    manager.add_persistent_group("persistent", false, persistent_group)?;
    Ok(manager)
}
