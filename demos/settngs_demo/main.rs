//! # settngs demo application
//!
//! Greets someone, remembering who across runs. This is **not** a real app;
//! it exists to demonstrate and manually verify settngs.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example settngs_demo
//! cargo run --example settngs_demo -- --hello lordwelch -s
//! cargo run --example settngs_demo -- -v
//! RUST_LOG=settngs=debug cargo run --example settngs_demo -- --help
//! ```
//!
//! | Flag                    | Effect                                           |
//! |-------------------------|--------------------------------------------------|
//! | `--hello NAME`          | Who to greet                                     |
//! | `-s`, `--save`          | Write the merged settings to `./settings.json`   |
//! | `-v`, `--[no-]verbose`  | Print the verbose flag                           |
//! | `-t`, `--[no-]test`     | Toggle stored in the persistent group            |
//!
//! Add any key to the `persistent` object in `settings.json` by hand: it is
//! kept on the next save even though no setting declares it.

mod settings;

use std::path::Path;

use serde_json::Value;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use settngs::Scope;

fn main() {
    // Logs go to stderr so stdout only carries the demo's own output.
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let manager = match settings::manager() {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Invalid settings: {e}");
            std::process::exit(settngs::EXIT_CODE);
        }
    };
    let path = Path::new("settings.json");

    let (file_config, _) = manager.parse_file(path);
    let merged = manager
        .get_namespace(&file_config, Scope::all())
        .and_then(|ns| manager.parse_cmdline(std::env::args_os().skip(1), ns));
    let merged = match merged {
        Ok(config) => config,
        Err(e) => manager.exit(e),
    };
    let namespace = match manager.get_namespace(&merged, Scope::all()) {
        Ok(config) => config.values,
        Err(e) => manager.exit(e),
    };

    match &merged.values["example"]["hello"] {
        Value::String(name) => println!("Hello {name}"),
        other => println!("Hello {other}"),
    }
    if namespace.get("example__save") == Some(&Value::Bool(true)) {
        if manager.save_file(&merged, path) {
            println!("Successfully saved settings to {}", path.display());
        } else {
            println!("Failed saving settings to {}", path.display());
        }
    }
    if let Some(verbose) = namespace
        .get("example__verbose")
        .filter(|v| **v == Value::Bool(true))
    {
        println!("example__verbose={verbose}");
    }
}
