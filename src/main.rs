//! driver-loader command-line entry point.
//!
//! Diagnostic tool for driver path configurations. It resolves and
//! describes driver classes; it never connects to a database.
//!
//! ## Subcommands
//!
//! - `driver-loader probe <driver_path> <driver_class>` - Load a class, print its metadata
//! - `driver-loader config show` - Effective configuration (defaults + file + env)
//! - `driver-loader config defaults` - Built-in defaults
//! - `driver-loader version` - Print version

use std::process::ExitCode;

use serde::Serialize;

use driver_loader::config as loader_config;
use driver_loader::host::split_driver_path;
use driver_loader::telemetry::{init_logging, LogError};
use driver_loader::{ClassHandle, LoaderContext};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match command {
        "probe" => run_probe(&args),
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => match loader_config::load_layered() {
                    Ok(config) => print_json(&config.effective_config()),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        ExitCode::FAILURE
                    }
                },
                "defaults" => print_json(&loader_config::EnvConfig::default().effective_config()),
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_usage();
                    ExitCode::FAILURE
                }
            }
        }
        "help" | "--help" | "-h" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("driver-loader {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

#[derive(Serialize)]
struct ProbeReport<'a> {
    class: &'a str,
    super_class: Option<&'a str>,
    interfaces: &'a [String],
    class_version: String,
    origin: &'a str,
    sha256: &'a str,
    context_id: u64,
    locations: Vec<String>,
}

impl<'a> ProbeReport<'a> {
    fn new(handle: &'a ClassHandle, context: &LoaderContext) -> Self {
        let (major, minor) = handle.version();
        Self {
            class: handle.name(),
            super_class: handle.super_name(),
            interfaces: handle.interfaces(),
            class_version: format!("{}.{}", major, minor),
            origin: handle.origin(),
            sha256: handle.sha256(),
            context_id: handle.context_id(),
            locations: context.locations(),
        }
    }
}

fn run_probe(args: &[String]) -> ExitCode {
    let (Some(driver_path), Some(driver_class)) = (args.get(2), args.get(3)) else {
        eprintln!("Usage: driver-loader probe <driver_path> <driver_class>");
        return ExitCode::FAILURE;
    };

    let config = match loader_config::load_layered() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    match init_logging(&config.log) {
        Ok(()) | Err(LogError::AlreadyInitialized) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let paths = split_driver_path(driver_path);
    let context = match LoaderContext::new(&paths) {
        Ok(c) => c.with_policy(config.link),
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match context.load_class(driver_class) {
        Ok(handle) => print_json(&ProbeReport::new(&handle, &context)),
        Err(e) => {
            tracing::warn!(class = %driver_class, paths = %driver_path, error = %e, "probe failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!(
        r#"driver-loader {}

USAGE:
    driver-loader <COMMAND>

COMMANDS:
    probe <driver_path> <driver_class>   Load a driver class and print its metadata
    config show                          Show effective configuration
    config defaults                      Show built-in defaults
    version                              Print version
    help                                 Print this message

ENVIRONMENT:
    DRIVER_LOADER_CONFIG                 TOML config file
    DRIVER_LOADER_MAX_CLASS_VERSION      Highest accepted class-file major version
    DRIVER_LOADER_REQUIRED_INTERFACE     Interface driver classes must declare
    DRIVER_LOADER_LOG_LEVEL              Log filter (default: info)
    DRIVER_LOADER_LOG_FORMAT             json or pretty"#,
        env!("CARGO_PKG_VERSION")
    );
}
