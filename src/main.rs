//! client-loader entry point.
//!
//! ## CLI Subcommands
//!
//! - `client-loader resolve <name>...` - Print fetch paths (exit 0/1)
//! - `client-loader load <name>` - Load from `CLIENT_LOADER_ROOT` and print
//! - `client-loader config show|defaults|validate` - Inspect configuration

use std::process::ExitCode;

use client_loader::cli::{config_cmd, run_load, run_resolve};
use client_loader::config;
use client_loader::telemetry::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match command {
        "resolve" => {
            let code = run_resolve(&args[2..]);
            ExitCode::from(code as u8)
        }
        "load" => {
            let Some(name) = args.get(2) else {
                eprintln!("load: expected an identifier");
                print_command_help("load");
                return ExitCode::FAILURE;
            };
            if let Err(e) = init_logging(&config::load().log) {
                eprintln!("Logging disabled: {}", e);
            }
            let code = run_load(name).await;
            ExitCode::from(code as u8)
        }
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    let json_output = args.get(3).map(|s| s.as_str()) == Some("--json");
                    config_cmd::run_show(json_output);
                    ExitCode::SUCCESS
                }
                "defaults" => {
                    config_cmd::run_defaults();
                    ExitCode::SUCCESS
                }
                "validate" => {
                    let code = config_cmd::run_validate();
                    ExitCode::from(code as u8)
                }
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_command_help("config");
                    ExitCode::FAILURE
                }
            }
        }
        "help" | "--help" | "-h" => {
            if let Some(subcommand) = args.get(2) {
                print_command_help(subcommand);
            } else {
                print_usage();
            }
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("client-loader {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "client-loader v{}

USAGE:
    client-loader <COMMAND> [ARGS]

COMMANDS:
    resolve <name>...   Print the fetch path of each identifier
    load <name>         Load an identifier from CLIENT_LOADER_ROOT
    config <sub>        Configuration: show [--json], defaults, validate
    help [command]      Show help
    version             Show version

Run 'client-loader help <command>' for details.",
        version
    );
}

fn print_command_help(command: &str) {
    match command {
        "resolve" => eprintln!(
            "client-loader resolve <name>...

Identifiers: [lib!|res!][<namespace>:]<segment>(/<segment>)*
    client-loader resolve Views.Record.Detail   client/src/views/record/detail.js
    client-loader resolve crm:Foo/Bar           client/modules/crm/src/foo/bar.js

Exits 1 if any identifier fails to resolve."
        ),
        "load" => eprintln!(
            "client-loader load <name>

Loads through the filesystem transport rooted at CLIENT_LOADER_ROOT, using
the file cache in CLIENT_LOADER_CACHE_DIR when set. Text resources are
printed to stdout."
        ),
        "config" => eprintln!(
            "client-loader config <show [--json] | defaults | validate>

Reads CLIENT_LOADER_* environment variables."
        ),
        other => {
            eprintln!("No help for '{}'", other);
            print_usage();
        }
    }
}
