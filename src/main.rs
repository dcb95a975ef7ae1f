use std::process::ExitCode;

use clap::Parser;
use cm::{cli::Cli, commands, logging, registry::ProfileRegistry};
use crossterm::style::Stylize;

fn main() -> ExitCode {
    if let Err(err) = logging::init_tracing() {
        eprintln!("Warning: {err}");
    }
    let cli = Cli::parse();
    let registry = ProfileRegistry::open_default();

    match commands::run(&registry, cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err}", "Error:".red());
            ExitCode::FAILURE
        }
    }
}
