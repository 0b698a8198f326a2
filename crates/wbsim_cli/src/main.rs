use std::process::ExitCode;

use clap::Parser;
use wbsim_cli::cli::Cli;
use wbsim_cli::commands;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(error) = wbsim::init_logging(cli.global.log_format.into()) {
        eprintln!("wbsim: {error}");
        return ExitCode::FAILURE;
    }

    match commands::execute(cli) {
        Ok(code) => code,
        Err(error) => {
            tracing::error!(error = %format!("{error:#}"), "wbsim failed");
            eprintln!("wbsim: {error:#}");
            ExitCode::FAILURE
        }
    }
}
