use std::process::ExitCode;

use clap::Parser;
use ztat::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match ztat::app::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ztat: {e}");
            ExitCode::FAILURE
        }
    }
}
