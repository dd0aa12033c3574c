//! Assetpipe - Command-line tool for incremental asset builds

use std::process::ExitCode;

use assetpipe::cli;

fn main() -> ExitCode {
    cli::run()
}
