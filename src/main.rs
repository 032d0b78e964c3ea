use std::process::ExitCode;

use clap::Parser;
use otpdeck_lib::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match otpdeck_lib::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
