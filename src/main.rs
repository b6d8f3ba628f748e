//! Fixture harness CLI
//!
//! Runs a program against a directory of input/expected-output pairs and
//! exits zero only when every fixture passed.

use clap::Parser;
use harness::cli;
use harness::commands::Commands;
use harness::common::logging;
use harness::harness::session::EXIT_CONFIG_ERROR;

#[derive(Parser)]
#[command(name = "harness", about = "Fixture-based test harness for command-line programs")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_cli(cli.command.verbose());

    match cli::dispatch(cli.command).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    }
}
