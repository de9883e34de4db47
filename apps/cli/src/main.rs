//! Filingcast CLI: financial filings to narrated videos.
//!
//! Runs the acquire → extract → narrate → render → publish pipeline from a
//! numbered menu, from subcommands, or once unattended with `--auto`.

mod commands;
mod menu;
mod progress;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
