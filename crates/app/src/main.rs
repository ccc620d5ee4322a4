//! Platter CLI

use std::process;

use clap::Parser;

mod cli;
mod config;
mod observability;

#[tokio::main]
pub async fn main() {
    _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    if let Err(error) = observability::init_logging(cli.logging()) {
        eprintln!("failed to initialise logging: {error}");
        process::exit(1);
    }

    if let Err(error) = cli.run().await {
        eprintln!("{error}");
        process::exit(1);
    }
}
