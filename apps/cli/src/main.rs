//! jobowners CLI: report which known owners appear in each Jenkins job.
//!
//! Crawls the job tree, reads every job's `config.xml` and writes a CSV of
//! job name, URL and matched owners.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
