//! serpforge CLI — SERP research and content-blueprint synthesis.
//!
//! Fetches the organic SERP for a keyword, extracts structured artifacts from
//! the top pages, and synthesizes an evidence-backed SEO blueprint.

mod commands;

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
