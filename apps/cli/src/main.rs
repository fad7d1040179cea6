//! awsdigest CLI: enrich AWS what's-new announcements into a Notion database.
//!
//! Tags each article with its AWS service, translates and summarizes it,
//! and publishes one page per article URL.

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
