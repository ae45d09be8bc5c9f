//! uxcrawl CLI
//!
//! Bounded, authenticated site crawling with headless Chrome, plus the
//! execution metrics the evaluation reports are built from.

use anyhow::Result;
use clap::{Parser, Subcommand};

use uxcrawl::content::{run_extract, ExtractArgs};
use uxcrawl::crawl::{run_crawl, CrawlArgs};

#[derive(Parser)]
#[command(name = "uxcrawl")]
#[command(version)]
#[command(about = "Bounded authenticated site crawler with execution metrics")]
#[command(
    long_about = "Crawls a site under page, depth and domain budgets using headless Chrome,\nproducing a URL -> cleaned-text map and an auditable cost/skip summary.\n\nCommands:\n  crawl    Crawl a site, optionally behind a login form\n  extract  Clean local HTML files into evaluable text"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a site under budget, depth and domain limits
    Crawl(CrawlArgs),
    /// Strip local HTML into whitespace-collapsed text
    Extract(ExtractArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl(args) => run_crawl(args).await,
        Commands::Extract(args) => run_extract(args).await,
    }
}
