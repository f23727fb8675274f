mod commands;

use clap::{Parser, Subcommand};
use craftlens_core::{SortOrder, DEFAULT_PAGE_SIZE};
use craftlens_scraper::Scraper;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "craftlens")]
#[command(about = "Search and inspect idus.com products as JSON")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search products by keyword
    Search {
        keyword: String,

        /// popular, newest, price_asc, price_desc or rating
        #[arg(long, default_value_t = SortOrder::Popular)]
        sort: SortOrder,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: u32,
    },
    /// Extract the detail of one product page
    Detail {
        /// Absolute product page URL
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = craftlens_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let scraper = Scraper::from_app_config(&config)?;

    let outcome = commands::run(&scraper, cli.command).await;

    if let Err(e) = scraper.shutdown().await {
        tracing::warn!(error = %e, "browser did not shut down cleanly");
    }
    outcome
}
