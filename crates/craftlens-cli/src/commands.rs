//! Command handlers. Results go to stdout as pretty JSON; logs go to stderr.

use craftlens_core::SearchParams;
use craftlens_scraper::Scraper;
use serde::Serialize;

use crate::Commands;

/// Runs one command against `scraper`.
///
/// # Errors
///
/// Returns the scraper error for invalid input or unavailable rendering.
pub(crate) async fn run(scraper: &Scraper, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Search {
            keyword,
            sort,
            page,
            size,
        } => {
            let params = SearchParams {
                keyword,
                sort,
                page,
                size,
            };
            let result = scraper.search(params).await?;
            tracing::info!(
                keyword = %result.keyword,
                count = result.products.len(),
                source = ?result.source,
                "search complete"
            );
            print_json(&result)
        }
        Commands::Detail { url } => {
            let detail = scraper.detail(&url).await?;
            print_json(&detail)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
