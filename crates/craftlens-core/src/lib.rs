//! Canonical catalog entities and process configuration shared by the
//! scraper library and the `craftlens` binary.

mod app_config;
mod config;
mod products;
mod search;

use thiserror::Error;

pub use app_config::{AppConfig, Viewport};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{Product, ProductDetail};
pub use search::{ResultSource, SearchParams, SearchResult, SortOrder, DEFAULT_PAGE_SIZE};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("keyword is required")]
    EmptyKeyword,

    #[error("unknown sort order \"{0}\"; expected popular, newest, price_asc, price_desc or rating")]
    UnknownSort(String),

    #[error("{field} must be at least 1")]
    NotPositive { field: &'static str },
}
