//! Error types for the sales collector.

use seaport_trades::error::{FetchError, SinkError};

use crate::config::ConfigError;

/// Main error type for the sales collector.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid subgraph URL: {0}")]
    InvalidSubgraphUrl(#[from] url::ParseError),

    #[error("Subgraph client error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to write output: {0}")]
    Sink(#[from] SinkError),
}

pub type Result<T> = std::result::Result<T, Error>;
