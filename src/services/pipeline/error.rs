use datafusion::error::DataFusionError;
use thiserror::Error;

/// Errors raised while extracting, transforming or loading trips.
///
/// Everything aborts the run except `Connection`: an unreachable relational
/// store is logged and skipped once the Parquet output is on disk. A `Load`
/// failure after connecting still fails the run.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Fetch error for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Load error: {0}")]
    Load(String),

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("DataFusion error: {0}")]
    DataFusion(#[from] DataFusionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EtlError {
    pub fn fetch(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        EtlError::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the runner may log this error and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EtlError::Connection(_))
    }
}

pub type EtlResult<T> = Result<T, EtlError>;
