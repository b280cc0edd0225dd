// DataFusion SessionManager
//
// Builds the SessionContext every pipeline stage runs in.

use datafusion::prelude::*;

use crate::config::EngineConfig;

/// Configuration for DataFusion sessions
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Batch size for query execution
    pub batch_size: usize,
    /// Number of partitions for parallel execution
    pub target_partitions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            batch_size: 8192,
            target_partitions: num_cpus::get(),
        }
    }
}

impl From<&EngineConfig> for SessionConfig {
    fn from(engine: &EngineConfig) -> Self {
        Self {
            batch_size: engine.batch_size.max(1),
            target_partitions: engine.target_partitions.max(1),
        }
    }
}

/// Manages DataFusion SessionContext lifecycle
///
/// One session is created per pipeline run; partitions are read into it and
/// the stages chain lazy `DataFrame` plans on top.
///
/// # Example
/// ```rust,ignore
/// let manager = DataFusionSessionManager::new(SessionConfig::default());
/// let ctx = manager.create_session();
/// let df = ctx.read_parquet("./data/yellow_tripdata_2020-01.parquet", ParquetReadOptions::default()).await?;
/// ```
pub struct DataFusionSessionManager {
    config: SessionConfig,
}

impl DataFusionSessionManager {
    /// Create a new SessionManager with the given configuration
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Create a new DataFusion SessionContext
    pub fn create_session(&self) -> SessionContext {
        let config = datafusion::execution::config::SessionConfig::new()
            .with_batch_size(self.config.batch_size)
            .with_target_partitions(self.config.target_partitions);

        SessionContext::new_with_config(config)
    }
}
