// ETL pipeline stages
pub mod audit;
pub mod cleaning;
pub mod derivation;
pub mod error;
pub mod fetcher;
pub mod reconciler;
pub mod runner;

#[cfg(test)]
pub(crate) mod test_utils;

pub use audit::{RowAudit, StepDelta};
pub use cleaning::CleaningStage;
pub use derivation::DerivationStage;
pub use error::{EtlError, EtlResult};
pub use fetcher::{Downloader, HttpDownloader, Partition, SourceFetcher};
pub use reconciler::SchemaReconciler;
pub use runner::{EtlPipeline, RunSummary};
