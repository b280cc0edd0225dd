use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use datafusion::prelude::DataFrame;
use serde::Serialize;

use crate::config::Config;
use crate::services::datafusion::{DataFusionSessionManager, SessionConfig};
use crate::services::pipeline::audit::{RowAudit, StepDelta};
use crate::services::pipeline::cleaning::CleaningStage;
use crate::services::pipeline::derivation::DerivationStage;
use crate::services::pipeline::error::EtlResult;
use crate::services::pipeline::fetcher::{Downloader, SourceFetcher};
use crate::services::pipeline::reconciler::SchemaReconciler;
use crate::services::sink::{LoadOutcome, ParquetSink, RelationalLoader};

/// What one pipeline run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub year: i32,
    pub partitions: usize,
    pub output_rows: usize,
    pub parquet_path: PathBuf,
    pub relational_load: String,
    pub step_deltas: Vec<StepDelta>,
    pub elapsed_ms: u128,
}

/// Sequential driver: fetch -> reconcile -> clean -> derive -> sinks.
///
/// Each stage takes the previous stage's frame by value and returns a new
/// one; nothing else is shared between stages.
pub struct EtlPipeline {
    year: i32,
    months: Vec<u32>,
    audit_row_counts: bool,
    fetcher: SourceFetcher,
    session_manager: DataFusionSessionManager,
    parquet_sink: ParquetSink,
    loader: Arc<dyn RelationalLoader>,
}

impl EtlPipeline {
    pub fn new(
        config: &Config,
        downloader: Arc<dyn Downloader>,
        loader: Arc<dyn RelationalLoader>,
    ) -> Self {
        Self {
            year: config.dataset.year,
            months: config.dataset.months.clone(),
            audit_row_counts: config.pipeline.audit_row_counts,
            fetcher: SourceFetcher::from_config(&config.dataset, downloader),
            session_manager: DataFusionSessionManager::new(SessionConfig::from(&config.engine)),
            parquet_sink: ParquetSink::new(config.output.parquet_dir.clone()),
            loader,
        }
    }

    pub async fn run(&self) -> EtlResult<RunSummary> {
        let started = Instant::now();
        tracing::info!(
            "Starting ETL for {} ({} months)",
            self.year,
            self.months.len()
        );

        // Extract
        let partitions = self.fetcher.fetch_all(self.year, &self.months).await?;
        let paths: Vec<PathBuf> = partitions.iter().map(|p| p.local_path.clone()).collect();

        let ctx = self.session_manager.create_session();
        let merged = SchemaReconciler::new(ctx).merge(&paths).await?;
        tracing::info!("Merged {} partitions", paths.len());

        // Transform
        let mut audit = RowAudit::new(self.audit_row_counts);
        let cleaned = CleaningStage::run(merged, &mut audit).await?;
        let enriched = DerivationStage::new(self.year).run(cleaned, &mut audit).await?;

        // Load
        let output_rows = self.parquet_sink.write(enriched.clone()).await?;
        let outcome = self.load_relational(enriched).await?;

        let summary = RunSummary {
            year: self.year,
            partitions: partitions.len(),
            output_rows,
            parquet_path: self.parquet_sink.output_file(),
            relational_load: describe(&outcome),
            step_deltas: audit.into_deltas(),
            elapsed_ms: started.elapsed().as_millis(),
        };
        tracing::info!(
            "ETL finished: {} rows written, relational load {}",
            summary.output_rows,
            summary.relational_load
        );
        Ok(summary)
    }

    /// An unreachable store is logged and skipped; the Parquet output is
    /// already complete at this point.
    async fn load_relational(&self, df: DataFrame) -> EtlResult<LoadOutcome> {
        match self.loader.load(df).await {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_recoverable() => {
                tracing::error!("Error while connecting to MySQL: {}", e);
                Ok(LoadOutcome::SkippedUnreachable {
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }
}

fn describe(outcome: &LoadOutcome) -> String {
    match outcome {
        LoadOutcome::Loaded { rows } => format!("loaded {} rows", rows),
        LoadOutcome::SkippedTableExists => "skipped (table exists)".to_string(),
        LoadOutcome::SkippedUnreachable { reason } => format!("skipped (unreachable: {})", reason),
    }
}
