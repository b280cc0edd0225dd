use std::path::PathBuf;

use datafusion::arrow::array::{Array, UInt64Array};
use datafusion::dataframe::DataFrameWriteOptions;
use datafusion::logical_expr::SortExpr;
use datafusion::prelude::*;

use crate::services::pipeline::error::{EtlError, EtlResult};

/// Name of the single data file inside the output directory.
pub const OUTPUT_FILE_NAME: &str = "trips.parquet";

/// Writes the final trips as Parquet, replacing whatever a previous run left.
pub struct ParquetSink {
    output_dir: PathBuf,
}

impl ParquetSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_file(&self) -> PathBuf {
        self.output_dir.join(OUTPUT_FILE_NAME)
    }

    /// Overwrite the output directory with `df` and return the row count.
    ///
    /// Rows are unique after cleaning, so sorting on every column gives one
    /// total order and re-runs over the same input write the same bytes.
    pub async fn write(&self, df: DataFrame) -> EtlResult<usize> {
        self.reset_output_dir().await?;

        let sort_keys: Vec<SortExpr> = df
            .schema()
            .fields()
            .iter()
            .map(|f| ident(f.name().as_str()).sort(true, true))
            .collect();
        let df = df.sort(sort_keys)?;

        let target = self.output_file();
        let location = target.to_string_lossy().to_string();
        tracing::info!("Writing Parquet output to {}", target.display());

        let batches = df
            .write_parquet(
                &location,
                DataFrameWriteOptions::new().with_single_file_output(true),
                None,
            )
            .await
            .map_err(|e| EtlError::Sink(format!("Failed to write {}: {}", target.display(), e)))?;

        let rows = batches
            .first()
            .filter(|b| b.num_columns() > 0)
            .and_then(|b| b.column(0).as_any().downcast_ref::<UInt64Array>().cloned())
            .filter(|counts| !counts.is_empty())
            .map(|counts| counts.value(0) as usize)
            .unwrap_or(0);

        tracing::info!("Wrote {} rows to {}", rows, target.display());
        Ok(rows)
    }

    async fn reset_output_dir(&self) -> EtlResult<()> {
        if tokio::fs::try_exists(&self.output_dir).await? {
            tracing::debug!("Removing previous output {}", self.output_dir.display());
            tokio::fs::remove_dir_all(&self.output_dir).await?;
        }
        tokio::fs::create_dir_all(&self.output_dir).await?;
        Ok(())
    }
}
