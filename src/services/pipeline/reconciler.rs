use std::path::Path;

use datafusion::arrow::datatypes::DataType;
use datafusion::common::ScalarValue;
use datafusion::prelude::*;

use crate::models::trip::AIRPORT_FEE;
use crate::services::pipeline::error::{EtlError, EtlResult};

/// Loads monthly partitions and unions them into one frame with a uniform
/// schema.
///
/// `airport_fee` is the one column whose physical type drifts between
/// months, so it is forced to Float64 in every partition before any union.
/// Every other column must already agree by name and type.
pub struct SchemaReconciler {
    ctx: SessionContext,
}

impl SchemaReconciler {
    pub fn new(ctx: SessionContext) -> Self {
        Self { ctx }
    }

    /// Read one partition and normalize its drift column.
    pub async fn load_partition(&self, path: &Path) -> EtlResult<DataFrame> {
        let location = path.to_string_lossy().to_string();
        let df = self
            .ctx
            .read_parquet(location.as_str(), ParquetReadOptions::default())
            .await
            .map_err(|e| EtlError::Schema(format!("Failed to read partition {}: {}", location, e)))?;

        Ok(Self::normalize_drift_column(df)?)
    }

    /// Cast `airport_fee` to Float64, or add it as an all-null Float64 column
    /// when the partition lacks it. Values that do not parse as numbers
    /// become null.
    pub fn normalize_drift_column(df: DataFrame) -> datafusion::error::Result<DataFrame> {
        let fee = if df.schema().has_column_with_unqualified_name(AIRPORT_FEE) {
            try_cast(ident(AIRPORT_FEE), DataType::Float64)
        } else {
            lit(ScalarValue::Float64(None))
        };
        df.with_column(AIRPORT_FEE, fee)
    }

    /// Load every partition and concatenate them in the given order.
    pub async fn merge<P: AsRef<Path>>(&self, paths: &[P]) -> EtlResult<DataFrame> {
        let mut partitions = Vec::with_capacity(paths.len());
        for path in paths {
            let df = self.load_partition(path.as_ref()).await?;
            partitions.push((path.as_ref().display().to_string(), df));
        }

        let mut iter = partitions.into_iter();
        let (first_name, first) = iter
            .next()
            .ok_or_else(|| EtlError::Schema("No partitions to merge".to_string()))?;

        let layout = ColumnLayout::of(&first);
        tracing::debug!("Reference layout from {}: {:?}", first_name, layout.names());
        let mut merged = layout.align(first)?;

        for (name, df) in iter {
            layout.check(&name, &df)?;
            let aligned = layout.align(df)?;
            merged = merged
                .union(aligned)
                .map_err(|e| EtlError::Schema(format!("Failed to union partition {}: {}", name, e)))?;
        }

        Ok(merged)
    }
}

/// Column names and types of the first partition, which every other
/// partition is aligned to.
#[derive(Debug)]
struct ColumnLayout {
    columns: Vec<(String, DataType)>,
}

impl ColumnLayout {
    fn of(df: &DataFrame) -> Self {
        let columns = df
            .schema()
            .fields()
            .iter()
            .map(|f| (f.name().clone(), f.data_type().clone()))
            .collect();
        Self { columns }
    }

    fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn check(&self, partition: &str, df: &DataFrame) -> EtlResult<()> {
        let schema = df.schema();
        if schema.fields().len() != self.columns.len() {
            return Err(EtlError::Schema(format!(
                "Partition {} has {} columns, expected {}",
                partition,
                schema.fields().len(),
                self.columns.len()
            )));
        }

        for (name, data_type) in &self.columns {
            let field = schema.field_with_unqualified_name(name).map_err(|_| {
                EtlError::Schema(format!("Partition {} is missing column {}", partition, name))
            })?;
            if field.data_type() != data_type {
                return Err(EtlError::Schema(format!(
                    "Partition {} stores {} as {}, expected {}",
                    partition,
                    name,
                    field.data_type(),
                    data_type
                )));
            }
        }
        Ok(())
    }

    /// Project columns into the reference order; union is positional.
    fn align(&self, df: DataFrame) -> EtlResult<DataFrame> {
        let exprs: Vec<Expr> = self.columns.iter().map(|(name, _)| ident(name.as_str())).collect();
        Ok(df.select(exprs)?)
    }
}
