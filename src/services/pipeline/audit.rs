use datafusion::error::Result as DataFusionResult;
use datafusion::prelude::DataFrame;
use serde::Serialize;

use crate::services::pipeline::error::EtlResult;

/// Rows kept and dropped by one named pipeline step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepDelta {
    pub step: String,
    pub rows_before: usize,
    pub rows_after: usize,
}

impl StepDelta {
    pub fn dropped(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

/// Applies pipeline steps and, when enabled, records how many rows each one
/// removed.
///
/// Counting forces the plan to execute, so a disabled audit only applies the
/// steps and never touches the data.
#[derive(Debug, Default)]
pub struct RowAudit {
    enabled: bool,
    last_count: Option<usize>,
    deltas: Vec<StepDelta>,
}

impl RowAudit {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last_count: None,
            deltas: Vec::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Run `step` on `df`, recording the row delta if auditing.
    pub async fn apply<F>(&mut self, name: &str, df: DataFrame, step: F) -> EtlResult<DataFrame>
    where
        F: FnOnce(DataFrame) -> DataFusionResult<DataFrame>,
    {
        if !self.enabled {
            return Ok(step(df)?);
        }

        let rows_before = match self.last_count {
            Some(count) => count,
            None => df.clone().count().await?,
        };
        let next = step(df)?;
        let rows_after = next.clone().count().await?;

        let delta = StepDelta {
            step: name.to_string(),
            rows_before,
            rows_after,
        };
        tracing::info!(
            step = %delta.step,
            rows_before = delta.rows_before,
            rows_after = delta.rows_after,
            dropped = delta.dropped(),
            "Pipeline step applied"
        );

        self.last_count = Some(rows_after);
        self.deltas.push(delta);
        Ok(next)
    }

    pub fn deltas(&self) -> &[StepDelta] {
        &self.deltas
    }

    pub fn into_deltas(self) -> Vec<StepDelta> {
        self.deltas
    }
}
