use datafusion::error::Result as DataFusionResult;
use datafusion::prelude::*;

use crate::models::trip::*;
use crate::services::pipeline::audit::RowAudit;
use crate::services::pipeline::error::EtlResult;

/// Drops rows that cannot be trusted. Rows are never repaired.
pub struct CleaningStage;

impl CleaningStage {
    pub async fn run(df: DataFrame, audit: &mut RowAudit) -> EtlResult<DataFrame> {
        tracing::info!("Cleaning stage started");
        let df = audit.apply("drop_duplicates", df, Self::drop_duplicates).await?;
        let df = audit.apply("drop_airport_fee", df, Self::drop_drift_column).await?;
        let df = audit.apply("drop_incomplete", df, Self::drop_incomplete).await?;
        let df = audit.apply("drop_out_of_range", df, Self::drop_out_of_range).await?;
        tracing::info!("Cleaning stage finished");
        Ok(df)
    }

    /// Full-row duplicates collapse to one row.
    pub fn drop_duplicates(df: DataFrame) -> DataFusionResult<DataFrame> {
        df.distinct()
    }

    /// `airport_fee` is mostly null once reconciled.
    pub fn drop_drift_column(df: DataFrame) -> DataFusionResult<DataFrame> {
        df.drop_columns(&[AIRPORT_FEE])
    }

    pub fn drop_incomplete(df: DataFrame) -> DataFusionResult<DataFrame> {
        df.filter(all_of(REQUIRED_NON_NULL.iter().map(|c| ident(*c).is_not_null())))
    }

    pub fn drop_out_of_range(df: DataFrame) -> DataFusionResult<DataFrame> {
        let mut checks = vec![
            ident(PASSENGER_COUNT).gt(lit(0.0)),
            ident(TRIP_DISTANCE).gt(lit(0.0)),
            ident(PU_LOCATION_ID).between(lit(MIN_LOCATION_ID), lit(MAX_LOCATION_ID)),
            ident(DO_LOCATION_ID).between(lit(MIN_LOCATION_ID), lit(MAX_LOCATION_ID)),
            ident(FARE_AMOUNT).gt_eq(lit(MIN_FARE)),
            ident(TOTAL_AMOUNT).gt_eq(lit(MIN_FARE)),
        ];
        checks.extend(NON_NEGATIVE_CHARGES.iter().map(|c| ident(*c).gt_eq(lit(0.0))));
        df.filter(all_of(checks))
    }
}

/// AND together row predicates; an empty set keeps every row.
pub(crate) fn all_of(predicates: impl IntoIterator<Item = Expr>) -> Expr {
    predicates
        .into_iter()
        .reduce(Expr::and)
        .unwrap_or_else(|| lit(true))
}
