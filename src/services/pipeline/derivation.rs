use datafusion::arrow::datatypes::DataType;
use datafusion::error::Result as DataFusionResult;
use datafusion::functions::datetime::expr_fn::{date_part, to_char};
use datafusion::prelude::*;

use crate::models::trip::*;
use crate::services::pipeline::audit::RowAudit;
use crate::services::pipeline::error::EtlResult;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Appends calendar fields and trip metrics, then drops rows whose metrics
/// are implausible or whose pickup falls outside the target year.
pub struct DerivationStage {
    year: i32,
}

impl DerivationStage {
    pub fn new(year: i32) -> Self {
        Self { year }
    }

    pub async fn run(&self, df: DataFrame, audit: &mut RowAudit) -> EtlResult<DataFrame> {
        tracing::info!("Derivation stage started for year {}", self.year);
        let df = Self::with_calendar_fields(df)?;
        let df = audit.apply("drop_non_positive_duration", df, Self::with_duration).await?;
        let df = Self::with_rates(df)?;
        let df = audit
            .apply("drop_other_years", df, |df| self.keep_target_year(df))
            .await?;
        let df = audit.apply("drop_anomalies", df, Self::drop_anomalies).await?;
        let df = df.drop_columns(&[DROPOFF_DATETIME])?;
        tracing::info!("Derivation stage finished");
        Ok(df)
    }

    /// Pickup year/month/day/weekday/hour/quarter. Weekday is the short
    /// English name (`Sun`, `Mon`, ...).
    pub fn with_calendar_fields(df: DataFrame) -> DataFusionResult<DataFrame> {
        let pickup = || ident(PICKUP_DATETIME);
        let part = |name: &str| cast(date_part(lit(name), pickup()), DataType::Int32);

        df.with_column(PICKUP_YEAR, part("year"))?
            .with_column(PICKUP_MONTH, part("month"))?
            .with_column(PICKUP_DAY, part("day"))?
            .with_column(PICKUP_DAY_OF_WEEK, to_char(pickup(), lit("%a")))?
            .with_column(PICKUP_HOUR, part("hour"))?
            .with_column(PICKUP_QUARTER, part("quarter"))
    }

    /// Trip length in hours; zero and negative durations are dropped.
    pub fn with_duration(df: DataFrame) -> DataFusionResult<DataFrame> {
        let epoch = |column: &str| date_part(lit("epoch"), ident(column));
        let duration = (epoch(DROPOFF_DATETIME) - epoch(PICKUP_DATETIME)) / lit(SECONDS_PER_HOUR);

        df.with_column(DURATION_HRS, duration)?
            .filter(ident(DURATION_HRS).gt(lit(0.0)))
    }

    /// Speed in miles per hour and tip as a percentage of the total amount.
    pub fn with_rates(df: DataFrame) -> DataFusionResult<DataFrame> {
        df.with_column(SPEED_MHRS, ident(TRIP_DISTANCE) / ident(DURATION_HRS))?
            .with_column(
                TIP_RATE,
                ident(TIP_AMOUNT) / ident(TOTAL_AMOUNT) * lit(100.0),
            )
    }

    /// Late-year trips from the previous year's files and clock errors land
    /// outside the target year.
    pub fn keep_target_year(&self, df: DataFrame) -> DataFusionResult<DataFrame> {
        df.filter(ident(PICKUP_YEAR).eq(lit(self.year)))?
            .drop_columns(&[PICKUP_YEAR])
    }

    pub fn drop_anomalies(df: DataFrame) -> DataFusionResult<DataFrame> {
        df.filter(
            ident(TIP_RATE)
                .lt(lit(MAX_TIP_RATE))
                .and(ident(SPEED_MHRS).lt(lit(MAX_SPEED_MPH))),
        )
    }
}
