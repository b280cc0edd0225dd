use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::api::middleware::AppError;
use crate::models::insights::{MaxTipResponse, TripSpeedsResponse};
use crate::services::insights::TripInsights;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub insights: Arc<dyn TripInsights>,
    /// The only year present in the trips table.
    pub year: i32,
}

impl AppState {
    fn check_year(&self, year: i32) -> Result<(), AppError> {
        if year != self.year {
            return Err(AppError::NotFound(format!(
                "No trips loaded for year {}",
                year
            )));
        }
        Ok(())
    }
}

fn check_range(name: &str, value: u32, min: u32, max: u32) -> Result<(), AppError> {
    if !(min..=max).contains(&value) {
        return Err(AppError::Validation(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

/// Highest tip rate of a quarter and where that trip ended
pub async fn max_tip(
    State(state): State<AppState>,
    Path((year, quarter)): Path<(i32, u32)>,
) -> Result<Json<MaxTipResponse>, AppError> {
    tracing::info!("Max tip for {} Q{}", year, quarter);
    state.check_year(year)?;
    check_range("quarter", quarter, 1, 4)?;

    let top = state
        .insights
        .max_tip(quarter)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No trips for {} Q{}", year, quarter)))?;

    Ok(Json(MaxTipResponse::from(top)))
}

/// Per-hour maximum speed on one day
pub async fn max_speed(
    State(state): State<AppState>,
    Path((year, month, day)): Path<(i32, u32, u32)>,
) -> Result<Json<TripSpeedsResponse>, AppError> {
    tracing::info!("Max speed by hour for {}-{:02}-{:02}", year, month, day);
    state.check_year(year)?;
    check_range("month", month, 1, 12)?;
    check_range("day", day, 1, 31)?;

    let trip_speeds = state.insights.max_speed_by_hour(month, day).await?;
    Ok(Json(TripSpeedsResponse { trip_speeds }))
}
