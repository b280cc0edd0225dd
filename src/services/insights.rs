// Read-only queries over the loaded trips table
use mysql_async::{prelude::*, Conn, Pool};

use crate::config::DatabaseConfig;
use crate::models::insights::{round_to, HourlySpeed, TopTip};
use crate::models::trip::*;
use crate::services::pipeline::error::{EtlError, EtlResult};
use crate::services::sink::mysql::{create_pool, mask_credentials};

/// Aggregates served by the query API.
#[async_trait::async_trait]
pub trait TripInsights: Send + Sync {
    /// Trip with the highest tip rate among pickups in `quarter`.
    async fn max_tip(&self, quarter: u32) -> EtlResult<Option<TopTip>>;

    /// Highest speed per pickup hour on `month`/`day`, ordered by hour.
    async fn max_speed_by_hour(&self, month: u32, day: u32) -> EtlResult<Vec<HourlySpeed>>;
}

pub struct MySqlInsights {
    pool: Pool,
    connection_url: String,
    table: String,
}

impl MySqlInsights {
    pub fn new(config: &DatabaseConfig) -> EtlResult<Self> {
        Ok(Self {
            pool: create_pool(&config.url)?,
            connection_url: config.url.clone(),
            table: config.table.clone(),
        })
    }

    async fn get_conn(&self) -> EtlResult<Conn> {
        self.pool.get_conn().await.map_err(|e| {
            EtlError::Connection(format!(
                "Failed to connect to {}: {}",
                mask_credentials(&self.connection_url),
                e
            ))
        })
    }
}

#[async_trait::async_trait]
impl TripInsights for MySqlInsights {
    async fn max_tip(&self, quarter: u32) -> EtlResult<Option<TopTip>> {
        let mut conn = self.get_conn().await?;
        let row: Option<(i64, f64)> = conn
            .exec_first(max_tip_sql(&self.table), (quarter,))
            .await
            .map_err(|e| EtlError::Load(format!("Tip query failed: {}", e)))?;

        Ok(row.map(|(do_location_id, tip_rate)| TopTip {
            do_location_id,
            tip_rate,
        }))
    }

    async fn max_speed_by_hour(&self, month: u32, day: u32) -> EtlResult<Vec<HourlySpeed>> {
        let mut conn = self.get_conn().await?;
        let rows: Vec<(i32, f64)> = conn
            .exec(max_speed_sql(&self.table), (month, day))
            .await
            .map_err(|e| EtlError::Load(format!("Speed query failed: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|(hour, speed)| HourlySpeed {
                hour,
                max_speed: round_to(speed, 0),
            })
            .collect())
    }
}

fn max_tip_sql(table: &str) -> String {
    format!(
        "SELECT `{}`, `{}` FROM `{}` WHERE `{}` = ? ORDER BY `{}` DESC LIMIT 1",
        DO_LOCATION_ID, TIP_RATE, table, PICKUP_QUARTER, TIP_RATE
    )
}

fn max_speed_sql(table: &str) -> String {
    format!(
        "SELECT `{hour}`, MAX(`{speed}`) FROM `{table}` \
         WHERE `{month}` = ? AND `{day}` = ? GROUP BY `{hour}` ORDER BY `{hour}`",
        hour = PICKUP_HOUR,
        speed = SPEED_MHRS,
        table = table,
        month = PICKUP_MONTH,
        day = PICKUP_DAY,
    )
}
