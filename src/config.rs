use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::models::trip::{TLC_BASE_URL, TRIPS_TABLE};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub output: OutputConfig,
    pub database: DatabaseConfig,
    pub engine: EngineConfig,
    pub pipeline: PipelineConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub year: i32,
    pub months: Vec<u32>,
    pub base_url: String,
    pub cache_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub parquet_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub table: String,
    pub insert_batch_rows: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub batch_size: usize,
    pub target_partitions: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub audit_row_counts: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Try to load from .env file
        let _ = dotenv::dotenv();

        let all_months: Vec<i64> = (1..=12).collect();
        let mut builder = config::Config::builder()
            .set_default("dataset.year", 2020)?
            .set_default("dataset.months", all_months)?
            .set_default("dataset.base_url", TLC_BASE_URL)?
            .set_default("dataset.cache_dir", "./data")?
            .set_default("output.parquet_dir", "./transformed_data")?
            .set_default("database.url", "mysql://root@localhost:3306/nyc_yellow_taxi")?
            .set_default("database.table", TRIPS_TABLE)?
            .set_default("database.insert_batch_rows", 1000)?
            .set_default("engine.batch_size", 8192)?
            .set_default("engine.target_partitions", num_cpus::get() as i64)?
            .set_default("pipeline.audit_row_counts", false)?
            .set_default("server.host", "localhost")?
            .set_default("server.port", 8000)?
            .set_default("logging.level", "info")?;

        // Load from environment variables
        if let Ok(year) = env::var("TAXI_YEAR") {
            let year = year
                .parse::<i64>()
                .map_err(|e| config::ConfigError::Message(format!("TAXI_YEAR: {}", e)))?;
            builder = builder.set_override("dataset.year", year)?;
        }

        if let Ok(months) = env::var("TAXI_MONTHS") {
            builder = builder.set_override("dataset.months", parse_months(&months)?)?;
        }

        if let Ok(base_url) = env::var("TAXI_BASE_URL") {
            builder = builder.set_override("dataset.base_url", base_url)?;
        }

        if let Ok(cache_dir) = env::var("TAXI_CACHE_DIR") {
            builder = builder.set_override("dataset.cache_dir", cache_dir)?;
        }

        if let Ok(output_dir) = env::var("TAXI_OUTPUT_DIR") {
            builder = builder.set_override("output.parquet_dir", output_dir)?;
        }

        if let Ok(database_url) = env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", database_url)?;
        }

        if let Ok(table) = env::var("TAXI_TABLE") {
            builder = builder.set_override("database.table", table)?;
        }

        if let Ok(audit) = env::var("TAXI_AUDIT") {
            let enabled = matches!(audit.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
            builder = builder.set_override("pipeline.audit_row_counts", enabled)?;
        }

        if let Ok(host) = env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port.parse::<u16>().unwrap_or(8000))?;
        }

        if let Ok(log_level) = env::var("RUST_LOG") {
            builder = builder.set_override("logging.level", log_level)?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if !(2009..=2100).contains(&self.dataset.year) {
            return Err(config::ConfigError::Message(format!(
                "dataset.year {} is outside the published TLC range",
                self.dataset.year
            )));
        }
        if self.dataset.months.is_empty() {
            return Err(config::ConfigError::Message(
                "dataset.months must name at least one month".to_string(),
            ));
        }
        if let Some(bad) = self.dataset.months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(config::ConfigError::Message(format!(
                "dataset.months contains invalid month {}",
                bad
            )));
        }
        if !is_plain_identifier(&self.database.table) {
            return Err(config::ConfigError::Message(format!(
                "database.table '{}' must be a plain identifier",
                self.database.table
            )));
        }
        if self.database.insert_batch_rows == 0 {
            return Err(config::ConfigError::Message(
                "database.insert_batch_rows must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_months(raw: &str) -> Result<Vec<i64>, config::ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|e| config::ConfigError::Message(format!("TAXI_MONTHS '{}': {}", s, e)))
        })
        .collect()
}

/// Table names are interpolated into DDL, so only `[A-Za-z0-9_]` is allowed.
pub fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        // Clear environment variables for this test
        env::remove_var("TAXI_YEAR");
        env::remove_var("TAXI_MONTHS");
        env::remove_var("TAXI_TABLE");
        env::remove_var("HOST");
        env::remove_var("PORT");

        let config = Config::from_env();
        assert!(config.is_ok());

        let config = config.unwrap();
        assert_eq!(config.dataset.year, 2020);
        assert_eq!(config.dataset.months, (1..=12).collect::<Vec<u32>>());
        assert_eq!(config.database.table, "nyc_yellow_taxi_trips");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server_address(), "localhost:8000");
    }

    #[test]
    fn test_parse_months() {
        assert_eq!(parse_months("1, 2,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_months("4,").unwrap(), vec![4]);
        assert!(parse_months("jan").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_month_and_table() {
        let mut config = Config::from_env().unwrap();
        config.dataset.months = vec![0, 13];
        assert!(config.validate().is_err());

        let mut config = Config::from_env().unwrap();
        config.database.table = "trips; DROP TABLE x".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_plain_identifier() {
        assert!(is_plain_identifier("nyc_yellow_taxi_trips"));
        assert!(!is_plain_identifier(""));
        assert!(!is_plain_identifier("a-b"));
        assert!(!is_plain_identifier("a`b"));
    }
}
