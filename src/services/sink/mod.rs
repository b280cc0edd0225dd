// Output sinks for the enriched trips
//
// Parquet is always written first; the relational load runs after it and may
// be skipped without failing the run.

pub mod mysql;
pub mod parquet;

pub use mysql::{LoadOutcome, MySqlLoader, RelationalLoader};
pub use parquet::{ParquetSink, OUTPUT_FILE_NAME};
