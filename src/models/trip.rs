//! Column names and validity bounds of the TLC yellow-taxi trip record.
//!
//! Raw partitions keep the TLC's own column spelling, so the cleaned table
//! loaded into MySQL does too (`PULocationID`, `RatecodeID`, ...).

/// Public mirror of the TLC trip record files.
pub const TLC_BASE_URL: &str = "https://s3.amazonaws.com/nyc-tlc/trip+data";

/// Relational table holding the cleaned trips.
pub const TRIPS_TABLE: &str = "nyc_yellow_taxi_trips";

pub const PICKUP_DATETIME: &str = "tpep_pickup_datetime";
pub const DROPOFF_DATETIME: &str = "tpep_dropoff_datetime";
pub const PASSENGER_COUNT: &str = "passenger_count";
pub const TRIP_DISTANCE: &str = "trip_distance";
pub const RATECODE_ID: &str = "RatecodeID";
pub const STORE_AND_FWD_FLAG: &str = "store_and_fwd_flag";
pub const PU_LOCATION_ID: &str = "PULocationID";
pub const DO_LOCATION_ID: &str = "DOLocationID";
pub const FARE_AMOUNT: &str = "fare_amount";
pub const EXTRA: &str = "extra";
pub const MTA_TAX: &str = "mta_tax";
pub const TIP_AMOUNT: &str = "tip_amount";
pub const TOLLS_AMOUNT: &str = "tolls_amount";
pub const TOTAL_AMOUNT: &str = "total_amount";
pub const CONGESTION_SURCHARGE: &str = "congestion_surcharge";

/// Stored as an integer in some monthly files and as a double (or not at
/// all) in others.
pub const AIRPORT_FEE: &str = "airport_fee";

pub const PICKUP_YEAR: &str = "pickup_year";
pub const PICKUP_MONTH: &str = "pickup_month";
pub const PICKUP_DAY: &str = "pickup_day";
pub const PICKUP_DAY_OF_WEEK: &str = "pickup_dayOfWeek";
pub const PICKUP_HOUR: &str = "pickup_hour";
pub const PICKUP_QUARTER: &str = "pickup_quarter";
pub const DURATION_HRS: &str = "duration_hrs";
pub const SPEED_MHRS: &str = "speed_mhrs";
pub const TIP_RATE: &str = "tip_rate";

/// Columns that are null together in the raw files; such rows are dropped.
pub const REQUIRED_NON_NULL: [&str; 4] = [
    PASSENGER_COUNT,
    RATECODE_ID,
    STORE_AND_FWD_FLAG,
    CONGESTION_SURCHARGE,
];

/// Monetary columns that may never be negative.
pub const NON_NEGATIVE_CHARGES: [&str; 4] = [TIP_AMOUNT, MTA_TAX, TOLLS_AMOUNT, EXTRA];

/// Taxi zone ids are enumerated 1..=263.
pub const MIN_LOCATION_ID: i64 = 1;
pub const MAX_LOCATION_ID: i64 = 263;

/// Initial meter charge; anything below is not a real fare.
pub const MIN_FARE: f64 = 2.50;

/// Exclusive upper bound on mph before a trip counts as a sensor error.
pub const MAX_SPEED_MPH: f64 = 125.0;

/// Exclusive upper bound on tip as a percentage of the total amount.
pub const MAX_TIP_RATE: f64 = 50.0;

/// File name of one monthly partition, e.g. `yellow_tripdata_2020-03.parquet`.
pub fn partition_file_name(year: i32, month: u32) -> String {
    format!("yellow_tripdata_{}-{:02}.parquet", year, month)
}
