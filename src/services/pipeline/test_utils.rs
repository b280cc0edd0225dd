//! Trip-record fixtures shared by the pipeline tests.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDateTime;
use datafusion::arrow::array::*;
use datafusion::arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::parquet::arrow::ArrowWriter;
use datafusion::prelude::*;

use crate::models::trip::*;

/// How a fixture partition stores the drifting `airport_fee` column.
#[derive(Debug, Clone, Copy)]
pub enum AirportFeeColumn {
    Int32,
    Float64,
    /// Free text: `n/a` in the first row, `1.25` after it.
    Utf8,
    Absent,
}

/// One raw trip as it appears in a TLC monthly file.
#[derive(Debug, Clone)]
pub struct TripRow {
    pub pickup: &'static str,
    pub dropoff: &'static str,
    pub passenger_count: Option<f64>,
    pub trip_distance: f64,
    pub ratecode_id: Option<f64>,
    pub store_and_fwd_flag: Option<&'static str>,
    pub pu_location_id: i64,
    pub do_location_id: i64,
    pub fare_amount: f64,
    pub extra: f64,
    pub mta_tax: f64,
    pub tip_amount: f64,
    pub tolls_amount: f64,
    pub total_amount: f64,
    pub congestion_surcharge: Option<f64>,
}

impl TripRow {
    /// A clean half-hour trip on 2020-03-15: 2 miles, $12 total, $2 tip.
    pub fn reference() -> Self {
        Self {
            pickup: "2020-03-15T08:00:00",
            dropoff: "2020-03-15T08:30:00",
            passenger_count: Some(1.0),
            trip_distance: 2.0,
            ratecode_id: Some(1.0),
            store_and_fwd_flag: Some("N"),
            pu_location_id: 100,
            do_location_id: 200,
            fare_amount: 10.0,
            extra: 0.0,
            mta_tax: 0.0,
            tip_amount: 2.0,
            tolls_amount: 0.0,
            total_amount: 12.0,
            congestion_surcharge: Some(0.0),
        }
    }
}

pub fn ts_micros(s: &str) -> i64 {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .unwrap()
        .and_utc()
        .timestamp_micros()
}

pub fn trips_batch(rows: &[TripRow], fee: AirportFeeColumn) -> RecordBatch {
    let timestamp = DataType::Timestamp(TimeUnit::Microsecond, None);
    let mut fields = vec![
        Field::new("VendorID", DataType::Int64, true),
        Field::new(PICKUP_DATETIME, timestamp.clone(), true),
        Field::new(DROPOFF_DATETIME, timestamp, true),
        Field::new(PASSENGER_COUNT, DataType::Float64, true),
        Field::new(TRIP_DISTANCE, DataType::Float64, true),
        Field::new(RATECODE_ID, DataType::Float64, true),
        Field::new(STORE_AND_FWD_FLAG, DataType::Utf8, true),
        Field::new(PU_LOCATION_ID, DataType::Int64, true),
        Field::new(DO_LOCATION_ID, DataType::Int64, true),
        Field::new("payment_type", DataType::Int64, true),
        Field::new(FARE_AMOUNT, DataType::Float64, true),
        Field::new(EXTRA, DataType::Float64, true),
        Field::new(MTA_TAX, DataType::Float64, true),
        Field::new(TIP_AMOUNT, DataType::Float64, true),
        Field::new(TOLLS_AMOUNT, DataType::Float64, true),
        Field::new("improvement_surcharge", DataType::Float64, true),
        Field::new(TOTAL_AMOUNT, DataType::Float64, true),
        Field::new(CONGESTION_SURCHARGE, DataType::Float64, true),
    ];

    let f64_col = |f: fn(&TripRow) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let opt_f64_col = |f: fn(&TripRow) -> Option<f64>| -> ArrayRef {
        Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let i64_col = |f: fn(&TripRow) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let ts_col = |f: fn(&TripRow) -> &'static str| -> ArrayRef {
        Arc::new(TimestampMicrosecondArray::from(
            rows.iter().map(|r| ts_micros(f(r))).collect::<Vec<_>>(),
        ))
    };

    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(vec![2i64; rows.len()])),
        ts_col(|r| r.pickup),
        ts_col(|r| r.dropoff),
        opt_f64_col(|r| r.passenger_count),
        f64_col(|r| r.trip_distance),
        opt_f64_col(|r| r.ratecode_id),
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.store_and_fwd_flag).collect::<Vec<_>>(),
        )),
        i64_col(|r| r.pu_location_id),
        i64_col(|r| r.do_location_id),
        Arc::new(Int64Array::from(vec![1i64; rows.len()])),
        f64_col(|r| r.fare_amount),
        f64_col(|r| r.extra),
        f64_col(|r| r.mta_tax),
        f64_col(|r| r.tip_amount),
        f64_col(|r| r.tolls_amount),
        Arc::new(Float64Array::from(vec![0.3f64; rows.len()])),
        f64_col(|r| r.total_amount),
        opt_f64_col(|r| r.congestion_surcharge),
    ];

    match fee {
        AirportFeeColumn::Int32 => {
            fields.push(Field::new(AIRPORT_FEE, DataType::Int32, true));
            columns.push(Arc::new(Int32Array::from(vec![None::<i32>; rows.len()])));
        }
        AirportFeeColumn::Float64 => {
            fields.push(Field::new(AIRPORT_FEE, DataType::Float64, true));
            columns.push(Arc::new(Float64Array::from(vec![Some(1.25f64); rows.len()])));
        }
        AirportFeeColumn::Utf8 => {
            fields.push(Field::new(AIRPORT_FEE, DataType::Utf8, true));
            columns.push(Arc::new(StringArray::from(
                (0..rows.len())
                    .map(|i| if i == 0 { "n/a" } else { "1.25" })
                    .collect::<Vec<_>>(),
            )));
        }
        AirportFeeColumn::Absent => {}
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap()
}

pub fn trips_frame(ctx: &SessionContext, rows: &[TripRow]) -> DataFrame {
    ctx.read_batch(trips_batch(rows, AirportFeeColumn::Float64))
        .unwrap()
}

/// Write a fixture partition as a Parquet file.
pub fn write_partition(path: &Path, batch: &RecordBatch) {
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(batch).unwrap();
    writer.close().unwrap();
}

/// Collect a Float64 column of a frame, in frame order.
pub async fn f64_values(df: DataFrame, column: &str) -> Vec<f64> {
    let batches = df.select(vec![ident(column)]).unwrap().collect().await.unwrap();
    batches
        .iter()
        .flat_map(|batch| {
            let array = batch
                .column(0)
                .as_any()
                .downcast_ref::<Float64Array>()
                .unwrap()
                .clone();
            array.iter().map(|v| v.unwrap()).collect::<Vec<_>>()
        })
        .collect()
}

/// Collect an integer column of a frame as i64, in frame order.
pub async fn i64_values(df: DataFrame, column: &str) -> Vec<i64> {
    let df = df
        .select(vec![cast(ident(column), DataType::Int64).alias(column)])
        .unwrap();
    let batches = df.collect().await.unwrap();
    batches
        .iter()
        .flat_map(|batch| {
            let array = batch
                .column(0)
                .as_any()
                .downcast_ref::<Int64Array>()
                .unwrap()
                .clone();
            array.iter().map(|v| v.unwrap()).collect::<Vec<_>>()
        })
        .collect()
}

/// Collect a string column of a frame, whatever its string encoding.
pub async fn string_values(df: DataFrame, column: &str) -> Vec<String> {
    let df = df
        .select(vec![cast(ident(column), DataType::Utf8).alias(column)])
        .unwrap();
    let batches = df.collect().await.unwrap();
    batches
        .iter()
        .flat_map(|batch| {
            let array = batch
                .column(0)
                .as_any()
                .downcast_ref::<StringArray>()
                .unwrap()
                .clone();
            array
                .iter()
                .map(|v| v.unwrap().to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}
