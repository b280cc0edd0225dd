// Arrow -> MySQL conversion
//
// Converts RecordBatch columns into mysql_async parameter values and maps Arrow
// data types onto MySQL column types for CREATE TABLE.

use chrono::{Datelike, NaiveDateTime, Timelike};
use datafusion::arrow::array::*;
use datafusion::arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use datafusion::arrow::record_batch::RecordBatch;
use mysql_async::Value as MySqlValue;

use crate::services::pipeline::error::{EtlError, EtlResult};

/// Converts Arrow columns and schemas to their MySQL counterparts
pub struct ArrowValueConverter;

impl ArrowValueConverter {
    /// MySQL column type for an Arrow field
    ///
    /// # Errors
    /// Returns `EtlError::Schema` for types the trips table never holds
    pub fn mysql_column_type(field: &Field) -> EtlResult<&'static str> {
        let sql_type = match field.data_type() {
            DataType::Boolean => "BOOLEAN",
            DataType::Int8 | DataType::Int16 | DataType::Int32 => "INT",
            DataType::Int64 => "BIGINT",
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 => "INT UNSIGNED",
            DataType::UInt64 => "BIGINT UNSIGNED",
            DataType::Float32 => "FLOAT",
            DataType::Float64 => "DOUBLE",
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => "TEXT",
            DataType::Date32 | DataType::Date64 => "DATE",
            DataType::Timestamp(_, _) => "DATETIME(6)",
            other => {
                return Err(EtlError::Schema(format!(
                    "Column {} has type {} which has no MySQL mapping",
                    field.name(),
                    other
                )))
            }
        };
        Ok(sql_type)
    }

    /// Column definitions for `CREATE TABLE`, in schema order
    pub fn column_definitions(schema: &Schema) -> EtlResult<Vec<String>> {
        schema
            .fields()
            .iter()
            .map(|field| {
                let nullability = if field.is_nullable() { "NULL" } else { "NOT NULL" };
                Ok(format!(
                    "`{}` {} {}",
                    field.name(),
                    Self::mysql_column_type(field)?,
                    nullability
                ))
            })
            .collect()
    }

    /// Convert one row of a batch into positional statement parameters
    pub fn row_values(batch: &RecordBatch, row_idx: usize) -> EtlResult<Vec<MySqlValue>> {
        batch
            .columns()
            .iter()
            .map(|column| Self::array_value_to_mysql(column, row_idx))
            .collect()
    }

    /// Convert a single array value to a MySQL value
    ///
    /// # Arguments
    /// * `array` - Arrow array containing the data
    /// * `row_idx` - Row index to extract
    fn array_value_to_mysql(array: &ArrayRef, row_idx: usize) -> EtlResult<MySqlValue> {
        // Handle NULL values
        if array.is_null(row_idx) {
            return Ok(MySqlValue::NULL);
        }

        let value = match array.data_type() {
            DataType::Boolean => {
                MySqlValue::Int(downcast::<BooleanArray>(array)?.value(row_idx) as i64)
            }

            // Integer types
            DataType::Int8 => MySqlValue::Int(downcast::<Int8Array>(array)?.value(row_idx) as i64),
            DataType::Int16 => MySqlValue::Int(downcast::<Int16Array>(array)?.value(row_idx) as i64),
            DataType::Int32 => MySqlValue::Int(downcast::<Int32Array>(array)?.value(row_idx) as i64),
            DataType::Int64 => MySqlValue::Int(downcast::<Int64Array>(array)?.value(row_idx)),

            // Unsigned integer types
            DataType::UInt8 => MySqlValue::UInt(downcast::<UInt8Array>(array)?.value(row_idx) as u64),
            DataType::UInt16 => MySqlValue::UInt(downcast::<UInt16Array>(array)?.value(row_idx) as u64),
            DataType::UInt32 => MySqlValue::UInt(downcast::<UInt32Array>(array)?.value(row_idx) as u64),
            DataType::UInt64 => MySqlValue::UInt(downcast::<UInt64Array>(array)?.value(row_idx)),

            // Floating point types
            DataType::Float32 => MySqlValue::Float(downcast::<Float32Array>(array)?.value(row_idx)),
            DataType::Float64 => MySqlValue::Double(downcast::<Float64Array>(array)?.value(row_idx)),

            // String types
            DataType::Utf8 => text(downcast::<StringArray>(array)?.value(row_idx)),
            DataType::LargeUtf8 => text(downcast::<LargeStringArray>(array)?.value(row_idx)),
            DataType::Utf8View => text(downcast::<StringViewArray>(array)?.value(row_idx)),

            // Date types
            DataType::Date32 => {
                let date = downcast::<Date32Array>(array)?.value_as_date(row_idx);
                date.map(|d| MySqlValue::Date(d.year() as u16, d.month() as u8, d.day() as u8, 0, 0, 0, 0))
                    .unwrap_or(MySqlValue::NULL)
            }
            DataType::Date64 => {
                let date = downcast::<Date64Array>(array)?.value_as_date(row_idx);
                date.map(|d| MySqlValue::Date(d.year() as u16, d.month() as u8, d.day() as u8, 0, 0, 0, 0))
                    .unwrap_or(MySqlValue::NULL)
            }

            // Timestamps are naive wall-clock values in the TLC files
            DataType::Timestamp(unit, _) => {
                let datetime = match unit {
                    TimeUnit::Second => downcast::<TimestampSecondArray>(array)?.value_as_datetime(row_idx),
                    TimeUnit::Millisecond => {
                        downcast::<TimestampMillisecondArray>(array)?.value_as_datetime(row_idx)
                    }
                    TimeUnit::Microsecond => {
                        downcast::<TimestampMicrosecondArray>(array)?.value_as_datetime(row_idx)
                    }
                    TimeUnit::Nanosecond => {
                        downcast::<TimestampNanosecondArray>(array)?.value_as_datetime(row_idx)
                    }
                };
                datetime.map(datetime_value).unwrap_or(MySqlValue::NULL)
            }

            other => {
                return Err(EtlError::Sink(format!(
                    "Unsupported column type for MySQL load: {}",
                    other
                )))
            }
        };

        Ok(value)
    }
}

fn downcast<A: Array + 'static>(array: &ArrayRef) -> EtlResult<&A> {
    array.as_any().downcast_ref::<A>().ok_or_else(|| {
        EtlError::Sink(format!(
            "Failed to downcast {} to {}",
            array.data_type(),
            std::any::type_name::<A>()
        ))
    })
}

fn text(value: &str) -> MySqlValue {
    MySqlValue::Bytes(value.as_bytes().to_vec())
}

fn datetime_value(dt: NaiveDateTime) -> MySqlValue {
    MySqlValue::Date(
        dt.year() as u16,
        dt.month() as u8,
        dt.day() as u8,
        dt.hour() as u8,
        dt.minute() as u8,
        dt.second() as u8,
        dt.nanosecond() / 1_000,
    )
}
