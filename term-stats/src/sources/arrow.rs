//! Apache Arrow arrays as aggregation input.
//!
//! | Arrow type                         | Kind         |
//! |------------------------------------|--------------|
//! | `Int8` / `Int16` / `Int32` / `Int64` | `Byte` / `Short` / `Int` / `Long` |
//! | `UInt8` / `UInt16` / `UInt32`      | `Short` / `Int` / `Long` |
//! | `UInt64`                           | `BigInteger` |
//! | `Float32` / `Float64`              | `Float` / `Double` |
//! | `Decimal128`                       | `BigDecimal` |
//! | `Utf8` / `LargeUtf8` / `Utf8View`  | `String`     |
//! | `Boolean`                          | `Boolean`    |
//! | `Date32` / `Date64`                | `Date`       |
//! | `Timestamp` (any unit, zone dropped) | `DateTime` |
//! | `Null`                             | `Nothing`    |
//!
//! Unsigned integers are widened to the next signed kind so that no value
//! changes sign.

use ::arrow::array::{
    Array, BooleanArray, Date32Array, Date64Array, Decimal128Array, Float32Array, Float64Array,
    Int16Array, Int32Array, Int64Array, Int8Array, LargeStringArray, PrimitiveArray, StringArray,
    StringViewArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray, UInt16Array, UInt32Array, UInt64Array,
    UInt8Array,
};
use ::arrow::datatypes::{ArrowTemporalType, DataType, TimeUnit};
use ::arrow::record_batch::RecordBatch;
use num_bigint::BigInt;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::column::Column;
use crate::error::{Result, StatsError};
use crate::types::{Value, ValueKind, ValueType};

/// Converts an Arrow array into a column.
///
/// The column is nullable exactly when the array contains nulls.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use arrow::array::{ArrayRef, Int32Array};
/// use term_stats::sources::from_arrow;
/// use term_stats::types::{ValueKind, ValueType};
///
/// let array: ArrayRef = Arc::new(Int32Array::from(vec![Some(1), None, Some(3)]));
/// let column = from_arrow("id", array.as_ref()).unwrap();
/// assert_eq!(column.value_type(), ValueType::nullable_of(ValueKind::Int));
/// assert_eq!(column.null_count(), 1);
/// ```
pub fn from_arrow(name: &str, array: &dyn Array) -> Result<Column> {
    convert(name, array, array.null_count() > 0)
}

/// Converts every column of a record batch, keeping the schema's field names
/// and nullability.
#[instrument(skip(batch), fields(columns = batch.num_columns(), rows = batch.num_rows()))]
pub fn from_record_batch(batch: &RecordBatch) -> Result<Vec<Column>> {
    let schema = batch.schema();
    schema
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(field, array)| {
            convert(
                field.name(),
                array.as_ref(),
                field.is_nullable() || array.null_count() > 0,
            )
        })
        .collect()
}

fn convert(name: &str, array: &dyn Array, nullable: bool) -> Result<Column> {
    let (values, kind) = match array.data_type() {
        DataType::Int8 => (
            rows::<Int8Array, _>(array, |a, i| Ok(Value::Byte(a.value(i))))?,
            ValueKind::Byte,
        ),
        DataType::Int16 => (
            rows::<Int16Array, _>(array, |a, i| Ok(Value::Short(a.value(i))))?,
            ValueKind::Short,
        ),
        DataType::Int32 => (
            rows::<Int32Array, _>(array, |a, i| Ok(Value::Int(a.value(i))))?,
            ValueKind::Int,
        ),
        DataType::Int64 => (
            rows::<Int64Array, _>(array, |a, i| Ok(Value::Long(a.value(i))))?,
            ValueKind::Long,
        ),
        DataType::UInt8 => (
            rows::<UInt8Array, _>(array, |a, i| Ok(Value::Short(i16::from(a.value(i)))))?,
            ValueKind::Short,
        ),
        DataType::UInt16 => (
            rows::<UInt16Array, _>(array, |a, i| Ok(Value::Int(i32::from(a.value(i)))))?,
            ValueKind::Int,
        ),
        DataType::UInt32 => (
            rows::<UInt32Array, _>(array, |a, i| Ok(Value::Long(i64::from(a.value(i)))))?,
            ValueKind::Long,
        ),
        DataType::UInt64 => (
            rows::<UInt64Array, _>(array, |a, i| Ok(Value::BigInteger(BigInt::from(a.value(i)))))?,
            ValueKind::BigInteger,
        ),
        DataType::Float32 => (
            rows::<Float32Array, _>(array, |a, i| Ok(Value::Float(a.value(i))))?,
            ValueKind::Float,
        ),
        DataType::Float64 => (
            rows::<Float64Array, _>(array, |a, i| Ok(Value::Double(a.value(i))))?,
            ValueKind::Double,
        ),
        DataType::Decimal128(_, scale) => {
            let scale = u32::try_from(*scale).map_err(|_| {
                StatsError::unsupported(
                    "conversion",
                    array.data_type(),
                    "decimals with a negative scale are not supported",
                )
            })?;
            (
                rows::<Decimal128Array, _>(array, |a, i| {
                    Decimal::try_from_i128_with_scale(a.value(i), scale)
                        .map(Value::BigDecimal)
                        .map_err(|e| {
                            StatsError::overflow(format!("decimal {} does not fit: {e}", a.value(i)))
                        })
                })?,
                ValueKind::BigDecimal,
            )
        }
        DataType::Utf8 => (
            rows::<StringArray, _>(array, |a, i| Ok(Value::String(a.value(i).to_owned())))?,
            ValueKind::String,
        ),
        DataType::LargeUtf8 => (
            rows::<LargeStringArray, _>(array, |a, i| Ok(Value::String(a.value(i).to_owned())))?,
            ValueKind::String,
        ),
        DataType::Utf8View => (
            rows::<StringViewArray, _>(array, |a, i| Ok(Value::String(a.value(i).to_owned())))?,
            ValueKind::String,
        ),
        DataType::Boolean => (
            rows::<BooleanArray, _>(array, |a, i| Ok(Value::Boolean(a.value(i))))?,
            ValueKind::Boolean,
        ),
        DataType::Date32 => (
            rows::<Date32Array, _>(array, |a, i| {
                a.value_as_date(i).map(Value::Date).ok_or_else(|| out_of_range(array, i))
            })?,
            ValueKind::Date,
        ),
        DataType::Date64 => (
            rows::<Date64Array, _>(array, |a, i| {
                a.value_as_date(i).map(Value::Date).ok_or_else(|| out_of_range(array, i))
            })?,
            ValueKind::Date,
        ),
        DataType::Timestamp(unit, _) => {
            let values = match unit {
                TimeUnit::Second => rows::<TimestampSecondArray, _>(array, datetime)?,
                TimeUnit::Millisecond => rows::<TimestampMillisecondArray, _>(array, datetime)?,
                TimeUnit::Microsecond => rows::<TimestampMicrosecondArray, _>(array, datetime)?,
                TimeUnit::Nanosecond => rows::<TimestampNanosecondArray, _>(array, datetime)?,
            };
            (values, ValueKind::DateTime)
        }
        DataType::Null => (vec![None; array.len()], ValueKind::Nothing),
        other => {
            return Err(StatsError::unsupported(
                "conversion",
                other,
                "only integer, floating point, decimal, string, boolean, date and timestamp arrays are supported",
            ))
        }
    };

    let nullable = nullable || kind == ValueKind::Nothing;
    debug!(column = %name, kind = %kind, nullable, rows = values.len(), "converted arrow array");
    Column::new(name, values, ValueType::of(kind).with_nullability(nullable))
}

fn rows<A, F>(array: &dyn Array, mut value: F) -> Result<Vec<Option<Value>>>
where
    A: Array + 'static,
    F: FnMut(&A, usize) -> Result<Value>,
{
    let typed = array.as_any().downcast_ref::<A>().ok_or_else(|| {
        StatsError::invariant(format!(
            "array of type {} does not match its declared data type",
            array.data_type()
        ))
    })?;
    (0..typed.len())
        .map(|i| {
            if typed.is_null(i) {
                Ok(None)
            } else {
                value(typed, i).map(Some)
            }
        })
        .collect()
}

fn datetime<T>(array: &PrimitiveArray<T>, i: usize) -> Result<Value>
where
    T: ArrowTemporalType,
    i64: From<T::Native>,
{
    array
        .value_as_datetime(i)
        .map(Value::DateTime)
        .ok_or_else(|| out_of_range(array, i))
}

fn out_of_range(array: &dyn Array, i: usize) -> StatsError {
    StatsError::out_of_domain(format!(
        "row {i} of {} array is outside of the supported date range",
        array.data_type()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::arrow::array::{ArrayRef, NullArray};
    use ::arrow::datatypes::{Field, Schema};
    use chrono::NaiveDate;
    use std::sync::Arc;

    #[test]
    fn test_integer_arrays() {
        let array = Int64Array::from(vec![Some(1), None, Some(-3)]);
        let column = from_arrow("a", &array).unwrap();
        assert_eq!(column.value_type(), ValueType::nullable_of(ValueKind::Long));
        assert_eq!(
            column.values(),
            &[Some(Value::Long(1)), None, Some(Value::Long(-3))]
        );
    }

    #[test]
    fn test_unsigned_arrays_are_widened() {
        let column = from_arrow("a", &UInt8Array::from(vec![255u8])).unwrap();
        assert_eq!(column.values(), &[Some(Value::Short(255))]);

        let column = from_arrow("b", &UInt64Array::from(vec![u64::MAX])).unwrap();
        assert_eq!(column.value_type(), ValueType::of(ValueKind::BigInteger));
        assert_eq!(column.values(), &[Some(Value::BigInteger(BigInt::from(u64::MAX)))]);
    }

    #[test]
    fn test_decimal_array() {
        let array = Decimal128Array::from(vec![12345i128, -50])
            .with_precision_and_scale(10, 2)
            .unwrap();
        let column = from_arrow("price", &array).unwrap();
        assert_eq!(column.value_type(), ValueType::of(ValueKind::BigDecimal));
        assert_eq!(
            column.values(),
            &[
                Some(Value::BigDecimal(Decimal::new(12345, 2))),
                Some(Value::BigDecimal(Decimal::new(-50, 2)))
            ]
        );
    }

    #[test]
    fn test_temporal_arrays() {
        let column = from_arrow("d", &Date32Array::from(vec![0])).unwrap();
        assert_eq!(
            column.values(),
            &[Some(Value::Date(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()))]
        );

        let column = from_arrow("t", &TimestampMillisecondArray::from(vec![1_500])).unwrap();
        let expected = NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_milli_opt(0, 0, 1, 500)
            .unwrap();
        assert_eq!(column.values(), &[Some(Value::DateTime(expected))]);
    }

    #[test]
    fn test_null_array() {
        let column = from_arrow("n", &NullArray::new(2)).unwrap();
        assert_eq!(column.value_type(), ValueType::nullable_of(ValueKind::Nothing));
        assert_eq!(column.null_count(), 2);
    }

    #[test]
    fn test_unsupported_array() {
        let array = ::arrow::array::BinaryArray::from(vec![b"ab".as_ref()]);
        assert!(matches!(
            from_arrow("bin", &array),
            Err(StatsError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_record_batch() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("name", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![1, 2])) as ArrayRef,
                Arc::new(StringArray::from(vec!["x", "y"])) as ArrayRef,
            ],
        )
        .unwrap();

        let columns = from_record_batch(&batch).unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name(), "id");
        assert_eq!(columns[0].value_type(), ValueType::of(ValueKind::Int));
        assert_eq!(columns[1].value_type(), ValueType::nullable_of(ValueKind::String));
    }
}
