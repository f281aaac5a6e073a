//! DuckDB cell values shaped into transport-safe JSON.

use chrono::{DateTime, NaiveDate, NaiveTime};
use duckdb::types::{TimeUnit, ValueRef};
use serde_json::Value;

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;
const MICROS_PER_SEC: i64 = 1_000_000;

pub(crate) fn value_ref_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(v) => Value::Bool(v),
        ValueRef::TinyInt(v) => Value::from(v),
        ValueRef::SmallInt(v) => Value::from(v),
        ValueRef::Int(v) => Value::from(v),
        ValueRef::BigInt(v) => Value::from(v),
        ValueRef::HugeInt(v) => i64::try_from(v)
            .map_or_else(|_| Value::String(v.to_string()), Value::from),
        ValueRef::UTinyInt(v) => Value::from(v),
        ValueRef::USmallInt(v) => Value::from(v),
        ValueRef::UInt(v) => Value::from(v),
        ValueRef::UBigInt(v) => Value::from(v),
        ValueRef::Float(v) => float_to_json(f64::from(v)),
        ValueRef::Double(v) => float_to_json(v),
        ValueRef::Decimal(v) => Value::String(v.to_string()),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Timestamp(unit, v) => timestamp_to_json(unit, v),
        ValueRef::Date32(days) => date_to_json(days),
        ValueRef::Time64(unit, v) => time_to_json(unit, v),
        other => Value::String(format!("{other:?}")),
    }
}

fn float_to_json(value: f64) -> Value {
    // NaN and infinities have no JSON representation.
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(MICROS_PER_SEC),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

fn timestamp_to_json(unit: TimeUnit, value: i64) -> Value {
    let micros = to_micros(unit, value);
    DateTime::from_timestamp_micros(micros).map_or_else(
        || Value::from(micros),
        |ts| Value::String(ts.naive_utc().to_string()),
    )
}

fn date_to_json(days_since_epoch: i32) -> Value {
    days_since_epoch
        .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .map_or_else(
            || Value::from(days_since_epoch),
            |date| Value::String(date.to_string()),
        )
}

fn time_to_json(unit: TimeUnit, value: i64) -> Value {
    let micros = to_micros(unit, value);
    let secs = u32::try_from(micros / MICROS_PER_SEC).unwrap_or_default();
    let nanos = u32::try_from((micros % MICROS_PER_SEC) * 1_000).unwrap_or_default();
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos).map_or_else(
        || Value::from(micros),
        |time| Value::String(time.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_round_trip() {
        assert_eq!(value_ref_to_json(ValueRef::Null), Value::Null);
        assert_eq!(value_ref_to_json(ValueRef::Boolean(true)), Value::Bool(true));
        assert_eq!(value_ref_to_json(ValueRef::BigInt(-7)), Value::from(-7));
        assert_eq!(value_ref_to_json(ValueRef::UBigInt(7)), Value::from(7u64));
        assert_eq!(
            value_ref_to_json(ValueRef::Text(b"hello")),
            Value::String("hello".to_string())
        );
    }

    #[test]
    fn hugeint_falls_back_to_string_outside_i64() {
        let big = i128::from(i64::MAX) + 1;
        assert_eq!(
            value_ref_to_json(ValueRef::HugeInt(big)),
            Value::String(big.to_string())
        );
        assert_eq!(value_ref_to_json(ValueRef::HugeInt(12)), Value::from(12));
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(value_ref_to_json(ValueRef::Double(f64::NAN)), Value::Null);
        assert_eq!(
            value_ref_to_json(ValueRef::Double(2.5)),
            Value::from(2.5_f64)
        );
    }

    #[test]
    fn extreme_dates_fall_back_to_the_raw_day_count() {
        assert_eq!(
            value_ref_to_json(ValueRef::Date32(i32::MAX)),
            Value::from(i32::MAX)
        );
        assert_eq!(
            value_ref_to_json(ValueRef::Date32(i32::MIN)),
            Value::from(i32::MIN)
        );
    }

    #[test]
    fn temporal_values_render_as_iso_strings() {
        assert_eq!(
            value_ref_to_json(ValueRef::Date32(0)),
            Value::String("1970-01-01".to_string())
        );
        assert_eq!(
            value_ref_to_json(ValueRef::Time64(TimeUnit::Second, 61)),
            Value::String("00:01:01".to_string())
        );
        assert_eq!(
            value_ref_to_json(ValueRef::Timestamp(TimeUnit::Second, 0)),
            Value::String("1970-01-01 00:00:00".to_string())
        );
    }
}
