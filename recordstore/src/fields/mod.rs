// Field helpers - declare schema kinds and tag concrete values for storage

use crate::error::{Result, StoreError};
use crate::kind::{parse_numeric_text, KindTag};
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Output of a field helper: the bare kind (no argument given) or a value
/// ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Kind(KindTag),
    Value(Value),
}

impl Field {
    /// The kind tag, if this is a schema declaration.
    pub fn kind(&self) -> Option<KindTag> {
        match self {
            Field::Kind(tag) => Some(*tag),
            Field::Value(_) => None,
        }
    }

    /// Unwrap the stored value. A bare kind tag is not a value.
    pub fn into_value(self) -> Result<Value> {
        match self {
            Field::Value(value) => Ok(value),
            Field::Kind(tag) => Err(StoreError::SchemaType(format!(
                "expected a value, got the '{tag}' kind tag"
            ))),
        }
    }
}

impl From<KindTag> for Field {
    fn from(tag: KindTag) -> Self {
        Field::Kind(tag)
    }
}

/// Broken-down local date and time.
///
/// `month` is zero-based and `day` is the day of the week (0 = Sunday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateValue {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub millisec: u32,
}

impl From<NaiveDateTime> for DateValue {
    fn from(dt: NaiveDateTime) -> Self {
        DateValue {
            year: dt.year(),
            month: dt.month0(),
            day: dt.weekday().num_days_from_sunday(),
            hours: dt.hour(),
            minutes: dt.minute(),
            seconds: dt.second(),
            // Leap-second nanos can exceed 999_999_999
            millisec: (dt.nanosecond() / 1_000_000).min(999),
        }
    }
}

/// Text field. Fails when given anything but a JSON string.
pub fn string(value: Option<Value>) -> Result<Field> {
    match value {
        None => Ok(Field::Kind(KindTag::String)),
        Some(Value::String(s)) => Ok(Field::Value(Value::String(s))),
        Some(other) => Err(StoreError::SchemaType(format!("Not a string: {other}"))),
    }
}

/// Single-character field. The argument is stored as given, unchecked.
pub fn char(value: Option<Value>) -> Field {
    match value {
        None => Field::Kind(KindTag::Char),
        Some(v) => Field::Value(v),
    }
}

/// Numeric field. Numbers pass through; numeric text, booleans and null are
/// coerced the way a loose numeric conversion would.
pub fn number(value: Option<Value>) -> Result<Field> {
    let value = match value {
        None => return Ok(Field::Kind(KindTag::Number)),
        Some(v) => v,
    };

    let n = match &value {
        Value::Number(_) => return Ok(Field::Value(value)),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::String(s) => parse_numeric_text(s).unwrap_or(f64::NAN),
        _ => f64::NAN,
    };

    number_value(n)
        .map(Field::Value)
        .ok_or_else(|| StoreError::SchemaType(format!("Cannot coerce {value} to a number")))
}

/// Date field, broken down into a [`DateValue`].
pub fn date(value: Option<NaiveDateTime>) -> Field {
    match value {
        None => Field::Kind(KindTag::Date),
        Some(dt) => Field::Value(date_value_to_json(DateValue::from(dt))),
    }
}

/// Error field, stored as `{"message": ...}`.
pub fn error(value: Option<&dyn std::error::Error>) -> Field {
    match value {
        None => Field::Kind(KindTag::Error),
        Some(err) => {
            let mut obj = serde_json::Map::new();
            obj.insert("message".into(), Value::String(err.to_string()));
            Field::Value(Value::Object(obj))
        }
    }
}

/// Integral values become JSON integers so `30` stays `30` on disk.
fn number_value(n: f64) -> Option<Value> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        return Some(Value::Number(Number::from(n as i64)));
    }
    Number::from_f64(n).map(Value::Number)
}

fn date_value_to_json(date: DateValue) -> Value {
    serde_json::json!({
        "year": date.year,
        "month": date.month,
        "day": date.day,
        "hours": date.hours,
        "minutes": date.minutes,
        "seconds": date.seconds,
        "millisec": date.millisec,
    })
}
