//! Field values and their wire representation.
//!
//! Record fields are read into and written from [`FieldValue`], a small
//! dynamic value type. Scalar Rust field types implement [`FieldType`];
//! record-valued fields are converted by the [`Schema`](crate::Schema)
//! declaration methods that create them.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::descriptor::ValueType;
use crate::error::{Error, ErrorKind, Result};
use crate::record::{AnyRecord, Record};

/// Canonical wire format for datetimes, e.g. `2024-01-15T10:30:00.000+0000`.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

const DATETIME_FORMAT_MICROS: &str = "%Y-%m-%dT%H:%M:%S%.6f%z";
const DATETIME_FORMAT_NANOS: &str = "%Y-%m-%dT%H:%M:%S%.9f%z";
// Any number of fractional digits.
const DATETIME_FORMAT_ANY: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Wire format for dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Id of another record, held by a lookup field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Reference(pub String);

impl Reference {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A field value in transit between a record and a wire document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Reference(String),
    Record(AnyRecord),
    Records(Vec<AnyRecord>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Integer(_) => "integer",
            FieldValue::Double(_) => "double",
            FieldValue::String(_) => "string",
            FieldValue::DateTime(_) => "datetime",
            FieldValue::Date(_) => "date",
            FieldValue::Reference(_) => "reference",
            FieldValue::Record(_) => "record",
            FieldValue::Records(_) => "record collection",
        }
    }

    /// Wire form of a non-record value.
    ///
    /// Record values are handled by the serializer, which needs descriptors.
    pub(crate) fn scalar_to_wire(&self) -> Value {
        match self {
            FieldValue::Null | FieldValue::Record(_) | FieldValue::Records(_) => Value::Null,
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Double(d) => Value::from(*d),
            FieldValue::String(s) | FieldValue::Reference(s) => Value::String(s.clone()),
            FieldValue::DateTime(dt) => Value::String(format_datetime(dt)),
            FieldValue::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
        }
    }
}

pub(crate) fn mismatch(expected: &'static str, found: &FieldValue) -> Error {
    Error::new(ErrorKind::TypeMismatch {
        field: None,
        expected,
        found: found.type_name().to_string(),
    })
}

pub(crate) fn wire_mismatch(expected: &'static str, found: &Value) -> Error {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    Error::new(ErrorKind::TypeMismatch {
        field: None,
        expected,
        found: found.to_string(),
    })
}

/// Format a datetime in the canonical wire format.
///
/// Sub-millisecond values keep their precision with six or nine
/// fractional digits, so they parse back unchanged.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    let format = match value.timestamp_subsec_nanos() {
        nanos if nanos % 1_000_000 == 0 => DATETIME_FORMAT,
        nanos if nanos % 1_000 == 0 => DATETIME_FORMAT_MICROS,
        _ => DATETIME_FORMAT_NANOS,
    };
    value.format(format).to_string()
}

/// Parse a datetime in the canonical wire format at any fractional
/// precision, or RFC 3339.
pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_str(value, DATETIME_FORMAT)
        .or_else(|_| DateTime::parse_from_str(value, DATETIME_FORMAT_ANY))
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::with_source(ErrorKind::InvalidDateTime(value.to_string()), e))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| Error::with_source(ErrorKind::InvalidDateTime(value.to_string()), e))
}

/// Convert a non-null, non-record wire value according to its declared type.
pub(crate) fn scalar_from_wire(value_type: &ValueType, wire: &Value) -> Result<FieldValue> {
    match value_type {
        ValueType::Boolean => wire
            .as_bool()
            .map(FieldValue::Boolean)
            .ok_or_else(|| wire_mismatch("boolean", wire)),
        ValueType::Integer => match wire.as_i64() {
            Some(i) => Ok(FieldValue::Integer(i)),
            // Number fields come back as `5.0` from some endpoints.
            None => match wire.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(FieldValue::Integer(f as i64))
                }
                _ => Err(wire_mismatch("integer", wire)),
            },
        },
        ValueType::Double => wire
            .as_f64()
            .map(FieldValue::Double)
            .ok_or_else(|| wire_mismatch("double", wire)),
        ValueType::String => wire
            .as_str()
            .map(|s| FieldValue::String(s.to_string()))
            .ok_or_else(|| wire_mismatch("string", wire)),
        ValueType::Reference => wire
            .as_str()
            .map(|s| FieldValue::Reference(s.to_string()))
            .ok_or_else(|| wire_mismatch("reference id", wire)),
        ValueType::DateTime => {
            let s = wire.as_str().ok_or_else(|| wire_mismatch("datetime", wire))?;
            parse_datetime(s).map(FieldValue::DateTime)
        }
        ValueType::Date => {
            let s = wire.as_str().ok_or_else(|| wire_mismatch("date", wire))?;
            parse_date(s).map(FieldValue::Date)
        }
        ValueType::Record(_) | ValueType::RecordCollection(_) | ValueType::Attributes => {
            Err(wire_mismatch("scalar", wire))
        }
    }
}

/// A scalar Rust type that can back a mapped field.
pub trait FieldType: Sized + Send + Sync + 'static {
    /// The semantic type recorded in the field descriptor.
    fn value_type() -> ValueType;

    fn into_value(self) -> FieldValue;

    fn from_value(value: FieldValue) -> Result<Self>;
}

impl FieldType for bool {
    fn value_type() -> ValueType {
        ValueType::Boolean
    }

    fn into_value(self) -> FieldValue {
        FieldValue::Boolean(self)
    }

    fn from_value(value: FieldValue) -> Result<Self> {
        match value {
            FieldValue::Boolean(b) => Ok(b),
            other => Err(mismatch("boolean", &other)),
        }
    }
}

impl FieldType for i64 {
    fn value_type() -> ValueType {
        ValueType::Integer
    }

    fn into_value(self) -> FieldValue {
        FieldValue::Integer(self)
    }

    fn from_value(value: FieldValue) -> Result<Self> {
        match value {
            FieldValue::Integer(i) => Ok(i),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl FieldType for i32 {
    fn value_type() -> ValueType {
        ValueType::Integer
    }

    fn into_value(self) -> FieldValue {
        FieldValue::Integer(i64::from(self))
    }

    fn from_value(value: FieldValue) -> Result<Self> {
        match value {
            FieldValue::Integer(i) => i32::try_from(i).map_err(|_| {
                Error::new(ErrorKind::TypeMismatch {
                    field: None,
                    expected: "32-bit integer",
                    found: i.to_string(),
                })
            }),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl FieldType for f64 {
    fn value_type() -> ValueType {
        ValueType::Double
    }

    fn into_value(self) -> FieldValue {
        FieldValue::Double(self)
    }

    fn from_value(value: FieldValue) -> Result<Self> {
        match value {
            FieldValue::Double(d) => Ok(d),
            FieldValue::Integer(i) => Ok(i as f64),
            other => Err(mismatch("double", &other)),
        }
    }
}

impl FieldType for String {
    fn value_type() -> ValueType {
        ValueType::String
    }

    fn into_value(self) -> FieldValue {
        FieldValue::String(self)
    }

    fn from_value(value: FieldValue) -> Result<Self> {
        match value {
            FieldValue::String(s) | FieldValue::Reference(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FieldType for DateTime<Utc> {
    fn value_type() -> ValueType {
        ValueType::DateTime
    }

    fn into_value(self) -> FieldValue {
        FieldValue::DateTime(self)
    }

    fn from_value(value: FieldValue) -> Result<Self> {
        match value {
            FieldValue::DateTime(dt) => Ok(dt),
            other => Err(mismatch("datetime", &other)),
        }
    }
}

impl FieldType for NaiveDate {
    fn value_type() -> ValueType {
        ValueType::Date
    }

    fn into_value(self) -> FieldValue {
        FieldValue::Date(self)
    }

    fn from_value(value: FieldValue) -> Result<Self> {
        match value {
            FieldValue::Date(d) => Ok(d),
            other => Err(mismatch("date", &other)),
        }
    }
}

impl FieldType for Reference {
    fn value_type() -> ValueType {
        ValueType::Reference
    }

    fn into_value(self) -> FieldValue {
        FieldValue::Reference(self.0)
    }

    fn from_value(value: FieldValue) -> Result<Self> {
        match value {
            FieldValue::Reference(s) | FieldValue::String(s) => Ok(Reference(s)),
            other => Err(mismatch("reference id", &other)),
        }
    }
}

impl<V: FieldType> FieldType for Option<V> {
    fn value_type() -> ValueType {
        V::value_type()
    }

    fn into_value(self) -> FieldValue {
        match self {
            Some(v) => v.into_value(),
            None => FieldValue::Null,
        }
    }

    fn from_value(value: FieldValue) -> Result<Self> {
        match value {
            FieldValue::Null => Ok(None),
            other => V::from_value(other).map(Some),
        }
    }
}

// Converters for record-valued fields. `Schema` picks one pair per
// declaration method.

pub(crate) fn record_into_value<R: Record>(value: Option<R>) -> FieldValue {
    value.map_or(FieldValue::Null, |r| FieldValue::Record(AnyRecord::new(r)))
}

pub(crate) fn record_from_value<R: Record>(value: FieldValue) -> Result<Option<R>> {
    match value {
        FieldValue::Null => Ok(None),
        FieldValue::Record(any) => any
            .downcast::<R>()
            .map(Some)
            .map_err(|any| record_mismatch::<R>(&any)),
        other => Err(mismatch("record", &other)),
    }
}

pub(crate) fn records_into_value<R: Record>(value: Vec<R>) -> FieldValue {
    FieldValue::Records(value.into_iter().map(AnyRecord::new).collect())
}

pub(crate) fn records_from_value<R: Record>(value: FieldValue) -> Result<Vec<R>> {
    match value {
        FieldValue::Null => Ok(Vec::new()),
        FieldValue::Records(items) => items
            .into_iter()
            .map(|any| any.downcast::<R>().map_err(|any| record_mismatch::<R>(&any)))
            .collect(),
        other => Err(mismatch("record collection", &other)),
    }
}

pub(crate) fn any_record_into_value(value: Option<AnyRecord>) -> FieldValue {
    value.map_or(FieldValue::Null, FieldValue::Record)
}

pub(crate) fn any_record_from_value(value: FieldValue) -> Result<Option<AnyRecord>> {
    match value {
        FieldValue::Null => Ok(None),
        FieldValue::Record(any) => Ok(Some(any)),
        other => Err(mismatch("record", &other)),
    }
}

pub(crate) fn any_records_into_value(value: Vec<AnyRecord>) -> FieldValue {
    FieldValue::Records(value)
}

pub(crate) fn any_records_from_value(value: FieldValue) -> Result<Vec<AnyRecord>> {
    match value {
        FieldValue::Null => Ok(Vec::new()),
        FieldValue::Records(items) => Ok(items),
        other => Err(mismatch("record collection", &other)),
    }
}

fn record_mismatch<R: Record>(found: &AnyRecord) -> Error {
    Error::new(ErrorKind::TypeMismatch {
        field: None,
        expected: std::any::type_name::<R>(),
        found: found.record_type().short_name().to_string(),
    })
}
