//! Type coercion engine
//!
//! Implements the conversion table of PROTOCOL.md §4: every declared
//! attribute type pulls values toward itself. Null becomes the type's
//! zero, numbers and text convert where the content allows, list types
//! recurse elementwise, entity types construct nested instances. A value
//! the table does not cover is refused with a [`ObjectError::Coercion`]
//! carrying the original cause, and the refusal is logged with the
//! attribute name and offending value.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::errors::{ObjectError, ObjectResult};
use crate::schema::AttrType;
use crate::value::Value;

/// Underlying cause of a refused conversion
type Cause = Box<dyn std::error::Error + Send + Sync>;

impl AttrType {
    /// Coerce `value` into this type.
    ///
    /// `attribute` names the owning attribute for diagnostics; refusals are
    /// logged with the declared type, attribute, and offending value before
    /// the error propagates.
    pub fn coerce(&self, attribute: &str, value: Value) -> ObjectResult<Value> {
        match apply(self, &value) {
            Ok(coerced) => Ok(coerced),
            Err(cause) => {
                log::error!(
                    "cannot coerce attribute '{}' to {}: {} (value: {:?})",
                    attribute,
                    self.describe(),
                    cause,
                    value
                );
                Err(ObjectError::coercion(attribute, self.describe(), cause))
            }
        }
    }

    /// The zero value of this type: what null coerces to.
    ///
    /// Entity zeros construct from nothing and fail when the kind has
    /// required attributes without defaults.
    pub fn zero(&self) -> ObjectResult<Value> {
        match self {
            AttrType::Int => Ok(Value::Int(0)),
            AttrType::Float => Ok(Value::Float(0.0)),
            AttrType::Bool => Ok(Value::Bool(false)),
            AttrType::Text => Ok(Value::Text(String::new())),
            AttrType::Timestamp => Ok(Value::Timestamp(DateTime::<Utc>::UNIX_EPOCH)),
            AttrType::Entity(kind) => kind.construct_default().map(Value::from),
            AttrType::List(_) => Ok(Value::List(Vec::new())),
        }
    }
}

fn apply(ty: &AttrType, value: &Value) -> Result<Value, Cause> {
    if value.is_null() {
        return ty.zero().map_err(Cause::from);
    }
    match ty {
        AttrType::Int => to_int(value),
        AttrType::Float => to_float(value),
        AttrType::Bool => Ok(Value::Bool(truthy(value))),
        AttrType::Text => Ok(to_text(value)),
        AttrType::Timestamp => to_timestamp(value),
        AttrType::Entity(kind) => match value {
            // an instance of the target kind passes through unchanged
            Value::Object(instance) if instance.schema() == kind => {
                Ok(Value::Object(instance.clone()))
            }
            Value::Object(_) | Value::Mapping(_) => kind
                .construct(value.clone())
                .map(Value::from)
                .map_err(Cause::from),
            other => Err(refusal(other)),
        },
        AttrType::List(elem) => match value {
            Value::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(apply(elem, item)?);
                }
                Ok(Value::List(out))
            }
            other => Err(refusal(other)),
        },
    }
}

fn refusal(value: &Value) -> Cause {
    format!("no conversion from {} value {:?}", value.type_name(), value).into()
}

fn to_int(value: &Value) -> Result<Value, Cause> {
    match value {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Bool(b) => Ok(Value::Int(*b as i64)),
        Value::Float(x) => {
            if !x.is_finite() {
                return Err(format!("cannot truncate {} to int", x).into());
            }
            let t = x.trunc();
            // upper bound is 2^63 exactly; the nearest f64 below it is fine
            if t >= i64::MIN as f64 && t < 9.223_372_036_854_776e18 {
                Ok(Value::Int(t as i64))
            } else {
                Err(format!("{} is out of int range", x).into())
            }
        }
        Value::Text(s) => match s.trim().parse::<i64>() {
            Ok(n) => Ok(Value::Int(n)),
            Err(e) => Err(Box::new(e)),
        },
        other => Err(refusal(other)),
    }
}

fn to_float(value: &Value) -> Result<Value, Cause> {
    match value {
        Value::Float(x) => Ok(Value::Float(*x)),
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Text(s) => match s.trim().parse::<f64>() {
            Ok(x) => Ok(Value::Float(x)),
            Err(e) => Err(Box::new(e)),
        },
        other => Err(refusal(other)),
    }
}

/// Truthiness: zero numbers, empty text, and empty containers are false;
/// everything else (timestamps, instances, externals included) is true.
/// NaN is nonzero, hence true.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Int(n) => *n != 0,
        Value::Float(x) => *x != 0.0,
        Value::Text(s) => !s.is_empty(),
        Value::List(items) => !items.is_empty(),
        Value::Mapping(attrs) => !attrs.is_empty(),
        Value::Timestamp(_) | Value::Object(_) | Value::External(_) | Value::Opaque(_) => true,
    }
}

/// Text accepts everything: the display rendering of the value.
fn to_text(value: &Value) -> Value {
    match value {
        Value::Text(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}

fn to_timestamp(value: &Value) -> Result<Value, Cause> {
    match value {
        Value::Timestamp(ts) => Ok(Value::Timestamp(*ts)),
        Value::Text(s) => parse_timestamp(s.trim()),
        Value::Int(n) => DateTime::from_timestamp(*n, 0)
            .map(Value::Timestamp)
            .ok_or_else(|| Cause::from(format!("{} is out of timestamp range", n))),
        Value::Float(x) => {
            if !x.is_finite() {
                return Err(format!("cannot read {} as epoch seconds", x).into());
            }
            DateTime::from_timestamp_millis((x * 1000.0) as i64)
                .map(Value::Timestamp)
                .ok_or_else(|| Cause::from(format!("{} is out of timestamp range", x)))
        }
        other => Err(refusal(other)),
    }
}

/// Accepts RFC 3339 (offset kept, normalized to UTC) and the bare ISO form
/// `YYYY-MM-DDTHH:MM:SS[.ffffff]` read as UTC.
fn parse_timestamp(text: &str) -> Result<Value, Cause> {
    match DateTime::parse_from_rfc3339(text) {
        Ok(dt) => Ok(Value::Timestamp(dt.with_timezone(&Utc))),
        Err(rfc_err) => match NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
            Ok(naive) => Ok(Value::Timestamp(naive.and_utc())),
            Err(_) => Err(Box::new(rfc_err)),
        },
    }
}
