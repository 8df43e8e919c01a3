//! Closed value model for protocol attributes
//!
//! Attribute values form a closed tagged set per PROTOCOL.md §1/§6:
//! null, scalars, timestamps, lists, ordered mappings, nested instances,
//! externally-convertible collaborators, and opaque payloads that exist
//! only to fail serialization loudly. The bridge and the coercion engine
//! dispatch on the tag; there is no capability probing.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::errors::ObjectResult;
use crate::instance::Instance;

/// Ordered attribute mapping: construction input, instance store, and the
/// mapping variant all share this shape.
pub type Attrs = IndexMap<String, Value>;

/// Mapping-container hint passed to external conversions.
///
/// Collaborators that build JSON objects should keep insertion order when
/// `Ordered` is requested; those that cannot may fail the hinted call and
/// will be retried without a hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapHint {
    /// Produced objects should preserve key insertion order
    Ordered,
    /// Any container behavior is acceptable
    Any,
}

/// Conversion contract for values that live outside the protocol.
///
/// The JSON bridge asks an external value to convert itself: first through
/// `to_json_with` carrying a [`MapHint`]; if that call fails, through
/// `to_json` before giving up with a serialization error.
pub trait ToJson: fmt::Debug + Send + Sync {
    /// Convert to plain JSON data, shaping produced mappings per `hint`.
    fn to_json_with(&self, hint: MapHint) -> ObjectResult<serde_json::Value>;

    /// Hint-free conversion; the default delegates with [`MapHint::Any`].
    fn to_json(&self) -> ObjectResult<serde_json::Value> {
        self.to_json_with(MapHint::Any)
    }

    /// Name of the implementing type, used in failure diagnostics
    fn type_label(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A named payload with no JSON conversion.
///
/// Carries the foreign type's name and a rendered form so failures can be
/// logged with the offending type and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opaque {
    type_name: String,
    rendered: String,
}

impl Opaque {
    pub fn new(type_name: impl Into<String>, rendered: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            rendered: rendered.into(),
        }
    }

    /// The foreign type's name, used in diagnostics
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The rendered form of the foreign value
    pub fn rendered(&self) -> &str {
        &self.rendered
    }
}

/// An attribute value
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent/none
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// UTF-8 text
    Text(String),
    /// UTC timestamp, rendered as RFC 3339 by the bridge
    Timestamp(DateTime<Utc>),
    /// Sequence of values
    List(Vec<Value>),
    /// Ordered name → value mapping
    Mapping(Attrs),
    /// Nested protocol instance
    Object(Instance),
    /// Externally-convertible collaborator (see [`ToJson`])
    External(Arc<dyn ToJson>),
    /// Unserializable payload; hard failure at the bridge
    Opaque(Opaque),
}

impl Value {
    /// Wrap an external collaborator
    pub fn external(value: impl ToJson + 'static) -> Self {
        Value::External(Arc::new(value))
    }

    /// Wrap a foreign value with no JSON conversion
    pub fn opaque(type_name: impl Into<String>, rendered: impl Into<String>) -> Self {
        Value::Opaque(Opaque::new(type_name, rendered))
    }

    /// Returns the type tag for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
            Value::List(_) => "list",
            Value::Mapping(_) => "mapping",
            Value::Object(_) => "instance",
            Value::External(_) => "external",
            Value::Opaque(_) => "opaque",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric reading across both number representations
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Attrs> {
        match self {
            Value::Mapping(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }
}

/// Equality over values: structural per variant, with integers and floats
/// comparing numerically across representations (JSON number semantics).
/// External values compare by identity; nothing else compares across tags.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Mapping(a), Value::Mapping(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::External(a), Value::External(b)) => Arc::ptr_eq(a, b),
            (Value::Opaque(a), Value::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

/// Display renders the value as bare text: the form used by the printed
/// projection and by text coercion. Not a JSON form.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Mapping(attrs) => {
                write!(f, "{{")?;
                for (i, (name, value)) in attrs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
            Value::Object(instance) => write!(f, "{}", instance),
            Value::External(ext) => write!(f, "{:?}", ext),
            Value::Opaque(op) => write!(f, "{}", op.rendered()),
        }
    }
}

// ==================
// Conversions
// ==================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Attrs> for Value {
    fn from(attrs: Attrs) -> Self {
        Value::Mapping(attrs)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Object(instance)
    }
}

impl From<&Instance> for Value {
    fn from(instance: &Instance) -> Self {
        Value::Object(instance.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(value) => value.into(),
            None => Value::Null,
        }
    }
}

/// Parsed JSON enters the protocol through this conversion: objects become
/// ordered mappings, arrays become lists, numbers split into int/float.
/// Integers beyond the i64 range read as floats.
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    // only absent under serde_json's arbitrary_precision
                    Value::Float(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Mapping(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}
