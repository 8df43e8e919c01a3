//! Generic JSON bridge
//!
//! Per PROTOCOL.md §6: [`to_plain`] lowers any attribute value to plain
//! serde_json data, instances serialize over their generic item listing,
//! and the text form is fixed (four-space indent, comma at line ends,
//! `": "` after keys) so dumps of the same instance are stable byte for
//! byte. Loading is parse-then-construct: deserialized input passes
//! through the full construction pipeline, so a loaded instance is as
//! validated as a built one.

use std::io;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::errors::{ObjectError, ObjectResult};
use crate::instance::Instance;
use crate::schema::Schema;
use crate::value::{MapHint, Value};

/// Indentation unit of the canonical text form; diff-friendly output
/// depends on this never changing.
const INDENT: &[u8] = b"    ";

/// Lower a value to plain JSON data.
///
/// Scalars map directly (non-finite floats become null), timestamps render
/// as RFC 3339 text, lists and mappings convert recursively, instances
/// serialize their item listing. External values are asked to convert
/// themselves, first with an ordered-mapping hint and once more without it;
/// a value that refuses both calls, or an opaque value, fails with
/// [`ObjectError::Serialization`] after logging the offending type and
/// value.
pub fn to_plain(value: &Value) -> ObjectResult<serde_json::Value> {
    match value {
        Value::Null => Ok(serde_json::Value::Null),
        Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Int(n) => Ok(serde_json::Value::from(*n)),
        Value::Float(x) => Ok(serde_json::Value::from(*x)),
        Value::Text(s) => Ok(serde_json::Value::String(s.clone())),
        Value::Timestamp(ts) => Ok(serde_json::Value::String(ts.to_rfc3339())),
        Value::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(to_plain(item)?);
            }
            Ok(serde_json::Value::Array(out))
        }
        Value::Mapping(attrs) => {
            let mut map = serde_json::Map::with_capacity(attrs.len());
            for (name, value) in attrs {
                map.insert(name.clone(), to_plain(value)?);
            }
            Ok(serde_json::Value::Object(map))
        }
        Value::Object(instance) => instance.to_plain(),
        Value::External(ext) => ext
            .to_json_with(MapHint::Ordered)
            .or_else(|_| ext.to_json())
            .map_err(|cause| {
                log::error!(
                    "error serializing {} {:?}: {}",
                    ext.type_label(),
                    ext,
                    cause
                );
                ObjectError::serialization(ext.type_label())
            }),
        Value::Opaque(op) => {
            log::error!(
                "unknown error serializing {} {}",
                op.type_name(),
                op.rendered()
            );
            Err(ObjectError::serialization(op.type_name()))
        }
    }
}

impl Instance {
    /// This instance as a plain JSON object over its item listing
    pub fn to_plain(&self) -> ObjectResult<serde_json::Value> {
        let items = self.items();
        let mut map = serde_json::Map::with_capacity(items.len());
        for (name, value) in items {
            map.insert(name.to_string(), to_plain(value)?);
        }
        Ok(serde_json::Value::Object(map))
    }

    /// Serialize to the canonical indented text form
    pub fn dumps(&self) -> ObjectResult<String> {
        let mut buf = Vec::new();
        self.dump(&mut buf)?;
        Ok(String::from_utf8(buf).expect("serializer output is UTF-8"))
    }

    /// Serialize the canonical indented text form into `writer`
    pub fn dump<W: io::Write>(&self, writer: W) -> ObjectResult<()> {
        let plain = self.to_plain()?;
        let formatter = PrettyFormatter::with_indent(INDENT);
        let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
        plain.serialize(&mut ser).map_err(json_or_io)?;
        Ok(())
    }
}

/// serde_json folds reader/writer failures into its own error type;
/// surface those as I/O failures, not as malformed JSON.
fn json_or_io(err: serde_json::Error) -> ObjectError {
    if err.is_io() {
        ObjectError::Io(err.into())
    } else {
        ObjectError::Json(err)
    }
}

impl Schema {
    /// Parse JSON text and construct an instance of this kind from it.
    /// Validation is the full construction pipeline, nothing less.
    pub fn loads(&self, text: &str) -> ObjectResult<Instance> {
        let parsed: serde_json::Value = serde_json::from_str(text)?;
        self.construct(parsed)
    }

    /// Read JSON from `reader` and construct an instance of this kind
    pub fn load<R: io::Read>(&self, reader: R) -> ObjectResult<Instance> {
        let parsed: serde_json::Value =
            serde_json::from_reader(reader).map_err(json_or_io)?;
        self.construct(parsed)
    }
}
