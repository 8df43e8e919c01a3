//! metaobject - A base-object protocol library
//!
//! Declarative record schemas with validated construction, typed coercion,
//! and stable JSON round-trips. PROTOCOL.md is the normative description;
//! module docs cite its sections.

mod coerce;
mod construct;
pub mod errors;
pub mod instance;
pub mod json;
pub mod schema;
pub mod value;

pub use errors::{ObjectError, ObjectResult};
pub use instance::Instance;
pub use json::to_plain;
pub use schema::{AttrType, Schema, SchemaBuilder, UnlistedPolicy};
pub use value::{Attrs, MapHint, Opaque, ToJson, Value};
