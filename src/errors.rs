//! # Protocol Errors
//!
//! Error taxonomy per PROTOCOL.md §7. One enum covers construction,
//! coercion, and the JSON bridge; every failure propagates to the
//! immediate caller with its context attached.

use thiserror::Error;

/// Result type for protocol operations
pub type ObjectResult<T> = Result<T, ObjectError>;

/// Errors raised by construction, coercion, and serialization
#[derive(Debug, Error)]
pub enum ObjectError {
    // ==================
    // Construction Errors
    // ==================
    /// Input was neither a mapping, an instance, nor null
    #[error("expected mapping, instance, or null construction input, got {got}")]
    InvalidConstruction {
        /// Type tag of the offending input value
        got: &'static str,
    },

    /// A required attribute was absent from construction input
    #[error("missing attribute: {attribute} from {input}")]
    MissingAttribute { attribute: String, input: String },

    /// An input key outside the schema surface arrived under the reject policy
    #[error("unlisted attribute: {attribute}")]
    UnlistedAttribute { attribute: String },

    // ==================
    // Coercion Errors
    // ==================
    /// A declared attribute type refused a value; the original cause is
    /// preserved as the error source
    #[error("cannot coerce attribute '{attribute}' to {target}")]
    Coercion {
        attribute: String,
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ==================
    // Bridge Errors
    // ==================
    /// A value with no known conversion to plain JSON data
    #[error("could not serialize object of type {type_name}")]
    Serialization { type_name: String },

    /// Malformed JSON text on loads/load
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Reader/writer failure on dump/load
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl ObjectError {
    /// Create an invalid-construction error from the input's type tag
    pub fn invalid_construction(got: &'static str) -> Self {
        Self::InvalidConstruction { got }
    }

    /// Create a missing-attribute error naming the attribute and input
    pub fn missing_attribute(attribute: impl Into<String>, input: impl Into<String>) -> Self {
        Self::MissingAttribute {
            attribute: attribute.into(),
            input: input.into(),
        }
    }

    /// Create an unlisted-attribute error
    pub fn unlisted_attribute(attribute: impl Into<String>) -> Self {
        Self::UnlistedAttribute {
            attribute: attribute.into(),
        }
    }

    /// Create a coercion error carrying the original cause
    pub fn coercion(
        attribute: impl Into<String>,
        target: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Coercion {
            attribute: attribute.into(),
            target: target.into(),
            source: source.into(),
        }
    }

    /// Create a serialization error naming the offending type
    pub fn serialization(type_name: impl Into<String>) -> Self {
        Self::Serialization {
            type_name: type_name.into(),
        }
    }
}
