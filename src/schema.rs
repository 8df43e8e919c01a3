//! Entity-kind descriptors
//!
//! Per PROTOCOL.md §2, a kind is described once (required names, optional
//! defaults, attribute types, comparison/print subsets, unlisted policy)
//! and the descriptor is consulted by every construction, projection, and
//! bridge operation afterwards. Descriptors are cheap to clone and hand
//! around; nested kinds embed whole descriptors, so list element types
//! and entity references recurse without registries.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::value::Value;

/// Handling of attribute names outside the listed set (PROTOCOL.md §2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnlistedPolicy {
    /// Keep unlisted input attributes on the instance
    #[default]
    Ignore,
    /// Silently remove unlisted attributes from the input
    Drop,
    /// Fail construction when the input carries an unlisted attribute
    Reject,
}

/// Declared type of an attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttrType {
    Int,
    Float,
    Bool,
    Text,
    Timestamp,
    /// Nested entity of the given kind
    Entity(Schema),
    /// Homogeneous list of the element type
    List(Box<AttrType>),
}

impl AttrType {
    /// List of `elem` values
    pub fn list(elem: AttrType) -> Self {
        AttrType::List(Box::new(elem))
    }

    /// Nested entity of `kind`
    pub fn entity(kind: Schema) -> Self {
        AttrType::Entity(kind)
    }

    /// Human-readable name for diagnostics: "int", "[text]", a kind name
    pub fn describe(&self) -> String {
        match self {
            AttrType::Int => "int".to_string(),
            AttrType::Float => "float".to_string(),
            AttrType::Bool => "bool".to_string(),
            AttrType::Text => "text".to_string(),
            AttrType::Timestamp => "timestamp".to_string(),
            AttrType::Entity(kind) => kind.name().to_string(),
            AttrType::List(elem) => format!("[{}]", elem.describe()),
        }
    }
}

#[derive(Debug)]
struct SchemaInner {
    name: String,
    required: Vec<String>,
    optional: IndexMap<String, Value>,
    types: IndexMap<String, AttrType>,
    compared: Vec<String>,
    printed: Vec<String>,
    unlisted: UnlistedPolicy,
    /// Required names first, then the remaining optional/typed names in
    /// declaration order; computed once at build time
    listed: Vec<String>,
}

/// Descriptor for one entity kind
///
/// Shared by handle: clones are cheap and refer to the same descriptor.
/// Two descriptors are equal when they describe the same kind name.
#[derive(Debug, Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

impl Schema {
    /// Start describing a kind
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            required: Vec::new(),
            optional: IndexMap::new(),
            types: IndexMap::new(),
            compared: Vec::new(),
            printed: Vec::new(),
            unlisted: UnlistedPolicy::default(),
        }
    }

    /// The kind name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Attribute names that construction input must supply
    pub fn required(&self) -> &[String] {
        &self.inner.required
    }

    /// Optional attributes and their default values
    pub fn optional(&self) -> &IndexMap<String, Value> {
        &self.inner.optional
    }

    /// Declared attribute types
    pub fn types(&self) -> &IndexMap<String, AttrType> {
        &self.inner.types
    }

    /// Attribute names participating in equality
    pub fn compared(&self) -> &[String] {
        &self.inner.compared
    }

    /// Attribute names participating in the display form
    pub fn printed(&self) -> &[String] {
        &self.inner.printed
    }

    /// Policy for attribute names outside the listed set
    pub fn unlisted(&self) -> UnlistedPolicy {
        self.inner.unlisted
    }

    /// The full listed set: required first, then optional/typed extras in
    /// declaration order, no duplicates
    pub fn listed(&self) -> &[String] {
        &self.inner.listed
    }

    /// Whether `name` belongs to the listed set
    pub fn is_listed(&self, name: &str) -> bool {
        self.inner.listed.iter().any(|n| n == name)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.inner.name == other.inner.name
    }
}

impl Eq for Schema {}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.name)
    }
}

/// Builder for [`Schema`] descriptors
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    required: Vec<String>,
    optional: IndexMap<String, Value>,
    types: IndexMap<String, AttrType>,
    compared: Vec<String>,
    printed: Vec<String>,
    unlisted: UnlistedPolicy,
}

impl SchemaBuilder {
    /// Declare a required attribute
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    /// Declare an optional attribute with its default value
    pub fn optional(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.optional.insert(name.into(), default.into());
        self
    }

    /// Declare an attribute type
    pub fn typed(mut self, name: impl Into<String>, ty: AttrType) -> Self {
        self.types.insert(name.into(), ty);
        self
    }

    /// Restrict equality to the given attribute names.
    /// When never called, equality compares the required set.
    pub fn compared<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compared = names.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict the display form to the given attribute names.
    /// When never called, display shows the required set.
    pub fn printed<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.printed = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the unlisted-attribute policy
    pub fn unlisted(mut self, policy: UnlistedPolicy) -> Self {
        self.unlisted = policy;
        self
    }

    /// Finish the descriptor
    pub fn build(self) -> Schema {
        let mut required: Vec<String> = Vec::with_capacity(self.required.len());
        for name in self.required {
            if !required.contains(&name) {
                required.push(name);
            }
        }

        let mut listed = required.clone();
        for name in self.optional.keys().chain(self.types.keys()) {
            if !listed.iter().any(|n| n == name) {
                listed.push(name.clone());
            }
        }

        let compared = if self.compared.is_empty() {
            required.clone()
        } else {
            self.compared
        };
        let printed = if self.printed.is_empty() {
            required.clone()
        } else {
            self.printed
        };

        Schema {
            inner: Arc::new(SchemaInner {
                name: self.name,
                required,
                optional: self.optional,
                types: self.types,
                compared,
                printed,
                unlisted: self.unlisted,
                listed,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listed_order_required_first() {
        let kind = Schema::builder("widget")
            .optional("color", "red")
            .required("id")
            .typed("size", AttrType::Int)
            .required("name")
            .build();
        assert_eq!(kind.listed(), ["id", "name", "color", "size"]);
    }

    #[test]
    fn test_listed_deduplicates_overlap() {
        let kind = Schema::builder("widget")
            .required("id")
            .optional("id", 0i64)
            .typed("id", AttrType::Int)
            .build();
        assert_eq!(kind.listed(), ["id"]);
        assert_eq!(kind.required(), ["id"]);
    }

    #[test]
    fn test_compared_and_printed_default_to_required() {
        let kind = Schema::builder("widget")
            .required("id")
            .optional("color", "red")
            .build();
        assert_eq!(kind.compared(), ["id"]);
        assert_eq!(kind.printed(), ["id"]);

        let narrowed = Schema::builder("widget")
            .required("id")
            .required("name")
            .compared(["name"])
            .printed(["name"])
            .build();
        assert_eq!(narrowed.compared(), ["name"]);
        assert_eq!(narrowed.printed(), ["name"]);
    }

    #[test]
    fn test_kind_identity_by_name() {
        let a = Schema::builder("widget").required("id").build();
        let b = Schema::builder("widget").optional("color", "red").build();
        let c = Schema::builder("gadget").required("id").build();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_type_descriptions() {
        let point = Schema::builder("point").required("x").build();
        assert_eq!(AttrType::Int.describe(), "int");
        assert_eq!(AttrType::list(AttrType::Text).describe(), "[text]");
        assert_eq!(AttrType::entity(point.clone()).describe(), "point");
        assert_eq!(
            AttrType::list(AttrType::entity(point)).describe(),
            "[point]"
        );
    }
}
