//! Instances and projection operations
//!
//! An instance is its kind's descriptor plus an ordered attribute store.
//! Per PROTOCOL.md §5, everything read out of an instance goes through a
//! projection: the generic item listing (serialization order), the
//! listed/required/compared/printed subsets, change detection against the
//! declared defaults, equality over the compared subset, and the two
//! rendered forms. Projections read live values; nothing is snapshotted
//! at construction.

use std::fmt;

use indexmap::IndexMap;

use crate::schema::Schema;
use crate::value::{Attrs, Value};

static NULL: Value = Value::Null;

/// One record of an entity kind
#[derive(Clone)]
pub struct Instance {
    schema: Schema,
    attrs: Attrs,
}

impl Instance {
    pub(crate) fn new(schema: Schema, attrs: Attrs) -> Self {
        Self { schema, attrs }
    }

    /// The descriptor this instance was constructed against
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The entity-kind name
    pub fn kind(&self) -> &str {
        self.schema.name()
    }

    /// Read an attribute; absent names read as null
    pub fn get(&self, name: &str) -> &Value {
        self.attrs.get(name).unwrap_or(&NULL)
    }

    /// Assign an attribute in place. No validation re-runs; the value is
    /// stored as given.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// The raw attribute store in its canonical order
    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// Generic item listing: every attribute except internal
    /// underscore-prefixed names, in store order. This is the surface the
    /// JSON bridge serializes.
    pub fn items(&self) -> Vec<(&str, &Value)> {
        self.attrs
            .iter()
            .filter(|(name, _)| !name.starts_with('_'))
            .map(|(name, value)| (name.as_str(), value))
            .collect()
    }

    /// (name, value) pairs for the full listed surface, absent names as null
    pub fn listed_items(&self) -> Vec<(&str, &Value)> {
        self.subset(self.schema.listed())
    }

    /// (name, value) pairs for the required subset
    pub fn required_items(&self) -> Vec<(&str, &Value)> {
        self.subset(self.schema.required())
    }

    /// (name, value) pairs for the equality subset
    pub fn compared_items(&self) -> Vec<(&str, &Value)> {
        self.subset(self.schema.compared())
    }

    /// (name, value) pairs for the display subset
    pub fn printed_items(&self) -> Vec<(&str, &Value)> {
        self.subset(self.schema.printed())
    }

    /// Names of attributes that differ from a fresh default-only
    /// construction, in store order.
    ///
    /// Required attributes have no default baseline and always count as
    /// changed, as do extras admitted by the ignore policy. A typed
    /// optional attribute compares against its coerced default; when that
    /// re-derivation fails the attribute counts as changed rather than
    /// risking an under-report.
    pub fn changed(&self) -> Vec<&str> {
        self.attrs
            .iter()
            .filter(|(name, value)| self.is_changed(name, value))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// (name, value) pairs for the changed subset
    pub fn changed_items(&self) -> Vec<(&str, &Value)> {
        self.attrs
            .iter()
            .filter(|(name, value)| self.is_changed(name, value))
            .map(|(name, value)| (name.as_str(), value))
            .collect()
    }

    /// Wider equality over the whole listed surface, not just the
    /// compared subset.
    pub fn equivalent(&self, other: &Instance) -> bool {
        if self.schema != other.schema {
            return false;
        }
        let ours: IndexMap<&str, &Value> = self.listed_items().into_iter().collect();
        let theirs: IndexMap<&str, &Value> = other.listed_items().into_iter().collect();
        ours == theirs
    }

    fn subset<'a>(&'a self, names: &'a [String]) -> Vec<(&'a str, &'a Value)> {
        names
            .iter()
            .map(|name| (name.as_str(), self.get(name)))
            .collect()
    }

    fn is_changed(&self, name: &str, value: &Value) -> bool {
        if self.schema.required().iter().any(|n| n == name) {
            return true;
        }
        if let Some(default) = self.schema.optional().get(name) {
            if let Some(ty) = self.schema.types().get(name) {
                return match ty.coerce(name, default.clone()) {
                    Ok(derived) => value != &derived,
                    Err(_) => true,
                };
            }
            return value != default;
        }
        true
    }
}

/// Equality per PROTOCOL.md §5: same kind, compared subsets agree as
/// mappings. Attributes outside the compared subset never participate.
impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        if self.schema != other.schema {
            return false;
        }
        let ours: IndexMap<&str, &Value> = self.compared_items().into_iter().collect();
        let theirs: IndexMap<&str, &Value> = other.compared_items().into_iter().collect();
        ours == theirs
    }
}

/// Technical form: kind name with the listed attributes. Diagnostics only,
/// not parseable back.
impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.schema.name());
        for (name, value) in self.listed_items() {
            s.field(name, value);
        }
        s.finish()
    }
}

/// Human-readable form: `<kind>` followed by each printed value as text,
/// reduced to terminal-safe ASCII.
impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.schema.name())?;
        for (_, value) in self.printed_items() {
            write!(f, " {}", printable(&value.to_string()))?;
        }
        Ok(())
    }
}

/// Best-effort ASCII: no-break spaces become plain spaces, other
/// non-ASCII characters are dropped.
fn printable(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\u{00A0}' => Some(' '),
            c if c.is_ascii() => Some(c),
            _ => None,
        })
        .collect()
}
