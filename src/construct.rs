//! Construction & validation pipeline
//!
//! Per PROTOCOL.md §3, an instance is built from a mapping, an existing
//! instance (copy), or null (defaults only), and walks a fixed pipeline:
//! normalize, check required names, apply the unlisted policy, seed the
//! store in canonical order, coerce every typed attribute. Nested entity
//! types re-enter this pipeline through the coercion engine, so one
//! top-level call validates the whole tree.

use crate::errors::{ObjectError, ObjectResult};
use crate::instance::Instance;
use crate::schema::{Schema, UnlistedPolicy};
use crate::value::{Attrs, Value};

impl Schema {
    /// Build an instance of this kind from `input`.
    ///
    /// Accepts a mapping, an existing instance (its attributes are copied),
    /// or null (optional defaults only). Anything else fails with
    /// [`ObjectError::InvalidConstruction`].
    pub fn construct(&self, input: impl Into<Value>) -> ObjectResult<Instance> {
        match input.into() {
            Value::Null => self.from_attrs(self.optional().clone()),
            Value::Mapping(attrs) => self.from_attrs(attrs),
            Value::Object(instance) => self.from_attrs(instance.attrs().clone()),
            other => Err(ObjectError::invalid_construction(other.type_name())),
        }
    }

    /// Build an instance from optional defaults alone.
    ///
    /// Fails when a required attribute has no default to fall back on.
    pub fn construct_default(&self) -> ObjectResult<Instance> {
        self.construct(Value::Null)
    }

    fn from_attrs(&self, mut input: Attrs) -> ObjectResult<Instance> {
        for name in self.required() {
            if !input.contains_key(name) {
                return Err(ObjectError::missing_attribute(
                    name,
                    Value::Mapping(input).to_string(),
                ));
            }
        }

        match self.unlisted() {
            UnlistedPolicy::Ignore => {}
            UnlistedPolicy::Drop => {
                input.retain(|name, _| self.is_listed(name));
            }
            UnlistedPolicy::Reject => {
                if let Some(name) = input.keys().find(|name| !self.is_listed(name)) {
                    return Err(ObjectError::unlisted_attribute(name.clone()));
                }
            }
        }

        // canonical store order: listed names first, then input extras in
        // input order; typed names with no value materialize as null and
        // become their zero in the typed pass
        let mut attrs = Attrs::with_capacity(self.listed().len() + input.len());
        for name in self.listed() {
            if let Some(value) = input.get(name) {
                attrs.insert(name.clone(), value.clone());
            } else if let Some(default) = self.optional().get(name) {
                attrs.insert(name.clone(), default.clone());
            } else if self.types().contains_key(name) {
                attrs.insert(name.clone(), Value::Null);
            }
        }
        for (name, value) in input {
            if !attrs.contains_key(&name) {
                attrs.insert(name, value);
            }
        }

        for (name, ty) in self.types() {
            let current = attrs.get(name).cloned().unwrap_or(Value::Null);
            let coerced = ty.coerce(name, current)?;
            attrs.insert(name.clone(), coerced);
        }

        Ok(Instance::new(self.clone(), attrs))
    }
}
