//! Field descriptors
//!
//! A [`FieldDescriptor`] binds a field name to its [`AttributeSpec`] on a
//! record type and mediates reads and writes of that field on records.

use crate::attribute::AttributeSpec;
use crate::record::Record;
use crate::types::{Value, NULL};
use std::sync::Arc;

/// Binding of a field name to its spec
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    spec: Arc<AttributeSpec>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, spec: Arc<AttributeSpec>) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type-level access: the declared spec
    pub fn spec(&self) -> &AttributeSpec {
        &self.spec
    }

    pub(crate) fn shared_spec(&self) -> &Arc<AttributeSpec> {
        &self.spec
    }

    /// Stored value of this field, `Null` when never assigned
    pub fn get<'r>(&self, record: &'r Record) -> &'r Value {
        record.values.get(&self.name).unwrap_or(&NULL)
    }

    /// Store `value` verbatim and mark the field for validation
    ///
    /// Transform and validate only run on [`Record::validate`].
    pub fn set(&self, record: &mut Record, value: Value) {
        record.values.insert(self.name.clone(), value);
        record.pending.insert(self.name.clone());
    }
}
