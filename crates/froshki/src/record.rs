//! Record instances
//!
//! A [`Record`] owns the values assigned to one instance of a
//! [`RecordType`], the set of fields waiting for validation and the error
//! messages of the last validation pass.
//!
//! Values are merged in ascending order of explicitness: type defaults, then
//! an optional `source` mapping, then explicit overrides. Nothing is
//! converted or checked until [`Record::validate`] runs.

use crate::errors::{FroshkiError, Result};
use crate::schema::{RecordType, Schema};
use crate::types::{Value, NULL};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

// ============================================================================
// Record
// ============================================================================

/// One instance of a record type
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<Schema>,
    pub(crate) values: HashMap<String, Value>,
    pub(crate) pending: BTreeSet<String>,
    errors: BTreeMap<String, String>,
    last_result: Option<bool>,
}

impl Record {
    /// Build a record from type defaults only
    pub fn new(record_type: &RecordType) -> Result<Self> {
        record_type.record().build()
    }

    fn empty(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            values: HashMap::new(),
            pending: BTreeSet::new(),
            errors: BTreeMap::new(),
            last_result: None,
        }
    }

    /// Name of the record type
    pub fn record_type(&self) -> &str {
        self.schema.name()
    }

    /// Schema snapshot this record was built with
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Stored value of a registered field (`Null` when never assigned)
    ///
    /// Aliases are input-only names and are rejected here.
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.schema
            .field(name)
            .map(|field| field.get(self))
            .ok_or_else(|| FroshkiError::unknown(self.schema.name(), name))
    }

    /// Lenient read: `Null` for unassigned and unknown names alike
    pub fn value(&self, name: &str) -> &Value {
        self.values.get(name).unwrap_or(&NULL)
    }

    /// Assign a registered field; validation is deferred
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let schema = Arc::clone(&self.schema);
        let field = schema
            .field(name)
            .ok_or_else(|| FroshkiError::unknown(schema.name(), name))?;
        field.set(self, value.into());
        Ok(())
    }

    /// Assign several fields at once, accepting aliases
    ///
    /// Every key is resolved before anything is written, so an unknown key
    /// leaves the record untouched.
    pub fn update<K, V>(&mut self, values: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let schema = Arc::clone(&self.schema);
        let mut resolved = Vec::new();
        for (key, value) in values {
            let key = key.into();
            let field = schema
                .resolve_key(&key)
                .ok_or_else(|| FroshkiError::unknown(schema.name(), &key))?;
            resolved.push((field, value.into()));
        }
        for (field, value) in resolved {
            field.set(self, value);
        }
        Ok(())
    }

    /// Apply `(key, value)` pairs with alias resolution
    fn assign<I>(&mut self, values: I, ignore_unknown_keys: bool) -> Result<()>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let schema = Arc::clone(&self.schema);
        for (key, value) in values {
            match schema.resolve_key(&key) {
                Some(field) => field.set(self, value),
                None if ignore_unknown_keys => {
                    tracing::debug!("'{}' ignores unknown key {}", schema.name(), key);
                }
                None => return Err(FroshkiError::unknown(schema.name(), &key)),
            }
        }
        Ok(())
    }

    /// Run per-field then cross-field validation
    ///
    /// Fields written since the last pass and fields that failed last time
    /// are (re)checked. A passing field has its error cleared and its stored
    /// value replaced by the transformed one; a failing field keeps the raw
    /// value and gets an error message. Cross-field validators then run
    /// against the updated record. Returns overall validity.
    pub fn validate(&mut self) -> bool {
        let schema = Arc::clone(&self.schema);
        let mut is_valid = true;

        for field in schema.fields() {
            let name = field.name();
            if !self.pending.contains(name) && !self.errors.contains_key(name) {
                continue;
            }

            let spec = field.spec();
            let stored = field.get(self);
            let outcome = if spec.is_nullable() && stored.is_null() {
                Ok(None)
            } else {
                spec.checked_validate(stored).map(Some)
            };

            match outcome {
                Ok(transformed) => {
                    self.errors.remove(name);
                    if let Some(value) = transformed {
                        self.values.insert(name.to_string(), value);
                    }
                }
                Err(message) => {
                    tracing::trace!("'{}.{}' invalid: {}", schema.name(), name, message);
                    self.errors.insert(name.to_string(), message);
                    is_valid = false;
                }
            }
        }

        let outcomes: Vec<(&str, bool)> = schema
            .validators()
            .iter()
            .map(|(name, hook)| (name.as_str(), hook.validate(name, self)))
            .collect();

        for ((name, passed), (_, hook)) in outcomes.into_iter().zip(schema.validators()) {
            // a hook sharing a field's key never clears or replaces the field's error
            let shadows_field = schema.field(name).is_some();
            if passed {
                if !shadows_field {
                    self.errors.remove(name);
                }
                continue;
            }
            is_valid = false;
            if let Some(message) = hook.message() {
                if shadows_field {
                    self.errors
                        .entry(name.to_string())
                        .or_insert_with(|| message.to_string());
                } else {
                    self.errors.insert(name.to_string(), message.to_string());
                }
            }
        }

        self.pending.clear();
        self.last_result = Some(is_valid);
        tracing::debug!(
            "validated '{}': valid={} errors={}",
            schema.name(),
            is_valid,
            self.errors.len()
        );
        is_valid
    }

    /// Result of the last validation, `false` while writes are pending
    pub fn is_valid(&self) -> bool {
        self.pending.is_empty() && self.last_result == Some(true)
    }

    /// Snapshot of error messages keyed by field or validator name
    pub fn errors(&self) -> BTreeMap<String, String> {
        self.errors.clone()
    }

    /// Snapshot of all stored values
    pub fn data(&self) -> BTreeMap<String, Value> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Snapshot of the fields waiting for validation
    pub fn pending(&self) -> BTreeSet<String> {
        self.pending.clone()
    }
}

// ============================================================================
// Record Builder
// ============================================================================

/// Construction arguments for a record
#[derive(Debug)]
pub struct RecordBuilder<'a> {
    record_type: &'a RecordType,
    source: Option<Vec<(String, Value)>>,
    source_value: Option<Value>,
    ignore_unknown_keys: Option<bool>,
    overrides: Vec<(String, Value)>,
}

impl RecordType {
    /// Start constructing a record of this type
    pub fn record(&self) -> RecordBuilder<'_> {
        RecordBuilder {
            record_type: self,
            source: None,
            source_value: None,
            ignore_unknown_keys: None,
            overrides: Vec::new(),
        }
    }
}

impl<'a> RecordBuilder<'a> {
    /// Bulk input mapping, applied after defaults
    pub fn source<K, V>(mut self, source: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.source = Some(
            source
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self.source_value = None;
        self
    }

    /// Bulk input given as a `Value::Object`; anything else fails on `build`
    pub fn source_value(mut self, source: impl Into<Value>) -> Self {
        self.source = None;
        self.source_value = Some(source.into());
        self
    }

    /// Override the type's unknown-key policy for the source mapping
    pub fn ignore_unknown_keys(mut self, ignore: bool) -> Self {
        self.ignore_unknown_keys = Some(ignore);
        self
    }

    /// Explicit value, applied last; unknown keys always fail
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    pub fn build(self) -> Result<Record> {
        let schema = self.record_type.schema();
        let ignore_unknown_keys = self
            .ignore_unknown_keys
            .unwrap_or_else(|| schema.config().ignores_unknown_keys());

        let source = match self.source_value {
            Some(Value::Object(fields)) => Some(fields),
            Some(other) => {
                return Err(FroshkiError::InvalidSource {
                    record: schema.name().to_string(),
                    found: other.type_name(),
                })
            }
            None => self.source,
        };

        let mut record = Record::empty(Arc::clone(&schema));
        record.assign(schema.default_values().iter().cloned(), false)?;
        if let Some(source) = source {
            record.assign(source, ignore_unknown_keys)?;
        }
        record.assign(self.overrides, false)?;

        record.pending = schema.field_names().map(str::to_string).collect();
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeSpec, Integer};

    fn login() -> Arc<RecordType> {
        RecordType::builder("AdminLogin")
            .attribute("user_id", AttributeSpec::plain().alias("login"))
            .attribute("password", AttributeSpec::plain())
            .attribute("attempts", Integer)
            .default_value("user_id", "root")
            .build()
            .unwrap()
    }

    #[test]
    fn test_fresh_record_is_fully_pending() {
        let ty = login();
        let record = Record::new(&ty).unwrap();
        let expected: BTreeSet<String> = ["user_id", "password", "attempts"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(record.pending(), expected);
        assert!(!record.is_valid());
    }

    #[test]
    fn test_merge_order() {
        let ty = login();
        let record = ty
            .record()
            .source([("user_id", "ymat"), ("password", "from-source")])
            .with("password", "explicit")
            .build()
            .unwrap();
        assert_eq!(record.get("user_id").unwrap(), &Value::from("ymat"));
        assert_eq!(record.get("password").unwrap(), &Value::from("explicit"));
        assert_eq!(record.get("attempts").unwrap(), &Value::Null);
    }

    #[test]
    fn test_alias_is_input_only() {
        let ty = login();
        let mut record = ty.record().with("login", "ymat").build().unwrap();
        assert_eq!(record.get("user_id").unwrap(), &Value::from("ymat"));
        assert!(record.get("login").unwrap_err().is_unknown_attribute());
        assert!(record.set("login", "x").is_err());
        assert!(!record.data().contains_key("login"));
    }

    #[test]
    fn test_direct_write_marks_pending() {
        let ty = login();
        let mut record = ty.record().with("attempts", 1).build().unwrap();
        record.validate();
        assert!(record.pending().is_empty());

        record.set("attempts", "x").unwrap();
        assert_eq!(record.pending().into_iter().collect::<Vec<_>>(), vec!["attempts"]);
        assert_eq!(record.get("attempts").unwrap(), &Value::from("x"));
        assert!(!record.is_valid());
    }

    #[test]
    fn test_update_is_all_or_nothing() {
        let ty = login();
        let mut record = Record::new(&ty).unwrap();
        let err = record
            .update([("password", "new"), ("nope", "x")])
            .unwrap_err();
        assert!(err.is_unknown_attribute());
        assert_eq!(record.get("password").unwrap(), &Value::Null);

        record.update([("login", "admin"), ("password", "new")]).unwrap();
        assert_eq!(record.get("user_id").unwrap(), &Value::from("admin"));
    }

    #[test]
    fn test_source_value_must_be_object() {
        let ty = login();
        let err = ty.record().source_value(vec![1, 2]).build().unwrap_err();
        assert!(matches!(err, FroshkiError::InvalidSource { found: "array", .. }));

        let source = Value::Object(vec![("password".to_string(), Value::from("pw"))]);
        let record = ty.record().source_value(source).build().unwrap();
        assert_eq!(record.value("password"), &Value::from("pw"));
    }

    #[test]
    fn test_unknown_default_fails() {
        let ty = RecordType::builder("Broken")
            .attribute("a", AttributeSpec::plain())
            .default_value("b", 1)
            .ignore_unknown_keys(true)
            .build()
            .unwrap();
        let err = Record::new(&ty).unwrap_err();
        assert_eq!(err, FroshkiError::unknown("Broken", "b"));
    }
}
