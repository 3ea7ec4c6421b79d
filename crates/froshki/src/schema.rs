//! Record types and their schema snapshots
//!
//! A [`RecordType`] is declared once through [`RecordType::builder`]. Its
//! [`Schema`] (registered fields, aliases, validators, defaults, resolved
//! configuration) is discovered lazily, the first time the type is
//! instantiated, and cached until the type's own declaration is mutated with
//! [`RecordType::add_attribute`] or [`RecordType::remove_attribute`].
//!
//! # Composition
//!
//! A type may extend several bases. Bases are merged farthest first: the
//! last base listed is applied first and the first base listed last, then
//! the type's own attributes, so own declarations always win and earlier
//! bases win over later ones. An input key that is both a field name and an
//! alias resolves to the field.
//!
//! Declaring a derived type discovers its bases' schemas, since a validator
//! may not take the name of an inherited field.

use crate::attribute::AttributeSpec;
use crate::config::RecordConfig;
use crate::descriptor::FieldDescriptor;
use crate::errors::{FroshkiError, Result};
use crate::hooks::ValidationHook;
use crate::types::Value;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Declaration
// ============================================================================

/// What a type declares itself, before composition with its bases
#[derive(Debug, Clone, Default)]
struct Declaration {
    attributes: Vec<(String, Arc<AttributeSpec>)>,
    default_values: Option<Vec<(String, Value)>>,
    validators: Vec<(String, ValidationHook)>,
    config: RecordConfig,
}

impl Declaration {
    fn upsert_attribute(&mut self, name: String, spec: Arc<AttributeSpec>) {
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = spec,
            None => self.attributes.push((name, spec)),
        }
    }

    /// `inherited` holds the field names composed from the bases
    fn check(&self, record: &str, inherited: &HashSet<String>) -> Result<()> {
        let names: HashSet<&str> = self.attributes.iter().map(|(n, _)| n.as_str()).collect();
        let mut alias_owners: HashMap<&str, &str> = HashMap::new();

        for (name, spec) in &self.attributes {
            if name.trim().is_empty() {
                return Err(FroshkiError::InvalidFieldName {
                    record: record.to_string(),
                    name: name.clone(),
                });
            }
            let Some(alias) = spec.key_alias() else {
                continue;
            };
            if alias != name && names.contains(alias) {
                return Err(FroshkiError::AliasShadowsField {
                    record: record.to_string(),
                    alias: alias.to_string(),
                    field: name.clone(),
                });
            }
            if let Some(first) = alias_owners.insert(alias, name.as_str()) {
                return Err(FroshkiError::DuplicateAlias {
                    record: record.to_string(),
                    alias: alias.to_string(),
                    first: first.to_string(),
                    second: name.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        for (name, _) in &self.validators {
            if names.contains(name.as_str()) || inherited.contains(name) {
                return Err(FroshkiError::ValidatorShadowsField {
                    record: record.to_string(),
                    name: name.clone(),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(FroshkiError::DuplicateValidator {
                    record: record.to_string(),
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Schema Snapshot
// ============================================================================

/// Immutable metadata of a record type, shared by its records
#[derive(Debug)]
pub struct Schema {
    record: String,
    generation: u64,
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
    aliases: HashMap<String, String>,
    validators: Vec<(String, ValidationHook)>,
    default_values: Option<Vec<(String, Value)>>,
    config: RecordConfig,
}

impl Schema {
    /// Name of the record type this snapshot describes
    pub fn name(&self) -> &str {
        &self.record
    }

    /// Declaration generation the snapshot was computed from
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Registered fields in registration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldDescriptor::name)
    }

    /// Alias → field name
    pub fn aliases(&self) -> &HashMap<String, String> {
        &self.aliases
    }

    /// Resolve an input key: a field name first, then an alias
    pub fn resolve_key(&self, key: &str) -> Option<&FieldDescriptor> {
        self.field(key)
            .or_else(|| self.aliases.get(key).and_then(|target| self.field(target)))
    }

    /// Cross-field validators in run order
    pub fn validators(&self) -> &[(String, ValidationHook)] {
        &self.validators
    }

    /// Effective default values (own, or inherited from the nearest base)
    pub fn default_values(&self) -> &[(String, Value)] {
        self.default_values.as_deref().unwrap_or_default()
    }

    /// Effective configuration
    pub fn config(&self) -> RecordConfig {
        self.config
    }

    fn insert_field(&mut self, field: FieldDescriptor) {
        match self.index.get(field.name()) {
            Some(&i) => self.fields[i] = field,
            None => {
                self.index.insert(field.name().to_string(), self.fields.len());
                self.fields.push(field);
            }
        }
    }

    fn insert_validator(&mut self, name: &str, hook: &ValidationHook) {
        match self.validators.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = hook.clone(),
            None => self.validators.push((name.to_string(), hook.clone())),
        }
    }
}

// ============================================================================
// Record Type
// ============================================================================

#[derive(Debug)]
struct TypeState {
    declaration: Declaration,
    generation: u64,
    schema: Option<Arc<Schema>>,
}

/// A declared record type
pub struct RecordType {
    name: String,
    bases: Vec<Arc<RecordType>>,
    state: RwLock<TypeState>,
}

impl RecordType {
    /// Start declaring a record type
    pub fn builder(name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: name.into(),
            bases: Vec::new(),
            declaration: Declaration::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bases(&self) -> &[Arc<RecordType>] {
        &self.bases
    }

    /// Number of mutations applied to this type's own declaration
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// Whether the schema has been discovered for the current declaration
    pub fn is_finalized(&self) -> bool {
        self.state.read().schema.is_some()
    }

    /// Current schema snapshot, discovering it if needed
    pub fn schema(&self) -> Arc<Schema> {
        if let Some(schema) = &self.state.read().schema {
            return Arc::clone(schema);
        }

        let (declaration, generation) = {
            let state = self.state.read();
            (state.declaration.clone(), state.generation)
        };
        let schema = Arc::new(self.discover(&declaration, generation));

        let mut state = self.state.write();
        if state.generation == generation {
            if let Some(existing) = &state.schema {
                return Arc::clone(existing);
            }
            state.schema = Some(Arc::clone(&schema));
        }
        schema
    }

    /// Spec of a registered field (own or inherited)
    pub fn attribute(&self, name: &str) -> Option<Arc<AttributeSpec>> {
        self.schema().field(name).map(|f| Arc::clone(f.shared_spec()))
    }

    pub fn field_names(&self) -> Vec<String> {
        self.schema().field_names().map(str::to_string).collect()
    }

    pub fn nullable_fields(&self) -> Vec<String> {
        self.schema()
            .fields()
            .iter()
            .filter(|f| f.spec().is_nullable())
            .map(|f| f.name().to_string())
            .collect()
    }

    pub fn aliases(&self) -> HashMap<String, String> {
        self.schema().aliases().clone()
    }

    /// Declare (or redeclare) an attribute on this type
    ///
    /// Invalidates this type's cached schema; records built earlier keep the
    /// snapshot they were built with.
    pub fn add_attribute(&self, name: impl Into<String>, spec: impl Into<AttributeSpec>) -> Result<()> {
        let inherited = inherited_fields(&self.bases);
        let mut state = self.state.write();
        let mut declaration = state.declaration.clone();
        declaration.upsert_attribute(name.into(), Arc::new(spec.into()));
        declaration.check(&self.name, &inherited)?;
        state.declaration = declaration;
        self.invalidate(&mut state);
        Ok(())
    }

    /// Remove an attribute declared by this type itself
    ///
    /// Returns `false` when the type does not declare `name` (inherited
    /// fields cannot be removed from a derived type).
    pub fn remove_attribute(&self, name: &str) -> bool {
        let mut state = self.state.write();
        let before = state.declaration.attributes.len();
        state.declaration.attributes.retain(|(n, _)| n != name);
        if state.declaration.attributes.len() == before {
            return false;
        }
        self.invalidate(&mut state);
        true
    }

    fn invalidate(&self, state: &mut TypeState) {
        state.generation += 1;
        if state.schema.take().is_some() {
            tracing::debug!(
                "schema of '{}' invalidated (generation {})",
                self.name,
                state.generation
            );
        }
    }

    fn discover(&self, declaration: &Declaration, generation: u64) -> Schema {
        let mut schema = Schema {
            record: self.name.clone(),
            generation,
            fields: Vec::new(),
            index: HashMap::new(),
            aliases: HashMap::new(),
            validators: Vec::new(),
            default_values: declaration.default_values.clone(),
            config: declaration.config,
        };

        let base_schemas: Vec<Arc<Schema>> = self.bases.iter().map(|b| b.schema()).collect();

        for base in &base_schemas {
            schema.config = schema.config.or(base.config);
            if schema.default_values.is_none() {
                schema.default_values = base.default_values.clone();
            }
        }
        let inherit_validators = schema.config.inherits_validators();

        for base in base_schemas.iter().rev() {
            for field in base.fields() {
                schema.insert_field(field.clone());
            }
            for (alias, target) in base.aliases() {
                schema.aliases.insert(alias.clone(), target.clone());
            }
            if inherit_validators {
                for (name, hook) in base.validators() {
                    schema.insert_validator(name, hook);
                }
            }
        }

        for (name, spec) in &declaration.attributes {
            if let Some(alias) = spec.key_alias() {
                schema.aliases.insert(alias.to_string(), name.clone());
            }
            schema.insert_field(FieldDescriptor::new(name.clone(), Arc::clone(spec)));
        }
        for (name, hook) in &declaration.validators {
            schema.insert_validator(name, hook);
        }
        for (name, _) in &schema.validators {
            if schema.index.contains_key(name) {
                tracing::warn!(
                    "validator '{}.{}' shares its name with a field; field errors take precedence",
                    self.name,
                    name
                );
            }
        }

        tracing::debug!(
            "discovered schema for '{}' (generation {}): {} fields, {} aliases, {} validators",
            self.name,
            generation,
            schema.fields.len(),
            schema.aliases.len(),
            schema.validators.len()
        );
        schema
    }
}

fn inherited_fields(bases: &[Arc<RecordType>]) -> HashSet<String> {
    bases
        .iter()
        .flat_map(|base| base.schema().field_names().map(str::to_string).collect::<Vec<_>>())
        .collect()
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field(
                "bases",
                &self.bases.iter().map(|b| b.name()).collect::<Vec<_>>(),
            )
            .field("generation", &self.generation())
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`RecordType`]
#[derive(Debug)]
pub struct RecordTypeBuilder {
    name: String,
    bases: Vec<Arc<RecordType>>,
    declaration: Declaration,
}

impl RecordTypeBuilder {
    /// Include the fields (and inherited settings) of `base`
    pub fn extends(mut self, base: &Arc<RecordType>) -> Self {
        self.bases.push(Arc::clone(base));
        self
    }

    /// Declare an attribute; redeclaring a name replaces its spec
    pub fn attribute(mut self, name: impl Into<String>, spec: impl Into<AttributeSpec>) -> Self {
        self.declaration
            .upsert_attribute(name.into(), Arc::new(spec.into()));
        self
    }

    /// Add one type-level default value
    pub fn default_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.declaration
            .default_values
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    /// Replace the type-level default values
    pub fn default_values<K, V>(mut self, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.declaration.default_values = Some(
            values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Register a cross-field validator
    pub fn validator(mut self, name: impl Into<String>, hook: ValidationHook) -> Self {
        self.declaration.validators.push((name.into(), hook));
        self
    }

    /// Type-level default for unknown keys in `source` mappings
    pub fn ignore_unknown_keys(mut self, ignore: bool) -> Self {
        self.declaration.config = self.declaration.config.ignore_unknown_keys(ignore);
        self
    }

    /// Also run validators declared on base types
    pub fn inherit_validators(mut self, inherit: bool) -> Self {
        self.declaration.config = self.declaration.config.inherit_validators(inherit);
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: RecordConfig) -> Self {
        self.declaration.config = config;
        self
    }

    pub fn build(self) -> Result<Arc<RecordType>> {
        self.declaration
            .check(&self.name, &inherited_fields(&self.bases))?;
        Ok(Arc::new(RecordType {
            name: self.name,
            bases: self.bases,
            state: RwLock::new(TypeState {
                declaration: self.declaration,
                generation: 0,
                schema: None,
            }),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Integer, Text};

    fn base() -> Arc<RecordType> {
        RecordType::builder("Base")
            .attribute("id", Integer)
            .attribute("name", AttributeSpec::new(Text).alias("full_name"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_schema_is_lazy_and_cached() {
        let ty = base();
        assert!(!ty.is_finalized());

        let first = ty.schema();
        assert!(ty.is_finalized());
        let second = ty.schema();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.field_names().collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn test_mutation_invalidates_exact_type() {
        let ty = base();
        let before = ty.schema();

        ty.add_attribute("email", AttributeSpec::plain()).unwrap();
        assert!(!ty.is_finalized());
        assert_eq!(ty.generation(), 1);

        let after = ty.schema();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(after.field("email").is_some());
        assert!(before.field("email").is_none());

        assert!(ty.remove_attribute("email"));
        assert!(!ty.remove_attribute("email"));
        assert!(ty.schema().field("email").is_none());
    }

    #[test]
    fn test_derived_fields_override_base() {
        let base = base();
        let derived = RecordType::builder("Derived")
            .extends(&base)
            .attribute("id", Text)
            .attribute("extra", AttributeSpec::plain().nullable())
            .build()
            .unwrap();

        let schema = derived.schema();
        assert_eq!(
            schema.field_names().collect::<Vec<_>>(),
            vec!["id", "name", "extra"]
        );
        let id = schema.field("id").unwrap();
        assert_eq!(
            id.spec().checked_validate(&Value::Int(5)),
            Ok(Value::from("5"))
        );
        assert_eq!(schema.resolve_key("full_name").unwrap().name(), "name");
        assert_eq!(derived.nullable_fields(), vec!["extra".to_string()]);
    }

    #[test]
    fn test_first_listed_base_wins() {
        let left = RecordType::builder("Left")
            .attribute("value", Integer)
            .build()
            .unwrap();
        let right = RecordType::builder("Right")
            .attribute("value", Text)
            .attribute("note", AttributeSpec::plain())
            .build()
            .unwrap();
        let both = RecordType::builder("Both")
            .extends(&left)
            .extends(&right)
            .build()
            .unwrap();

        let value = both.attribute("value").unwrap();
        assert_eq!(value.checked_validate(&Value::from("3")), Ok(Value::Int(3)));
        assert!(both.attribute("note").is_some());
    }

    #[test]
    fn test_field_name_beats_alias_across_bases() {
        let aliased = RecordType::builder("Aliased")
            .attribute("user_id", AttributeSpec::plain().alias("login"))
            .build()
            .unwrap();
        let direct = RecordType::builder("Direct")
            .attribute("login", AttributeSpec::plain())
            .build()
            .unwrap();
        let composed = RecordType::builder("Composed")
            .extends(&aliased)
            .extends(&direct)
            .build()
            .unwrap();

        let schema = composed.schema();
        assert_eq!(schema.resolve_key("login").unwrap().name(), "login");
        assert_eq!(schema.aliases().get("login").map(String::as_str), Some("user_id"));
    }

    #[test]
    fn test_declaration_errors() {
        let err = RecordType::builder("Dup")
            .attribute("a", AttributeSpec::plain().alias("x"))
            .attribute("b", AttributeSpec::plain().alias("x"))
            .build()
            .unwrap_err();
        assert!(matches!(err, FroshkiError::DuplicateAlias { .. }));

        let err = RecordType::builder("Shadow")
            .attribute("a", AttributeSpec::plain().alias("b"))
            .attribute("b", AttributeSpec::plain())
            .build()
            .unwrap_err();
        assert!(matches!(err, FroshkiError::AliasShadowsField { .. }));

        let err = RecordType::builder("Empty")
            .attribute("", AttributeSpec::plain())
            .build()
            .unwrap_err();
        assert!(matches!(err, FroshkiError::InvalidFieldName { .. }));

        let err = RecordType::builder("Hooks")
            .attribute("a", AttributeSpec::plain())
            .validator("check", ValidationHook::new(|_| true))
            .validator("check", ValidationHook::new(|_| true))
            .build()
            .unwrap_err();
        assert!(matches!(err, FroshkiError::DuplicateValidator { .. }));

        let err = RecordType::builder("HookField")
            .attribute("a", AttributeSpec::plain())
            .validator("a", ValidationHook::new(|_| true))
            .build()
            .unwrap_err();
        assert!(matches!(err, FroshkiError::ValidatorShadowsField { .. }));

        let err = RecordType::builder("InheritedHookField")
            .extends(&base())
            .validator("id", ValidationHook::new(|_| true))
            .build()
            .unwrap_err();
        assert!(matches!(err, FroshkiError::ValidatorShadowsField { .. }));
    }

    #[test]
    fn test_failed_mutation_leaves_type_untouched() {
        let ty = base();
        ty.schema();
        let err = ty
            .add_attribute("other", AttributeSpec::plain().alias("full_name"))
            .unwrap_err();
        assert!(matches!(err, FroshkiError::DuplicateAlias { .. }));
        assert!(ty.is_finalized());
        assert_eq!(ty.generation(), 0);
    }

    #[test]
    fn test_defaults_and_config_are_inherited() {
        let base = RecordType::builder("Base")
            .attribute("user_id", AttributeSpec::plain())
            .default_value("user_id", "root")
            .ignore_unknown_keys(true)
            .build()
            .unwrap();
        let derived = RecordType::builder("Derived")
            .extends(&base)
            .attribute("password", AttributeSpec::plain())
            .build()
            .unwrap();
        let overriding = RecordType::builder("Overriding")
            .extends(&base)
            .default_values(Vec::<(String, Value)>::new())
            .ignore_unknown_keys(false)
            .build()
            .unwrap();

        let schema = derived.schema();
        assert_eq!(schema.default_values(), &[("user_id".to_string(), Value::from("root"))]);
        assert!(schema.config().ignores_unknown_keys());

        let schema = overriding.schema();
        assert!(schema.default_values().is_empty());
        assert!(!schema.config().ignores_unknown_keys());
    }

    #[test]
    fn test_validators_not_inherited_by_default() {
        let base = RecordType::builder("Base")
            .attribute("a", AttributeSpec::plain())
            .validator("always_fails", ValidationHook::new(|_| false))
            .build()
            .unwrap();
        let plain = RecordType::builder("Plain").extends(&base).build().unwrap();
        let inheriting = RecordType::builder("Inheriting")
            .extends(&base)
            .inherit_validators(true)
            .build()
            .unwrap();

        assert!(plain.schema().validators().is_empty());
        assert_eq!(inheriting.schema().validators().len(), 1);
    }
}
