//! Attribute specifications
//!
//! An [`Attribute`] describes how a raw input is converted (`transform`) and
//! checked (`validate`). [`AttributeSpec`] wraps one together with the
//! per-field options (`nullable`, `key_alias`) and exposes the only
//! validation entry point records use, [`AttributeSpec::checked_validate`].
//!
//! # Example
//!
//! ```rust
//! use froshki::{Attribute, AttributeResult, AttributeSpec, ConversionError, Value};
//!
//! struct ResourceId;
//!
//! impl Attribute for ResourceId {
//!     fn transform(&self, input: &Value) -> Result<Value, ConversionError> {
//!         froshki::Integer.transform(input)
//!     }
//!
//!     fn validate(&self, value: Value) -> AttributeResult {
//!         match value.as_int() {
//!             Some(1 | 5 | 7 | 9) => Ok(value),
//!             _ => Err("resource id not found".to_string()),
//!         }
//!     }
//! }
//!
//! let spec = AttributeSpec::new(ResourceId);
//! assert_eq!(spec.checked_validate(&Value::from("9")), Ok(Value::Int(9)));
//! assert_eq!(
//!     spec.checked_validate(&Value::from("x")),
//!     Err("data conversion error: 'x'".to_string())
//! );
//! ```

use crate::errors::{AttributeResult, ConversionError};
use crate::types::Value;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Attribute Trait
// ============================================================================

/// Conversion and validation rules for one kind of field
///
/// Both methods have accept-everything defaults; implementors override
/// whichever step they need.
pub trait Attribute: Send + Sync {
    /// Convert a raw input into the value to store
    fn transform(&self, input: &Value) -> Result<Value, ConversionError> {
        Ok(input.clone())
    }

    /// Check a transformed value
    ///
    /// # Returns
    /// * `Ok(Value)` - value to store
    /// * `Err(String)` - error message recorded for the field
    fn validate(&self, value: Value) -> AttributeResult {
        Ok(value)
    }
}

/// Type alias for shared attribute implementations
pub type BoxedAttribute = Arc<dyn Attribute>;

// ============================================================================
// Attribute Spec
// ============================================================================

/// A declared field specification: the attribute plus field options
///
/// Immutable once declared and shared by every record of the declaring type
/// and its derived types.
#[derive(Clone)]
pub struct AttributeSpec {
    attribute: BoxedAttribute,
    nullable: bool,
    key_alias: Option<String>,
}

impl AttributeSpec {
    /// Create a spec for the given attribute (not nullable, no alias)
    pub fn new(attribute: impl Attribute + 'static) -> Self {
        Self::from_shared(Arc::new(attribute))
    }

    /// Create a spec around an attribute shared with other specs
    pub fn from_shared(attribute: BoxedAttribute) -> Self {
        Self {
            attribute,
            nullable: false,
            key_alias: None,
        }
    }

    /// Spec that stores inputs untouched and accepts everything
    pub fn plain() -> Self {
        Self::new(Plain)
    }

    /// Let a null value pass validation without running the attribute
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Accept `alias` as an alternate input key for this field
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.key_alias = Some(alias.into());
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn key_alias(&self) -> Option<&str> {
        self.key_alias.as_deref()
    }

    pub fn attribute(&self) -> &dyn Attribute {
        self.attribute.as_ref()
    }

    /// Transform then validate `raw`
    ///
    /// A failed transform short-circuits to
    /// `Err("data conversion error: <raw>")` without calling `validate`;
    /// otherwise the result of `validate` is returned as is.
    pub fn checked_validate(&self, raw: &Value) -> AttributeResult {
        match self.attribute.transform(raw) {
            Ok(value) => self.attribute.validate(value),
            Err(err) => {
                tracing::trace!("transform of {} failed: {}", raw, err);
                Err(format!("data conversion error: {raw}"))
            }
        }
    }
}

impl<A: Attribute + 'static> From<A> for AttributeSpec {
    fn from(attribute: A) -> Self {
        Self::new(attribute)
    }
}

impl fmt::Debug for AttributeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeSpec")
            .field("nullable", &self.nullable)
            .field("key_alias", &self.key_alias)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Stock Attributes
// ============================================================================

/// Identity transform, always valid
#[derive(Debug, Clone, Copy, Default)]
pub struct Plain;

impl Attribute for Plain {}

/// Integer conversion
///
/// Accepts integers, numeric strings (surrounding whitespace ignored),
/// booleans and finite floats within the `i64` range (truncated).
#[derive(Debug, Clone, Copy, Default)]
pub struct Integer;

impl Attribute for Integer {
    fn transform(&self, input: &Value) -> Result<Value, ConversionError> {
        match input {
            Value::Int(i) => Ok(Value::Int(*i)),
            Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
            Value::Float(f) if f.is_finite() => {
                let truncated = f.trunc();
                // i64::MAX as f64 rounds up to 2^63, which is out of range
                if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
                    return Err(ConversionError::new(format!("{f} is out of integer range")));
                }
                Ok(Value::Int(truncated as i64))
            }
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| ConversionError::new(e.to_string())),
            other => Err(ConversionError::new(format!(
                "cannot convert {} to integer",
                other.type_name()
            ))),
        }
    }
}

/// Text conversion of scalar inputs
#[derive(Debug, Clone, Copy, Default)]
pub struct Text;

impl Attribute for Text {
    fn transform(&self, input: &Value) -> Result<Value, ConversionError> {
        match input {
            Value::String(s) => Ok(Value::String(s.clone())),
            Value::Int(_) | Value::Float(_) | Value::Bool(_) => {
                Ok(Value::String(input.to_string()))
            }
            other => Err(ConversionError::new(format!(
                "cannot convert {} to text",
                other.type_name()
            ))),
        }
    }
}

// ============================================================================
// Function-based Attribute (for ergonomic API)
// ============================================================================

type TransformFn = Arc<dyn Fn(&Value) -> Result<Value, ConversionError> + Send + Sync>;
type ValidateFn = Arc<dyn Fn(Value) -> AttributeResult + Send + Sync>;

/// Attribute assembled from closures
///
/// ```rust
/// use froshki::{AttributeSpec, FnAttribute, Value};
///
/// let filetype = FnAttribute::new().with_validate(|value| match value.as_str() {
///     Some("pdf" | "txt" | "mobi") => Ok(value),
///     _ => Err("filetype unavailable".to_string()),
/// });
/// let spec = AttributeSpec::new(filetype);
/// assert!(spec.checked_validate(&Value::from("pdf")).is_ok());
/// ```
#[derive(Clone, Default)]
pub struct FnAttribute {
    transform_fn: Option<TransformFn>,
    validate_fn: Option<ValidateFn>,
}

impl FnAttribute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the transform step
    pub fn with_transform<F>(mut self, transform_fn: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        self.transform_fn = Some(Arc::new(transform_fn));
        self
    }

    /// Set the validate step
    pub fn with_validate<F>(mut self, validate_fn: F) -> Self
    where
        F: Fn(Value) -> AttributeResult + Send + Sync + 'static,
    {
        self.validate_fn = Some(Arc::new(validate_fn));
        self
    }
}

impl Attribute for FnAttribute {
    fn transform(&self, input: &Value) -> Result<Value, ConversionError> {
        match &self.transform_fn {
            Some(f) => f(input),
            None => Ok(input.clone()),
        }
    }

    fn validate(&self, value: Value) -> AttributeResult {
        match &self.validate_fn {
            Some(f) => f(value),
            None => Ok(value),
        }
    }
}

impl fmt::Debug for FnAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAttribute")
            .field("transform", &self.transform_fn.is_some())
            .field("validate", &self.validate_fn.is_some())
            .finish()
    }
}
