//! Error types for froshki
//!
//! Only schema-shape problems surface as [`FroshkiError`]. Conversion and
//! validation failures are captured per field and reported through
//! [`Record::errors`](crate::Record::errors).

use crate::types::Value;
use thiserror::Error;

/// Result type alias for froshki operations
pub type Result<T> = std::result::Result<T, FroshkiError>;

/// Outcome of validating a single attribute: the value to store, or the
/// message recorded for the field.
pub type AttributeResult = std::result::Result<Value, String>;

/// Schema errors raised while declaring record types or assigning values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FroshkiError {
    /// A key matched neither a registered field nor an alias
    #[error("'{record}' has no attribute {name}")]
    UnknownAttribute { record: String, name: String },

    /// Two of a type's own attributes claim the same alias
    #[error("'{record}' declares alias '{alias}' for both '{first}' and '{second}'")]
    DuplicateAlias {
        record: String,
        alias: String,
        first: String,
        second: String,
    },

    /// An alias collides with another field declared on the same type
    #[error("'{record}' alias '{alias}' of '{field}' shadows a declared field")]
    AliasShadowsField {
        record: String,
        alias: String,
        field: String,
    },

    #[error("'{record}' has an invalid field name {name:?}")]
    InvalidFieldName { record: String, name: String },

    #[error("'{record}' registers validator '{name}' twice")]
    DuplicateValidator { record: String, name: String },

    /// Validator errors share the error map with fields, so names must differ
    #[error("'{record}' validator '{name}' shadows a declared field")]
    ValidatorShadowsField { record: String, name: String },

    /// A source given as a `Value` was not an object
    #[error("'{record}' source must be an object, got {found}")]
    InvalidSource { record: String, found: &'static str },
}

impl FroshkiError {
    /// Returns true if this error reports an unmatched input key
    pub fn is_unknown_attribute(&self) -> bool {
        matches!(self, FroshkiError::UnknownAttribute { .. })
    }

    pub(crate) fn unknown(record: &str, name: &str) -> Self {
        FroshkiError::UnknownAttribute {
            record: record.to_string(),
            name: name.to_string(),
        }
    }
}

/// Failure of an attribute's `transform` step
///
/// Never propagated past [`AttributeSpec::checked_validate`](crate::AttributeSpec::checked_validate),
/// which turns it into a `data conversion error` message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ConversionError(pub String);

impl ConversionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
