//! Declarative value checks
//!
//! A [`Check`] validates (and may normalize) a [`Value`], failing with a
//! [`CheckError`] carrying a plain message. Checks compose: [`Check::All`]
//! chains them, [`Check::AnyOf`] accepts the first that passes, and
//! [`Check::and_then`] feeds a passing value to a conversion.

use crate::formats::Format;
use froshki::Value;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a [`Check`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CheckError {
    pub message: String,
}

impl CheckError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

fn expected(what: &str, value: &Value) -> CheckError {
    CheckError::new(format!("Expected {}, got {}", what, value.type_name()))
}

// ============================================================================
// Converter
// ============================================================================

/// Conversion function wrapped by [`Converter`]
pub type ConvertFn = Arc<dyn Fn(Value) -> Result<Value, CheckError> + Send + Sync>;

/// User-supplied conversion step of a [`Check`]
#[derive(Clone)]
pub struct Converter(ConvertFn);

impl Converter {
    pub fn new<F>(convert: F) -> Self
    where
        F: Fn(Value) -> Result<Value, CheckError> + Send + Sync + 'static,
    {
        Self(Arc::new(convert))
    }

    pub fn convert(&self, value: Value) -> Result<Value, CheckError> {
        (self.0)(value)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Converter(<fn>)")
    }
}

// ============================================================================
// Check
// ============================================================================

/// A value check
#[derive(Debug, Clone)]
pub enum Check {
    /// Accept anything
    Any,
    /// Boolean
    Bool,
    /// Integer within inclusive bounds
    Int { min: Option<i64>, max: Option<i64> },
    /// Number (integers accepted) within inclusive bounds
    Float { min: Option<f64>, max: Option<f64> },
    /// String with character-length bounds and an optional pattern
    Str {
        min_length: Option<usize>,
        max_length: Option<usize>,
        pattern: Option<Regex>,
    },
    /// String in a named format
    Format(Format),
    /// Value equal to one of the listed values
    OneOf(Vec<Value>),
    /// List whose items all pass `items`
    List {
        items: Box<Check>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    /// Null, or a value passing the inner check
    Optional(Box<Check>),
    /// Every check in order, each receiving the previous output
    All(Vec<Check>),
    /// The first passing alternative
    AnyOf(Vec<Check>),
    /// Conversion of the value, failing with its own message
    Map(Converter),
}

impl Check {
    pub fn int() -> Self {
        Check::Int { min: None, max: None }
    }

    pub fn int_range(min: Option<i64>, max: Option<i64>) -> Self {
        Check::Int { min, max }
    }

    pub fn float_range(min: Option<f64>, max: Option<f64>) -> Self {
        Check::Float { min, max }
    }

    pub fn string() -> Self {
        Check::Str {
            min_length: None,
            max_length: None,
            pattern: None,
        }
    }

    pub fn length(min_length: Option<usize>, max_length: Option<usize>) -> Self {
        Check::Str {
            min_length,
            max_length,
            pattern: None,
        }
    }

    /// String matching `pattern` (searched, anchor it for a full match)
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Check::Str {
            min_length: None,
            max_length: None,
            pattern: Some(Regex::new(pattern)?),
        })
    }

    pub fn email() -> Self {
        Check::Format(Format::Email)
    }

    pub fn url() -> Self {
        Check::Format(Format::Url)
    }

    pub fn date() -> Self {
        Check::Format(Format::Date)
    }

    pub fn one_of<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Check::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn list(items: Check) -> Self {
        Check::List {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    pub fn optional(inner: Check) -> Self {
        Check::Optional(Box::new(inner))
    }

    /// Conversion step on its own
    pub fn map<F>(convert: F) -> Self
    where
        F: Fn(Value) -> Result<Value, CheckError> + Send + Sync + 'static,
    {
        Check::Map(Converter::new(convert))
    }

    /// Run `convert` on the output of this check
    ///
    /// ```rust
    /// use froshki::Value;
    /// use froshki_ext::{Check, CheckError};
    ///
    /// let members = Check::pattern(r"^\d[\d,]*$").unwrap().and_then(|value| {
    ///     let text = value.as_str().unwrap_or_default();
    ///     text.split(',')
    ///         .map(|n| n.parse::<i64>().map(Value::Int))
    ///         .collect::<Result<Vec<_>, _>>()
    ///         .map(Value::List)
    ///         .map_err(|e| CheckError::new(e.to_string()))
    /// });
    /// assert_eq!(
    ///     members.check(&Value::from("314,3219")),
    ///     Ok(Value::from(vec![314, 3219]))
    /// );
    /// ```
    pub fn and_then<F>(self, convert: F) -> Self
    where
        F: Fn(Value) -> Result<Value, CheckError> + Send + Sync + 'static,
    {
        let mut checks = match self {
            Check::All(checks) => checks,
            other => vec![other],
        };
        checks.push(Check::map(convert));
        Check::All(checks)
    }

    /// Validate `value`, returning the (possibly normalized) value
    pub fn check(&self, value: &Value) -> Result<Value, CheckError> {
        match self {
            Check::Any => Ok(value.clone()),
            Check::Bool => match value {
                Value::Bool(_) => Ok(value.clone()),
                _ => Err(expected("boolean", value)),
            },
            Check::Int { min, max } => {
                let n = value.as_int().ok_or_else(|| expected("integer", value))?;
                check_bounds(n, *min, *max)?;
                Ok(value.clone())
            }
            Check::Float { min, max } => {
                let n = value.as_float().ok_or_else(|| expected("number", value))?;
                check_bounds(n, *min, *max)?;
                Ok(Value::Float(n))
            }
            Check::Str {
                min_length,
                max_length,
                pattern,
            } => {
                let s = value.as_str().ok_or_else(|| expected("string", value))?;
                check_length(s, *min_length, *max_length)?;
                if let Some(re) = pattern {
                    if !re.is_match(s) {
                        return Err(CheckError::new(format!(
                            "String does not match pattern: {}",
                            re.as_str()
                        )));
                    }
                }
                Ok(value.clone())
            }
            Check::Format(format) => {
                let s = value.as_str().ok_or_else(|| expected("string", value))?;
                if format.matches(s) {
                    Ok(value.clone())
                } else {
                    Err(CheckError::new(format!("Invalid {} format", format.describe())))
                }
            }
            Check::OneOf(allowed) => {
                if allowed.contains(value) {
                    Ok(value.clone())
                } else {
                    let listed: Vec<String> = allowed.iter().map(Value::to_string).collect();
                    Err(CheckError::new(format!(
                        "Value must be one of: [{}]",
                        listed.join(", ")
                    )))
                }
            }
            Check::List {
                items,
                min_items,
                max_items,
            } => {
                let list = value.as_list().ok_or_else(|| expected("array", value))?;
                if let Some(min) = min_items {
                    if list.len() < *min {
                        return Err(CheckError::new(format!(
                            "List must have at least {} items (got {})",
                            min,
                            list.len()
                        )));
                    }
                }
                if let Some(max) = max_items {
                    if list.len() > *max {
                        return Err(CheckError::new(format!(
                            "List must have at most {} items (got {})",
                            max,
                            list.len()
                        )));
                    }
                }
                list.iter()
                    .enumerate()
                    .map(|(i, item)| {
                        items
                            .check(item)
                            .map_err(|e| CheckError::new(format!("[{}]: {}", i, e.message)))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List)
            }
            Check::Optional(inner) => {
                if value.is_null() {
                    Ok(Value::Null)
                } else {
                    inner.check(value)
                }
            }
            Check::All(checks) => checks
                .iter()
                .try_fold(value.clone(), |current, check| check.check(&current)),
            Check::AnyOf(alternatives) => {
                let mut messages = Vec::with_capacity(alternatives.len());
                for alternative in alternatives {
                    match alternative.check(value) {
                        Ok(checked) => return Ok(checked),
                        Err(e) => messages.push(e.message),
                    }
                }
                Err(CheckError::new(format!(
                    "No alternative matched: {}",
                    messages.join("; ")
                )))
            }
            Check::Map(converter) => converter.convert(value.clone()),
        }
    }
}

fn check_bounds<T>(n: T, min: Option<T>, max: Option<T>) -> Result<(), CheckError>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if let Some(min) = min {
        if n < min {
            return Err(CheckError::new(format!("Value must be >= {} (got {})", min, n)));
        }
    }
    if let Some(max) = max {
        if n > max {
            return Err(CheckError::new(format!("Value must be <= {} (got {})", max, n)));
        }
    }
    Ok(())
}

fn check_length(s: &str, min: Option<usize>, max: Option<usize>) -> Result<(), CheckError> {
    // characters, not bytes
    let count = s.chars().count();
    if let Some(min) = min {
        if count < min {
            return Err(CheckError::new(format!(
                "String must be at least {} characters (got {})",
                min, count
            )));
        }
    }
    if let Some(max) = max {
        if count > max {
            return Err(CheckError::new(format!(
                "String must be at most {} characters (got {})",
                max, count
            )));
        }
    }
    Ok(())
}
