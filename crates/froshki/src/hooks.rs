//! Cross-field validation hooks
//!
//! A hook is a predicate over the whole record, run after every pending
//! field has been validated. Hooks are not wrapped in any failure handling:
//! a predicate that can fail must decide for itself to return `false`.

use crate::record::Record;
use std::fmt;
use std::sync::Arc;

type HookFn = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Record-level validator, registered by name on a record type
///
/// ```rust
/// use froshki::{AttributeSpec, RecordType, ValidationHook};
///
/// let change_password = RecordType::builder("ChangePassword")
///     .attribute("new_password", AttributeSpec::plain())
///     .attribute("confirm_new_password", AttributeSpec::plain())
///     .validator(
///         "confirm_password",
///         ValidationHook::new(|r| r.value("new_password") == r.value("confirm_new_password"))
///             .error("passwords do not match"),
///     )
///     .build()
///     .unwrap();
///
/// let mut form = change_password
///     .record()
///     .with("new_password", "s3cret")
///     .with("confirm_new_password", "s3cret")
///     .build()
///     .unwrap();
/// assert!(form.validate());
/// ```
#[derive(Clone)]
pub struct ValidationHook {
    predicate: HookFn,
    error: Option<String>,
}

impl ValidationHook {
    /// Create a hook from a predicate
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            error: None,
        }
    }

    /// Message stored under the hook's name when the predicate fails
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    pub fn message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Run the predicate against `record`
    pub fn validate(&self, name: &str, record: &Record) -> bool {
        let passed = (self.predicate)(record);
        tracing::trace!("validator '{}' on '{}': {}", name, record.record_type(), passed);
        passed
    }
}

impl fmt::Debug for ValidationHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationHook")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
