//! Attributes backed by a [`Check`]

use crate::check::Check;
use froshki::{Attribute, AttributeResult, AttributeSpec, Value};

/// Attribute whose validation is delegated to a [`Check`]
///
/// `transform` is identity; a failed check becomes the plain message of
/// its [`CheckError`](crate::CheckError).
#[derive(Debug, Clone)]
pub struct CheckedAttribute {
    check: Check,
}

impl CheckedAttribute {
    pub fn new(check: Check) -> Self {
        Self { check }
    }

    pub fn check(&self) -> &Check {
        &self.check
    }
}

impl Attribute for CheckedAttribute {
    fn validate(&self, value: Value) -> AttributeResult {
        self.check.check(&value).map_err(|err| {
            tracing::trace!("check rejected {}: {}", value, err);
            err.message
        })
    }
}

/// Spec for a field validated by `check`
///
/// ```rust
/// use froshki::{RecordType, ValidationHook};
/// use froshki_ext::{check_attr, Check};
///
/// let send_inquiry = RecordType::builder("SendInquiry")
///     .attribute("user_name", check_attr(Check::string()))
///     .attribute("user_contact", check_attr(Check::email()))
///     .attribute("user_contact_confirmation", check_attr(Check::email()))
///     .validator(
///         "confirm_email",
///         ValidationHook::new(|r| r.value("user_contact") == r.value("user_contact_confirmation")),
///     )
///     .build()
///     .unwrap();
///
/// let mut inquiry = send_inquiry
///     .record()
///     .with("user_name", "yu mat")
///     .with("user_contact", "drowse314@gmail.com")
///     .with("user_contact_confirmation", "drowse314@gmail.com")
///     .build()
///     .unwrap();
/// assert!(inquiry.validate());
/// ```
pub fn check_attr(check: Check) -> AttributeSpec {
    AttributeSpec::new(CheckedAttribute::new(check))
}
