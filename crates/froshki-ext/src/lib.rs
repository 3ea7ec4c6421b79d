//! Froshki extensions
//!
//! Field specs whose validation is delegated to a declarative [`Check`]
//! instead of hand-written `validate` code. The attribute contract is the
//! same as for any other field: identity `transform`, and a `validate` that
//! reports the check's failure as a plain message.

pub mod attribute;
pub mod check;
pub mod formats;

pub use attribute::{check_attr, CheckedAttribute};
pub use check::{Check, CheckError, ConvertFn, Converter};
pub use formats::Format;
