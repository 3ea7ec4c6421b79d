//! Froshki
//!
//! A small object-data-mapping and form-validation library: declare a
//! record type as a set of named attributes, populate records from defaults,
//! a source mapping and explicit values, then run a two-phase validation
//! pass (per-field, then cross-field) that records error messages per field
//! instead of failing.
//!
//! # Example
//!
//! ```rust
//! use froshki::{AttributeSpec, FnAttribute, Integer, RecordType, Value};
//!
//! let resource_id = FnAttribute::new()
//!     .with_transform(|raw| froshki::Attribute::transform(&Integer, raw))
//!     .with_validate(|value| match value.as_int() {
//!         Some(1 | 5 | 7 | 9) => Ok(value),
//!         _ => Err("resource id not found".to_string()),
//!     });
//! let filetype = FnAttribute::new().with_validate(|value| match value.as_str() {
//!     Some("pdf" | "txt" | "mobi") => Ok(value),
//!     _ => Err("filetype unavailable".to_string()),
//! });
//!
//! let download = RecordType::builder("Download")
//!     .attribute("resource_id", resource_id)
//!     .attribute("filetype", AttributeSpec::new(filetype))
//!     .build()
//!     .unwrap();
//!
//! let mut record = download
//!     .record()
//!     .with("resource_id", "9")
//!     .with("filetype", "pdf")
//!     .build()
//!     .unwrap();
//! assert!(record.validate());
//! assert_eq!(record.get("resource_id").unwrap(), &Value::Int(9));
//!
//! record.set("resource_id", "99").unwrap();
//! assert!(!record.validate());
//! assert_eq!(record.errors()["resource_id"], "resource id not found");
//! assert_eq!(record.data()["resource_id"], Value::from("99"));
//! ```
//!
//! # Features
//!
//! - **Default**: core engine
//! - **serde**: `serde_json::Value` conversions and deserializable
//!   [`RecordConfig`]

// Public modules
pub mod attribute;
pub mod config;
pub mod descriptor;
pub mod errors;
pub mod hooks;
pub mod record;
pub mod schema;
pub mod types;

// Re-export commonly used types
pub use attribute::{Attribute, AttributeSpec, BoxedAttribute, FnAttribute, Integer, Plain, Text};
pub use config::RecordConfig;
pub use descriptor::FieldDescriptor;
pub use errors::{AttributeResult, ConversionError, FroshkiError, Result};
pub use hooks::ValidationHook;
pub use record::{Record, RecordBuilder};
pub use schema::{RecordType, RecordTypeBuilder, Schema};
pub use types::Value;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
