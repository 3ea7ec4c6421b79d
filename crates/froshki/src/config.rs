//! Per-type configuration
//!
//! Options left unset are inherited from base record types, then fall back
//! to `false`.

#[cfg(feature = "serde")]
use serde::Deserialize;

// ============================================================================
// Record Config
// ============================================================================

/// Configuration options for a record type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct RecordConfig {
    /// Drop unknown keys of a `source` mapping instead of failing.
    /// Keyword-style overrides and defaults are always strict.
    pub ignore_unknown_keys: Option<bool>,

    /// Also run cross-field validators declared on base types
    pub inherit_validators: Option<bool>,
}

impl RecordConfig {
    /// Create a new config with every option unset
    pub fn new() -> Self {
        Self::default()
    }

    /// Set unknown-key tolerance for `source` mappings
    pub fn ignore_unknown_keys(mut self, ignore: bool) -> Self {
        self.ignore_unknown_keys = Some(ignore);
        self
    }

    /// Set validator inheritance
    pub fn inherit_validators(mut self, inherit: bool) -> Self {
        self.inherit_validators = Some(inherit);
        self
    }

    /// Fill unset options from `base`
    pub fn or(self, base: RecordConfig) -> Self {
        Self {
            ignore_unknown_keys: self.ignore_unknown_keys.or(base.ignore_unknown_keys),
            inherit_validators: self.inherit_validators.or(base.inherit_validators),
        }
    }

    /// Effective unknown-key tolerance
    pub fn ignores_unknown_keys(&self) -> bool {
        self.ignore_unknown_keys.unwrap_or(false)
    }

    /// Effective validator inheritance
    pub fn inherits_validators(&self) -> bool {
        self.inherit_validators.unwrap_or(false)
    }
}
