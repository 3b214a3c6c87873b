//! Load-time invariant violations for Measure Specs and Form Binding Specs.
//!
//! These are distinct from the per-submission `Diagnostic`s in
//! [`crate::diagnostics`]: a `SpecError` means the *document itself* is
//! malformed and can never be used, regardless of which submission is being
//! processed. Callers treat any non-empty validation result as a startup
//! `SchemaViolation`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("scale '{scale_id}' references unknown item '{item_id}'")]
    UnknownItemInScale { scale_id: String, item_id: String },

    #[error("scale '{scale_id}' lists '{item_id}' in reversed_items but it is not one of the scale's items")]
    ReversedItemNotInScale { scale_id: String, item_id: String },

    #[error("scale '{scale_id}' interpretation bands do not jointly cover [{min}, {max}] without gaps or overlaps: {detail}")]
    BandCoverage {
        scale_id: String,
        min: i64,
        max: i64,
        detail: String,
    },

    #[error("item '{item_id}' response_map entry '{text}' maps to {value}, outside [{min_value}, {max_value}]")]
    ResponseMapValueOutOfRange {
        item_id: String,
        text: String,
        value: i64,
        min_value: i64,
        max_value: i64,
    },

    #[error("duplicate item_id '{0}' within measure")]
    DuplicateItemId(String),

    #[error("duplicate scale_id '{0}' within measure")]
    DuplicateScaleId(String),

    #[error("measure has no items")]
    NoItems,

    #[error("scale '{0}' has no items")]
    EmptyScale(String),
}

/// All invariant violations found for one spec, sorted deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecErrors(pub Vec<SpecError>);

impl SpecErrors {
    pub fn is_ok(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for SpecErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SpecErrors {}
