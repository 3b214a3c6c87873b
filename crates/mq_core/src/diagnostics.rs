//! Per-submission diagnostics taxonomy (§7) and the wire shape for the
//! diagnostics record (§6).
//!
//! Mirrors the teacher's `ValidationIssue`/`ValidationReport` split: a small
//! `Severity`, a stable `&'static str` code, a free-text detail, and an
//! optional item reference, collected into a report that is sorted into a
//! deterministic order before being handed to the caller. Two runs over
//! identical input must therefore emit byte-identical diagnostics.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// Semantic diagnostic codes (§7). `UnknownItem` is informational and always
/// a warning; the rest carry the severity documented in the spec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticCode {
    MissingBinding,
    DuplicateField,
    UnrecognizedValue,
    ValueOutOfRange,
    ScaleIncomplete,
    ScaleNotScorable,
    ScaleOutOfRange,
    NoInterpretationBand,
    UnmappedFieldSkipped,
    UnknownItem,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::MissingBinding => "MISSING_BINDING",
            DiagnosticCode::DuplicateField => "DUPLICATE_FIELD",
            DiagnosticCode::UnrecognizedValue => "UNRECOGNIZED_VALUE",
            DiagnosticCode::ValueOutOfRange => "VALUE_OUT_OF_RANGE",
            DiagnosticCode::ScaleIncomplete => "SCALE_INCOMPLETE",
            DiagnosticCode::ScaleNotScorable => "SCALE_NOT_SCORABLE",
            DiagnosticCode::ScaleOutOfRange => "SCALE_OUT_OF_RANGE",
            DiagnosticCode::NoInterpretationBand => "NO_INTERPRETATION_BAND",
            DiagnosticCode::UnmappedFieldSkipped => "UNMAPPED_FIELD_SKIPPED",
            DiagnosticCode::UnknownItem => "UNKNOWN_ITEM",
        }
    }

    pub fn default_severity(self) -> Severity {
        match self {
            DiagnosticCode::MissingBinding
            | DiagnosticCode::DuplicateField
            | DiagnosticCode::UnrecognizedValue
            | DiagnosticCode::ValueOutOfRange
            | DiagnosticCode::ScaleIncomplete
            | DiagnosticCode::ScaleNotScorable
            | DiagnosticCode::ScaleOutOfRange
            | DiagnosticCode::NoInterpretationBand => Severity::Error,
            DiagnosticCode::UnmappedFieldSkipped | DiagnosticCode::UnknownItem => Severity::Warning,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, detail: impl Into<String>, item_id: Option<String>) -> Self {
        Diagnostic {
            severity: code.default_severity(),
            code: code.as_str().to_string(),
            detail: detail.into(),
            item_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct DiagnosticsSummary {
    pub items_present: u32,
    pub items_missing: u32,
    pub scales_scored: u32,
    pub scales_not_scorable: u32,
}

/// Per-submission diagnostics report (§6). `errors`/`warnings` are split by
/// severity and each list is sorted stably (by code, then item_id, then
/// detail) so repeated runs over identical input are byte-identical.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub submission_id: String,
    pub measure_id: String,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub summary: DiagnosticsSummary,
}

impl Diagnostics {
    pub fn new(submission_id: impl Into<String>, measure_id: impl Into<String>) -> Self {
        Diagnostics {
            submission_id: submission_id.into(),
            measure_id: measure_id.into(),
            errors: Vec::new(),
            warnings: Vec::new(),
            summary: DiagnosticsSummary::default(),
        }
    }

    pub fn push(&mut self, d: Diagnostic) {
        match d.severity {
            Severity::Error => self.errors.push(d),
            Severity::Warning => self.warnings.push(d),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_code(&self, code: DiagnosticCode) -> bool {
        let s = code.as_str();
        self.errors.iter().any(|d| d.code == s) || self.warnings.iter().any(|d| d.code == s)
    }

    /// Sort both lists into a stable, deterministic order. Called once
    /// before a diagnostics record is emitted.
    pub fn sort_stably(&mut self) {
        sort_diagnostics(&mut self.errors);
        sort_diagnostics(&mut self.warnings);
    }
}

fn sort_diagnostics(issues: &mut [Diagnostic]) {
    issues.sort_by(|a, b| {
        a.code
            .cmp(&b.code)
            .then_with(|| a.item_id.cmp(&b.item_id))
            .then_with(|| a.detail.cmp(&b.detail))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_is_stable_and_deterministic() {
        let mut d = Diagnostics::new("sub-1", "phq9");
        d.push(Diagnostic::new(
            DiagnosticCode::UnrecognizedValue,
            "b".into(),
            Some("phq9_item3".into()),
        ));
        d.push(Diagnostic::new(
            DiagnosticCode::UnrecognizedValue,
            "a".into(),
            Some("phq9_item1".into()),
        ));
        d.sort_stably();
        assert_eq!(d.errors[0].item_id.as_deref(), Some("phq9_item1"));
        assert_eq!(d.errors[1].item_id.as_deref(), Some("phq9_item3"));
    }

    #[test]
    fn errors_and_warnings_split_by_default_severity() {
        let mut d = Diagnostics::new("sub-1", "phq9");
        d.push(Diagnostic::new(DiagnosticCode::UnknownItem, "info", None));
        d.push(Diagnostic::new(DiagnosticCode::ScaleNotScorable, "bad", None));
        assert_eq!(d.warnings.len(), 1);
        assert_eq!(d.errors.len(), 1);
        assert!(d.has_errors());
    }
}
