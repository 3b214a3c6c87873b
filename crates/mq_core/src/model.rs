//! The data model: Measure Spec, Form Binding Spec, Canonical Form Submission,
//! and the output shapes (MeasurementEvent, Observation, ProcessingResult).
//!
//! Everything here is pure data — no behavior beyond small accessor helpers.
//! Load-time invariant checking lives in [`crate::spec_validate`]; scoring
//! lives upstream in the `mq_algo`/`mq_pipeline` crates, which depend only on
//! these shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostics;
use crate::ids::EventId;

// ---------------------------------------------------------------------
// Measure Spec
// ---------------------------------------------------------------------

/// Discriminator for the domain a measure belongs to. Only `Questionnaire`
/// has an implemented processor; the rest exist so the Domain Router can
/// fail loudly and specifically on a misconfigured `kind` rather than
/// silently falling through to a default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureKind {
    Questionnaire,
    Lab,
    Vital,
    Wearable,
}

/// One scoring method for a [`Scale`]. Closed set: an unrecognized method
/// string fails to deserialize rather than being accepted and mis-scored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    Sum,
    Average,
    SumThenDouble,
}

/// A single question within a measure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: String,
    pub position: u32,
    pub text: String,
    /// Normalized answer text (lower-cased, whitespace-collapsed, trimmed) → integer score.
    pub response_map: BTreeMap<String, i64>,
    pub min_value: i64,
    pub max_value: i64,
}

/// A non-overlapping range of scale scores mapped to a severity label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterpretationBand {
    pub min: i64,
    pub max: i64,
    pub label: String,
    pub severity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A scored subset of a measure's items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub scale_id: String,
    pub name: String,
    /// Ordered list of item_ids contributing to this scale.
    pub items: Vec<String>,
    pub method: ScoringMethod,
    #[serde(default)]
    pub reversed_items: Vec<String>,
    pub min: i64,
    pub max: i64,
    #[serde(default)]
    pub missing_allowed: u32,
    pub interpretations: Vec<InterpretationBand>,
}

/// A validated clinical instrument: PHQ-9, GAD-7, PHLMS-10, etc.
///
/// Immutable once loaded by the Registry Store; never mutated during
/// per-submission processing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasureSpec {
    pub measure_id: String,
    pub version: String,
    pub name: String,
    pub description: String,
    pub kind: MeasureKind,
    pub items: Vec<Item>,
    pub scales: Vec<Scale>,
}

impl MeasureSpec {
    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.item_id == item_id)
    }

    pub fn scale(&self, scale_id: &str) -> Option<&Scale> {
        self.scales.iter().find(|s| s.scale_id == scale_id)
    }
}

// ---------------------------------------------------------------------
// Form Binding Spec
// ---------------------------------------------------------------------

/// How a binding locates the incoming submission item for a canonical item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingBy {
    FieldKey,
    QuestionText,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub item_id: String,
    pub by: BindingBy,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BindingSection {
    pub measure_id: String,
    pub measure_version: String,
    pub bindings: Vec<Binding>,
}

/// Declares, for a given form, how its fields map onto one or more measures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormBindingSpec {
    pub binding_id: String,
    pub version: String,
    pub form_id: String,
    pub sections: Vec<BindingSection>,
}

impl FormBindingSpec {
    pub fn section_for(&self, measure_id: &str) -> Option<&BindingSection> {
        self.sections.iter().find(|s| s.measure_id == measure_id)
    }
}

/// The flat alternative to a binding spec section: one file per
/// `(form_id, measure_id)` pair, `field_id -> item_id`.
pub type ItemMap = BTreeMap<String, String>;

// ---------------------------------------------------------------------
// Canonical Form Submission (input)
// ---------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Null,
}

impl RawValue {
    /// Render as the text the Recoder normalizes and looks up. Numbers are
    /// rendered without a trailing `.0` when integral, so `raw_value: 2`
    /// and `raw_value: "2"` recode identically.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Text(s) => Some(s.clone()),
            RawValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            RawValue::Null => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(s) => s.trim().is_empty(),
            RawValue::Number(_) => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmissionItem {
    pub field_id: String,
    pub raw_value: RawValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
}

fn default_subject_id() -> String {
    String::new()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Respondent {
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalFormSubmission {
    pub form_id: String,
    pub submission_id: String,
    #[serde(default = "default_subject_id")]
    pub subject_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respondent: Option<Respondent>,
    pub timestamp: String,
    pub items: Vec<SubmissionItem>,
}

impl CanonicalFormSubmission {
    /// `subject_id`, falling back to `respondent.id` per §3.
    pub fn resolved_subject_id(&self) -> &str {
        if !self.subject_id.is_empty() {
            &self.subject_id
        } else if let Some(r) = &self.respondent {
            &r.id
        } else {
            ""
        }
    }
}

// ---------------------------------------------------------------------
// Output: MeasurementEvent / Observation
// ---------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    Item,
    Scale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Integer,
    Float,
}

/// A numeric value that serializes as either a whole number or a float,
/// matching §3's "int for items, int or float for scales" contract — the
/// wire shape must not gain a `.0` on an integer-typed item score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObservedValue {
    Integer(i64),
    Float(f64),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub observation_id: EventId,
    pub measure_id: String,
    /// item_id or scale_id.
    pub code: String,
    pub kind: ObservationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ObservedValue>,
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub missing: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub form_id: String,
    pub platform: String,
    pub submission_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub processor_name: String,
    pub processor_version: String,
    pub processed_at: String,
    pub items_observed: u32,
    pub scales_observed: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasurementEvent {
    pub measurement_event_id: EventId,
    pub measure_id: String,
    pub measure_version: String,
    pub subject_id: String,
    pub timestamp: String,
    pub source: Source,
    pub observations: Vec<Observation>,
    pub telemetry: Telemetry,
}

// ---------------------------------------------------------------------
// ProcessingResult
// ---------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub form_submission_id: String,
    pub success: bool,
    pub events: Vec<MeasurementEvent>,
    pub diagnostics: Diagnostics,
}
