//! Core types shared by every crate in the workspace: the data model for
//! Measure Specs, Form Binding Specs, and Canonical Form Submissions; the
//! output shapes (`MeasurementEvent`, `Observation`, `ProcessingResult`);
//! deterministic identifier minting; the rounding policy for interpretation
//! band lookup; and the two error/diagnostic taxonomies (load-time
//! `SpecError`s vs. per-submission `Diagnostic`s).
//!
//! No I/O and no domain-specific scoring logic lives here — those belong to
//! `mq_registry` and `mq_algo`/`mq_pipeline` respectively.

#![forbid(unsafe_code)]

pub mod diagnostics;
pub mod errors;
pub mod ids;
pub mod model;
pub mod rounding;
pub mod spec_validate;

pub use diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, DiagnosticsSummary, Severity};
pub use errors::{SpecError, SpecErrors};
pub use ids::{mint_id, EventId};
pub use model::{
    Binding, BindingBy, BindingSection, CanonicalFormSubmission, FormBindingSpec, InterpretationBand,
    Item, ItemMap, MeasureKind, MeasureSpec, MeasurementEvent, Observation, ObservationKind,
    ObservedValue, ProcessingResult, RawValue, Respondent, Scale, ScoringMethod, Source,
    SubmissionItem, Telemetry, ValueType,
};
pub use rounding::round_half_up;
pub use spec_validate::validate_measure_spec;
