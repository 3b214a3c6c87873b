//! Event Builder (§4.6): assembles one `MeasurementEvent` per
//! (submission, measure) from recoded items and scored scales, in a
//! stable observation order — items by `position`, then scales in spec
//! order.

use std::collections::BTreeMap;

use chrono::Utc;
use mq_core::{
    mint_id, CanonicalFormSubmission, MeasureSpec, MeasurementEvent, Observation, ObservationKind,
    ObservedValue, Source, Telemetry, ValueType,
};

use mq_algo::{RecodeOutcome, ScaleScore};

const PROCESSOR_NAME: &str = "mq_pipeline::questionnaire";
const PROCESSOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// First colon-delimited component of `form_id`, or `"unknown"` if there
/// isn't one.
fn derive_platform(form_id: &str) -> String {
    match form_id.split_once(':') {
        Some((platform, _)) if !platform.is_empty() => platform.to_string(),
        _ => "unknown".to_string(),
    }
}

pub fn build_event(
    measure: &MeasureSpec,
    submission: &CanonicalFormSubmission,
    recoded: &BTreeMap<String, RecodeOutcome>,
    scale_scores: &[ScaleScore],
    deterministic_ids: bool,
) -> MeasurementEvent {
    let mut observations = Vec::with_capacity(measure.items.len() + measure.scales.len());

    let mut items_by_position: Vec<&mq_core::Item> = measure.items.iter().collect();
    items_by_position.sort_by_key(|i| i.position);

    for item in items_by_position {
        let outcome = recoded.get(&item.item_id);
        let (value, raw_answer, missing) = match outcome {
            Some(RecodeOutcome::Present(v, text)) => (Some(ObservedValue::Integer(*v)), Some(text.clone()), false),
            Some(RecodeOutcome::Unrecognized(text)) => (None, Some(text.clone()), true),
            Some(RecodeOutcome::Missing) | None => (None, None, true),
        };
        observations.push(Observation {
            observation_id: mint_id(deterministic_ids, &[&measure.measure_id, &submission.submission_id, &item.item_id]),
            measure_id: measure.measure_id.clone(),
            code: item.item_id.clone(),
            kind: ObservationKind::Item,
            value,
            value_type: ValueType::Integer,
            raw_answer,
            label: None,
            missing,
        });
    }

    for score in scale_scores {
        let value = score.value.map(|v| {
            if score.value_is_integer {
                ObservedValue::Integer(v as i64)
            } else {
                ObservedValue::Float(v)
            }
        });
        observations.push(Observation {
            observation_id: mint_id(deterministic_ids, &[&measure.measure_id, &submission.submission_id, &score.scale_id]),
            measure_id: measure.measure_id.clone(),
            code: score.scale_id.clone(),
            kind: ObservationKind::Scale,
            value,
            value_type: if score.value_is_integer { ValueType::Integer } else { ValueType::Float },
            raw_answer: None,
            label: score.label.clone(),
            missing: !score.scorable,
        });
    }

    let platform = derive_platform(&submission.form_id);

    MeasurementEvent {
        measurement_event_id: mint_id(deterministic_ids, &[&measure.measure_id, &submission.submission_id, "event"]),
        measure_id: measure.measure_id.clone(),
        measure_version: measure.version.clone(),
        subject_id: submission.resolved_subject_id().to_string(),
        timestamp: submission.timestamp.clone(),
        source: Source {
            form_id: submission.form_id.clone(),
            platform,
            submission_id: submission.submission_id.clone(),
        },
        telemetry: Telemetry {
            processor_name: PROCESSOR_NAME.to_string(),
            processor_version: PROCESSOR_VERSION.to_string(),
            processed_at: if deterministic_ids {
                submission.timestamp.clone()
            } else {
                Utc::now().to_rfc3339()
            },
            items_observed: observations.iter().filter(|o| o.kind == ObservationKind::Item && !o.missing).count() as u32,
            scales_observed: observations.iter().filter(|o| o.kind == ObservationKind::Scale && !o.missing).count() as u32,
        },
        observations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mq_core::MeasureKind;

    #[test]
    fn platform_is_colon_prefix_or_unknown() {
        assert_eq!(derive_platform("google_forms:abc123"), "google_forms");
        assert_eq!(derive_platform("plain-form-id"), "unknown");
        assert_eq!(derive_platform(":abc"), "unknown");
    }

    fn empty_measure() -> MeasureSpec {
        MeasureSpec {
            measure_id: "m1".to_string(),
            version: "1.0.0".to_string(),
            name: "M1".to_string(),
            description: "d".to_string(),
            kind: MeasureKind::Questionnaire,
            items: vec![],
            scales: vec![],
        }
    }

    fn submission() -> CanonicalFormSubmission {
        CanonicalFormSubmission {
            form_id: "form-x".to_string(),
            submission_id: "sub-1".to_string(),
            subject_id: "subj-1".to_string(),
            respondent: None,
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            items: vec![],
        }
    }

    #[test]
    fn deterministic_mode_freezes_processed_at_to_submission_timestamp() {
        let measure = empty_measure();
        let sub = submission();
        let event = build_event(&measure, &sub, &BTreeMap::new(), &[], true);
        assert_eq!(event.telemetry.processed_at, sub.timestamp);

        // Two invocations milliseconds apart must be byte-identical in
        // deterministic mode, not just equal to the submission timestamp.
        let event_again = build_event(&measure, &sub, &BTreeMap::new(), &[], true);
        assert_eq!(event.telemetry.processed_at, event_again.telemetry.processed_at);
    }

    #[test]
    fn non_deterministic_mode_stamps_wall_clock() {
        let measure = empty_measure();
        let sub = submission();
        let event = build_event(&measure, &sub, &BTreeMap::new(), &[], false);
        assert_ne!(event.telemetry.processed_at, sub.timestamp);
    }
}
