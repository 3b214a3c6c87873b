//! Validator (§4.4): per-submission invariants checked before scoring.
//! Scale scorability itself is decided by the Scoring Engine; this module
//! only diagnoses range violations and items resolved outside any scale.

use std::collections::BTreeMap;

use mq_core::{Diagnostic, DiagnosticCode, Diagnostics, MeasureSpec};

use crate::recode::RecodeOutcome;

/// `recoded` is keyed by canonical item_id.
pub fn validate_submission(
    measure: &MeasureSpec,
    recoded: &BTreeMap<String, RecodeOutcome>,
    diagnostics: &mut Diagnostics,
) {
    for (item_id, outcome) in recoded {
        if let RecodeOutcome::Unrecognized(text) = outcome {
            diagnostics.push(Diagnostic::new(
                DiagnosticCode::UnrecognizedValue,
                format!("value '{text}' is not a known response for item '{item_id}'"),
                Some(item_id.clone()),
            ));
            continue;
        }
        if let RecodeOutcome::Present(v, _) = outcome {
            if let Some(item) = measure.item(item_id) {
                if *v < item.min_value || *v > item.max_value {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticCode::ValueOutOfRange,
                        format!("item '{item_id}' recoded to {v}, outside [{}, {}]", item.min_value, item.max_value),
                        Some(item_id.clone()),
                    ));
                }
            }
        }
    }

    let scale_item_ids: std::collections::BTreeSet<&str> = measure
        .scales
        .iter()
        .flat_map(|s| s.items.iter().map(|id| id.as_str()))
        .collect();

    for item_id in recoded.keys() {
        if measure.item(item_id).is_some() && !scale_item_ids.contains(item_id.as_str()) {
            diagnostics.push(Diagnostic::new(
                DiagnosticCode::UnknownItem,
                format!("item '{item_id}' was resolved but does not belong to any scale"),
                Some(item_id.clone()),
            ));
        }
    }

    for scale in &measure.scales {
        let n_total = scale.items.len();
        let n_present = scale
            .items
            .iter()
            .filter(|item_id| matches!(recoded.get(*item_id), Some(RecodeOutcome::Present(_, _))))
            .count();
        if n_present < n_total {
            diagnostics.push(Diagnostic::new(
                DiagnosticCode::ScaleIncomplete,
                format!("scale '{}' has {n_present}/{n_total} items present", scale.scale_id),
                None,
            ));
        }
    }
}
