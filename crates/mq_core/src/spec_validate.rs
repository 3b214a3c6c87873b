//! Load-time invariant checks for [`MeasureSpec`] (§3).
//!
//! Called once by the Registry Store immediately after a measure document
//! passes schema validation. A non-empty result means the document can
//! never be served and the whole registry load fails with a startup
//! `SchemaViolation` — these are structural defects in the spec itself, not
//! per-submission semantics, so they are never surfaced as diagnostics.

use std::collections::BTreeSet;

use crate::errors::{SpecError, SpecErrors};
use crate::model::MeasureSpec;

pub fn validate_measure_spec(spec: &MeasureSpec) -> SpecErrors {
    let mut errors = Vec::new();

    if spec.items.is_empty() {
        errors.push(SpecError::NoItems);
    }

    let mut seen_items = BTreeSet::new();
    for item in &spec.items {
        if !seen_items.insert(item.item_id.as_str()) {
            errors.push(SpecError::DuplicateItemId(item.item_id.clone()));
        }
        for (text, &value) in &item.response_map {
            if value < item.min_value || value > item.max_value {
                errors.push(SpecError::ResponseMapValueOutOfRange {
                    item_id: item.item_id.clone(),
                    text: text.clone(),
                    value,
                    min_value: item.min_value,
                    max_value: item.max_value,
                });
            }
        }
    }

    let item_ids: BTreeSet<&str> = spec.items.iter().map(|i| i.item_id.as_str()).collect();

    let mut seen_scales = BTreeSet::new();
    for scale in &spec.scales {
        if !seen_scales.insert(scale.scale_id.as_str()) {
            errors.push(SpecError::DuplicateScaleId(scale.scale_id.clone()));
        }
        if scale.items.is_empty() {
            errors.push(SpecError::EmptyScale(scale.scale_id.clone()));
        }

        let scale_item_set: BTreeSet<&str> = scale.items.iter().map(|s| s.as_str()).collect();

        for item_id in &scale.items {
            if !item_ids.contains(item_id.as_str()) {
                errors.push(SpecError::UnknownItemInScale {
                    scale_id: scale.scale_id.clone(),
                    item_id: item_id.clone(),
                });
            }
        }

        for item_id in &scale.reversed_items {
            if !scale_item_set.contains(item_id.as_str()) {
                errors.push(SpecError::ReversedItemNotInScale {
                    scale_id: scale.scale_id.clone(),
                    item_id: item_id.clone(),
                });
            }
        }

        if let Some(detail) = band_coverage_gap(&scale.min, &scale.max, &scale.interpretations) {
            errors.push(SpecError::BandCoverage {
                scale_id: scale.scale_id.clone(),
                min: scale.min,
                max: scale.max,
                detail,
            });
        }
    }

    errors.sort_by(|a, b| format!("{a:?}").cmp(&format!("{b:?}")));
    SpecErrors(errors)
}

/// Returns `Some(detail)` describing the first gap or overlap found, or
/// `None` if the bands are non-overlapping and jointly cover `[min, max]`.
fn band_coverage_gap(
    min: &i64,
    max: &i64,
    bands: &[crate::model::InterpretationBand],
) -> Option<String> {
    if bands.is_empty() {
        return Some("no interpretation bands defined".to_string());
    }
    let mut sorted: Vec<&crate::model::InterpretationBand> = bands.iter().collect();
    sorted.sort_by_key(|b| b.min);

    let mut cursor = *min;
    for b in &sorted {
        if b.min > cursor {
            return Some(format!("gap before band [{}, {}]: expected to start at {}", b.min, b.max, cursor));
        }
        if b.min < cursor {
            return Some(format!("band [{}, {}] overlaps preceding coverage ending at {}", b.min, b.max, cursor - 1));
        }
        if b.max < b.min {
            return Some(format!("band has max {} < min {}", b.max, b.min));
        }
        cursor = b.max + 1;
    }
    if cursor - 1 != *max {
        return Some(format!("bands cover up to {} but scale max is {}", cursor - 1, max));
    }
    None
}
