//! Scoring Engine (§4.5): the algorithmic core. Pure function of one
//! scale's present values; never clamps an out-of-range result.

use std::collections::BTreeMap;

use mq_core::{round_half_up, Diagnostic, DiagnosticCode, Diagnostics, MeasureSpec, Scale, ScoringMethod};

use crate::recode::RecodeOutcome;

#[derive(Clone, Debug, PartialEq)]
pub struct ScaleScore {
    pub scale_id: String,
    pub n_present: usize,
    pub n_total: usize,
    pub scorable: bool,
    /// `None` when the scale was not scorable.
    pub value: Option<f64>,
    pub value_is_integer: bool,
    pub out_of_range: bool,
    pub label: Option<String>,
}

/// Score one scale against the already-recoded, already-reverse-pending
/// item values. `recoded` is keyed by canonical item_id.
pub fn score_scale(
    scale: &Scale,
    measure: &MeasureSpec,
    recoded: &BTreeMap<String, RecodeOutcome>,
    diagnostics: &mut Diagnostics,
) -> ScaleScore {
    let n_total = scale.items.len();
    let reversed: std::collections::BTreeSet<&str> =
        scale.reversed_items.iter().map(|s| s.as_str()).collect();

    let mut values = Vec::with_capacity(n_total);
    for item_id in &scale.items {
        if let Some(RecodeOutcome::Present(v, _)) = recoded.get(item_id) {
            let item = measure
                .item(item_id)
                .expect("scale item ids are validated against the item list at load time");
            let effective = if reversed.contains(item_id.as_str()) {
                item.max_value - v
            } else {
                *v
            };
            values.push(effective);
        }
    }
    let n_present = values.len();
    let n_missing = n_total - n_present;

    if n_missing > scale.missing_allowed as usize {
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::ScaleNotScorable,
            format!(
                "scale '{}' is missing {n_missing} of {n_total} items, exceeding missing_allowed={}",
                scale.scale_id, scale.missing_allowed
            ),
            None,
        ));
        return ScaleScore {
            scale_id: scale.scale_id.clone(),
            n_present,
            n_total,
            scorable: false,
            value: None,
            value_is_integer: true,
            out_of_range: false,
            label: None,
        };
    }

    let sum: i64 = values.iter().sum();
    let prorated = n_missing > 0;

    let (raw_value, value_is_integer) = match scale.method {
        ScoringMethod::Sum => {
            if prorated {
                (sum as f64 * (n_total as f64 / n_present as f64), false)
            } else {
                (sum as f64, true)
            }
        }
        ScoringMethod::Average => (sum as f64 / n_present as f64, false),
        ScoringMethod::SumThenDouble => {
            if prorated {
                let prorated_sum = sum as f64 * (n_total as f64 / n_present as f64);
                (prorated_sum * 2.0, false)
            } else {
                ((sum * 2) as f64, true)
            }
        }
    };

    let out_of_range = raw_value < scale.min as f64 || raw_value > scale.max as f64;
    if out_of_range {
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::ScaleOutOfRange,
            format!(
                "scale '{}' scored {raw_value}, outside [{}, {}]",
                scale.scale_id, scale.min, scale.max
            ),
            None,
        ));
    }

    let label = if value_is_integer {
        let rounded = round_half_up(raw_value);
        scale
            .interpretations
            .iter()
            .find(|b| b.min <= rounded && rounded <= b.max)
            .map(|b| b.label.clone())
    } else {
        scale
            .interpretations
            .iter()
            .find(|b| (b.min as f64) <= raw_value && raw_value <= (b.max as f64))
            .map(|b| b.label.clone())
    };

    if label.is_none() {
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::NoInterpretationBand,
            format!("scale '{}' scored {raw_value}, which no interpretation band covers", scale.scale_id),
            None,
        ));
    }

    ScaleScore {
        scale_id: scale.scale_id.clone(),
        n_present,
        n_total,
        scorable: true,
        value: Some(raw_value),
        value_is_integer,
        out_of_range,
        label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mq_core::{InterpretationBand, Item, MeasureKind};
    use std::collections::BTreeMap as Map;

    fn phq9() -> MeasureSpec {
        let mut rm = Map::new();
        for (k, v) in [("not at all", 0), ("several days", 1), ("more than half the days", 2), ("nearly every day", 3)] {
            rm.insert(k.to_string(), v);
        }
        let items: Vec<Item> = (1..=9)
            .map(|i| Item {
                item_id: format!("phq9_item{i}"),
                position: i,
                text: format!("q{i}"),
                response_map: rm.clone(),
                min_value: 0,
                max_value: 3,
            })
            .collect();
        MeasureSpec {
            measure_id: "phq9".to_string(),
            version: "1.0.0".to_string(),
            name: "PHQ-9".to_string(),
            description: "d".to_string(),
            kind: MeasureKind::Questionnaire,
            items,
            scales: vec![Scale {
                scale_id: "phq9_total".to_string(),
                name: "Total".to_string(),
                items: (1..=9).map(|i| format!("phq9_item{i}")).collect(),
                method: ScoringMethod::Sum,
                reversed_items: vec![],
                min: 0,
                max: 27,
                missing_allowed: 1,
                interpretations: vec![
                    InterpretationBand { min: 0, max: 4, label: "Minimal".to_string(), severity: 0, description: None },
                    InterpretationBand { min: 5, max: 9, label: "Mild".to_string(), severity: 1, description: None },
                    InterpretationBand { min: 10, max: 14, label: "Moderate".to_string(), severity: 2, description: None },
                    InterpretationBand { min: 15, max: 19, label: "Moderately severe".to_string(), severity: 3, description: None },
                    InterpretationBand { min: 20, max: 27, label: "Severe".to_string(), severity: 4, description: None },
                ],
            }],
        }
    }

    fn all_present(value: i64) -> Map<String, RecodeOutcome> {
        (1..=9)
            .map(|i| (format!("phq9_item{i}"), RecodeOutcome::Present(value, value.to_string())))
            .collect()
    }

    #[test]
    fn complete_scale_sums_exactly() {
        let m = phq9();
        let recoded = all_present(1);
        let mut diags = Diagnostics::new("s1", "phq9");
        let score = score_scale(&m.scales[0], &m, &recoded, &mut diags);
        assert_eq!(score.value, Some(9.0));
        assert!(score.value_is_integer);
        assert_eq!(score.label.as_deref(), Some("Mild"));
        assert!(!diags.has_errors() || !diags.has_code(DiagnosticCode::ScaleOutOfRange));
    }

    #[test]
    fn one_missing_within_allowance_is_prorated() {
        let m = phq9();
        let mut recoded = all_present(1);
        recoded.remove("phq9_item9");
        let mut diags = Diagnostics::new("s1", "phq9");
        let score = score_scale(&m.scales[0], &m, &recoded, &mut diags);
        assert!(score.scorable);
        assert!(!score.value_is_integer);
        let expected = 8.0 * (9.0 / 8.0);
        assert!((score.value.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn too_many_missing_is_not_scorable() {
        let m = phq9();
        let mut recoded = all_present(1);
        recoded.remove("phq9_item8");
        recoded.remove("phq9_item9");
        let mut diags = Diagnostics::new("s1", "phq9");
        let score = score_scale(&m.scales[0], &m, &recoded, &mut diags);
        assert!(!score.scorable);
        assert_eq!(score.value, None);
        assert!(diags.has_code(DiagnosticCode::ScaleNotScorable));
    }

    #[test]
    fn all_max_hits_severe_band() {
        let m = phq9();
        let recoded = all_present(3);
        let mut diags = Diagnostics::new("s1", "phq9");
        let score = score_scale(&m.scales[0], &m, &recoded, &mut diags);
        assert_eq!(score.value, Some(27.0));
        assert_eq!(score.label.as_deref(), Some("Severe"));
    }

    #[test]
    fn reversed_items_are_substituted_before_summing() {
        let mut m = phq9();
        m.scales[0].reversed_items.push("phq9_item1".to_string());
        let recoded = all_present(1);
        let mut diags = Diagnostics::new("s1", "phq9");
        let score = score_scale(&m.scales[0], &m, &recoded, &mut diags);
        // item1 reversed: 3 - 1 = 2, remaining 8 items at 1 each = 8, total 10.
        assert_eq!(score.value, Some(10.0));
    }

    #[test]
    fn sum_then_double_prorates_sum_before_doubling() {
        let mut m = phq9();
        m.scales[0].method = ScoringMethod::SumThenDouble;
        m.scales[0].min = 0;
        m.scales[0].max = 54;
        let mut recoded = all_present(1);
        recoded.remove("phq9_item9");
        let mut diags = Diagnostics::new("s1", "phlms");
        let score = score_scale(&m.scales[0], &m, &recoded, &mut diags);
        let expected_sum = 8.0 * (9.0 / 8.0);
        assert!((score.value.unwrap() - expected_sum * 2.0).abs() < 1e-9);
    }
}
