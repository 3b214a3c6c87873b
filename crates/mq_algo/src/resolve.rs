//! Field-to-Item Resolver (§4.2): produces `item_id -> field_id` for the
//! incoming items, from either a registered Form Binding Spec section or a
//! flat item-map.

use std::collections::BTreeMap;

use mq_core::{BindingBy, BindingSection, Diagnostic, DiagnosticCode, Diagnostics, ItemMap, SubmissionItem};
use thiserror::Error;

use crate::recode::normalize_text;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("field '{0}' is not mapped to any item and strict mode is enabled")]
    UnmappedField(String),
}

pub enum BindingSource<'a> {
    Spec(&'a BindingSection),
    ItemMap(&'a ItemMap),
}

/// Resolve incoming submission items to canonical item ids.
///
/// Returns `item_id -> field_id` for every item that could be matched.
/// Diagnostics (`MISSING_BINDING`, `DUPLICATE_FIELD`, `UNMAPPED_FIELD_SKIPPED`)
/// are pushed as encountered; an unmapped field under `strict` aborts with
/// `ResolveError::UnmappedField` instead of being diagnosed and dropped.
pub fn resolve(
    source: BindingSource<'_>,
    submission_items: &[SubmissionItem],
    strict: bool,
    diagnostics: &mut Diagnostics,
) -> Result<BTreeMap<String, String>, ResolveError> {
    let (deduped, ordered) = dedupe_by_field_id(submission_items, diagnostics);

    let item_to_field = match source {
        BindingSource::Spec(section) => resolve_from_spec(section, &deduped, &ordered, diagnostics),
        BindingSource::ItemMap(map) => resolve_from_item_map(map),
    };

    let used_fields: std::collections::BTreeSet<&str> =
        item_to_field.values().map(|s| s.as_str()).collect();

    for field_id in deduped.keys() {
        if !used_fields.contains(field_id.as_str()) {
            if strict {
                return Err(ResolveError::UnmappedField(field_id.clone()));
            }
            diagnostics.push(Diagnostic::new(
                DiagnosticCode::UnmappedFieldSkipped,
                format!("field '{field_id}' is not bound to any item; dropped"),
                None,
            ));
        }
    }

    Ok(item_to_field)
}

/// Returns both a `field_id -> item` map (for `by=field_key` lookups) and
/// the same deduped items in their original input order (for `by=question_text`'s
/// "first match" tie-break, which must follow submission order, not field_id order).
fn dedupe_by_field_id<'a>(
    items: &'a [SubmissionItem],
    diagnostics: &mut Diagnostics,
) -> (BTreeMap<String, &'a SubmissionItem>, Vec<&'a SubmissionItem>) {
    let mut out: BTreeMap<String, &SubmissionItem> = BTreeMap::new();
    let mut ordered: Vec<&SubmissionItem> = Vec::with_capacity(items.len());
    for item in items {
        if out.contains_key(&item.field_id) {
            diagnostics.push(Diagnostic::new(
                DiagnosticCode::DuplicateField,
                format!("field '{}' appears more than once; first occurrence kept", item.field_id),
                None,
            ));
            continue;
        }
        out.insert(item.field_id.clone(), item);
        ordered.push(item);
    }
    (out, ordered)
}

fn resolve_from_spec(
    section: &BindingSection,
    submission_items: &BTreeMap<String, &SubmissionItem>,
    ordered_items: &[&SubmissionItem],
    diagnostics: &mut Diagnostics,
) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for binding in &section.bindings {
        let matched = match binding.by {
            BindingBy::FieldKey => submission_items.get(&binding.value).copied(),
            BindingBy::QuestionText => {
                let target = normalize_text(&binding.value);
                ordered_items
                    .iter()
                    .find(|item| {
                        item.question_text
                            .as_deref()
                            .map(normalize_text)
                            .as_deref()
                            == Some(target.as_str())
                    })
                    .copied()
            }
        };

        match matched {
            Some(item) => {
                out.insert(binding.item_id.clone(), item.field_id.clone());
            }
            None => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticCode::MissingBinding,
                    format!("no submission item matched binding for '{}'", binding.item_id),
                    Some(binding.item_id.clone()),
                ));
            }
        }
    }
    out
}

fn resolve_from_item_map(map: &ItemMap) -> BTreeMap<String, String> {
    map.iter().map(|(field_id, item_id)| (item_id.clone(), field_id.clone())).collect()
}
