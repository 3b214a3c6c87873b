//! Pipeline (§4.8): the facade that ties resolve → recode → validate →
//! score → build-event together for one submission.
//!
//! Two entry points are exposed. [`Pipeline::process_one`] is the core
//! operation the spec names: one call scores one `(submission, measure_id)`
//! pair against an already-chosen binding source. [`Pipeline::process_submission`]
//! is the convenience the driver actually calls: it resolves `--binding` once
//! and fans out to `process_one` per measure.
//!
//! `--binding` is resolved two ways, in order: first as a registered
//! `binding_id` in the Form Binding Registry (fanning out to every section,
//! one `process_one` call per targeted measure); if no such binding is
//! registered, the value is treated directly as a `measure_id` and the
//! item-map store is consulted for `(submission.form_id, measure_id)`. This
//! lets one CLI flag drive either of §4.2's two binding configurations
//! without a second flag.

use std::collections::BTreeMap;
use std::path::Path;

use mq_core::{
    CanonicalFormSubmission, Diagnostics, DiagnosticsSummary, DiagnosticCode, FormBindingSpec,
    MeasureSpec, ProcessingResult, SubmissionItem,
};
use mq_registry::{item_map, FormBindingRegistry, MeasureRegistry, RegistryError};

use mq_algo::resolve::{resolve, BindingSource};
use mq_algo::{recode_value, score_scale, validate_submission};

use crate::event_builder::build_event;
use crate::router::route;
use crate::{EngineError, EngineResult};

pub struct Pipeline<'a> {
    measures: &'a MeasureRegistry,
    bindings: &'a FormBindingRegistry,
}

impl<'a> Pipeline<'a> {
    pub fn new(measures: &'a MeasureRegistry, bindings: &'a FormBindingRegistry) -> Self {
        Pipeline { measures, bindings }
    }

    /// Resolve `--binding` against the binding registry, falling back to
    /// item-map mode, and score every measure it names for `submission`.
    pub fn process_submission(
        &self,
        submission: &CanonicalFormSubmission,
        binding_id: &str,
        form_mappings_root: Option<&Path>,
        strict: bool,
        deterministic_ids: bool,
    ) -> EngineResult<Vec<ProcessingResult>> {
        match self.bindings.get(binding_id, None) {
            Ok(binding_spec) => self.process_via_spec(submission, binding_spec, strict, deterministic_ids),
            Err(RegistryError::NotFound { .. }) => {
                let measure_id = binding_id;
                let root = form_mappings_root.ok_or_else(|| EngineError::MissingItemMap {
                    form_id: submission.form_id.clone(),
                    measure_id: measure_id.to_string(),
                })?;
                if !item_map::item_map_exists(root, &submission.form_id, measure_id) {
                    return Err(EngineError::MissingItemMap {
                        form_id: submission.form_id.clone(),
                        measure_id: measure_id.to_string(),
                    });
                }
                let map = item_map::load_item_map(root, &submission.form_id, measure_id)?;
                let result = self.process_one(
                    submission,
                    measure_id,
                    None,
                    BindingSource::ItemMap(&map),
                    strict,
                    deterministic_ids,
                )?;
                Ok(vec![result])
            }
            Err(other) => Err(other.into()),
        }
    }

    fn process_via_spec(
        &self,
        submission: &CanonicalFormSubmission,
        binding_spec: &FormBindingSpec,
        strict: bool,
        deterministic_ids: bool,
    ) -> EngineResult<Vec<ProcessingResult>> {
        let mut out = Vec::with_capacity(binding_spec.sections.len());
        for section in &binding_spec.sections {
            let result = self.process_one(
                submission,
                &section.measure_id,
                Some(section.measure_version.as_str()),
                BindingSource::Spec(section),
                strict,
                deterministic_ids,
            )?;
            out.push(result);
        }
        Ok(out)
    }

    /// Score one `(submission, measure_id)` pair against an already-chosen
    /// binding source (§4.8's named operation).
    pub fn process_one(
        &self,
        submission: &CanonicalFormSubmission,
        measure_id: &str,
        measure_version: Option<&str>,
        binding_source: BindingSource<'_>,
        strict: bool,
        deterministic_ids: bool,
    ) -> EngineResult<ProcessingResult> {
        let measure: &MeasureSpec = self.measures.get(measure_id, measure_version)?;
        route(measure.kind)?;

        let mut diagnostics = Diagnostics::new(submission.submission_id.clone(), measure.measure_id.clone());

        let item_to_field = resolve(binding_source, &submission.items, strict, &mut diagnostics)?;

        let by_field: BTreeMap<&str, &SubmissionItem> = submission
            .items
            .iter()
            .map(|item| (item.field_id.as_str(), item))
            .collect();

        let mut recoded = BTreeMap::new();
        for item in &measure.items {
            if let Some(field_id) = item_to_field.get(&item.item_id) {
                if let Some(sub_item) = by_field.get(field_id.as_str()) {
                    recoded.insert(item.item_id.clone(), recode_value(item, &sub_item.raw_value));
                }
            }
        }

        validate_submission(measure, &recoded, &mut diagnostics);

        let scale_scores: Vec<_> = measure
            .scales
            .iter()
            .map(|scale| score_scale(scale, measure, &recoded, &mut diagnostics))
            .collect();

        let event = build_event(measure, submission, &recoded, &scale_scores, deterministic_ids);

        let items_present = recoded.values().filter(|o| o.is_present()).count() as u32;
        let items_missing = measure.items.len() as u32 - items_present;
        let scales_scored = scale_scores.iter().filter(|s| s.scorable).count() as u32;
        let scales_not_scorable = scale_scores.len() as u32 - scales_scored;
        diagnostics.summary = DiagnosticsSummary {
            items_present,
            items_missing,
            scales_scored,
            scales_not_scorable,
        };
        diagnostics.sort_stably();

        let success = !diagnostics.has_code(DiagnosticCode::ScaleNotScorable);

        Ok(ProcessingResult {
            form_submission_id: submission.submission_id.clone(),
            success,
            events: vec![event],
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mq_core::RawValue;
    use std::fs;

    fn phq9_json() -> &'static str {
        r#"{
          "measure_id": "phq9", "version": "1.0.0", "name": "PHQ-9", "description": "d",
          "kind": "questionnaire",
          "items": [
            {"item_id":"phq9_item1","position":1,"text":"q1","response_map":{"not at all":0,"several days":1,"more than half the days":2,"nearly every day":3},"min_value":0,"max_value":3}
          ],
          "scales": [
            {"scale_id":"phq9_total","name":"Total","items":["phq9_item1"],"method":"sum","min":0,"max":3,
             "interpretations":[{"min":0,"max":1,"label":"Minimal","severity":0},{"min":2,"max":3,"label":"Mild","severity":1}]}
          ]
        }"#
    }

    fn binding_json() -> &'static str {
        r#"{
          "binding_id": "b1", "version": "1.0.0", "form_id": "form-x",
          "sections": [
            {"measure_id":"phq9","measure_version":"1.0.0",
             "bindings":[{"item_id":"phq9_item1","by":"field_key","value":"entry.1"}]}
          ]
        }"#
    }

    #[test]
    fn process_submission_via_registered_binding() {
        let dir = tempfile::tempdir().unwrap();
        let measures_dir = dir.path().join("measures");
        fs::create_dir_all(measures_dir.join("phq9")).unwrap();
        fs::write(measures_dir.join("phq9/1-0-0.json"), phq9_json()).unwrap();

        let bindings_dir = dir.path().join("bindings");
        fs::create_dir_all(bindings_dir.join("b1")).unwrap();
        fs::write(bindings_dir.join("b1/1-0-0.json"), binding_json()).unwrap();

        let measures = MeasureRegistry::load_all(&measures_dir).unwrap();
        let bindings = FormBindingRegistry::load_all(&bindings_dir).unwrap();
        let pipeline = Pipeline::new(&measures, &bindings);

        let submission = CanonicalFormSubmission {
            form_id: "form-x".to_string(),
            submission_id: "sub-1".to_string(),
            subject_id: "subj-1".to_string(),
            respondent: None,
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            items: vec![mq_core::SubmissionItem {
                field_id: "entry.1".to_string(),
                raw_value: RawValue::Text("several days".to_string()),
                question_text: None,
            }],
        };

        let results = pipeline
            .process_submission(&submission, "b1", None, false, true)
            .unwrap();
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert!(result.success);
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].measure_id, "phq9");
        let scale_obs = result.events[0]
            .observations
            .iter()
            .find(|o| o.code == "phq9_total")
            .unwrap();
        assert_eq!(scale_obs.label.as_deref(), Some("Mild"));
    }

    #[test]
    fn process_submission_falls_back_to_item_map() {
        let dir = tempfile::tempdir().unwrap();
        let measures_dir = dir.path().join("measures");
        fs::create_dir_all(measures_dir.join("phq9")).unwrap();
        fs::write(measures_dir.join("phq9/1-0-0.json"), phq9_json()).unwrap();

        let bindings_dir = dir.path().join("bindings");
        fs::create_dir_all(&bindings_dir).unwrap();

        let mappings_dir = dir.path().join("form-mappings");
        fs::create_dir_all(mappings_dir.join("form-x")).unwrap();
        fs::write(
            mappings_dir.join("form-x/phq9.json"),
            r#"{"entry.1":"phq9_item1"}"#,
        )
        .unwrap();

        let measures = MeasureRegistry::load_all(&measures_dir).unwrap();
        let bindings = FormBindingRegistry::load_all(&bindings_dir).unwrap();
        let pipeline = Pipeline::new(&measures, &bindings);

        let submission = CanonicalFormSubmission {
            form_id: "form-x".to_string(),
            submission_id: "sub-1".to_string(),
            subject_id: "subj-1".to_string(),
            respondent: None,
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            items: vec![mq_core::SubmissionItem {
                field_id: "entry.1".to_string(),
                raw_value: RawValue::Text("nearly every day".to_string()),
                question_text: None,
            }],
        };

        let results = pipeline
            .process_submission(&submission, "phq9", Some(&mappings_dir), false, true)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].success);
    }

    #[test]
    fn strict_unmapped_field_aborts_with_no_events() {
        let dir = tempfile::tempdir().unwrap();
        let measures_dir = dir.path().join("measures");
        fs::create_dir_all(measures_dir.join("phq9")).unwrap();
        fs::write(measures_dir.join("phq9/1-0-0.json"), phq9_json()).unwrap();

        let bindings_dir = dir.path().join("bindings");
        fs::create_dir_all(bindings_dir.join("b1")).unwrap();
        fs::write(bindings_dir.join("b1/1-0-0.json"), binding_json()).unwrap();

        let measures = MeasureRegistry::load_all(&measures_dir).unwrap();
        let bindings = FormBindingRegistry::load_all(&bindings_dir).unwrap();
        let pipeline = Pipeline::new(&measures, &bindings);

        let submission = CanonicalFormSubmission {
            form_id: "form-x".to_string(),
            submission_id: "sub-1".to_string(),
            subject_id: "subj-1".to_string(),
            respondent: None,
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            items: vec![
                mq_core::SubmissionItem {
                    field_id: "entry.1".to_string(),
                    raw_value: RawValue::Text("several days".to_string()),
                    question_text: None,
                },
                mq_core::SubmissionItem {
                    field_id: "entry.999".to_string(),
                    raw_value: RawValue::Text("x".to_string()),
                    question_text: None,
                },
            ],
        };

        let result = pipeline.process_submission(&submission, "b1", None, true, true);
        assert!(matches!(result, Err(EngineError::Resolve(_))));
    }
}
