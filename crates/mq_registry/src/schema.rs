//! JSON Schema (draft 2020-12) validation for Measure Specs and Form
//! Binding Specs, gated behind the `schemaval` feature.
//!
//! Schemas are embedded as string literals rather than loaded from disk:
//! the registry has no dependency on a schemas/ directory existing
//! alongside the measure/binding data it serves.

use std::sync::OnceLock;

use serde_json::Value;

use crate::{RegistryError, RegistryResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaKind {
    MeasureSpec,
    FormBindingSpec,
}

impl SchemaKind {
    fn source(self) -> &'static str {
        match self {
            SchemaKind::MeasureSpec => MEASURE_SPEC_SCHEMA,
            SchemaKind::FormBindingSpec => FORM_BINDING_SPEC_SCHEMA,
        }
    }
}

#[cfg(feature = "schemaval")]
fn compiled(kind: SchemaKind) -> &'static jsonschema::JSONSchema {
    static MEASURE: OnceLock<jsonschema::JSONSchema> = OnceLock::new();
    static BINDING: OnceLock<jsonschema::JSONSchema> = OnceLock::new();

    let cell = match kind {
        SchemaKind::MeasureSpec => &MEASURE,
        SchemaKind::FormBindingSpec => &BINDING,
    };
    cell.get_or_init(|| {
        let schema_doc: Value =
            serde_json::from_str(kind.source()).expect("embedded schema must be valid JSON");
        jsonschema::JSONSchema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .compile(&schema_doc)
            .expect("embedded schema must itself be a valid JSON Schema")
    })
}

/// Validate `value` against the named schema. Collects every violation
/// (not just the first) into one readable, deterministic message.
#[cfg(feature = "schemaval")]
pub fn validate_value(kind: SchemaKind, value: &Value) -> RegistryResult<()> {
    let schema = compiled(kind);
    let result = schema.validate(value);
    if let Err(errors) = result {
        let mut messages: Vec<String> = errors
            .map(|e| format!("{} at {}", e, e.instance_path))
            .collect();
        messages.sort();
        return Err(RegistryError::SchemaViolation {
            path: String::new(),
            detail: messages.join("; "),
        });
    }
    Ok(())
}

#[cfg(not(feature = "schemaval"))]
pub fn validate_value(_kind: SchemaKind, _value: &Value) -> RegistryResult<()> {
    Ok(())
}

const MEASURE_SPEC_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "MeasureSpec",
  "type": "object",
  "required": ["measure_id", "version", "name", "description", "kind", "items", "scales"],
  "additionalProperties": false,
  "properties": {
    "measure_id": { "type": "string", "minLength": 1 },
    "version": { "type": "string", "minLength": 1 },
    "name": { "type": "string", "minLength": 1 },
    "description": { "type": "string" },
    "kind": { "enum": ["questionnaire", "lab", "vital", "wearable"] },
    "items": {
      "type": "array",
      "minItems": 1,
      "items": {
        "type": "object",
        "required": ["item_id", "position", "text", "response_map", "min_value", "max_value"],
        "additionalProperties": false,
        "properties": {
          "item_id": { "type": "string", "minLength": 1 },
          "position": { "type": "integer", "minimum": 0 },
          "text": { "type": "string" },
          "response_map": {
            "type": "object",
            "additionalProperties": { "type": "integer" },
            "minProperties": 1
          },
          "min_value": { "type": "integer" },
          "max_value": { "type": "integer" }
        }
      }
    },
    "scales": {
      "type": "array",
      "minItems": 1,
      "items": {
        "type": "object",
        "required": ["scale_id", "name", "items", "method", "min", "max", "interpretations"],
        "additionalProperties": false,
        "properties": {
          "scale_id": { "type": "string", "minLength": 1 },
          "name": { "type": "string" },
          "items": { "type": "array", "minItems": 1, "items": { "type": "string" } },
          "method": { "enum": ["sum", "average", "sum_then_double"] },
          "reversed_items": { "type": "array", "items": { "type": "string" } },
          "min": { "type": "integer" },
          "max": { "type": "integer" },
          "missing_allowed": { "type": "integer", "minimum": 0 },
          "interpretations": {
            "type": "array",
            "minItems": 1,
            "items": {
              "type": "object",
              "required": ["min", "max", "label", "severity"],
              "additionalProperties": false,
              "properties": {
                "min": { "type": "integer" },
                "max": { "type": "integer" },
                "label": { "type": "string", "minLength": 1 },
                "severity": { "type": "integer", "minimum": 0 },
                "description": { "type": "string" }
              }
            }
          }
        }
      }
    }
  }
}"#;

const FORM_BINDING_SPEC_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "FormBindingSpec",
  "type": "object",
  "required": ["binding_id", "version", "form_id", "sections"],
  "additionalProperties": false,
  "properties": {
    "binding_id": { "type": "string", "minLength": 1 },
    "version": { "type": "string", "minLength": 1 },
    "form_id": { "type": "string", "minLength": 1 },
    "sections": {
      "type": "array",
      "minItems": 1,
      "items": {
        "type": "object",
        "required": ["measure_id", "measure_version", "bindings"],
        "additionalProperties": false,
        "properties": {
          "measure_id": { "type": "string", "minLength": 1 },
          "measure_version": { "type": "string", "minLength": 1 },
          "bindings": {
            "type": "array",
            "minItems": 1,
            "items": {
              "type": "object",
              "required": ["item_id", "by", "value"],
              "additionalProperties": false,
              "properties": {
                "item_id": { "type": "string", "minLength": 1 },
                "by": { "enum": ["field_key", "question_text"] },
                "value": { "type": "string", "minLength": 1 }
              }
            }
          }
        }
      }
    }
  }
}"#;

#[cfg(test)]
#[cfg(feature = "schemaval")]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_measure_passes() {
        let v = json!({
            "measure_id": "phq9",
            "version": "1.0.0",
            "name": "PHQ-9",
            "description": "d",
            "kind": "questionnaire",
            "items": [
                { "item_id": "phq9_item1", "position": 1, "text": "q", "response_map": {"never": 0, "always": 3}, "min_value": 0, "max_value": 3 }
            ],
            "scales": [
                {
                    "scale_id": "phq9_total",
                    "name": "Total",
                    "items": ["phq9_item1"],
                    "method": "sum",
                    "min": 0,
                    "max": 3,
                    "interpretations": [{"min": 0, "max": 3, "label": "x", "severity": 0}]
                }
            ]
        });
        assert!(validate_value(SchemaKind::MeasureSpec, &v).is_ok());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let mut v = json!({
            "measure_id": "phq9", "version": "1.0.0", "name": "n", "description": "d",
            "kind": "questionnaire", "items": [], "scales": []
        });
        v["kind"] = json!("not_a_real_kind");
        assert!(validate_value(SchemaKind::MeasureSpec, &v).is_err());
    }
}
