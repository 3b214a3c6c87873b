//! Directory-scan registry store for Measure Specs and Form Binding Specs.
//!
//! `measure-registry/measures/<measure_id>/<M-m-p>.json`
//! `form-binding-registry/bindings/<binding_id>/<M-m-p>.json`
//!
//! Version files use hyphens in place of dots (`1-0-0.json`); the semver
//! string is recovered from the filename and cross-checked against the
//! document's own `version` field.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use mq_core::{validate_measure_spec, FormBindingSpec, MeasureSpec};
use semver::Version;

use crate::schema::{self, SchemaKind};
use crate::{RegistryError, RegistryResult};

/// Read cap mirroring the teacher's bounded-read convention for
/// registry/manifest files: refuse to even attempt to parse a pathological
/// file rather than buffering it whole.
const MAX_SPEC_BYTES: u64 = 16 * 1024 * 1024;

fn read_json_capped(path: &Path) -> RegistryResult<serde_json::Value> {
    use std::io::Read;
    let f = fs::File::open(path).map_err(|e| RegistryError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut limited = f.take(MAX_SPEC_BYTES);
    let mut buf = Vec::new();
    limited.read_to_end(&mut buf).map_err(|e| RegistryError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_slice(&buf).map_err(|e| RegistryError::Json {
        path: path.display().to_string(),
        source: e,
    })
}

fn version_from_filename(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    Some(stem.replace('-', "."))
}

fn scan_version_files(root: &Path) -> Vec<(String, PathBuf)> {
    let mut out = Vec::new();
    let Ok(id_dirs) = fs::read_dir(root) else {
        return out;
    };
    for id_entry in id_dirs.flatten() {
        let id_path = id_entry.path();
        if !id_path.is_dir() {
            continue;
        }
        let Some(id) = id_path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        let Ok(version_files) = fs::read_dir(&id_path) else {
            continue;
        };
        for vf in version_files.flatten() {
            let p = vf.path();
            if p.extension().and_then(|e| e.to_str()) == Some("json") {
                out.push((id.to_string(), p));
            }
        }
    }
    out.sort();
    out
}

/// Immutable, indexed collection of loaded Measure Specs.
#[derive(Debug, Default)]
pub struct MeasureRegistry {
    by_id_version: BTreeMap<(String, String), MeasureSpec>,
    latest: BTreeMap<String, String>,
}

impl MeasureRegistry {
    pub fn load_all(root: &Path) -> RegistryResult<Self> {
        let measures_dir = root.join("measures");
        if !measures_dir.is_dir() {
            return Err(RegistryError::RegistryPathMissing {
                path: measures_dir.display().to_string(),
            });
        }
        let mut reg = MeasureRegistry::default();

        for (dir_id, path) in scan_version_files(&measures_dir) {
            let value = read_json_capped(&path)?;
            schema::validate_value(SchemaKind::MeasureSpec, &value).map_err(|e| match e {
                RegistryError::SchemaViolation { detail, .. } => RegistryError::SchemaViolation {
                    path: path.display().to_string(),
                    detail,
                },
                other => other,
            })?;
            let spec: MeasureSpec = serde_json::from_value(value).map_err(|e| RegistryError::Json {
                path: path.display().to_string(),
                source: e,
            })?;

            if spec.measure_id != dir_id {
                return Err(RegistryError::IdMismatch {
                    path: path.display().to_string(),
                    in_file: spec.measure_id.clone(),
                    in_dir: dir_id,
                });
            }

            let file_version = version_from_filename(&path).unwrap_or_default();
            if file_version != spec.version {
                return Err(RegistryError::BadVersion {
                    path: path.display().to_string(),
                    version: spec.version.clone(),
                });
            }

            let invariants = validate_measure_spec(&spec);
            if !invariants.is_ok() {
                return Err(RegistryError::InvariantViolation {
                    path: path.display().to_string(),
                    detail: invariants.to_string(),
                });
            }

            reg.insert(spec, &path)?;
        }

        Ok(reg)
    }

    fn insert(&mut self, spec: MeasureSpec, path: &Path) -> RegistryResult<()> {
        let key = (spec.measure_id.clone(), spec.version.clone());
        if let Some(existing) = self.by_id_version.get(&key) {
            let _ = existing;
            return Err(RegistryError::Duplicate {
                id: key.0,
                version: key.1,
                first: "(already loaded)".to_string(),
                second: path.display().to_string(),
            });
        }

        let is_newer = match self.latest.get(&spec.measure_id) {
            None => true,
            Some(current) => parse_version(&spec.version) > parse_version(current),
        };
        if is_newer {
            self.latest.insert(spec.measure_id.clone(), spec.version.clone());
        }
        self.by_id_version.insert(key, spec);
        Ok(())
    }

    /// `version = None` resolves to the latest by semver ordering.
    pub fn get(&self, measure_id: &str, version: Option<&str>) -> RegistryResult<&MeasureSpec> {
        let resolved_version = match version {
            Some(v) => v.to_string(),
            None => self
                .latest
                .get(measure_id)
                .cloned()
                .ok_or_else(|| RegistryError::NotFound {
                    id: measure_id.to_string(),
                })?,
        };
        self.by_id_version
            .get(&(measure_id.to_string(), resolved_version.clone()))
            .ok_or_else(|| RegistryError::VersionNotFound {
                id: measure_id.to_string(),
                version: resolved_version,
            })
    }

    pub fn len(&self) -> usize {
        self.by_id_version.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id_version.is_empty()
    }
}

/// Immutable, indexed collection of loaded Form Binding Specs.
#[derive(Debug, Default)]
pub struct FormBindingRegistry {
    by_id_version: BTreeMap<(String, String), FormBindingSpec>,
    latest: BTreeMap<String, String>,
}

impl FormBindingRegistry {
    pub fn load_all(root: &Path) -> RegistryResult<Self> {
        let bindings_dir = root.join("bindings");
        if !bindings_dir.is_dir() {
            return Err(RegistryError::RegistryPathMissing {
                path: bindings_dir.display().to_string(),
            });
        }
        let mut reg = FormBindingRegistry::default();

        for (dir_id, path) in scan_version_files(&bindings_dir) {
            let value = read_json_capped(&path)?;
            schema::validate_value(SchemaKind::FormBindingSpec, &value).map_err(|e| match e {
                RegistryError::SchemaViolation { detail, .. } => RegistryError::SchemaViolation {
                    path: path.display().to_string(),
                    detail,
                },
                other => other,
            })?;
            let spec: FormBindingSpec =
                serde_json::from_value(value).map_err(|e| RegistryError::Json {
                    path: path.display().to_string(),
                    source: e,
                })?;

            if spec.binding_id != dir_id {
                return Err(RegistryError::IdMismatch {
                    path: path.display().to_string(),
                    in_file: spec.binding_id.clone(),
                    in_dir: dir_id,
                });
            }

            let file_version = version_from_filename(&path).unwrap_or_default();
            if file_version != spec.version {
                return Err(RegistryError::BadVersion {
                    path: path.display().to_string(),
                    version: spec.version.clone(),
                });
            }

            reg.insert(spec, &path)?;
        }

        Ok(reg)
    }

    fn insert(&mut self, spec: FormBindingSpec, path: &Path) -> RegistryResult<()> {
        let key = (spec.binding_id.clone(), spec.version.clone());
        if self.by_id_version.contains_key(&key) {
            return Err(RegistryError::Duplicate {
                id: key.0,
                version: key.1,
                first: "(already loaded)".to_string(),
                second: path.display().to_string(),
            });
        }

        let is_newer = match self.latest.get(&spec.binding_id) {
            None => true,
            Some(current) => parse_version(&spec.version) > parse_version(current),
        };
        if is_newer {
            self.latest.insert(spec.binding_id.clone(), spec.version.clone());
        }
        self.by_id_version.insert(key, spec);
        Ok(())
    }

    pub fn get(&self, binding_id: &str, version: Option<&str>) -> RegistryResult<&FormBindingSpec> {
        let resolved_version = match version {
            Some(v) => v.to_string(),
            None => self
                .latest
                .get(binding_id)
                .cloned()
                .ok_or_else(|| RegistryError::NotFound {
                    id: binding_id.to_string(),
                })?,
        };
        self.by_id_version
            .get(&(binding_id.to_string(), resolved_version.clone()))
            .ok_or_else(|| RegistryError::VersionNotFound {
                id: binding_id.to_string(),
                version: resolved_version,
            })
    }

    pub fn len(&self) -> usize {
        self.by_id_version.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id_version.is_empty()
    }
}

fn parse_version(s: &str) -> Version {
    Version::parse(s).unwrap_or(Version::new(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn phq9_json(version: &str) -> String {
        format!(
            r#"{{
              "measure_id": "phq9", "version": "{version}", "name": "PHQ-9", "description": "d",
              "kind": "questionnaire",
              "items": [{{"item_id":"phq9_item1","position":1,"text":"q","response_map":{{"never":0,"always":3}},"min_value":0,"max_value":3}}],
              "scales": [{{"scale_id":"phq9_total","name":"Total","items":["phq9_item1"],"method":"sum","min":0,"max":3,
                "interpretations":[{{"min":0,"max":3,"label":"x","severity":0}}]}}]
            }}"#
        )
    }

    #[test]
    fn loads_and_resolves_latest() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "measures/phq9/1-0-0.json", &phq9_json("1.0.0"));
        write(dir.path(), "measures/phq9/1-1-0.json", &phq9_json("1.1.0"));

        let reg = MeasureRegistry::load_all(dir.path()).unwrap();
        assert_eq!(reg.len(), 2);
        let latest = reg.get("phq9", None).unwrap();
        assert_eq!(latest.version, "1.1.0");
        let pinned = reg.get("phq9", Some("1.0.0")).unwrap();
        assert_eq!(pinned.version, "1.0.0");
    }

    #[test]
    fn unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "measures/phq9/1-0-0.json", &phq9_json("1.0.0"));
        let reg = MeasureRegistry::load_all(dir.path()).unwrap();
        assert!(matches!(reg.get("gad7", None), Err(RegistryError::NotFound { .. })));
    }

    #[test]
    fn mismatched_dir_and_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "measures/wrong_dir/1-0-0.json", &phq9_json("1.0.0"));
        let result = MeasureRegistry::load_all(dir.path());
        assert!(matches!(result, Err(RegistryError::IdMismatch { .. })));
    }

    #[test]
    fn mismatched_filename_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "measures/phq9/1-0-0.json", &phq9_json("9.9.9"));
        let result = MeasureRegistry::load_all(dir.path());
        assert!(matches!(result, Err(RegistryError::BadVersion { .. })));
    }

    #[test]
    fn missing_measures_subdirectory_is_a_startup_failure() {
        let dir = tempfile::tempdir().unwrap();
        let result = MeasureRegistry::load_all(dir.path());
        assert!(matches!(result, Err(RegistryError::RegistryPathMissing { .. })));
    }

    #[test]
    fn missing_bindings_subdirectory_is_a_startup_failure() {
        let dir = tempfile::tempdir().unwrap();
        let result = FormBindingRegistry::load_all(dir.path());
        assert!(matches!(result, Err(RegistryError::RegistryPathMissing { .. })));
    }
}
