//! Flat item-map loader: the alternative binding source to a registered
//! Form Binding Spec section (§4.2). One file per `(form_id, measure_id)`
//! pair, a plain `field_id -> item_id` object.
//!
//! `form-mappings/<form_id>/<measure_id>.json`

use std::path::Path;

use mq_core::ItemMap;

use crate::{RegistryError, RegistryResult};

pub fn load_item_map(root: &Path, form_id: &str, measure_id: &str) -> RegistryResult<ItemMap> {
    let path = root.join(form_id).join(format!("{measure_id}.json"));
    let bytes = std::fs::read(&path).map_err(|e| RegistryError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| RegistryError::Json {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn item_map_exists(root: &Path, form_id: &str, measure_id: &str) -> bool {
    root.join(form_id).join(format!("{measure_id}.json")).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_flat_map() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("form-x");
        fs::create_dir_all(&sub).unwrap();
        fs::write(
            sub.join("phq9.json"),
            r#"{"entry.1":"phq9_item1","entry.2":"phq9_item2"}"#,
        )
        .unwrap();

        let map = load_item_map(dir.path(), "form-x", "phq9").unwrap();
        assert_eq!(map.get("entry.1").map(|s| s.as_str()), Some("phq9_item1"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_item_map(dir.path(), "nope", "phq9");
        assert!(matches!(result, Err(RegistryError::Io { .. })));
    }
}
