//! Recoder (§4.3): converts each raw answer into the integer value defined
//! by its measure item's response map.

use mq_core::{Item, RawValue};

#[derive(Clone, Debug, PartialEq)]
pub enum RecodeOutcome {
    /// Accepted value and the original answer text, kept for the
    /// observation's `raw_answer` field.
    Present(i64, String),
    /// `raw_value` was null or an empty/whitespace-only string. Not a
    /// diagnostic by itself — completeness is judged later, against
    /// `scale.missing_allowed`.
    Missing,
    /// Neither a known response-map entry nor an in-range integer. Carries
    /// the original text for the `UNRECOGNIZED_VALUE` diagnostic.
    Unrecognized(String),
}

impl RecodeOutcome {
    pub fn value(&self) -> Option<i64> {
        match self {
            RecodeOutcome::Present(v, _) => Some(*v),
            _ => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, RecodeOutcome::Present(_, _))
    }
}

/// Lower-case, collapse internal whitespace runs to a single space, trim.
pub fn normalize_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = false;
    for c in s.trim().chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.extend(c.to_lowercase());
            last_was_space = false;
        }
    }
    out
}

/// Recode one submission item's raw value against its canonical `item`.
pub fn recode_value(item: &Item, raw: &RawValue) -> RecodeOutcome {
    if raw.is_missing() {
        return RecodeOutcome::Missing;
    }
    let text = match raw.as_text() {
        Some(t) => t,
        None => return RecodeOutcome::Missing,
    };

    let normalized = normalize_text(&text);
    if let Some(&v) = item.response_map.get(&normalized) {
        return RecodeOutcome::Present(v, text);
    }

    if let Ok(n) = text.trim().parse::<i64>() {
        if n >= item.min_value && n <= item.max_value {
            return RecodeOutcome::Present(n, text);
        }
    }

    RecodeOutcome::Unrecognized(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn item() -> Item {
        let mut response_map = BTreeMap::new();
        response_map.insert("not at all".to_string(), 0);
        response_map.insert("several days".to_string(), 1);
        response_map.insert("more than half the days".to_string(), 2);
        response_map.insert("nearly every day".to_string(), 3);
        Item {
            item_id: "phq9_item1".to_string(),
            position: 1,
            text: "Little interest or pleasure in doing things".to_string(),
            response_map,
            min_value: 0,
            max_value: 3,
        }
    }

    #[test]
    fn exact_response_map_match() {
        let v = recode_value(&item(), &RawValue::Text("Several Days".to_string()));
        assert_eq!(v, RecodeOutcome::Present(1, "Several Days".to_string()));
    }

    #[test]
    fn whitespace_is_normalized() {
        let v = recode_value(&item(), &RawValue::Text("  several   days  ".to_string()));
        assert!(matches!(v, RecodeOutcome::Present(1, _)));
    }

    #[test]
    fn in_range_numeric_is_accepted() {
        let v = recode_value(&item(), &RawValue::Number(2.0));
        assert_eq!(v, RecodeOutcome::Present(2, "2".to_string()));
    }

    #[test]
    fn out_of_range_numeric_is_unrecognized() {
        let v = recode_value(&item(), &RawValue::Number(99.0));
        assert!(matches!(v, RecodeOutcome::Unrecognized(_)));
    }

    #[test]
    fn unknown_text_is_unrecognized() {
        let v = recode_value(&item(), &RawValue::Text("somewhat".to_string()));
        assert_eq!(v, RecodeOutcome::Unrecognized("somewhat".to_string()));
    }

    #[test]
    fn null_is_missing_without_diagnostic() {
        assert_eq!(recode_value(&item(), &RawValue::Null), RecodeOutcome::Missing);
        assert_eq!(
            recode_value(&item(), &RawValue::Text("   ".to_string())),
            RecodeOutcome::Missing
        );
    }
}
