//! Record buffers and path access.
//!
//! A record is a JSON object. Field keys are paths of dot-free segments
//! joined by `.`; each segment addresses one level of nested object.

use serde_json::{Map, Value};

use super::schema::FieldKind;

/// The edit buffer of one form instance.
pub type Record = Map<String, Value>;

/// Separator between path segments in a field key.
pub const PATH_SEPARATOR: char = '.';

/// Read the value at `path`. `None` when any segment is missing or an
/// intermediate value is not an object.
pub fn get<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut segments = path.split(PATH_SEPARATOR);
    let first = segments.next()?;
    let mut current = record.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Write `value` at `path`, creating intermediate objects as needed.
/// A non-object intermediate is replaced by an object.
pub fn set(record: &mut Record, path: &str, value: Value) {
    match path.split_once(PATH_SEPARATOR) {
        None => {
            record.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = record
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                set(child, rest, value);
            }
        }
    }
}

/// Remove and return the value at `path`. Never creates intermediates.
pub fn remove(record: &mut Record, path: &str) -> Option<Value> {
    match path.split_once(PATH_SEPARATOR) {
        None => record.remove(path),
        Some((head, rest)) => match record.get_mut(head)? {
            Value::Object(child) => remove(child, rest),
            _ => None,
        },
    }
}

/// Whether a value counts as "no answer" for a field of `kind`.
///
/// `false` is an answer for booleans; only a missing or null value is empty.
pub fn is_empty(kind: FieldKind, value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => match kind {
            FieldKind::Text => s.trim().is_empty(),
            FieldKind::Enum | FieldKind::Date => s.is_empty(),
            _ => false,
        },
        Some(Value::Array(items)) => kind == FieldKind::MultiEnum && items.is_empty(),
        Some(_) => false,
    }
}

/// Whether the value at `path` already equals the empty default of `kind`.
pub fn is_at_default(kind: FieldKind, value: Option<&Value>) -> bool {
    match kind.empty_default() {
        Some(default) => value == Some(&default),
        None => value.is_none(),
    }
}

/// Reset the value at `path` to the empty default of `kind`.
///
/// Leaves the record untouched when the value is already at its default, so
/// resetting an already-clean record yields an equal record.
/// Returns whether anything changed.
pub fn reset_to_default(record: &mut Record, path: &str, kind: FieldKind) -> bool {
    if is_at_default(kind, get(record, path)) {
        return false;
    }
    match kind.empty_default() {
        Some(default) => set(record, path, default),
        None => {
            remove(record, path);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn get_reads_nested_paths() {
        let r = record(json!({"ocular_tension": {"od": 14, "ttt_hypotonisant": true}}));
        assert_eq!(get(&r, "ocular_tension.od"), Some(&json!(14)));
        assert_eq!(get(&r, "ocular_tension.og"), None);
        assert_eq!(get(&r, "ocular_tension.od.deeper"), None);
        assert_eq!(get(&r, "missing.od"), None);
    }

    #[test]
    fn set_creates_and_replaces_intermediates() {
        let mut r = record(json!({"refraction": "garbage"}));
        set(&mut r, "refraction.od_s", json!(1.25));
        set(&mut r, "pachymetry.od", json!(540));
        assert_eq!(r, record(json!({
            "refraction": {"od_s": 1.25},
            "pachymetry": {"od": 540},
        })));
    }

    #[test]
    fn remove_does_not_create_parents() {
        let mut r = record(json!({"addiction": true}));
        assert_eq!(remove(&mut r, "conclusion.cat"), None);
        assert!(!r.contains_key("conclusion"));
        assert_eq!(remove(&mut r, "addiction"), Some(json!(true)));
    }

    #[test]
    fn false_is_an_answer_for_booleans() {
        assert!(!is_empty(FieldKind::Boolean, Some(&json!(false))));
        assert!(is_empty(FieldKind::Boolean, None));
        assert!(is_empty(FieldKind::Boolean, Some(&Value::Null)));
    }

    #[test]
    fn whitespace_text_and_empty_arrays_are_empty() {
        assert!(is_empty(FieldKind::Text, Some(&json!("   "))));
        assert!(is_empty(FieldKind::MultiEnum, Some(&json!([]))));
        assert!(!is_empty(FieldKind::MultiEnum, Some(&json!(["OTHER"]))));
        assert!(is_empty(FieldKind::Enum, Some(&json!(""))));
        assert!(!is_empty(FieldKind::Number, Some(&json!(0))));
    }

    #[test]
    fn reset_is_a_no_op_at_default() {
        let original = record(json!({"tabagisme_detail": "", "type_addiction": []}));
        let mut r = original.clone();
        assert!(!reset_to_default(&mut r, "tabagisme_detail", FieldKind::Text));
        assert!(!reset_to_default(&mut r, "type_addiction", FieldKind::MultiEnum));
        assert!(!reset_to_default(&mut r, "km_parcourus", FieldKind::Number));
        assert_eq!(r, original);
    }

    #[test]
    fn reset_removes_undefined_kinds() {
        let mut r = record(json!({"date_dernier_accident": "2024-02-01", "km_parcourus": null}));
        assert!(reset_to_default(&mut r, "date_dernier_accident", FieldKind::Date));
        assert!(reset_to_default(&mut r, "km_parcourus", FieldKind::Number));
        assert!(r.is_empty());
    }
}
