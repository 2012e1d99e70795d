//! Locates the record array inside a list-style response envelope.

use serde_json::Value;
use tracing::debug;

use crate::normalize::TITLE;
use crate::pick;

/// Most suggestions returned for one query.
pub const SUGGESTION_LIMIT: usize = 5;

/// One way of finding the records. Strategies are tried in table order.
pub struct Strategy {
    pub name: &'static str,
    pub find: for<'a> fn(&'a Value) -> Option<&'a Vec<Value>>,
}

/// Keys probed under a successful envelope's `data`, in priority order.
const DATA_KEYS: [&str; 4] = ["list", "items", "results", "data"];

fn successful_data(v: &Value) -> Option<&Value> {
    let ok = v.get("success").and_then(Value::as_bool) == Some(true);
    let data = v.get("data")?;
    (ok && data.is_object()).then_some(data)
}

fn named_data_array(v: &Value) -> Option<&Vec<Value>> {
    let data = successful_data(v)?;
    DATA_KEYS.iter().find_map(|k| pick::array(data, &[*k]))
}

fn first_data_array(v: &Value) -> Option<&Vec<Value>> {
    successful_data(v)?.as_object()?.values().find_map(Value::as_array)
}

fn top_level_list(v: &Value) -> Option<&Vec<Value>> {
    pick::array(v, &["list"])
}

pub const STRATEGIES: &[Strategy] = &[
    Strategy { name: "data.<named>", find: named_data_array },
    Strategy { name: "data.<first array>", find: first_data_array },
    Strategy { name: "list", find: top_level_list },
    Strategy { name: "bare array", find: Value::as_array },
];

/// Raw records of a list envelope, or an empty vec when none can be found.
pub fn extract_records(v: &Value) -> Vec<Value> {
    for s in STRATEGIES {
        if let Some(records) = (s.find)(v) {
            debug!(strategy = s.name, count = records.len(), "records located");
            return records.clone();
        }
    }
    debug!("no record array in response");
    Vec::new()
}

/// Suggestion texts from a `/suggest` response. Strings are kept as-is,
/// objects contribute their title.
pub fn extract_suggestions(v: &Value) -> Vec<String> {
    let listed = successful_data(v)
        .or_else(|| {
            let ok = v.get("success").and_then(Value::as_bool) == Some(true);
            v.get("data").filter(|d| ok && d.is_array())
        })
        .and_then(|data| {
            [&["suggestions"][..], &["list"][..], &[][..]]
                .iter()
                .find_map(|path| pick::at(data, path).filter(|x| pick::truthy(x, &[])))
        })
        .and_then(Value::as_array)
        .or_else(|| v.as_array());
    listed
        .map(|arr| {
            arr.iter()
                .filter_map(|s| match s {
                    Value::String(t) if !t.trim().is_empty() => Some(t.clone()),
                    Value::Object(_) => pick::resolve(s, TITLE),
                    _ => None,
                })
                .take(SUGGESTION_LIMIT)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_list_returned_intact() {
        let v = json!({
            "success": true,
            "data": {"list": [{"bookId": "1"}, {"bookId": "2"}, {"bookId": "3"}], "isMore": true},
            "meta": {}
        });
        let out = extract_records(&v);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0]["bookId"], "1");
        assert_eq!(out[2]["bookId"], "3");
    }

    #[test]
    fn named_keys_follow_priority() {
        let v = json!({"success": true, "data": {"results": [1], "items": [2, 3]}});
        assert_eq!(extract_records(&v), vec![json!(2), json!(3)]);

        let v = json!({"success": true, "data": {"data": [4]}});
        assert_eq!(extract_records(&v), vec![json!(4)]);
    }

    #[test]
    fn named_key_must_be_array() {
        let v = json!({"success": true, "data": {"list": {"x": 1}, "columnVoList": [7, 8]}});
        assert_eq!(extract_records(&v), vec![json!(7), json!(8)]);
    }

    #[test]
    fn first_array_in_document_order() {
        let v = json!({"success": true, "data": {"total": 2, "zeta": [1], "alpha": [2]}});
        assert_eq!(extract_records(&v), vec![json!(1)]);
    }

    #[test]
    fn top_level_list_and_bare_array() {
        let v = json!({"list": [{"id": 9}]});
        assert_eq!(extract_records(&v).len(), 1);

        let v = json!({"success": false, "data": {"list": [1, 2]}, "list": [3]});
        assert_eq!(extract_records(&v), vec![json!(3)]);

        let v = json!([{"id": 1}, {"id": 2}]);
        assert_eq!(extract_records(&v).len(), 2);
    }

    #[test]
    fn unrecognized_shapes_are_empty() {
        for v in [
            json!(null),
            json!("text"),
            json!(12),
            json!({}),
            json!({"success": true}),
            json!({"success": true, "data": null}),
            json!({"success": true, "data": {"total": 0}}),
            json!({"success": "true", "data": {"list": [1]}}),
            json!({"data": {"list": [1]}}),
        ] {
            assert!(extract_records(&v).is_empty(), "{v}");
        }
    }

    #[test]
    fn suggestions_are_capped_at_five() {
        let v = json!({"success": true, "data": {"suggestions": ["a", "b", "c", "d", "e", "f"]}});
        assert_eq!(extract_suggestions(&v), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn suggestions_from_objects_and_bare_arrays() {
        let v = json!({"success": true, "data": {"list": [{"bookName": "Love"}, {"other": 1}, "Loyal"]}});
        assert_eq!(extract_suggestions(&v), vec!["Love", "Loyal"]);

        let v = json!({"success": true, "data": ["x", "y"]});
        assert_eq!(extract_suggestions(&v), vec!["x", "y"]);

        let v = json!(["p", "", "q"]);
        assert_eq!(extract_suggestions(&v), vec!["p", "q"]);

        assert!(extract_suggestions(&json!({"success": false, "data": ["x"]})).is_empty());
        assert!(extract_suggestions(&json!({"success": true, "data": {"total": 3}})).is_empty());
    }
}
