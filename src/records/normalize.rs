//! Response-shape normalization: flatten whatever the webhook returned into a
//! list of records.

use serde_json::Value;

use super::types::MessageRecord;

/// Wrapper fields checked, in order, after `data`
const ARRAY_FIELDS: [&str; 3] = ["records", "body", "items"];

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Pick the record list out of a response payload. The first matching rule
/// wins:
///
/// 1. the payload itself is an array
/// 2. a truthy `data` field (wrapped if it is not an array)
/// 3. `records`, `body` or `items` holding an array
/// 4. the first field, in document order, holding an array
/// 5. the payload as a single record
pub fn normalize_payload(payload: Value) -> Vec<Value> {
    let mut map = match payload {
        Value::Array(items) => return items,
        Value::Object(map) => map,
        other => return vec![other],
    };

    if map.get("data").is_some_and(is_truthy) {
        return match map.remove("data") {
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
            None => Vec::new(),
        };
    }

    for field in ARRAY_FIELDS {
        if let Some(Value::Array(items)) = map.get_mut(field) {
            return std::mem::take(items);
        }
    }

    if let Some(items) = map.values_mut().find_map(|v| match v {
        Value::Array(items) => Some(items),
        _ => None,
    }) {
        return std::mem::take(items);
    }

    vec![Value::Object(map)]
}

/// Normalize and wrap as records
pub fn parse_response_data(payload: Value) -> Vec<MessageRecord> {
    normalize_payload(payload)
        .into_iter()
        .map(MessageRecord::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn direct_array() {
        let out = normalize_payload(json!([{"a": 1}, {"a": 2}]));
        assert_eq!(out, vec![json!({"a": 1}), json!({"a": 2})]);
    }

    #[test]
    fn data_array_and_data_object() {
        assert_eq!(normalize_payload(json!({"data": [1, 2]})), vec![json!(1), json!(2)]);
        assert_eq!(
            normalize_payload(json!({"data": {"CHAT ID": "1"}})),
            vec![json!({"CHAT ID": "1"})]
        );
    }

    #[test]
    fn falsy_data_is_skipped() {
        let out = normalize_payload(json!({"data": null, "records": [1]}));
        assert_eq!(out, vec![json!(1)]);
        let out = normalize_payload(json!({"data": "", "items": [2]}));
        assert_eq!(out, vec![json!(2)]);
    }

    #[test]
    fn records_body_items() {
        assert_eq!(normalize_payload(json!({"records": [1]})), vec![json!(1)]);
        assert_eq!(normalize_payload(json!({"body": [2]})), vec![json!(2)]);
        assert_eq!(normalize_payload(json!({"items": [3]})), vec![json!(3)]);
    }

    #[test]
    fn non_array_wrapper_fields_fall_through() {
        let out = normalize_payload(json!({"records": "nope", "rows": [4]}));
        assert_eq!(out, vec![json!(4)]);
    }

    #[test]
    fn first_match_wins() {
        // data beats records even when records has more entries
        let out = normalize_payload(json!({
            "records": [1, 2, 3],
            "data": [9],
        }));
        assert_eq!(out, vec![json!(9)]);

        // records beats items regardless of field order
        let out = normalize_payload(json!({"items": [1], "records": [2]}));
        assert_eq!(out, vec![json!(2)]);
    }

    #[test]
    fn first_array_field_in_document_order() {
        let payload: Value =
            serde_json::from_str(r#"{"meta": {"n": 2}, "zeta": [1], "alpha": [2]}"#).unwrap();
        assert_eq!(normalize_payload(payload), vec![json!(1)]);
    }

    #[test]
    fn single_object_is_wrapped() {
        let out = normalize_payload(json!({"CHAT ID": "1", "USER MESSAGE": "hi"}));
        assert_eq!(out, vec![json!({"CHAT ID": "1", "USER MESSAGE": "hi"})]);
    }

    #[test]
    fn scalar_is_wrapped() {
        assert_eq!(normalize_payload(json!("hello")), vec![json!("hello")]);
    }

    #[test]
    fn empty_array_stays_empty() {
        assert!(normalize_payload(json!([])).is_empty());
        assert!(normalize_payload(json!({"records": []})).is_empty());
    }

    #[test]
    fn parse_response_data_wraps_records() {
        let records = parse_response_data(json!({"records": [{"CHAT ID": "7"}]}));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].chat_id().as_deref(), Some("7"));
    }
}
