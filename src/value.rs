//! Conversions from configuration/front-matter JSON values into template
//! [`Value`]s.

use std::collections::HashMap;

use gtmpl::Value;

/// Converts a [`serde_json::Value`] into a template [`Value`].
pub fn to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::from(*b),
        serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::from(i),
            (None, Some(f)) => Value::from(f),
            (None, None) => Value::Nil,
        },
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::Array(items.iter().map(to_value).collect()),
        serde_json::Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), to_value(value)))
                .collect(),
        ),
    }
}

/// Converts a string slice list into a template array value.
pub fn string_list(items: &[String]) -> Value {
    Value::Array(items.iter().map(|s| Value::String(s.clone())).collect())
}

/// Builds an object value from key/value pairs.
pub fn object(pairs: impl IntoIterator<Item = (String, Value)>) -> Value {
    Value::Object(pairs.into_iter().collect::<HashMap<String, Value>>())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_scalars_convert() {
        assert_eq!(to_value(&serde_json::json!(null)), Value::Nil);
        assert_eq!(to_value(&serde_json::json!(true)), Value::from(true));
        assert_eq!(to_value(&serde_json::json!(3)), Value::from(3i64));
        assert_eq!(
            to_value(&serde_json::json!("hi")),
            Value::String("hi".to_owned())
        );
    }

    #[test]
    fn test_nested_structures_convert() {
        let value = to_value(&serde_json::json!({"tags": ["a", "b"]}));
        match value {
            Value::Object(map) => match map.get("tags") {
                Some(Value::Array(items)) => assert_eq!(items.len(), 2),
                other => panic!("expected array, got {:?}", other),
            },
            other => panic!("expected object, got {:?}", other),
        }
    }
}
