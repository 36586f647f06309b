//! Per-entry normalization of decoded call entries.
//!
//! Every entry yields a [`NormalizedCall`], whatever its shape. Missing
//! fields fall back to defaults and string arguments that are not JSON pass
//! through verbatim; each such fallback is reported as a [`Recovery`].

use serde_json::{Map, Value};

use crate::config::ExtractorConfig;
use crate::diagnostics::Recovery;
use crate::directive::encode::encode_json;
use crate::types::NormalizedCall;

/// The shapes a model uses for call parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawParameters<'a> {
    /// A JSON object.
    Mapping(&'a Map<String, Value>),
    /// A string, which may itself hold encoded JSON.
    Text(&'a str),
    /// Anything else: number, array, bool or null.
    Scalar(&'a Value),
}

impl<'a> RawParameters<'a> {
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => RawParameters::Mapping(map),
            Value::String(text) => RawParameters::Text(text),
            other => RawParameters::Scalar(other),
        }
    }
}

/// Normalized arguments, and whether a string had to pass through raw.
pub(crate) struct Arguments {
    pub json: String,
    pub verbatim: bool,
}

pub(crate) fn normalize_arguments(params: RawParameters<'_>, config: &ExtractorConfig) -> Arguments {
    match params {
        RawParameters::Mapping(map) => Arguments {
            json: encode_json(&Value::Object(map.clone()), config.json_style),
            verbatim: false,
        },
        RawParameters::Text(text) => match serde_json::from_str::<Value>(text) {
            Ok(decoded) => Arguments {
                json: encode_json(&decoded, config.json_style),
                verbatim: false,
            },
            Err(_) => Arguments {
                json: text.to_string(),
                verbatim: true,
            },
        },
        RawParameters::Scalar(value) => Arguments {
            json: encode_json(value, config.json_style),
            verbatim: false,
        },
    }
}

fn first_field<'a>(entry: &'a Map<String, Value>, keys: &[String]) -> Option<&'a Value> {
    keys.iter().find_map(|key| entry.get(key))
}

/// Normalize the entry at position `index` of a decoded payload.
///
/// # Examples
///
/// ```
/// use llm_toolcall::config::ExtractorConfig;
/// use llm_toolcall::directive::normalize::normalize_entry;
/// use serde_json::json;
///
/// let entry = json!({"tool_name": "search", "parameters": "{\"x\":1}"});
/// let (call, recoveries) = normalize_entry(0, &entry, &ExtractorConfig::default());
/// assert_eq!(call.name, "search");
/// assert_eq!(call.arguments_json, r#"{"x": 1}"#);
/// assert!(recoveries.is_empty());
/// ```
pub fn normalize_entry(
    index: usize,
    entry: &Value,
    config: &ExtractorConfig,
) -> (NormalizedCall, Vec<Recovery>) {
    let mut recoveries = Vec::new();
    let empty = Map::new();
    let fields = match entry {
        Value::Object(map) => map,
        _ => &empty,
    };

    let name = match first_field(fields, &config.name_keys) {
        Some(Value::String(name)) => name.clone(),
        _ => {
            recoveries.push(Recovery::EntryFieldMissing {
                index,
                field: "name",
            });
            String::new()
        }
    };

    let default_params = Value::Object(Map::new());
    let params = match first_field(fields, &config.parameters_keys) {
        Some(params) => params,
        None => {
            recoveries.push(Recovery::EntryFieldMissing {
                index,
                field: "parameters",
            });
            &default_params
        }
    };

    let arguments = normalize_arguments(RawParameters::classify(params), config);
    if arguments.verbatim {
        recoveries.push(Recovery::ArgumentsUnparsable { index });
    }

    (NormalizedCall::new(name, arguments.json), recoveries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JsonStyle;
    use serde_json::json;

    fn norm(entry: Value) -> (NormalizedCall, Vec<Recovery>) {
        normalize_entry(0, &entry, &ExtractorConfig::default())
    }

    #[test]
    fn mapping_parameters() {
        let (call, rec) = norm(json!({"tool_name": "search", "parameters": {"q": "cats"}}));
        assert_eq!(call, NormalizedCall::new("search", r#"{"q": "cats"}"#));
        assert!(rec.is_empty());
    }

    #[test]
    fn json_string_parameters_are_decoded() {
        let (call, _) = norm(json!({"tool_name": "t", "parameters": "{\"x\":1}"}));
        let v: Value = serde_json::from_str(&call.arguments_json).unwrap();
        assert_eq!(v, json!({"x": 1}));
    }

    #[test]
    fn json_string_holding_scalar() {
        let (call, _) = norm(json!({"tool_name": "t", "parameters": "[1,2]"}));
        assert_eq!(call.arguments_json, "[1, 2]");
    }

    #[test]
    fn non_json_string_passes_through() {
        let (call, rec) = norm(json!({"tool_name": "t", "parameters": "not json"}));
        assert_eq!(call.arguments_json, "not json");
        assert_eq!(rec, vec![Recovery::ArgumentsUnparsable { index: 0 }]);
    }

    #[test]
    fn scalar_parameters_are_encoded() {
        assert_eq!(norm(json!({"tool_name": "t", "parameters": 3})).0.arguments_json, "3");
        assert_eq!(
            norm(json!({"tool_name": "t", "parameters": [1, "a"]})).0.arguments_json,
            r#"[1, "a"]"#
        );
        assert_eq!(norm(json!({"tool_name": "t", "parameters": true})).0.arguments_json, "true");
        assert_eq!(norm(json!({"tool_name": "t", "parameters": null})).0.arguments_json, "null");
    }

    #[test]
    fn wide_integers_keep_their_digits() {
        let entry: Value = serde_json::from_str(
            r#"{"tool_name": "t", "parameters": {"id": 12345678901234567890123}}"#,
        )
        .unwrap();
        assert_eq!(norm(entry).0.arguments_json, r#"{"id": 12345678901234567890123}"#);

        let (call, _) = norm(json!({"tool_name": "t", "parameters": "{\"id\": 98765432109876543210}"}));
        assert_eq!(call.arguments_json, r#"{"id": 98765432109876543210}"#);
    }

    #[test]
    fn out_of_range_floats_survive() {
        let entry: Value =
            serde_json::from_str(r#"{"tool_name": "t", "parameters": {"x": 1e400, "y": -2.5e-400}}"#)
                .unwrap();
        assert_eq!(norm(entry).0.arguments_json, r#"{"x": 1e400, "y": -2.5e-400}"#);
    }

    #[test]
    fn missing_fields_default() {
        let (call, rec) = norm(json!({}));
        assert_eq!(call, NormalizedCall::new("", "{}"));
        assert_eq!(
            rec,
            vec![
                Recovery::EntryFieldMissing { index: 0, field: "name" },
                Recovery::EntryFieldMissing { index: 0, field: "parameters" },
            ]
        );
    }

    #[test]
    fn non_object_entry_defaults() {
        let (call, rec) = norm(json!("just a string"));
        assert_eq!(call, NormalizedCall::new("", "{}"));
        assert_eq!(rec.len(), 2);
    }

    #[test]
    fn non_string_name_defaults() {
        let (call, rec) = norm(json!({"tool_name": 7, "parameters": {}}));
        assert_eq!(call.name, "");
        assert_eq!(rec.len(), 1);
    }

    #[test]
    fn name_aliases_in_priority_order() {
        let (call, _) = norm(json!({"name": "b", "tool_name": "a"}));
        assert_eq!(call.name, "a");
        let (call, _) = norm(json!({"name": "b", "arguments": {"k": 1}}));
        assert_eq!(call, NormalizedCall::new("b", r#"{"k": 1}"#));
    }

    #[test]
    fn custom_keys_and_compact_style() {
        let config = ExtractorConfig::default()
            .with_name_keys(["fn"])
            .with_parameters_keys(["args"])
            .with_json_style(JsonStyle::Compact);
        let (call, _) = normalize_entry(3, &json!({"fn": "f", "args": {"a": [1, 2]}}), &config);
        assert_eq!(call, NormalizedCall::new("f", r#"{"a":[1,2]}"#));
    }

    #[test]
    fn mapping_round_trips() {
        let params = json!({"nested": {"list": [1, 2.5, "x"], "flag": false}, "empty": {}});
        let (call, _) = norm(json!({"tool_name": "t", "parameters": params.clone()}));
        let decoded: Value = serde_json::from_str(&call.arguments_json).unwrap();
        assert_eq!(decoded, params);
        let (again, _) = norm(json!({"tool_name": "t", "parameters": call.arguments_json}));
        assert_eq!(again.arguments_json, call.arguments_json);
    }

    #[test]
    fn classify_shapes() {
        assert!(matches!(RawParameters::classify(&json!({})), RawParameters::Mapping(_)));
        assert!(matches!(RawParameters::classify(&json!("s")), RawParameters::Text("s")));
        assert!(matches!(RawParameters::classify(&json!(1)), RawParameters::Scalar(_)));
    }
}
