//! Field coercion between Terraform values and wire types
//!
//! Plan and state arrive as `Dynamic` trees. `ObjectReader` pulls typed
//! fields out of one object level, reporting failures against the
//! attribute path so the operator can find the offending line.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tfplug::{AttributePath, Dynamic, DynamicValue};

use crate::error::ProviderError;

/// A configured field: not mentioned, explicitly cleared, or set
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TriState<T> {
    #[default]
    Unset,
    Null,
    Value(T),
}

impl<T> TriState<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, TriState::Unset)
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            TriState::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Collapses null and unset; for request fields where both mean "omit"
    pub fn into_option(self) -> Option<T> {
        match self {
            TriState::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TriState<U> {
        match self {
            TriState::Unset => TriState::Unset,
            TriState::Null => TriState::Null,
            TriState::Value(v) => TriState::Value(f(v)),
        }
    }

    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<TriState<U>, E> {
        Ok(match self {
            TriState::Unset => TriState::Unset,
            TriState::Null => TriState::Null,
            TriState::Value(v) => TriState::Value(f(v)?),
        })
    }

    /// Unset leaves `target` alone, null clears it, a value replaces it
    pub fn apply_to(self, target: &mut Option<T>) {
        match self {
            TriState::Unset => {}
            TriState::Null => *target = None,
            TriState::Value(v) => *target = Some(v),
        }
    }
}

impl<T> From<Option<T>> for TriState<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(TriState::Null, TriState::Value)
    }
}

/// Typed access to the fields of one object in a plan or state
#[derive(Debug, Clone)]
pub struct ObjectReader<'a> {
    fields: Option<&'a HashMap<String, Dynamic>>,
    path: AttributePath,
}

impl<'a> ObjectReader<'a> {
    pub fn new(value: &'a DynamicValue) -> Self {
        Self::at(&value.value, AttributePath::root())
    }

    fn at(value: &'a Dynamic, path: AttributePath) -> Self {
        let fields = match value {
            Dynamic::Map(fields) => Some(fields),
            _ => None,
        };
        Self { fields, path }
    }

    pub fn path(&self, name: &str) -> AttributePath {
        self.path.clone().attribute(name)
    }

    fn raw(&self, name: &str) -> Option<&'a Dynamic> {
        self.fields.and_then(|fields| fields.get(name))
    }

    fn mismatch(&self, name: &str, expected: &str, actual: &Dynamic) -> ProviderError {
        ProviderError::validation(
            self.path(name),
            format!("expected a {} value, got {}", expected, actual.type_name()),
        )
    }

    fn read<T>(
        &self,
        name: &str,
        convert: impl FnOnce(&'a Dynamic) -> Option<T>,
        expected: &str,
    ) -> Result<TriState<T>, ProviderError> {
        match self.raw(name) {
            None | Some(Dynamic::Unknown) => Ok(TriState::Unset),
            Some(Dynamic::Null) => Ok(TriState::Null),
            Some(value) => convert(value)
                .map(TriState::Value)
                .ok_or_else(|| self.mismatch(name, expected, value)),
        }
    }

    pub fn string(&self, name: &str) -> Result<TriState<String>, ProviderError> {
        self.read(name, |v| v.as_str().map(str::to_string), "string")
    }

    pub fn bool(&self, name: &str) -> Result<TriState<bool>, ProviderError> {
        self.read(
            name,
            |v| match v {
                Dynamic::Bool(b) => Some(*b),
                _ => None,
            },
            "bool",
        )
    }

    pub fn i64(&self, name: &str) -> Result<TriState<i64>, ProviderError> {
        self.read(
            name,
            |v| match v {
                Dynamic::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                    Some(*n as i64)
                }
                _ => None,
            },
            "whole number",
        )
    }

    /// Rate limits and other small counts
    pub fn u16(&self, name: &str) -> Result<TriState<u16>, ProviderError> {
        let path = self.path(name);
        self.i64(name)?.try_map(|n| {
            u16::try_from(n).map_err(|_| {
                ProviderError::validation(path, format!("must be between 0 and {}, got: {}", u16::MAX, n))
            })
        })
    }

    pub fn string_list(&self, name: &str) -> Result<TriState<Vec<String>>, ProviderError> {
        self.read(
            name,
            |v| match v {
                Dynamic::List(items) => items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect(),
                _ => None,
            },
            "list of strings",
        )
    }

    /// A JSON-encoded object held in a string attribute
    pub fn json_object(&self, name: &str) -> Result<TriState<Map<String, Value>>, ProviderError> {
        let path = self.path(name);
        self.string(name)?.try_map(|text| parse_json_object(&path, &text))
    }

    /// A JSON-encoded object of string values, as used for metadata
    pub fn json_string_map(
        &self,
        name: &str,
    ) -> Result<TriState<HashMap<String, String>>, ProviderError> {
        let path = self.path(name);
        self.string(name)?.try_map(|text| {
            serde_json::from_str(&text).map_err(|source| ProviderError::Decode { path, source })
        })
    }

    /// The nested object `name`, when the plan carries one. Null and unknown
    /// wrappers yield `None`.
    pub fn nested(&self, name: &str) -> Option<ObjectReader<'a>> {
        match self.raw(name) {
            Some(value @ Dynamic::Map(_)) => Some(Self::at(value, self.path(name))),
            _ => None,
        }
    }

    /// A string the resource cannot proceed without, e.g. an id from state
    pub fn required_string(&self, name: &str) -> Result<String, ProviderError> {
        self.string(name)?.into_option().ok_or_else(|| {
            ProviderError::validation(self.path(name), format!("{} must be set", self.path(name)))
        })
    }
}

pub fn parse_json_object(path: &AttributePath, text: &str) -> Result<Map<String, Value>, ProviderError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ProviderError::validation(
            path.clone(),
            format!("expected a JSON object, got {}", json_kind(&other)),
        )),
        Err(source) => Err(ProviderError::Decode {
            path: path.clone(),
            source,
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Canonical text for a JSON value: compact, keys sorted
pub fn json_to_state(value: &impl serde::Serialize) -> Result<String, ProviderError> {
    let value = serde_json::to_value(value).map_err(|source| ProviderError::Decode {
        path: AttributePath::root(),
        source,
    })?;
    Ok(value.to_string())
}

/// Re-serializes `text` through `serde_json::Value` so equal JSON compares equal
pub fn normalize_json(text: &str) -> Result<String, serde_json::Error> {
    serde_json::from_str::<Value>(text).map(|v| v.to_string())
}

/// State text for a JSON attribute. The configured text is kept while it
/// encodes the same value as `remote`, so reformatting is not drift.
pub fn json_state(
    configured: Option<&str>,
    remote: &impl serde::Serialize,
) -> Result<String, ProviderError> {
    let remote = json_to_state(remote)?;
    match configured {
        Some(text) if normalize_json(text).is_ok_and(|normalized| normalized == remote) => {
            Ok(text.to_string())
        }
        _ => Ok(remote),
    }
}

/// RFC 3339 at second precision with a `Z` suffix
pub fn timestamp(value: &DateTime<Utc>) -> Dynamic {
    Dynamic::String(value.to_rfc3339_opts(SecondsFormat::Secs, true))
}

pub fn string_list(values: &[String]) -> Dynamic {
    Dynamic::List(values.iter().map(|v| Dynamic::string(v.as_str())).collect())
}

pub fn rate_limit(value: Option<u16>) -> Dynamic {
    value.map_or(Dynamic::Null, |v| Dynamic::Number(f64::from(v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn plan(entries: Vec<(&str, Dynamic)>) -> DynamicValue {
        DynamicValue::new(Dynamic::object(entries))
    }

    #[test]
    fn tri_state_distinguishes_absent_null_and_value() {
        let value = plan(vec![
            ("cleared", Dynamic::Null),
            ("set", Dynamic::string("x")),
            ("pending", Dynamic::Unknown),
        ]);
        let reader = ObjectReader::new(&value);
        assert_eq!(reader.string("missing").unwrap(), TriState::Unset);
        assert_eq!(reader.string("pending").unwrap(), TriState::Unset);
        assert_eq!(reader.string("cleared").unwrap(), TriState::Null);
        assert_eq!(reader.string("set").unwrap(), TriState::Value("x".to_string()));
    }

    #[test]
    fn apply_to_honors_each_state() {
        let mut target = Some(1);
        TriState::Unset.apply_to(&mut target);
        assert_eq!(target, Some(1));
        TriState::Value(2).apply_to(&mut target);
        assert_eq!(target, Some(2));
        TriState::Null.apply_to(&mut target);
        assert_eq!(target, None);
    }

    #[test]
    fn type_mismatch_names_the_attribute() {
        let value = plan(vec![(
            "whitelabel_settings",
            Dynamic::object([("base_font_size", Dynamic::string("big"))]),
        )]);
        let nested = ObjectReader::new(&value).nested("whitelabel_settings").unwrap();
        let err = nested.i64("base_font_size").unwrap_err();
        assert_eq!(
            err.path().unwrap().to_string(),
            "whitelabel_settings.base_font_size"
        );
    }

    #[test]
    fn integers_reject_fractions() {
        let value = plan(vec![("n", Dynamic::Number(12.0)), ("f", Dynamic::Number(1.5))]);
        let reader = ObjectReader::new(&value);
        assert_eq!(reader.i64("n").unwrap(), TriState::Value(12));
        assert!(reader.i64("f").is_err());
    }

    #[test]
    fn null_wrapper_is_not_nested() {
        let value = plan(vec![("palette", Dynamic::Null), ("theme", Dynamic::Unknown)]);
        let reader = ObjectReader::new(&value);
        assert!(reader.nested("palette").is_none());
        assert!(reader.nested("theme").is_none());
        assert!(reader.nested("absent").is_none());
    }

    #[test]
    fn malformed_json_is_decode_error() {
        let value = plan(vec![("schemas", Dynamic::string("{\"a\": "))]);
        let err = ObjectReader::new(&value).json_object("schemas").unwrap_err();
        assert!(matches!(err, ProviderError::Decode { ref path, .. } if path.to_string() == "schemas"));
    }

    #[test]
    fn json_arrays_are_not_objects() {
        let value = plan(vec![("config", Dynamic::string("[1,2]"))]);
        let err = ObjectReader::new(&value).json_object("config").unwrap_err();
        assert!(matches!(err, ProviderError::Validation { .. }));
    }

    #[test]
    fn normalized_json_round_trips() {
        let text = r#"{ "z": [1, 2, {"b": null, "a": true}], "a": "x" }"#;
        let normalized = normalize_json(text).unwrap();
        assert_eq!(normalized, r#"{"a":"x","z":[1,2,{"a":true,"b":null}]}"#);
        let original: Value = serde_json::from_str(text).unwrap();
        let reparsed: Value = serde_json::from_str(&normalized).unwrap();
        assert_eq!(original, reparsed);
    }

    #[test]
    fn configured_json_text_survives_when_equal() {
        let remote: HashMap<String, String> =
            [("team".to_string(), "core".to_string())].into_iter().collect();
        assert_eq!(
            json_state(Some("{ \"team\": \"core\" }"), &remote).unwrap(),
            "{ \"team\": \"core\" }"
        );
        assert_eq!(
            json_state(Some("{\"team\":\"edge\"}"), &remote).unwrap(),
            "{\"team\":\"core\"}"
        );
        assert_eq!(json_state(None, &remote).unwrap(), "{\"team\":\"core\"}");
    }

    #[test]
    fn u16_rejects_out_of_range() {
        let value = plan(vec![
            ("ok", Dynamic::Number(500.0)),
            ("big", Dynamic::Number(70_000.0)),
        ]);
        let reader = ObjectReader::new(&value);
        assert_eq!(reader.u16("ok").unwrap(), TriState::Value(500));
        assert!(reader.u16("big").is_err());
        assert_eq!(reader.u16("missing").unwrap(), TriState::Unset);
    }

    #[test]
    fn metadata_map_requires_string_values() {
        let good = plan(vec![("metadata", Dynamic::string(r#"{"team":"core"}"#))]);
        let map = ObjectReader::new(&good)
            .json_string_map("metadata")
            .unwrap()
            .into_option()
            .unwrap();
        assert_eq!(map.get("team").map(String::as_str), Some("core"));

        let bad = plan(vec![("metadata", Dynamic::string(r#"{"n":1}"#))]);
        assert!(ObjectReader::new(&bad).json_string_map("metadata").is_err());
    }

    #[test]
    fn timestamps_render_in_utc_seconds() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(timestamp(&at), Dynamic::string("2024-05-01T10:00:00Z"));
    }
}
