//! Built-in attribute validators

use crate::schema::{Validator, ValidatorRequest, ValidatorResponse};
use crate::types::{Diagnostic, Dynamic};
use regex::Regex;

/// String length bounds, counted in characters
pub struct StringLength {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl StringLength {
    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_most(max: usize) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }
}

impl Validator for StringLength {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("string length must be between {} and {}", min, max),
            (Some(min), None) => format!("string length must be at least {}", min),
            (None, Some(max)) => format!("string length must be at most {}", max),
            (None, None) => "any string length".to_string(),
        }
    }

    fn validate(&self, request: ValidatorRequest<'_>) -> ValidatorResponse {
        let Dynamic::String(s) = request.value else {
            return ValidatorResponse::ok();
        };
        let len = s.chars().count();
        let too_short = self.min.is_some_and(|min| len < min);
        let too_long = self.max.is_some_and(|max| len > max);
        if too_short || too_long {
            return ValidatorResponse::error(
                request.path,
                "Invalid Attribute Value Length",
                format!(
                    "Attribute {} {}, got: {}",
                    request.path,
                    self.description(),
                    len
                ),
            );
        }
        ValidatorResponse::ok()
    }
}

/// String must match a regular expression
pub struct StringPattern {
    pub pattern: Regex,
    pub message: String,
}

impl StringPattern {
    pub fn new(pattern: Regex, message: &str) -> Self {
        Self {
            pattern,
            message: message.to_string(),
        }
    }
}

impl Validator for StringPattern {
    fn description(&self) -> String {
        self.message.clone()
    }

    fn validate(&self, request: ValidatorRequest<'_>) -> ValidatorResponse {
        match request.value {
            Dynamic::String(s) if !self.pattern.is_match(s) => ValidatorResponse::error(
                request.path,
                "Invalid Attribute Value Match",
                format!("Attribute {} {}, got: {}", request.path, self.message, s),
            ),
            _ => ValidatorResponse::ok(),
        }
    }
}

/// String must be a member of a fixed set
pub struct OneOf {
    pub allowed: Vec<String>,
}

impl OneOf {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator for OneOf {
    fn description(&self) -> String {
        let quoted: Vec<String> = self.allowed.iter().map(|a| format!("{:?}", a)).collect();
        format!("value must be one of: [{}]", quoted.join(" "))
    }

    fn validate(&self, request: ValidatorRequest<'_>) -> ValidatorResponse {
        match request.value {
            Dynamic::String(s) if !self.allowed.iter().any(|a| a == s) => {
                ValidatorResponse::error(
                    request.path,
                    "Invalid Attribute Value Match",
                    format!("Attribute {} {}, got: {:?}", request.path, self.description(), s),
                )
            }
            _ => ValidatorResponse::ok(),
        }
    }
}

/// Whole-number bounds for Int64 attributes
pub struct IntRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl IntRange {
    pub fn between(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_least(min: i64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }
}

impl Validator for IntRange {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("value must be between {} and {}", min, max),
            (Some(min), None) => format!("value must be at least {}", min),
            (None, Some(max)) => format!("value must be at most {}", max),
            (None, None) => "any integer".to_string(),
        }
    }

    fn validate(&self, request: ValidatorRequest<'_>) -> ValidatorResponse {
        let Dynamic::Number(n) = request.value else {
            return ValidatorResponse::ok();
        };
        if n.fract() != 0.0 {
            return ValidatorResponse::error(
                request.path,
                "Invalid Attribute Value",
                format!("Attribute {} must be a whole number, got: {}", request.path, n),
            );
        }
        let below = self.min.is_some_and(|min| *n < min as f64);
        let above = self.max.is_some_and(|max| *n > max as f64);
        if below || above {
            return ValidatorResponse::error(
                request.path,
                "Invalid Attribute Value",
                format!("Attribute {} {}, got: {}", request.path, self.description(), n),
            );
        }
        ValidatorResponse::ok()
    }
}

pub struct ListLength {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl ListLength {
    pub fn at_least(min: usize) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }
}

impl Validator for ListLength {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("list must contain between {} and {} elements", min, max),
            (Some(min), None) => format!("list must contain at least {} elements", min),
            (None, Some(max)) => format!("list must contain at most {} elements", max),
            (None, None) => "any list length".to_string(),
        }
    }

    fn validate(&self, request: ValidatorRequest<'_>) -> ValidatorResponse {
        let Dynamic::List(items) = request.value else {
            return ValidatorResponse::ok();
        };
        let len = items.len();
        if self.min.is_some_and(|min| len < min) || self.max.is_some_and(|max| len > max) {
            return ValidatorResponse::error(
                request.path,
                "Invalid Attribute Value",
                format!("Attribute {} {}, got: {}", request.path, self.description(), len),
            );
        }
        ValidatorResponse::ok()
    }
}

/// No two list elements may be equal
pub struct UniqueValues;

impl Validator for UniqueValues {
    fn description(&self) -> String {
        "all list elements must be unique".to_string()
    }

    fn validate(&self, request: ValidatorRequest<'_>) -> ValidatorResponse {
        let Dynamic::List(items) = request.value else {
            return ValidatorResponse::ok();
        };
        let mut response = ValidatorResponse::ok();
        for (i, item) in items.iter().enumerate() {
            if let Some(first) = items[..i].iter().position(|earlier| earlier == item) {
                response.diagnostics.push(
                    Diagnostic::error(
                        "Duplicate List Value",
                        format!(
                            "This attribute contains duplicate values of: {:?} (first seen at index {})",
                            item, first
                        ),
                    )
                    .with_attribute(request.path.clone().index(i as i64)),
                );
            }
        }
        response
    }
}

/// Applies `inner` to every known element of a list
pub struct EachElement<V> {
    pub inner: V,
}

impl<V: Validator> EachElement<V> {
    pub fn new(inner: V) -> Self {
        Self { inner }
    }
}

impl<V: Validator> Validator for EachElement<V> {
    fn description(&self) -> String {
        format!("each element: {}", self.inner.description())
    }

    fn validate(&self, request: ValidatorRequest<'_>) -> ValidatorResponse {
        let Dynamic::List(items) = request.value else {
            return ValidatorResponse::ok();
        };
        let mut response = ValidatorResponse::ok();
        for (i, item) in items.iter().enumerate().filter(|(_, v)| v.is_known()) {
            let path = request.path.clone().index(i as i64);
            let inner = self.inner.validate(ValidatorRequest {
                value: item,
                path: &path,
                config: request.config,
            });
            response.diagnostics.extend(inner.diagnostics);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttributePath, DynamicValue};

    fn run(validator: &dyn Validator, value: Dynamic) -> ValidatorResponse {
        let config = DynamicValue::null();
        let path = AttributePath::new("field");
        validator.validate(ValidatorRequest {
            value: &value,
            path: &path,
            config: &config,
        })
    }

    #[test]
    fn string_length_counts_characters() {
        let validator = StringLength::between(2, 4);
        assert!(run(&validator, Dynamic::string("ab")).diagnostics.is_empty());
        assert!(run(&validator, Dynamic::string("äöü")).diagnostics.is_empty());
        assert_eq!(run(&validator, Dynamic::string("a")).diagnostics.len(), 1);
        assert_eq!(run(&validator, Dynamic::string("abcde")).diagnostics.len(), 1);
    }

    #[test]
    fn string_pattern_reports_attribute() {
        let validator = StringPattern::new(
            Regex::new(r"^[a-z]+$").unwrap(),
            "must be lowercase letters",
        );
        assert!(run(&validator, Dynamic::string("orders")).diagnostics.is_empty());

        let response = run(&validator, Dynamic::string("Orders!"));
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].attribute,
            Some(AttributePath::new("field"))
        );
    }

    #[test]
    fn one_of_rejects_unlisted_values() {
        let validator = OneOf::new(["development", "production"]);
        assert!(run(&validator, Dynamic::string("production")).diagnostics.is_empty());
        let response = run(&validator, Dynamic::string("staging"));
        assert!(response.diagnostics[0].detail.contains("\"staging\""));
    }

    #[test]
    fn int_range_rejects_fractions_and_bounds() {
        let validator = IntRange::between(8, 23);
        assert!(run(&validator, Dynamic::Number(8.0)).diagnostics.is_empty());
        assert!(run(&validator, Dynamic::Number(23.0)).diagnostics.is_empty());
        assert_eq!(run(&validator, Dynamic::Number(7.0)).diagnostics.len(), 1);
        assert_eq!(run(&validator, Dynamic::Number(24.0)).diagnostics.len(), 1);
        assert_eq!(run(&validator, Dynamic::Number(9.5)).diagnostics.len(), 1);
    }

    #[test]
    fn list_length_and_uniqueness() {
        let empty = Dynamic::List(vec![]);
        assert_eq!(run(&ListLength::at_least(1), empty).diagnostics.len(), 1);

        let dupes = Dynamic::List(vec![
            Dynamic::string("endpoint.created"),
            Dynamic::string("endpoint.deleted"),
            Dynamic::string("endpoint.created"),
        ]);
        let response = run(&UniqueValues, dupes);
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].attribute,
            Some(AttributePath::new("field").index(2))
        );
    }

    #[test]
    fn each_element_indexes_paths() {
        let validator = EachElement::new(OneOf::new(["a", "b"]));
        let response = run(
            &validator,
            Dynamic::List(vec![
                Dynamic::string("a"),
                Dynamic::Unknown,
                Dynamic::string("c"),
            ]),
        );
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].attribute,
            Some(AttributePath::new("field").index(2))
        );
    }

    #[test]
    fn validators_ignore_other_types() {
        assert!(run(&StringLength::at_most(1), Dynamic::Bool(true)).diagnostics.is_empty());
        assert!(run(&IntRange::at_least(1), Dynamic::string("x")).diagnostics.is_empty());
    }
}
