use thiserror::Error;
use tfplug::{AttributePath, Diagnostic};

use crate::api::ApiError;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{message}")]
    Configuration {
        path: Option<AttributePath>,
        message: String,
    },

    #[error("{message}")]
    Validation {
        path: AttributePath,
        message: String,
    },

    #[error("Attribute {path} value must be one of: {}, got: \"{value}\"", quoted(.allowed))]
    InvalidEnumValue {
        path: AttributePath,
        value: String,
        allowed: Vec<String>,
    },

    #[error("Unable to decode {path} as JSON: {source}")]
    Decode {
        path: AttributePath,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

fn quoted(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("\"{}\"", v))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ProviderError {
    pub fn validation(path: AttributePath, message: impl Into<String>) -> Self {
        ProviderError::Validation {
            path,
            message: message.into(),
        }
    }

    pub fn invalid_enum<'a>(
        path: AttributePath,
        value: &str,
        allowed: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        ProviderError::InvalidEnumValue {
            path,
            value: value.to_string(),
            allowed: allowed.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn path(&self) -> Option<&AttributePath> {
        match self {
            ProviderError::Configuration { path, .. } => path.as_ref(),
            ProviderError::Validation { path, .. }
            | ProviderError::InvalidEnumValue { path, .. }
            | ProviderError::Decode { path, .. } => Some(path),
            ProviderError::Api(_) => None,
        }
    }

    /// Renders as an error diagnostic under `summary`, attributed to the
    /// offending attribute when there is one.
    pub fn to_diagnostic(&self, summary: &str) -> Diagnostic {
        let diagnostic = Diagnostic::error(summary, self.to_string());
        match self.path() {
            Some(path) => diagnostic.with_attribute(path.clone()),
            None => diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_error_names_field_and_allowed_set() {
        let path = AttributePath::new("whitelabel_settings")
            .attribute("border_radius")
            .attribute("card");
        let err = ProviderError::invalid_enum(path.clone(), "xl", ["none", "lg"]);
        assert_eq!(
            err.to_string(),
            "Attribute whitelabel_settings.border_radius.card value must be one of: \"none\", \"lg\", got: \"xl\""
        );
        let diag = err.to_diagnostic("Invalid Attribute Value Match");
        assert_eq!(diag.attribute, Some(path));
        assert!(diag.is_error());
    }

    #[test]
    fn api_errors_have_no_attribute() {
        let err = ProviderError::from(ApiError::Cancelled);
        let diag = err.to_diagnostic("Failed to create environment");
        assert_eq!(diag.summary, "Failed to create environment");
        assert_eq!(diag.detail, "request cancelled");
        assert!(diag.attribute.is_none());
    }

    #[test]
    fn decode_error_keeps_parser_message() {
        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = ProviderError::Decode {
            path: AttributePath::new("schemas"),
            source,
        };
        assert!(err.to_string().starts_with("Unable to decode schemas as JSON: "));
    }
}
