//! Provider block resolution
//!
//! Each setting comes from the provider block when it is non-empty, else
//! from its environment variable.

use tfplug::{AttributePath, Diagnostic, DynamicValue};
use url::Url;

use crate::coerce::ObjectReader;
use crate::error::ProviderError;

pub const TOKEN_ENV: &str = "SVIX_TOKEN";
pub const SERVER_URL_ENV: &str = "SVIX_SERVER_URL";

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub token: String,
    pub server_url: Url,
}

/// A block value of the wrong type is an error, not a fallback to the environment
fn configured(config: &DynamicValue, name: &str) -> Result<Option<String>, Diagnostic> {
    let value = ObjectReader::new(config)
        .string(name)
        .map_err(|e| e.to_diagnostic("Invalid Provider Configuration"))?;
    Ok(value.into_option().filter(|value| !value.is_empty()))
}

fn setting(
    config: &DynamicValue,
    name: &str,
    env_var: &str,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<Option<String>, Diagnostic> {
    Ok(configured(config, name)?.or_else(|| env(env_var).filter(|value| !value.is_empty())))
}

fn configuration_error(summary: &str, attribute: &str, message: String) -> Diagnostic {
    ProviderError::Configuration {
        path: Some(AttributePath::new(attribute)),
        message,
    }
    .to_diagnostic(summary)
}

/// Resolves the provider block against `env`. Every problem found is
/// reported, not just the first.
pub fn resolve(
    config: &DynamicValue,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ProviderConfig, Vec<Diagnostic>> {
    let mut diagnostics = Vec::new();

    let token = match setting(config, "token", TOKEN_ENV, &env) {
        Ok(Some(token)) => Some(token),
        Ok(None) => {
            diagnostics.push(configuration_error(
                "Missing API Token Configuration",
                "token",
                format!(
                    "While configuring the provider, the API token was not found in the {} environment variable or provider configuration block token attribute.",
                    TOKEN_ENV
                ),
            ));
            None
        }
        Err(diagnostic) => {
            diagnostics.push(diagnostic);
            None
        }
    };

    let server_url = match setting(config, "server_url", SERVER_URL_ENV, &env) {
        Err(diagnostic) => {
            diagnostics.push(diagnostic);
            None
        }
        Ok(None) => {
            diagnostics.push(configuration_error(
                "Missing Server URL Configuration",
                "server_url",
                format!(
                    "While configuring the provider, the Server URL was not found in the {} environment variable or provider configuration block server_url attribute.",
                    SERVER_URL_ENV
                ),
            ));
            None
        }
        Ok(Some(raw)) => match Url::parse(&raw) {
            Ok(url) => Some(url),
            Err(e) => {
                diagnostics.push(configuration_error(
                    "Invalid Server URL",
                    "server_url",
                    e.to_string(),
                ));
                None
            }
        },
    };

    match (token, server_url) {
        (Some(token), Some(server_url)) if diagnostics.is_empty() => {
            Ok(ProviderConfig { token, server_url })
        }
        _ => Err(diagnostics),
    }
}

/// `resolve` against the process environment
pub fn resolve_from_env(config: &DynamicValue) -> Result<ProviderConfig, Vec<Diagnostic>> {
    resolve(config, |name| std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use tfplug::Dynamic;

    fn block(entries: Vec<(&str, Dynamic)>) -> DynamicValue {
        DynamicValue::new(Dynamic::object(entries))
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn attributes_take_precedence_over_environment() {
        let config = block(vec![
            ("token", Dynamic::string("from_block")),
            ("server_url", Dynamic::string("https://api.eu.svix.com")),
        ]);
        let resolved = resolve(
            &config,
            env(&[(TOKEN_ENV, "from_env"), (SERVER_URL_ENV, "https://api.us.svix.com")]),
        )
        .unwrap();
        assert_eq!(resolved.token, "from_block");
        assert_eq!(resolved.server_url.host_str(), Some("api.eu.svix.com"));
    }

    #[test]
    fn empty_attributes_fall_back_to_environment() {
        let config = block(vec![
            ("token", Dynamic::string("")),
            ("server_url", Dynamic::Null),
        ]);
        let resolved = resolve(
            &config,
            env(&[(TOKEN_ENV, "from_env"), (SERVER_URL_ENV, "https://api.svix.com")]),
        )
        .unwrap();
        assert_eq!(resolved.token, "from_env");
    }

    #[test]
    fn missing_settings_are_all_reported() {
        let errors = resolve(&DynamicValue::null(), env(&[(TOKEN_ENV, "")])).unwrap_err();
        let summaries: Vec<&str> = errors.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(
            summaries,
            vec!["Missing API Token Configuration", "Missing Server URL Configuration"]
        );
        assert_eq!(errors[0].attribute, Some(AttributePath::new("token")));
    }

    #[test]
    fn unparsable_url_is_reported() {
        let config = block(vec![
            ("token", Dynamic::string("t")),
            ("server_url", Dynamic::string("not a url")),
        ]);
        let errors = resolve(&config, env(&[])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].summary, "Invalid Server URL");
        assert_eq!(errors[0].attribute, Some(AttributePath::new("server_url")));
    }

    #[test]
    fn mistyped_attribute_is_reported_instead_of_read_from_environment() {
        let config = block(vec![
            ("token", Dynamic::Bool(true)),
            ("server_url", Dynamic::string("https://api.svix.com")),
        ]);
        let errors = resolve(&config, env(&[(TOKEN_ENV, "from_env")])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].summary, "Invalid Provider Configuration");
        assert_eq!(errors[0].attribute, Some(AttributePath::new("token")));
        assert!(errors[0].detail.contains("expected a string value"));
    }

    #[test]
    #[serial]
    #[allow(clippy::disallowed_methods)]
    fn process_environment_is_consulted() {
        std::env::set_var(TOKEN_ENV, "testsk_env");
        std::env::set_var(SERVER_URL_ENV, "https://api.svix.com");

        let resolved = resolve_from_env(&DynamicValue::null()).unwrap();
        assert_eq!(resolved.token, "testsk_env");

        std::env::remove_var(TOKEN_ENV);
        std::env::remove_var(SERVER_URL_ENV);
    }
}
