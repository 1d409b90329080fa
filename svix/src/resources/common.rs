//! Pieces every svix resource shares

use regex::Regex;
use std::future::Future;
use std::sync::LazyLock;
use tfplug::context::Context;
use tfplug::resource::ConfigureResourceRequest;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::validator::StringPattern;
use tfplug::plan_modifier::RequiresReplace;
use tfplug::{Diagnostic, Dynamic, DynamicValue};

use crate::api::ApiError;
use crate::provider_data::SvixProviderData;

pub const ENVIRONMENT_ID_DESCRIPTION: &str =
    "The Id to the environment that this resource will be created in";

static SANE_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\-_.]+$").expect("sane string regex compiles"));

/// Identifier-like strings: letters, digits, `-`, `_` and `.`
pub fn sane_string() -> StringPattern {
    StringPattern::new(
        SANE_STRING.clone(),
        "must match against `^[a-zA-Z0-9\\-_.]+$`",
    )
}

pub fn environment_id_attribute() -> Attribute {
    AttributeBuilder::new("environment_id", AttributeType::String)
        .description(ENVIRONMENT_ID_DESCRIPTION)
        .required()
        .plan_modifier(RequiresReplace)
        .build()
}

pub fn not_configured() -> Diagnostic {
    Diagnostic::error(
        "Provider not configured",
        "Provider data was not properly configured",
    )
}

/// Pulls `SvixProviderData` out of the configure request
pub fn provider_data_from(
    request: ConfigureResourceRequest,
) -> (Option<SvixProviderData>, Vec<Diagnostic>) {
    match request.provider_data {
        Some(data) => match data.downcast_ref::<SvixProviderData>() {
            Some(provider_data) => (Some(provider_data.clone()), vec![]),
            None => (
                None,
                vec![Diagnostic::error(
                    "Unexpected Resource Configure Type",
                    "Expected SvixProviderData. Please report this issue to the provider developers.",
                )],
            ),
        },
        None => (
            None,
            vec![Diagnostic::error(
                "No provider data",
                "No provider data was provided to the resource",
            )],
        ),
    }
}

/// Runs one remote call, abandoning it if `ctx` is cancelled first
pub async fn call<T>(
    ctx: &Context,
    request: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(ApiError::Cancelled),
        result = request => result,
    }
}

/// Accumulates the attributes of a new state object
#[derive(Default)]
pub struct StateBuilder {
    entries: Vec<(&'static str, Dynamic)>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: &'static str, value: impl Into<Dynamic>) -> Self {
        self.entries.push((name, value.into()));
        self
    }

    pub fn build(self) -> DynamicValue {
        DynamicValue::new(Dynamic::object(self.entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tfplug::schema::{Validator, ValidatorRequest};
    use tfplug::AttributePath;

    #[test]
    fn sane_string_pattern() {
        let validator = sane_string();
        let path = AttributePath::new("name");
        let config = DynamicValue::null();
        for (value, ok) in [("user.created-v2_b", true), ("has space", false), ("a/b", false)] {
            let response = validator.validate(ValidatorRequest {
                value: &Dynamic::string(value),
                path: &path,
                config: &config,
            });
            assert_eq!(response.diagnostics.is_empty(), ok, "{}", value);
        }
    }

    #[tokio::test]
    async fn cancelled_context_stops_call() {
        let ctx = Context::new();
        ctx.cancel();
        let result: Result<(), ApiError> = call(&ctx, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(ApiError::Cancelled)));
    }

    #[tokio::test]
    async fn call_passes_result_through() {
        let result = call(&Context::new(), async { Ok::<_, ApiError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn wrong_provider_data_type_is_reported() {
        let (data, diagnostics) = provider_data_from(ConfigureResourceRequest {
            provider_data: Some(Arc::new(42_u8)),
        });
        assert!(data.is_none());
        assert_eq!(diagnostics[0].summary, "Unexpected Resource Configure Type");
    }

    #[test]
    fn state_builder_collects_attributes() {
        let state = StateBuilder::new()
            .set("id", "env_1")
            .set("region", None::<String>)
            .build();
        assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "env_1");
        assert!(state.get(&AttributePath::new("region")).unwrap().is_null());
    }
}
