//! Operational webhook endpoint resource
//!
//! Receives platform events (endpoint disabled, attempts exhausted, ...)
//! for one environment. The signing secret can only be chosen at creation
//! and is never returned, so state keeps the configured value.

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::plan::validate_config;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::DynamicValue;
use tfplug::validator::{EachElement, IntRange, ListLength, OneOf, UniqueValues};

use super::common::{self, call, StateBuilder};
use crate::api::operational_webhooks::{
    OperationalWebhookEndpointIn, OperationalWebhookEndpointOut, OperationalWebhookEndpointUpdate,
    OPERATIONAL_EVENT_TYPES,
};
use crate::coerce::{self, ObjectReader};
use crate::error::ProviderError;
use crate::provider_data::SvixProviderData;

#[derive(Default)]
pub struct OperationalWebhooksEndpointResource {
    provider_data: Option<SvixProviderData>,
}

impl OperationalWebhooksEndpointResource {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn schema() -> Schema {
    SchemaBuilder::new()
        .version(0)
        .description("An endpoint receiving operational webhooks")
        .attribute(common::environment_id_attribute())
        .attribute(
            AttributeBuilder::new("url", AttributeType::String)
                .required()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("description", AttributeType::String)
                .optional()
                .default(StaticDefault::string(""))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("disabled", AttributeType::Bool)
                .optional()
                .default(StaticDefault::bool(false))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("filter_types", AttributeType::List(Box::new(AttributeType::String)))
                .description("Operational events to deliver to this endpoint")
                .required()
                .validator(ListLength::at_least(1))
                .validator(UniqueValues)
                .validator(EachElement::new(OneOf::new(OPERATIONAL_EVENT_TYPES)))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("metadata", AttributeType::String)
                .description("JSON object of string values")
                .optional()
                .default(StaticDefault::string("{}"))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("rate_limit", AttributeType::Number)
                .optional()
                .validator(IntRange::between(1, i64::from(u16::MAX)))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("secret", AttributeType::String)
                .description("Signing secret, settable only at creation")
                .optional()
                .sensitive()
                .plan_modifier(RequiresReplace)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("uid", AttributeType::String)
                .optional()
                .computed()
                .plan_modifier(UseStateForUnknown)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("id", AttributeType::String)
                .computed()
                .plan_modifier(UseStateForUnknown)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("created_at", AttributeType::String)
                .computed()
                .plan_modifier(UseStateForUnknown)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("updated_at", AttributeType::String)
                .computed()
                .build(),
        )
        .build()
}

fn endpoint_from_plan(plan: &ObjectReader<'_>) -> Result<OperationalWebhookEndpointIn, ProviderError> {
    Ok(OperationalWebhookEndpointIn {
        url: plan.required_string("url")?,
        description: plan.string("description")?.into_option(),
        disabled: plan.bool("disabled")?.into_option(),
        filter_types: plan.string_list("filter_types")?.into_option().unwrap_or_default(),
        metadata: plan.json_string_map("metadata")?.into_option().unwrap_or_default(),
        rate_limit: plan.u16("rate_limit")?.into_option(),
        secret: plan.string("secret")?.into_option(),
        uid: plan.string("uid")?.into_option(),
    })
}

/// Fields the server does not echo come from `known`, the plan or prior state
fn endpoint_to_state(
    environment_id: &str,
    endpoint: &OperationalWebhookEndpointOut,
    known: &ObjectReader<'_>,
) -> Result<DynamicValue, ProviderError> {
    let configured_metadata = known.string("metadata")?.into_option();
    let metadata = coerce::json_state(configured_metadata.as_deref(), &endpoint.metadata)?;

    Ok(StateBuilder::new()
        .set("environment_id", environment_id)
        .set("id", endpoint.id.as_str())
        .set("url", endpoint.url.as_str())
        .set("description", endpoint.description.as_str())
        .set("disabled", endpoint.disabled.unwrap_or(false))
        .set("filter_types", endpoint.filter_types.as_deref().map(coerce::string_list))
        .set("metadata", metadata)
        .set("rate_limit", coerce::rate_limit(endpoint.rate_limit))
        .set("secret", known.string("secret")?.into_option())
        .set("uid", endpoint.uid.clone())
        .set("created_at", coerce::timestamp(&endpoint.created_at))
        .set("updated_at", coerce::timestamp(&endpoint.updated_at))
        .build())
}

impl OperationalWebhooksEndpointResource {
    async fn create_endpoint(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        plan: &DynamicValue,
    ) -> Result<DynamicValue, ProviderError> {
        let reader = ObjectReader::new(plan);
        let environment_id = reader.required_string("environment_id")?;
        let endpoint_in = endpoint_from_plan(&reader)?;

        let client = data.environment_client(&environment_id);
        let endpoint = call(ctx, client.operational_webhook_endpoints().create(&endpoint_in)).await?;
        tracing::info!(
            "Created operational webhook endpoint {} in environment {}",
            endpoint.id,
            environment_id
        );
        endpoint_to_state(&environment_id, &endpoint, &reader)
    }

    async fn read_endpoint(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, ProviderError> {
        let reader = ObjectReader::new(state);
        let environment_id = reader.required_string("environment_id")?;
        let id = reader.required_string("id")?;

        let client = data.environment_client(&environment_id);
        match call(ctx, client.operational_webhook_endpoints().get(&id)).await {
            Ok(endpoint) => endpoint_to_state(&environment_id, &endpoint, &reader).map(Some),
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    "Operational webhook endpoint {} no longer exists, removing from state",
                    id
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_endpoint(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        prior: &DynamicValue,
        plan: &DynamicValue,
    ) -> Result<DynamicValue, ProviderError> {
        let id = ObjectReader::new(prior).required_string("id")?;
        let reader = ObjectReader::new(plan);
        let environment_id = reader.required_string("environment_id")?;
        let update = OperationalWebhookEndpointUpdate::from(endpoint_from_plan(&reader)?);

        let client = data.environment_client(&environment_id);
        let endpoint = call(ctx, client.operational_webhook_endpoints().update(&id, &update)).await?;
        endpoint_to_state(&environment_id, &endpoint, &reader)
    }

    async fn delete_endpoint(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        state: &DynamicValue,
    ) -> Result<(), ProviderError> {
        let reader = ObjectReader::new(state);
        let environment_id = reader.required_string("environment_id")?;
        let id = reader.required_string("id")?;

        let client = data.environment_client(&environment_id);
        call(ctx, client.operational_webhook_endpoints().delete(&id)).await?;
        tracing::info!("Deleted operational webhook endpoint {}", id);
        Ok(())
    }
}

#[async_trait]
impl Resource for OperationalWebhooksEndpointResource {
    fn type_name(&self) -> &str {
        "svix_operational_webhooks_endpoint"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ResourceSchemaRequest) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = validate_config(&schema(), &request.config);
        if let Err(e) = ObjectReader::new(&request.config).json_string_map("metadata") {
            diagnostics.push(e.to_diagnostic("Invalid endpoint metadata"));
        }
        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let Some(data) = &self.provider_data else {
            return CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![common::not_configured()],
            };
        };

        match self.create_endpoint(&ctx, data, &request.planned_state).await {
            Ok(new_state) => CreateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![e.to_diagnostic("Failed to create operational webhooks endpoint")],
            },
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let Some(data) = &self.provider_data else {
            return ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![common::not_configured()],
            };
        };

        match self.read_endpoint(&ctx, data, &request.current_state).await {
            Ok(new_state) => ReadResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![e.to_diagnostic("Failed to read operational webhooks endpoint")],
            },
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let Some(data) = &self.provider_data else {
            return UpdateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![common::not_configured()],
            };
        };

        match self
            .update_endpoint(&ctx, data, &request.prior_state, &request.planned_state)
            .await
        {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => UpdateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![e.to_diagnostic("Failed to update operational webhooks endpoint")],
            },
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let Some(data) = &self.provider_data else {
            return DeleteResourceResponse {
                diagnostics: vec![common::not_configured()],
            };
        };

        let diagnostics = match self.delete_endpoint(&ctx, data, &request.prior_state).await {
            Ok(()) => vec![],
            Err(e) => vec![e.to_diagnostic("Failed to delete operational webhooks endpoint")],
        };
        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for OperationalWebhooksEndpointResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let (provider_data, diagnostics) = common::provider_data_from(request);
        self.provider_data = provider_data;
        ConfigureResourceResponse { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfplug::plan::plan_resource_change;
    use tfplug::{AttributePath, Dynamic};

    fn config(filter_types: Vec<&str>) -> DynamicValue {
        DynamicValue::new(Dynamic::object(vec![
            ("environment_id", Dynamic::string("env_1")),
            ("url", Dynamic::string("https://hooks.example.com/svix")),
            (
                "filter_types",
                Dynamic::List(filter_types.into_iter().map(Dynamic::string).collect()),
            ),
        ]))
    }

    #[test]
    fn filter_types_must_be_operational_events() {
        let diagnostics = validate_config(&schema(), &config(vec!["endpoint.created", "invoice.paid"]));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute.as_ref().map(ToString::to_string).as_deref(),
            Some("filter_types[1]")
        );
    }

    #[test]
    fn filter_types_must_be_unique_and_non_empty() {
        assert!(!validate_config(&schema(), &config(vec![])).is_empty());
        let duplicated = validate_config(
            &schema(),
            &config(vec!["endpoint.created", "endpoint.created"]),
        );
        assert_eq!(duplicated.len(), 1);
        assert_eq!(
            duplicated[0].attribute,
            Some(AttributePath::new("filter_types").index(1))
        );
    }

    #[test]
    fn unconfigured_metadata_is_an_empty_map() {
        let plan = config(vec!["endpoint.created"]);
        let endpoint = endpoint_from_plan(&ObjectReader::new(&plan)).unwrap();
        assert!(endpoint.metadata.is_empty());
        assert_eq!(endpoint.secret, None);
        assert_eq!(endpoint.filter_types, vec!["endpoint.created"]);
    }

    fn with_secret(secret: &str) -> DynamicValue {
        let mut value = config(vec!["endpoint.created"]);
        if let Dynamic::Map(object) = &mut value.value {
            object.insert("secret".to_string(), Dynamic::string(secret));
        }
        value
    }

    #[test]
    fn changing_the_secret_replaces_the_endpoint() {
        let prior = with_secret("whsec_old");
        let change = plan_resource_change(&schema(), &prior, &with_secret("whsec_new"));
        assert_eq!(change.requires_replace, vec![AttributePath::new("secret")]);

        let unchanged = plan_resource_change(&schema(), &prior, &with_secret("whsec_old"));
        assert!(unchanged.requires_replace.is_empty());
    }
}
