//! API token resource
//!
//! The token value is only returned at creation, so read keeps whatever
//! state already holds. Destroying the resource expires the token.

use async_trait::async_trait;
use tfplug::context::Context;
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
use tfplug::types::{Diagnostic, DynamicValue};

use super::common::{self, call, StateBuilder};
use crate::api::management::{ApiTokenExpireIn, ApiTokenIn};
use crate::coerce::{self, ObjectReader};
use crate::error::ProviderError;
use crate::provider_data::SvixProviderData;

const UPDATE_NOT_SUPPORTED: &str = "Terraform tried to update the `svix_api_token` resource, this should not be possible. please contact the developers";

#[derive(Default)]
pub struct ApiTokenResource {
    provider_data: Option<SvixProviderData>,
}

impl ApiTokenResource {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn schema() -> Schema {
    SchemaBuilder::new()
        .version(0)
        .description("An API token scoped to one environment")
        .attribute(common::environment_id_attribute())
        .attribute(
            AttributeBuilder::new("name", AttributeType::String)
                .required()
                .plan_modifier(RequiresReplace)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("scopes", AttributeType::List(Box::new(AttributeType::String)))
                .optional()
                .plan_modifier(RequiresReplace)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("token", AttributeType::String)
                .description("The api token")
                .computed()
                .sensitive()
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
            AttributeBuilder::new("expires_at", AttributeType::String)
                .computed()
                .plan_modifier(UseStateForUnknown)
                .build(),
        )
        .build()
}

impl ApiTokenResource {
    async fn create_token(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        plan: &DynamicValue,
    ) -> Result<DynamicValue, ProviderError> {
        let plan = ObjectReader::new(plan);
        let environment_id = plan.required_string("environment_id")?;
        let token_in = ApiTokenIn {
            name: plan.required_string("name")?,
            scopes: plan.string_list("scopes")?.into_option(),
        };

        let client = data.environment_client(&environment_id);
        let token = call(ctx, client.authentication().create_api_token(&token_in)).await?;
        tracing::info!("Created api token {} in environment {}", token.id, environment_id);

        let scopes = token.scopes.as_deref().map(coerce::string_list);
        Ok(StateBuilder::new()
            .set("environment_id", environment_id)
            .set("name", token.name.unwrap_or(token_in.name))
            .set("scopes", scopes)
            .set("token", token.token)
            .set("id", token.id)
            .set("created_at", coerce::timestamp(&token.created_at))
            .set("expires_at", token.expires_at.as_ref().map(coerce::timestamp))
            .build())
    }

    async fn expire_token(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        state: &DynamicValue,
    ) -> Result<(), ProviderError> {
        let state = ObjectReader::new(state);
        let environment_id = state.required_string("environment_id")?;
        let key_id = state.required_string("id")?;

        let client = data.environment_client(&environment_id);
        call(
            ctx,
            client
                .authentication()
                .expire_api_token(&key_id, &ApiTokenExpireIn { expiry: Some(0) }),
        )
        .await?;
        tracing::info!("Expired api token {}", key_id);
        Ok(())
    }
}

#[async_trait]
impl Resource for ApiTokenResource {
    fn type_name(&self) -> &str {
        "svix_api_token"
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
        ValidateResourceConfigResponse {
            diagnostics: validate_config(&schema(), &request.config),
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let Some(data) = &self.provider_data else {
            return CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![common::not_configured()],
            };
        };

        match self.create_token(&ctx, data, &request.planned_state).await {
            Ok(new_state) => CreateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![e.to_diagnostic("Failed to create api token")],
            },
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        ReadResourceResponse {
            new_state: Some(request.current_state),
            diagnostics: vec![],
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        UpdateResourceResponse {
            new_state: request.prior_state,
            diagnostics: vec![Diagnostic::error(UPDATE_NOT_SUPPORTED, "")],
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let Some(data) = &self.provider_data else {
            return DeleteResourceResponse {
                diagnostics: vec![common::not_configured()],
            };
        };

        let diagnostics = match self.expire_token(&ctx, data, &request.prior_state).await {
            Ok(()) => vec![],
            Err(e) => vec![e.to_diagnostic("Failed to expire api token")],
        };
        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for ApiTokenResource {
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
