//! Environment resource
//!
//! Environments are managed with the organization token, never an
//! environment-scoped one.

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
use tfplug::types::DynamicValue;
use tfplug::validator::{OneOf, StringLength};

use super::common::{self, call, StateBuilder};
use crate::api::management::{EnvironmentIn, EnvironmentOut, EnvironmentType, EnvironmentUpdate};
use crate::coerce::{self, ObjectReader};
use crate::error::ProviderError;
use crate::provider_data::SvixProviderData;

#[derive(Default)]
pub struct EnvironmentResource {
    provider_data: Option<SvixProviderData>,
}

impl EnvironmentResource {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn schema() -> Schema {
    SchemaBuilder::new()
        .version(0)
        .description("A svix environment")
        .attribute(
            AttributeBuilder::new("name", AttributeType::String)
                .required()
                .validator(StringLength::between(1, 256))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("type", AttributeType::String)
                .description("Either `development` or `production`")
                .required()
                .validator(OneOf::new(EnvironmentType::ALL))
                .plan_modifier(RequiresReplace)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("id", AttributeType::String)
                .computed()
                .plan_modifier(UseStateForUnknown)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("region", AttributeType::String)
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

fn environment_to_state(environment: &EnvironmentOut) -> DynamicValue {
    StateBuilder::new()
        .set("id", environment.id.as_str())
        .set("name", environment.name.as_str())
        .set("type", environment.environment_type.as_str())
        .set("region", environment.region.as_str())
        .set("created_at", coerce::timestamp(&environment.created_at))
        .set("updated_at", coerce::timestamp(&environment.updated_at))
        .build()
}

fn environment_type(reader: &ObjectReader<'_>) -> Result<EnvironmentType, ProviderError> {
    let value = reader.required_string("type")?;
    value
        .parse()
        .map_err(|_| ProviderError::invalid_enum(reader.path("type"), &value, EnvironmentType::ALL))
}

impl EnvironmentResource {
    async fn create_environment(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        plan: &DynamicValue,
    ) -> Result<DynamicValue, ProviderError> {
        let plan = ObjectReader::new(plan);
        let environment_in = EnvironmentIn {
            name: plan.required_string("name")?,
            environment_type: environment_type(&plan)?,
        };

        let environment = call(ctx, data.client.environments().create(&environment_in)).await?;
        tracing::info!("Created environment {} ({})", environment.name, environment.id);
        Ok(environment_to_state(&environment))
    }

    async fn read_environment(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, ProviderError> {
        let id = ObjectReader::new(state).required_string("id")?;
        match call(ctx, data.client.environments().get(&id)).await {
            Ok(environment) => Ok(Some(environment_to_state(&environment))),
            Err(e) if e.is_not_found() => {
                tracing::warn!("Environment {} no longer exists, removing from state", id);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_environment(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        prior: &DynamicValue,
        plan: &DynamicValue,
    ) -> Result<DynamicValue, ProviderError> {
        let id = ObjectReader::new(prior).required_string("id")?;
        let update = EnvironmentUpdate {
            name: ObjectReader::new(plan).required_string("name")?,
        };

        let environment = call(ctx, data.client.environments().update(&id, &update)).await?;
        Ok(environment_to_state(&environment))
    }

    async fn delete_environment(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        state: &DynamicValue,
    ) -> Result<(), ProviderError> {
        let id = ObjectReader::new(state).required_string("id")?;
        call(ctx, data.client.environments().delete(&id)).await?;
        tracing::info!("Deleted environment {}", id);
        Ok(())
    }
}

#[async_trait]
impl Resource for EnvironmentResource {
    fn type_name(&self) -> &str {
        "svix_environment"
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

        match self.create_environment(&ctx, data, &request.planned_state).await {
            Ok(new_state) => CreateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![e.to_diagnostic("Failed to create environment")],
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

        match self.read_environment(&ctx, data, &request.current_state).await {
            Ok(new_state) => ReadResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![e.to_diagnostic("Failed to read environment")],
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
            .update_environment(&ctx, data, &request.prior_state, &request.planned_state)
            .await
        {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => UpdateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![e.to_diagnostic("Failed to update environment")],
            },
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let Some(data) = &self.provider_data else {
            return DeleteResourceResponse {
                diagnostics: vec![common::not_configured()],
            };
        };

        let diagnostics = match self.delete_environment(&ctx, data, &request.prior_state).await {
            Ok(()) => vec![],
            Err(e) => vec![e.to_diagnostic("Failed to delete environment")],
        };
        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for EnvironmentResource {
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
    use tfplug::{AttributePath, Dynamic};

    #[test]
    fn unknown_type_is_rejected_by_schema() {
        let config = DynamicValue::new(Dynamic::object(vec![
            ("name", Dynamic::string("staging")),
            ("type", Dynamic::string("qa")),
        ]));
        let diagnostics = validate_config(&schema(), &config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some(AttributePath::new("type")));
    }

    #[test]
    fn environment_type_parses_known_values() {
        let plan = DynamicValue::new(Dynamic::object(vec![("type", Dynamic::string("production"))]));
        let reader = ObjectReader::new(&plan);
        assert_eq!(environment_type(&reader).unwrap(), EnvironmentType::Production);
    }
}
