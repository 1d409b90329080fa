//! OpenAPI event type import
//!
//! Each apply posts the document to the importer, which creates or
//! overwrites one event type per webhook it finds. The names it reports
//! are what destroy deletes.

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::plan::validate_config;
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
use crate::api::event_types::EventTypeImportOpenApiIn;
use crate::coerce::{self, ObjectReader};
use crate::error::ProviderError;
use crate::provider_data::SvixProviderData;

#[derive(Default)]
pub struct EventTypeOpenApiImportResource {
    provider_data: Option<SvixProviderData>,
}

impl EventTypeOpenApiImportResource {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn schema() -> Schema {
    SchemaBuilder::new()
        .version(0)
        .description("Create or update event types from the webhooks of an OpenAPI document. Updating an archived event type unarchives it.")
        .attribute(common::environment_id_attribute())
        .attribute(
            AttributeBuilder::new("spec_raw", AttributeType::String)
                .description("The OpenAPI document as YAML or JSON. Event types it defines overwrite existing ones.")
                .required()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("replace_all", AttributeType::Bool)
                .description("Archive every existing event type missing from the document")
                .optional()
                .default(StaticDefault::bool(false))
                .build(),
        )
        .attribute(
            AttributeBuilder::new(
                "created_event_types",
                AttributeType::List(Box::new(AttributeType::String)),
            )
            .description("Names of the event types the import created or modified")
            .computed()
            .build(),
        )
        .build()
}

impl EventTypeOpenApiImportResource {
    async fn import(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        plan: &DynamicValue,
    ) -> Result<DynamicValue, ProviderError> {
        let plan = ObjectReader::new(plan);
        let environment_id = plan.required_string("environment_id")?;
        let import = EventTypeImportOpenApiIn {
            spec_raw: plan.required_string("spec_raw")?,
            replace_all: plan.bool("replace_all")?.into_option().unwrap_or(false),
        };

        let client = data.environment_client(&environment_id);
        let imported = call(ctx, client.event_types().import_openapi(&import)).await?;
        tracing::info!(
            "Imported {} event types into environment {}",
            imported.data.modified.len(),
            environment_id
        );

        Ok(StateBuilder::new()
            .set("environment_id", environment_id)
            .set("spec_raw", import.spec_raw)
            .set("replace_all", import.replace_all)
            .set(
                "created_event_types",
                coerce::string_list(&imported.data.modified),
            )
            .build())
    }

    /// Stops at the first event type that fails to delete
    async fn delete_imported(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        state: &DynamicValue,
    ) -> Result<(), Diagnostic> {
        let state = ObjectReader::new(state);
        let read = |e: ProviderError| e.to_diagnostic("Failed to delete imported event types");
        let environment_id = state.required_string("environment_id").map_err(read)?;
        let names = state
            .string_list("created_event_types")
            .map_err(read)?
            .into_option()
            .unwrap_or_default();

        let client = data.environment_client(&environment_id);
        for name in names {
            call(ctx, client.event_types().delete(&name, false))
                .await
                .map_err(|e| {
                    ProviderError::from(e)
                        .to_diagnostic(&format!("Failed to delete event type {}", name))
                })?;
            tracing::info!("Deleted imported event type {}", name);
        }
        Ok(())
    }
}

#[async_trait]
impl Resource for EventTypeOpenApiImportResource {
    fn type_name(&self) -> &str {
        "svix_event_type_openapi_import"
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

        match self.import(&ctx, data, &request.planned_state).await {
            Ok(new_state) => CreateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![e.to_diagnostic("Failed to import event types")],
            },
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        ReadResourceResponse {
            new_state: Some(request.current_state),
            diagnostics: vec![],
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let Some(data) = &self.provider_data else {
            return UpdateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![common::not_configured()],
            };
        };

        match self.import(&ctx, data, &request.planned_state).await {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => UpdateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![e.to_diagnostic("Failed to update event types")],
            },
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let Some(data) = &self.provider_data else {
            return DeleteResourceResponse {
                diagnostics: vec![common::not_configured()],
            };
        };

        let diagnostics = match self.delete_imported(&ctx, data, &request.prior_state).await {
            Ok(()) => vec![],
            Err(diagnostic) => vec![diagnostic],
        };
        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for EventTypeOpenApiImportResource {
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
