//! Ingest source resource
//!
//! A source receives webhooks from a third party (GitHub, Stripe, ...) at
//! its `ingest_url`. The server leaves secrets out of the config it returns,
//! so stored config is the configured object with the server's keys laid
//! over it.

use async_trait::async_trait;
use serde_json::{Map, Value};
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
use crate::api::ingest::{IngestSourceIn, IngestSourceOut, GENERIC_WEBHOOK, INGEST_SOURCE_TYPES};
use crate::coerce::{self, ObjectReader};
use crate::error::ProviderError;
use crate::provider_data::SvixProviderData;

#[derive(Default)]
pub struct IngestSourceResource {
    provider_data: Option<SvixProviderData>,
}

impl IngestSourceResource {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn schema() -> Schema {
    SchemaBuilder::new()
        .version(0)
        .description("A source of third-party webhooks")
        .attribute(common::environment_id_attribute())
        .attribute(
            AttributeBuilder::new("type", AttributeType::String)
                .description("The kind of sender, e.g. `github` or `generic-webhook`")
                .required()
                .validator(OneOf::new(INGEST_SOURCE_TYPES))
                .plan_modifier(RequiresReplace)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("name", AttributeType::String)
                .required()
                .validator(StringLength::between(2, 256))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("uid", AttributeType::String)
                .optional()
                .computed()
                .validator(StringLength::between(1, 60))
                .plan_modifier(UseStateForUnknown)
                .plan_modifier(RequiresReplace)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("config", AttributeType::String)
                .description("JSON object configuring the source. May hold secrets such as the sender's signing secret. Ignored for `generic-webhook`.")
                .optional()
                .sensitive()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("id", AttributeType::String)
                .computed()
                .plan_modifier(UseStateForUnknown)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("ingest_url", AttributeType::String)
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

/// `configured` with every key of `remote` written over it
fn overlay_config(mut configured: Map<String, Value>, remote: Option<&Map<String, Value>>) -> Map<String, Value> {
    if let Some(remote) = remote {
        for (key, value) in remote {
            configured.insert(key.clone(), value.clone());
        }
    }
    configured
}

fn source_from_plan(plan: &ObjectReader<'_>) -> Result<IngestSourceIn, ProviderError> {
    let source_type = plan.required_string("type")?;
    let config = plan.json_object("config")?.into_option();
    let config = if source_type == GENERIC_WEBHOOK {
        if config.is_some() {
            tracing::debug!("ignoring config of a {} source", GENERIC_WEBHOOK);
        }
        None
    } else {
        config
    };

    Ok(IngestSourceIn {
        name: plan.required_string("name")?,
        uid: plan.string("uid")?.into_option(),
        config,
        source_type,
    })
}

/// `known` is the plan or prior state; config is only stored when it holds one
fn source_to_state(
    environment_id: &str,
    source: &IngestSourceOut,
    known: &ObjectReader<'_>,
) -> Result<DynamicValue, ProviderError> {
    let configured_text = known.string("config")?.into_option();
    let config = match known.json_object("config")?.into_option() {
        Some(configured) => {
            let merged = overlay_config(configured, source.config.as_ref());
            Some(coerce::json_state(configured_text.as_deref(), &merged)?)
        }
        None => None,
    };

    Ok(StateBuilder::new()
        .set("environment_id", environment_id)
        .set("id", source.id.as_str())
        .set("type", source.source_type.as_str())
        .set("name", source.name.as_str())
        .set("uid", source.uid.clone())
        .set("config", config)
        .set("ingest_url", source.ingest_url.clone())
        .set("created_at", coerce::timestamp(&source.created_at))
        .set("updated_at", coerce::timestamp(&source.updated_at))
        .build())
}

impl IngestSourceResource {
    async fn create_source(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        plan: &DynamicValue,
    ) -> Result<DynamicValue, ProviderError> {
        let reader = ObjectReader::new(plan);
        let environment_id = reader.required_string("environment_id")?;
        let source_in = source_from_plan(&reader)?;

        let client = data.environment_client(&environment_id);
        let source = call(ctx, client.ingest_sources().create(&source_in)).await?;
        tracing::info!(
            "Created {} ingest source {} in environment {}",
            source.source_type,
            source.id,
            environment_id
        );
        source_to_state(&environment_id, &source, &reader)
    }

    async fn read_source(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, ProviderError> {
        let reader = ObjectReader::new(state);
        let environment_id = reader.required_string("environment_id")?;
        let id = reader.required_string("id")?;

        let client = data.environment_client(&environment_id);
        match call(ctx, client.ingest_sources().get(&id)).await {
            Ok(source) => source_to_state(&environment_id, &source, &reader).map(Some),
            Err(e) if e.is_not_found() => {
                tracing::warn!("Ingest source {} no longer exists, removing from state", id);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_source(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        prior: &DynamicValue,
        plan: &DynamicValue,
    ) -> Result<DynamicValue, ProviderError> {
        let id = ObjectReader::new(prior).required_string("id")?;
        let reader = ObjectReader::new(plan);
        let environment_id = reader.required_string("environment_id")?;
        let source_in = source_from_plan(&reader)?;

        let client = data.environment_client(&environment_id);
        let source = call(ctx, client.ingest_sources().update(&id, &source_in)).await?;
        source_to_state(&environment_id, &source, &reader)
    }

    async fn delete_source(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        state: &DynamicValue,
    ) -> Result<(), ProviderError> {
        let reader = ObjectReader::new(state);
        let environment_id = reader.required_string("environment_id")?;
        let id = reader.required_string("id")?;

        let client = data.environment_client(&environment_id);
        call(ctx, client.ingest_sources().delete(&id)).await?;
        tracing::info!("Deleted ingest source {}", id);
        Ok(())
    }
}

#[async_trait]
impl Resource for IngestSourceResource {
    fn type_name(&self) -> &str {
        "svix_ingest_source"
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
        if let Err(e) = ObjectReader::new(&request.config).json_object("config") {
            diagnostics.push(e.to_diagnostic("Unable to parse ingest source config"));
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

        match self.create_source(&ctx, data, &request.planned_state).await {
            Ok(new_state) => CreateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![e.to_diagnostic("Failed to create ingest source")],
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

        match self.read_source(&ctx, data, &request.current_state).await {
            Ok(new_state) => ReadResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![e.to_diagnostic("Failed to get ingest source")],
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
            .update_source(&ctx, data, &request.prior_state, &request.planned_state)
            .await
        {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => UpdateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![e.to_diagnostic("Failed to update ingest source")],
            },
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let Some(data) = &self.provider_data else {
            return DeleteResourceResponse {
                diagnostics: vec![common::not_configured()],
            };
        };

        let diagnostics = match self.delete_source(&ctx, data, &request.prior_state).await {
            Ok(()) => vec![],
            Err(e) => vec![e.to_diagnostic("Failed to delete ingest source")],
        };
        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for IngestSourceResource {
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
