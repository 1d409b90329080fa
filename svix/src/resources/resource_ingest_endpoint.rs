//! Ingest endpoint resource
//!
//! Endpoints hang off an ingest source and forward what it receives. The
//! signing secret is generated by the server and fetched after every
//! create, read and update.

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
use tfplug::validator::{IntRange, StringLength};

use super::common::{self, call, sane_string, StateBuilder};
use crate::api::ingest::{IngestEndpointIn, IngestEndpointOut};
use crate::api::{ApiError, Client};
use crate::coerce::{self, ObjectReader};
use crate::error::ProviderError;
use crate::provider_data::SvixProviderData;

const SECRET_SUMMARY: &str = "Failed to get ingest endpoint secret";

/// An error and the summary it is reported under
type Failure = (&'static str, ProviderError);

#[derive(Default)]
pub struct IngestEndpointResource {
    provider_data: Option<SvixProviderData>,
}

impl IngestEndpointResource {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn schema() -> Schema {
    SchemaBuilder::new()
        .version(0)
        .description("An endpoint receiving the webhooks of an ingest source")
        .attribute(common::environment_id_attribute())
        .attribute(
            AttributeBuilder::new("ingest_source_id", AttributeType::String)
                .required()
                .plan_modifier(RequiresReplace)
                .build(),
        )
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
            AttributeBuilder::new("metadata", AttributeType::String)
                .description("JSON object of string values")
                .optional()
                .default(StaticDefault::string("{}"))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("rate_limit", AttributeType::Number)
                .optional()
                .validator(IntRange::between(1, 65535))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("uid", AttributeType::String)
                .optional()
                .validator(StringLength::between(1, 256))
                .validator(sane_string())
                .build(),
        )
        .attribute(
            AttributeBuilder::new("secret", AttributeType::String)
                .description("The endpoint's signing secret")
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
            AttributeBuilder::new("updated_at", AttributeType::String)
                .computed()
                .build(),
        )
        .build()
}

fn endpoint_from_plan(plan: &ObjectReader<'_>) -> Result<IngestEndpointIn, ProviderError> {
    Ok(IngestEndpointIn {
        url: plan.required_string("url")?,
        description: plan.string("description")?.into_option(),
        disabled: plan.bool("disabled")?.into_option(),
        metadata: plan.json_string_map("metadata")?.into_option().unwrap_or_default(),
        rate_limit: plan.u16("rate_limit")?.into_option(),
        uid: plan.string("uid")?.into_option(),
    })
}

/// Where an endpoint lives, read from plan or state
struct Location {
    environment_id: String,
    source_id: String,
}

impl Location {
    fn read(reader: &ObjectReader<'_>) -> Result<Self, ProviderError> {
        Ok(Self {
            environment_id: reader.required_string("environment_id")?,
            source_id: reader.required_string("ingest_source_id")?,
        })
    }

    fn client(&self, data: &SvixProviderData) -> Client {
        data.environment_client(&self.environment_id)
    }
}

fn endpoint_to_state(
    location: &Location,
    endpoint: &IngestEndpointOut,
    secret: String,
    known: &ObjectReader<'_>,
) -> Result<DynamicValue, ProviderError> {
    let configured_metadata = known.string("metadata")?.into_option();
    let metadata = coerce::json_state(configured_metadata.as_deref(), &endpoint.metadata)?;

    Ok(StateBuilder::new()
        .set("environment_id", location.environment_id.as_str())
        .set("ingest_source_id", location.source_id.as_str())
        .set("id", endpoint.id.as_str())
        .set("url", endpoint.url.as_str())
        .set("description", endpoint.description.as_str())
        .set("disabled", endpoint.disabled.unwrap_or(false))
        .set("metadata", metadata)
        .set("rate_limit", coerce::rate_limit(endpoint.rate_limit))
        .set("uid", endpoint.uid.clone())
        .set("secret", secret)
        .set("created_at", coerce::timestamp(&endpoint.created_at))
        .set("updated_at", coerce::timestamp(&endpoint.updated_at))
        .build())
}

fn failed(summary: &'static str) -> impl Fn(ProviderError) -> Failure {
    move |e| (summary, e)
}

fn failed_call(summary: &'static str) -> impl Fn(ApiError) -> Failure {
    move |e| (summary, ProviderError::from(e))
}

impl IngestEndpointResource {
    async fn secret(
        ctx: &Context,
        client: &Client,
        location: &Location,
        id: &str,
    ) -> Result<String, Failure> {
        call(ctx, client.ingest_endpoints().get_secret(&location.source_id, id))
            .await
            .map(|secret| secret.key)
            .map_err(failed_call(SECRET_SUMMARY))
    }

    async fn create_endpoint(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        plan: &DynamicValue,
    ) -> Result<DynamicValue, Failure> {
        const SUMMARY: &str = "Failed to create ingest endpoint";
        let reader = ObjectReader::new(plan);
        let location = Location::read(&reader).map_err(failed(SUMMARY))?;
        let endpoint_in = endpoint_from_plan(&reader).map_err(failed(SUMMARY))?;

        let client = location.client(data);
        let endpoint = call(
            ctx,
            client.ingest_endpoints().create(&location.source_id, &endpoint_in),
        )
        .await
        .map_err(failed_call(SUMMARY))?;
        tracing::info!(
            "Created ingest endpoint {} on source {}",
            endpoint.id,
            location.source_id
        );

        let secret = Self::secret(ctx, &client, &location, &endpoint.id).await?;
        endpoint_to_state(&location, &endpoint, secret, &reader).map_err(failed(SUMMARY))
    }

    async fn read_endpoint(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Failure> {
        const SUMMARY: &str = "Failed to get ingest endpoint";
        let reader = ObjectReader::new(state);
        let location = Location::read(&reader).map_err(failed(SUMMARY))?;
        let id = reader.required_string("id").map_err(failed(SUMMARY))?;

        let client = location.client(data);
        let endpoint = match call(ctx, client.ingest_endpoints().get(&location.source_id, &id)).await
        {
            Ok(endpoint) => endpoint,
            Err(e) if e.is_not_found() => {
                tracing::warn!("Ingest endpoint {} no longer exists, removing from state", id);
                return Ok(None);
            }
            Err(e) => return Err(failed_call(SUMMARY)(e)),
        };

        let secret = Self::secret(ctx, &client, &location, &endpoint.id).await?;
        endpoint_to_state(&location, &endpoint, secret, &reader)
            .map(Some)
            .map_err(failed(SUMMARY))
    }

    async fn update_endpoint(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        prior: &DynamicValue,
        plan: &DynamicValue,
    ) -> Result<DynamicValue, Failure> {
        const SUMMARY: &str = "Failed to update ingest endpoint";
        let id = ObjectReader::new(prior)
            .required_string("id")
            .map_err(failed(SUMMARY))?;
        let reader = ObjectReader::new(plan);
        let location = Location::read(&reader).map_err(failed(SUMMARY))?;
        let update = endpoint_from_plan(&reader).map_err(failed(SUMMARY))?;

        let client = location.client(data);
        let endpoint = call(
            ctx,
            client.ingest_endpoints().update(&location.source_id, &id, &update),
        )
        .await
        .map_err(failed_call(SUMMARY))?;

        let secret = Self::secret(ctx, &client, &location, &endpoint.id).await?;
        endpoint_to_state(&location, &endpoint, secret, &reader).map_err(failed(SUMMARY))
    }

    async fn delete_endpoint(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        state: &DynamicValue,
    ) -> Result<(), ProviderError> {
        let reader = ObjectReader::new(state);
        let location = Location::read(&reader)?;
        let id = reader.required_string("id")?;

        let client = location.client(data);
        call(ctx, client.ingest_endpoints().delete(&location.source_id, &id)).await?;
        tracing::info!("Deleted ingest endpoint {}", id);
        Ok(())
    }
}

#[async_trait]
impl Resource for IngestEndpointResource {
    fn type_name(&self) -> &str {
        "svix_ingest_endpoint"
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
            Err((summary, e)) => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![e.to_diagnostic(summary)],
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
            Err((summary, e)) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![e.to_diagnostic(summary)],
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
            Err((summary, e)) => UpdateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![e.to_diagnostic(summary)],
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
            Err(e) => vec![e.to_diagnostic("Failed to delete ingest endpoint")],
        };
        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for IngestEndpointResource {
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

    fn config(entries: Vec<(&str, Dynamic)>) -> DynamicValue {
        let mut all = vec![
            ("environment_id", Dynamic::string("env_1")),
            ("ingest_source_id", Dynamic::string("src_1")),
            ("url", Dynamic::string("https://example.com/ingest")),
        ];
        all.extend(entries);
        DynamicValue::new(Dynamic::object(all))
    }

    #[test]
    fn rate_limit_bounds() {
        for (rate, errors) in [(0.0, 1), (1.0, 0), (65535.0, 0), (65536.0, 1)] {
            let diagnostics =
                validate_config(&schema(), &config(vec![("rate_limit", Dynamic::Number(rate))]));
            assert_eq!(diagnostics.len(), errors, "rate_limit = {}", rate);
        }
    }

    #[test]
    fn uid_must_be_a_sane_string() {
        let diagnostics =
            validate_config(&schema(), &config(vec![("uid", Dynamic::string("a b"))]));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some(AttributePath::new("uid")));
    }

    #[test]
    fn secret_cannot_be_configured() {
        let diagnostics =
            validate_config(&schema(), &config(vec![("secret", Dynamic::string("whsec"))]));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn metadata_is_decoded_from_json() {
        let plan = config(vec![("metadata", Dynamic::string(r#"{"team":"payments"}"#))]);
        let endpoint = endpoint_from_plan(&ObjectReader::new(&plan)).unwrap();
        assert_eq!(endpoint.metadata.get("team").map(String::as_str), Some("payments"));
    }
}
