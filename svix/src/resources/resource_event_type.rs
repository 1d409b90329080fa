//! Event type resource
//!
//! Event types are addressed by name, which doubles as the resource id.

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
use tfplug::validator::StringLength;

use super::common::{self, call, sane_string, StateBuilder};
use crate::api::event_types::{EventTypeIn, EventTypeOut, EventTypeUpdate};
use crate::coerce::{self, ObjectReader};
use crate::error::ProviderError;
use crate::provider_data::SvixProviderData;

#[derive(Default)]
pub struct EventTypeResource {
    provider_data: Option<SvixProviderData>,
}

impl EventTypeResource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn identifier(name: &str) -> AttributeBuilder {
    AttributeBuilder::new(name, AttributeType::String)
        .validator(StringLength::at_most(256))
        .validator(sane_string())
}

pub fn schema() -> Schema {
    SchemaBuilder::new()
        .version(0)
        .description("An event type of one environment")
        .attribute(common::environment_id_attribute())
        .attribute(
            identifier("name")
                .description("Event type name, e.g. `user.signup`")
                .required()
                .plan_modifier(RequiresReplace)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("description", AttributeType::String)
                .required()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("archived", AttributeType::Bool)
                .optional()
                .default(StaticDefault::bool(false))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("deprecated", AttributeType::Bool)
                .optional()
                .default(StaticDefault::bool(false))
                .build(),
        )
        .attribute(identifier("feature_flag").optional().build())
        .attribute(identifier("group_name").optional().build())
        .attribute(
            AttributeBuilder::new("schemas", AttributeType::String)
                .description("JSON object of the event's schemas, keyed by version")
                .optional()
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

fn event_type_from_plan(plan: &ObjectReader<'_>) -> Result<EventTypeIn, ProviderError> {
    Ok(EventTypeIn {
        name: plan.required_string("name")?,
        description: plan.string("description")?.into_option().unwrap_or_default(),
        archived: plan.bool("archived")?.into_option(),
        deprecated: plan.bool("deprecated")?.into_option(),
        feature_flag: plan.string("feature_flag")?.into_option(),
        group_name: plan.string("group_name")?.into_option(),
        schemas: plan.json_object("schemas")?.into_option(),
    })
}

/// `configured_schemas` is the text last planned or stored, kept when the
/// server returns the same JSON.
fn event_type_to_state(
    environment_id: &str,
    event_type: &EventTypeOut,
    configured_schemas: Option<&str>,
) -> Result<DynamicValue, ProviderError> {
    let schemas = event_type
        .schemas
        .as_ref()
        .map(|schemas| coerce::json_state(configured_schemas, schemas))
        .transpose()?;

    Ok(StateBuilder::new()
        .set("environment_id", environment_id)
        .set("id", event_type.name.as_str())
        .set("name", event_type.name.as_str())
        .set("description", event_type.description.as_str())
        .set("archived", event_type.archived.unwrap_or(false))
        .set("deprecated", event_type.deprecated)
        .set("feature_flag", event_type.feature_flag.clone())
        .set("group_name", event_type.group_name.clone())
        .set("schemas", schemas)
        .set("created_at", coerce::timestamp(&event_type.created_at))
        .set("updated_at", coerce::timestamp(&event_type.updated_at))
        .build())
}

impl EventTypeResource {
    async fn create_event_type(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        plan: &DynamicValue,
    ) -> Result<DynamicValue, ProviderError> {
        let reader = ObjectReader::new(plan);
        let environment_id = reader.required_string("environment_id")?;
        let event_type_in = event_type_from_plan(&reader)?;
        let configured_schemas = reader.string("schemas")?.into_option();

        let client = data.environment_client(&environment_id);
        let event_type = call(ctx, client.event_types().create(&event_type_in)).await?;
        tracing::info!(
            "Created event type {} in environment {}",
            event_type.name,
            environment_id
        );
        event_type_to_state(&environment_id, &event_type, configured_schemas.as_deref())
    }

    async fn read_event_type(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, ProviderError> {
        let reader = ObjectReader::new(state);
        let environment_id = reader.required_string("environment_id")?;
        let name = reader.required_string("name")?;
        let stored_schemas = reader.string("schemas")?.into_option();

        let client = data.environment_client(&environment_id);
        match call(ctx, client.event_types().get(&name)).await {
            Ok(event_type) => {
                event_type_to_state(&environment_id, &event_type, stored_schemas.as_deref())
                    .map(Some)
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!("Event type {} no longer exists, removing from state", name);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_event_type(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        plan: &DynamicValue,
    ) -> Result<DynamicValue, ProviderError> {
        let reader = ObjectReader::new(plan);
        let environment_id = reader.required_string("environment_id")?;
        let event_type_in = event_type_from_plan(&reader)?;
        let name = event_type_in.name.clone();
        let configured_schemas = reader.string("schemas")?.into_option();

        let client = data.environment_client(&environment_id);
        let update = EventTypeUpdate::from(event_type_in);
        let event_type = call(ctx, client.event_types().update(&name, &update)).await?;
        event_type_to_state(&environment_id, &event_type, configured_schemas.as_deref())
    }

    async fn delete_event_type(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        state: &DynamicValue,
    ) -> Result<(), ProviderError> {
        let reader = ObjectReader::new(state);
        let environment_id = reader.required_string("environment_id")?;
        let name = reader.required_string("name")?;

        let client = data.environment_client(&environment_id);
        call(ctx, client.event_types().delete(&name, true)).await?;
        tracing::info!("Expunged event type {}", name);
        Ok(())
    }
}

#[async_trait]
impl Resource for EventTypeResource {
    fn type_name(&self) -> &str {
        "svix_event_type"
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
        if let Err(e) = ObjectReader::new(&request.config).json_object("schemas") {
            diagnostics.push(e.to_diagnostic("Invalid event type schemas"));
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

        match self.create_event_type(&ctx, data, &request.planned_state).await {
            Ok(new_state) => CreateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![e.to_diagnostic("Failed to create event type")],
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

        match self.read_event_type(&ctx, data, &request.current_state).await {
            Ok(new_state) => ReadResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![e.to_diagnostic("Failed to read event type")],
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

        match self.update_event_type(&ctx, data, &request.planned_state).await {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => UpdateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![e.to_diagnostic("Failed to update event type")],
            },
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let Some(data) = &self.provider_data else {
            return DeleteResourceResponse {
                diagnostics: vec![common::not_configured()],
            };
        };

        let diagnostics = match self.delete_event_type(&ctx, data, &request.prior_state).await {
            Ok(()) => vec![],
            Err(e) => vec![e.to_diagnostic("Failed to delete event type")],
        };
        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for EventTypeResource {
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
            ("name", Dynamic::string("user.created")),
            ("description", Dynamic::string("A user was created")),
        ];
        all.extend(entries);
        DynamicValue::new(Dynamic::object(all))
    }

    #[test]
    fn names_must_be_sane_strings() {
        let diagnostics = validate_config(
            &schema(),
            &config(vec![("name", Dynamic::string("user created"))]),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some(AttributePath::new("name")));
    }

    #[test]
    fn plan_maps_onto_request() {
        let plan = config(vec![
            ("archived", Dynamic::Bool(false)),
            ("group_name", Dynamic::string("user")),
            ("schemas", Dynamic::string(r#"{"1": {"type": "object"}}"#)),
        ]);
        let event_type = event_type_from_plan(&ObjectReader::new(&plan)).unwrap();
        assert_eq!(event_type.name, "user.created");
        assert_eq!(event_type.archived, Some(false));
        assert_eq!(event_type.deprecated, None);
        assert_eq!(event_type.group_name.as_deref(), Some("user"));
        assert!(event_type.schemas.unwrap().contains_key("1"));
    }

    #[test]
    fn schemas_must_be_a_json_object() {
        let plan = config(vec![("schemas", Dynamic::string("[1, 2]"))]);
        let err = event_type_from_plan(&ObjectReader::new(&plan)).unwrap_err();
        assert_eq!(err.path(), Some(&AttributePath::new("schemas")));
    }
}
