//! Environment settings resource
//!
//! There is nothing to create or destroy remotely: create and update both
//! merge the plan onto the current settings and write them back, delete
//! only forgets the state.

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::plan::validate_config;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::{IntRange, OneOf};

use super::common::{self, call};
use crate::api::management::BorderRadius;
use crate::coerce::ObjectReader;
use crate::error::ProviderError;
use crate::provider_data::SvixProviderData;
use crate::settings::{
    self, check_font_rule, SettingsPlan, FLAG_ATTRIBUTES, FONT_FAMILIES, PALETTE_ATTRIBUTES,
    WHITELABEL,
};

#[derive(Default)]
pub struct EnvironmentSettingsResource {
    provider_data: Option<SvixProviderData>,
}

impl EnvironmentSettingsResource {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Optional, and keeps the remote value when left out of config
fn setting(name: &str, type_: AttributeType) -> AttributeBuilder {
    AttributeBuilder::new(name, type_)
        .optional()
        .computed()
        .plan_modifier(UseStateForUnknown)
}

/// Optional only: leaving it out of config plans a null, which clears it
fn whitelabel_setting(name: &str, type_: AttributeType) -> AttributeBuilder {
    AttributeBuilder::new(name, type_).optional()
}

fn nested_setting(name: &str, attributes: Vec<Attribute>) -> AttributeBuilder {
    AttributeBuilder::single_nested(name, attributes).optional()
}

fn palette(name: &str) -> Attribute {
    let leaves = PALETTE_ATTRIBUTES
        .iter()
        .map(|leaf| whitelabel_setting(leaf, AttributeType::String).build())
        .collect();
    nested_setting(name, leaves).build()
}

fn border_radius() -> Attribute {
    let corners = ["button", "card", "input"]
        .into_iter()
        .map(|corner| {
            whitelabel_setting(corner, AttributeType::String)
                .description("Use `none` for square corners, `sm`, `md` or `lg` for rounded, `full` for pill-shaped")
                .validator(OneOf::new(BorderRadius::ALL))
                .build()
        })
        .collect();
    nested_setting("border_radius", corners).build()
}

fn whitelabel() -> Attribute {
    let attributes = vec![
        setting("display_name", AttributeType::String)
            .description("The name of your company or service, shown in the App Portal and Event Catalog")
            .build(),
        whitelabel_setting("base_font_size", AttributeType::Number)
            .description("Base font size in pixels")
            .validator(IntRange::between(8, 23))
            .build(),
        whitelabel_setting("font_family", AttributeType::String)
            .description("One of the bundled font names, or `Custom` together with `font_family_url`")
            .validator(OneOf::new(FONT_FAMILIES))
            .build(),
        whitelabel_setting("font_family_url", AttributeType::String)
            .description("URL of a woff2 font file. Requires `font_family = \"Custom\"`")
            .build(),
        whitelabel_setting("logo_url", AttributeType::String).build(),
        palette("color_palette_dark"),
        palette("color_palette_light"),
        border_radius(),
        nested_setting(
            "font_size",
            vec![whitelabel_setting("base", AttributeType::Number)
                .validator(IntRange::between(8, 23))
                .build()],
        )
        .build(),
        nested_setting(
            "channels_strings_override",
            ["channels_help", "channels_many", "channels_one"]
                .into_iter()
                .map(|name| whitelabel_setting(name, AttributeType::String).build())
                .collect(),
        )
        .description("Rename 'channels' in the App Portal")
        .build(),
    ];

    nested_setting(WHITELABEL, attributes)
        .description("Customize how the Consumer App Portal looks in this environment")
        .build()
}

pub fn schema() -> Schema {
    let mut builder = SchemaBuilder::new()
        .version(0)
        .description("Settings of one environment")
        .attribute(common::environment_id_attribute())
        .attribute(whitelabel());
    for flag in FLAG_ATTRIBUTES {
        builder = builder.attribute(setting(flag, AttributeType::Bool).build());
    }
    builder.build()
}

impl EnvironmentSettingsResource {
    /// Fetch, merge the plan, write back
    async fn apply_settings(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        plan: &DynamicValue,
    ) -> Result<DynamicValue, (&'static str, ProviderError)> {
        let environment_id = ObjectReader::new(plan)
            .required_string("environment_id")
            .map_err(|e| ("Failed to update environment settings", e))?;
        let requested =
            SettingsPlan::from_value(plan).map_err(|e| ("Failed to update environment settings", e))?;

        let client = data.environment_client(&environment_id);
        let current = call(ctx, client.environment_settings().get())
            .await
            .map_err(|e| ("Failed to get environment settings", ProviderError::from(e)))?;

        let patch = settings::reconcile(&current, &requested)
            .map_err(|e| ("Failed to update environment settings", e))?;

        let updated = call(ctx, client.environment_settings().update(&patch))
            .await
            .map_err(|e| ("Failed to update environment settings", ProviderError::from(e)))?;
        tracing::info!("Updated settings of environment {}", environment_id);

        Ok(settings::settings_to_state(&environment_id, &updated))
    }

    async fn read_settings(
        &self,
        ctx: &Context,
        data: &SvixProviderData,
        state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, ProviderError> {
        let environment_id = ObjectReader::new(state).required_string("environment_id")?;
        let client = data.environment_client(&environment_id);
        match call(ctx, client.environment_settings().get()).await {
            Ok(current) => Ok(Some(settings::settings_to_state(&environment_id, &current))),
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    "Environment {} no longer exists, removing its settings from state",
                    environment_id
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn font_settings_known(config: &DynamicValue) -> bool {
    ["font_family", "font_family_url"].into_iter().all(|name| {
        let path = AttributePath::new(WHITELABEL).attribute(name);
        config.get(&path).map_or(true, |value| !value.is_unknown())
    })
}

/// Schema validators plus the `font_family`/`font_family_url` pairing.
/// The pairing waits until both values are known.
fn validate_settings(config: &DynamicValue) -> Vec<Diagnostic> {
    let mut diagnostics = validate_config(&schema(), config);
    match SettingsPlan::from_value(config) {
        Ok(SettingsPlan {
            whitelabel: Some(whitelabel),
            ..
        }) if font_settings_known(config) => {
            if let Some(violation) =
                check_font_rule(&whitelabel.font_family, &whitelabel.font_family_url)
            {
                diagnostics.push(violation.to_diagnostic());
            }
        }
        Ok(_) => {}
        Err(e) => diagnostics.push(e.to_diagnostic("Invalid environment settings")),
    }
    diagnostics
}

#[async_trait]
impl Resource for EnvironmentSettingsResource {
    fn type_name(&self) -> &str {
        "svix_environment_settings"
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
            diagnostics: validate_settings(&request.config),
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let Some(data) = &self.provider_data else {
            return CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![common::not_configured()],
            };
        };

        match self.apply_settings(&ctx, data, &request.planned_state).await {
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

        match self.read_settings(&ctx, data, &request.current_state).await {
            Ok(new_state) => ReadResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![e.to_diagnostic("Failed to get environment settings")],
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

        match self.apply_settings(&ctx, data, &request.planned_state).await {
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

    async fn delete(&self, _ctx: Context, _request: DeleteResourceRequest) -> DeleteResourceResponse {
        // settings go away with their environment
        DeleteResourceResponse {
            diagnostics: vec![],
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for EnvironmentSettingsResource {
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
