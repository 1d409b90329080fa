//! Terraform provider for the Svix webhooks platform

pub mod api;
pub mod coerce;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider_data;
pub mod resources;
pub mod settings;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, Provider, ProviderMetadataRequest,
    ProviderMetadataResponse, ProviderSchemaRequest, ProviderSchemaResponse, ResourceFactory,
};
use tfplug::resource::ResourceWithConfigure;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::Diagnostic;

pub use provider_data::SvixProviderData;

pub const PROVIDER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Default)]
pub struct SvixProvider;

impl SvixProvider {
    pub fn new() -> Self {
        Self
    }
}

pub fn provider_schema() -> Schema {
    SchemaBuilder::new()
        .version(0)
        .description("Manage Svix environments, event types, ingest sources and their settings")
        .attribute(
            AttributeBuilder::new("server_url", AttributeType::String)
                .description(&format!(
                    "Svix API server URL. May also be set with the {} environment variable.",
                    config::SERVER_URL_ENV
                ))
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("token", AttributeType::String)
                .description(&format!(
                    "Svix API token. May also be set with the {} environment variable.",
                    config::TOKEN_ENV
                ))
                .optional()
                .sensitive()
                .build(),
        )
        .build()
}

fn factory<R: ResourceWithConfigure + Default + 'static>() -> Box<dyn ResourceWithConfigure> {
    Box::new(R::default())
}

#[async_trait]
impl Provider for SvixProvider {
    fn type_name(&self) -> &str {
        "svix"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: self.type_name().to_string(),
            version: PROVIDER_VERSION.to_string(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: provider_schema(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        logging::init();

        let resolved = match config::resolve_from_env(&request.config) {
            Ok(resolved) => resolved,
            Err(diagnostics) => {
                return ConfigureProviderResponse {
                    provider_data: None,
                    diagnostics,
                }
            }
        };

        match SvixProviderData::new(&resolved) {
            Ok(data) => {
                tracing::info!(
                    "Configured svix provider against {} (terraform {})",
                    resolved.server_url,
                    request.terraform_version
                );
                ConfigureProviderResponse {
                    provider_data: Some(Arc::new(data)),
                    diagnostics: vec![],
                }
            }
            Err(e) => ConfigureProviderResponse {
                provider_data: None,
                diagnostics: vec![Diagnostic::error(
                    "Unable to create svix client",
                    e.to_string(),
                )],
            },
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut factories: HashMap<String, ResourceFactory> = HashMap::new();
        factories.insert("svix_api_token".to_string(), factory::<resources::ApiTokenResource>);
        factories.insert("svix_environment".to_string(), factory::<resources::EnvironmentResource>);
        factories.insert(
            "svix_environment_settings".to_string(),
            factory::<resources::EnvironmentSettingsResource>,
        );
        factories.insert("svix_event_type".to_string(), factory::<resources::EventTypeResource>);
        factories.insert(
            "svix_event_type_openapi_import".to_string(),
            factory::<resources::EventTypeOpenApiImportResource>,
        );
        factories.insert(
            "svix_operational_webhooks_endpoint".to_string(),
            factory::<resources::OperationalWebhooksEndpointResource>,
        );
        factories.insert("svix_ingest_source".to_string(), factory::<resources::IngestSourceResource>);
        factories.insert(
            "svix_ingest_endpoint".to_string(),
            factory::<resources::IngestEndpointResource>,
        );
        factories
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tfplug::{AttributePath, Dynamic, DynamicValue};

    fn configure_request(config: DynamicValue) -> ConfigureProviderRequest {
        ConfigureProviderRequest {
            terraform_version: "1.9.0".to_string(),
            config,
        }
    }

    #[tokio::test]
    async fn every_resource_reports_its_registered_name() {
        let provider = SvixProvider::new();
        let resources = provider.resources();
        assert_eq!(resources.len(), 8);
        for (name, factory) in resources {
            assert_eq!(factory().type_name(), name);
        }
    }

    #[test]
    fn metadata_reports_crate_version() {
        let provider = SvixProvider::new();
        let response =
            tokio_test::block_on(provider.metadata(Context::new(), ProviderMetadataRequest));
        assert_eq!(response.type_name, "svix");
        assert_eq!(response.version, PROVIDER_VERSION);
    }

    #[test]
    fn token_is_sensitive() {
        let schema = provider_schema();
        assert!(schema.attribute("token").unwrap().sensitive);
        assert!(!schema.attribute("server_url").unwrap().sensitive);
    }

    #[tokio::test]
    #[serial]
    async fn provider_configures_from_block() {
        std::env::remove_var(config::TOKEN_ENV);
        std::env::remove_var(config::SERVER_URL_ENV);

        let mut provider = SvixProvider::new();
        let response = provider
            .configure(
                Context::new(),
                configure_request(DynamicValue::new(Dynamic::object(vec![
                    ("token", Dynamic::string("testsk_block")),
                    ("server_url", Dynamic::string("https://api.eu.svix.com")),
                ]))),
            )
            .await;

        assert!(response.diagnostics.is_empty());
        let data = response.provider_data.unwrap();
        let data = data.downcast_ref::<SvixProviderData>().unwrap();
        assert_eq!(data.client.base_url(), "https://api.eu.svix.com");
    }

    #[tokio::test]
    #[serial]
    async fn provider_configure_requires_token() {
        std::env::remove_var(config::TOKEN_ENV);
        std::env::set_var(config::SERVER_URL_ENV, "https://api.svix.com");

        let mut provider = SvixProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(DynamicValue::null()))
            .await;

        assert!(response.provider_data.is_none());
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Missing API Token Configuration");
        assert_eq!(
            response.diagnostics[0].attribute,
            Some(AttributePath::new("token"))
        );

        std::env::remove_var(config::SERVER_URL_ENV);
    }
}
