//! Resource implementations

pub mod common;
pub mod resource_api_token;
pub mod resource_environment;
pub mod resource_environment_settings;
pub mod resource_event_type;
pub mod resource_event_type_openapi_import;
pub mod resource_ingest_endpoint;
pub mod resource_ingest_source;
pub mod resource_operational_webhooks_endpoint;

pub use resource_api_token::ApiTokenResource;
pub use resource_environment::EnvironmentResource;
pub use resource_environment_settings::EnvironmentSettingsResource;
pub use resource_event_type::EventTypeResource;
pub use resource_event_type_openapi_import::EventTypeOpenApiImportResource;
pub use resource_ingest_endpoint::IngestEndpointResource;
pub use resource_ingest_source::IngestSourceResource;
pub use resource_operational_webhooks_endpoint::OperationalWebhooksEndpointResource;
