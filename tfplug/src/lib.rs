//! tfplug - Terraform Plugin Framework for Rust
//!
//! The provider-side half of the plugin protocol: dynamic values, schemas,
//! validators, plan modifiers and the async resource/provider traits.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod provider;
pub mod resource;

// Helper modules
pub mod defaults;
pub mod plan;
pub mod plan_modifier;
pub mod validator;

pub use context::Context;
pub use error::{Result, TfplugError};
pub use provider::{
    configured_resource, ConfigureProviderRequest, ConfigureProviderResponse, Provider,
    ProviderData, ProviderMetadataRequest, ProviderMetadataResponse, ProviderSchemaRequest,
    ProviderSchemaResponse, ResourceFactory,
};
pub use resource::{Resource, ResourceWithConfigure};
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use types::{AttributePath, Diagnostic, DiagnosticSeverity, Dynamic, DynamicValue};
