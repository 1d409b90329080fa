//! Provider trait and resource instantiation

use crate::context::Context;
use crate::error::{Result, TfplugError};
use crate::resource::{ConfigureResourceRequest, ResourceWithConfigure};
use crate::schema::Schema;
use crate::types::{has_errors, Diagnostic, DynamicValue};
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds a fresh, unconfigured resource instance
pub type ResourceFactory = fn() -> Box<dyn ResourceWithConfigure>;

/// Opaque data handed from `Provider::configure` to every resource
pub type ProviderData = Arc<dyn Any + Send + Sync>;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Prefix shared by all resource type names, e.g. "svix"
    fn type_name(&self) -> &str;

    async fn metadata(
        &self,
        ctx: Context,
        request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse;

    async fn schema(&self, ctx: Context, request: ProviderSchemaRequest) -> ProviderSchemaResponse;

    /// Runs once per process before any resource operation
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse;

    fn resources(&self) -> HashMap<String, ResourceFactory>;
}

pub struct ProviderMetadataRequest;

pub struct ProviderMetadataResponse {
    pub type_name: String,
    pub version: String,
}

pub struct ProviderSchemaRequest;

pub struct ProviderSchemaResponse {
    pub schema: Schema,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ConfigureProviderRequest {
    pub terraform_version: String,
    pub config: DynamicValue,
}

pub struct ConfigureProviderResponse {
    pub provider_data: Option<ProviderData>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Instantiates `type_name` from the provider's factories and configures it
/// with `provider_data`.
pub async fn configured_resource(
    ctx: Context,
    provider: &dyn Provider,
    type_name: &str,
    provider_data: Option<ProviderData>,
) -> Result<Box<dyn ResourceWithConfigure>> {
    let factory = provider
        .resources()
        .get(type_name)
        .copied()
        .ok_or_else(|| TfplugError::ResourceNotFound(type_name.to_string()))?;

    let mut resource = factory();
    let response = resource
        .configure(ctx, ConfigureResourceRequest { provider_data })
        .await;

    if has_errors(&response.diagnostics) {
        let details: Vec<String> = response
            .diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| format!("{}: {}", d.summary, d.detail))
            .collect();
        return Err(TfplugError::Custom(details.join("; ")));
    }
    Ok(resource)
}
