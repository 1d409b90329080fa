//! Provider data structure passed to resources

use crate::api::{ApiError, Client};
use crate::config::ProviderConfig;

/// Read-only after configure; resources clone what they need.
#[derive(Clone)]
pub struct SvixProviderData {
    pub client: Client,
}

impl SvixProviderData {
    pub fn new(config: &ProviderConfig) -> Result<Self, ApiError> {
        Ok(Self {
            client: Client::new(&config.server_url, &config.token)?,
        })
    }

    /// Client whose token is scoped to `environment_id`
    pub fn environment_client(&self, environment_id: &str) -> Client {
        self.client.for_environment(environment_id)
    }
}
