use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{segment, ApiError, Client};

const ENDPOINT_PATH: &str = "/api/v1/operational-webhook/endpoint";

/// Event names an operational webhook endpoint can subscribe to
pub const OPERATIONAL_EVENT_TYPES: [&str; 9] = [
    "background_task.finished",
    "endpoint.created",
    "endpoint.deleted",
    "endpoint.disabled",
    "endpoint.enabled",
    "endpoint.updated",
    "message.attempt.exhausted",
    "message.attempt.failing",
    "message.attempt.recovered",
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalWebhookEndpointIn {
    pub url: String,
    pub description: Option<String>,
    pub disabled: Option<bool>,
    pub filter_types: Vec<String>,
    pub metadata: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

/// The secret is settable only at creation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalWebhookEndpointUpdate {
    pub url: String,
    pub description: Option<String>,
    pub disabled: Option<bool>,
    pub filter_types: Vec<String>,
    pub metadata: HashMap<String, String>,
    pub rate_limit: Option<u16>,
    pub uid: Option<String>,
}

impl From<OperationalWebhookEndpointIn> for OperationalWebhookEndpointUpdate {
    fn from(endpoint: OperationalWebhookEndpointIn) -> Self {
        Self {
            url: endpoint.url,
            description: endpoint.description,
            disabled: endpoint.disabled,
            filter_types: endpoint.filter_types,
            metadata: endpoint.metadata,
            rate_limit: endpoint.rate_limit,
            uid: endpoint.uid,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalWebhookEndpointOut {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub disabled: Option<bool>,
    #[serde(default)]
    pub filter_types: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub rate_limit: Option<u16>,
    #[serde(default)]
    pub uid: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct OperationalWebhookEndpointApi<'a> {
    client: &'a Client,
}

impl<'a> OperationalWebhookEndpointApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn path(id: &str) -> String {
        format!("{}/{}", ENDPOINT_PATH, segment(id))
    }

    pub async fn create(
        &self,
        endpoint: &OperationalWebhookEndpointIn,
    ) -> Result<OperationalWebhookEndpointOut, ApiError> {
        self.client.post(ENDPOINT_PATH, endpoint).await
    }

    pub async fn get(&self, id: &str) -> Result<OperationalWebhookEndpointOut, ApiError> {
        self.client.get(&Self::path(id)).await
    }

    pub async fn update(
        &self,
        id: &str,
        update: &OperationalWebhookEndpointUpdate,
    ) -> Result<OperationalWebhookEndpointOut, ApiError> {
        self.client.put(&Self::path(id), update).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&Self::path(id)).await
    }
}
