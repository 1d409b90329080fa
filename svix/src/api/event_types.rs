use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{segment, ApiError, Client};

const EVENT_TYPE_PATH: &str = "/api/v1/event-type";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeIn {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_flag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemas: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeUpdate {
    pub description: String,
    pub archived: Option<bool>,
    pub deprecated: Option<bool>,
    pub feature_flag: Option<String>,
    pub group_name: Option<String>,
    pub schemas: Option<Map<String, Value>>,
}

impl From<EventTypeIn> for EventTypeUpdate {
    fn from(event_type: EventTypeIn) -> Self {
        Self {
            description: event_type.description,
            archived: event_type.archived,
            deprecated: event_type.deprecated,
            feature_flag: event_type.feature_flag,
            group_name: event_type.group_name,
            schemas: event_type.schemas,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeOut {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub archived: Option<bool>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub feature_flag: Option<String>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub schemas: Option<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeImportOpenApiIn {
    /// Parsed by the server as YAML or JSON
    pub spec_raw: String,
    pub replace_all: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventTypeImportOpenApiOut {
    pub data: EventTypeImportOpenApiOutData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventTypeImportOpenApiOutData {
    /// Names of the event types the import created or overwrote
    pub modified: Vec<String>,
}

pub struct EventTypeApi<'a> {
    client: &'a Client,
}

impl<'a> EventTypeApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn path(name: &str) -> String {
        format!("{}/{}", EVENT_TYPE_PATH, segment(name))
    }

    pub async fn create(&self, event_type: &EventTypeIn) -> Result<EventTypeOut, ApiError> {
        self.client.post(EVENT_TYPE_PATH, event_type).await
    }

    pub async fn get(&self, name: &str) -> Result<EventTypeOut, ApiError> {
        self.client.get(&Self::path(name)).await
    }

    pub async fn update(
        &self,
        name: &str,
        update: &EventTypeUpdate,
    ) -> Result<EventTypeOut, ApiError> {
        self.client.put(&Self::path(name), update).await
    }

    /// Without `expunge` the server only archives the event type
    pub async fn delete(&self, name: &str, expunge: bool) -> Result<(), ApiError> {
        let mut path = Self::path(name);
        if expunge {
            path.push_str("?expunge=true");
        }
        self.client.delete(&path).await
    }

    pub async fn import_openapi(
        &self,
        import: &EventTypeImportOpenApiIn,
    ) -> Result<EventTypeImportOpenApiOut, ApiError> {
        self.client
            .post(&format!("{}/import/openapi", EVENT_TYPE_PATH), import)
            .await
    }
}
