//! Management API: API tokens, environments and environment settings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::{segment, ApiError, Client};

const API_TOKEN_PATH: &str = "/api/v1/management/authentication/api-token";
const ENVIRONMENT_PATH: &str = "/api/v1/management/environment";
const ENVIRONMENT_SETTINGS_PATH: &str = "/api/v1/management/environment-settings";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTokenIn {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTokenOut {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
    pub token: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiTokenExpireIn {
    /// Seconds until expiry; 0 expires immediately
    pub expiry: Option<i64>,
}

pub struct AuthenticationApi<'a> {
    client: &'a Client,
}

impl<'a> AuthenticationApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create_api_token(&self, token: &ApiTokenIn) -> Result<ApiTokenOut, ApiError> {
        self.client.post(API_TOKEN_PATH, token).await
    }

    pub async fn expire_api_token(
        &self,
        key_id: &str,
        expire: &ApiTokenExpireIn,
    ) -> Result<(), ApiError> {
        let path = format!("{}/{}/expire", API_TOKEN_PATH, segment(key_id));
        self.client.post_no_content(&path, expire).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentType {
    Development,
    Production,
}

impl EnvironmentType {
    pub const ALL: [&'static str; 2] = ["development", "production"];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentType::Development => "development",
            EnvironmentType::Production => "production",
        }
    }
}

impl fmt::Display for EnvironmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(EnvironmentType::Development),
            "production" => Ok(EnvironmentType::Production),
            other => Err(format!("unknown environment type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentIn {
    pub name: String,
    #[serde(rename = "type")]
    pub environment_type: EnvironmentType,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentUpdate {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentOut {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub environment_type: EnvironmentType,
    pub region: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct EnvironmentApi<'a> {
    client: &'a Client,
}

impl<'a> EnvironmentApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create(&self, environment: &EnvironmentIn) -> Result<EnvironmentOut, ApiError> {
        self.client.post(ENVIRONMENT_PATH, environment).await
    }

    pub async fn get(&self, id: &str) -> Result<EnvironmentOut, ApiError> {
        self.client
            .get(&format!("{}/{}", ENVIRONMENT_PATH, segment(id)))
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        update: &EnvironmentUpdate,
    ) -> Result<EnvironmentOut, ApiError> {
        self.client
            .put(&format!("{}/{}", ENVIRONMENT_PATH, segment(id)), update)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("{}/{}", ENVIRONMENT_PATH, segment(id)))
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderRadius {
    None,
    Lg,
    Md,
    Sm,
    Full,
}

impl BorderRadius {
    pub const ALL: [&'static str; 5] = ["none", "lg", "md", "sm", "full"];

    pub fn as_str(&self) -> &'static str {
        match self {
            BorderRadius::None => "none",
            BorderRadius::Lg => "lg",
            BorderRadius::Md => "md",
            BorderRadius::Sm => "sm",
            BorderRadius::Full => "full",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(BorderRadius::None),
            "lg" => Some(BorderRadius::Lg),
            "md" => Some(BorderRadius::Md),
            "sm" => Some(BorderRadius::Sm),
            "full" => Some(BorderRadius::Full),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BorderRadiusConfig {
    pub button: Option<BorderRadius>,
    pub card: Option<BorderRadius>,
    pub input: Option<BorderRadius>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontSizeConfig {
    pub base: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomThemeOverride {
    pub border_radius: Option<BorderRadiusConfig>,
    pub font_size: Option<FontSizeConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomColorPalette {
    pub primary: Option<String>,
    pub background_primary: Option<String>,
    pub background_secondary: Option<String>,
    pub background_hover: Option<String>,
    pub interactive_accent: Option<String>,
    pub navigation_accent: Option<String>,
    pub button_primary: Option<String>,
    pub text_primary: Option<String>,
    pub text_danger: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomStringsOverride {
    pub channels_help: Option<String>,
    pub channels_many: Option<String>,
    pub channels_one: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Environment settings as sent and received. Every field is serialized,
/// absent ones as null, so a PUT carries the full object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentSettings {
    pub color_palette_dark: Option<CustomColorPalette>,
    pub color_palette_light: Option<CustomColorPalette>,
    pub custom_base_font_size: Option<i64>,
    pub custom_font_family: Option<String>,
    pub custom_font_family_url: Option<String>,
    pub custom_logo_url: Option<String>,
    pub custom_strings_override: Option<CustomStringsOverride>,
    pub custom_theme_override: Option<CustomThemeOverride>,
    pub disable_endpoint_on_failure: Option<bool>,
    pub display_name: Option<String>,
    pub enable_channels: Option<bool>,
    pub enable_endpoint_mtls_config: Option<bool>,
    pub enable_endpoint_oauth_config: Option<bool>,
    pub enable_integration_management: Option<bool>,
    pub enable_message_stream: Option<bool>,
    pub enable_transformations: Option<bool>,
    pub enforce_https: Option<bool>,
    pub event_catalog_published: Option<bool>,
    pub read_only: Option<bool>,
    pub require_endpoint_channel: Option<bool>,
    pub require_endpoint_filter_types: Option<bool>,
    pub whitelabel_headers: Option<bool>,
    pub wipe_successful_payload: Option<bool>,
    /// Keys this provider does not model, sent back unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub struct EnvironmentSettingsApi<'a> {
    client: &'a Client,
}

impl<'a> EnvironmentSettingsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn get(&self) -> Result<EnvironmentSettings, ApiError> {
        self.client.get(ENVIRONMENT_SETTINGS_PATH).await
    }

    pub async fn update(
        &self,
        settings: &EnvironmentSettings,
    ) -> Result<EnvironmentSettings, ApiError> {
        self.client.put(ENVIRONMENT_SETTINGS_PATH, settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn settings_serialize_absent_fields_as_null() {
        let settings = EnvironmentSettings {
            enforce_https: Some(true),
            ..Default::default()
        };
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["enforceHttps"], json!(true));
        assert!(value.as_object().unwrap().contains_key("displayName"));
        assert_eq!(value["displayName"], serde_json::Value::Null);
    }

    #[test]
    fn settings_tolerate_sparse_responses() {
        let settings: EnvironmentSettings = serde_json::from_value(json!({
            "displayName": "Acme",
            "customThemeOverride": {"borderRadius": {"button": "lg"}},
            "someFutureFlag": true
        }))
        .unwrap();
        assert_eq!(settings.display_name.as_deref(), Some("Acme"));
        let radius = settings
            .custom_theme_override
            .and_then(|t| t.border_radius)
            .unwrap();
        assert_eq!(radius.button, Some(BorderRadius::Lg));
        assert_eq!(radius.card, None);
    }

    #[test]
    fn unmodelled_keys_survive_a_round_trip() {
        let remote = json!({
            "enforceHttps": true,
            "showUseSvixPlay": false,
            "enableOtlp": true,
            "colorPaletteDark": {"primary": "#000", "accentBorder": "#111"},
            "customThemeOverride": {"borderRadius": {"button": "sm", "badge": "md"}}
        });
        let settings: EnvironmentSettings = serde_json::from_value(remote).unwrap();
        assert_eq!(settings.extra.get("enableOtlp"), Some(&json!(true)));

        let body = serde_json::to_value(&settings).unwrap();
        assert_eq!(body["showUseSvixPlay"], json!(false));
        assert_eq!(body["enableOtlp"], json!(true));
        assert_eq!(body["colorPaletteDark"]["accentBorder"], json!("#111"));
        assert_eq!(body["customThemeOverride"]["borderRadius"]["badge"], json!("md"));
        assert_eq!(body["customThemeOverride"]["borderRadius"]["button"], json!("sm"));
    }

    #[test]
    fn border_radius_wire_names() {
        for name in BorderRadius::ALL {
            let parsed = BorderRadius::parse(name).unwrap();
            assert_eq!(parsed.as_str(), name);
            assert_eq!(serde_json::to_value(parsed).unwrap(), json!(name));
        }
        assert!(BorderRadius::parse("xl").is_none());
    }

    #[test]
    fn environment_out_parses_type() {
        let env: EnvironmentOut = serde_json::from_value(json!({
            "id": "env_1",
            "name": "staging",
            "type": "development",
            "region": "eu",
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-02T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(env.environment_type, EnvironmentType::Development);
        assert_eq!("production".parse::<EnvironmentType>(), Ok(EnvironmentType::Production));
    }
}
