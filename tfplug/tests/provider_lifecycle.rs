//! Drives a small in-memory provider through the resource lifecycle

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tfplug::defaults::StaticDefault;
use tfplug::plan::{plan_resource_change, validate_config};
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::resource::*;
use tfplug::validator::StringLength;
use tfplug::*;

type Store = Arc<Mutex<HashMap<String, String>>>;

struct KvProvider {
    store: Store,
}

#[async_trait]
impl Provider for KvProvider {
    fn type_name(&self) -> &str {
        "kv"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: "kv".to_string(),
            version: "0.0.1".to_string(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: SchemaBuilder::new().build(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        _request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        ConfigureProviderResponse {
            provider_data: Some(Arc::new(self.store.clone())),
            diagnostics: vec![],
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut resources: HashMap<String, ResourceFactory> = HashMap::new();
        resources.insert("kv_entry".to_string(), || -> Box<dyn ResourceWithConfigure> {
            Box::new(EntryResource::default())
        });
        resources
    }
}

#[derive(Default)]
struct EntryResource {
    store: Option<Store>,
}

fn entry_schema() -> Schema {
    SchemaBuilder::new()
        .attribute(
            AttributeBuilder::new("id", AttributeType::String)
                .computed()
                .plan_modifier(UseStateForUnknown)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("key", AttributeType::String)
                .required()
                .validator(StringLength::between(1, 16))
                .plan_modifier(RequiresReplace)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("value", AttributeType::String)
                .optional()
                .default(StaticDefault::string(""))
                .build(),
        )
        .build()
}

impl EntryResource {
    fn store(&self) -> std::result::Result<&Store, Diagnostic> {
        self.store
            .as_ref()
            .ok_or_else(|| Diagnostic::error("Provider not configured", ""))
    }

    fn write(&self, state: &DynamicValue) -> std::result::Result<DynamicValue, Diagnostic> {
        let store = self.store()?;
        let key = state
            .get_string(&AttributePath::new("key"))
            .map_err(|e| Diagnostic::error("Invalid key", e.to_string()))?;
        let value = state
            .get_string(&AttributePath::new("value"))
            .unwrap_or_default();
        store.lock().unwrap().insert(key.clone(), value.clone());

        let mut new_state = state.clone();
        new_state
            .set_string(&AttributePath::new("id"), key)
            .map_err(|e| Diagnostic::error("Invalid state", e.to_string()))?;
        Ok(new_state)
    }
}

#[async_trait]
impl Resource for EntryResource {
    fn type_name(&self) -> &str {
        "kv_entry"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: format!("{}_entry", request.provider_type_name),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ResourceSchemaRequest) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: entry_schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: validate_config(&entry_schema(), &request.config),
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        tokio::select! {
            _ = ctx.cancelled() => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![Diagnostic::error("Cancelled", "context cancelled")],
            },
            _ = tokio::time::sleep(Duration::from_millis(5)) => match self.write(&request.planned_state) {
                Ok(new_state) => CreateResourceResponse { new_state, diagnostics: vec![] },
                Err(diag) => CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![diag],
                },
            },
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let Ok(store) = self.store() else {
            return ReadResourceResponse {
                new_state: None,
                diagnostics: vec![Diagnostic::error("Provider not configured", "")],
            };
        };
        let id = request
            .current_state
            .get_string(&AttributePath::new("id"))
            .unwrap_or_default();
        let stored = store.lock().unwrap().get(&id).cloned();
        let new_state = stored.map(|value| {
            let mut state = request.current_state.clone();
            state.set_string(&AttributePath::new("value"), value).unwrap();
            state
        });
        ReadResourceResponse {
            new_state,
            diagnostics: vec![],
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        match self.write(&request.planned_state) {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(diag) => UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics: vec![diag],
            },
        }
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let id = request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .unwrap_or_default();
        if let Ok(store) = self.store() {
            store.lock().unwrap().remove(&id);
        }
        DeleteResourceResponse {
            diagnostics: vec![],
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for EntryResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];
        match request.provider_data {
            Some(data) => match data.downcast_ref::<Store>() {
                Some(store) => self.store = Some(store.clone()),
                None => diagnostics.push(Diagnostic::error(
                    "Unexpected provider data type",
                    "expected the kv store",
                )),
            },
            None => diagnostics.push(Diagnostic::error("Provider not configured", "")),
        }
        ConfigureResourceResponse { diagnostics }
    }
}

async fn configured_provider() -> (KvProvider, Option<ProviderData>) {
    let mut provider = KvProvider {
        store: Arc::default(),
    };
    let response = provider
        .configure(
            Context::new(),
            ConfigureProviderRequest {
                terraform_version: "1.9.0".to_string(),
                config: DynamicValue::null(),
            },
        )
        .await;
    (provider, response.provider_data)
}

fn entry_config(key: &str, value: Option<&str>) -> DynamicValue {
    let mut entries = vec![("key", Dynamic::string(key))];
    if let Some(value) = value {
        entries.push(("value", Dynamic::string(value)));
    }
    DynamicValue::new(Dynamic::object(entries))
}

#[tokio::test]
async fn unknown_resource_type_is_reported() {
    let (provider, data) = configured_provider().await;
    let result = configured_resource(Context::new(), &provider, "kv_missing", data).await;
    assert!(matches!(result, Err(TfplugError::ResourceNotFound(name)) if name == "kv_missing"));
}

#[tokio::test]
async fn configure_without_provider_data_fails() {
    let (provider, _) = configured_provider().await;
    let result = configured_resource(Context::new(), &provider, "kv_entry", None).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn full_lifecycle_round_trip() {
    let (provider, data) = configured_provider().await;
    let resource = configured_resource(Context::new(), &provider, "kv_entry", data)
        .await
        .unwrap();
    let schema = resource
        .schema(Context::new(), ResourceSchemaRequest)
        .await
        .schema;

    let config = entry_config("greeting", None);
    let validation = resource
        .validate(
            Context::new(),
            ValidateResourceConfigRequest {
                type_name: "kv_entry".to_string(),
                config: config.clone(),
            },
        )
        .await;
    assert!(validation.diagnostics.is_empty());

    let plan = plan_resource_change(&schema, &DynamicValue::null(), &config);
    assert!(plan.requires_replace.is_empty());
    let created = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "kv_entry".to_string(),
                planned_state: plan.planned_state,
                config: config.clone(),
            },
        )
        .await;
    assert!(created.diagnostics.is_empty());
    assert_eq!(
        created.new_state.get_string(&AttributePath::new("id")).unwrap(),
        "greeting"
    );
    assert_eq!(
        created.new_state.get_string(&AttributePath::new("value")).unwrap(),
        ""
    );

    let new_config = entry_config("greeting", Some("hello"));
    let plan = plan_resource_change(&schema, &created.new_state, &new_config);
    assert!(plan.requires_replace.is_empty());
    let updated = resource
        .update(
            Context::new(),
            UpdateResourceRequest {
                type_name: "kv_entry".to_string(),
                prior_state: created.new_state.clone(),
                planned_state: plan.planned_state,
                config: new_config,
            },
        )
        .await;
    assert!(updated.diagnostics.is_empty());

    let read = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "kv_entry".to_string(),
                current_state: updated.new_state.clone(),
            },
        )
        .await;
    assert_eq!(
        read.new_state
            .unwrap()
            .get_string(&AttributePath::new("value"))
            .unwrap(),
        "hello"
    );

    let rename = plan_resource_change(&schema, &updated.new_state, &entry_config("other", None));
    assert_eq!(rename.requires_replace, vec![AttributePath::new("key")]);

    resource
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: "kv_entry".to_string(),
                prior_state: updated.new_state.clone(),
            },
        )
        .await;
    let gone = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "kv_entry".to_string(),
                current_state: updated.new_state,
            },
        )
        .await;
    assert!(gone.new_state.is_none());
}

#[tokio::test]
async fn cancelled_context_aborts_create() {
    let (provider, data) = configured_provider().await;
    let resource = configured_resource(Context::new(), &provider, "kv_entry", data)
        .await
        .unwrap();

    let ctx = Context::new();
    ctx.cancel();
    let response = resource
        .create(
            ctx,
            CreateResourceRequest {
                type_name: "kv_entry".to_string(),
                planned_state: entry_config("k", Some("v")),
                config: entry_config("k", Some("v")),
            },
        )
        .await;
    assert_eq!(response.diagnostics[0].summary, "Cancelled");
}

#[test]
fn metadata_uses_provider_prefix() {
    let response = tokio_test::block_on(EntryResource::default().metadata(
        Context::new(),
        ResourceMetadataRequest {
            provider_type_name: "kv".to_string(),
        },
    ));
    assert_eq!(response.type_name, "kv_entry");
}
