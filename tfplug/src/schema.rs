//! Schema declaration for providers and resources
//!
//! Attributes carry their own validators, plan modifiers and defaults. The
//! `plan` module runs them; resources only declare them.

use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Terraform's attribute type system
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    /// Always f64 on the wire; integer attributes add range validators
    Number,
    Bool,
    List(Box<AttributeType>),
    Map(Box<AttributeType>),
    Object(HashMap<String, AttributeType>),
}

#[derive(Debug, Clone)]
pub struct Schema {
    /// Bump when stored state needs an upgrade
    pub version: i64,
    pub block: Block,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attributes.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub attributes: Vec<Attribute>,
    pub description: String,
    pub deprecated: bool,
}

#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub validators: Vec<Arc<dyn Validator>>,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
    pub default: Option<Arc<dyn DefaultValue>>,
    pub nested_type: Option<NestedType>,
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let validators: Vec<String> = self.validators.iter().map(|v| v.description()).collect();
        let modifiers: Vec<String> = self
            .plan_modifiers
            .iter()
            .map(|m| m.description())
            .collect();
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("validators", &validators)
            .field("plan_modifiers", &modifiers)
            .field("default", &self.default.as_ref().map(|d| d.description()))
            .field("nested_type", &self.nested_type)
            .finish()
    }
}

/// Attributes of a single nested object
#[derive(Debug, Clone)]
pub struct NestedType {
    pub attributes: Vec<Attribute>,
}

/// Checks a configured value. Only called for known, non-null values.
pub trait Validator: Send + Sync {
    fn description(&self) -> String;
    fn validate(&self, request: ValidatorRequest<'_>) -> ValidatorResponse;
}

pub struct ValidatorRequest<'a> {
    pub value: &'a Dynamic,
    pub path: &'a AttributePath,
    /// The whole resource configuration, for rules spanning attributes
    pub config: &'a DynamicValue,
}

#[derive(Debug, Default)]
pub struct ValidatorResponse {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidatorResponse {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn error(path: &AttributePath, summary: &str, detail: impl Into<String>) -> Self {
        Self {
            diagnostics: vec![Diagnostic::error(summary, detail).with_attribute(path.clone())],
        }
    }
}

/// Adjusts the planned value of one attribute
pub trait PlanModifier: Send + Sync {
    fn description(&self) -> String;
    fn modify(&self, request: PlanModifierRequest<'_>) -> PlanModifierResponse;
}

pub struct PlanModifierRequest<'a> {
    pub config_value: &'a Dynamic,
    pub state_value: &'a Dynamic,
    pub plan_value: Dynamic,
    pub path: &'a AttributePath,
    /// False while planning a create
    pub has_prior_state: bool,
}

#[derive(Debug)]
pub struct PlanModifierResponse {
    pub plan_value: Dynamic,
    pub requires_replace: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl PlanModifierResponse {
    pub fn keep(plan_value: Dynamic) -> Self {
        Self {
            plan_value,
            requires_replace: false,
            diagnostics: Vec::new(),
        }
    }
}

/// Value planned for an optional+computed attribute left out of config
pub trait DefaultValue: Send + Sync {
    fn description(&self) -> String;
    fn default_value(&self, path: &AttributePath) -> Dynamic;
}

/// Fluent builder; prefer this over constructing `Attribute` directly
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                validators: Vec::new(),
                plan_modifiers: Vec::new(),
                default: None,
                nested_type: None,
            },
        }
    }

    /// An object attribute whose shape is given by `attributes`
    pub fn single_nested(name: &str, attributes: Vec<Attribute>) -> Self {
        let fields = attributes
            .iter()
            .map(|a| (a.name.clone(), a.r#type.clone()))
            .collect();
        let mut builder = Self::new(name, AttributeType::Object(fields));
        builder.attribute.nested_type = Some(NestedType { attributes });
        builder
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.attribute.validators.push(Arc::new(validator));
        self
    }

    pub fn plan_modifier(mut self, modifier: impl PlanModifier + 'static) -> Self {
        self.attribute.plan_modifiers.push(Arc::new(modifier));
        self
    }

    /// Defaults imply computed, as Terraform requires
    pub fn default(mut self, default: impl DefaultValue + 'static) -> Self {
        self.attribute.default = Some(Arc::new(default));
        self.attribute.computed = true;
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block::default(),
            },
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.schema.block.deprecated = true;
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::StaticDefault;
    use crate::validator::StringLength;

    #[test]
    fn attribute_builder_sets_flags() {
        let attr = AttributeBuilder::new("name", AttributeType::String)
            .description("Environment name")
            .required()
            .validator(StringLength::between(1, 256))
            .build();

        assert_eq!(attr.name, "name");
        assert!(attr.required);
        assert!(!attr.optional);
        assert_eq!(attr.validators.len(), 1);
        assert_eq!(attr.description, "Environment name");
    }

    #[test]
    fn default_marks_attribute_computed() {
        let attr = AttributeBuilder::new("disabled", AttributeType::Bool)
            .optional()
            .default(StaticDefault::bool(false))
            .build();

        assert!(attr.optional);
        assert!(attr.computed);
        assert!(attr.default.is_some());
    }

    #[test]
    fn clone_keeps_validators() {
        let attr = AttributeBuilder::new("uid", AttributeType::String)
            .optional()
            .validator(StringLength::between(1, 60))
            .build();
        assert_eq!(attr.clone().validators.len(), 1);
    }

    #[test]
    fn single_nested_derives_object_type() {
        let attr = AttributeBuilder::single_nested(
            "border_radius",
            vec![
                AttributeBuilder::new("button", AttributeType::String)
                    .optional()
                    .build(),
                AttributeBuilder::new("card", AttributeType::String)
                    .optional()
                    .build(),
            ],
        )
        .optional()
        .build();

        let AttributeType::Object(fields) = &attr.r#type else {
            panic!("expected object type");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("button"), Some(&AttributeType::String));
        assert_eq!(attr.nested_type.unwrap().attributes.len(), 2);
    }

    #[test]
    fn schema_lookup_by_name() {
        let schema = SchemaBuilder::new()
            .version(1)
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .build();

        assert_eq!(schema.version, 1);
        assert!(schema.attribute("id").is_some());
        assert!(schema.attribute("name").is_none());
    }
}
