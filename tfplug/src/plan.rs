//! Schema-driven validation and planning
//!
//! Runs what each attribute declares: required checks, validators, defaults
//! and plan modifiers. Resources call `validate_config` from their own
//! `validate`; the host calls `plan_resource_change` before apply.

use crate::schema::{Attribute, PlanModifierRequest, Schema, ValidatorRequest};
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use std::collections::HashMap;

pub fn validate_config(schema: &Schema, config: &DynamicValue) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if let Dynamic::Map(object) = &config.value {
        validate_attributes(
            &schema.block.attributes,
            &AttributePath::root(),
            object,
            config,
            &mut diagnostics,
        );
    }
    diagnostics
}

fn validate_attributes(
    attributes: &[Attribute],
    parent: &AttributePath,
    object: &HashMap<String, Dynamic>,
    config: &DynamicValue,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for attribute in attributes {
        let path = parent.clone().attribute(&attribute.name);
        let value = object.get(&attribute.name).unwrap_or(&Dynamic::Null);

        match value {
            Dynamic::Null if attribute.required => diagnostics.push(
                Diagnostic::error(
                    "Missing required argument",
                    format!("The argument \"{}\" is required, but no definition was found.", path),
                )
                .with_attribute(path),
            ),
            Dynamic::Null | Dynamic::Unknown => {}
            _ if attribute.computed && !attribute.optional && !attribute.required => diagnostics
                .push(
                    Diagnostic::error(
                        "Invalid Configuration for Read-Only Attribute",
                        format!("Cannot set value for this attribute as the provider has marked it as read-only. Remove the configuration line setting the value. Attribute: {}", path),
                    )
                    .with_attribute(path),
                ),
            _ => {
                for validator in &attribute.validators {
                    let response = validator.validate(ValidatorRequest {
                        value,
                        path: &path,
                        config,
                    });
                    diagnostics.extend(response.diagnostics);
                }
                if let (Some(nested), Dynamic::Map(child)) = (&attribute.nested_type, value) {
                    validate_attributes(&nested.attributes, &path, child, config, diagnostics);
                }
            }
        }
    }
}

pub struct PlannedChange {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Computes the planned state for `config` given `prior_state`
/// (null when the resource is being created).
pub fn plan_resource_change(
    schema: &Schema,
    prior_state: &DynamicValue,
    config: &DynamicValue,
) -> PlannedChange {
    let mut change = PlannedChange {
        planned_state: DynamicValue::null(),
        requires_replace: Vec::new(),
        diagnostics: Vec::new(),
    };
    if config.is_null() {
        return change;
    }

    let has_prior_state = !prior_state.is_null();
    let planned = plan_object(
        &schema.block.attributes,
        &AttributePath::root(),
        &prior_state.value,
        &config.value,
        has_prior_state,
        &mut change,
    );
    change.planned_state = DynamicValue::new(planned);
    change
}

fn plan_object(
    attributes: &[Attribute],
    parent: &AttributePath,
    prior: &Dynamic,
    config: &Dynamic,
    has_prior_state: bool,
    change: &mut PlannedChange,
) -> Dynamic {
    let child = |value: &Dynamic, name: &str| match value {
        Dynamic::Map(m) => m.get(name).cloned().unwrap_or(Dynamic::Null),
        _ => Dynamic::Null,
    };

    let mut planned = HashMap::with_capacity(attributes.len());
    for attribute in attributes {
        let path = parent.clone().attribute(&attribute.name);
        let config_value = child(config, &attribute.name);
        let prior_value = child(prior, &attribute.name);

        let mut value = match (&config_value, &attribute.default) {
            (Dynamic::Null, Some(default)) => default.default_value(&path),
            (Dynamic::Null, None) if attribute.computed => Dynamic::Unknown,
            _ => config_value.clone(),
        };

        if let Some(nested) = &attribute.nested_type {
            if matches!(config_value, Dynamic::Map(_)) {
                value = plan_object(
                    &nested.attributes,
                    &path,
                    &prior_value,
                    &config_value,
                    has_prior_state,
                    change,
                );
            }
        }

        for modifier in &attribute.plan_modifiers {
            let response = modifier.modify(PlanModifierRequest {
                config_value: &config_value,
                state_value: &prior_value,
                plan_value: value,
                path: &path,
                has_prior_state,
            });
            value = response.plan_value;
            change.diagnostics.extend(response.diagnostics);
            if response.requires_replace && !change.requires_replace.contains(&path) {
                tracing::debug!("{} requires replacement", path);
                change.requires_replace.push(path.clone());
            }
        }

        planned.insert(attribute.name.clone(), value);
    }
    Dynamic::Map(planned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::StaticDefault;
    use crate::plan_modifier::{RequiresReplace, UseStateForUnknown};
    use crate::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
    use crate::validator::{OneOf, StringLength};

    fn schema() -> Schema {
        SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .validator(StringLength::between(1, 8))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .required()
                    .validator(OneOf::new(["development", "production"]))
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("disabled", AttributeType::Bool)
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::single_nested(
                    "theme",
                    vec![AttributeBuilder::new("logo_url", AttributeType::String)
                        .optional()
                        .validator(StringLength::at_most(10))
                        .build()],
                )
                .optional()
                .build(),
            )
            .build()
    }

    fn config(entries: Vec<(&str, Dynamic)>) -> DynamicValue {
        DynamicValue::new(Dynamic::object(entries))
    }

    #[test]
    fn validate_reports_missing_required() {
        let diags = validate_config(&schema(), &config(vec![("name", Dynamic::string("a"))]));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Missing required argument");
        assert_eq!(diags[0].attribute, Some(AttributePath::new("type")));
    }

    #[test]
    fn validate_runs_validators_and_recurses() {
        let diags = validate_config(
            &schema(),
            &config(vec![
                ("name", Dynamic::string("far-too-long-name")),
                ("type", Dynamic::string("staging")),
                (
                    "theme",
                    Dynamic::object([("logo_url", Dynamic::string("https://example.com/logo"))]),
                ),
            ]),
        );
        let paths: Vec<String> = diags
            .iter()
            .filter_map(|d| d.attribute.as_ref().map(ToString::to_string))
            .collect();
        assert_eq!(paths.len(), 3);
        assert!(paths.contains(&"name".to_string()));
        assert!(paths.contains(&"type".to_string()));
        assert!(paths.contains(&"theme.logo_url".to_string()));
    }

    #[test]
    fn validate_skips_unknown_values() {
        let diags = validate_config(
            &schema(),
            &config(vec![
                ("name", Dynamic::Unknown),
                ("type", Dynamic::string("production")),
            ]),
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn validate_rejects_configured_read_only_attribute() {
        let diags = validate_config(
            &schema(),
            &config(vec![
                ("id", Dynamic::string("x")),
                ("name", Dynamic::string("a")),
                ("type", Dynamic::string("production")),
            ]),
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute, Some(AttributePath::new("id")));
    }

    #[test]
    fn create_plan_applies_defaults_and_unknowns() {
        let change = plan_resource_change(
            &schema(),
            &DynamicValue::null(),
            &config(vec![
                ("name", Dynamic::string("orders")),
                ("type", Dynamic::string("production")),
            ]),
        );
        let plan = change.planned_state;
        assert!(plan.get(&AttributePath::new("id")).unwrap().is_unknown());
        assert!(!plan.get_bool(&AttributePath::new("disabled")).unwrap());
        assert!(plan.get(&AttributePath::new("theme")).unwrap().is_null());
        assert!(change.requires_replace.is_empty());
    }

    #[test]
    fn update_plan_keeps_state_and_flags_replacement() {
        let prior = config(vec![
            ("id", Dynamic::string("env_1")),
            ("name", Dynamic::string("orders")),
            ("type", Dynamic::string("development")),
            ("disabled", Dynamic::Bool(false)),
            ("theme", Dynamic::Null),
        ]);
        let change = plan_resource_change(
            &schema(),
            &prior,
            &config(vec![
                ("name", Dynamic::string("orders")),
                ("type", Dynamic::string("production")),
            ]),
        );
        assert_eq!(
            change.planned_state.get_string(&AttributePath::new("id")).unwrap(),
            "env_1"
        );
        assert_eq!(change.requires_replace, vec![AttributePath::new("type")]);
    }

    #[test]
    fn destroy_plan_is_null() {
        let change = plan_resource_change(&schema(), &DynamicValue::null(), &DynamicValue::null());
        assert!(change.planned_state.is_null());
    }
}
