//! Static defaults for optional attributes
//!
//! A default is applied during planning when the attribute is null in
//! configuration:
//!
//! ```no_run
//! use tfplug::defaults::StaticDefault;
//! use tfplug::schema::{AttributeBuilder, AttributeType};
//!
//! let disabled = AttributeBuilder::new("disabled", AttributeType::Bool)
//!     .optional()
//!     .default(StaticDefault::bool(false))
//!     .build();
//! ```

use crate::schema::DefaultValue;
use crate::types::{AttributePath, Dynamic};

pub struct StaticDefault {
    value: Dynamic,
}

impl StaticDefault {
    pub fn new(value: Dynamic) -> Self {
        Self { value }
    }

    pub fn string(value: &str) -> Self {
        Self::new(Dynamic::String(value.to_string()))
    }

    pub fn number(value: f64) -> Self {
        Self::new(Dynamic::Number(value))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(Dynamic::Bool(value))
    }
}

impl DefaultValue for StaticDefault {
    fn description(&self) -> String {
        match &self.value {
            Dynamic::String(s) => format!("defaults to {:?}", s),
            Dynamic::Bool(b) => format!("defaults to {}", b),
            Dynamic::Number(n) => format!("defaults to {}", n),
            other => format!("defaults to a {} value", other.type_name()),
        }
    }

    fn default_value(&self, _path: &AttributePath) -> Dynamic {
        self.value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_defaults_produce_their_value() {
        let path = AttributePath::new("metadata");
        assert_eq!(
            StaticDefault::string("{}").default_value(&path),
            Dynamic::string("{}")
        );
        assert_eq!(
            StaticDefault::bool(false).default_value(&path),
            Dynamic::Bool(false)
        );
        assert_eq!(
            StaticDefault::number(30.0).default_value(&path),
            Dynamic::Number(30.0)
        );
    }

    #[test]
    fn description_names_value() {
        assert_eq!(StaticDefault::string("").description(), "defaults to \"\"");
        assert_eq!(StaticDefault::bool(true).description(), "defaults to true");
    }
}
