use async_graphql::*;

use crate::filters;

/// A `json_ext` attribute a custom filter may target.
#[derive(SimpleObject, Clone, Debug)]
pub struct CustomFilterDefinition {
    pub field: String,
    pub value_type: String,
    pub lookups: Vec<String>,
}

impl From<filters::CustomFilterDefinition> for CustomFilterDefinition {
    fn from(definition: filters::CustomFilterDefinition) -> Self {
        Self {
            field: definition.field,
            value_type: definition.value_type.as_str().to_string(),
            lookups: definition
                .lookups
                .iter()
                .map(|lookup| lookup.as_str().to_string())
                .collect(),
        }
    }
}
