use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::documents::State;
use crate::entity::{EntityBase, ListResponse, impl_entity, nested_rows};
use crate::meta::Meta;

/// Definition of a custom attribute on an entity type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDefinition {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default)]
    pub name: String,
    /// `string`, `long`, `time`, `file`, `double`, `boolean`, `text`, `link`,
    /// `customentity` or an entity type.
    #[serde(default, rename = "type")]
    pub attribute_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_entity_meta: Option<Meta>,
    #[serde(
        default,
        with = "crate::datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated: Option<NaiveDateTime>,
}

/// Response of `{endpoint}/metadata`: custom attributes, statuses and
/// sharing defaults of an entity type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMetadata {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default, deserialize_with = "attribute_rows")]
    pub attributes: Vec<AttributeDefinition>,
    #[serde(default)]
    pub states: Vec<State>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_shared: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Attributes arrive as an array, or as a `{meta}` object when collapsed.
fn attribute_rows<'de, D>(deserializer: D) -> Result<Vec<AttributeDefinition>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = nested_rows::deserialize(deserializer)?;
    Ok(list.map(ListResponse::into_rows).unwrap_or_default())
}

impl EntityMetadata {
    pub fn attribute_by_name(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    pub fn state_by_name(&self, name: &str) -> Option<&State> {
        self.states.iter().find(|state| state.name.as_deref() == Some(name))
    }
}

/// An account-defined directory (`entity/customentity`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomEntity {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_entity!(CustomEntity => "entity/customentity");
