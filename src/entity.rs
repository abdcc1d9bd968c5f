use chrono::NaiveDateTime;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ClientError;
use crate::attributes::{Attribute, AttributeCollection};
use crate::config::DEFAULT_BASE_URL;
use crate::meta::{EntityRef, Meta};

/// Fields shared by every entity. Flattened into each entity struct.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityBase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<AttributeCollection>,
    #[serde(
        default,
        with = "crate::datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created: Option<NaiveDateTime>,
    #[serde(
        default,
        with = "crate::datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EntityBase {
    /// Base for a new entity that only has a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// A top-level resource with its own collection endpoint.
///
/// Implementors are plain serde structs: the base fields are flattened in,
/// typed fields cover what callers usually touch, and an `extra` map keeps
/// everything else so fetched entities round-trip unchanged.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection path relative to the API root, e.g. `entity/product`.
    const ENDPOINT: &'static str;

    fn base(&self) -> &EntityBase;

    fn base_mut(&mut self) -> &mut EntityBase;

    /// Value of `meta.type` for this entity, e.g. `product`.
    fn type_name() -> &'static str {
        Self::ENDPOINT.rsplit('/').next().unwrap_or(Self::ENDPOINT)
    }

    /// Absolute href of the entity with the given id on the public API.
    fn href(id: &str) -> String {
        format!("{DEFAULT_BASE_URL}/{}/{id}", Self::ENDPOINT)
    }

    /// Reference meta for the entity with the given id.
    fn meta_for(id: &str) -> Meta {
        Meta::reference(Self::href(id), Self::type_name())
    }

    /// Absolute href of a custom attribute definition of this entity type.
    fn attribute_href(attribute_id: &str) -> String {
        format!(
            "{DEFAULT_BASE_URL}/{}/metadata/attributes/{attribute_id}",
            Self::ENDPOINT
        )
    }

    fn name(&self) -> Option<&str> {
        self.base().name.as_deref()
    }

    /// Returns the explicit id, or the one embedded in `meta.href`.
    fn entity_id(&self) -> Option<String> {
        let base = self.base();
        if let Some(id) = base.id.as_deref().filter(|id| !id.is_empty()) {
            return Some(id.to_owned());
        }
        let href = base.meta.as_ref()?.href.as_str();
        id_from_href(href, Self::ENDPOINT)
    }

    /// `{"meta": ...}` reference to this entity, if it can be addressed.
    fn to_ref(&self) -> Option<EntityRef> {
        if let Some(meta) = self.base().meta.as_ref().filter(|meta| !meta.href.is_empty()) {
            return Some(EntityRef::from(meta.clone()));
        }
        self.entity_id().map(|id| EntityRef::from(Self::meta_for(&id)))
    }

    /// Appends a custom attribute value, linking it to this entity type's
    /// attribute metadata.
    fn add_attribute(&mut self, attribute_id: &str, value: impl Into<Value>) -> &mut Attribute {
        let meta = attribute_meta::<Self>(attribute_id);
        self.base_mut()
            .attributes
            .get_or_insert_with(AttributeCollection::new)
            .add(attribute_id, value.into(), Some(meta))
    }

    /// Updates a custom attribute value, adding it when missing.
    fn upsert_attribute(&mut self, attribute_id: &str, value: impl Into<Value>) -> &mut Attribute {
        let meta = attribute_meta::<Self>(attribute_id);
        self.base_mut()
            .attributes
            .get_or_insert_with(AttributeCollection::new)
            .upsert(attribute_id, value.into(), Some(meta))
    }

    fn remove_attribute(&mut self, attribute_id: &str) -> Option<Attribute> {
        self.base_mut().attributes.as_mut()?.remove(attribute_id)
    }

    fn attribute_value(&self, attribute_id: &str) -> Option<&Value> {
        self.base().attributes.as_ref()?.get_value(attribute_id)
    }
}

fn attribute_meta<T: Entity + ?Sized>(attribute_id: &str) -> Meta {
    Meta::reference(T::attribute_href(attribute_id), "attributemetadata")
}

/// Extracts an entity id from an href.
///
/// Looks for the endpoint's segments inside the href path and takes the
/// segment right after them; falls back to the last path segment.
pub fn id_from_href(href: &str, endpoint: &str) -> Option<String> {
    let path = match Url::parse(href) {
        Ok(url) => url.path().to_owned(),
        Err(_) => href.split(['?', '#']).next().unwrap_or_default().to_owned(),
    };
    let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
    let endpoint_parts: Vec<&str> = endpoint.split('/').filter(|part| !part.is_empty()).collect();

    if !endpoint_parts.is_empty() {
        let found = parts
            .windows(endpoint_parts.len())
            .enumerate()
            .filter(|(_, window)| *window == endpoint_parts.as_slice())
            .find_map(|(index, _)| parts.get(index + endpoint_parts.len()));
        if let Some(id) = found {
            return Some((*id).to_owned());
        }
    }

    parts.last().map(|part| (*part).to_owned())
}

/// A page of rows from a collection endpoint.
///
/// `rows` defaults to empty, so the same type also reads collapsed nested
/// collections such as an order's `positions` that only carry `meta`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default = "Vec::new")]
    pub rows: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl<T> ListResponse<T> {
    pub fn has_next(&self) -> bool {
        self.meta.has_next()
    }

    /// Total number of matching rows across all pages, when reported.
    pub fn total(&self) -> Option<u64> {
        self.meta.size
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }
}

/// `#[serde(with = "crate::entity::nested_rows")]` for nested collections
/// such as document positions.
///
/// The API returns them as a `{meta, rows}` object, or only `{meta}` when not
/// expanded, but accepts a plain array on writes. A collapsed collection is
/// skipped on writes so updates leave the remote rows untouched.
pub(crate) mod nested_rows {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::ListResponse;
    use crate::meta::Meta;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Nested<T> {
        Rows(Vec<T>),
        List(ListResponse<T>),
    }

    #[allow(clippy::ref_option)]
    pub fn is_collapsed<T>(value: &Option<ListResponse<T>>) -> bool {
        value.as_ref().is_none_or(|list| list.rows.is_empty())
    }

    #[allow(clippy::ref_option)]
    pub fn serialize<S, T>(value: &Option<ListResponse<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(list) => list.rows.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<ListResponse<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        let nested = Option::<Nested<T>>::deserialize(deserializer)?;
        Ok(nested.map(|nested| match nested {
            Nested::Rows(rows) => ListResponse {
                meta: Meta::default(),
                rows,
                context: None,
            },
            Nested::List(list) => list,
        }))
    }
}

/// Reads rows from responses that may be a JSON array, a list object with
/// `rows`, a single object, or empty.
pub(crate) fn rows_from_value<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, ClientError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(ClientError::from))
            .collect(),
        Value::Object(mut object) => match object.remove("rows") {
            Some(rows) => Ok(serde_json::from_value(rows)?),
            None => Ok(vec![serde_json::from_value(Value::Object(object))?]),
        },
        other => Err(ClientError::UnexpectedResponse(format!(
            "expected an object or array, got {other}"
        ))),
    }
}

/// Reads the first row of a response that may be an array or a single object.
pub(crate) fn first_from_value<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    rows_from_value(value)?
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::UnexpectedResponse("response contained no rows".to_owned()))
}

/// Implements [`Entity`] for structs with a flattened `base: EntityBase` field.
macro_rules! impl_entity {
    ($($entity:ty => $endpoint:literal),+ $(,)?) => {
        $(
            impl $crate::entity::Entity for $entity {
                const ENDPOINT: &'static str = $endpoint;

                fn base(&self) -> &$crate::entity::EntityBase {
                    &self.base
                }

                fn base_mut(&mut self) -> &mut $crate::entity::EntityBase {
                    &mut self.base
                }
            }
        )+
    };
}

pub(crate) use impl_entity;
