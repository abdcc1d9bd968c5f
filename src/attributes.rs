use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::meta::Meta;

/// Value of one account-defined custom field on an entity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_entity_meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show: Option<bool>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
}

/// Ordered list of [`Attribute`]s with lookup by attribute id.
///
/// Serialized as a plain JSON array.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeCollection(Vec<Attribute>);

impl AttributeCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }

    pub fn push(&mut self, attribute: Attribute) {
        self.0.push(attribute);
    }

    pub fn get(&self, attribute_id: &str) -> Option<&Attribute> {
        self.0
            .iter()
            .find(|attribute| attribute.id.as_deref() == Some(attribute_id))
    }

    pub fn get_mut(&mut self, attribute_id: &str) -> Option<&mut Attribute> {
        self.0
            .iter_mut()
            .find(|attribute| attribute.id.as_deref() == Some(attribute_id))
    }

    /// Returns the value of an attribute, if present.
    pub fn get_value(&self, attribute_id: &str) -> Option<&Value> {
        self.get(attribute_id).map(|attribute| &attribute.value)
    }

    /// Appends a new attribute with the given value and metadata link.
    pub fn add(&mut self, attribute_id: &str, value: Value, meta: Option<Meta>) -> &mut Attribute {
        self.0.push(Attribute {
            meta,
            id: Some(attribute_id.to_owned()),
            value,
            ..Attribute::default()
        });
        let last = self.0.len() - 1;
        &mut self.0[last]
    }

    /// Replaces the value of an existing attribute or appends a new one.
    ///
    /// `meta` is only applied when the attribute has none yet.
    pub fn upsert(&mut self, attribute_id: &str, value: Value, meta: Option<Meta>) -> &mut Attribute {
        match self.0.iter().position(|attribute| attribute.id.as_deref() == Some(attribute_id)) {
            Some(index) => {
                let attribute = &mut self.0[index];
                attribute.value = value;
                if attribute.meta.is_none() {
                    attribute.meta = meta;
                }
                attribute
            }
            None => self.add(attribute_id, value, meta),
        }
    }

    /// Removes and returns the attribute with the given id.
    pub fn remove(&mut self, attribute_id: &str) -> Option<Attribute> {
        let index = self
            .0
            .iter()
            .position(|attribute| attribute.id.as_deref() == Some(attribute_id))?;
        Some(self.0.remove(index))
    }
}

impl From<Vec<Attribute>> for AttributeCollection {
    fn from(attributes: Vec<Attribute>) -> Self {
        Self(attributes)
    }
}

impl IntoIterator for AttributeCollection {
    type Item = Attribute;
    type IntoIter = std::vec::IntoIter<Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a AttributeCollection {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::AttributeCollection;
    use crate::meta::Meta;

    #[test]
    fn reads_plain_array() {
        let attributes: AttributeCollection = serde_json::from_value(json!([
            {"id": "a1", "name": "Color", "type": "string", "value": "red"},
            {"id": "a2", "name": "Weight", "type": "double", "value": 1.5}
        ]))
        .expect("valid attributes");

        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes.get_value("a1"), Some(&json!("red")));
        assert_eq!(
            attributes.get("a2").and_then(|a| a.attribute_type.as_deref()),
            Some("double")
        );
        assert!(attributes.get("missing").is_none());
    }

    #[test]
    fn upsert_updates_existing_and_keeps_meta() {
        let mut attributes = AttributeCollection::new();
        attributes.add("a1", json!(1), Some(Meta::new("first")));
        attributes.upsert("a1", json!(2), Some(Meta::new("second")));

        assert_eq!(attributes.len(), 1);
        let attribute = attributes.get("a1").expect("present");
        assert_eq!(attribute.value, json!(2));
        assert_eq!(attribute.meta.as_ref().map(|m| m.href.as_str()), Some("first"));
    }

    #[test]
    fn upsert_fills_missing_meta_and_appends_new() {
        let mut attributes: AttributeCollection =
            serde_json::from_value(json!([{"id": "a1", "value": true}])).expect("valid");
        attributes.upsert("a1", json!(false), Some(Meta::new("filled")));
        attributes.upsert("a2", json!("x"), None);

        assert_eq!(attributes.get("a1").and_then(|a| a.meta.clone()), Some(Meta::new("filled")));
        assert_eq!(attributes.get_value("a2"), Some(&json!("x")));
    }

    #[test]
    fn remove_returns_removed_attribute() {
        let mut attributes = AttributeCollection::new();
        attributes.add("a1", json!("v"), None);

        let removed = attributes.remove("a1").expect("removed");
        assert_eq!(removed.value, json!("v"));
        assert!(attributes.is_empty());
        assert!(attributes.remove("a1").is_none());
    }
}
