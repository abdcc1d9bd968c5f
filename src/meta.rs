use serde::{Deserialize, Serialize};

/// Self-describing link attached to every object returned by the API.
///
/// On list responses the same structure doubles as the pagination cursor
/// (`size`, `limit`, `offset`, `nextHref`, `previousHref`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default)]
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_href: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid_href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl Meta {
    /// Creates a meta with only `href` set. An empty href is valid for
    /// entities that do not exist remotely yet.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }

    /// Creates a reference meta with `type` and JSON media type set.
    pub fn reference(href: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            entity_type: Some(entity_type.into()),
            media_type: Some("application/json".to_owned()),
            ..Self::default()
        }
    }

    /// Whether a further page can be fetched from `next_href`.
    pub fn has_next(&self) -> bool {
        self.next_href.as_deref().is_some_and(|href| !href.is_empty())
    }
}

/// `{"meta": {...}}` reference used to link one entity from another.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub meta: Meta,
}

impl From<Meta> for EntityRef {
    fn from(meta: Meta) -> Self {
        Self { meta }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Meta;

    #[test]
    fn reads_pagination_fields() {
        let meta: Meta = serde_json::from_value(json!({
            "href": "https://api.moysklad.ru/api/remap/1.2/entity/product",
            "type": "product",
            "mediaType": "application/json",
            "size": 2500,
            "limit": 1000,
            "offset": 0,
            "nextHref": "https://api.moysklad.ru/api/remap/1.2/entity/product?offset=1000"
        }))
        .expect("valid meta");

        assert_eq!(meta.entity_type.as_deref(), Some("product"));
        assert_eq!(meta.size, Some(2500));
        assert!(meta.has_next());
    }

    #[test]
    fn omits_absent_fields_when_serialized() {
        let value = serde_json::to_value(Meta::reference("h", "store")).expect("serializable");
        assert_eq!(
            value,
            json!({"href": "h", "type": "store", "mediaType": "application/json"})
        );
        assert!(!Meta::new("").has_next());
    }
}
