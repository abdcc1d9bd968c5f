use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::{EntityBase, impl_entity};
use crate::meta::Meta;

/// Subscription to entity change events.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    #[serde(flatten)]
    pub base: EntityBase,
    /// `CREATE`, `UPDATE`, `DELETE` or `PROCESSED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_application: Option<Meta>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Webhook {
    /// New subscription posting `entity_type` events to `url`.
    pub fn new(entity_type: impl Into<String>, action: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            entity_type: Some(entity_type.into()),
            action: Some(action.into()),
            url: Some(url.into()),
            ..Self::default()
        }
    }
}

/// Subscription to stock balance changes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookStock {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_entity!(
    Webhook => "entity/webhook",
    WebhookStock => "entity/webhookstock",
);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Webhook;

    #[test]
    fn new_webhook_body() {
        let body = serde_json::to_value(Webhook::new("customerorder", "CREATE", "https://hooks.example/ms"))
            .expect("serializable");
        assert_eq!(
            body,
            json!({"action": "CREATE", "entityType": "customerorder", "url": "https://hooks.example/ms"})
        );
    }
}
