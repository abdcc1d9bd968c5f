use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::{EntityBase, ListResponse, impl_entity};
use crate::meta::Meta;

/// A customer or supplier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counterparty {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_code: Option<String>,
    /// `legal`, `entrepreneur` or `individual`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kpp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ogrn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus_points: Option<i64>,
    #[serde(
        default,
        with = "crate::datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub birth_date: Option<NaiveDateTime>,
    #[serde(
        default,
        with = "crate::entity::nested_rows",
        skip_serializing_if = "crate::entity::nested_rows::is_collapsed"
    )]
    pub accounts: Option<ListResponse<BankAccount>>,
    #[serde(
        default,
        with = "crate::entity::nested_rows",
        skip_serializing_if = "crate::entity::nested_rows::is_collapsed"
    )]
    pub contactpersons: Option<ListResponse<ContactPerson>>,
    #[serde(
        default,
        with = "crate::entity::nested_rows",
        skip_serializing_if = "crate::entity::nested_rows::is_collapsed"
    )]
    pub notes: Option<ListResponse<Note>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPerson {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<Box<Counterparty>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Settlement account of a counterparty or organization.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correspondent_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Free-text event attached to a counterparty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        default,
        with = "crate::datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Note {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }
}

impl_entity!(Counterparty => "entity/counterparty");

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Counterparty;
    use crate::entity::Entity;

    #[test]
    fn reads_expanded_contact_persons() {
        let counterparty: Counterparty = serde_json::from_value(json!({
            "meta": {"href": "https://api.moysklad.ru/api/remap/1.2/entity/counterparty/cp-1", "type": "counterparty"},
            "name": "ACME",
            "companyType": "legal",
            "inn": "7700000000",
            "tags": ["wholesale"],
            "contactpersons": {
                "meta": {"href": "https://api.moysklad.ru/api/remap/1.2/entity/counterparty/cp-1/contactpersons", "size": 1},
                "rows": [{"name": "Jane", "phone": "+7 900 000 00 00"}]
            },
            "accounts": {"meta": {"href": "https://api.moysklad.ru/api/remap/1.2/entity/counterparty/cp-1/accounts", "size": 2}},
            "priceType": {"name": "Wholesale"}
        }))
        .expect("valid counterparty");

        assert_eq!(counterparty.entity_id().as_deref(), Some("cp-1"));
        assert_eq!(counterparty.company_type.as_deref(), Some("legal"));
        let contacts = counterparty.contactpersons.as_ref().expect("contacts");
        assert_eq!(contacts.rows[0].phone.as_deref(), Some("+7 900 000 00 00"));
        assert_eq!(counterparty.accounts.as_ref().and_then(|list| list.total()), Some(2));
        assert!(counterparty.extra.contains_key("priceType"));

        let body = serde_json::to_value(&counterparty).expect("serializable");
        assert!(body.get("accounts").is_none());
        assert_eq!(body["contactpersons"][0]["name"], json!("Jane"));
    }
}
