use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::counterparty::BankAccount;
use crate::entity::{EntityBase, ListResponse, impl_entity};

/// One of the account's own legal entities.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_code: Option<String>,
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
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chief_accountant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(
        default,
        with = "crate::entity::nested_rows",
        skip_serializing_if = "crate::entity::nested_rows::is_collapsed"
    )]
    pub accounts: Option<ListResponse<BankAccount>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_fio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Group>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Department that owns entities for sharing rules.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Warehouse.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<Store>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_entity!(
    Organization => "entity/organization",
    Employee => "entity/employee",
    Group => "entity/group",
    Store => "entity/store",
);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Employee, Store};
    use crate::entity::Entity;

    #[test]
    fn employee_keeps_group_and_permissions() {
        let employee: Employee = serde_json::from_value(json!({
            "meta": {"href": "https://api.moysklad.ru/api/remap/1.2/entity/employee/e-1", "type": "employee"},
            "uid": "admin@acme",
            "fullName": "Ivan Petrov",
            "group": {"meta": {"href": "https://api.moysklad.ru/api/remap/1.2/entity/group/g-1"}, "index": 0},
            "permissions": {"currency": {"view": "ALL"}}
        }))
        .expect("valid employee");

        assert_eq!(employee.entity_id().as_deref(), Some("e-1"));
        assert_eq!(employee.group.as_ref().and_then(|group| group.index), Some(0));
        assert!(employee.extra.contains_key("permissions"));
    }

    #[test]
    fn store_reference_points_at_store_endpoint() {
        let meta = Store::meta_for("s-1");
        assert_eq!(meta.href, "https://api.moysklad.ru/api/remap/1.2/entity/store/s-1");
        assert_eq!(meta.entity_type.as_deref(), Some("store"));
    }
}
