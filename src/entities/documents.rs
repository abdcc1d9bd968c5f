use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::assortment::Assortment;
use super::counterparty::Counterparty;
use super::organization::{Organization, Store};
use crate::config::DEFAULT_BASE_URL;
use crate::entity::{Entity, EntityBase, ListResponse, impl_entity};
use crate::meta::Meta;

/// Fields every document carries, flattened into each document struct.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        with = "crate::datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub moment: Option<NaiveDateTime>,
    /// Whether the document is posted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub printed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(
        default,
        with = "crate::datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub deleted: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<Organization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<Counterparty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Value>,
}

/// One line of a document: an assortment item with quantity and price.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    /// Price per unit in kopecks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assortment: Option<Assortment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipped: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve: Option<Decimal>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Position {
    /// New position for the assortment item referenced by `assortment`.
    pub fn new(assortment: Meta, quantity: Decimal, price: Decimal) -> Self {
        Self {
            quantity: Some(quantity),
            price: Some(price),
            assortment: Some(Assortment {
                base: EntityBase {
                    meta: Some(assortment),
                    ..EntityBase::default()
                },
                ..Assortment::default()
            }),
            ..Self::default()
        }
    }

    /// Position id, falling back to the last segment of `meta.href`.
    pub fn position_id(&self) -> Option<String> {
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            return Some(id.to_owned());
        }
        let href = self.meta.as_ref()?.href.as_str();
        crate::entity::id_from_href(href, "positions")
    }
}

/// Workflow status of a document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<i64>,
    /// `Regular`, `Successful` or `Unsuccessful`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
}

impl State {
    /// Href of a status defined on the given document type, e.g. `customerorder`.
    pub fn href(entity_type: &str, state_id: &str) -> String {
        format!("{DEFAULT_BASE_URL}/entity/{entity_type}/metadata/states/{state_id}")
    }

    /// Status reference suitable for assigning to a document.
    pub fn reference(entity_type: &str, state_id: &str) -> Self {
        Self {
            meta: Some(Meta::reference(Self::href(entity_type, state_id), "state")),
            ..Self::default()
        }
    }
}

/// A document with positions.
///
/// Repositories of these types get the position operations.
pub trait Document: Entity {
    /// Nested fields expanded when listing positions.
    const POSITIONS_EXPAND: Option<&'static str> = None;

    fn fields(&self) -> &DocumentFields;

    fn fields_mut(&mut self) -> &mut DocumentFields;

    fn positions(&self) -> Option<&ListResponse<Position>>;
}

macro_rules! impl_document {
    ($($document:ty $(=> $expand:literal)?),+ $(,)?) => {
        $(
            impl Document for $document {
                $(const POSITIONS_EXPAND: Option<&'static str> = Some($expand);)?

                fn fields(&self) -> &DocumentFields {
                    &self.document
                }

                fn fields_mut(&mut self) -> &mut DocumentFields {
                    &mut self.document
                }

                fn positions(&self) -> Option<&ListResponse<Position>> {
                    self.positions.as_ref()
                }
            }
        )+
    };
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerOrder {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(flatten)]
    pub document: DocumentFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<Store>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment_address: Option<String>,
    #[serde(
        default,
        with = "crate::datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub delivery_planned_moment: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_included: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_sum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payed_sum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipped_sum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoiced_sum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_sum: Option<Decimal>,
    #[serde(
        default,
        with = "crate::entity::nested_rows",
        skip_serializing_if = "crate::entity::nested_rows::is_collapsed"
    )]
    pub positions: Option<ListResponse<Position>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Order placed with a supplier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(flatten)]
    pub document: DocumentFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<Store>,
    #[serde(
        default,
        with = "crate::datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub delivery_planned_moment: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_included: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_sum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payed_sum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipped_sum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_sum: Option<Decimal>,
    #[serde(
        default,
        with = "crate::entity::nested_rows",
        skip_serializing_if = "crate::entity::nested_rows::is_collapsed"
    )]
    pub positions: Option<ListResponse<Position>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Invoice issued to a buyer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceOut {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(flatten)]
    pub document: DocumentFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<Store>,
    #[serde(
        default,
        with = "crate::datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_planned_moment: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_order: Option<Box<CustomerOrder>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_included: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_sum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payed_sum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipped_sum: Option<Decimal>,
    #[serde(
        default,
        with = "crate::entity::nested_rows",
        skip_serializing_if = "crate::entity::nested_rows::is_collapsed"
    )]
    pub positions: Option<ListResponse<Position>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Shipment to a buyer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demand {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(flatten)]
    pub document: DocumentFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<Store>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_order: Option<Box<CustomerOrder>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payed_sum: Option<Decimal>,
    #[serde(
        default,
        with = "crate::entity::nested_rows",
        skip_serializing_if = "crate::entity::nested_rows::is_collapsed"
    )]
    pub positions: Option<ListResponse<Position>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Goods receipt from a supplier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supply {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(flatten)]
    pub document: DocumentFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<Store>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_number: Option<String>,
    #[serde(
        default,
        with = "crate::datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub incoming_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payed_sum: Option<Decimal>,
    #[serde(
        default,
        with = "crate::entity::nested_rows",
        skip_serializing_if = "crate::entity::nested_rows::is_collapsed"
    )]
    pub positions: Option<ListResponse<Position>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Cash receipt order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashIn {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(flatten)]
    pub document: DocumentFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_sum: Option<Decimal>,
    /// Documents this payment settles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Cash disbursement order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashOut {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(flatten)]
    pub document: DocumentFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_sum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_item: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Incoming bank payment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIn {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(flatten)]
    pub document: DocumentFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_number: Option<String>,
    #[serde(
        default,
        with = "crate::datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub incoming_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_sum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Outgoing bank payment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOut {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(flatten)]
    pub document: DocumentFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_sum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_item: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_entity!(
    CustomerOrder => "entity/customerorder",
    PurchaseOrder => "entity/purchaseorder",
    InvoiceOut => "entity/invoiceout",
    Demand => "entity/demand",
    Supply => "entity/supply",
    CashIn => "entity/cashin",
    CashOut => "entity/cashout",
    PaymentIn => "entity/paymentin",
    PaymentOut => "entity/paymentout",
);

impl_document!(
    CustomerOrder => "assortment",
    PurchaseOrder,
    InvoiceOut,
    Demand,
    Supply,
);

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{CustomerOrder, Document, Position, PurchaseOrder, State};
    use crate::entity::Entity;
    use crate::meta::Meta;

    #[test]
    fn reads_order_graph() {
        let order: CustomerOrder = serde_json::from_value(json!({
            "meta": {"href": "https://api.moysklad.ru/api/remap/1.2/entity/customerorder/o-1", "type": "customerorder"},
            "name": "00042",
            "moment": "2024-05-01 12:30:00.000",
            "applicable": true,
            "sum": 125000,
            "agent": {"meta": {"href": "https://api.moysklad.ru/api/remap/1.2/entity/counterparty/cp-1"}, "name": "ACME"},
            "organization": {"meta": {"href": "https://api.moysklad.ru/api/remap/1.2/entity/organization/org-1"}},
            "state": {"name": "New", "stateType": "Regular"},
            "positions": {
                "meta": {"href": "https://api.moysklad.ru/api/remap/1.2/entity/customerorder/o-1/positions", "size": 1},
                "rows": [{
                    "id": "pos-1",
                    "quantity": 2,
                    "price": 62500,
                    "assortment": {"meta": {"href": "https://api.moysklad.ru/api/remap/1.2/entity/product/p-1", "type": "product"}}
                }]
            },
            "salesChannel": {"meta": {"href": "https://api.moysklad.ru/api/remap/1.2/entity/saleschannel/s-1"}}
        }))
        .expect("valid order");

        assert_eq!(order.entity_id().as_deref(), Some("o-1"));
        let fields = order.fields();
        assert_eq!(fields.sum, Some(Decimal::from(125_000)));
        assert_eq!(
            fields.moment,
            NaiveDate::from_ymd_opt(2024, 5, 1).and_then(|date| date.and_hms_opt(12, 30, 0))
        );
        assert_eq!(
            fields.agent.as_ref().and_then(Entity::entity_id).as_deref(),
            Some("cp-1")
        );
        assert_eq!(fields.state.as_ref().and_then(|state| state.name.as_deref()), Some("New"));

        let positions = order.positions().expect("positions");
        assert_eq!(positions.rows[0].quantity, Some(Decimal::from(2)));
        assert!(positions.rows[0].assortment.as_ref().is_some_and(|item| item.is_product()));
        assert!(order.extra.contains_key("salesChannel"));
    }

    #[test]
    fn only_customer_orders_expand_positions() {
        assert_eq!(CustomerOrder::POSITIONS_EXPAND, Some("assortment"));
        assert_eq!(PurchaseOrder::POSITIONS_EXPAND, None);
    }

    #[test]
    fn new_position_references_assortment() {
        let position = Position::new(
            Meta::reference("https://x/entity/product/p-1", "product"),
            Decimal::from(3),
            Decimal::from(1000),
        );
        let body = serde_json::to_value(&position).expect("serializable");
        assert_eq!(body["quantity"], json!(3.0));
        assert_eq!(body["price"], json!(1000.0));
        assert_eq!(body["assortment"]["meta"]["type"], json!("product"));
        assert!(body.get("id").is_none());
    }

    #[test]
    fn position_id_falls_back_to_href() {
        let position = Position {
            meta: Some(Meta::new("https://x/entity/customerorder/o-1/positions/pos-9")),
            ..Position::default()
        };
        assert_eq!(position.position_id().as_deref(), Some("pos-9"));
    }

    #[test]
    fn state_reference_points_at_document_metadata() {
        let state = State::reference("customerorder", "st-1");
        let meta = state.meta.expect("meta");
        assert_eq!(
            meta.href,
            "https://api.moysklad.ru/api/remap/1.2/entity/customerorder/metadata/states/st-1"
        );
        assert_eq!(meta.entity_type.as_deref(), Some("state"));
    }
}
