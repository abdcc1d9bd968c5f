//! Rows of the stock reports. These are read-only projections, not entities.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::meta::Meta;

/// One assortment item in the `report/stock/all` report.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_transit: Option<Decimal>,
    /// Stock minus reserve plus in transit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    /// Cost price per unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uom: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Balance of one item in one store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_transit: Option<Decimal>,
}

/// One assortment item in the `report/stock/bystore` report.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockByStore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default)]
    pub stock_by_store: Vec<StoreStock>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StockByStore {
    /// Balance in the store with the given href, if the item is held there.
    pub fn in_store(&self, store_href: &str) -> Option<&StoreStock> {
        self.stock_by_store.iter().find(|row| {
            row.meta
                .as_ref()
                .is_some_and(|meta| meta.href.split('?').next() == Some(store_href))
        })
    }
}

/// Entry of `report/stock/all/current`: the live balance of one item.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStock {
    #[serde(default)]
    pub assortment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    #[serde(default)]
    pub stock: Decimal,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{StockByStore, StockRow};

    #[test]
    fn reads_report_row() {
        let row: StockRow = serde_json::from_value(json!({
            "meta": {"href": "https://api.moysklad.ru/api/remap/1.2/entity/product/p-1?expand=supplier", "type": "product"},
            "name": "Green tea",
            "stock": 12.5,
            "reserve": 2,
            "inTransit": 0,
            "quantity": 10.5,
            "price": 4500,
            "salePrice": 9900,
            "stockDays": 7,
            "image": {"meta": {"href": "https://x/image"}}
        }))
        .expect("valid row");

        assert_eq!(row.stock, Some(Decimal::new(125, 1)));
        assert_eq!(row.quantity, Some(Decimal::new(105, 1)));
        assert_eq!(row.stock_days, Some(7));
        assert!(row.extra.contains_key("image"));
    }

    #[test]
    fn finds_balance_by_store_href() {
        let row: StockByStore = serde_json::from_value(json!({
            "meta": {"href": "https://x/entity/product/p-1"},
            "stockByStore": [
                {"meta": {"href": "https://x/entity/store/s-1"}, "name": "Main", "stock": 5, "reserve": 1, "inTransit": 0},
                {"meta": {"href": "https://x/entity/store/s-2"}, "name": "Outlet", "stock": 0}
            ]
        }))
        .expect("valid row");

        let main = row.in_store("https://x/entity/store/s-1").expect("held in main");
        assert_eq!(main.stock, Some(Decimal::from(5)));
        assert!(row.in_store("https://x/entity/store/s-3").is_none());
    }
}
