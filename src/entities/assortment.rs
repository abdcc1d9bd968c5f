use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::products::{Barcode, Price, ProductFolder, Uom};
use crate::entity::{EntityBase, ListResponse, impl_entity};
use crate::meta::Meta;

/// Any sellable item: a product, variant, service or bundle.
///
/// The concrete kind is the `meta.type` of the row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assortment {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_transit: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_folder: Option<ProductFolder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uom: Option<Uom>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_prices: Option<Vec<Price>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcodes: Option<Vec<Barcode>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Assortment {
    /// The row's `meta.type`, e.g. `product` or `variant`.
    pub fn kind(&self) -> Option<&str> {
        self.base.meta.as_ref()?.entity_type.as_deref()
    }

    pub fn is_product(&self) -> bool {
        self.kind() == Some("product")
    }

    pub fn is_variant(&self) -> bool {
        self.kind() == Some("variant")
    }

    pub fn is_service(&self) -> bool {
        self.kind() == Some("service")
    }

    pub fn is_bundle(&self) -> bool {
        self.kind() == Some("bundle")
    }
}

/// Account-wide assortment settings (`entity/assortment/settings`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssortmentSettings {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode_rules: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_code_rules: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uom: Option<Uom>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_prices: Option<Vec<Price>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_item_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One line of a bundle: an assortment item and how many of it the kit holds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assortment: Option<Assortment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BundleComponent {
    /// Component referencing an assortment item by meta.
    pub fn new(assortment: Meta, quantity: Decimal) -> Self {
        Self {
            assortment: Some(Assortment {
                base: EntityBase {
                    meta: Some(assortment),
                    ..EntityBase::default()
                },
                ..Assortment::default()
            }),
            quantity: Some(quantity),
            ..Self::default()
        }
    }
}

/// A kit sold as one item and assembled from components.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    #[serde(flatten)]
    pub base: EntityBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_folder: Option<ProductFolder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_prices: Option<Vec<Price>>,
    #[serde(
        default,
        with = "crate::entity::nested_rows",
        skip_serializing_if = "crate::entity::nested_rows::is_collapsed"
    )]
    pub components: Option<ListResponse<BundleComponent>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_entity!(
    Assortment => "entity/assortment",
    Service => "entity/service",
    Bundle => "entity/bundle",
);
