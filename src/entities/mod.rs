//! Typed models of the API's resources.

pub mod assortment;
pub mod counterparty;
pub mod documents;
pub mod metadata;
pub mod organization;
pub mod products;
pub mod stock;
pub mod webhook;

pub use assortment::{Assortment, AssortmentSettings, Bundle, BundleComponent, Service};
pub use counterparty::{BankAccount, ContactPerson, Counterparty, Note};
pub use documents::{
    CashIn, CashOut, CustomerOrder, Demand, Document, DocumentFields, InvoiceOut, PaymentIn,
    PaymentOut, Position, PurchaseOrder, State, Supply,
};
pub use metadata::{AttributeDefinition, CustomEntity, EntityMetadata};
pub use organization::{Employee, Group, Organization, Store};
pub use products::{Barcode, Currency, Price, PriceType, Product, ProductFolder, Uom, Variant};
pub use stock::{CurrentStock, StockByStore, StockRow, StoreStock};
pub use webhook::{Webhook, WebhookStock};
