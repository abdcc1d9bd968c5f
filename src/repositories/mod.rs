//! Named repositories and the operations specific to each entity type.

mod assortment;
mod counterparty;
mod documents;
mod organization;
mod products;
mod stock;

use crate::entities::{
    Assortment, Bundle, CashIn, CashOut, Counterparty, Currency, CustomerOrder, Demand, Employee,
    InvoiceOut, Organization, PaymentIn, PaymentOut, PriceType, Product, ProductFolder,
    PurchaseOrder, Service, Store, Supply, Uom, Variant, Webhook, WebhookStock,
};
use crate::repository::EntityRepository;

pub use stock::StockReportRepository;

pub type ProductRepository = EntityRepository<Product>;
pub type ProductFolderRepository = EntityRepository<ProductFolder>;
pub type CurrencyRepository = EntityRepository<Currency>;
pub type PriceTypeRepository = EntityRepository<PriceType>;
pub type VariantRepository = EntityRepository<Variant>;
pub type UomRepository = EntityRepository<Uom>;

pub type AssortmentRepository = EntityRepository<Assortment>;
pub type ServiceRepository = EntityRepository<Service>;
pub type BundleRepository = EntityRepository<Bundle>;

pub type CustomerOrderRepository = EntityRepository<CustomerOrder>;
pub type PurchaseOrderRepository = EntityRepository<PurchaseOrder>;
pub type InvoiceOutRepository = EntityRepository<InvoiceOut>;
pub type DemandRepository = EntityRepository<Demand>;
pub type SupplyRepository = EntityRepository<Supply>;
pub type CashInRepository = EntityRepository<CashIn>;
pub type CashOutRepository = EntityRepository<CashOut>;
pub type PaymentInRepository = EntityRepository<PaymentIn>;
pub type PaymentOutRepository = EntityRepository<PaymentOut>;

pub type CounterpartyRepository = EntityRepository<Counterparty>;
pub type OrganizationRepository = EntityRepository<Organization>;
pub type EmployeeRepository = EntityRepository<Employee>;
pub type StoreRepository = EntityRepository<Store>;

pub type WebhookRepository = EntityRepository<Webhook>;
pub type WebhookStockRepository = EntityRepository<WebhookStock>;

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use crate::entity::Entity;
    use crate::repository::EntityRepository;
    use crate::{ApiClient, ClientConfig};

    pub(crate) fn mock_api(server: &mockito::ServerGuard) -> ApiClient {
        let config = ClientConfig::new("token")
            .with_base_url(server.url())
            .with_retry_delay(Duration::from_millis(1));
        ApiClient::new(&config).expect("valid config")
    }

    pub(crate) fn repository<T: Entity>(server: &mockito::ServerGuard) -> EntityRepository<T> {
        EntityRepository::new(mock_api(server))
    }
}
