use serde_json::Value;

use crate::entities::CustomEntity;
use crate::entity::Entity;
use crate::query::{QueryBuilder, params_of};
use crate::repositories::{
    AssortmentRepository, BundleRepository, CashInRepository, CashOutRepository,
    CounterpartyRepository, CurrencyRepository, CustomerOrderRepository, DemandRepository,
    EmployeeRepository, InvoiceOutRepository, OrganizationRepository, PaymentInRepository,
    PaymentOutRepository, PriceTypeRepository, ProductFolderRepository, ProductRepository,
    PurchaseOrderRepository, ServiceRepository, StockReportRepository, StoreRepository,
    SupplyRepository, UomRepository, VariantRepository, WebhookRepository, WebhookStockRepository,
};
use crate::repository::{EntityRepository, decode, decode_rows, encode_path_segment};
use crate::{ApiClient, ClientConfig, ClientError};

/// Entry point: one transport shared by a repository per entity type.
///
/// ```no_run
/// use moysklad_client::{ClientConfig, MoySklad};
///
/// # async fn run() -> Result<(), moysklad_client::ClientError> {
/// let client = MoySklad::new(&ClientConfig::new("token"))?;
/// let page = client.products.find_all(None).await?;
/// println!("{} products", page.total().unwrap_or_default());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct MoySklad {
    api: ApiClient,

    pub products: ProductRepository,
    pub product_folders: ProductFolderRepository,
    pub currencies: CurrencyRepository,
    pub price_types: PriceTypeRepository,
    pub variants: VariantRepository,
    pub uoms: UomRepository,

    pub assortment: AssortmentRepository,
    pub services: ServiceRepository,
    pub bundles: BundleRepository,

    pub customer_orders: CustomerOrderRepository,
    pub purchase_orders: PurchaseOrderRepository,
    pub invoices_out: InvoiceOutRepository,
    pub demands: DemandRepository,
    pub supplies: SupplyRepository,
    pub cash_ins: CashInRepository,
    pub cash_outs: CashOutRepository,
    pub payment_ins: PaymentInRepository,
    pub payment_outs: PaymentOutRepository,

    pub counterparties: CounterpartyRepository,
    pub organizations: OrganizationRepository,
    pub employees: EmployeeRepository,
    pub stores: StoreRepository,

    pub webhooks: WebhookRepository,
    pub webhook_stocks: WebhookStockRepository,

    pub stock: StockReportRepository,
}

impl MoySklad {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::from_api(ApiClient::new(config)?))
    }

    /// Builds every repository on top of an existing transport.
    pub fn from_api(api: ApiClient) -> Self {
        Self {
            products: EntityRepository::new(api.clone()),
            product_folders: EntityRepository::new(api.clone()),
            currencies: EntityRepository::new(api.clone()),
            price_types: EntityRepository::new(api.clone()),
            variants: EntityRepository::new(api.clone()),
            uoms: EntityRepository::new(api.clone()),
            assortment: EntityRepository::new(api.clone()),
            services: EntityRepository::new(api.clone()),
            bundles: EntityRepository::new(api.clone()),
            customer_orders: EntityRepository::new(api.clone()),
            purchase_orders: EntityRepository::new(api.clone()),
            invoices_out: EntityRepository::new(api.clone()),
            demands: EntityRepository::new(api.clone()),
            supplies: EntityRepository::new(api.clone()),
            cash_ins: EntityRepository::new(api.clone()),
            cash_outs: EntityRepository::new(api.clone()),
            payment_ins: EntityRepository::new(api.clone()),
            payment_outs: EntityRepository::new(api.clone()),
            counterparties: EntityRepository::new(api.clone()),
            organizations: EntityRepository::new(api.clone()),
            employees: EntityRepository::new(api.clone()),
            stores: EntityRepository::new(api.clone()),
            webhooks: EntityRepository::new(api.clone()),
            webhook_stocks: EntityRepository::new(api.clone()),
            stock: StockReportRepository::new(api.clone()),
            api,
        }
    }

    /// Raw transport for endpoints without a typed repository.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Repository for any entity type, including ones defined outside this crate.
    pub fn repository<T: Entity>(&self) -> EntityRepository<T> {
        EntityRepository::new(self.api.clone())
    }

    /// Account context: current employee, company settings and permissions.
    pub async fn context(&self) -> Result<Value, ClientError> {
        self.api.get_json("context", &[]).await
    }

    /// Metadata of an arbitrary endpoint, e.g. `entity/customerorder`.
    pub async fn metadata(&self, endpoint: &str) -> Result<Value, ClientError> {
        let path = format!("{}/metadata", endpoint.trim_matches('/'));
        self.api.get_json(&path, &[]).await
    }

    pub async fn audit(&self, query: Option<&QueryBuilder>) -> Result<Value, ClientError> {
        self.api.get_json("audit", &params_of(query)).await
    }

    pub async fn audit_events(&self, audit_id: &str, query: Option<&QueryBuilder>) -> Result<Value, ClientError> {
        let path = format!("audit/{}/events", encode_path_segment(audit_id));
        self.api.get_json(&path, &params_of(query)).await
    }

    /// Context search across all entity types.
    pub async fn search(&self, text: &str) -> Result<Value, ClientError> {
        let query = QueryBuilder::new().search(text);
        self.api.get_json("entity/search", &query.to_params()).await
    }

    pub async fn custom_entities(&self) -> Result<Vec<CustomEntity>, ClientError> {
        decode_rows(self.api.get_json(CustomEntity::ENDPOINT, &[]).await?)
    }

    pub async fn custom_entity(&self, id: &str) -> Result<CustomEntity, ClientError> {
        let path = format!("{}/{}", CustomEntity::ENDPOINT, encode_path_segment(id));
        decode(self.api.get_json(&path, &[]).await?)
    }
}
