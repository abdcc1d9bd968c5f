use crate::entities::{CurrentStock, StockByStore, StockRow};
use crate::entity::ListResponse;
use crate::query::{QueryBuilder, params_of};
use crate::repository::decode;
use crate::{ApiClient, ClientError};

/// Stock balance reports under `report/stock`.
#[derive(Clone, Debug)]
pub struct StockReportRepository {
    api: ApiClient,
}

impl StockReportRepository {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Balances of every assortment item across all stores.
    pub async fn all(&self, query: Option<&QueryBuilder>) -> Result<ListResponse<StockRow>, ClientError> {
        decode(self.api.get_json("report/stock/all", &params_of(query)).await?)
    }

    /// Balances held in the store with the given href.
    pub async fn for_store(&self, store_href: &str) -> Result<ListResponse<StockRow>, ClientError> {
        self.all(Some(&QueryBuilder::new().eq("store", store_href))).await
    }

    /// Balances broken down per store.
    pub async fn by_store(&self, query: Option<&QueryBuilder>) -> Result<ListResponse<StockByStore>, ClientError> {
        decode(self.api.get_json("report/stock/bystore", &params_of(query)).await?)
    }

    /// Live balances without report metadata.
    pub async fn current(&self) -> Result<Vec<CurrentStock>, ClientError> {
        decode(self.api.get_json("report/stock/all/current", &[]).await?)
    }
}
