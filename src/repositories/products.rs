use serde_json::{Value, json};

use crate::ClientError;
use crate::entities::{Currency, Price, PriceType, Product, ProductFolder, Variant};
use crate::entity::ListResponse;
use crate::query::QueryBuilder;
use crate::repository::{EntityRepository, decode};

impl EntityRepository<Product> {
    /// Stock summary of one product.
    pub async fn stock(&self, product_id: &str) -> Result<Value, ClientError> {
        self.api().get_json(&self.nested_path(product_id, "stock"), &[]).await
    }

    pub async fn find_by_barcode(&self, barcode: &str) -> Result<Option<Product>, ClientError> {
        self.find_first(&self.query().eq("barcodes", barcode)).await
    }

    /// Replaces the sale prices of a product.
    pub async fn update_prices(&self, product_id: &str, prices: &[Price]) -> Result<Product, ClientError> {
        let body = json!({ "salePrices": prices });
        decode(self.api().put_json(&self.path(product_id), body).await?)
    }
}

impl EntityRepository<ProductFolder> {
    /// Products placed directly in the folder.
    pub async fn products(
        &self,
        folder_id: &str,
        query: Option<QueryBuilder>,
    ) -> Result<ListResponse<Product>, ClientError> {
        let query = query.unwrap_or_default().eq("productFolder.id", folder_id);
        EntityRepository::<Product>::new(self.api().clone())
            .find_all(Some(&query))
            .await
    }
}

impl EntityRepository<Variant> {
    pub async fn find_by_product(&self, product_id: &str) -> Result<Vec<Variant>, ClientError> {
        let query = self.query().eq("product.id", product_id);
        Ok(self.find_all(Some(&query)).await?.rows)
    }
}

impl EntityRepository<Currency> {
    /// The account's default currency, if one is marked default and not archived.
    pub async fn default_currency(&self) -> Result<Option<Currency>, ClientError> {
        self.find_first(&self.query().eq("default", true).eq("archived", false))
            .await
    }
}

impl EntityRepository<PriceType> {
    pub async fn default_price_type(&self) -> Result<PriceType, ClientError> {
        decode(self.api().get_json(&self.path("default"), &[]).await?)
    }
}
