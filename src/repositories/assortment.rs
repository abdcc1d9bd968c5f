use serde_json::Value;

use crate::ClientError;
use crate::entities::{Assortment, AssortmentSettings, Bundle, BundleComponent};
use crate::entity::{ListResponse, first_from_value};
use crate::query::QueryBuilder;
use crate::repository::{EntityRepository, decode, decode_rows, encode_path_segment};

impl EntityRepository<Assortment> {
    pub async fn settings(&self) -> Result<AssortmentSettings, ClientError> {
        decode(self.api().get_json(&self.path("settings"), &[]).await?)
    }

    pub async fn stock(&self, assortment_id: &str) -> Result<Value, ClientError> {
        self.api().get_json(&self.nested_path(assortment_id, "stock"), &[]).await
    }

    /// Items in a product folder, optionally including its subfolders.
    pub async fn find_by_product_folder(
        &self,
        folder_href: &str,
        with_subfolders: bool,
        query: Option<QueryBuilder>,
    ) -> Result<ListResponse<Assortment>, ClientError> {
        let query = query
            .unwrap_or_default()
            .eq("productFolder", folder_href)
            .eq("withSubFolders", with_subfolders);
        self.find_all(Some(&query)).await
    }

    pub async fn find_by_barcode(&self, barcode: &str) -> Result<Vec<Assortment>, ClientError> {
        let query = self.query().eq("barcode", barcode);
        Ok(self.find_all(Some(&query)).await?.rows)
    }

    pub async fn search_by_name(&self, text: &str) -> Result<ListResponse<Assortment>, ClientError> {
        self.find_all(Some(&self.query().search(text))).await
    }

    /// Items of one kind: `product`, `variant`, `service` or `bundle`.
    pub async fn find_by_type(
        &self,
        kind: &str,
        query: Option<QueryBuilder>,
    ) -> Result<ListResponse<Assortment>, ClientError> {
        let query = query.unwrap_or_default().eq("type", kind);
        self.find_all(Some(&query)).await
    }

    pub async fn products(&self, query: Option<QueryBuilder>) -> Result<ListResponse<Assortment>, ClientError> {
        self.find_by_type("product", query).await
    }

    pub async fn variants(&self, query: Option<QueryBuilder>) -> Result<ListResponse<Assortment>, ClientError> {
        self.find_by_type("variant", query).await
    }

    pub async fn services(&self, query: Option<QueryBuilder>) -> Result<ListResponse<Assortment>, ClientError> {
        self.find_by_type("service", query).await
    }

    pub async fn bundles(&self, query: Option<QueryBuilder>) -> Result<ListResponse<Assortment>, ClientError> {
        self.find_by_type("bundle", query).await
    }
}

impl EntityRepository<Bundle> {
    pub async fn components(&self, bundle_id: &str) -> Result<Vec<BundleComponent>, ClientError> {
        decode_rows(self.api().get_json(&self.nested_path(bundle_id, "components"), &[]).await?)
    }

    pub async fn add_component(
        &self,
        bundle_id: &str,
        component: &BundleComponent,
    ) -> Result<BundleComponent, ClientError> {
        let body = serde_json::to_value(component)?;
        first_from_value(
            self.api()
                .post_json(&self.nested_path(bundle_id, "components"), body)
                .await?,
        )
    }

    pub async fn update_component(
        &self,
        bundle_id: &str,
        component_id: &str,
        component: &BundleComponent,
    ) -> Result<BundleComponent, ClientError> {
        let path = self.nested_path(
            bundle_id,
            &format!("components/{}", encode_path_segment(component_id)),
        );
        let body = serde_json::to_value(component)?;
        decode(self.api().put_json(&path, body).await?)
    }

    pub async fn delete_component(&self, bundle_id: &str, component_id: &str) -> Result<(), ClientError> {
        let path = self.nested_path(
            bundle_id,
            &format!("components/{}", encode_path_segment(component_id)),
        );
        self.api().delete_json(&path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::super::test_support::repository;
    use crate::entities::{Assortment, Bundle, BundleComponent, Product};
    use crate::entity::Entity;

    #[tokio::test]
    async fn find_by_type_filters_on_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/entity/assortment")
            .match_query(Matcher::UrlEncoded("filter".into(), "type=service".into()))
            .with_status(200)
            .with_body(
                r#"{"rows":[{"meta":{"href":"https://x/entity/service/s1","type":"service"},"name":"Delivery"}]}"#,
            )
            .create_async()
            .await;

        let page = repository::<Assortment>(&server).services(None).await.expect("services");

        mock.assert_async().await;
        assert!(page.rows[0].is_service());
    }

    #[tokio::test]
    async fn folder_lookup_includes_subfolder_flag() {
        let mut server = mockito::Server::new_async().await;
        let folder = "https://api.moysklad.ru/api/remap/1.2/entity/productfolder/f1";
        let mock = server
            .mock("GET", "/entity/assortment")
            .match_query(Matcher::UrlEncoded(
                "filter".into(),
                format!("productFolder={folder};withSubFolders=true"),
            ))
            .with_status(200)
            .with_body(r#"{"rows":[]}"#)
            .create_async()
            .await;

        repository::<Assortment>(&server)
            .find_by_product_folder(folder, true, None)
            .await
            .expect("items");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn bundle_components_are_managed() {
        let mut server = mockito::Server::new_async().await;
        let product_href = Product::href("p1");
        let added = server
            .mock("POST", "/entity/bundle/b1/components")
            .match_body(Matcher::PartialJson(json!({
                "assortment": {"meta": {"href": product_href}}
            })))
            .with_status(200)
            .with_body(r#"[{"id":"bc1","quantity":2}]"#)
            .create_async()
            .await;
        let deleted = server
            .mock("DELETE", "/entity/bundle/b1/components/bc1")
            .with_status(200)
            .create_async()
            .await;

        let bundles = repository::<Bundle>(&server);
        let component = BundleComponent::new(Product::meta_for("p1"), Decimal::from(2));
        let stored = bundles.add_component("b1", &component).await.expect("added");
        assert_eq!(stored.id.as_deref(), Some("bc1"));
        bundles.delete_component("b1", "bc1").await.expect("deleted");

        added.assert_async().await;
        deleted.assert_async().await;
    }
}
