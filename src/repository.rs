use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use url::form_urlencoded::byte_serialize;

use crate::entities::EntityMetadata;
use crate::entity::{Entity, ListResponse, rows_from_value};
use crate::query::{QueryBuilder, params_of};
use crate::{ApiClient, ClientError};

/// CRUD access to one entity collection.
///
/// Entity-specific operations are inherent impls on the concrete
/// instantiation, e.g. [`crate::CounterpartyRepository`].
pub struct EntityRepository<T> {
    api: ApiClient,
    entity: PhantomData<fn() -> T>,
}

impl<T> Clone for EntityRepository<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            entity: PhantomData,
        }
    }
}

impl<T: Entity> fmt::Debug for EntityRepository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRepository")
            .field("endpoint", &T::ENDPOINT)
            .finish_non_exhaustive()
    }
}

impl<T: Entity> EntityRepository<T> {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            entity: PhantomData,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn endpoint(&self) -> &'static str {
        T::ENDPOINT
    }

    /// Empty query builder for this collection.
    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Fetches one page of entities.
    pub async fn find_all(&self, query: Option<&QueryBuilder>) -> Result<ListResponse<T>, ClientError> {
        let value = self.api.get_json(T::ENDPOINT, &params_of(query)).await?;
        decode(value)
    }

    /// Fetches every page, following `meta.nextHref` until it is absent.
    pub async fn fetch_all(&self, query: Option<&QueryBuilder>) -> Result<Vec<T>, ClientError> {
        self.api.get_all_rows(T::ENDPOINT, &params_of(query)).await
    }

    /// First entity of the page matching `query`.
    pub async fn find_first(&self, query: &QueryBuilder) -> Result<Option<T>, ClientError> {
        Ok(self.find_all(Some(query)).await?.rows.into_iter().next())
    }

    pub async fn find_by_id(&self, id: &str, query: Option<&QueryBuilder>) -> Result<T, ClientError> {
        let value = self.api.get_json(&self.path(id), &params_of(query)).await?;
        decode(value)
    }

    pub async fn create(&self, entity: &T) -> Result<T, ClientError> {
        let body = serde_json::to_value(entity)?;
        decode(self.api.post_json(T::ENDPOINT, body).await?)
    }

    /// Sends the entity to `{endpoint}/{id}`.
    ///
    /// Fails with [`ClientError::MissingEntityId`] when neither `id` nor
    /// `meta.href` identifies the entity.
    pub async fn update(&self, entity: &T) -> Result<T, ClientError> {
        let id = entity.entity_id().ok_or(ClientError::MissingEntityId {
            endpoint: T::ENDPOINT,
        })?;
        let body = serde_json::to_value(entity)?;
        decode(self.api.put_json(&self.path(&id), body).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.api.delete_json(&self.path(id)).await?;
        Ok(())
    }

    /// Custom attributes and statuses defined for this entity type.
    pub async fn metadata(&self) -> Result<EntityMetadata, ClientError> {
        decode(self.api.get_json(&self.path("metadata"), &[]).await?)
    }

    /// Creates several entities with one request.
    pub async fn create_bulk(&self, entities: &[T]) -> Result<Vec<T>, ClientError> {
        let body = serde_json::to_value(entities)?;
        rows_from_value(self.api.post_json(T::ENDPOINT, body).await?)
    }

    /// Updates several entities with one request.
    ///
    /// Every entity must be identifiable; entities without `meta` are sent
    /// with a reference built from their id.
    pub async fn update_bulk(&self, entities: &[T]) -> Result<Vec<T>, ClientError> {
        let mut body = Vec::with_capacity(entities.len());
        for entity in entities {
            let id = entity.entity_id().ok_or(ClientError::MissingEntityId {
                endpoint: T::ENDPOINT,
            })?;
            let mut item = serde_json::to_value(entity)?;
            if let Value::Object(fields) = &mut item {
                if !fields.contains_key("meta") {
                    fields.insert("meta".to_owned(), serde_json::to_value(T::meta_for(&id))?);
                }
            }
            body.push(item);
        }
        rows_from_value(self.api.post_json(T::ENDPOINT, Value::Array(body)).await?)
    }

    /// Deletes several entities with one `POST {endpoint}/delete` request.
    pub async fn delete_bulk<I, S>(&self, ids: I) -> Result<(), ClientError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let body: Vec<Value> = ids
            .into_iter()
            .map(|id| json!({ "meta": T::meta_for(id.as_ref()) }))
            .collect();
        self.api.post_json(&self.path("delete"), Value::Array(body)).await?;
        Ok(())
    }

    /// `{endpoint}/{suffix}` with `suffix` percent-encoded as one segment.
    pub(crate) fn path(&self, suffix: &str) -> String {
        format!("{}/{}", T::ENDPOINT, encode_path_segment(suffix))
    }

    /// `{endpoint}/{id}/{rest}`; `rest` is used as given.
    pub(crate) fn nested_path(&self, id: &str, rest: &str) -> String {
        format!("{}/{}/{rest}", T::ENDPOINT, encode_path_segment(id))
    }
}

pub(crate) fn decode<R: DeserializeOwned>(value: Value) -> Result<R, ClientError> {
    Ok(serde_json::from_value(value)?)
}

/// Reads the `rows` of a list response, tolerating a bare array.
pub(crate) fn decode_rows<R: DeserializeOwned>(value: Value) -> Result<Vec<R>, ClientError> {
    match value {
        Value::Object(mut object) if object.contains_key("rows") => {
            Ok(serde_json::from_value(object.remove("rows").unwrap_or_default())?)
        }
        Value::Object(_) => Ok(Vec::new()),
        other => rows_from_value(other),
    }
}

pub(crate) fn encode_path_segment(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect::<String>().replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use std::time::Duration;

    use mockito::Matcher;

    use super::{EntityRepository, decode_rows, encode_path_segment};
    use crate::entities::Product;
    use crate::entity::{Entity, EntityBase};
    use crate::{ApiClient, ClientConfig, ClientError, QueryBuilder};

    fn products(server: &mockito::ServerGuard) -> EntityRepository<Product> {
        let config = ClientConfig::new("token")
            .with_base_url(server.url())
            .with_retry_delay(Duration::from_millis(1));
        EntityRepository::new(ApiClient::new(&config).expect("valid config"))
    }

    #[test]
    fn paths_encode_ids_as_one_segment() {
        let api = ApiClient::new(&ClientConfig::default()).expect("valid config");
        let products: EntityRepository<Product> = EntityRepository::new(api);

        assert_eq!(products.path("p-1"), "entity/product/p-1");
        assert_eq!(products.nested_path("p 1", "stock"), "entity/product/p%201/stock");
        assert_eq!(encode_path_segment("a/b"), "a%2Fb");
        assert_eq!(format!("{products:?}"), "EntityRepository { endpoint: \"entity/product\", .. }");
    }

    #[test]
    fn rows_read_from_list_or_array() {
        let from_list: Vec<Product> =
            decode_rows(json!({"meta": {"href": "h"}, "rows": [{"name": "a"}]})).expect("list");
        assert_eq!(from_list.len(), 1);

        let from_array: Vec<Product> = decode_rows(json!([{"name": "a"}, {"name": "b"}])).expect("array");
        assert_eq!(from_array.len(), 2);

        let from_meta_only: Vec<Product> = decode_rows(json!({"meta": {"href": "h"}})).expect("meta");
        assert!(from_meta_only.is_empty());
    }

    #[tokio::test]
    async fn find_all_renders_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/entity/product")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("filter".into(), "archived=false;name~=Chair".into()),
                Matcher::UrlEncoded("order".into(), "name,asc".into()),
                Matcher::UrlEncoded("limit".into(), "10".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"meta":{"href":"h","size":1},"rows":[{"id":"p1","name":"Chair A"}]}"#)
            .create_async()
            .await;

        let query = QueryBuilder::new()
            .eq("archived", false)
            .starts_with("name", "Chair")
            .order_by("name", crate::Direction::Asc)
            .limit(10);
        let page = products(&server).find_all(Some(&query)).await.expect("page");

        mock.assert_async().await;
        assert_eq!(page.total(), Some(1));
        assert_eq!(page.rows[0].name(), Some("Chair A"));
    }

    #[tokio::test]
    async fn fetch_all_follows_next_href() {
        let mut server = mockito::Server::new_async().await;
        let next = format!("{}/entity/product?limit=2&offset=2", server.url());
        let first = server
            .mock("GET", "/entity/product")
            .match_query(Matcher::UrlEncoded("offset".into(), "0".into()))
            .with_status(200)
            .with_body(
                json!({
                    "meta": {"href": "h", "size": 3, "limit": 2, "offset": 0, "nextHref": next},
                    "rows": [{"id": "p1"}, {"id": "p2"}]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/entity/product")
            .match_query(Matcher::UrlEncoded("offset".into(), "2".into()))
            .with_status(200)
            .with_body(r#"{"meta":{"href":"h","size":3,"limit":2,"offset":2},"rows":[{"id":"p3"}]}"#)
            .create_async()
            .await;

        let query = QueryBuilder::new().limit(2).offset(0);
        let rows = products(&server).fetch_all(Some(&query)).await.expect("all pages");

        first.assert_async().await;
        second.assert_async().await;
        let ids: Vec<_> = rows.iter().filter_map(|product| product.base.id.as_deref()).collect();
        assert_eq!(ids, ["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn create_and_delete() {
        let mut server = mockito::Server::new_async().await;
        let created = server
            .mock("POST", "/entity/product")
            .match_body(Matcher::PartialJson(json!({"name": "Desk", "article": "D-1"})))
            .with_status(200)
            .with_body(r#"{"id":"p9","name":"Desk","article":"D-1"}"#)
            .create_async()
            .await;
        let deleted = server
            .mock("DELETE", "/entity/product/p9")
            .with_status(200)
            .create_async()
            .await;

        let repository = products(&server);
        let product = Product {
            base: EntityBase::named("Desk"),
            article: Some("D-1".to_owned()),
            ..Product::default()
        };
        let product = repository.create(&product).await.expect("created");
        assert_eq!(product.entity_id().as_deref(), Some("p9"));
        repository.delete("p9").await.expect("deleted");

        created.assert_async().await;
        deleted.assert_async().await;
    }

    #[tokio::test]
    async fn update_requires_id() {
        let server = mockito::Server::new_async().await;
        let product = Product {
            base: EntityBase::named("Desk"),
            ..Product::default()
        };

        let error = products(&server).update(&product).await.expect_err("no id");
        assert!(matches!(
            error,
            ClientError::MissingEntityId { endpoint: "entity/product" }
        ));
    }

    #[tokio::test]
    async fn bulk_update_injects_meta_and_bulk_delete_sends_refs() {
        let mut server = mockito::Server::new_async().await;
        let href = "https://api.moysklad.ru/api/remap/1.2/entity/product/p1";
        let updated = server
            .mock("POST", "/entity/product")
            .match_body(Matcher::Json(json!([{
                "id": "p1",
                "name": "Renamed",
                "meta": {"href": href, "type": "product", "mediaType": "application/json"}
            }])))
            .with_status(200)
            .with_body(r#"[{"id":"p1","name":"Renamed"}]"#)
            .create_async()
            .await;
        let deleted = server
            .mock("POST", "/entity/product/delete")
            .match_body(Matcher::Json(json!([
                {"meta": {"href": href, "type": "product", "mediaType": "application/json"}}
            ])))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let repository = products(&server);
        let product = Product {
            base: EntityBase {
                id: Some("p1".to_owned()),
                ..EntityBase::named("Renamed")
            },
            ..Product::default()
        };
        let rows = repository.update_bulk(&[product]).await.expect("updated");
        assert_eq!(rows.len(), 1);
        repository.delete_bulk(["p1"]).await.expect("deleted");

        updated.assert_async().await;
        deleted.assert_async().await;
    }
}
