use serde_json::Value;

use crate::ClientError;
use crate::entities::{Counterparty, CustomerOrder, Demand, Document, InvoiceOut, PaymentIn, Position};
use crate::entity::{ListResponse, first_from_value};
use crate::query::QueryBuilder;
use crate::repository::{EntityRepository, decode, encode_path_segment};

impl<T: Document> EntityRepository<T> {
    /// Documents whose counterparty has the given id.
    pub async fn find_by_agent(
        &self,
        agent_id: &str,
        query: Option<QueryBuilder>,
    ) -> Result<ListResponse<T>, ClientError> {
        let query = query.unwrap_or_default().eq("agent.id", agent_id);
        self.find_all(Some(&query)).await
    }

    /// One page of the document's positions.
    pub async fn positions(
        &self,
        document_id: &str,
        query: Option<QueryBuilder>,
    ) -> Result<ListResponse<Position>, ClientError> {
        let mut query = query.unwrap_or_default();
        if let Some(expand) = T::POSITIONS_EXPAND {
            query = query.expand(expand);
        }
        let path = self.nested_path(document_id, "positions");
        decode(self.api().get_json(&path, &query.to_params()).await?)
    }

    pub async fn create_position(&self, document_id: &str, position: &Position) -> Result<Position, ClientError> {
        let path = self.nested_path(document_id, "positions");
        let body = serde_json::to_value(position)?;
        first_from_value(self.api().post_json(&path, body).await?)
    }

    pub async fn update_position(
        &self,
        document_id: &str,
        position_id: &str,
        position: &Position,
    ) -> Result<Position, ClientError> {
        let path = position_path(self, document_id, position_id);
        let body = serde_json::to_value(position)?;
        decode(self.api().put_json(&path, body).await?)
    }

    pub async fn delete_position(&self, document_id: &str, position_id: &str) -> Result<(), ClientError> {
        let path = position_path(self, document_id, position_id);
        self.api().delete_json(&path).await?;
        Ok(())
    }
}

fn position_path<T: Document>(repository: &EntityRepository<T>, document_id: &str, position_id: &str) -> String {
    repository.nested_path(
        document_id,
        &format!("positions/{}", encode_path_segment(position_id)),
    )
}

impl EntityRepository<CustomerOrder> {
    /// The order's counterparty; only its reference unless `expand` is set.
    pub async fn agent(&self, order_id: &str, expand: bool) -> Result<Counterparty, ClientError> {
        let mut query = self.query();
        if expand {
            query = query.expand("agent");
        }
        let order = self
            .api()
            .get_json(&self.path(order_id), &query.to_params())
            .await?;
        match order {
            Value::Object(mut fields) => match fields.remove("agent") {
                Some(agent) => decode(agent),
                None => Err(ClientError::UnexpectedResponse(format!(
                    "customer order {order_id} has no agent"
                ))),
            },
            other => Err(ClientError::UnexpectedResponse(format!(
                "expected a customer order object, got {other}"
            ))),
        }
    }
}

impl EntityRepository<InvoiceOut> {
    /// Invoices linked to the customer order with the given href.
    pub async fn find_by_customer_order(&self, order_href: &str) -> Result<Vec<InvoiceOut>, ClientError> {
        let query = self.query().eq("customerOrder", order_href);
        Ok(self.find_all(Some(&query)).await?.rows)
    }
}

impl EntityRepository<Demand> {
    pub async fn find_by_customer_order(&self, order_id: &str) -> Result<Vec<Demand>, ClientError> {
        let query = self.query().eq("customerOrder.id", order_id);
        Ok(self.find_all(Some(&query)).await?.rows)
    }
}

impl EntityRepository<PaymentIn> {
    /// Incoming payments that settle the customer order with the given id.
    pub async fn find_by_customer_order(&self, order_id: &str) -> Result<Vec<PaymentIn>, ClientError> {
        let query = self.query().eq("operations.customerorder.id", order_id);
        Ok(self.find_all(Some(&query)).await?.rows)
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::super::test_support::repository;
    use crate::entities::{CustomerOrder, Demand, PaymentIn, Position, Product, Supply};
    use crate::entity::Entity;

    #[tokio::test]
    async fn customer_order_positions_expand_assortment() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/entity/customerorder/o1/positions")
            .match_query(Matcher::UrlEncoded("expand".into(), "assortment".into()))
            .with_status(200)
            .with_body(r#"{"meta":{"href":"h","size":1},"rows":[{"id":"pos1","quantity":2}]}"#)
            .create_async()
            .await;

        let page = repository::<CustomerOrder>(&server)
            .positions("o1", None)
            .await
            .expect("positions");

        mock.assert_async().await;
        assert_eq!(page.rows[0].position_id().as_deref(), Some("pos1"));
        assert_eq!(page.rows[0].quantity, Some(Decimal::from(2)));
    }

    #[tokio::test]
    async fn supply_positions_read_collapsed_page() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/entity/supply/s1/positions")
            .with_status(200)
            .with_body(r#"{"meta":{"href":"h"},"rows":[]}"#)
            .create_async()
            .await;

        let page = repository::<Supply>(&server).positions("s1", None).await.expect("positions");

        mock.assert_async().await;
        assert!(page.rows.is_empty());
    }

    #[tokio::test]
    async fn position_lifecycle() {
        let mut server = mockito::Server::new_async().await;
        let product_href = Product::href("p1");
        let created = server
            .mock("POST", "/entity/customerorder/o1/positions")
            .match_body(Matcher::PartialJson(json!({
                "assortment": {"meta": {"href": product_href}}
            })))
            .with_status(200)
            .with_body(r#"[{"id":"pos7"}]"#)
            .create_async()
            .await;
        let updated = server
            .mock("PUT", "/entity/customerorder/o1/positions/pos7")
            .with_status(200)
            .with_body(r#"{"id":"pos7","quantity":3}"#)
            .create_async()
            .await;
        let deleted = server
            .mock("DELETE", "/entity/customerorder/o1/positions/pos7")
            .with_status(200)
            .create_async()
            .await;

        let orders = repository::<CustomerOrder>(&server);
        let mut position = Position::new(Product::meta_for("p1"), Decimal::from(2), Decimal::from(150));
        let stored = orders.create_position("o1", &position).await.expect("created");
        assert_eq!(stored.id.as_deref(), Some("pos7"));

        position.quantity = Some(Decimal::from(3));
        let stored = orders.update_position("o1", "pos7", &position).await.expect("updated");
        assert_eq!(stored.quantity, Some(Decimal::from(3)));
        orders.delete_position("o1", "pos7").await.expect("deleted");

        created.assert_async().await;
        updated.assert_async().await;
        deleted.assert_async().await;
    }

    #[tokio::test]
    async fn agent_is_expanded_on_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/entity/customerorder/o1")
            .match_query(Matcher::UrlEncoded("expand".into(), "agent".into()))
            .with_status(200)
            .with_body(r#"{"id":"o1","agent":{"id":"c1","name":"Acme","phone":"+100"}}"#)
            .create_async()
            .await;

        let agent = repository::<CustomerOrder>(&server)
            .agent("o1", true)
            .await
            .expect("agent");

        mock.assert_async().await;
        assert_eq!(agent.name(), Some("Acme"));
    }

    #[tokio::test]
    async fn order_without_agent_is_unexpected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/entity/customerorder/o2")
            .with_status(200)
            .with_body(r#"{"id":"o2"}"#)
            .create_async()
            .await;

        let error = repository::<CustomerOrder>(&server)
            .agent("o2", false)
            .await
            .expect_err("no agent");
        assert!(matches!(error, crate::ClientError::UnexpectedResponse(_)));
    }

    #[tokio::test]
    async fn linked_documents_filter_by_order() {
        let mut server = mockito::Server::new_async().await;
        let demands = server
            .mock("GET", "/entity/demand")
            .match_query(Matcher::UrlEncoded("filter".into(), "customerOrder.id=o1".into()))
            .with_status(200)
            .with_body(r#"{"rows":[{"id":"d1"}]}"#)
            .create_async()
            .await;
        let payments = server
            .mock("GET", "/entity/paymentin")
            .match_query(Matcher::UrlEncoded(
                "filter".into(),
                "operations.customerorder.id=o1".into(),
            ))
            .with_status(200)
            .with_body(r#"{"rows":[{"id":"pi1"},{"id":"pi2"}]}"#)
            .create_async()
            .await;

        let found = repository::<Demand>(&server).find_by_customer_order("o1").await.expect("demands");
        assert_eq!(found.len(), 1);
        let found = repository::<PaymentIn>(&server)
            .find_by_customer_order("o1")
            .await
            .expect("payments");
        assert_eq!(found.len(), 2);

        demands.assert_async().await;
        payments.assert_async().await;
    }
}
