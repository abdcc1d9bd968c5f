use serde_json::Value;

use crate::ClientError;
use crate::entities::{BankAccount, Employee, Organization, Store};
use crate::entity::first_from_value;
use crate::query::{QueryBuilder, params_of};
use crate::repository::{EntityRepository, decode, decode_rows};

impl EntityRepository<Organization> {
    pub async fn accounts(&self, organization_id: &str) -> Result<Vec<BankAccount>, ClientError> {
        let path = self.nested_path(organization_id, "accounts");
        decode_rows(self.api().get_json(&path, &[]).await?)
    }

    pub async fn add_account(
        &self,
        organization_id: &str,
        account: &BankAccount,
    ) -> Result<BankAccount, ClientError> {
        let path = self.nested_path(organization_id, "accounts");
        let body = serde_json::to_value(account)?;
        first_from_value(self.api().post_json(&path, body).await?)
    }
}

impl EntityRepository<Employee> {
    /// The employee the token belongs to.
    pub async fn current(&self) -> Result<Employee, ClientError> {
        decode(self.api().get_json("context/employee", &[]).await?)
    }
}

impl EntityRepository<Store> {
    pub async fn stock(&self, store_id: &str, query: Option<&QueryBuilder>) -> Result<Value, ClientError> {
        let path = self.nested_path(store_id, "stock");
        self.api().get_json(&path, &params_of(query)).await
    }
}
