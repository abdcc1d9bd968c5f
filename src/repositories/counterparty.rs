use crate::ClientError;
use crate::entities::{BankAccount, ContactPerson, Counterparty, Note};
use crate::entity::first_from_value;
use crate::repository::{EntityRepository, decode_rows};

impl EntityRepository<Counterparty> {
    pub async fn contact_persons(&self, counterparty_id: &str) -> Result<Vec<ContactPerson>, ClientError> {
        let path = self.nested_path(counterparty_id, "contactpersons");
        decode_rows(self.api().get_json(&path, &[]).await?)
    }

    pub async fn add_contact_person(
        &self,
        counterparty_id: &str,
        contact: &ContactPerson,
    ) -> Result<ContactPerson, ClientError> {
        let path = self.nested_path(counterparty_id, "contactpersons");
        let body = serde_json::to_value(contact)?;
        first_from_value(self.api().post_json(&path, body).await?)
    }

    pub async fn bank_accounts(&self, counterparty_id: &str) -> Result<Vec<BankAccount>, ClientError> {
        let path = self.nested_path(counterparty_id, "accounts");
        decode_rows(self.api().get_json(&path, &[]).await?)
    }

    pub async fn add_bank_account(
        &self,
        counterparty_id: &str,
        account: &BankAccount,
    ) -> Result<BankAccount, ClientError> {
        let path = self.nested_path(counterparty_id, "accounts");
        let body = serde_json::to_value(account)?;
        first_from_value(self.api().post_json(&path, body).await?)
    }

    pub async fn notes(&self, counterparty_id: &str) -> Result<Vec<Note>, ClientError> {
        let path = self.nested_path(counterparty_id, "notes");
        decode_rows(self.api().get_json(&path, &[]).await?)
    }

    pub async fn add_note(&self, counterparty_id: &str, note: &Note) -> Result<Note, ClientError> {
        let path = self.nested_path(counterparty_id, "notes");
        let body = serde_json::to_value(note)?;
        first_from_value(self.api().post_json(&path, body).await?)
    }

    pub async fn find_by_phone(&self, phone: &str) -> Result<Vec<Counterparty>, ClientError> {
        self.find_by_field("phone", phone).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Vec<Counterparty>, ClientError> {
        self.find_by_field("email", email).await
    }

    /// Counterparties with the given taxpayer number.
    pub async fn find_by_inn(&self, inn: &str) -> Result<Vec<Counterparty>, ClientError> {
        self.find_by_field("inn", inn).await
    }

    async fn find_by_field(&self, field: &str, value: &str) -> Result<Vec<Counterparty>, ClientError> {
        let query = self.query().eq(field, value);
        Ok(self.find_all(Some(&query)).await?.rows)
    }
}
