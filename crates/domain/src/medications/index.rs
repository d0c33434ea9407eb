use std::{collections::HashMap, env};

use async_trait::async_trait;
use aws_sdk_dynamodb::{types::AttributeValue, Client};

use crate::{errors::Error, schedule::MedicationSource};

use super::Medication;

type Item = HashMap<String, AttributeValue>;

/// Medications-by-user table, partitioned by `user_id` and sorted by `id`.
///
/// Maintained by the views projector, read by the API.
#[derive(Clone, Debug)]
pub struct MedicationIndex {
    client: Client,
    table: String,
}

impl MedicationIndex {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    pub fn init(client: Client) -> Self {
        let table = env::var("DYNAMODB_MEDICATIONS_BY_USER_TABLE")
            .unwrap_or("medireminder-medications-by-user".to_string());

        Self::new(client, table)
    }

    /// Upserts the medication under its owner.
    pub async fn put(&self, medication: &Medication) -> Result<(), Error> {
        if medication.user_id.is_none() {
            return Err(Error::validation("Unassigned medications are not indexed"));
        }

        let item: Item = serde_dynamo::to_item(medication).map_err(Error::storage)?;

        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(Error::storage)?;

        Ok(())
    }

    pub async fn remove(&self, user_id: &str, medication_id: &str) -> Result<(), Error> {
        self.client
            .delete_item()
            .table_name(&self.table)
            .key("user_id", AttributeValue::S(user_id.to_string()))
            .key("id", AttributeValue::S(medication_id.to_string()))
            .send()
            .await
            .map_err(Error::storage)?;

        Ok(())
    }

    /// All medications of the user, active or not.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Medication>, Error> {
        self.query_user(user_id, false).await
    }

    async fn query_user(&self, user_id: &str, active_only: bool) -> Result<Vec<Medication>, Error> {
        let mut medications = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let mut request = self
                .client
                .query()
                .table_name(&self.table)
                .key_condition_expression("user_id = :user_id")
                .expression_attribute_values(":user_id", AttributeValue::S(user_id.to_string()))
                .set_exclusive_start_key(start_key.take());

            if active_only {
                request = request
                    .filter_expression("is_active = :active")
                    .expression_attribute_values(":active", AttributeValue::Bool(true));
            }

            let output = request.send().await.map_err(Error::storage)?;

            medications.extend(decode_items(output.items.unwrap_or_default()));

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(medications)
    }
}

#[async_trait]
impl MedicationSource for MedicationIndex {
    async fn fetch_active_medications_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Medication>, Error> {
        self.query_user(user_id, true).await
    }
}

/// Decodes items in order, skipping those with values outside the closed sets.
fn decode_items(items: Vec<Item>) -> Vec<Medication> {
    items
        .into_iter()
        .filter_map(|item| {
            let id = item
                .get("id")
                .and_then(|id| id.as_s().ok())
                .cloned()
                .unwrap_or_default();

            let decoded: Result<Medication, _> = serde_dynamo::from_item(item);
            match decoded {
                Ok(medication) => Some(medication),
                Err(err) => {
                    tracing::warn!(medication_id = %id, "Skipping undecodable medication: {}", err);
                    None
                }
            }
        })
        .collect()
}
