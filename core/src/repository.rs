//! Item repository over an AirTable table.
//!
//! # Design
//! `ItemRepo` owns no state besides the table name and a shared
//! `RecordsClient`. Rows are never removed: deletion flips `IsDeleted`, and
//! every read except the statistics path hides flagged rows unless asked.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use url::form_urlencoded;

use crate::client::{AirTableClient, RecordsClient};
use crate::config::AirTableConfig;
use crate::error::ItemError;
use crate::ids::generate_item_id;
use crate::phone::normalize_phone_number;
use crate::types::{
    AirTablePatchItem, AirTablePostItem, AirTableResponse, AirTableResponseItem, Item,
    ItemStatistics, SoftDeleteFields,
};

#[derive(Clone)]
pub struct ItemRepo {
    client: Arc<dyn RecordsClient>,
    table: String,
}

impl ItemRepo {
    pub fn new(client: Arc<dyn RecordsClient>, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    /// Repository backed by a reqwest `AirTableClient` for `config`.
    pub fn from_config(config: &AirTableConfig) -> Result<Self, ItemError> {
        let client = AirTableClient::new(config)?;
        Ok(Self::new(Arc::new(client), config.table.clone()))
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// All rows of the table, soft-deleted ones only when `include_deleted`.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn get_rows(&self, include_deleted: bool) -> Result<Vec<AirTableResponseItem>, ItemError> {
        let rows = self.fetch_all(None).await?;
        if include_deleted {
            return Ok(rows);
        }
        Ok(rows.into_iter().filter(|row| !row.item.is_deleted).collect())
    }

    /// The active row whose item id is `id`.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn get_row_by_id(&self, id: &str) -> Result<AirTableResponseItem, ItemError> {
        let formula = format!("{{Id}}='{}'", escape_formula_string(id));
        self.fetch_all(Some(&formula))
            .await?
            .into_iter()
            .find(|row| !row.item.is_deleted && row.item.id == id)
            .ok_or_else(|| ItemError::NotFound { id: id.to_string() })
    }

    /// Active and deleted counts among rows updated in the last hour.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn get_item_statistics(&self) -> Result<ItemStatistics, ItemError> {
        let rows = self.get_rows(true).await?;
        let stats = ItemStatistics::tally(&rows, Utc::now());
        debug!(
            rows = rows.len(),
            active = stats.active_count,
            deleted = stats.deleted_count,
            "tallied item statistics"
        );
        Ok(stats)
    }

    /// Soft-delete the active item `id`.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn delete_item(&self, id: &str) -> Result<(), ItemError> {
        let row = self.get_row_by_id(id).await?;
        let body = to_json(&AirTablePatchItem {
            fields: SoftDeleteFields {
                is_deleted: true,
                last_updated: Utc::now(),
            },
        })?;

        let response = self
            .client
            .patch(&format!("{}/{}", self.table, row.id), body)
            .await?;
        if !response.is_success() {
            warn!(status = response.status, record = %row.id, "soft delete rejected");
            return Err(ItemError::Http {
                status: response.status,
                body: response.body,
            });
        }

        info!(record = %row.id, "item soft-deleted");
        Ok(())
    }

    /// Validate, normalize and create `item`. Returns the item as stored,
    /// with its generated id.
    #[instrument(skip(self, item), fields(table = %self.table))]
    pub async fn post_item(&self, item: Item) -> Result<Item, ItemError> {
        if item.name.trim().is_empty() {
            return Err(ItemError::validation("name", "name must not be empty"));
        }
        if item.phone_number.trim().is_empty() {
            return Err(ItemError::validation(
                "phone number",
                "phone number must not be empty",
            ));
        }

        let item = Item {
            id: generate_item_id(),
            phone_number: normalize_phone_number(&item.phone_number)?,
            is_deleted: false,
            last_updated: Some(Utc::now()),
            ..item
        };
        let body = to_json(&AirTablePostItem {
            fields: item.clone(),
        })?;

        let response = self.client.post(&self.table, body).await?;
        if !response.is_success() {
            warn!(status = response.status, "item create rejected");
            return Err(ItemError::Http {
                status: response.status,
                body: response.body,
            });
        }

        info!(id = %item.id, "item created");
        Ok(item)
    }

    /// Follow `offset` cursors until the last page.
    async fn fetch_all(&self, formula: Option<&str>) -> Result<Vec<AirTableResponseItem>, ItemError> {
        let mut rows = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let path = list_path(&self.table, formula, offset.as_deref());
            let raw = self.client.get_string(&path).await?;
            let page: AirTableResponse = serde_json::from_str(&raw)
                .map_err(|e| ItemError::Deserialization(e.to_string()))?;

            debug!(records = page.records.len(), more = page.offset.is_some(), "fetched page");
            rows.extend(page.records);

            match page.offset {
                Some(next) if offset.as_deref() == Some(next.as_str()) => {
                    warn!(offset = %next, "AirTable repeated the previous page cursor");
                    return Err(ItemError::Deserialization(format!(
                        "pagination did not advance past offset {next}"
                    )));
                }
                Some(next) if !next.is_empty() => offset = Some(next),
                _ => return Ok(rows),
            }
        }
    }
}

fn list_path(table: &str, formula: Option<&str>, offset: Option<&str>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(formula) = formula {
        query.append_pair("filterByFormula", formula);
    }
    if let Some(offset) = offset {
        query.append_pair("offset", offset);
    }
    let query = query.finish();
    if query.is_empty() {
        table.to_string()
    } else {
        format!("{table}?{query}")
    }
}

/// Escape a value for use inside a single-quoted formula string.
fn escape_formula_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ItemError> {
    serde_json::to_string(value).map_err(|e| ItemError::Serialization(e.to_string()))
}
