//! AirTable record envelopes and the item row they carry.
//!
//! # Design
//! Field names follow the AirTable column names (`Id`, `Name`, ...); the
//! envelopes follow AirTable's own lowercase keys (`records`, `fields`).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One item row, stored as the `fields` object of an AirTable record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Item {
    /// An unsaved item as a caller submits it for creation.
    pub fn new(name: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            phone_number: phone_number.into(),
            is_deleted: false,
            last_updated: None,
        }
    }
}

/// A record as returned by a list query: external record id plus item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AirTableResponseItem {
    pub id: String,
    #[serde(rename = "createdTime", default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(rename = "fields")]
    pub item: Item,
}

/// One page of a list query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AirTableResponse {
    #[serde(default)]
    pub records: Vec<AirTableResponseItem>,
    /// Cursor for the next page; absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

/// Body of a create request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirTablePostItem {
    pub fields: Item,
}

/// Body of the soft-delete update. Only the listed fields are changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirTablePatchItem {
    pub fields: SoftDeleteFields,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SoftDeleteFields {
    pub is_deleted: bool,
    pub last_updated: DateTime<Utc>,
}

/// Counts of items touched in the last hour.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemStatistics {
    pub active_count: usize,
    pub deleted_count: usize,
}

impl ItemStatistics {
    /// Window counted back from `now`.
    pub fn window() -> Duration {
        Duration::hours(1)
    }

    /// Tally rows whose `LastUpdated` is no older than one hour before `now`.
    /// Rows without a timestamp are never counted.
    pub fn tally<'a, I>(rows: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a AirTableResponseItem>,
    {
        let since = now - Self::window();
        rows.into_iter()
            .filter(|row| matches!(row.item.last_updated, Some(ts) if ts >= since))
            .fold(Self::default(), |mut stats, row| {
                if row.item.is_deleted {
                    stats.deleted_count += 1;
                } else {
                    stats.active_count += 1;
                }
                stats
            })
    }
}
