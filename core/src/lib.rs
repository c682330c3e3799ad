//! Item records stored in an AirTable table.
//!
//! # Overview
//! `RecordsClient` issues the raw GET/POST/PATCH calls against AirTable and
//! `ItemRepo` layers the item semantics on top: soft-delete filtering, lookup
//! by item id, phone number validation on create, and recent-activity
//! statistics.
//!
//! # Design
//! - The repository depends on `Arc<dyn RecordsClient>`, so tests substitute
//!   an in-memory client and the network stays out of unit tests.
//! - `AirTableClient` splits each call into `build_request` (plain data) and
//!   `execute` (one reqwest round-trip, no retries).
//! - Rows are never hard-deleted; `IsDeleted` is flipped instead.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod ids;
pub mod phone;
pub mod repository;
pub mod types;

pub use client::{AirTableClient, RecordsClient};
pub use config::AirTableConfig;
pub use error::ItemError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use repository::ItemRepo;
pub use types::{
    AirTablePatchItem, AirTablePostItem, AirTableResponse, AirTableResponseItem, Item,
    ItemStatistics, SoftDeleteFields,
};
