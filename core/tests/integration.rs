//! Item lifecycle against the live mock AirTable server.
//!
//! # Design
//! Binds the mock server on a random port and drives `ItemRepo` through the
//! real reqwest-backed `AirTableClient`, so request paths, query encoding and
//! envelope shapes are checked end-to-end.

use std::net::SocketAddr;

use items_core::{AirTableConfig, Item, ItemError, ItemRepo, ItemStatistics};
use mock_airtable::{new_db, seed, Db, Record};
use serde_json::json;

async fn start_server(db: Db) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { mock_airtable::run_with(listener, db).await });
    addr
}

fn repo_for(addr: SocketAddr) -> ItemRepo {
    let config = AirTableConfig::new("appTest", "keyTest").with_api_url(format!("http://{addr}"));
    ItemRepo::from_config(&config).unwrap()
}

#[tokio::test]
async fn item_lifecycle() {
    let addr = start_server(new_db()).await;
    let repo = repo_for(addr);

    // Step 1: empty table.
    assert!(repo.get_rows(false).await.unwrap().is_empty());

    // Step 2: create.
    let created = repo
        .post_item(Item::new("Integration test", "780.246.8060"))
        .await
        .unwrap();
    assert_eq!(created.phone_number, "(780) 246-8060");
    assert_eq!(created.id.len(), 10);

    // Step 3: list and look up.
    let rows = repo.get_rows(false).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].item, created);

    let row = repo.get_row_by_id(&created.id).await.unwrap();
    assert_eq!(row.id, rows[0].id);

    let stats = repo.get_item_statistics().await.unwrap();
    assert_eq!(
        stats,
        ItemStatistics {
            active_count: 1,
            deleted_count: 0
        }
    );

    // Step 4: soft delete.
    repo.delete_item(&created.id).await.unwrap();

    assert!(repo.get_rows(false).await.unwrap().is_empty());
    let all = repo.get_rows(true).await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].item.is_deleted);

    let err = repo.get_row_by_id(&created.id).await.unwrap_err();
    assert!(matches!(err, ItemError::NotFound { .. }));

    // Step 5: deleting again finds nothing.
    let err = repo.delete_item(&created.id).await.unwrap_err();
    assert!(matches!(err, ItemError::NotFound { .. }));

    let stats = repo.get_item_statistics().await.unwrap();
    assert_eq!(
        stats,
        ItemStatistics {
            active_count: 0,
            deleted_count: 1
        }
    );
}

#[tokio::test]
async fn listing_spans_pages() {
    let db = new_db();
    let records = (0..250)
        .map(|i| {
            let fields = json!({
                "Id": format!("id{i:08}"),
                "Name": format!("item {i}"),
                "PhoneNumber": "(780) 246-8060",
                "IsDeleted": i % 5 == 0,
            });
            Record::new(fields.as_object().cloned().unwrap())
        })
        .collect();
    seed(&db, "Items", records).await;

    let repo = repo_for(start_server(db).await);

    assert_eq!(repo.get_rows(true).await.unwrap().len(), 250);
    assert_eq!(repo.get_rows(false).await.unwrap().len(), 200);
}

#[tokio::test]
async fn lookup_quotes_awkward_ids() {
    let db = new_db();
    let fields = json!({ "Id": "o'neil", "Name": "Quoted", "PhoneNumber": "(780) 246-8060" });
    seed(&db, "Items", vec![Record::new(fields.as_object().cloned().unwrap())]).await;

    let repo = repo_for(start_server(db).await);

    let row = repo.get_row_by_id("o'neil").await.unwrap();
    assert_eq!(row.item.name, "Quoted");
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = repo_for(addr).get_rows(false).await.unwrap_err();
    assert!(matches!(err, ItemError::Transport(_)));
}
