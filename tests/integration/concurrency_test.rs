//! Optimistic concurrency and request deadlines.

mod helpers;

use std::time::Duration;

use tms_core::ErrorCode;
use tms_core::ErrorKind;
use tms_core::traits::DomainRecord;
use tms_core::types::GetOptions;
use tms_core::error::VERSION_MISMATCH_MESSAGE;
use tms_database::MemoryStore;
use tms_entity::Commodity;

use helpers::TestApp;

#[tokio::test]
async fn test_stale_version_conflicts() {
    let app = TestApp::new();
    let ctx = app.admin();
    let service = &app.catalog.commodities;

    let mut record = service.create(&ctx, Commodity::new("Steel")).await.expect("create");
    for n in 0..6 {
        record.description = Some(format!("revision {n}"));
        record = service.update(&ctx, record).await.expect("update");
    }
    assert_eq!(record.version(), 7);
    let id = record.id().expect("id");

    let mut client1 = service.get(&ctx, &GetOptions::new(id)).await.expect("read");
    let mut client2 = service.get(&ctx, &GetOptions::new(id)).await.expect("read");

    client1.description = Some("client one".to_string());
    let written = service.update(&ctx, client1).await.expect("client1");
    assert_eq!(written.version(), 8);

    client2.description = Some("client two".to_string());
    let err = service.update(&ctx, client2).await.expect_err("client2");
    assert_eq!(err.kind, ErrorKind::VersionConflict);
    assert_eq!(err.message, VERSION_MISMATCH_MESSAGE);
    let field = &err.field_errors().expect("fields").errors()[0];
    assert_eq!(field.field, "name");
    assert_eq!(field.code, ErrorCode::VersionMismatch);

    let stored = service.get(&ctx, &GetOptions::new(id)).await.expect("read");
    assert_eq!(stored, written);
}

#[tokio::test]
async fn test_racing_updates_linearize() {
    let app = TestApp::new();
    let ctx = app.admin();
    let service = &app.catalog.commodities;

    let record = service.create(&ctx, Commodity::new("Steel")).await.expect("create");
    let mut a = record.clone();
    a.description = Some("a".to_string());
    let mut b = record.clone();
    b.description = Some("b".to_string());

    let (ra, rb) = tokio::join!(service.update(&ctx, a), service.update(&ctx, b));
    let outcomes = [ra, rb];
    let winners: Vec<_> = outcomes.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!(outcomes
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| e.kind == ErrorKind::VersionConflict));

    let stored = service
        .get(&ctx, &GetOptions::new(record.id().expect("id")))
        .await
        .expect("read");
    assert_eq!(stored.version(), 2);
    assert_eq!(stored.description, winners[0].description);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_rolls_back_update() {
    let store = MemoryStore::new().with_write_latency(Duration::from_secs(2));
    let app = TestApp::with_store(store);
    let ctx = app.admin();
    let service = &app.catalog.commodities;

    let created = service.create(&ctx, Commodity::new("Steel")).await.expect("create");
    let audit_before = app.audit.entries().await.len();

    let hurried = ctx.clone().with_timeout(Duration::from_millis(500));
    let mut edit = created.clone();
    edit.description = Some("too slow".to_string());
    let err = service.update(&hurried, edit).await.expect_err("deadline");
    assert_eq!(err.kind, ErrorKind::Timeout);

    let stored = service
        .get(&ctx, &GetOptions::new(created.id().expect("id")))
        .await
        .expect("read");
    assert_eq!(stored.version(), 1);
    assert!(stored.description.is_none());
    assert_eq!(app.audit.entries().await.len(), audit_before);
}

#[tokio::test(start_paused = true)]
async fn test_generous_deadline_succeeds() {
    let store = MemoryStore::new().with_write_latency(Duration::from_millis(50));
    let app = TestApp::with_store(store);
    let ctx = app.admin().with_timeout(Duration::from_secs(5));

    let created = app
        .catalog
        .commodities
        .create(&ctx, Commodity::new("Steel"))
        .await
        .expect("create");
    assert_eq!(created.version(), 1);
    assert_eq!(app.store.row_count(Commodity::TABLE).await, 1);
}
