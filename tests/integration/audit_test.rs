//! Audit trail written by the record services.

mod helpers;

use std::sync::Arc;

use serde_json::{Value, json};

use tms_core::config::AuditConfig;
use tms_core::traits::DomainRecord;
use tms_core::ErrorKind;
use tms_core::types::{Action, BusinessUnitId, GetOptions, Resource, Tenant};
use tms_entity::audit::{AuditAction, ChangeType};
use tms_entity::{Commodity, Worker};
use tms_service::audit::{JsonDiffer, MASK, SensitiveAction};

use helpers::{FailingAuditSink, TestApp};

#[tokio::test]
async fn test_audit_failure_does_not_undo_the_write() {
    let app = TestApp::with_audit_sink(Arc::new(FailingAuditSink));
    let ctx = app.admin();
    let service = &app.catalog.commodities;

    let created = service
        .create(&ctx, Commodity::new("Steel"))
        .await
        .expect("create succeeds without audit");
    let mut edit = created.clone();
    edit.description = Some("Rolled".to_string());
    let updated = service
        .update(&ctx, edit)
        .await
        .expect("update succeeds without audit");

    let stored = service
        .get(&ctx, &GetOptions::new(created.id().expect("id")))
        .await
        .expect("read");
    assert_eq!(stored, updated);
}

#[tokio::test]
async fn test_update_entry_carries_diff() {
    let app = TestApp::new();
    let ctx = app.admin();
    let service = &app.catalog.workers;

    let created = service
        .create(&ctx, Worker::new("W1", "Ada", "Lovelace"))
        .await
        .expect("create");
    let mut edit = created.clone();
    edit.last_name = "King".to_string();
    edit.email = Some("ada@example.com".to_string());
    service.update(&ctx, edit).await.expect("update");

    let page = app
        .catalog
        .audit
        .list_by_resource(&ctx, Resource::Worker, created.id().expect("id").to_string())
        .await
        .expect("trail");
    assert_eq!(page.total, 2);

    let entry = &page.items[0];
    assert_eq!(entry.action, AuditAction::Update);
    assert_eq!(entry.user_id, ctx.tenant.user_id);
    assert_eq!(entry.changes["lastName"].change_type, ChangeType::Updated);
    assert_eq!(entry.changes["lastName"].from, json!("Lovelace"));
    assert_eq!(entry.changes["lastName"].to, json!("King"));
    assert_eq!(entry.changes["version"].to, json!(2));
    assert!(!entry.changes.contains_key("firstName"));
    assert_eq!(entry.metadata["auditVersion"], json!(1));

    assert_eq!(page.items[1].action, AuditAction::Create);
}

#[tokio::test]
async fn test_sensitive_fields_are_masked() {
    let mut config = AuditConfig::default();
    config
        .sensitive_fields
        .insert("worker".to_string(), vec!["email".to_string()]);
    let app = TestApp::with_audit_config(config);
    app.catalog
        .audit
        .register_sensitive_fields(Resource::Worker, &[("phoneNumber", SensitiveAction::Omit)]);
    let ctx = app.admin();

    let mut worker = Worker::new("W1", "Ada", "Lovelace");
    worker.email = Some("ada@example.com".to_string());
    worker.phone_number = Some("555-0100".to_string());
    let created = app.catalog.workers.create(&ctx, worker).await.expect("create");

    let mut edit = created.clone();
    edit.email = Some("countess@example.com".to_string());
    app.catalog.workers.update(&ctx, edit).await.expect("update");

    let entries = app.audit.entries().await;
    let current = entries[0].current_state.as_ref().expect("state");
    assert_eq!(current["email"], json!(MASK));
    assert!(current.get("phoneNumber").is_none());

    let change = &entries[1].changes["email"];
    assert_eq!(change.from, json!(MASK));
    assert_eq!(change.to, json!(MASK));
}

#[tokio::test]
async fn test_audit_can_be_disabled() {
    let config = AuditConfig {
        enabled: false,
        ..AuditConfig::default()
    };
    let app = TestApp::with_audit_config(config);
    let ctx = app.admin();

    app.catalog
        .commodities
        .create(&ctx, Commodity::new("Steel"))
        .await
        .expect("create");
    assert!(app.audit.entries().await.is_empty());
}

#[tokio::test]
async fn test_trail_is_tenant_scoped() {
    let app = TestApp::new();
    let owner = app.admin();
    let other = app.admin();

    app.catalog
        .commodities
        .create(&owner, Commodity::new("Steel"))
        .await
        .expect("create");

    let page = app
        .catalog
        .audit
        .list(&other, Default::default())
        .await
        .expect("list");
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_entry_lookup_is_tenant_scoped() {
    let app = TestApp::new();
    let owner = app.admin();

    app.catalog
        .commodities
        .create(&owner, Commodity::new("Steel"))
        .await
        .expect("create");
    let entry = app.audit.entries().await.remove(0);

    let found = app.catalog.audit.get(&owner, entry.id).await.expect("own entry");
    assert_eq!(found.action, AuditAction::Create);
    assert_eq!(found.resource, Resource::Commodity);

    let sibling = app.member_of(
        Tenant::new(owner.tenant.organization_id, BusinessUnitId::new()),
        &[(Resource::AuditEntry, Action::Read)],
    );
    let err = app.catalog.audit.get(&sibling, entry.id).await.expect_err("sibling unit");
    assert_eq!(err.kind, ErrorKind::NotFound);

    let colleague = app.member_of(owner.tenant.tenant(), &[(Resource::Commodity, Action::Read)]);
    let err = app.catalog.audit.get(&colleague, entry.id).await.expect_err("no grant");
    assert_eq!(err.kind, ErrorKind::Authorization);
}

#[test]
fn test_diff_of_identical_documents_is_empty() {
    let differ = JsonDiffer::default();
    let documents = [
        json!({}),
        json!({"a": 1, "b": [1, 2, {"c": null}], "d": {"e": {"f": "g"}}}),
        json!({"when": "2024-05-01T10:00:00Z", "flag": false}),
    ];
    for doc in documents {
        assert!(differ.diff(&doc, &doc).expect("diff").is_empty());
    }
}

#[test]
fn test_diff_classifies_every_key() {
    let before = json!({"kept": 1, "changed": "a", "gone": true, "nested": {"x": 1, "y": 2}});
    let after = json!({"kept": 1, "changed": "b", "added": [1], "nested": {"x": 1, "z": 3}});
    let changes = JsonDiffer::default().diff(&before, &after).expect("diff");

    let kind = |path: &str| changes.get(path).map(|c| c.change_type);
    assert_eq!(kind("kept"), None);
    assert_eq!(kind("changed"), Some(ChangeType::Updated));
    assert_eq!(kind("gone"), Some(ChangeType::Deleted));
    assert_eq!(kind("added"), Some(ChangeType::Created));
    assert_eq!(kind("nested.y"), Some(ChangeType::Deleted));
    assert_eq!(kind("nested.z"), Some(ChangeType::Created));
    assert_eq!(changes.len(), 5);

    // Swapping sides swaps Created and Deleted.
    let reverse = JsonDiffer::default().diff(&after, &before).expect("diff");
    assert_eq!(reverse["gone"].change_type, ChangeType::Created);
    assert_eq!(reverse["added"].change_type, ChangeType::Deleted);
    assert_eq!(reverse["changed"].from, Value::from("b"));
}
