//! Permission checks in front of every service operation.

mod helpers;

use tms_core::ErrorKind;
use tms_core::types::{Action, GetOptions, ListOptions, Resource};
use tms_core::traits::DomainRecord;
use tms_database::AuditQuery;
use tms_entity::Commodity;

use helpers::TestApp;

#[tokio::test]
async fn test_member_without_grants_is_denied_everything() {
    let app = TestApp::new();
    let admin = app.admin();
    let existing = app
        .catalog
        .commodities
        .create(&admin, Commodity::new("Steel"))
        .await
        .expect("create");

    let ctx = app.member_of(admin.tenant.tenant(), &[]);
    let service = &app.catalog.commodities;

    let err = service.create(&ctx, Commodity::new("Lumber")).await.expect_err("create");
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = service.update(&ctx, existing.clone()).await.expect_err("update");
    assert_eq!(err.kind, ErrorKind::Authorization);

    let id = existing.id().expect("id");
    let err = service.get(&ctx, &GetOptions::new(id)).await.expect_err("get");
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = service.list(&ctx, &ListOptions::default()).await.expect_err("list");
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert_eq!(err.message, "You do not have permission to read commodities");
}

#[tokio::test]
async fn test_grants_are_per_action() {
    let app = TestApp::new();
    let ctx = app.member(&[(Resource::Commodity, Action::Read), (Resource::Commodity, Action::Create)]);
    let service = &app.catalog.commodities;

    let mut created = service.create(&ctx, Commodity::new("Steel")).await.expect("create");
    let page = service.list(&ctx, &ListOptions::default()).await.expect("list");
    assert_eq!(page.total, 1);

    created.name = "Steel coils".to_string();
    let err = service.update(&ctx, created).await.expect_err("update");
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert_eq!(err.message, "You do not have permission to update commodities");
}

#[tokio::test]
async fn test_manage_implies_every_action() {
    let app = TestApp::new();
    let ctx = app.member(&[(Resource::Commodity, Action::Manage)]);
    let service = &app.catalog.commodities;

    let mut created = service.create(&ctx, Commodity::new("Steel")).await.expect("create");
    created.fragile = true;
    let updated = service.update(&ctx, created).await.expect("update");
    assert!(updated.fragile);

    // Manage on commodities says nothing about workers.
    let err = app
        .catalog
        .workers
        .list(&ctx, &ListOptions::default())
        .await
        .expect_err("workers");
    assert_eq!(err.kind, ErrorKind::Authorization);
}

#[tokio::test]
async fn test_admin_role_is_tenant_scoped() {
    let app = TestApp::new();
    let admin = app.admin();

    // Same user, different tenant: no role there.
    let mut elsewhere = helpers::new_tenant_context();
    elsewhere.user_id = admin.tenant.user_id;
    let ctx = tms_core::types::RequestContext::new(elsewhere);

    let err = app
        .catalog
        .commodities
        .list(&ctx, &ListOptions::default())
        .await
        .expect_err("other tenant");
    assert_eq!(err.kind, ErrorKind::Authorization);
}

#[tokio::test]
async fn test_audit_trail_requires_audit_read() {
    let app = TestApp::new();
    let ctx = app.member(&[(Resource::Commodity, Action::Manage)]);

    let err = app
        .catalog
        .audit
        .list(&ctx, AuditQuery::default())
        .await
        .expect_err("denied");
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert_eq!(err.message, "You do not have permission to read audit entries");

    let reader = app.member_of(
        ctx.tenant.tenant(),
        &[(Resource::AuditEntry, Action::Read)],
    );
    app.catalog
        .commodities
        .create(&ctx, Commodity::new("Steel"))
        .await
        .expect("create");
    let page = app
        .catalog
        .audit
        .list(&reader, AuditQuery::default())
        .await
        .expect("list");
    assert_eq!(page.total, 1);
}
