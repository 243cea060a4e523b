//! Create, read, list and update through the generic record service.

mod helpers;

use tms_core::ErrorKind;
use tms_core::ErrorCode;
use tms_core::config::ValidationConfig;
use tms_core::traits::DomainRecord;
use tms_core::types::{
    Action, BusinessUnitId, FilterField, FilterOp, FilterValue, GetOptions, ListOptions,
    RecordId, Resource, SortField, Tenant,
};
use tms_entity::audit::AuditAction;
use tms_entity::{Commodity, Location, LocationComment, LocationContact, Worker};

use helpers::TestApp;

fn dallas() -> Location {
    Location::new("DAL01", "Dallas Yard", "1 Main St", "Dallas", "TX", "75201")
}

#[tokio::test]
async fn test_happy_create() {
    let app = TestApp::new();
    let ctx = app.admin();

    let mut fuel = Commodity::new("FUEL");
    fuel.version = 0;
    let created = app.catalog.commodities.create(&ctx, fuel).await.expect("create");

    assert!(created.id().is_some());
    assert_eq!(created.version(), 1);
    assert_eq!(created.tenant(), ctx.tenant.tenant());

    let page = app
        .catalog
        .commodities
        .list(&ctx, &ListOptions::default())
        .await
        .expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, created.id);

    let entries = app.audit.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::Create);
    assert!(entries[0].previous_state.is_none());
    assert_eq!(
        entries[0].current_state.as_ref().expect("current state")["name"],
        "FUEL"
    );
}

#[tokio::test]
async fn test_preset_id_is_rejected_on_create() {
    let app = TestApp::new();
    let ctx = app.admin();

    let mut commodity = Commodity::new("Steel");
    commodity.set_id(RecordId::new());
    let err = app
        .catalog
        .commodities
        .create(&ctx, commodity)
        .await
        .expect_err("preset id");

    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(err.field_errors().expect("fields").has_field("id"));
    assert_eq!(app.store.row_count(Commodity::TABLE).await, 0);
}

#[tokio::test]
async fn test_update_bumps_version_and_timestamp() {
    let app = TestApp::new();
    let ctx = app.admin();
    let service = &app.catalog.commodities;

    let created = service.create(&ctx, Commodity::new("Steel")).await.expect("create");
    let mut edit = created.clone();
    edit.description = Some("Hot rolled".to_string());
    let updated = service.update(&ctx, edit).await.expect("update");

    assert_eq!(updated.version(), created.version() + 1);
    assert!(updated.updated_at() > created.updated_at());
    assert_eq!(updated.created_at(), created.created_at());

    let fetched = service
        .get(&ctx, &GetOptions::new(created.id().expect("id")))
        .await
        .expect("get");
    assert_eq!(fetched.description.as_deref(), Some("Hot rolled"));
    assert_eq!(fetched.version(), 2);
}

#[tokio::test]
async fn test_cross_tenant_isolation() {
    let app = TestApp::new();
    let owner = app.admin();
    let stranger = app.admin();
    let service = &app.catalog.commodities;

    let record = service.create(&owner, Commodity::new("Steel")).await.expect("create");
    let id = record.id().expect("id");

    let err = service.get(&stranger, &GetOptions::new(id)).await.expect_err("get");
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.message, "Commodity not found within your organization");

    let mut hijack = record.clone();
    hijack.name = "Stolen".to_string();
    let err = service.update(&stranger, hijack).await.expect_err("update");
    assert_eq!(err.kind, ErrorKind::NotFound);

    let page = service
        .list(&stranger, &ListOptions::default())
        .await
        .expect("list");
    assert_eq!(page.total, 0);

    let page = service.list(&owner, &ListOptions::default()).await.expect("list");
    assert!(page
        .items
        .iter()
        .all(|c| c.tenant() == owner.tenant.tenant()));
}

#[tokio::test]
async fn test_uniqueness_reports_the_value() {
    let app = TestApp::new();
    let ctx = app.admin();
    let service = &app.catalog.workers;

    service
        .create(&ctx, Worker::new("ABC", "Ada", "Lovelace"))
        .await
        .expect("first");

    let err = service
        .create(&ctx, Worker::new("ABC", "Grace", "Hopper"))
        .await
        .expect_err("duplicate");
    assert_eq!(err.kind, ErrorKind::Validation);
    let field = &err.field_errors().expect("fields").errors()[0];
    assert_eq!(field.field, "code");
    assert_eq!(field.code, ErrorCode::Duplicate);
    assert!(field.message.contains("ABC"));

    let err = service
        .create(&ctx, Worker::new("abc", "Grace", "Hopper"))
        .await
        .expect_err("case-insensitive duplicate");
    assert!(err.field_errors().expect("fields").has_field("code"));

    // Another tenant may reuse the code.
    let other = app.admin();
    service
        .create(&other, Worker::new("ABC", "Grace", "Hopper"))
        .await
        .expect("other tenant");
}

#[tokio::test]
async fn test_sibling_business_units_may_share_a_value() {
    let app = TestApp::new();
    let ctx = app.admin();
    let service = &app.catalog.commodities;

    service
        .create(&ctx, Commodity::new("Steel"))
        .await
        .expect("first business unit");

    let sibling = Tenant::new(ctx.tenant.organization_id, BusinessUnitId::new());
    let member = app.member_of(sibling, &[(Resource::Commodity, Action::Create)]);
    let created = service
        .create(&member, Commodity::new("Steel"))
        .await
        .expect("sibling business unit");
    assert_eq!(created.tenant(), sibling);

    // Still unique inside the sibling.
    let err = service
        .create(&member, Commodity::new("STEEL"))
        .await
        .expect_err("duplicate in sibling");
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(err.field_errors().expect("fields").has_field("name"));
    assert_eq!(app.store.row_count(Commodity::TABLE).await, 2);
}

#[tokio::test]
async fn test_single_connection_moves_uniqueness_into_the_write() {
    let app = TestApp::with_validation(ValidationConfig {
        single_connection: true,
        ..ValidationConfig::default()
    });
    let ctx = app.admin();
    let service = &app.catalog.workers;

    // Self-check and id discipline only; the repository checks uniqueness.
    assert_eq!(service.validator().engine().rule_count(), 2);
    assert_eq!(TestApp::new().catalog.workers.validator().engine().rule_count(), 3);

    let (first, second) = tokio::join!(
        service.create(&ctx, Worker::new("ABC", "Ada", "Lovelace")),
        service.create(&ctx, Worker::new("abc", "Grace", "Hopper")),
    );
    let err = match (first, second) {
        (Ok(_), Err(err)) | (Err(err), Ok(_)) => err,
        other => panic!("exactly one create must win: {other:?}"),
    };
    assert_eq!(err.kind, ErrorKind::Validation);
    let field = &err.field_errors().expect("fields").errors()[0];
    assert_eq!(field.field, "code");
    assert_eq!(field.code, ErrorCode::Duplicate);
    assert_eq!(app.store.row_count(Worker::TABLE).await, 1);

    let other = app.admin();
    service
        .create(&other, Worker::new("ABC", "Grace", "Hopper"))
        .await
        .expect("other tenant");
}

#[tokio::test]
async fn test_list_search_filter_sort_and_page() {
    let app = TestApp::new();
    let ctx = app.admin();
    let service = &app.catalog.commodities;

    for name in ["Steel", "Lumber", "Steel coils", "Glass"] {
        let mut commodity = Commodity::new(name);
        commodity.fragile = name == "Glass";
        service.create(&ctx, commodity).await.expect("create");
    }

    let page = service
        .list(&ctx, &ListOptions::default().with_query("steel"))
        .await
        .expect("search");
    assert_eq!(page.total, 2);

    let page = service
        .list(
            &ctx,
            &ListOptions::default().with_filter(FilterField::new(
                "fragile",
                FilterOp::Eq,
                FilterValue::Boolean(true),
            )),
        )
        .await
        .expect("filter");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Glass");

    let page = service
        .list(&ctx, &ListOptions::new(2, 1).with_sort(SortField::desc("name")))
        .await
        .expect("page");
    assert_eq!(page.total, 4);
    let names: Vec<_> = page.items.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Steel", "Lumber"]);

    let err = service
        .list(&ctx, &ListOptions::default().with_filter(FilterField::eq("name; DROP", "x")))
        .await
        .expect_err("bad field");
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_child_collections_sync() {
    let app = TestApp::new();
    let ctx = app.admin();
    let service = &app.catalog.locations;

    let mut location = dallas();
    location.comments = vec![LocationComment::new("hi"), LocationComment::new("there")];
    location.contacts = vec![LocationContact::new("Dock office")];
    let created = service.create(&ctx, location).await.expect("create");
    let id = created.id().expect("id");

    let stored = service.get(&ctx, &GetOptions::expanded(id)).await.expect("get");
    assert_eq!(stored.comments.len(), 2);
    assert!(stored.comments.iter().all(|c| c.location_id == Some(id)));
    assert!(stored.comments.iter().all(|c| c.organization_id == ctx.tenant.organization_id));

    let mut c1 = stored
        .comments
        .iter()
        .find(|c| c.comment == "hi")
        .cloned()
        .expect("c1");
    c1.comment = "hi!".to_string();

    let mut edit = stored.clone();
    edit.comments = vec![c1.clone(), LocationComment::new("new")];
    edit.contacts = Vec::new();
    service.update(&ctx, edit).await.expect("update");

    let after = service.get(&ctx, &GetOptions::expanded(id)).await.expect("get");
    let mut texts: Vec<_> = after.comments.iter().map(|c| c.comment.as_str()).collect();
    texts.sort_unstable();
    assert_eq!(texts, vec!["hi!", "new"]);
    assert!(after.comments.iter().any(|c| c.id == c1.id));
    assert!(after.contacts.is_empty());
    assert_eq!(app.store.row_count("location_comments").await, 2);
    assert_eq!(app.store.row_count("location_contacts").await, 0);

    // Without expansion children are not loaded.
    let plain = service.get(&ctx, &GetOptions::new(id)).await.expect("get");
    assert!(plain.comments.is_empty());
}

#[tokio::test]
async fn test_child_round_trip_equals_submitted_set() {
    let app = TestApp::new();
    let ctx = app.admin();
    let service = &app.catalog.locations;

    let mut location = dallas();
    location.contacts = vec![LocationContact::new("Gate"), LocationContact::new("Office")];
    let created = service.create(&ctx, location).await.expect("create");
    let id = created.id().expect("id");

    let stored = service.get(&ctx, &GetOptions::expanded(id)).await.expect("get");
    let mut edit = stored.clone();
    edit.contacts[0].email = Some("gate@example.com".to_string());
    edit.contacts.remove(1);
    let mut added = LocationContact::new("Night shift");
    added.phone_number = Some("555-0100".to_string());
    edit.contacts.push(added);

    let updated = service.update(&ctx, edit).await.expect("update");
    let after = service.get(&ctx, &GetOptions::expanded(id)).await.expect("get");

    let mut expected = updated.contacts.clone();
    let mut actual = after.contacts.clone();
    expected.sort_by_key(|c| c.id);
    actual.sort_by_key(|c| c.id);
    assert_eq!(actual, expected);
    assert_eq!(actual.len(), 2);
    assert!(actual.iter().any(|c| c.email.as_deref() == Some("gate@example.com")));
}

#[tokio::test]
async fn test_unknown_child_id_fails_whole_update() {
    let app = TestApp::new();
    let ctx = app.admin();
    let service = &app.catalog.locations;

    let mut location = dallas();
    location.comments = vec![LocationComment::new("hi")];
    let created = service.create(&ctx, location).await.expect("create");
    let id = created.id().expect("id");

    let mut edit = service.get(&ctx, &GetOptions::expanded(id)).await.expect("get");
    edit.name = "Dallas North".to_string();
    let mut foreign = LocationComment::new("not mine");
    foreign.id = Some(RecordId::new());
    edit.comments.push(foreign);

    let err = service.update(&ctx, edit).await.expect_err("unknown child");
    assert_eq!(err.kind, ErrorKind::NotFound);

    let after = service.get(&ctx, &GetOptions::expanded(id)).await.expect("get");
    assert_eq!(after.name, "Dallas Yard");
    assert_eq!(after.version(), 1);
    assert_eq!(after.comments.len(), 1);
}

#[tokio::test]
async fn test_nested_child_errors_are_indexed() {
    let app = TestApp::new();
    let ctx = app.admin();

    let mut location = dallas();
    location.contacts = vec![LocationContact::new("Gate"), LocationContact::new("")];
    let err = app
        .catalog
        .locations
        .create(&ctx, location)
        .await
        .expect_err("invalid contact");
    assert!(err.field_errors().expect("fields").has_field("contacts[1].name"));
}
