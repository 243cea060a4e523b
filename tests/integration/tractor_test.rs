//! Tractor cross-entity rules and the assignment lookup.

mod helpers;

use tms_core::ErrorKind;
use tms_core::traits::DomainRecord;
use tms_core::types::{Action, RecordId, RequestContext, Resource};
use tms_core::{AppError, ErrorCode};
use tms_entity::{EquipmentClass, EquipmentType, Tractor, Worker};

use helpers::TestApp;

struct Fleet {
    app: TestApp,
    ctx: RequestContext,
    tractor_type: RecordId,
    trailer_type: RecordId,
    ada: RecordId,
    grace: RecordId,
}

async fn fleet() -> Fleet {
    let app = TestApp::new();
    let ctx = app.admin();

    let tractor_type = app
        .catalog
        .equipment_types
        .create(&ctx, EquipmentType::new("DAYCAB", EquipmentClass::Tractor))
        .await
        .expect("tractor type");
    let trailer_type = app
        .catalog
        .equipment_types
        .create(&ctx, EquipmentType::new("REEFER", EquipmentClass::Trailer))
        .await
        .expect("trailer type");
    let ada = app
        .catalog
        .workers
        .create(&ctx, Worker::new("W1", "Ada", "Lovelace"))
        .await
        .expect("worker");
    let grace = app
        .catalog
        .workers
        .create(&ctx, Worker::new("W2", "Grace", "Hopper"))
        .await
        .expect("worker");

    Fleet {
        tractor_type: tractor_type.id().expect("id"),
        trailer_type: trailer_type.id().expect("id"),
        ada: ada.id().expect("id"),
        grace: grace.id().expect("id"),
        app,
        ctx,
    }
}

fn field_code(err: &AppError, field: &str) -> Option<ErrorCode> {
    err.field_errors()?.for_field(field).next().map(|e| e.code)
}

#[tokio::test]
async fn test_equipment_type_must_be_tractor_class() {
    let f = fleet().await;

    let err = f
        .app
        .catalog
        .tractors
        .create(&f.ctx, Tractor::new("TRK-1", f.trailer_type))
        .await
        .expect_err("wrong class");
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(field_code(&err, "equipmentTypeId"), Some(ErrorCode::Invalid));
    assert_eq!(err.message, "Equipment type class must be Tractor, found Trailer");
    assert_eq!(f.app.store.row_count(Tractor::TABLE).await, 0);
}

#[tokio::test]
async fn test_equipment_type_must_exist_in_tenant() {
    let f = fleet().await;

    let err = f
        .app
        .catalog
        .tractors
        .create(&f.ctx, Tractor::new("TRK-1", RecordId::new()))
        .await
        .expect_err("missing type");
    assert_eq!(field_code(&err, "equipmentTypeId"), Some(ErrorCode::InvalidReference));

    // Another tenant's equipment type is as good as missing.
    let other = f.app.admin();
    let err = f
        .app
        .catalog
        .tractors
        .create(&other, Tractor::new("TRK-1", f.tractor_type))
        .await
        .expect_err("foreign type");
    assert_eq!(field_code(&err, "equipmentTypeId"), Some(ErrorCode::InvalidReference));
}

#[tokio::test]
async fn test_worker_rules() {
    let f = fleet().await;
    let tractors = &f.app.catalog.tractors;

    let mut same = Tractor::new("TRK-1", f.tractor_type);
    same.primary_worker_id = Some(f.ada);
    same.secondary_worker_id = Some(f.ada);
    let err = tractors.create(&f.ctx, same).await.expect_err("same worker");
    assert_eq!(field_code(&err, "secondaryWorkerId"), Some(ErrorCode::Invalid));

    let mut ghost = Tractor::new("TRK-1", f.tractor_type);
    ghost.primary_worker_id = Some(RecordId::new());
    let err = tractors.create(&f.ctx, ghost).await.expect_err("unknown worker");
    assert_eq!(field_code(&err, "primaryWorkerId"), Some(ErrorCode::InvalidReference));

    let mut first = Tractor::new("TRK-1", f.tractor_type);
    first.primary_worker_id = Some(f.ada);
    first.secondary_worker_id = Some(f.grace);
    let first = tractors.create(&f.ctx, first).await.expect("valid tractor");

    let mut second = Tractor::new("TRK-2", f.tractor_type);
    second.primary_worker_id = Some(f.ada);
    let err = tractors.create(&f.ctx, second).await.expect_err("worker taken");
    assert_eq!(field_code(&err, "primaryWorkerId"), Some(ErrorCode::Invalid));
    assert!(err.message.contains("TRK-1"));

    // Re-saving the tractor that already holds the worker is fine.
    let mut edit = first.clone();
    edit.model = Some("T680".to_string());
    let updated = tractors.update(&f.ctx, edit).await.expect("update");
    assert_eq!(updated.version(), 2);
}

#[tokio::test]
async fn test_assignment_lookup() {
    let f = fleet().await;
    let tractors = &f.app.catalog.tractors;

    let mut tractor = Tractor::new("TRK-1", f.tractor_type);
    tractor.primary_worker_id = Some(f.ada);
    tractor.secondary_worker_id = Some(f.grace);
    let tractor = tractors.create(&f.ctx, tractor).await.expect("create");
    let id = tractor.id().expect("id");

    let assignment = tractors.assignment(&f.ctx, id).await.expect("assignment");
    assert_eq!(assignment.primary_worker_id, Some(f.ada));
    assert_eq!(assignment.secondary_worker_id, Some(f.grace));

    let blind = f.app.member_of(f.ctx.tenant.tenant(), &[]);
    let err = tractors.assignment(&blind, id).await.expect_err("needs read");
    assert_eq!(err.kind, ErrorKind::Authorization);

    let reader = f
        .app
        .member_of(f.ctx.tenant.tenant(), &[(Resource::Tractor, Action::Read)]);
    tractors.assignment(&reader, id).await.expect("reader");

    let stranger = f.app.admin();
    let err = tractors.assignment(&stranger, id).await.expect_err("other tenant");
    assert_eq!(err.kind, ErrorKind::NotFound);

    let audited = f.app.audit.entries().await.len();
    tractors.assignment(&f.ctx, id).await.expect("assignment");
    assert_eq!(f.app.audit.entries().await.len(), audited);
}
