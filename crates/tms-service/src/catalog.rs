//! Wiring of repositories and services.
//!
//! Every collaborator is constructed here and injected through
//! constructors; nothing is global.

use std::sync::Arc;

use tms_auth::PolicyPermissionService;
use tms_core::AppResult;
use tms_core::config::{AuditConfig, ValidationConfig};
use tms_core::traits::{DomainRecord, PermissionService, UniquenessChecker, VersionedRepository};
use tms_database::memory::{
    MemoryAuditRepository, MemoryGrantStore, MemoryRepository, MemoryUniquenessChecker,
};
use tms_database::repositories::{
    PgAuditLogRepository, PgPermissionGrantRepository, PgRecordRepository, PgUniquenessChecker,
};
use tms_database::{AuditRepository, DatabasePool, MemoryStore, PermissionGrantStore, PgTable};
use tms_entity::{Commodity, EquipmentType, Location, Tractor, Worker};

use crate::audit::AuditService;
use crate::record::RecordService;
use crate::tractor::{
    DistinctWorkersRule, EquipmentClassRule, PrimaryWorkerAvailabilityRule, WorkerReferenceRule,
};
use crate::validation::{EngineConfig, RecordValidator};

/// Storage backends for every record type and framework seam.
#[derive(Clone)]
pub struct Repositories {
    pub commodities: Arc<dyn VersionedRepository<Commodity>>,
    pub equipment_types: Arc<dyn VersionedRepository<EquipmentType>>,
    pub workers: Arc<dyn VersionedRepository<Worker>>,
    pub tractors: Arc<dyn VersionedRepository<Tractor>>,
    pub locations: Arc<dyn VersionedRepository<Location>>,
    pub uniqueness: Arc<dyn UniquenessChecker>,
    pub audit: Arc<dyn AuditRepository>,
    pub grants: Arc<dyn PermissionGrantStore>,
    /// The record repositories check uniqueness inside their own write
    /// transactions, so validators leave that rule out.
    pub single_connection: bool,
}

impl Repositories {
    /// Everything backed by one [`MemoryStore`].
    pub fn in_memory(store: MemoryStore, grants: MemoryGrantStore) -> Self {
        Self::in_memory_with(store, grants, &ValidationConfig::default())
    }

    /// [`in_memory`](Self::in_memory), honouring `validation.single_connection`.
    pub fn in_memory_with(
        store: MemoryStore,
        grants: MemoryGrantStore,
        validation: &ValidationConfig,
    ) -> Self {
        let single = validation.single_connection;
        Self {
            commodities: memory_repo(&store, single),
            equipment_types: memory_repo(&store, single),
            workers: memory_repo(&store, single),
            tractors: memory_repo(&store, single),
            locations: memory_repo(&store, single),
            uniqueness: Arc::new(MemoryUniquenessChecker::new(store)),
            audit: Arc::new(MemoryAuditRepository::new()),
            grants: Arc::new(grants),
            single_connection: single,
        }
    }

    /// Everything backed by PostgreSQL.
    pub fn postgres(db: &DatabasePool, validation: &ValidationConfig) -> Self {
        let pool = db.pool().clone();
        let single = validation.single_connection;
        Self {
            commodities: pg_repo(db, single),
            equipment_types: pg_repo(db, single),
            workers: pg_repo(db, single),
            tractors: pg_repo(db, single),
            locations: pg_repo(db, single),
            uniqueness: Arc::new(PgUniquenessChecker::new(pool.clone())),
            audit: Arc::new(PgAuditLogRepository::new(pool.clone())),
            grants: Arc::new(PgPermissionGrantRepository::new(pool)),
            single_connection: single,
        }
    }

    /// Replace the audit sink.
    pub fn with_audit(mut self, audit: Arc<dyn AuditRepository>) -> Self {
        self.audit = audit;
        self
    }
}

/// One service per record type, plus the audit trail.
#[derive(Clone)]
pub struct ServiceCatalog {
    pub commodities: RecordService<Commodity>,
    pub equipment_types: RecordService<EquipmentType>,
    pub workers: RecordService<Worker>,
    pub tractors: RecordService<Tractor>,
    pub locations: RecordService<Location>,
    pub audit: Arc<AuditService>,
    pub permissions: Arc<dyn PermissionService>,
}

impl ServiceCatalog {
    /// Build with the default permission service over `repos.grants`.
    pub fn new(
        repos: Repositories,
        audit: AuditConfig,
        validation: &ValidationConfig,
    ) -> AppResult<Self> {
        let permissions: Arc<dyn PermissionService> =
            Arc::new(PolicyPermissionService::new(Arc::clone(&repos.grants)));
        Self::with_permissions(repos, permissions, audit, validation)
    }

    pub fn with_permissions(
        repos: Repositories,
        permissions: Arc<dyn PermissionService>,
        audit: AuditConfig,
        validation: &ValidationConfig,
    ) -> AppResult<Self> {
        let engine = EngineConfig::from(validation);
        let audit = Arc::new(AuditService::new(
            Arc::clone(&repos.audit),
            Arc::clone(&permissions),
            audit,
        )?);

        let tractor_validator = standard_validator::<Tractor>(engine, &repos)
            .with_rule(Arc::new(WorkerReferenceRule::new(Arc::clone(&repos.workers))))
            .with_rule(Arc::new(EquipmentClassRule::new(Arc::clone(&repos.equipment_types))))
            .with_rule(Arc::new(DistinctWorkersRule))
            .with_rule(Arc::new(PrimaryWorkerAvailabilityRule::new(Arc::clone(&repos.tractors))));

        let wire = Wiring {
            permissions: &permissions,
            audit: &audit,
        };
        let commodities = wire.service(&repos.commodities, standard_validator(engine, &repos));
        let equipment_types =
            wire.service(&repos.equipment_types, standard_validator(engine, &repos));
        let workers = wire.service(&repos.workers, standard_validator(engine, &repos));
        let locations = wire.service(&repos.locations, standard_validator(engine, &repos));
        let tractors = wire.service(&repos.tractors, tractor_validator);

        Ok(Self {
            commodities,
            equipment_types,
            workers,
            tractors,
            locations,
            audit,
            permissions,
        })
    }
}

fn memory_repo<R: DomainRecord>(store: &MemoryStore, single: bool) -> Arc<dyn VersionedRepository<R>> {
    Arc::new(MemoryRepository::new(store.clone()).with_single_connection(single))
}

fn pg_repo<R: PgTable>(db: &DatabasePool, single: bool) -> Arc<dyn VersionedRepository<R>> {
    Arc::new(PgRecordRepository::new(db.pool().clone()).with_single_connection(single))
}

fn standard_validator<R: DomainRecord>(engine: EngineConfig, repos: &Repositories) -> RecordValidator<R> {
    let validator = RecordValidator::new(engine);
    if repos.single_connection {
        validator
    } else {
        validator.with_uniqueness(Arc::clone(&repos.uniqueness))
    }
}

struct Wiring<'a> {
    permissions: &'a Arc<dyn PermissionService>,
    audit: &'a Arc<AuditService>,
}

impl Wiring<'_> {
    fn service<R: DomainRecord>(
        &self,
        repo: &Arc<dyn VersionedRepository<R>>,
        validator: RecordValidator<R>,
    ) -> RecordService<R> {
        RecordService::new(
            Arc::clone(repo),
            Arc::clone(self.permissions),
            Arc::new(validator),
            Arc::clone(self.audit),
        )
    }
}
