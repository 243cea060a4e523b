//! Cross-entity rules for tractors.

use std::sync::Arc;

use async_trait::async_trait;

use tms_core::traits::VersionedRepository;
use tms_core::types::{FilterField, GetOptions, ListOptions, RecordId, TenantContext};
use tms_core::{AppResult, ErrorCode, ErrorKind, MultiError, ValidationContext};
use tms_entity::{EquipmentClass, EquipmentType, Tractor, Worker};

use crate::validation::{ValidationPriority, ValidationRule, ValidationStage};

/// Look up `id` in the tenant; a missing record is `None`, anything else
/// failing is a hard error.
async fn find<R>(
    repo: &dyn VersionedRepository<R>,
    tenant: &TenantContext,
    id: RecordId,
) -> AppResult<Option<R>>
where
    R: tms_core::traits::DomainRecord,
{
    match repo.get_by_id(tenant, &GetOptions::new(id)).await {
        Ok(record) => Ok(Some(record)),
        Err(e) if e.kind == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Assigned workers must exist in the tenant.
pub struct WorkerReferenceRule {
    workers: Arc<dyn VersionedRepository<Worker>>,
}

impl WorkerReferenceRule {
    pub fn new(workers: Arc<dyn VersionedRepository<Worker>>) -> Self {
        Self { workers }
    }
}

#[async_trait]
impl ValidationRule<Tractor> for WorkerReferenceRule {
    fn name(&self) -> &str {
        "tractor_worker_reference"
    }

    fn stage(&self) -> ValidationStage {
        ValidationStage::DataIntegrity
    }

    fn priority(&self) -> ValidationPriority {
        ValidationPriority::Low
    }

    async fn validate(
        &self,
        tractor: &Tractor,
        ctx: &ValidationContext,
        errors: &mut MultiError,
    ) -> AppResult<()> {
        let assigned = [
            ("primaryWorkerId", tractor.primary_worker_id),
            ("secondaryWorkerId", tractor.secondary_worker_id),
        ];
        for (field, id) in assigned {
            let Some(id) = id else { continue };
            if find(self.workers.as_ref(), &ctx.tenant, id).await?.is_none() {
                errors.add(field, ErrorCode::InvalidReference, "Worker not found");
            }
        }
        Ok(())
    }
}

/// The equipment type must exist and describe tractors.
pub struct EquipmentClassRule {
    equipment_types: Arc<dyn VersionedRepository<EquipmentType>>,
}

impl EquipmentClassRule {
    pub fn new(equipment_types: Arc<dyn VersionedRepository<EquipmentType>>) -> Self {
        Self { equipment_types }
    }
}

#[async_trait]
impl ValidationRule<Tractor> for EquipmentClassRule {
    fn name(&self) -> &str {
        "tractor_equipment_class"
    }

    fn stage(&self) -> ValidationStage {
        ValidationStage::CrossEntity
    }

    fn priority(&self) -> ValidationPriority {
        ValidationPriority::High
    }

    async fn validate(
        &self,
        tractor: &Tractor,
        ctx: &ValidationContext,
        errors: &mut MultiError,
    ) -> AppResult<()> {
        let Some(id) = tractor.equipment_type_id else {
            return Ok(());
        };

        match find(self.equipment_types.as_ref(), &ctx.tenant, id).await? {
            None => errors.add(
                "equipmentTypeId",
                ErrorCode::InvalidReference,
                "Equipment type not found",
            ),
            Some(equipment_type) if equipment_type.class != EquipmentClass::Tractor => errors.add(
                "equipmentTypeId",
                ErrorCode::Invalid,
                format!(
                    "Equipment type class must be Tractor, found {}",
                    equipment_type.class
                ),
            ),
            Some(_) => {}
        }
        Ok(())
    }
}

/// A tractor's two workers must differ.
pub struct DistinctWorkersRule;

#[async_trait]
impl ValidationRule<Tractor> for DistinctWorkersRule {
    fn name(&self) -> &str {
        "tractor_distinct_workers"
    }

    fn stage(&self) -> ValidationStage {
        ValidationStage::CrossEntity
    }

    async fn validate(
        &self,
        tractor: &Tractor,
        _ctx: &ValidationContext,
        errors: &mut MultiError,
    ) -> AppResult<()> {
        if tractor.secondary_worker_id.is_some()
            && tractor.secondary_worker_id == tractor.primary_worker_id
        {
            errors.add(
                "secondaryWorkerId",
                ErrorCode::Invalid,
                "Secondary worker cannot be the same as the primary worker",
            );
        }
        Ok(())
    }
}

/// A worker may be the primary worker of one tractor only.
pub struct PrimaryWorkerAvailabilityRule {
    tractors: Arc<dyn VersionedRepository<Tractor>>,
}

impl PrimaryWorkerAvailabilityRule {
    pub fn new(tractors: Arc<dyn VersionedRepository<Tractor>>) -> Self {
        Self { tractors }
    }
}

#[async_trait]
impl ValidationRule<Tractor> for PrimaryWorkerAvailabilityRule {
    fn name(&self) -> &str {
        "tractor_primary_worker_available"
    }

    fn stage(&self) -> ValidationStage {
        ValidationStage::CrossEntity
    }

    fn priority(&self) -> ValidationPriority {
        ValidationPriority::Low
    }

    async fn validate(
        &self,
        tractor: &Tractor,
        ctx: &ValidationContext,
        errors: &mut MultiError,
    ) -> AppResult<()> {
        let Some(worker_id) = tractor.primary_worker_id else {
            return Ok(());
        };

        let mut opts = ListOptions::new(1, 0)
            .with_filter(FilterField::eq("primaryWorkerId", worker_id.to_string()));
        if let Some(id) = tractor.id {
            opts = opts.with_filter(FilterField::ne("id", id.to_string()));
        }

        let taken = self.tractors.list(&ctx.tenant, &opts).await?;
        if let Some(other) = taken.items.first() {
            errors.add(
                "primaryWorkerId",
                ErrorCode::Invalid,
                format!("Worker is already the primary worker of tractor {}", other.code),
            );
        }
        Ok(())
    }
}
