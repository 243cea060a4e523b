//! Boilerplate shared by every [`DomainRecord`](tms_core::traits::DomainRecord)
//! implementation.

/// Expands to the framework accessors of a record that stores its
/// bookkeeping in `id`, `organization_id`, `business_unit_id`, `version`,
/// `created_at` and `updated_at` fields.
macro_rules! record_accessors {
    () => {
        fn id(&self) -> Option<::tms_core::types::RecordId> {
            self.id
        }

        fn set_id(&mut self, id: ::tms_core::types::RecordId) {
            self.id = Some(id);
        }

        fn tenant(&self) -> ::tms_core::types::Tenant {
            ::tms_core::types::Tenant::new(self.organization_id, self.business_unit_id)
        }

        fn set_tenant(&mut self, tenant: ::tms_core::types::Tenant) {
            self.organization_id = tenant.organization_id;
            self.business_unit_id = tenant.business_unit_id;
        }

        fn version(&self) -> i64 {
            self.version
        }

        fn set_version(&mut self, version: i64) {
            self.version = version;
        }

        fn created_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
            self.created_at
        }

        fn updated_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
            self.updated_at
        }

        fn set_timestamps(
            &mut self,
            created_at: ::chrono::DateTime<::chrono::Utc>,
            updated_at: ::chrono::DateTime<::chrono::Utc>,
        ) {
            self.created_at = created_at;
            self.updated_at = updated_at;
        }
    };
}

/// Expands to the [`ChildRecord`](tms_core::traits::ChildRecord) impl of a
/// child stored with `id`, tenant columns and the given parent field.
macro_rules! child_record {
    ($ty:ty, $parent:ident) => {
        impl ::tms_core::traits::ChildRecord for $ty {
            fn id(&self) -> Option<::tms_core::types::RecordId> {
                self.id
            }

            fn set_id(&mut self, id: ::tms_core::types::RecordId) {
                self.id = Some(id);
            }

            fn attach(
                &mut self,
                parent_id: ::tms_core::types::RecordId,
                tenant: ::tms_core::types::Tenant,
            ) {
                self.$parent = Some(parent_id);
                self.organization_id = tenant.organization_id;
                self.business_unit_id = tenant.business_unit_id;
            }
        }
    };
}

pub(crate) use child_record;
pub(crate) use record_accessors;
