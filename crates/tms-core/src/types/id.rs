//! Typed identifiers for tenants, actors and records.
//!
//! All identifiers are UUIDv7 so rows sort by creation time. The `sqlx`
//! feature maps each of them onto a PostgreSQL `uuid` column.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::validation::{ErrorCode, MultiError};

macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new time-ordered identifier.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// The nil identifier.
            pub fn nil() -> Self {
                Self(Uuid::nil())
            }

            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            /// Parse `value` as an identifier carried by `field`, reporting a
            /// malformed value as a validation error on that field.
            pub fn parse_field(field: &str, value: &str) -> Result<Self, AppError> {
                Uuid::parse_str(value.trim()).map(Self).map_err(|_| {
                    let mut errors = MultiError::new();
                    errors.add(
                        field,
                        ErrorCode::Invalid,
                        format!("'{value}' is not a valid identifier"),
                    );
                    AppError::invalid(errors)
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }

        #[cfg(feature = "sqlx")]
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <Uuid as sqlx::Type<sqlx::Postgres>>::type_info()
            }
        }

        #[cfg(feature = "sqlx")]
        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as sqlx::Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <Uuid as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }

        #[cfg(feature = "sqlx")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as sqlx::Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                <Uuid as sqlx::Decode<'r, sqlx::Postgres>>::decode(value).map(Self)
            }
        }
    };
}

define_id!(
    /// Identifier of an organization, the outer tenant boundary.
    OrganizationId
);

define_id!(
    /// Identifier of a business unit inside an organization.
    BusinessUnitId
);

define_id!(
    /// Identifier of a user acting on behalf of a tenant.
    UserId
);

define_id!(
    /// Identifier of a persisted domain record or child record.
    RecordId
);

define_id!(
    /// Identifier of an audit entry.
    AuditEntryId
);

define_id!(
    /// Identifier of a permission grant.
    GrantId
);
