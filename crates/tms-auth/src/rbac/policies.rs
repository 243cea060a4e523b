//! Role-to-permission mapping definitions.

use std::collections::{HashMap, HashSet};

use tms_core::types::{Action, Resource};
use tms_entity::permission::TenantRole;

/// Permissions a tenant role carries without any explicit grant.
#[derive(Debug, Clone)]
pub struct RolePolicies {
    /// Role → set of `(resource, action)` pairs.
    policies: HashMap<TenantRole, HashSet<(Resource, Action)>>,
}

impl RolePolicies {
    /// Creates the default policy set.
    ///
    /// Admins manage every resource of their tenant. Members hold nothing
    /// beyond their explicit grants.
    pub fn new() -> Self {
        let mut policies = HashMap::new();

        let admin: HashSet<(Resource, Action)> = Resource::all()
            .iter()
            .map(|resource| (*resource, Action::Manage))
            .collect();
        policies.insert(TenantRole::Admin, admin);
        policies.insert(TenantRole::Member, HashSet::new());

        Self { policies }
    }

    /// Give every holder of `role` `action` on `resource`.
    pub fn with_default(mut self, role: TenantRole, resource: Resource, action: Action) -> Self {
        self.policies
            .entry(role)
            .or_default()
            .insert((resource, action));
        self
    }

    /// Checks whether `role` alone allows `action` on `resource`.
    pub fn has_permission(&self, role: TenantRole, resource: Resource, action: Action) -> bool {
        self.policies.get(&role).is_some_and(|granted| {
            granted
                .iter()
                .any(|(r, a)| *r == resource && a.covers(action))
        })
    }
}

impl Default for RolePolicies {
    fn default() -> Self {
        Self::new()
    }
}
