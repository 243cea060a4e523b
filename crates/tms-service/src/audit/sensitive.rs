//! Masking of sensitive fields before audit entries are persisted.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tms_core::AppResult;
use tms_core::types::Resource;

use super::diff::Changes;

/// Replacement written in place of a masked value.
pub const MASK: &str = "****";

/// What happens to a sensitive field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitiveAction {
    /// Keep the key, replace a non-null value with [`MASK`].
    #[default]
    Mask,
    /// Drop the key entirely.
    Omit,
}

/// Sensitive field names per resource. Matching is on the key at any depth.
#[derive(Debug, Default)]
pub struct SensitiveFields {
    fields: DashMap<Resource, Vec<(String, SensitiveAction)>>,
}

impl SensitiveFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `resource name -> masked field names`.
    pub fn from_config<'a, I>(entries: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a Vec<String>)>,
    {
        let registry = Self::new();
        for (resource, fields) in entries {
            let resource = resource.parse::<Resource>()?;
            for field in fields {
                registry.register(resource, field.clone(), SensitiveAction::Mask);
            }
        }
        Ok(registry)
    }

    /// Register or replace the treatment of `field` on `resource`.
    pub fn register(&self, resource: Resource, field: impl Into<String>, action: SensitiveAction) {
        let field = field.into();
        let mut entry = self.fields.entry(resource).or_default();
        match entry.iter_mut().find(|(name, _)| *name == field) {
            Some(existing) => existing.1 = action,
            None => entry.push((field, action)),
        }
    }

    fn action_for(&self, resource: Resource, key: &str) -> Option<SensitiveAction> {
        self.fields
            .get(&resource)?
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, action)| *action)
    }

    pub fn has_rules(&self, resource: Resource) -> bool {
        self.fields.get(&resource).is_some_and(|f| !f.is_empty())
    }

    /// Scrub a record snapshot in place.
    pub fn apply_to_state(&self, resource: Resource, state: &mut Value) {
        if !self.has_rules(resource) {
            return;
        }
        self.scrub(resource, state);
    }

    fn scrub(&self, resource: Resource, value: &mut Value) {
        match value {
            Value::Object(map) => {
                map.retain(|key, _| self.action_for(resource, key) != Some(SensitiveAction::Omit));
                for (key, field) in map.iter_mut() {
                    if self.action_for(resource, key) == Some(SensitiveAction::Mask) {
                        mask(field);
                    } else {
                        self.scrub(resource, field);
                    }
                }
            }
            Value::Array(items) => items.iter_mut().for_each(|item| self.scrub(resource, item)),
            _ => {}
        }
    }

    /// Scrub diff entries in place, keyed on the last path segment.
    pub fn apply_to_changes(&self, resource: Resource, changes: &mut Changes) {
        if !self.has_rules(resource) {
            return;
        }
        changes.retain(|path, change| {
            let key = path.rsplit('.').next().unwrap_or(path);
            match self.action_for(resource, key) {
                Some(SensitiveAction::Omit) => false,
                Some(SensitiveAction::Mask) => {
                    mask(&mut change.from);
                    mask(&mut change.to);
                    true
                }
                None => {
                    self.scrub(resource, &mut change.from);
                    self.scrub(resource, &mut change.to);
                    true
                }
            }
        });
    }
}

fn mask(value: &mut Value) {
    if !value.is_null() {
        *value = Value::String(MASK.to_string());
    }
}
