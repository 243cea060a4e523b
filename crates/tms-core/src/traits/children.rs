//! Child-collection reconciliation.
//!
//! Given the stored children of a parent and the set submitted with an
//! update, a [`ChildWriter`] is driven to make storage match the submitted
//! set: stored children missing from it are deleted, submitted children
//! with an id are updated, submitted children without an id are created.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::RecordId;

/// Storage side of a reconciliation. Runs inside the parent's transaction.
#[async_trait]
pub trait ChildWriter<C>: Send
where
    C: Send + 'static,
{
    /// Persist a new child. The returned child carries its assigned id.
    async fn insert(&mut self, child: C) -> AppResult<C>;

    /// Overwrite an existing child of the parent.
    async fn update(&mut self, child: C) -> AppResult<C>;

    /// Remove a child of the parent.
    async fn delete(&mut self, id: RecordId) -> AppResult<()>;
}

/// Operations a reconciliation will perform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub delete: Vec<RecordId>,
    pub update: Vec<RecordId>,
    pub create: usize,
}

/// Work out which children to delete, update and create.
pub fn plan_children<C, K>(existing: &[C], incoming: &[C], key: K) -> ReconcilePlan
where
    K: Fn(&C) -> Option<RecordId>,
{
    let keep: HashSet<RecordId> = incoming.iter().filter_map(&key).collect();
    ReconcilePlan {
        delete: existing
            .iter()
            .filter_map(&key)
            .filter(|id| !keep.contains(id))
            .collect(),
        update: incoming.iter().filter_map(&key).collect(),
        create: incoming.iter().filter(|&c| key(c).is_none()).count(),
    }
}

/// Make storage match `incoming` and return the persisted children in
/// submission order.
pub async fn reconcile_children<C, K, W>(
    existing: &[C],
    incoming: Vec<C>,
    key: K,
    writer: &mut W,
) -> AppResult<Vec<C>>
where
    C: Send + 'static,
    K: Fn(&C) -> Option<RecordId>,
    W: ChildWriter<C> + ?Sized,
{
    let plan = plan_children(existing, &incoming, &key);

    for id in plan.delete {
        writer.delete(id).await?;
    }

    let mut slots: Vec<Option<C>> = Vec::with_capacity(incoming.len());
    let mut fresh = Vec::new();
    for (index, child) in incoming.into_iter().enumerate() {
        if key(&child).is_some() {
            slots.push(Some(writer.update(child).await?));
        } else {
            slots.push(None);
            fresh.push((index, child));
        }
    }

    for (index, child) in fresh {
        slots[index] = Some(writer.insert(child).await?);
    }

    Ok(slots.into_iter().flatten().collect())
}
