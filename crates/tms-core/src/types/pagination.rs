//! List and lookup options for tenant-scoped queries.

use serde::{Deserialize, Serialize};

use crate::types::filter::FilterField;
use crate::types::id::RecordId;
use crate::types::sorting::SortField;

/// Default number of rows returned by a list query.
pub const DEFAULT_LIMIT: u64 = 25;
/// Maximum number of rows a single list query may return.
pub const MAX_LIMIT: u64 = 100;

/// Parameters of a list query. The tenant is supplied separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOptions {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    /// Free-text query matched against the record's search fields.
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub filters: Vec<FilterField>,
    #[serde(default)]
    pub sort: Vec<SortField>,
    /// Load child collections and other relations.
    #[serde(default)]
    pub expand_relations: bool,
}

impl ListOptions {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self {
            limit,
            offset,
            ..Self::default()
        }
    }

    /// Effective `LIMIT`, clamped to `1..=MAX_LIMIT`.
    pub fn limit(&self) -> u64 {
        self.limit.clamp(1, MAX_LIMIT)
    }

    /// Effective `OFFSET`.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Trimmed, non-empty free-text query.
    pub fn search_term(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_filter(mut self, filter: FilterField) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_sort(mut self, sort: SortField) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn expanded(mut self) -> Self {
        self.expand_relations = true;
        self
    }
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            query: None,
            filters: Vec::new(),
            sort: Vec::new(),
            expand_relations: false,
        }
    }
}

/// Parameters of a single-record lookup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOptions {
    pub id: RecordId,
    #[serde(default)]
    pub expand_relations: bool,
}

impl GetOptions {
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            expand_relations: false,
        }
    }

    pub fn expanded(id: RecordId) -> Self {
        Self {
            id,
            expand_relations: true,
        }
    }
}

/// One page of a list query and the total number of matching rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> ListResult<T> {
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

/// Compact `{value, label, color}` projection used by pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(ListOptions::new(0, 0).limit(), 1);
        assert_eq!(ListOptions::new(500, 0).limit(), MAX_LIMIT);
        assert_eq!(ListOptions::default().limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn test_blank_query_is_ignored() {
        let opts = ListOptions::default().with_query("   ");
        assert_eq!(opts.search_term(), None);
        let opts = ListOptions::default().with_query(" TRK ");
        assert_eq!(opts.search_term(), Some("TRK"));
    }
}
