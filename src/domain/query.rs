use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Filter keys are page-defined; the controller never inspects the values.
/// BTreeMap keeps query-string encoding deterministic.
pub type FilterMap = BTreeMap<String, FilterValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterValue {
    Text(String),
    Int(i64),
    Set(Vec<String>),
    DateRange {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
}

impl FilterValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn set(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Set(values.into_iter().map(Into::into).collect())
    }

    pub fn date_range(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self::DateRange { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// The versioned description of one list fetch: filters, pagination and sort
/// plus the revision the controller stamped it with. Immutable once issued;
/// every parameter change produces a new spec with a higher revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub filters: FilterMap,
    pub page: u32,
    pub page_size: u32,
    pub sort: Vec<SortKey>,
    revision: u64,
}

impl QuerySpec {
    /// Default spec: page 1, no filters, no sort, revision 0 (never issued).
    pub fn new(page_size: u32) -> Self {
        Self {
            filters: FilterMap::new(),
            page: 1,
            page_size,
            sort: Vec::new(),
            revision: 0,
        }
    }

    /// Revision assigned when this spec was issued; 0 means not yet issued.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Clone of this spec stamped with a fresh revision for issuing.
    pub(crate) fn reissued(&self, revision: u64) -> Self {
        let mut next = self.clone();
        next.revision = revision;
        next
    }
}
