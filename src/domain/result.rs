use serde::{Deserialize, Serialize};

use crate::domain::query::QuerySpec;

/// One page of records from a data source, tagged with the revision of the
/// query it answers so the controller can detect out-of-order arrivals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    /// Total matching records server-side, independent of page size.
    pub total: u64,
    responding_revision: u64,
}

impl<T> ListResult<T> {
    /// Builds a result answering the given query. Data sources must tag
    /// their results with the query that produced them.
    pub fn answering(query: &QuerySpec, items: Vec<T>, total: u64) -> Self {
        Self {
            items,
            total,
            responding_revision: query.revision(),
        }
    }

    pub fn responding_revision(&self) -> u64 {
        self.responding_revision
    }
}
