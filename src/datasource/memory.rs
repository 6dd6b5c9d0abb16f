use std::cmp::Ordering;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use super::DataSource;
use crate::domain::query::{FilterMap, QuerySpec, SortKey};
use crate::domain::result::ListResult;

type Matcher<T> = dyn Fn(&T, &FilterMap) -> bool + Send + Sync;
type Comparator<T> = dyn Fn(&T, &T, &[SortKey]) -> Ordering + Send + Sync;

/// Data source over a fixed set of rows. Filtering and ordering semantics
/// belong to the caller (they are endpoint-specific on the real API), so
/// both come in as closures. Used by the demo binary and tests.
pub struct InMemoryDataSource<T> {
    rows: Vec<T>,
    matcher: Box<Matcher<T>>,
    comparator: Option<Box<Comparator<T>>>,
    latency: Option<Duration>,
}

impl<T: Clone + Send + Sync + 'static> InMemoryDataSource<T> {
    pub fn new(rows: Vec<T>, matcher: impl Fn(&T, &FilterMap) -> bool + Send + Sync + 'static) -> Self {
        Self {
            rows,
            matcher: Box::new(matcher),
            comparator: None,
            latency: None,
        }
    }

    pub fn with_comparator(
        mut self,
        comparator: impl Fn(&T, &T, &[SortKey]) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.comparator = Some(Box::new(comparator));
        self
    }

    /// Simulated network delay before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> DataSource<T> for InMemoryDataSource<T> {
    async fn fetch(&self, query: &QuerySpec) -> Result<ListResult<T>> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut matching: Vec<T> = self
            .rows
            .iter()
            .filter(|row| (self.matcher)(row, &query.filters))
            .cloned()
            .collect();

        if let Some(comparator) = &self.comparator {
            if !query.sort.is_empty() {
                matching.sort_by(|a, b| comparator(a, b, &query.sort));
            }
        }

        let total = matching.len() as u64;
        let offset = query.page.saturating_sub(1) as usize * query.page_size as usize;
        let items: Vec<T> = matching
            .into_iter()
            .skip(offset)
            .take(query.page_size as usize)
            .collect();

        Ok(ListResult::answering(query, items, total))
    }
}
