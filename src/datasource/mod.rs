mod http;
mod memory;

pub use http::HttpDataSource;
pub use memory::InMemoryDataSource;

use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::query::QuerySpec;
use crate::domain::result::ListResult;

/// The fetch contract between the controller and whatever actually produces
/// list pages (REST client, in-memory fixture, ...). Implementations must tag
/// the result with the query's revision via [`ListResult::answering`] and are
/// free to be shared across controllers; the controller treats them as pure
/// async functions with no state of their own.
///
/// Retries, auth and response-shape mapping live behind this trait, not in
/// the controller.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DataSource<T: Send + Sync + 'static>: Send + Sync {
    async fn fetch(&self, query: &QuerySpec) -> Result<ListResult<T>>;
}
