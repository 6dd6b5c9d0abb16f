use std::marker::PhantomData;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::DataSource;
use crate::domain::query::{FilterValue, QuerySpec, SortDirection, SortKey};
use crate::domain::result::ListResult;

/// Data source backed by a paginated-list REST endpoint.
///
/// Sends `GET <endpoint>?page=..&page_size=..&sort=..&<filters>` and expects
/// a `{ "items": [...], "total": n }` JSON body. Sort is comma-joined with a
/// `-` prefix for descending fields; date-range filters expand into
/// `<key>_from` / `<key>_to` pairs; set filters are comma-joined.
pub struct HttpDataSource<T> {
    client: Client,
    endpoint: String,
    _marker: PhantomData<fn() -> T>,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    items: Vec<T>,
    total: u64,
}

impl<T> HttpDataSource<T> {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    /// Reuse an externally owned client (shared connection pool, auth
    /// middleware and so on).
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            _marker: PhantomData,
        }
    }

    fn query_pairs(query: &QuerySpec) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), query.page.to_string()),
            ("page_size".to_string(), query.page_size.to_string()),
        ];
        if !query.sort.is_empty() {
            pairs.push(("sort".to_string(), sort_param(&query.sort)));
        }
        for (key, value) in &query.filters {
            match value {
                FilterValue::Text(text) => pairs.push((key.clone(), text.clone())),
                FilterValue::Int(n) => pairs.push((key.clone(), n.to_string())),
                FilterValue::Set(values) => pairs.push((key.clone(), values.join(","))),
                FilterValue::DateRange { start, end } => {
                    if let Some(start) = start {
                        pairs.push((format!("{}_from", key), start.to_rfc3339()));
                    }
                    if let Some(end) = end {
                        pairs.push((format!("{}_to", key), end.to_rfc3339()));
                    }
                }
            }
        }
        pairs
    }
}

fn sort_param(sort: &[SortKey]) -> String {
    sort.iter()
        .map(|key| match key.direction {
            SortDirection::Ascending => key.field.clone(),
            SortDirection::Descending => format!("-{}", key.field),
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl<T> DataSource<T> for HttpDataSource<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    async fn fetch(&self, query: &QuerySpec) -> Result<ListResult<T>> {
        let pairs = Self::query_pairs(query);
        debug!(
            endpoint = %self.endpoint,
            page = query.page,
            page_size = query.page_size,
            "fetching list page"
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&pairs)
            .send()
            .await
            .with_context(|| format!("list request to {} failed", self.endpoint))?
            .error_for_status()
            .with_context(|| format!("list request to {} rejected", self.endpoint))?;

        let envelope: ListEnvelope<T> = response
            .json()
            .await
            .with_context(|| format!("malformed list envelope from {}", self.endpoint))?;

        Ok(ListResult::answering(query, envelope.items, envelope.total))
    }
}
