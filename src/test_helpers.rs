// Test helpers for integration testing

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, Notify};
use uuid::Uuid;

use crate::datasource::DataSource;
use crate::domain::query::QuerySpec;
use crate::domain::result::ListResult;

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    pub id: Uuid,
    pub name: String,
}

impl SampleRow {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// Data source whose responses are resolved by hand, keyed by revision, so
/// tests can replay network races deterministically (resolve a later fetch
/// before an earlier one, fail a specific fetch, leave one hanging).
pub struct ManualDataSource<T> {
    inner: Arc<ManualInner<T>>,
}

struct ManualInner<T> {
    pending: Mutex<HashMap<u64, (QuerySpec, oneshot::Sender<Result<ListResult<T>>>)>>,
    arrived: Notify,
    calls: AtomicU64,
}

impl<T> Clone for ManualDataSource<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> ManualDataSource<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ManualInner {
                pending: Mutex::new(HashMap::new()),
                arrived: Notify::new(),
                calls: AtomicU64::new(0),
            }),
        }
    }

    pub fn call_count(&self) -> u64 {
        self.inner.calls.load(Ordering::Acquire)
    }

    /// Waits until a fetch for the given revision has been registered.
    pub async fn wait_for_call(&self, revision: u64) {
        loop {
            let notified = self.inner.arrived.notified();
            if self.inner.pending.lock().contains_key(&revision) {
                return;
            }
            notified.await;
        }
    }

    /// Answers the fetch for `revision` with the given page. Returns false
    /// if no such fetch is pending.
    pub fn resolve(&self, revision: u64, items: Vec<T>, total: u64) -> bool {
        let Some((query, sender)) = self.inner.pending.lock().remove(&revision) else {
            return false;
        };
        sender
            .send(Ok(ListResult::answering(&query, items, total)))
            .is_ok()
    }

    /// Answers the fetch for `revision` with an arbitrary outcome (use this
    /// to return oversized pages or mis-tagged revisions).
    pub fn resolve_with(&self, revision: u64, outcome: Result<ListResult<T>>) -> bool {
        let Some((_, sender)) = self.inner.pending.lock().remove(&revision) else {
            return false;
        };
        sender.send(outcome).is_ok()
    }

    /// Fails the fetch for `revision`.
    pub fn fail(&self, revision: u64, message: &str) -> bool {
        self.resolve_with(revision, Err(anyhow!("{}", message.to_string())))
    }

    /// The query a pending fetch was issued with.
    pub fn pending_query(&self, revision: u64) -> Option<QuerySpec> {
        self.inner
            .pending
            .lock()
            .get(&revision)
            .map(|(query, _)| query.clone())
    }
}

impl<T: Send + Sync + 'static> Default for ManualDataSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> DataSource<T> for ManualDataSource<T> {
    async fn fetch(&self, query: &QuerySpec) -> Result<ListResult<T>> {
        let (sender, receiver) = oneshot::channel();
        self.inner
            .pending
            .lock()
            .insert(query.revision(), (query.clone(), sender));
        self.inner.calls.fetch_add(1, Ordering::AcqRel);
        self.inner.arrived.notify_waiters();
        receiver
            .await
            .unwrap_or_else(|_| Err(anyhow!("fetch abandoned by test harness")))
    }
}

/// Polls `condition` until it holds or two seconds elapse.
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("condition not met within 2s");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
