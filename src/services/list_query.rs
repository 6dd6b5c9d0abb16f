use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Notify};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::datasource::DataSource;
use crate::domain::query::{FilterValue, QuerySpec, SortKey};
use crate::domain::result::ListResult;
use crate::domain::state::{ControllerState, FetchStatus};
use crate::services::error_handling::ListSyncError;

/// Owns the query parameters of one list view and turns parameter changes
/// into well-ordered remote fetches.
///
/// Every issued fetch is stamped with a monotonically increasing revision;
/// a response is only accepted if its revision still matches the current
/// query when it arrives. The observable state therefore always reflects
/// the highest-revision issued query, never whichever response happened to
/// resolve last.
///
/// One controller per visible list view. Mutating calls are synchronous:
/// they flip the state to `Loading` (keeping the previous items on screen)
/// and spawn the fetch on the ambient tokio runtime. Cloning the handle
/// shares the same controller.
pub struct ListQueryController<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ListQueryController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct Inner<T> {
    id: Uuid,
    source: Arc<dyn DataSource<T>>,
    state: watch::Sender<ControllerState<T>>,
    next_revision: AtomicU64,
    disposed: AtomicBool,
    in_flight: AtomicU64,
    stale_discards: AtomicU64,
    idle: Notify,
}

impl<T: Clone + Send + Sync + 'static> ListQueryController<T> {
    /// Creates an idle controller with default query parameters (page 1, no
    /// filters, no sort). No fetch is issued until the first mutating call;
    /// call [`refetch`](Self::refetch) for the initial load.
    pub fn new(source: Arc<dyn DataSource<T>>, page_size: u32) -> Result<Self, ListSyncError> {
        if page_size == 0 {
            return Err(ListSyncError::InvalidPageSize { page_size });
        }
        let query = QuerySpec::new(page_size);
        let (state, _) = watch::channel(ControllerState::initial(query));
        Ok(Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                source,
                state,
                next_revision: AtomicU64::new(0),
                disposed: AtomicBool::new(false),
                in_flight: AtomicU64::new(0),
                stale_discards: AtomicU64::new(0),
                idle: Notify::new(),
            }),
        })
    }

    /// Merges the given keys into the current filters (`Some` sets, `None`
    /// clears; untouched keys keep their value), resets the page to 1 and
    /// issues a fetch.
    pub fn set_filters(
        &self,
        patch: impl IntoIterator<Item = (String, Option<FilterValue>)>,
    ) -> Result<(), ListSyncError> {
        self.mutate(move |query| {
            let mut next = query.clone();
            for (key, value) in patch {
                match value {
                    Some(value) => {
                        next.filters.insert(key, value);
                    }
                    None => {
                        next.filters.remove(&key);
                    }
                }
            }
            next.page = 1;
            Some(next)
        })
    }

    /// Moves to the given 1-indexed page, preserving filters and sort.
    /// A no-op if the page is unchanged.
    pub fn set_page(&self, page: u32) -> Result<(), ListSyncError> {
        if page == 0 {
            return Err(ListSyncError::InvalidPage { page });
        }
        self.mutate(move |query| {
            if query.page == page {
                return None;
            }
            let mut next = query.clone();
            next.page = page;
            Some(next)
        })
    }

    /// Changes the page size and resets to page 1 (the old offset is
    /// meaningless under a new page size).
    pub fn set_page_size(&self, page_size: u32) -> Result<(), ListSyncError> {
        if page_size == 0 {
            return Err(ListSyncError::InvalidPageSize { page_size });
        }
        self.mutate(move |query| {
            let mut next = query.clone();
            next.page_size = page_size;
            next.page = 1;
            Some(next)
        })
    }

    /// Replaces the sort order and resets to page 1.
    pub fn set_sort(&self, sort: Vec<SortKey>) -> Result<(), ListSyncError> {
        self.mutate(move |query| {
            let mut next = query.clone();
            next.sort = sort;
            next.page = 1;
            Some(next)
        })
    }

    /// Re-issues the current query verbatim. This is the call mutation
    /// collaborators (create/update/delete modals) make after a successful
    /// side effect: it always reads the controller's own current query, so
    /// the user's page and filter context survive the refresh.
    pub fn refetch(&self) -> Result<(), ListSyncError> {
        self.mutate(|query| Some(query.clone()))
    }

    /// Synchronous snapshot of the current state. Never suspends.
    pub fn state(&self) -> ControllerState<T> {
        self.inner.state.borrow().clone()
    }

    /// Watch-based subscription; receivers are notified of the latest
    /// accepted state (intermediate states may be coalesced for slow
    /// readers, as usual for a watch channel).
    pub fn subscribe(&self) -> watch::Receiver<ControllerState<T>> {
        self.inner.state.subscribe()
    }

    pub fn current_revision(&self) -> u64 {
        self.inner.state.borrow().query.revision()
    }

    /// Count of every discarded response: those superseded by a
    /// newer query AND those arriving after [`dispose`](Self::dispose).
    /// Dispose-time drops are counted here because disposal treats all
    /// in-flight fetches as stale. Debug/test observability for the
    /// staleness guarantee.
    pub fn stale_discards(&self) -> u64 {
        self.inner.stale_discards.load(Ordering::Acquire)
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Marks the controller inactive. In-flight responses are discarded on
    /// arrival and every later mutating call becomes a no-op. Terminal.
    pub fn dispose(&self) {
        if !self.inner.disposed.swap(true, Ordering::AcqRel) {
            debug!(controller = %self.inner.id, "controller disposed");
        }
    }

    /// Waits until no fetches are in flight. Observational only; used by
    /// tests and at teardown.
    pub async fn quiesce(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.inner.in_flight.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Applies `build` to the current query; `None` means no change and no
    /// fetch. Otherwise stamps the next revision, flips status to `Loading`
    /// while keeping the previous items visible, and spawns the fetch.
    fn mutate<F>(&self, build: F) -> Result<(), ListSyncError>
    where
        F: FnOnce(&QuerySpec) -> Option<QuerySpec>,
    {
        if self.inner.disposed.load(Ordering::Acquire) {
            debug!(controller = %self.inner.id, "mutating call after dispose ignored");
            return Ok(());
        }

        let mut issued: Option<QuerySpec> = None;
        self.inner.state.send_if_modified(|state| {
            let Some(next) = build(&state.query) else {
                return false;
            };
            let revision = self.inner.next_revision.fetch_add(1, Ordering::AcqRel) + 1;
            let next = next.reissued(revision);
            state.query = next.clone();
            state.status = FetchStatus::Loading;
            // error belongs to the superseded query; a retry must not show
            // the old banner under the loading overlay
            state.error = None;
            // items/total deliberately untouched: stale data stays visible
            // under the loading indicator instead of flashing empty
            issued = Some(next);
            true
        });

        if let Some(query) = issued {
            self.spawn_fetch(query);
        }
        Ok(())
    }

    fn spawn_fetch(&self, query: QuerySpec) {
        let inner = self.inner.clone();
        inner.in_flight.fetch_add(1, Ordering::AcqRel);
        debug!(
            controller = %inner.id,
            revision = query.revision(),
            page = query.page,
            page_size = query.page_size,
            "issuing list fetch"
        );
        tokio::spawn(async move {
            let outcome = inner.source.fetch(&query).await;
            inner.reconcile(query, outcome);
            inner.in_flight.fetch_sub(1, Ordering::AcqRel);
            inner.idle.notify_waiters();
        });
    }
}

impl<T: Clone + Send + Sync + 'static> Inner<T> {
    fn reconcile(&self, query: QuerySpec, outcome: anyhow::Result<ListResult<T>>) {
        if self.disposed.load(Ordering::Acquire) {
            self.stale_discards.fetch_add(1, Ordering::AcqRel);
            debug!(
                controller = %self.id,
                revision = query.revision(),
                "dropping response that arrived after dispose"
            );
            return;
        }

        self.state.send_if_modified(|state| {
            if state.query.revision() != query.revision() {
                self.stale_discards.fetch_add(1, Ordering::AcqRel);
                debug!(
                    controller = %self.id,
                    stale_revision = query.revision(),
                    current_revision = state.query.revision(),
                    "discarding stale list response"
                );
                return false;
            }

            match outcome.and_then(|result| check_contract(&query, result)) {
                Ok(result) => {
                    state.items = result.items;
                    state.total = result.total;
                    state.status = FetchStatus::Loaded;
                    state.error = None;
                }
                Err(error) => {
                    warn!(
                        controller = %self.id,
                        revision = query.revision(),
                        error = %error,
                        "list fetch failed"
                    );
                    state.status = FetchStatus::Error;
                    state.error = Some(error.to_string());
                    // previous items/total retained: a failed refresh must
                    // not blank the table
                }
            }
            true
        });
    }
}

/// A source answering with more items than the page size, or for a revision
/// it was not asked about, has broken the fetch contract.
fn check_contract<T>(query: &QuerySpec, result: ListResult<T>) -> anyhow::Result<ListResult<T>> {
    if result.items.len() > query.page_size as usize {
        return Err(ListSyncError::PageOverflow {
            got: result.items.len(),
            page_size: query.page_size,
        }
        .into());
    }
    if result.responding_revision() != query.revision() {
        return Err(ListSyncError::RevisionMismatch {
            got: result.responding_revision(),
            expected: query.revision(),
        }
        .into());
    }
    Ok(result)
}
