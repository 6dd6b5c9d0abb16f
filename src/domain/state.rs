use crate::domain::query::QuerySpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Loaded,
    Error,
}

/// The externally observed controller state. `items`/`total` always hold the
/// last accepted result (kept on loading and on failed refreshes so the
/// table never flashes empty); `error` is set only while `status == Error`.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState<T> {
    pub status: FetchStatus,
    pub query: QuerySpec,
    pub items: Vec<T>,
    pub total: u64,
    pub error: Option<String>,
}

impl<T> ControllerState<T> {
    pub fn initial(query: QuerySpec) -> Self {
        Self {
            status: FetchStatus::Idle,
            query,
            items: Vec::new(),
            total: 0,
            error: None,
        }
    }

    /// True once a result for the current query has been accepted.
    pub fn is_loaded(&self) -> bool {
        self.status == FetchStatus::Loaded
    }

    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }
}
