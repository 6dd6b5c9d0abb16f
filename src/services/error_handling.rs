use thiserror::Error;

/// Errors the list-query machinery can produce. Validation variants are
/// returned synchronously from mutating calls before any state changes; the
/// contract variants are raised during reconciliation and surface as error
/// state for the current revision, never as a thrown error.
#[derive(Error, Debug)]
pub enum ListSyncError {
    #[error("invalid page number: {page} (pages are 1-indexed)")]
    InvalidPage { page: u32 },

    #[error("invalid page size: {page_size}")]
    InvalidPageSize { page_size: u32 },

    #[error("data source returned {got} items for a page size of {page_size}")]
    PageOverflow { got: usize, page_size: u32 },

    #[error("data source answered revision {got}, expected {expected}")]
    RevisionMismatch { got: u64, expected: u64 },
}
