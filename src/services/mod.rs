mod error_handling;
mod list_query;

pub use error_handling::ListSyncError;
pub use list_query::ListQueryController;
