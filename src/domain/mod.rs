pub mod query;
pub mod result;
pub mod state;
