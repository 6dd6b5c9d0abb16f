pub mod datasource;
pub mod domain;
pub mod services;

// Make test_helpers available for integration tests
pub mod test_helpers;
