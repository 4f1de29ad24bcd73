// Common test utilities and fixtures

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items
// Note: These may appear unused in unit tests but are used in integration tests
#[allow(unused_imports)]
pub use fixtures::{articles_mapping, titles_mapping, TestDatabase};
#[allow(unused_imports)]
pub use helpers::{build_index, create_test_services, create_test_services_with, ids_of, TestEnv};
