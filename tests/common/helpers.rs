// Test helper functions

use crate::common::fixtures::{articles_mapping, titles_mapping, TestDatabase};
use searchbridge::core::config::Config;
use searchbridge::core::services::Services;
use searchbridge::core::types::{IndexStats, Record};
use std::sync::Arc;
use tempfile::TempDir;

/// Services over the blog database plus the directories they live in
#[allow(dead_code)] // Used in integration tests
pub struct TestEnv {
    pub services: Arc<Services>,
    pub db: TestDatabase,
    pub index_dir: TempDir,
}

/// Configuration with the `articles` and `titles` indexes
#[allow(dead_code)]
pub fn test_config(db: &TestDatabase, index_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.backend.index_dir = index_dir.path().to_path_buf();
    config.store.database = db.path.clone();
    config.default_index = Some("articles".to_string());
    config
        .indexes
        .insert("articles".to_string(), articles_mapping());
    config.indexes.insert("titles".to_string(), titles_mapping());
    config
}

/// Create test services with a fresh database and index directory
#[allow(dead_code)]
pub fn create_test_services() -> TestEnv {
    create_test_services_with(|_| {})
}

/// Like [`create_test_services`], with a hook to adjust the configuration
#[allow(dead_code)]
pub fn create_test_services_with(adjust: impl FnOnce(&mut Config)) -> TestEnv {
    let db = TestDatabase::blog();
    let index_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = test_config(&db, &index_dir);
    adjust(&mut config);

    TestEnv {
        services: Arc::new(Services::new(config)),
        db,
        index_dir,
    }
}

/// Build a configured index from the database
#[allow(dead_code)]
pub fn build_index(services: &Services, name: &str) -> IndexStats {
    let mapping = services
        .config
        .indexes
        .get(name)
        .unwrap_or_else(|| panic!("Index '{name}' is not configured"));

    services
        .create_pipeline()
        .build_index(name, mapping, false)
        .expect("Failed to build index")
}

/// Values of the `id` column, in record order
#[allow(dead_code)]
pub fn ids_of(records: &[Record]) -> Vec<u64> {
    records
        .iter()
        .map(|r| r.get("id").and_then(|v| v.as_u64()).expect("record without id"))
        .collect()
}
