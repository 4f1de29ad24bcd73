// Test fixtures: a small blog database

use rusqlite::Connection;
use searchbridge::core::config::{IndexMapping, RelationConfig, RelationKind};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tempfile::TempDir;

/// SQLite database with users, articles and comments
#[allow(dead_code)] // Used in integration tests
pub struct TestDatabase {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TestDatabase {
    /// Five articles by three authors; "rust" appears in articles 1, 2 and 4
    #[allow(dead_code)]
    pub fn blog() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("blog.db");
        let conn = Connection::open(&path).expect("Failed to create database");

        conn.execute_batch(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
             CREATE TABLE articles (
                 id INTEGER PRIMARY KEY,
                 title TEXT NOT NULL,
                 body TEXT,
                 author_id INTEGER,
                 views INTEGER,
                 rating REAL,
                 published_at INTEGER
             );
             CREATE TABLE comments (
                 id INTEGER PRIMARY KEY,
                 article_id INTEGER NOT NULL,
                 body TEXT NOT NULL
             );

             INSERT INTO users VALUES (1, 'Ada'), (2, 'Grace'), (3, 'Linus');

             INSERT INTO articles VALUES
                 (1, 'Rust ownership explained', 'Borrowing and lifetimes in rust', 1, 100, 4.5, 1700000000),
                 (2, 'Async rust in practice', 'Tokio runtime and futures', 2, 250, 4.8, 1700086400),
                 (3, 'Python tips', 'List comprehensions and generators', 3, 50, 3.9, 1700172800),
                 (4, 'Rust macros', 'Declarative macros in rust', 1, 300, 4.1, 1702000000),
                 (5, 'Databases', 'SQLite WHERE IN queries', 2, 10, 3.5, 1702100000);

             INSERT INTO comments VALUES
                 (1, 1, 'Great read'),
                 (2, 1, 'Thanks'),
                 (3, 4, 'Nice macros');",
        )
        .expect("Failed to seed database");

        Self { dir, path }
    }
}

/// Mapping for the `articles` index with both relations
#[allow(dead_code)]
pub fn articles_mapping() -> IndexMapping {
    IndexMapping {
        table: "articles".to_string(),
        column: "id".to_string(),
        primary_key: "id".to_string(),
        fields: vec!["title".to_string(), "body".to_string()],
        int_attrs: vec![
            "author_id".to_string(),
            "views".to_string(),
            "published_at".to_string(),
        ],
        float_attrs: vec!["rating".to_string()],
        relations: BTreeMap::from([
            (
                "author".to_string(),
                RelationConfig {
                    table: "users".to_string(),
                    local_key: "author_id".to_string(),
                    foreign_key: "id".to_string(),
                    kind: RelationKind::One,
                },
            ),
            (
                "comments".to_string(),
                RelationConfig {
                    table: "comments".to_string(),
                    local_key: "id".to_string(),
                    foreign_key: "article_id".to_string(),
                    kind: RelationKind::Many,
                },
            ),
        ]),
    }
}

/// Title-only mapping over the same table
#[allow(dead_code)]
pub fn titles_mapping() -> IndexMapping {
    IndexMapping {
        fields: vec!["title".to_string()],
        int_attrs: vec!["author_id".to_string()],
        float_attrs: vec![],
        relations: BTreeMap::new(),
        ..articles_mapping()
    }
}
