//! MindSage Store — SQLite FTS5 + int8 vector search + knowledge graph.

pub mod embedding;
pub mod graph;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::SqliteStore;
pub use types::*;
