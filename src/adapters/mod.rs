// Adapters layer: concrete implementations of the domain ports (local files, SQLite).

pub mod sqlite;
pub mod storage;

pub use sqlite::SqliteSink;
pub use storage::LocalStorage;
