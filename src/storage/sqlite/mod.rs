pub mod sqlite;
pub mod sqlite_publishers;
pub mod sqlite_utilities;

pub use sqlite::SqliteStorage;
