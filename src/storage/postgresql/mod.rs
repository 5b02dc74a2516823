pub mod postgresql;
pub mod postgresql_publishers;
pub mod postgresql_utilities;

pub use postgresql::PostgresStorage;
