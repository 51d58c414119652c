mod ident;
pub mod postgres;
pub mod sqlite;

pub use self::postgres::PostgresBackend;
pub use self::sqlite::SqliteBackend;

/// Name of the version-tracking table unless configured otherwise.
pub const DEFAULT_VERSION_TABLE: &str = "_ratchet_version";
