pub mod loader;
pub mod model;
pub mod source;

pub use loader::{ConfigLoader, apply_env_overrides};
pub use model::{AppConfig, DatabaseConfig, Driver, MigrationsConfig};
pub use source::MigrationFile;

/// Path of the migration YAML file.
pub const ENV_FILE: &str = "RATCHET_FILE";
/// Requested target version.
pub const ENV_TARGET: &str = "RATCHET_TARGET_VERSION";
/// SQLite path or PostgreSQL connection string.
pub const ENV_DATABASE_URL: &str = "RATCHET_DATABASE_URL";
/// `sqlite` or `postgres`.
pub const ENV_DATABASE_DRIVER: &str = "RATCHET_DATABASE_DRIVER";
/// PostgreSQL schema holding the version table.
pub const ENV_SCHEMA: &str = "RATCHET_SCHEMA";
