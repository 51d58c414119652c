use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("target version missing: set RATCHET_TARGET_VERSION or pass --target")]
    TargetMissing,

    #[error("invalid target version: {0:?}")]
    InvalidTarget(String),

    #[error("target version {target} out of bounds: only {available} migrations defined")]
    TargetOutOfBounds { target: u64, available: usize },

    #[error("version table not initialized")]
    NotInitialized,

    #[error("stored version {stored} is ahead of the {available} migrations defined")]
    StoredVersionAhead { stored: u32, available: usize },

    #[error("migration source missing: {0}")]
    SourceMissing(String),

    #[error("failed to load migrations: {0}")]
    LoadFailed(String),

    #[error("invalid migration at version {version}: {reason}")]
    InvalidMigration { version: u32, reason: String },

    #[error("migration {version} has no down statement and cannot be reverted")]
    IrreversibleMigration { version: u32 },

    #[error("statement for migration {version} failed: {detail}")]
    StatementExecutionFailed { version: u32, detail: String },

    #[error("failed to record version {version}: {detail}")]
    VersionPersistenceFailed { version: u32, detail: String },

    #[error("database error: {0}")]
    Database(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),
}
