use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use ratchet_common::Error;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub migrations: MigrationsConfig,
    /// Kept as text so malformed values surface as `InvalidTarget`.
    #[serde(deserialize_with = "target_as_text", skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub driver: Driver,
    /// SQLite file path or PostgreSQL connection string.
    pub url: Option<String>,
    /// PostgreSQL only; `public` when unset.
    pub schema: Option<String>,
    pub version_table: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationsConfig {
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    #[default]
    Sqlite,
    Postgres,
}

impl FromStr for Driver {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Driver::Postgres),
            other => Err(Error::Config(format!("unknown database driver: {other}"))),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Driver::Sqlite => f.write_str("sqlite"),
            Driver::Postgres => f.write_str("postgres"),
        }
    }
}

/// Accept any scalar (`target: 3`, `target: "3"`, `target: 1.5`) as text and
/// leave classification to target resolution.
fn target_as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        UInt(u64),
        Float(f64),
        Bool(bool),
        Text(String),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Int(n) => n.to_string(),
        Raw::UInt(n) => n.to_string(),
        // Debug keeps the fraction, so `2.0` stays non-integer.
        Raw::Float(f) => format!("{f:?}"),
        Raw::Bool(b) => b.to_string(),
        Raw::Text(s) => s,
    }))
}
