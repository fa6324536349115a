//! Runtime settings for `ztat`.
//!
//! [`Config`] is the schema for every configuration layer: its field names are
//! the TOML keys of the config file, the suffixes of `ZTAT_*` environment
//! variables, and the dotted keys CLI flags override.
//!
//! | Dotted key          | Env var                 | Default                  |
//! |---------------------|-------------------------|--------------------------|
//! | `server.addr`       | `ZTAT_SERVER_ADDR`      | [`DEFAULT_SERVER_ADDR`]  |
//! | `database.user`     | `ZTAT_DATABASE_USER`    | empty                    |
//! | `database.password` | `ZTAT_DATABASE_PASSWORD`| empty                    |
//! | `database.host`     | `ZTAT_DATABASE_HOST`    | empty                    |
//! | `database.port`     | `ZTAT_DATABASE_PORT`    | [`DEFAULT_DATABASE_PORT`]|
//! | `database.dbname`   | `ZTAT_DATABASE_DBNAME`  | [`DEFAULT_DATABASE_DBNAME`] |
//! | `metrics.addr`      | `ZTAT_METRICS_ADDR`     | [`DEFAULT_METRICS_ADDR`] |
//! | `console`           | `ZTAT_CONSOLE`          | `false`                  |
//! | `logger.level`      | `ZTAT_LOGGER_LEVEL`     | platform table           |
//! | `logger.file_path`  | `ZTAT_LOGGER_FILE_PATH` | platform table           |
//!
//! `logger.*` has no compiled default here. Those values come from
//! [`PlatformDefaults`](crate::platform::PlatformDefaults), which the resolver
//! merges as the lowest file-like layer.

use std::fmt;

use serde::{Deserialize, Deserializer};

pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:9090";
pub const DEFAULT_DATABASE_PORT: u16 = 3306;
pub const DEFAULT_DATABASE_DBNAME: &str = "ztat";

/// All runtime configuration of the program.
#[derive(confique::Config, Debug, Clone, PartialEq)]
pub struct Config {
    /// Statistics server settings.
    #[config(nested)]
    pub server: ServerConfig,

    /// Database connection settings.
    #[config(nested)]
    pub database: DatabaseConfig,

    /// Metrics endpoint settings.
    #[config(nested)]
    pub metrics: MetricsConfig,

    /// Write log records to standard output instead of the log file.
    #[config(default = false, deserialize_with = weak::boolean)]
    pub console: bool,

    /// Logger settings.
    #[config(nested)]
    pub logger: LoggerConfig,
}

#[derive(confique::Config, Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Server address.
    #[config(default = "0.0.0.0:8080")]
    pub addr: String,
}

#[derive(confique::Config, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// Database user name.
    #[config(default = "")]
    pub user: String,

    /// Database password.
    #[config(default = "")]
    pub password: String,

    /// Database hostname.
    #[config(default = "")]
    pub host: String,

    /// Database port.
    #[config(default = 3306, deserialize_with = weak::port)]
    pub port: u16,

    /// Database name.
    #[config(default = "ztat")]
    pub dbname: String,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.password.is_empty() { "" } else { "***" };
        f.debug_struct("DatabaseConfig")
            .field("user", &self.user)
            .field("password", &password)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .finish()
    }
}

#[derive(confique::Config, Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Metrics server address.
    #[config(default = "0.0.0.0:9090")]
    pub addr: String,
}

#[derive(confique::Config, Debug, Clone, PartialEq)]
pub struct LoggerConfig {
    /// Logging priority: debug, info, warn, error or fatal.
    pub level: String,

    /// Log file path. Empty means standard output.
    pub file_path: String,
}

/// Weakly typed decoders: accept either the native TOML type or its string
/// spelling, since environment variables always arrive as strings.
mod weak {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose<T> {
        Native(T),
        Text(String),
    }

    pub(super) fn boolean<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Loose::<bool>::deserialize(deserializer)? {
            Loose::Native(b) => Ok(b),
            Loose::Text(s) => parse_bool(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid boolean '{s}'"))),
        }
    }

    pub(super) fn port<'de, D>(deserializer: D) -> Result<u16, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Loose::<i64>::deserialize(deserializer)? {
            Loose::Native(n) => u16::try_from(n)
                .map_err(|_| serde::de::Error::custom(format!("port {n} out of range"))),
            Loose::Text(s) => s
                .trim()
                .parse::<u16>()
                .map_err(|e| serde::de::Error::custom(format!("invalid port '{s}': {e}"))),
        }
    }

    pub(super) fn parse_bool(s: &str) -> Option<bool> {
        match s {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
            _ => None,
        }
    }
}
