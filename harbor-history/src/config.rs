//! Process configuration, read once from the environment at startup.
//!
//! Variables set in the process environment win; anything unset is taken
//! from a dotenv file (`HISTORY_ENV_FILE`, default `.env`) when one exists.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;

use crate::service::{DEFAULT_LIMIT, MAX_LIMIT};

/// Variable naming the dotenv file read at startup.
pub const ENV_FILE_VAR: &str = "HISTORY_ENV_FILE";

/// Dotenv file used when `HISTORY_ENV_FILE` is unset.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Which [`harbor_store::ScanStore`] the binary runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreKind {
    /// The MongoDB collection written by the scanning pipeline.
    Mongo,
    /// An empty in-memory store, for local runs without a database.
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid {
                var: "HISTORY_STORE",
                reason: format!("unknown store '{other}'; expected 'mongo' or 'memory'"),
            }),
        }
    }
}

/// Errors raised while loading [`HistoryConfig`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A variable is set but its value is unusable.
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Settings for the history service.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct HistoryConfig {
    /// MongoDB connection string (`MONGO_URI`).
    pub mongo_uri: String,
    /// Database name (`MONGO_DB`).
    pub mongo_db: String,
    /// Collection holding scan records (`MONGO_COLLECTION`).
    pub mongo_collection: String,
    /// Listen host (`HISTORY_HOST`).
    pub host: String,
    /// Listen port (`HISTORY_PORT`).
    pub port: u16,
    /// Store backend (`HISTORY_STORE`).
    pub store: StoreKind,
    /// Page size when the caller gives none (`HISTORY_DEFAULT_LIMIT`).
    pub default_limit: usize,
    /// Upper clamp for the page size (`HISTORY_MAX_LIMIT`).
    pub max_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            mongo_uri: "mongodb://localhost:27017".to_owned(),
            mongo_db: "forgeharbor".to_owned(),
            mongo_collection: "scans".to_owned(),
            host: "0.0.0.0".to_owned(),
            port: 8083,
            store: StoreKind::Mongo,
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

impl HistoryConfig {
    /// Load from the process environment, backed by the dotenv file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if any variable holds an unusable
    /// value or the dotenv file exists but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(ENV_FILE_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENV_FILE.to_owned());
        Self::from_lookup_with_file(|key| std::env::var(key).ok(), Path::new(&path))
    }

    /// Load using `lookup`, taking variables it does not set from the dotenv
    /// file at `path`. A missing file is not an error.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if any variable holds an unusable
    /// value or the file exists but cannot be parsed.
    pub fn from_lookup_with_file<F>(lookup: F, path: &Path) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = read_env_file(path)?;
        if !file.is_empty() {
            tracing::debug!(path = %path.display(), vars = file.len(), "loaded env file");
        }
        Self::from_lookup(|key| lookup(key).or_else(|| file.get(key).cloned()))
    }

    /// Load using `lookup` in place of the environment. Unset or empty
    /// variables take their defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if any variable holds an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let config = Self {
            mongo_uri: get("MONGO_URI").unwrap_or(defaults.mongo_uri),
            mongo_db: get("MONGO_DB").unwrap_or(defaults.mongo_db),
            mongo_collection: get("MONGO_COLLECTION").unwrap_or(defaults.mongo_collection),
            host: get("HISTORY_HOST").unwrap_or(defaults.host),
            port: parse_var("HISTORY_PORT", get("HISTORY_PORT"), defaults.port)?,
            store: get("HISTORY_STORE")
                .map(|v| v.parse::<StoreKind>())
                .transpose()?
                .unwrap_or(defaults.store),
            default_limit: parse_var("HISTORY_DEFAULT_LIMIT", get("HISTORY_DEFAULT_LIMIT"), defaults.default_limit)?,
            max_limit: parse_var("HISTORY_MAX_LIMIT", get("HISTORY_MAX_LIMIT"), defaults.max_limit)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// The socket address to bind.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if `host` is not an IP address.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.host
            .parse::<IpAddr>()
            .map(|ip| SocketAddr::new(ip, self.port))
            .map_err(|e| ConfigError::Invalid {
                var: "HISTORY_HOST",
                reason: format!("'{}' is not an IP address: {e}", self.host),
            })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_limit == 0 {
            return Err(ConfigError::Invalid {
                var: "HISTORY_MAX_LIMIT",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(ConfigError::Invalid {
                var: "HISTORY_DEFAULT_LIMIT",
                reason: format!("must be between 1 and {}", self.max_limit),
            });
        }
        self.listen_addr().map(|_| ())
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let invalid = |e: dotenvy::Error| ConfigError::Invalid {
        var: ENV_FILE_VAR,
        reason: format!("{}: {e}", path.display()),
    };
    match dotenvy::from_path_iter(path) {
        Ok(vars) => vars.collect::<Result<HashMap<_, _>, _>>().map_err(invalid),
        Err(e) if e.not_found() => Ok(HashMap::new()),
        Err(e) => Err(invalid(e)),
    }
}

fn parse_var<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw.trim().parse().map_err(|e| ConfigError::Invalid {
            var,
            reason: format!("'{raw}': {e}"),
        }),
        None => Ok(default),
    }
}
