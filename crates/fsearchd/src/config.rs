//! Server configuration.
//!
//! The listening address and the search root are fixed for the lifetime of
//! the service. They are assembled from up to three layers, later layers
//! overriding earlier ones:
//!
//! 1. a TOML file (`--config`)
//! 2. environment variables (`FSEARCH_BIND`, `FSEARCH_PORT`, `FSEARCH_ROOT`)
//! 3. command line arguments
//!
//! ```toml
//! bind = "127.0.0.1"
//! port = 7070
//! root = "/srv/files"
//! ```

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use fsearch_core::SearchRoot;

/// Environment variable for the listen address
pub const ENV_BIND: &str = "FSEARCH_BIND";

/// Environment variable for the listen port
pub const ENV_PORT: &str = "FSEARCH_PORT";

/// Environment variable for the search root
pub const ENV_ROOT: &str = "FSEARCH_ROOT";

/// Listen on all interfaces unless told otherwise
pub const DEFAULT_BIND: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub root: PathBuf,
}

impl ServerConfig {
    pub fn new(port: u16, root: impl Into<PathBuf>) -> Self {
        Self {
            bind: DEFAULT_BIND,
            port,
            root: root.into(),
        }
    }

    pub fn with_bind(mut self, bind: IpAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn search_root(&self) -> SearchRoot {
        SearchRoot::new(&self.root)
    }
}

/// One configuration layer; unset fields fall through to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    #[serde(default)]
    pub bind: Option<IpAddr>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub root: Option<PathBuf>,
}

impl PartialConfig {
    /// Loads a layer from a TOML file.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Read` if the file cannot be read
    /// - `ConfigError::Parse` if it is not valid configuration
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                source_name: path.display().to_string(),
                error,
            },
            other => other,
        })
    }

    /// Parses a layer from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            source_name: "<inline>".to_string(),
            error: e.to_string(),
        })
    }

    /// Reads a layer from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads a layer through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = lookup(ENV_BIND)
            .map(|value| parse_value(ENV_BIND, &value))
            .transpose()?;
        let port = lookup(ENV_PORT)
            .map(|value| parse_value(ENV_PORT, &value))
            .transpose()?;
        let root = lookup(ENV_ROOT).map(PathBuf::from);

        Ok(Self { bind, port, root })
    }

    /// Returns `self` with every field set in `over` replaced.
    pub fn merge(self, over: PartialConfig) -> PartialConfig {
        PartialConfig {
            bind: over.bind.or(self.bind),
            port: over.port.or(self.port),
            root: over.root.or(self.root),
        }
    }

    /// Produces the final configuration.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Missing` if no layer set the port or the root
    pub fn resolve(self) -> Result<ServerConfig, ConfigError> {
        let port = self.port.ok_or(ConfigError::Missing { field: "port" })?;
        let root = self.root.ok_or(ConfigError::Missing { field: "root" })?;

        Ok(ServerConfig {
            bind: self.bind.unwrap_or(DEFAULT_BIND),
            port,
            root,
        })
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Configuration errors. All are fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {error}", path.display())]
    Read { path: PathBuf, error: String },

    #[error("Invalid config in {source_name}: {error}")]
    Parse { source_name: String, error: String },

    #[error("Invalid {key}={value:?}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Missing required setting: {field}")]
    Missing { field: &'static str },
}
