// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults and the typed [`Config`] loaded once
//! at startup. A value that is present but unparseable is a startup error;
//! it is never replaced by the default.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Root directory for the directory and tenant databases | `/data` |
//! | `TOKEN_TTL_SECS` | Access token lifetime | `86400` |
//! | `TOKEN_LEEWAY_SECS` | Clock skew tolerated past `exp` | `0` |
//! | `SIGNING_KEY_PATH` | PEM file holding the Ed25519 signing key | ephemeral key |
//! | `CACHE_CAPACITY` | Tenant descriptors kept in the cache | `10000` |
//! | `BACKEND_TIMEOUT_MS` | Bound on each cache/directory call | `2000` |
//! | `BOOTSTRAP_FILE` | JSON accounts upserted at startup | unset |
//! | `PROVISIONING_KEY` | Shared secret for the admin refresh endpoint | unset (endpoint disabled) |
//! | `TLS_CERT_PATH` | PEM certificate chain | unset (plain HTTP) |
//! | `TLS_KEY_PATH` | PEM private key | unset (plain HTTP) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::storage::paths::DATA_ROOT;
use crate::storage::tenant_cache::DEFAULT_CAPACITY;
use crate::tenancy::resolver::DEFAULT_BACKEND_TIMEOUT;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the data directory path.
///
/// Holds `directory.redb` and the `tenants/` subdirectory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const TOKEN_TTL_SECS_ENV: &str = "TOKEN_TTL_SECS";
pub const TOKEN_LEEWAY_SECS_ENV: &str = "TOKEN_LEEWAY_SECS";
pub const SIGNING_KEY_PATH_ENV: &str = "SIGNING_KEY_PATH";
pub const CACHE_CAPACITY_ENV: &str = "CACHE_CAPACITY";
pub const BACKEND_TIMEOUT_MS_ENV: &str = "BACKEND_TIMEOUT_MS";
pub const BOOTSTRAP_FILE_ENV: &str = "BOOTSTRAP_FILE";

/// Shared secret expected in `X-Provisioning-Key`. Unset disables the
/// admin refresh endpoint.
pub const PROVISIONING_KEY_ENV: &str = "PROVISIONING_KEY";

pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{set} is set but {missing} is not; both are required for TLS")]
    IncompleteTls {
        set: &'static str,
        missing: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("expected json or pretty, got {other}")),
        }
    }
}

/// Token and backend timing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSettings {
    pub token_ttl: Duration,
    pub token_leeway: Duration,
    pub backend_timeout: Duration,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
            token_leeway: Duration::ZERO,
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub auth: AuthSettings,
    pub signing_key_path: Option<PathBuf>,
    pub cache_capacity: usize,
    pub bootstrap_file: Option<PathBuf>,
    pub provisioning_key: Option<String>,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .field("auth", &self.auth)
            .field("signing_key_path", &self.signing_key_path)
            .field("cache_capacity", &self.cache_capacity)
            .field("bootstrap_file", &self.bootstrap_file)
            .field(
                "provisioning_key",
                &self.provisioning_key.as_ref().map(|_| "<redacted>"),
            )
            .field("tls", &self.tls)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let token_ttl_secs: u64 = parse_or(&get, TOKEN_TTL_SECS_ENV, DEFAULT_TOKEN_TTL_SECS)?;
        if token_ttl_secs == 0 {
            return Err(invalid(TOKEN_TTL_SECS_ENV, "0", "must be positive"));
        }
        let leeway_secs: u64 = parse_or(&get, TOKEN_LEEWAY_SECS_ENV, 0)?;

        let default_timeout_ms = u64::try_from(DEFAULT_BACKEND_TIMEOUT.as_millis()).unwrap_or(2000);
        let timeout_ms: u64 = parse_or(&get, BACKEND_TIMEOUT_MS_ENV, default_timeout_ms)?;
        if timeout_ms == 0 {
            return Err(invalid(BACKEND_TIMEOUT_MS_ENV, "0", "must be positive"));
        }

        let cache_capacity: usize = parse_or(&get, CACHE_CAPACITY_ENV, DEFAULT_CAPACITY)?;
        if cache_capacity == 0 {
            return Err(invalid(CACHE_CAPACITY_ENV, "0", "must be positive"));
        }

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::IncompleteTls {
                    set: TLS_CERT_PATH_ENV,
                    missing: TLS_KEY_PATH_ENV,
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::IncompleteTls {
                    set: TLS_KEY_PATH_ENV,
                    missing: TLS_CERT_PATH_ENV,
                })
            }
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&get, PORT_ENV, DEFAULT_PORT)?,
            data_dir: get(DATA_DIR_ENV).unwrap_or_else(|| DATA_ROOT.to_string()).into(),
            auth: AuthSettings {
                token_ttl: Duration::from_secs(token_ttl_secs),
                token_leeway: Duration::from_secs(leeway_secs),
                backend_timeout: Duration::from_millis(timeout_ms),
            },
            signing_key_path: get(SIGNING_KEY_PATH_ENV).map(PathBuf::from),
            cache_capacity,
            bootstrap_file: get(BOOTSTRAP_FILE_ENV).map(PathBuf::from),
            provisioning_key: get(PROVISIONING_KEY_ENV),
            tls,
            log_format: parse_or(&get, LOG_FORMAT_ENV, LogFormat::default())?,
        })
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(name, &raw, &e.to_string())),
    }
}

fn invalid(name: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
