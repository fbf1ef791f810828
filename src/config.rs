//! Relay configuration from the environment.
//!
//! Every variable is optional. A variable that is set but does not parse is
//! an error rather than a silent fallback, so a typo in deployment config
//! fails at startup.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
/// Frames buffered per session before a slow viewer starts skipping.
pub const DEFAULT_FRAME_BACKLOG: usize = 4;
/// Largest accepted frame message (a 2048x2048 RGBA frame plus framing).
pub const DEFAULT_MAX_FRAME_BYTES: usize = 2048 * 2048 * 4 + 1024;
/// Seconds a created session may wait for its first socket.
pub const DEFAULT_UNCLAIMED_TTL_SECS: u64 = 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    pub port: u16,
    pub frame_backlog: usize,
    pub max_frame_bytes: usize,
    pub unclaimed_ttl_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            frame_backlog: DEFAULT_FRAME_BACKLOG,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            unclaimed_ttl_secs: DEFAULT_UNCLAIMED_TTL_SECS,
        }
    }
}

impl RelayConfig {
    /// Read `PORT`, `RELAY_FRAME_BACKLOG`, `RELAY_MAX_FRAME_BYTES` and
    /// `RELAY_UNCLAIMED_TTL_SECS`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unparsable or zero values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unparsable or zero values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = Self {
            port: env_parse(&lookup, "PORT", DEFAULT_PORT)?,
            frame_backlog: env_parse(&lookup, "RELAY_FRAME_BACKLOG", DEFAULT_FRAME_BACKLOG)?,
            max_frame_bytes: env_parse(&lookup, "RELAY_MAX_FRAME_BYTES", DEFAULT_MAX_FRAME_BYTES)?,
            unclaimed_ttl_secs: env_parse(&lookup, "RELAY_UNCLAIMED_TTL_SECS", DEFAULT_UNCLAIMED_TTL_SECS)?,
        };
        if config.frame_backlog == 0 {
            return Err(ConfigError::Zero("RELAY_FRAME_BACKLOG"));
        }
        if config.max_frame_bytes == 0 {
            return Err(ConfigError::Zero("RELAY_MAX_FRAME_BYTES"));
        }
        if config.unclaimed_ttl_secs == 0 {
            return Err(ConfigError::Zero("RELAY_UNCLAIMED_TTL_SECS"));
        }
        Ok(config)
    }

    /// How long a session may exist without ever having a socket attached.
    #[must_use]
    pub fn unclaimed_ttl(&self) -> Duration {
        Duration::from_secs(self.unclaimed_ttl_secs)
    }
}

pub(crate) fn env_parse<T>(lookup: impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse::<T>().map_err(|_| ConfigError::Invalid { key, value }),
    }
}
