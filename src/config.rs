//! Runtime configuration parsed from environment variables.
//!
//! `main` loads `.env` (if present) before calling [`Config::from_env`].
//! Numeric knobs fall back to their defaults when unset or unparseable; the
//! device address is required.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::device::realtime::REALTIME_PORT;
use crate::pattern::find_palette;

pub const DEFAULT_PORT: u16 = 12345;
pub const DEFAULT_ACTIVE_FADE_MS: u64 = 2000;
pub const DEFAULT_BRIGHTNESS_FADE_MS: u64 = 1000;
pub const DEFAULT_KEEPALIVE_SECS: u64 = 60;
pub const DEFAULT_PATTERN: &str = "aurora";
pub const DEFAULT_PATTERN_STEP_MS: u64 = 1000;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    Missing { var: &'static str },
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("unknown PATTERN: {0}")]
    UnknownPattern(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Target device address (not discoverable at runtime).
    pub device_ip: IpAddr,
    /// Port of the control-plane HTTP surface.
    pub port: u16,
    pub active_fade: Duration,
    pub brightness_fade: Duration,
    pub keepalive: Duration,
    pub start_active: bool,
    pub pattern: String,
    pub pattern_step: Duration,
    pub http_timeout: Duration,
}

impl Config {
    /// Build config from the process environment.
    ///
    /// - `DEVICE_IP` (required)
    /// - `PORT` (default 12345)
    /// - `ACTIVE_FADE_MS`, `BRIGHTNESS_FADE_MS`
    /// - `KEEPALIVE_SECS` (default 60)
    /// - `START_ACTIVE` (`1/true/yes/on`)
    /// - `PATTERN` (default `aurora`), `PATTERN_STEP_MS`
    /// - `HTTP_TIMEOUT_SECS` (default 5)
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `DEVICE_IP` is missing or invalid, or the
    /// pattern name is unknown.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_ip = lookup("DEVICE_IP").ok_or(ConfigError::Missing { var: "DEVICE_IP" })?;
        let device_ip = raw_ip
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::Invalid { var: "DEVICE_IP", value: raw_ip.clone() })?;

        let pattern = lookup("PATTERN").unwrap_or_else(|| DEFAULT_PATTERN.to_owned());
        let Some(palette) = find_palette(&pattern) else {
            return Err(ConfigError::UnknownPattern(pattern));
        };

        Ok(Self {
            device_ip,
            port: parse_or(lookup("PORT"), DEFAULT_PORT),
            active_fade: Duration::from_millis(parse_or(lookup("ACTIVE_FADE_MS"), DEFAULT_ACTIVE_FADE_MS)),
            brightness_fade: Duration::from_millis(parse_or(lookup("BRIGHTNESS_FADE_MS"), DEFAULT_BRIGHTNESS_FADE_MS)),
            keepalive: Duration::from_secs(parse_or(lookup("KEEPALIVE_SECS"), DEFAULT_KEEPALIVE_SECS).max(1)),
            start_active: parse_bool(lookup("START_ACTIVE").as_deref()).unwrap_or(false),
            pattern: palette.name.to_owned(),
            pattern_step: Duration::from_millis(parse_or(lookup("PATTERN_STEP_MS"), DEFAULT_PATTERN_STEP_MS)),
            http_timeout: Duration::from_secs(parse_or(lookup("HTTP_TIMEOUT_SECS"), DEFAULT_HTTP_TIMEOUT_SECS)),
        })
    }

    /// Host part for device HTTP URLs (IPv6 bracketed).
    #[must_use]
    pub fn device_host(&self) -> String {
        match self.device_ip {
            IpAddr::V4(ip) => ip.to_string(),
            IpAddr::V6(ip) => format!("[{ip}]"),
        }
    }

    #[must_use]
    pub fn realtime_target(&self) -> SocketAddr {
        SocketAddr::new(self.device_ip, REALTIME_PORT)
    }
}

fn parse_or<T>(raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr,
{
    raw.and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub(crate) fn parse_bool(raw: Option<&str>) -> Option<bool> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
