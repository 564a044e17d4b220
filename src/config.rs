// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Settings are read from the environment once at startup and passed
//! explicitly into the verifier, the middleware and the client. A missing or
//! invalid value is a [`ConfigError`]; the binaries exit before serving or
//! sending anything.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HMAC_AUTH_SCHEME` | Authorization scheme token | Required |
//! | `HMAC_AUTH_SECRET` | Shared secret | Required |
//! | `HMAC_AUTH_SECRET_ENCODING` | `raw` or `base64` | `raw` |
//! | `HMAC_AUTH_WINDOW_SECS` | Replay window in seconds | `300` |
//! | `HMAC_AUTH_MAX_FUTURE_SKEW_SECS` | Seconds a timestamp may be ahead, or `unbounded` | replay window |
//! | `HMAC_AUTH_REPLAY_KEY` | `structured` or `concatenated` | `structured` |
//! | `HMAC_AUTH_MAX_BODY_BYTES` | Largest body buffered for hashing | `1048576` |
//! | `HMAC_AUTH_PUBLIC_SCHEME` | Scheme used to rebuild absolute URIs | `http` |
//! | `HMAC_AUTH_APP_ID` | App id the client signs as | Required (client) |
//! | `HMAC_AUTH_SERVER_URL` | Base URL the client talks to | `http://localhost:8080/` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use axum::http::HeaderValue;
use base64ct::{Base64, Encoding};

use crate::auth::{FutureSkew, ReplayKeyMode};

pub const SCHEME_ENV: &str = "HMAC_AUTH_SCHEME";
pub const SECRET_ENV: &str = "HMAC_AUTH_SECRET";
pub const SECRET_ENCODING_ENV: &str = "HMAC_AUTH_SECRET_ENCODING";
pub const WINDOW_SECS_ENV: &str = "HMAC_AUTH_WINDOW_SECS";
pub const MAX_FUTURE_SKEW_ENV: &str = "HMAC_AUTH_MAX_FUTURE_SKEW_SECS";
pub const REPLAY_KEY_ENV: &str = "HMAC_AUTH_REPLAY_KEY";
pub const MAX_BODY_BYTES_ENV: &str = "HMAC_AUTH_MAX_BODY_BYTES";
pub const PUBLIC_SCHEME_ENV: &str = "HMAC_AUTH_PUBLIC_SCHEME";
pub const APP_ID_ENV: &str = "HMAC_AUTH_APP_ID";
pub const SERVER_URL_ENV: &str = "HMAC_AUTH_SERVER_URL";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default replay window (5 minutes).
pub const DEFAULT_WINDOW_SECS: u64 = 300;
/// Default cap on buffered request bodies (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
pub const DEFAULT_PUBLIC_SCHEME: &str = "http";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080/";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Startup configuration failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            name,
            reason: reason.into(),
        }
    }
}

/// Protocol settings shared by the verifier and the signer.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSettings {
    /// Scheme name in `Authorization: <scheme> <token>`
    pub scheme: String,
    /// Shared secret bytes (HMAC key)
    pub secret_key: Vec<u8>,
    /// Maximum age of a request, and lifetime of a consumed nonce
    pub window_secs: u64,
    /// Tolerance for client clocks ahead of the server
    pub future_skew: FutureSkew,
    /// Replay cache key derivation
    pub replay_key: ReplayKeyMode,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("scheme", &self.scheme)
            .field("secret_key", &"<redacted>")
            .field("window_secs", &self.window_secs)
            .field("future_skew", &self.future_skew)
            .field("replay_key", &self.replay_key)
            .finish()
    }
}

impl AuthSettings {
    /// Build settings with defaults for everything but scheme and secret.
    pub fn new(
        scheme: impl Into<String>,
        secret_key: impl Into<Vec<u8>>,
    ) -> Result<Self, ConfigError> {
        let scheme = scheme.into();
        validate_scheme(&scheme)?;

        let secret_key = secret_key.into();
        if secret_key.is_empty() {
            return Err(ConfigError::Missing(SECRET_ENV));
        }

        Ok(Self {
            scheme,
            secret_key,
            window_secs: DEFAULT_WINDOW_SECS,
            future_skew: FutureSkew::default(),
            replay_key: ReplayKeyMode::default(),
        })
    }

    /// Set the replay window.
    pub fn with_window_secs(mut self, window_secs: u64) -> Self {
        self.window_secs = window_secs;
        self
    }

    /// Set the future skew tolerance.
    pub fn with_future_skew(mut self, future_skew: FutureSkew) -> Self {
        self.future_skew = future_skew;
        self
    }

    /// Set the replay key derivation.
    pub fn with_replay_key(mut self, replay_key: ReplayKeyMode) -> Self {
        self.replay_key = replay_key;
        self
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let scheme = required(&lookup, SCHEME_ENV)?;
        let secret = required(&lookup, SECRET_ENV)?;

        let secret_key = match optional(&lookup, SECRET_ENCODING_ENV)
            .unwrap_or_else(|| "raw".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "raw" => secret.into_bytes(),
            "base64" => Base64::decode_vec(&secret)
                .map_err(|e| ConfigError::invalid(SECRET_ENV, format!("not valid base64: {e}")))?,
            other => {
                return Err(ConfigError::invalid(
                    SECRET_ENCODING_ENV,
                    format!("expected 'raw' or 'base64', got '{other}'"),
                ))
            }
        };

        let window_secs = match optional(&lookup, WINDOW_SECS_ENV) {
            Some(value) => parse_number(WINDOW_SECS_ENV, &value)?,
            None => DEFAULT_WINDOW_SECS,
        };

        let future_skew = match optional(&lookup, MAX_FUTURE_SKEW_ENV) {
            Some(value) if value.eq_ignore_ascii_case("unbounded") => FutureSkew::Unbounded,
            Some(value) => FutureSkew::Bounded(parse_number(MAX_FUTURE_SKEW_ENV, &value)?),
            None => FutureSkew::Window,
        };

        let replay_key = match optional(&lookup, REPLAY_KEY_ENV)
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("structured") => ReplayKeyMode::Structured,
            Some("concatenated") => ReplayKeyMode::Concatenated,
            Some(other) => {
                return Err(ConfigError::invalid(
                    REPLAY_KEY_ENV,
                    format!("expected 'structured' or 'concatenated', got '{other}'"),
                ))
            }
        };

        Ok(Self::new(scheme, secret_key)?
            .with_window_secs(window_secs)
            .with_future_skew(future_skew)
            .with_replay_key(replay_key))
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Largest body the authentication layer will buffer
    pub max_body_bytes: usize,
    /// Scheme used when the request URI is not absolute
    pub public_scheme: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            public_scheme: DEFAULT_PUBLIC_SCHEME.to_string(),
        }
    }
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match optional(&lookup, PORT_ENV) {
            Some(value) => parse_number(PORT_ENV, &value)?,
            None => defaults.port,
        };
        let max_body_bytes = match optional(&lookup, MAX_BODY_BYTES_ENV) {
            Some(value) => parse_number(MAX_BODY_BYTES_ENV, &value)?,
            None => defaults.max_body_bytes,
        };
        let public_scheme = optional(&lookup, PUBLIC_SCHEME_ENV)
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or(defaults.public_scheme);
        if public_scheme != "http" && public_scheme != "https" {
            return Err(ConfigError::invalid(
                PUBLIC_SCHEME_ENV,
                format!("expected 'http' or 'https', got '{public_scheme}'"),
            ));
        }

        Ok(Self {
            host: optional(&lookup, HOST_ENV).unwrap_or(defaults.host),
            port,
            max_body_bytes,
            public_scheme,
        })
    }

    /// `host:port` string for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Client-side settings.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub auth: AuthSettings,
    pub app_id: String,
    pub server_url: url::Url,
}

impl ClientSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let auth = AuthSettings::from_lookup(&lookup)?;
        let app_id = required(&lookup, APP_ID_ENV)?;
        if app_id.contains(':') {
            return Err(ConfigError::invalid(APP_ID_ENV, "must not contain ':'"));
        }

        let server_url = optional(&lookup, SERVER_URL_ENV)
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let server_url = url::Url::parse(&server_url)
            .map_err(|e| ConfigError::invalid(SERVER_URL_ENV, e.to_string()))?;

        Ok(Self {
            auth,
            app_id,
            server_url,
        })
    }
}

/// The scheme ends up verbatim in `WWW-Authenticate`, so it has to be a
/// single header-safe token.
fn validate_scheme(scheme: &str) -> Result<(), ConfigError> {
    if scheme.is_empty() {
        return Err(ConfigError::Missing(SCHEME_ENV));
    }
    if scheme.chars().any(char::is_whitespace) || HeaderValue::from_str(scheme).is_err() {
        return Err(ConfigError::invalid(
            SCHEME_ENV,
            "must be a single token without whitespace",
        ));
    }
    Ok(())
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).ok_or(ConfigError::Missing(name))
}

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(name, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn auth_settings_defaults() {
        let settings = AuthSettings::from_lookup(lookup(&[
            (SCHEME_ENV, "TestAuthScheme"),
            (SECRET_ENV, "n9waAyo4xDsdVKi1"),
        ]))
        .unwrap();

        assert_eq!(settings.scheme, "TestAuthScheme");
        assert_eq!(settings.secret_key, b"n9waAyo4xDsdVKi1");
        assert_eq!(settings.window_secs, DEFAULT_WINDOW_SECS);
        assert_eq!(settings.future_skew, FutureSkew::Window);
        assert_eq!(settings.replay_key, ReplayKeyMode::Structured);
    }

    #[test]
    fn missing_secret_is_fatal() {
        let result = AuthSettings::from_lookup(lookup(&[(SCHEME_ENV, "TestAuthScheme")]));
        assert!(matches!(result, Err(ConfigError::Missing(SECRET_ENV))));

        let result = AuthSettings::from_lookup(lookup(&[
            (SCHEME_ENV, "TestAuthScheme"),
            (SECRET_ENV, "   "),
        ]));
        assert!(matches!(result, Err(ConfigError::Missing(SECRET_ENV))));
    }

    #[test]
    fn missing_scheme_is_fatal() {
        let result = AuthSettings::from_lookup(lookup(&[(SECRET_ENV, "secret")]));
        assert!(matches!(result, Err(ConfigError::Missing(SCHEME_ENV))));
    }

    #[test]
    fn scheme_with_whitespace_rejected() {
        assert!(matches!(
            AuthSettings::new("Two Words", b"secret".to_vec()),
            Err(ConfigError::Invalid { name: SCHEME_ENV, .. })
        ));
    }

    #[test]
    fn base64_secret_is_decoded() {
        let settings = AuthSettings::from_lookup(lookup(&[
            (SCHEME_ENV, "TestAuthScheme"),
            (SECRET_ENV, "c2VjcmV0"),
            (SECRET_ENCODING_ENV, "base64"),
        ]))
        .unwrap();
        assert_eq!(settings.secret_key, b"secret");

        let result = AuthSettings::from_lookup(lookup(&[
            (SCHEME_ENV, "TestAuthScheme"),
            (SECRET_ENV, "not base64!"),
            (SECRET_ENCODING_ENV, "base64"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { name: SECRET_ENV, .. })));
    }

    #[test]
    fn optional_auth_knobs() {
        let settings = AuthSettings::from_lookup(lookup(&[
            (SCHEME_ENV, "TestAuthScheme"),
            (SECRET_ENV, "secret"),
            (WINDOW_SECS_ENV, "60"),
            (MAX_FUTURE_SKEW_ENV, "unbounded"),
            (REPLAY_KEY_ENV, "Concatenated"),
        ]))
        .unwrap();
        assert_eq!(settings.window_secs, 60);
        assert_eq!(settings.future_skew, FutureSkew::Unbounded);
        assert_eq!(settings.replay_key, ReplayKeyMode::Concatenated);

        let settings = AuthSettings::from_lookup(lookup(&[
            (SCHEME_ENV, "TestAuthScheme"),
            (SECRET_ENV, "secret"),
            (MAX_FUTURE_SKEW_ENV, "30"),
        ]))
        .unwrap();
        assert_eq!(settings.future_skew, FutureSkew::Bounded(30));
    }

    #[test]
    fn invalid_window_rejected() {
        let result = AuthSettings::from_lookup(lookup(&[
            (SCHEME_ENV, "TestAuthScheme"),
            (SECRET_ENV, "secret"),
            (WINDOW_SECS_ENV, "-5"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { name: WINDOW_SECS_ENV, .. })));
    }

    #[test]
    fn debug_redacts_secret() {
        let settings = AuthSettings::new("TestAuthScheme", b"hunter2".to_vec()).unwrap();
        assert!(!format!("{settings:?}").contains("hunter2"));
    }

    #[test]
    fn server_settings_defaults_and_overrides() {
        let defaults = ServerSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(defaults, ServerSettings::default());
        assert_eq!(defaults.bind_address(), "0.0.0.0:8080");

        let custom = ServerSettings::from_lookup(lookup(&[
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "9000"),
            (MAX_BODY_BYTES_ENV, "1024"),
            (PUBLIC_SCHEME_ENV, "HTTPS"),
        ]))
        .unwrap();
        assert_eq!(custom.bind_address(), "127.0.0.1:9000");
        assert_eq!(custom.max_body_bytes, 1024);
        assert_eq!(custom.public_scheme, "https");

        assert!(ServerSettings::from_lookup(lookup(&[(PUBLIC_SCHEME_ENV, "ftp")])).is_err());
    }

    #[test]
    fn client_settings_require_app_id() {
        let base = [(SCHEME_ENV, "TestAuthScheme"), (SECRET_ENV, "secret")];
        assert!(matches!(
            ClientSettings::from_lookup(lookup(&base)),
            Err(ConfigError::Missing(APP_ID_ENV))
        ));

        let mut vars = base.to_vec();
        vars.push((APP_ID_ENV, "ec77a717328c411899deee01735bf90f"));
        let settings = ClientSettings::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(settings.server_url.as_str(), DEFAULT_SERVER_URL);
    }
}
