// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::http::HeaderValue;

use crate::auth::RequestAuthenticator;
use crate::config::{ConfigError, ServerSettings, SCHEME_ENV};

#[derive(Clone)]
pub struct AppState {
    /// Verifier consulted by the authentication middleware
    pub authenticator: Arc<dyn RequestAuthenticator>,
    /// Pre-built `WWW-Authenticate` value
    pub challenge: HeaderValue,
    pub server: Arc<ServerSettings>,
}

impl AppState {
    pub fn new(
        authenticator: Arc<dyn RequestAuthenticator>,
        scheme: &str,
        server: ServerSettings,
    ) -> Result<Self, ConfigError> {
        let challenge = HeaderValue::from_str(scheme).map_err(|e| ConfigError::Invalid {
            name: SCHEME_ENV,
            reason: e.to_string(),
        })?;

        Ok(Self {
            authenticator,
            challenge,
            server: Arc::new(server),
        })
    }
}
