// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Server-side request verification.
//!
//! ## Order of checks
//!
//! 1. Scheme and header presence
//! 2. Token shape (four fields)
//! 3. Replay cache admission
//! 4. Signature
//!
//! The nonce is consumed in step 3 even if step 4 fails, so a request with a
//! bad signature cannot be retried under the same nonce.

use std::sync::Arc;

use subtle::ConstantTimeEq;
use tracing::debug;

use super::credential::Credential;
use super::error::AuthError;
use super::identity::AuthenticatedApp;
use super::replay::{Admission, ReplayGuard};
use super::signature::compute_signature;
use super::token::{split_authorization, AuthorizationToken};
use crate::config::AuthSettings;

/// Result of authenticating one request.
pub type AuthResult = Result<AuthenticatedApp, AuthError>;

/// The parts of an HTTP request that authentication looks at.
#[derive(Debug, Clone, Copy)]
pub struct RequestView<'a> {
    /// HTTP method as sent (`GET`, `post`, ...)
    pub method: &'a str,
    /// Absolute request URI
    pub uri: &'a str,
    /// Raw `Authorization` header value, if present and readable
    pub authorization: Option<&'a str>,
    /// Raw request body
    pub body: &'a [u8],
}

/// Pluggable request authentication hook.
///
/// The axum middleware in [`super::middleware`] drives whatever
/// implementation sits in the application state.
pub trait RequestAuthenticator: Send + Sync {
    fn authenticate(&self, request: &RequestView<'_>) -> AuthResult;
}

/// HMAC token verifier backed by a replay cache.
#[derive(Debug)]
pub struct HmacVerifier {
    scheme: String,
    secret_key: Vec<u8>,
    window_secs: u64,
    replay: Arc<ReplayGuard>,
}

impl HmacVerifier {
    /// Build a verifier with its own replay cache.
    pub fn new(settings: &AuthSettings) -> Self {
        let replay = Arc::new(ReplayGuard::new(settings.replay_key, settings.future_skew));
        Self::with_replay_guard(settings, replay)
    }

    /// Build a verifier around an existing replay cache.
    pub fn with_replay_guard(settings: &AuthSettings, replay: Arc<ReplayGuard>) -> Self {
        Self {
            scheme: settings.scheme.clone(),
            secret_key: settings.secret_key.clone(),
            window_secs: settings.window_secs,
            replay,
        }
    }

    /// The replay cache, for spawning its sweeper.
    pub fn replay_guard(&self) -> &Arc<ReplayGuard> {
        &self.replay
    }

    /// Authenticate against an explicit server time (Unix seconds).
    pub fn authenticate_at(&self, request: &RequestView<'_>, now: i64) -> AuthResult {
        let parameter = request
            .authorization
            .and_then(split_authorization)
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case(&self.scheme))
            .map(|(_, parameter)| parameter)
            .ok_or(AuthError::MissingCredentials)?;

        let token: AuthorizationToken = parameter.parse()?;

        if self.replay.admit(
            &token.app_id,
            &token.nonce,
            token.timestamp,
            now,
            self.window_secs,
        ) == Admission::Rejected
        {
            return Err(AuthError::ReplayOrExpired);
        }

        let credential = Credential::new(token.app_id.as_str(), self.secret_key.as_slice());
        let expected = compute_signature(
            &credential,
            request.method,
            request.uri,
            token.timestamp,
            &token.nonce,
            request.body,
        );

        if !signatures_match(&expected, &token.signature) {
            return Err(AuthError::SignatureMismatch);
        }

        debug!(app_id = %token.app_id, "request signature verified");
        Ok(AuthenticatedApp::new(token.app_id))
    }
}

impl RequestAuthenticator for HmacVerifier {
    fn authenticate(&self, request: &RequestView<'_>) -> AuthResult {
        self.authenticate_at(request, chrono::Utc::now().timestamp())
    }
}

/// ASCII case-insensitive comparison of base64 signatures, in constant time.
fn signatures_match(expected: &str, declared: &str) -> bool {
    let expected = expected.to_ascii_lowercase();
    let declared = declared.to_ascii_lowercase();
    expected.as_bytes().ct_eq(declared.as_bytes()).into()
}
