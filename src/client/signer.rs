// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client-side token construction.

use reqwest::header::{HeaderValue, AUTHORIZATION};
use uuid::Uuid;

use super::ClientError;
use crate::auth::{compute_signature, AuthorizationToken, Credential};

/// Builds `Authorization` headers for outgoing requests.
#[derive(Debug, Clone)]
pub struct ClientSigner {
    credential: Credential,
    scheme: String,
}

impl ClientSigner {
    pub fn new(credential: Credential, scheme: impl Into<String>) -> Self {
        Self {
            credential,
            scheme: scheme.into(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn app_id(&self) -> &str {
        self.credential.app_id()
    }

    /// Sign with a fresh nonce and the current Unix time.
    pub fn sign(&self, method: &str, uri: &str, body: &[u8]) -> AuthorizationToken {
        self.sign_with(method, uri, body, new_nonce(), chrono::Utc::now().timestamp())
    }

    /// Sign with a caller-supplied nonce and timestamp.
    pub fn sign_with(
        &self,
        method: &str,
        uri: &str,
        body: &[u8],
        nonce: String,
        timestamp: i64,
    ) -> AuthorizationToken {
        let signature = compute_signature(&self.credential, method, uri, timestamp, &nonce, body);
        AuthorizationToken {
            app_id: self.credential.app_id().to_string(),
            signature,
            nonce,
            timestamp,
        }
    }

    /// Full header value: `<Scheme> <token>`.
    pub fn authorization_value(&self, token: &AuthorizationToken) -> String {
        format!("{} {}", self.scheme, token)
    }

    /// Sign a built `reqwest` request in place.
    ///
    /// The URL is signed exactly as `reqwest` will send it. Streaming bodies
    /// cannot be hashed up front and are refused.
    pub fn sign_request(&self, request: &mut reqwest::Request) -> Result<(), ClientError> {
        let body = match request.body() {
            None => &[][..],
            Some(body) => body.as_bytes().ok_or(ClientError::UnsignableBody)?,
        };

        let token = self.sign(request.method().as_str(), request.url().as_str(), body);
        let value = HeaderValue::from_str(&self.authorization_value(&token))
            .map_err(|e| ClientError::InvalidHeader(e.to_string()))?;

        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// Random single-use nonce. Hex only, so it never contains the `:` separator.
pub fn new_nonce() -> String {
    Uuid::new_v4().simple().to_string()
}
