// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Message returned to the caller for every authentication failure.
const UNAUTHORIZED_MESSAGE: &str = "Authorization has been denied for this request.";

/// Per-request authentication failure.
///
/// The variant is an internal reason for logs only. Every variant renders to
/// the same 401 response so a client cannot tell a burnt nonce from a bad
/// signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No authorization header, or a scheme other than the configured one
    #[error("missing credentials")]
    MissingCredentials,
    /// Token does not have exactly four fields
    #[error("malformed token")]
    MalformedToken,
    /// Nonce already used, or timestamp outside the window
    #[error("replay or expired")]
    ReplayOrExpired,
    /// Recomputed signature differs from the declared one
    #[error("signature mismatch")]
    SignatureMismatch,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
}

impl AuthError {
    /// Reason code for structured logs.
    pub fn reason_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::MalformedToken => "malformed_token",
            AuthError::ReplayOrExpired => "replay_or_expired",
            AuthError::SignatureMismatch => "signature_mismatch",
        }
    }

    /// HTTP status for this error. Always 401.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(AuthErrorBody {
            error: UNAUTHORIZED_MESSAGE,
        });
        (self.status_code(), body).into_response()
    }
}
