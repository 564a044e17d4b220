// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the authenticated application.
//!
//! ```rust,ignore
//! async fn my_handler(Authenticated(app): Authenticated) -> impl IntoResponse {
//!     // app.app_id is the verified caller
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, AuthenticatedApp};

/// Extractor for the application verified by the authentication middleware.
///
/// Handlers mounted without the middleware get `MissingCredentials`, which
/// renders as a plain 401.
pub struct Authenticated(pub AuthenticatedApp);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedApp>()
            .cloned()
            .map(Authenticated)
            .ok_or(AuthError::MissingCredentials)
    }
}
