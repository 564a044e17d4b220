// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `WWW-Authenticate` challenge for rejected requests.

use axum::{
    extract::{Request, State},
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Append the scheme challenge to a 401 response. Other statuses pass
/// through untouched.
pub fn with_challenge(mut response: Response, scheme: &HeaderValue) -> Response {
    if response.status() == StatusCode::UNAUTHORIZED {
        response
            .headers_mut()
            .append(WWW_AUTHENTICATE, scheme.clone());
    }
    response
}

/// Middleware wrapping every response produced behind it.
///
/// Must sit outside [`super::middleware::hmac_auth_middleware`] so it sees
/// the rejections that layer produces.
pub async fn challenge_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    with_challenge(response, &state.challenge)
}
