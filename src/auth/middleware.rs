// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Buffers the request body, hands method, absolute URI, `Authorization`
//! header and body to the configured [`RequestAuthenticator`], and either
//! forwards the request with an [`AuthenticatedApp`] extension or answers
//! with a 401.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .route_layer(axum::middleware::from_fn_with_state(
//!         state.clone(),
//!         hmac_auth_middleware,
//!     ));
//! ```
//!
//! [`RequestAuthenticator`]: super::RequestAuthenticator
//! [`AuthenticatedApp`]: super::AuthenticatedApp

use axum::{
    body::{to_bytes, Body},
    extract::{OriginalUri, Request, State},
    http::{
        header::{AUTHORIZATION, HOST},
        request::Parts,
        StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use tracing::{debug, warn};
use url::Url;

use super::RequestView;
use crate::error::ApiError;
use crate::state::AppState;

/// Authentication middleware function.
pub async fn hmac_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    // The body is hashed here and handed back to the handler afterwards.
    let bytes = match to_bytes(body, state.server.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(
                error = %e,
                limit = state.server.max_body_bytes,
                "failed to buffer request body"
            );
            return body_error(&e).into_response();
        }
    };

    let uri = absolute_uri(&parts, &state.server.public_scheme);
    let authorization = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let view = RequestView {
        method: parts.method.as_str(),
        uri: &uri,
        authorization,
        body: &bytes,
    };

    match state.authenticator.authenticate(&view) {
        Ok(app) => {
            debug!(app_id = %app.app_id, method = %parts.method, %uri, "request authenticated");
            parts.extensions.insert(app);
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
        Err(e) => {
            warn!(
                reason = e.reason_code(),
                method = %parts.method,
                %uri,
                "request authentication failed"
            );
            e.into_response()
        }
    }
}

/// 413 when the body went over the buffering limit, 400 for anything else
/// (client abort, transport error).
fn body_error(err: &axum::Error) -> ApiError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
        }
        source = e.source();
    }
    ApiError::new(StatusCode::BAD_REQUEST, "Failed to read request body")
}

/// Absolute URI of the request, normalized the way `url::Url` prints it.
///
/// Origin-form request targets (`/path?query`) are rebuilt from the `Host`
/// header and `default_scheme`. Without a host the bare path is returned,
/// which will simply fail signature verification. Under a nested router the
/// URI the client sent is taken from [`OriginalUri`].
pub fn absolute_uri(parts: &Parts, default_scheme: &str) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(&parts.uri);
    let raw = if uri.scheme().is_some() && uri.authority().is_some() {
        uri.to_string()
    } else {
        let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
        let host = parts
            .headers
            .get(HOST)
            .and_then(|value| value.to_str().ok())
            .or_else(|| uri.authority().map(|authority| authority.as_str()));

        match host {
            Some(host) => format!("{default_scheme}://{host}{path}"),
            None => return path.to_string(),
        }
    };

    Url::parse(&raw).map(String::from).unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn oversized_body_maps_to_413() {
        let err = to_bytes(Body::from("0123456789"), 4).await.unwrap_err();
        assert_eq!(body_error(&err).status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn other_body_errors_map_to_400() {
        let err = axum::Error::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "client went away",
        ));
        assert_eq!(body_error(&err).status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn absolute_form_is_kept() {
        let parts = parts(HttpRequest::builder().uri("http://x/y?a=1"));
        assert_eq!(absolute_uri(&parts, "https"), "http://x/y?a=1");
    }

    #[test]
    fn origin_form_uses_host_header() {
        let parts = parts(
            HttpRequest::builder()
                .uri("/api/item/get")
                .header(HOST, "localhost:58479"),
        );
        assert_eq!(
            absolute_uri(&parts, "http"),
            "http://localhost:58479/api/item/get"
        );
    }

    #[test]
    fn default_port_is_dropped() {
        let parts = parts(
            HttpRequest::builder()
                .uri("/api/item/get")
                .header(HOST, "Example.COM:80"),
        );
        assert_eq!(absolute_uri(&parts, "http"), "http://example.com/api/item/get");
    }

    #[test]
    fn original_uri_wins_over_nested_path() {
        let mut parts = parts(
            HttpRequest::builder()
                .uri("/item/get")
                .header(HOST, "localhost:58479"),
        );
        parts
            .extensions
            .insert(OriginalUri("/api/item/get".parse().unwrap()));
        assert_eq!(
            absolute_uri(&parts, "http"),
            "http://localhost:58479/api/item/get"
        );
    }

    #[test]
    fn missing_host_falls_back_to_path() {
        let parts = parts(HttpRequest::builder().uri("/api/item/get"));
        assert_eq!(absolute_uri(&parts, "http"), "/api/item/get");
    }
}
