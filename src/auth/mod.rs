// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! HMAC-SHA256 request authentication with nonce replay protection.
//!
//! ## Auth Flow
//!
//! 1. Client signs `app_id ‖ METHOD ‖ uri ‖ timestamp ‖ nonce ‖ body digest`
//!    with the shared secret
//! 2. Client sends `Authorization: <Scheme> <app_id>:<signature>:<nonce>:<timestamp>`
//! 3. Server:
//!    - Checks scheme and token shape
//!    - Admits the nonce in the replay cache (window-bounded)
//!    - Recomputes and compares the signature
//!    - Attaches the app id to the request
//! 4. Rejections get a 401 with `WWW-Authenticate: <Scheme>`
//!
//! ## Security
//!
//! - The reason for a rejection is logged, never returned
//! - A nonce is burnt as soon as it is admitted, even if the signature then
//!   fails
//! - The secret never appears in `Debug` output or logs

pub mod challenge;
pub mod credential;
pub mod error;
pub mod extractor;
pub mod identity;
pub mod middleware;
pub mod replay;
pub mod signature;
pub mod token;
pub mod verifier;

pub use challenge::{challenge_middleware, with_challenge};
pub use credential::Credential;
pub use error::AuthError;
pub use extractor::Authenticated;
pub use identity::AuthenticatedApp;
pub use middleware::hmac_auth_middleware;
pub use replay::{Admission, FutureSkew, ReplayGuard, ReplayKeyMode};
pub use signature::compute_signature;
pub use token::AuthorizationToken;
pub use verifier::{AuthResult, HmacVerifier, RequestAuthenticator, RequestView};
