// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request signature computation.
//!
//! Signer and verifier must agree on every byte of the canonical string:
//!
//! ```text
//! app_id ‖ METHOD ‖ uri (lowercased) ‖ timestamp ‖ nonce ‖ body_digest
//! ```
//!
//! `body_digest` is the base64 SHA-256 of the raw body, or the empty string
//! when there is no body. An empty body is never hashed.

use base64ct::{Base64, Encoding};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::credential::Credential;

type HmacSha256 = Hmac<Sha256>;

/// Base64 SHA-256 of the body, or `""` for an empty body.
pub fn body_digest(body: &[u8]) -> String {
    if body.is_empty() {
        return String::new();
    }
    Base64::encode_string(&Sha256::digest(body))
}

/// Build the string that gets signed.
pub fn canonical_string(
    app_id: &str,
    method: &str,
    uri: &str,
    timestamp: i64,
    nonce: &str,
    body: &[u8],
) -> String {
    format!(
        "{app_id}{}{}{timestamp}{nonce}{}",
        method.to_uppercase(),
        uri.to_lowercase(),
        body_digest(body)
    )
}

/// Compute the base64 HMAC-SHA256 signature of a request.
pub fn compute_signature(
    credential: &Credential,
    method: &str,
    uri: &str,
    timestamp: i64,
    nonce: &str,
    body: &[u8],
) -> String {
    let data = canonical_string(credential.app_id(), method, uri, timestamp, nonce, body);

    let mut mac = HmacSha256::new_from_slice(credential.secret_key())
        .expect("HMAC can take a key of any size");
    mac.update(data.as_bytes());
    Base64::encode_string(&mac.finalize().into_bytes())
}
