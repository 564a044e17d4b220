// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization token parsing and formatting.
//!
//! Wire form of the `Authorization` header parameter:
//!
//! ```text
//! <app_id>:<signature base64>:<nonce>:<timestamp seconds>
//! ```

use std::fmt;
use std::str::FromStr;

use super::error::AuthError;

/// Number of `:`-separated fields in a token.
const TOKEN_FIELDS: usize = 4;

/// Parsed authorization token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationToken {
    pub app_id: String,
    pub signature: String,
    pub nonce: String,
    pub timestamp: i64,
}

impl FromStr for AuthorizationToken {
    type Err = AuthError;

    /// Exactly four fields or nothing; a partial token is never accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(':').collect();
        if fields.len() != TOKEN_FIELDS {
            return Err(AuthError::MalformedToken);
        }

        let timestamp = fields[3]
            .trim()
            .parse::<i64>()
            .map_err(|_| AuthError::MalformedToken)?;

        Ok(Self {
            app_id: fields[0].to_string(),
            signature: fields[1].to_string(),
            nonce: fields[2].to_string(),
            timestamp,
        })
    }
}

impl fmt::Display for AuthorizationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.app_id, self.signature, self.nonce, self.timestamp
        )
    }
}

/// Split an `Authorization` header value into scheme and parameter.
///
/// Returns `None` for an empty value. The parameter is empty when the header
/// carries only a scheme.
pub fn split_authorization(value: &str) -> Option<(&str, &str)> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match value.split_once(char::is_whitespace) {
        Some((scheme, parameter)) => Some((scheme, parameter.trim())),
        None => Some((value, "")),
    }
}
