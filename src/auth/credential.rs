// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared-secret credential.

use std::fmt;

/// Application id plus the shared secret it signs with.
///
/// Provisioned from configuration at startup and never mutated afterwards.
/// The secret is intentionally left out of the `Debug` output so the
/// credential can sit inside structs that get logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    app_id: String,
    secret_key: Vec<u8>,
}

impl Credential {
    /// Create a credential from an app id and the raw secret bytes.
    pub fn new(app_id: impl Into<String>, secret_key: impl Into<Vec<u8>>) -> Self {
        Self {
            app_id: app_id.into(),
            secret_key: secret_key.into(),
        }
    }

    /// The application id this credential authenticates as.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// The secret key bytes used as the HMAC key.
    pub fn secret_key(&self) -> &[u8] {
        &self.secret_key
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("app_id", &self.app_id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
