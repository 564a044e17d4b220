// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated caller representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Application that signed the current request.
///
/// Inserted into request extensions by the authentication middleware once
/// the signature and nonce have been checked. Authentication only: no roles
/// or permissions are attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedApp {
    /// App id declared in the verified token
    pub app_id: String,
}

impl AuthenticatedApp {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
        }
    }
}
