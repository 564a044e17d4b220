// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Payloads of the protected item API. The item endpoints exist to exercise
//! authentication end to end: a signed GET with an empty body and a signed
//! POST whose JSON body is part of the signature.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Item returned by `GET /api/item/get` and echoed by `POST /api/item/post`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Item {
    pub id: i64,
    pub name: String,
}

impl Item {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_serializes_with_plain_field_names() {
        let json = serde_json::to_string(&Item::new(1, "TestGetItem")).unwrap();
        assert_eq!(json, r#"{"id":1,"name":"TestGetItem"}"#);
    }
}
