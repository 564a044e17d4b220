// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HMAC Request Auth - Shared-Secret Request Signing for HTTP APIs
//!
//! Clients sign each request with HMAC-SHA256 over the method, absolute URI,
//! timestamp, a single-use nonce and a digest of the body. The server
//! recomputes the signature, enforces a freshness window and rejects any
//! nonce it has already seen.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum) and router assembly
//! - `auth` - Signature computation, replay guard, verifier and middleware
//! - `client` - Request signer and signing HTTP client
//! - `config` - Environment configuration

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
