// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Signing Client
//!
//! Client half of the protocol: [`ClientSigner`] builds tokens with the same
//! canonicalization the server verifies, and [`HmacClient`] wraps a
//! `reqwest::Client` that signs every request it sends.

use std::time::Duration;

use reqwest::{header::CONTENT_TYPE, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use url::Url;

use crate::auth::Credential;
use crate::config::ClientSettings;

pub mod signer;

pub use signer::{new_nonce, ClientSigner};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize body failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("streaming request bodies cannot be signed")]
    UnsignableBody,

    #[error("invalid authorization header: {0}")]
    InvalidHeader(String),

    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: Method,
        url: Url,
        status: reqwest::StatusCode,
        body: String,
    },
}

/// HTTP client that signs every request.
#[derive(Debug, Clone)]
pub struct HmacClient {
    base_url: Url,
    signer: ClientSigner,
    http: Client,
}

impl HmacClient {
    pub fn new(base_url: Url, signer: ClientSigner) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self::with_client(base_url, signer, http))
    }

    pub fn with_client(base_url: Url, signer: ClientSigner, http: Client) -> Self {
        Self {
            base_url,
            signer,
            http,
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ClientError> {
        let credential = Credential::new(
            settings.app_id.as_str(),
            settings.auth.secret_key.as_slice(),
        );
        let signer = ClientSigner::new(credential, settings.auth.scheme.as_str());
        Self::new(settings.server_url.clone(), signer)
    }

    pub fn signer(&self) -> &ClientSigner {
        &self.signer
    }

    /// Signed GET, JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.base_url.join(path)?;
        let request = self.http.get(url).build()?;
        self.execute_json(request).await
    }

    /// Signed POST with a JSON body, JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.base_url.join(path)?;
        let body = serde_json::to_vec(body)?;
        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .build()?;
        self.execute_json(request).await
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        mut request: reqwest::Request,
    ) -> Result<T, ClientError> {
        self.signer.sign_request(&mut request)?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, app_id = self.signer.app_id(), "sending signed request");

        let response = self.http.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                method,
                url,
                status,
                body,
            });
        }

        Ok(response.json().await?)
    }
}
