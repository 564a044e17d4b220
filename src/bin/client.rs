// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Demo client: sends one signed GET and one signed POST to a running server.

use std::process::ExitCode;

use hmac_request_auth::{client::HmacClient, config::ClientSettings, models::Item};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = match ClientSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid client configuration");
            return ExitCode::FAILURE;
        }
    };
    let client = match HmacClient::from_settings(&settings) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to build HTTP client");
            return ExitCode::FAILURE;
        }
    };

    info!(server = %settings.server_url, app_id = %settings.app_id, "Sending signed requests");

    let mut failed = false;

    match client.get_json::<Item>("api/item/get").await {
        Ok(item) => info!(id = item.id, name = %item.name, "GET api/item/get"),
        Err(e) => {
            error!(error = %e, "GET api/item/get failed");
            failed = true;
        }
    }

    let item = Item::new(2, "TestPostItem");
    match client.post_json::<_, Item>("api/item/post", &item).await {
        Ok(item) => info!(id = item.id, name = %item.name, "POST api/item/post"),
        Err(e) => {
            error!(error = %e, "POST api/item/post failed");
            failed = true;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
