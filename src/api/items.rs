// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;
use tracing::info;

use crate::{auth::Authenticated, models::Item};

#[utoipa::path(
    get,
    path = "/api/item/get",
    tag = "Items",
    security(("hmac" = [])),
    responses(
        (status = 200, body = Item),
        (status = 401, description = "Request is not authenticated")
    )
)]
pub async fn get_item(Authenticated(app): Authenticated) -> Json<Item> {
    info!(app_id = %app.app_id, "serving item");
    Json(Item::new(1, "TestGetItem"))
}

#[utoipa::path(
    post,
    path = "/api/item/post",
    request_body = Item,
    tag = "Items",
    security(("hmac" = [])),
    responses(
        (status = 200, body = Item),
        (status = 401, description = "Request is not authenticated")
    )
)]
pub async fn post_item(Authenticated(app): Authenticated, Json(item): Json<Item>) -> Json<Item> {
    info!(app_id = %app.app_id, item_id = item.id, "received item");
    Json(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedApp;

    fn app() -> Authenticated {
        Authenticated(AuthenticatedApp::new("app1"))
    }

    #[tokio::test]
    async fn get_item_returns_fixed_item() {
        let Json(item) = get_item(app()).await;
        assert_eq!(item, Item::new(1, "TestGetItem"));
    }

    #[tokio::test]
    async fn post_item_echoes_body() {
        let Json(item) = post_item(app(), Json(Item::new(2, "TestPostItem"))).await;
        assert_eq!(item, Item::new(2, "TestPostItem"));
    }

    #[tokio::test]
    async fn post_item_echoes_blank_name_unchanged() {
        let Json(item) = post_item(app(), Json(Item::new(3, ""))).await;
        assert_eq!(item, Item::new(3, ""));
    }
}
