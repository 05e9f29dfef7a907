//! Route handlers for the books API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::http::server::AppState;
use crate::inventory::{InventoryStore, ItemId, NewItem};
use crate::lending::LendingError;
use crate::pricing::PriceSource;

const SERVICE_NAME: &str = "book-service";
const DEFAULT_RESET_STOCK: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct ResetStockParams {
    pub stock: Option<u32>,
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

impl IntoResponse for LendingError {
    fn into_response(self) -> Response {
        let status = match &self {
            LendingError::NotFound(_) => StatusCode::NOT_FOUND,
            LendingError::OutOfStock(_) => StatusCode::CONFLICT,
            LendingError::InvalidItem(_) => StatusCode::BAD_REQUEST,
            LendingError::Store(e) => {
                tracing::error!(error = %e, "Inventory store failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        json_error(status, self.to_string())
    }
}

pub async fn list_books<S: InventoryStore, P: PriceSource>(
    State(state): State<AppState<S, P>>,
) -> Response {
    match state.coordinator.list_items().await {
        Ok(items) => Json(items).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_book<S: InventoryStore, P: PriceSource>(
    State(state): State<AppState<S, P>>,
    Path(id): Path<u64>,
) -> Response {
    match state.coordinator.get_item(ItemId(id)).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_book<S: InventoryStore, P: PriceSource>(
    State(state): State<AppState<S, P>>,
    Json(item): Json<NewItem>,
) -> Response {
    match state.coordinator.create_item(item).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Runs the borrow on its own task so a dropped connection cannot abandon it
/// between the stock commit and the price lookup.
pub async fn borrow_book<S: InventoryStore, P: PriceSource>(
    State(state): State<AppState<S, P>>,
    Path(id): Path<u64>,
) -> Response {
    let coordinator = state.coordinator.clone();
    let borrow = tokio::spawn(async move { coordinator.borrow(ItemId(id)).await });

    match borrow.await {
        Ok(Ok(outcome)) => Json(outcome).into_response(),
        Ok(Err(e)) => e.into_response(),
        Err(e) => {
            tracing::error!(item_id = id, error = %e, "Borrow task failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "borrow failed")
        }
    }
}

pub async fn reset_stock<S: InventoryStore, P: PriceSource>(
    State(state): State<AppState<S, P>>,
    Path(id): Path<u64>,
    Query(params): Query<ResetStockParams>,
) -> Response {
    let stock = params.stock.unwrap_or(DEFAULT_RESET_STOCK);
    match state.coordinator.reset_stock(ItemId(id), stock).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn instance_info<S: InventoryStore, P: PriceSource>(
    State(state): State<AppState<S, P>>,
) -> impl IntoResponse {
    Json(json!({
        "instance": state.coordinator.instance(),
        "service": SERVICE_NAME,
        "status": "running",
    }))
}

pub async fn health<S: InventoryStore, P: PriceSource>(
    State(state): State<AppState<S, P>>,
) -> impl IntoResponse {
    let breaker = state.coordinator.pricing().breaker();
    Json(json!({
        "status": "ok",
        "circuit": breaker.state(),
        "failureRate": breaker.failure_rate(),
    }))
}
