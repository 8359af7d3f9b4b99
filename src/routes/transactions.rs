use axum::{
    extract::{Extension, Json, Path},
    middleware,
    response::Json as RespJson,
    routing::{get, patch},
    Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::model::transaction::{CreateTransactionRequest, TransactionView, UpdateStatusRequest};
use crate::routes::guard::{self, Caller};
use crate::AppState;

pub fn transactions_router() -> Router {
    Router::new()
        .route(
            "/api/transaction",
            get(list_transactions).post(create_transaction),
        )
        .route("/api/transaction/:id/status", patch(update_status))
        .route_layer(middleware::from_fn(guard::authorize))
}

/// GET /api/transaction — the caller's records, or every record when the
/// caller is an employee.
async fn list_transactions(
    Extension(state): Extension<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<RespJson<Vec<TransactionView>>, ApiError> {
    let views = state.ledger.list(&caller.account_number).await?;
    Ok(RespJson(views))
}

/// POST /api/transaction — submit a payment instruction. Ownership comes
/// from the token, never the body.
async fn create_transaction(
    Extension(state): Extension<AppState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<RespJson<serde_json::Value>, ApiError> {
    state.ledger.create(&caller.account_number, payload).await?;
    Ok(RespJson(json!({ "message": "success" })))
}

/// PATCH /api/transaction/:id/status — employee-only verification step.
async fn update_status(
    Extension(state): Extension<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<RespJson<serde_json::Value>, ApiError> {
    state
        .ledger
        .update_status(&caller.account_number, id, payload.status)
        .await?;
    Ok(RespJson(json!({ "message": "success" })))
}
