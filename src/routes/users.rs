use axum::{
    extract::{Extension, Json, Path},
    middleware,
    response::Json as RespJson,
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::model::user::{AuthenticatedUser, RegisterRequest};
use crate::routes::guard;
use crate::AppState;

pub fn users_router() -> Router {
    Router::new()
        .route("/api/user", post(register))
        .route(
            "/api/user/:account_number",
            post(get_user).layer(middleware::from_fn(guard::authorize)),
        )
}

/// POST /api/user — customer registration.
async fn register(
    Extension(state): Extension<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<RespJson<serde_json::Value>, ApiError> {
    state.accounts.register(payload).await?;
    Ok(RespJson(json!({ "message": "User added successfully" })))
}

#[derive(Debug, Deserialize)]
struct GetUserRequest {
    #[serde(default)]
    password: String,
}

/// POST /api/user/:accountNumber — authenticated profile lookup. The
/// password is re-verified before the decrypted profile is returned.
async fn get_user(
    Extension(state): Extension<AppState>,
    Path(account_number): Path<String>,
    Json(payload): Json<GetUserRequest>,
) -> Result<RespJson<AuthenticatedUser>, ApiError> {
    let user = state
        .accounts
        .verify_credentials(&account_number, &payload.password)
        .await?;
    Ok(RespJson(user))
}
