use axum::{
    extract::{Extension, Json},
    middleware,
    response::Json as RespJson,
    routing::post,
    Router,
};

use crate::error::ApiError;
use crate::model::user::{LoginRequest, LoginResponse};
use crate::routes::guard;
use crate::AppState;

pub fn auth_router() -> Router {
    Router::new()
        .route("/api/auth", post(login))
        .route_layer(middleware::from_fn(guard::limit_auth))
}

/// POST /api/auth — verify credentials and issue a 15-minute bearer token.
async fn login(
    Extension(state): Extension<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<RespJson<LoginResponse>, ApiError> {
    if payload.account_number.is_empty() {
        return Err(ApiError::Unauthorized("Missing account number".into()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::Unauthorized("Missing password".into()));
    }

    let user = state
        .accounts
        .verify_credentials(&payload.account_number, &payload.password)
        .await?;

    let auth_token = state
        .tokens
        .issue(&user.account_number, &user.id.to_string())
        .map_err(ApiError::internal)?;

    Ok(RespJson(LoginResponse { user, auth_token }))
}
