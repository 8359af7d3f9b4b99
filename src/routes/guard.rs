//! Request middleware: the bearer-token access gate and per-IP rate limits.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};

use crate::error::ApiError;
use crate::AppState;

/// Identity injected by [`authorize`] for downstream handlers.
#[derive(Debug, Clone)]
pub struct Caller {
    pub account_number: String,
    pub user_id: String,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Stateless access gate: verify the bearer token against the server secret
/// and expose its account-number claim as the caller's identity. The data
/// store is not touched.
pub async fn authorize(
    Extension(state): Extension<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).ok_or_else(|| {
        ApiError::Unauthorized("Missing or malformed authorization header".into())
    })?;

    let claims = state
        .tokens
        .verify(token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".into()))?;

    req.extensions_mut().insert(Caller {
        account_number: claims.account_number,
        user_id: claims.user_id,
    });
    Ok(next.run(req).await)
}

/// Fixed request budget per caller IP per time window. The only backpressure
/// mechanism; clients are expected to back off on 429.
#[derive(Clone)]
pub struct RateLimiter {
    max: u32,
    window: Duration,
    message: &'static str,
    hits: Arc<Mutex<HashMap<IpAddr, (Instant, u32)>>>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration, message: &'static str) -> Self {
        Self {
            max,
            window,
            message,
            hits: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn check(&self, ip: IpAddr) -> Result<(), ApiError> {
        let mut hits = self
            .hits
            .lock()
            .map_err(|_| ApiError::Internal("rate limiter lock poisoned".into()))?;

        let now = Instant::now();
        // Drop every expired window, not just the caller's, so the map does
        // not grow without bound as client addresses churn.
        hits.retain(|_, (start, _)| now.duration_since(*start) < self.window);

        let entry = hits.entry(ip).or_insert((now, 0));
        entry.1 += 1;

        if entry.1 > self.max {
            tracing::warn!(%ip, "rate limit exceeded");
            return Err(ApiError::TooManyRequests(self.message.into()));
        }
        Ok(())
    }
}

fn enforce(limiter: &RateLimiter, addr: Option<SocketAddr>) -> Result<(), ApiError> {
    // No connect info means the router is driven directly (tests); there is
    // no peer address to budget against.
    match addr {
        Some(addr) => limiter.check(addr.ip()),
        None => Ok(()),
    }
}

/// Global budget across all endpoints.
pub async fn limit_general(
    Extension(state): Extension<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(&state.general_limit, addr.map(|ConnectInfo(a)| a))?;
    Ok(next.run(req).await)
}

/// Tighter budget on the login endpoint, against credential brute-forcing.
pub async fn limit_auth(
    Extension(state): Extension<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(&state.auth_limit, addr.map(|ConnectInfo(a)| a))?;
    Ok(next.run(req).await)
}
