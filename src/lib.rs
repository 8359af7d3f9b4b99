//! Backend core for an international money-transfer portal: registration,
//! login, PII field encryption, bearer-token access control and the payment
//! ledger consumed by the browser front-end.

pub mod config;
pub mod error;
pub mod model;
pub mod repo;
pub mod routes;
pub mod security;
pub mod service;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::{middleware, Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::repo::{TransactionRepository, UserRepository};
use crate::routes::guard::{self, RateLimiter};
use crate::security::cipher::FieldCipher;
use crate::security::token::TokenIssuer;
use crate::service::accounts::CredentialStore;
use crate::service::ledger::TransactionLedger;

const RATE_WINDOW: Duration = Duration::from_secs(15 * 60);
const GENERAL_BUDGET: u32 = 100;
const AUTH_BUDGET: u32 = 5;

/// Everything the handlers need, wired once at startup and passed
/// explicitly. There is no ambient singleton.
#[derive(Clone)]
pub struct AppState {
    pub accounts: CredentialStore,
    pub ledger: TransactionLedger,
    pub tokens: TokenIssuer,
    pub general_limit: RateLimiter,
    pub auth_limit: RateLimiter,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        transactions: Arc<dyn TransactionRepository>,
        cipher: FieldCipher,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            accounts: CredentialStore::new(users.clone(), cipher),
            ledger: TransactionLedger::new(users, transactions),
            tokens,
            general_limit: RateLimiter::new(
                GENERAL_BUDGET,
                RATE_WINDOW,
                "Too many requests from this IP, please try again later",
            ),
            auth_limit: RateLimiter::new(
                AUTH_BUDGET,
                RATE_WINDOW,
                "Too many login attempts, please try again later",
            ),
        }
    }
}

/// Build the full router: auth, user and transaction routes, the global
/// rate limit, CORS restricted to the front-end origin, and the security
/// headers the original served through helmet.
pub fn app(state: AppState, frontend_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(frontend_origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .merge(routes::auth::auth_router())
        .merge(routes::users::users_router())
        .merge(routes::transactions::transactions_router())
        .layer(middleware::from_fn(guard::limit_general))
        .layer(Extension(state))
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=63072000; includeSubDomains; preload"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'self'"),
        ))
        .layer(TraceLayer::new_for_http())
}
