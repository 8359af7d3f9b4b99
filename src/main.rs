use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use dotenv::dotenv;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use payportal::config::Config;
use payportal::repo::{PgTransactionRepository, PgUserRepository};
use payportal::security::cipher::FieldCipher;
use payportal::security::token::TokenIssuer;
use payportal::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env().expect("invalid configuration");

    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("failed to connect to Postgres");

    let cipher = FieldCipher::new(&config.secret_key).expect("invalid encryption secret");
    let tokens = TokenIssuer::new(&config.secret_key);
    let users = Arc::new(PgUserRepository::new(pool.clone()));
    let transactions = Arc::new(PgTransactionRepository::new(pool));

    let state = AppState::new(users, transactions, cipher, tokens);

    let origin: HeaderValue = config
        .frontend_url
        .parse()
        .expect("FRONTEND_URL is not a valid origin");

    // TLS is terminated in front of this binary; it serves plain TCP behind
    // the proxy.
    let app = payportal::app(state, origin);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server error");
}
