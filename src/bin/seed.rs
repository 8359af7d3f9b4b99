//! Seed or refresh the employee accounts from environment variables.
//!
//! Expects `EMPLOYEE{1,2}_NAME`, `_ACCOUNT`, `_ID` and `_PASSWORD`; account
//! and ID numbers follow the internal staff formats (`EMP###`, `ID###`).

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use dotenv::dotenv;
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use payportal::repo::PgUserRepository;
use payportal::security::cipher::FieldCipher;
use payportal::service::accounts::CredentialStore;

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z\s\-\.]+$").unwrap());
static ACCOUNT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^EMP\d{3}$").unwrap());
static ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ID\d{3}$").unwrap());

fn required(var: &str) -> Result<String, String> {
    env::var(var).map_err(|_| format!("{var} must be set"))
}

fn whitelisted(value: String, pattern: &Regex, what: &str) -> Result<String, String> {
    if pattern.is_match(&value) {
        Ok(value)
    } else {
        Err(format!("invalid {what}: does not match {pattern}"))
    }
}

async fn seed_employee(store: &CredentialStore, n: u8) -> Result<(), String> {
    let name = whitelisted(required(&format!("EMPLOYEE{n}_NAME"))?, &NAME_RE, "name")?;
    let account = whitelisted(
        required(&format!("EMPLOYEE{n}_ACCOUNT"))?,
        &ACCOUNT_RE,
        "account number",
    )?;
    let id = whitelisted(required(&format!("EMPLOYEE{n}_ID"))?, &ID_RE, "ID number")?;
    let password = required(&format!("EMPLOYEE{n}_PASSWORD"))?;

    store
        .upsert_employee(&name, &account, &id, &password)
        .await
        .map_err(|err| err.to_string())
}

async fn run() -> Result<(), String> {
    let database_url = required("DATABASE_URL")?;
    let secret_key = required("SECRET_KEY")?;

    let pool = PgPool::connect(&database_url)
        .await
        .map_err(|err| format!("failed to connect to Postgres: {err}"))?;
    let cipher = FieldCipher::new(&secret_key).map_err(|err| err.to_string())?;
    let store = CredentialStore::new(Arc::new(PgUserRepository::new(pool)), cipher);

    for n in 1..=2 {
        seed_employee(&store, n).await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match run().await {
        Ok(()) => {
            tracing::info!("employees seeded");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("seed failed: {err}");
            ExitCode::FAILURE
        }
    }
}
