//! End-to-end tests for the REST surface, driving the real router against
//! the in-memory repositories.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use payportal::repo::{InMemoryTransactionRepository, InMemoryUserRepository};
use payportal::security::cipher::FieldCipher;
use payportal::security::token::{TokenIssuer, TOKEN_TTL_SECS};
use payportal::{app, AppState};

const SECRET: &str = "integration-test-secret-key-0123456789";

fn test_app() -> (Router, AppState) {
    let users = Arc::new(InMemoryUserRepository::new());
    let transactions = Arc::new(InMemoryTransactionRepository::new(users.clone()));
    let cipher = FieldCipher::new(SECRET).unwrap();
    let state = AppState::new(users, transactions, cipher, TokenIssuer::new(SECRET));
    let router = app(
        state.clone(),
        HeaderValue::from_static("http://localhost:5173"),
    );
    (router, state)
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn sample_user() -> Value {
    json!({
        "fullName": "John Doe",
        "accountNumber": "0123456789",
        "idNumber": "A12345678",
        "password": "SecurePass123!"
    })
}

fn sample_transaction() -> Value {
    json!({
        "amount": 8000.0,
        "sourceCurrency": "ZAR",
        "targetCurrency": "USD",
        "paymentMethod": "SWIFT",
        "recipientName": "Recipient Name",
        "recipientAccountNumber": "12345",
        "recipientBankName": "Test Bank",
        "recipientSwiftCode": "TESTSWIFTXXX",
        "recipientCountry": "Test Country",
        "calculatedAmount": 258.92
    })
}

async fn register(router: &Router, user: Value) -> (StatusCode, Value) {
    send(router, "POST", "/api/user", None, Some(user)).await
}

async fn login(router: &Router, account_number: &str, password: &str) -> (StatusCode, Value) {
    send(
        router,
        "POST",
        "/api/auth",
        None,
        Some(json!({ "accountNumber": account_number, "password": password })),
    )
    .await
}

async fn login_token(router: &Router, account_number: &str, password: &str) -> String {
    let (status, body) = login(router, account_number, password).await;
    assert_eq!(status, StatusCode::OK);
    body["authToken"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn registration_succeeds_then_conflicts() {
    let (router, _) = test_app();

    let (status, body) = register(&router, sample_user()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "User added successfully" }));

    let (status, body) = register(&router, sample_user()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "Account number or ID number already exists"
    );
}

#[tokio::test]
async fn registration_requires_every_field() {
    let (router, _) = test_app();

    for field in ["fullName", "accountNumber", "idNumber", "password"] {
        let mut user = sample_user();
        user[field] = json!("");
        let (status, body) = register(&router, user).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "empty {field}");
        assert_eq!(body["message"], "All fields are required");
    }
}

#[tokio::test]
async fn registration_validates_formats_in_order() {
    let (router, _) = test_app();

    let cases = [
        ("fullName", "A", "Full name must be between 2 and 100 characters"),
        ("accountNumber", "123", "Invalid account number format"),
        ("idNumber", "123", "Invalid ID number format"),
        ("password", "weak", "Password does not meet complexity requirements"),
    ];
    for (field, value, message) in cases {
        let mut user = sample_user();
        user[field] = json!(value);
        let (status, body) = register(&router, user).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "bad {field}");
        assert_eq!(body["message"], message);
    }
}

#[tokio::test]
async fn registration_rejects_each_weak_password_class() {
    let (router, _) = test_app();

    // length, no uppercase, no lowercase, no digit, no symbol
    for password in [
        "Sh0rt!",
        "securepass123!",
        "SECUREPASS123!",
        "SecurePass!",
        "SecurePass123",
    ] {
        let mut user = sample_user();
        user["password"] = json!(password);
        let (status, body) = register(&router, user).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "password {password}");
        assert_eq!(
            body["message"],
            "Password does not meet complexity requirements"
        );
    }
}

#[tokio::test]
async fn duplicate_cleartext_id_is_rejected_across_accounts() {
    let (router, _) = test_app();

    let (status, _) = register(&router, sample_user()).await;
    assert_eq!(status, StatusCode::OK);

    // Different account number, same national ID. The stored blobs differ
    // (randomized encryption) but the digest comparison still catches it.
    let mut second = sample_user();
    second["accountNumber"] = json!("9876543210");
    let (status, body) = register(&router, second).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "Account number or ID number already exists"
    );
}

#[tokio::test]
async fn login_returns_profile_and_short_lived_token() {
    let (router, state) = test_app();
    register(&router, sample_user()).await;

    let (status, body) = login(&router, "0123456789", "SecurePass123!").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fullName"], "John Doe");
    assert_eq!(body["accountNumber"], "0123456789");
    // Decrypted for display, never the stored blob.
    assert_eq!(body["idNumber"], "A12345678");
    assert_eq!(body["isEmployee"], false);
    assert!(body.get("passwordHash").is_none());

    let claims = state
        .tokens
        .verify(body["authToken"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.account_number, "0123456789");
    assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
}

#[tokio::test]
async fn login_failures() {
    let (router, _) = test_app();
    register(&router, sample_user()).await;

    let (status, body) = login(&router, "0123456789", "wrongpassword").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid password");

    let (status, body) = login(&router, "0000000000", "SecurePass123!").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");

    let (status, body) = login(&router, "", "SecurePass123!").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].as_str().unwrap().contains("Missing"));

    let (status, body) = login(&router, "0123456789", "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].as_str().unwrap().contains("Missing"));
}

#[tokio::test]
async fn profile_lookup_requires_token_and_password() {
    let (router, _) = test_app();
    register(&router, sample_user()).await;
    let token = login_token(&router, "0123456789", "SecurePass123!").await;

    let (status, _) = send(
        &router,
        "POST",
        "/api/user/0123456789",
        None,
        Some(json!({ "password": "SecurePass123!" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &router,
        "POST",
        "/api/user/0123456789",
        Some(&token),
        Some(json!({ "password": "SecurePass123!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["idNumber"], "A12345678");
}

#[tokio::test]
async fn transaction_submission_requires_identity() {
    let (router, state) = test_app();

    let (status, _) = send(
        &router,
        "POST",
        "/api/transaction",
        None,
        Some(sample_transaction()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Valid signature, but the account it names does not exist.
    let ghost = state.tokens.issue("GHOSTACC99", "nobody").unwrap();
    let (status, body) = send(
        &router,
        "POST",
        "/api/transaction",
        Some(&ghost),
        Some(sample_transaction()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn garbage_tokens_are_rejected() {
    let (router, _) = test_app();

    for token in ["not-a-jwt", ""] {
        let (status, _) = send(&router, "GET", "/api/transaction", Some(token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn owner_creates_and_lists_own_transactions() {
    let (router, _) = test_app();
    register(&router, sample_user()).await;
    let token = login_token(&router, "0123456789", "SecurePass123!").await;

    let (status, body) = send(
        &router,
        "POST",
        "/api/transaction",
        Some(&token),
        Some(sample_transaction()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "success" }));

    let (status, body) = send(&router, "GET", "/api/transaction", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);

    let tx = &listed[0];
    assert_eq!(tx["status"], "pending");
    assert_eq!(tx["recipientSwiftCode"], "TESTSWIFTXXX");
    let reference = tx["reference"].as_str().unwrap();
    assert!(
        reference.len() == 12
            && reference.starts_with("INV-")
            && reference[4..]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
        "unexpected reference {reference}"
    );
    // Owner annotation is employee-listing only.
    assert!(tx.get("ownerAccountNumber").is_none());
}

async fn two_customers_and_employee(router: &Router, state: &AppState) -> (String, String, String) {
    let mut first = sample_user();
    first["accountNumber"] = json!("CUSTACC001");
    first["idNumber"] = json!("CUSTID001X");
    register(router, first).await;

    let mut second = sample_user();
    second["fullName"] = json!("Jane Roe");
    second["accountNumber"] = json!("CUSTACC002");
    second["idNumber"] = json!("CUSTID002X");
    register(router, second).await;

    state
        .accounts
        .upsert_employee("Emp One", "EMP001", "ID001", "EmpPass123!")
        .await
        .unwrap();

    let first = login_token(router, "CUSTACC001", "SecurePass123!").await;
    let second = login_token(router, "CUSTACC002", "SecurePass123!").await;
    let employee = login_token(router, "EMP001", "EmpPass123!").await;
    (first, second, employee)
}

#[tokio::test]
async fn employee_sees_all_records_newest_first() {
    let (router, state) = test_app();
    let (first, second, employee) = two_customers_and_employee(&router, &state).await;

    send(
        &router,
        "POST",
        "/api/transaction",
        Some(&first),
        Some(sample_transaction()),
    )
    .await;
    // Keep created_at strictly ordered between the two records.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let mut later = sample_transaction();
    later["recipientName"] = json!("Recipient Two");
    send(&router, "POST", "/api/transaction", Some(&second), Some(later)).await;

    let (status, body) = send(&router, "GET", "/api/transaction", Some(&employee), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 2);

    // Newest first, each annotated with its owner.
    assert_eq!(listed[0]["ownerAccountNumber"], "CUSTACC002");
    assert_eq!(listed[0]["ownerName"], "Jane Roe");
    assert_eq!(listed[1]["ownerAccountNumber"], "CUSTACC001");
    assert_eq!(listed[1]["ownerName"], "John Doe");

    // A customer still only sees their own.
    let (_, body) = send(&router, "GET", "/api/transaction", Some(&first), None).await;
    let own = body.as_array().unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0]["recipientName"], "Recipient Name");
}

#[tokio::test]
async fn verification_lifecycle_is_employee_only() {
    let (router, state) = test_app();
    let (customer, _, employee) = two_customers_and_employee(&router, &state).await;

    send(
        &router,
        "POST",
        "/api/transaction",
        Some(&customer),
        Some(sample_transaction()),
    )
    .await;
    let (_, body) = send(&router, "GET", "/api/transaction", Some(&customer), None).await;
    let id = body[0]["id"].as_str().unwrap().to_string();
    let status_uri = format!("/api/transaction/{id}/status");

    // Customers cannot transition.
    let (status, _) = send(
        &router,
        "PATCH",
        &status_uri,
        Some(&customer),
        Some(json!({ "status": "verified" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // pending -> submitted is not a legal move.
    let (status, _) = send(
        &router,
        "PATCH",
        &status_uri,
        Some(&employee),
        Some(json!({ "status": "submitted" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // pending -> verified -> submitted is.
    for next in ["verified", "submitted"] {
        let (status, body) = send(
            &router,
            "PATCH",
            &status_uri,
            Some(&employee),
            Some(json!({ "status": next })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "transition to {next}");
        assert_eq!(body, json!({ "message": "success" }));
    }

    // submitted is terminal.
    let (status, _) = send(
        &router,
        "PATCH",
        &status_uri,
        Some(&employee),
        Some(json!({ "status": "rejected" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown transaction.
    let (status, body) = send(
        &router,
        "PATCH",
        &format!("/api/transaction/{}/status", uuid::Uuid::new_v4()),
        Some(&employee),
        Some(json!({ "status": "verified" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Transaction not found");
}

#[tokio::test]
async fn security_headers_are_always_set() {
    let (router, _) = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/user")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(sample_user().to_string()))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(
        response.headers()[header::CONTENT_SECURITY_POLICY],
        "default-src 'self'"
    );
    assert!(response
        .headers()
        .contains_key(header::STRICT_TRANSPORT_SECURITY));
}
