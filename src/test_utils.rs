//! Helpers for setting up HTTP-level tests.

use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{AppState, build_router, endpoints};

/// The token signing secret used across tests.
pub const TEST_SECRET: &str = "notsosecret";

/// Create an [AppState] backed by a fresh in-memory database.
pub fn get_test_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory database.");

    AppState::new(connection, TEST_SECRET).expect("Could not create app state.")
}

/// Create a test server running the full application router.
pub fn get_test_server() -> TestServer {
    TestServer::try_new(build_router(get_test_state())).expect("Could not create test server.")
}

/// Register a user and return the response body, which includes a bearer
/// token for the new user.
pub async fn register_user(server: &TestServer, email: &str, password: &str) -> Value {
    let response = server
        .post(endpoints::REGISTER)
        .json(&json!({
            "name": "Jane Doe",
            "email": email,
            "password": password,
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);

    response.json()
}

/// Record a transaction for the user the token belongs to and return the
/// response body.
pub async fn create_test_transaction(server: &TestServer, token: &str) -> Value {
    let response = server
        .post(endpoints::TRANSACTIONS)
        .authorization_bearer(token)
        .json(&json!({
            "type": "expense",
            "amount": 9.99,
            "category": "Groceries",
            "description": "Weekly shop",
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);

    response.json()
}
