//! Route handlers for the authenticated user's transactions.
//!
//! Every handler scopes its queries to the authenticated caller: a
//! transaction belonging to someone else yields a 403 on the item routes and
//! never appears in the list route.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    models::{Transaction, TransactionBuilder, TransactionID, UserProfile},
    stores::TransactionStore,
};

/// The request body for creating or updating a transaction.
///
/// Creation requires the type, amount and category, updates treat every
/// field as optional. Validation happens in the domain model so both paths
/// report the same messages.
#[derive(Debug, Deserialize)]
pub struct TransactionData {
    /// Whether the transaction is an income or an expense.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// The amount of money involved. Must be greater than zero.
    pub amount: Option<f64>,
    /// The category to file the transaction under.
    pub category: Option<String>,
    /// An optional free-form note.
    pub description: Option<String>,
}

/// A route handler for listing the authenticated user's transactions,
/// newest first.
pub async fn get_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
) -> Result<Json<Vec<Transaction>>, Error> {
    state.transaction_store.get_by_user(user.id).map(Json)
}

/// A route handler for recording a new transaction owned by the
/// authenticated user.
///
/// # Errors
///
/// Returns an [Error::Validation] listing every invalid field.
pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Json(data): Json<TransactionData>,
) -> Result<impl IntoResponse, Error> {
    let builder = TransactionBuilder::new(
        user.id,
        data.transaction_type.as_deref(),
        data.amount,
        data.category,
        data.description,
    )?;

    let mut transaction_store = state.transaction_store;
    let transaction = transaction_store.create(builder)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// A route handler for partially updating one of the authenticated user's
/// transactions.
///
/// # Errors
///
/// Returns an [Error::NotFound] if no transaction has the given ID, an
/// [Error::Forbidden] if it belongs to another user, or an
/// [Error::Validation] if the merged transaction is invalid.
pub async fn update_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Path(transaction_id): Path<TransactionID>,
    Json(data): Json<TransactionData>,
) -> Result<Json<Transaction>, Error> {
    let existing = state.transaction_store.get(transaction_id)?;

    if existing.user_id() != user.id {
        return Err(Error::Forbidden);
    }

    let updated = existing.merge(
        data.transaction_type.as_deref(),
        data.amount,
        data.category,
        data.description,
    )?;

    let mut transaction_store = state.transaction_store;
    transaction_store.update(&updated)?;

    Ok(Json(updated))
}

/// A route handler for deleting one of the authenticated user's
/// transactions.
///
/// # Errors
///
/// Returns an [Error::NotFound] if no transaction has the given ID or an
/// [Error::Forbidden] if it belongs to another user.
pub async fn delete_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Path(transaction_id): Path<TransactionID>,
) -> Result<Json<Value>, Error> {
    let existing = state.transaction_store.get(transaction_id)?;

    if existing.user_id() != user.id {
        return Err(Error::Forbidden);
    }

    let mut transaction_store = state.transaction_store;
    transaction_store.delete(transaction_id)?;

    Ok(Json(json!({ "message": "transaction deleted" })))
}



#[cfg(test)]
mod update_transaction_tests {
    use serde_json::{Value, json};

    use crate::test_utils::{create_test_transaction, get_test_server, register_user};

    fn transaction_route(id: &Value) -> String {
        format!("/transactions/{}", id.as_i64().unwrap())
    }

    #[tokio::test]
    async fn update_transaction_applies_partial_changes() {
        let server = get_test_server();
        let registered = register_user(&server, "jane@doe.com", "hunter22").await;
        let token = registered["token"].as_str().unwrap().to_owned();
        let transaction = create_test_transaction(&server, &token).await;

        let response = server
            .put(&transaction_route(&transaction["id"]))
            .authorization_bearer(&token)
            .json(&json!({ "amount": 42.0 }))
            .await;

        response.assert_status_ok();

        let updated = response.json::<Value>();
        assert_eq!(updated["amount"], 42.0);
        assert_eq!(updated["category"], transaction["category"]);
        assert_eq!(updated["type"], transaction["type"]);
        assert_eq!(updated["created_at"], transaction["created_at"]);
    }

    #[tokio::test]
    async fn update_transaction_rejects_invalid_merged_fields() {
        let server = get_test_server();
        let registered = register_user(&server, "jane@doe.com", "hunter22").await;
        let token = registered["token"].as_str().unwrap().to_owned();
        let transaction = create_test_transaction(&server, &token).await;

        let response = server
            .put(&transaction_route(&transaction["id"]))
            .authorization_bearer(&token)
            .json(&json!({ "amount": 0.0 }))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({
            "message": "the amount must be greater than zero"
        }));
    }

    #[tokio::test]
    async fn update_transaction_of_another_user_is_forbidden() {
        let server = get_test_server();
        let jane = register_user(&server, "jane@doe.com", "hunter22").await;
        let john = register_user(&server, "john@doe.com", "hunter22").await;
        let jane_token = jane["token"].as_str().unwrap().to_owned();
        let john_token = john["token"].as_str().unwrap().to_owned();
        let transaction = create_test_transaction(&server, &jane_token).await;

        let response = server
            .put(&transaction_route(&transaction["id"]))
            .authorization_bearer(&john_token)
            .json(&json!({ "amount": 42.0 }))
            .await;

        response.assert_status_forbidden();
        response.assert_json(&json!({ "message": "not authorized" }));
    }

    #[tokio::test]
    async fn update_missing_transaction_is_not_found() {
        let server = get_test_server();
        let registered = register_user(&server, "jane@doe.com", "hunter22").await;
        let token = registered["token"].as_str().unwrap();

        let response = server
            .put("/transactions/999")
            .authorization_bearer(token)
            .json(&json!({ "amount": 42.0 }))
            .await;

        response.assert_status_not_found();
    }
}
