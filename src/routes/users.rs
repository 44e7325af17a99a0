//! Route handlers for the authenticated user's own profile.
//!
//! All handlers here run behind the auth middleware, so the
//! [UserProfile] extension is always present.

use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    models::{PasswordHash, User, UserProfile, ValidatedPassword},
    routes::auth::parse_email,
    stores::{TransactionStore, UserStore},
};

/// The request body for updating the authenticated user's profile.
///
/// Every field is optional, omitted fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdateData {
    /// The new display name.
    pub name: Option<String>,
    /// The new email address.
    pub email: Option<String>,
    /// The new plaintext password, rehashed before storage.
    pub password: Option<String>,
}

/// A route handler for fetching the authenticated user's profile.
pub async fn get_profile(Extension(user): Extension<UserProfile>) -> Json<UserProfile> {
    Json(user)
}

/// A route handler for partially updating the authenticated user's profile.
///
/// The password is only rehashed when the request provides one, so updating
/// the name does not pay the bcrypt cost.
///
/// # Errors
///
/// Returns an [Error::Validation] listing every invalid field, or an
/// [Error::DuplicateEmail] if the new email belongs to another user.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Json(data): Json<ProfileUpdateData>,
) -> Result<Json<UserProfile>, Error> {
    // The profile in the extension was loaded before this handler ran, the
    // stored record is re-read so concurrent updates are not clobbered.
    let current = state.user_store.get(user.id)?;

    let mut violations = Vec::new();

    let name = match data.name.map(|name| name.trim().to_owned()) {
        Some(name) if !name.is_empty() => name,
        Some(_) => {
            violations.push("a name is required".to_owned());
            current.name().to_owned()
        }
        None => current.name().to_owned(),
    };

    let email = match data.email {
        Some(raw) => match parse_email(&raw) {
            Some(email) => email,
            None => {
                violations.push("a valid email address is required".to_owned());
                current.email().clone()
            }
        },
        None => current.email().clone(),
    };

    let validated_password = match data.password {
        Some(raw) => match ValidatedPassword::new(&raw) {
            Ok(password) => Some(password),
            Err(Error::Validation(message)) => {
                violations.push(message);
                None
            }
            Err(error) => return Err(error),
        },
        None => None,
    };

    if !violations.is_empty() {
        return Err(Error::Validation(violations.join(", ")));
    }

    let password_hash = match validated_password {
        Some(password) => PasswordHash::new(password, PasswordHash::DEFAULT_COST)?,
        None => current.password_hash().clone(),
    };

    let updated = User::new(
        current.id(),
        name,
        email,
        password_hash,
        current.created_at(),
    );

    let mut user_store = state.user_store;
    user_store.update(&updated)?;

    Ok(Json(updated.profile()))
}

/// A route handler for deleting the authenticated user's account along with
/// all of their transactions.
///
/// The transactions are removed first so a failure part way through cannot
/// leave orphaned rows behind. The two deletes do not share a database
/// transaction.
pub async fn delete_profile(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
) -> Result<Json<Value>, Error> {
    let mut transaction_store = state.transaction_store;
    let mut user_store = state.user_store;

    let deleted = transaction_store.delete_by_user(user.id)?;
    user_store.delete(user.id)?;

    tracing::info!(
        "Deleted user {} and {} associated transaction(s)",
        user.id,
        deleted
    );

    Ok(Json(
        json!({ "message": "user account and associated data deleted" }),
    ))
}

#[cfg(test)]
mod get_profile_tests {
    use serde_json::Value;

    use crate::{
        endpoints,
        test_utils::{get_test_server, register_user},
    };

    #[tokio::test]
    async fn get_profile_returns_the_authenticated_user() {
        let server = get_test_server();
        let registered = register_user(&server, "jane@doe.com", "hunter22").await;
        let token = registered["token"].as_str().unwrap();

        let response = server
            .get(endpoints::PROFILE)
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();

        let profile = response.json::<Value>();
        assert_eq!(profile["id"], registered["id"]);
        assert_eq!(profile["email"], "jane@doe.com");
        assert!(profile["created_at"].is_string());
        assert_eq!(profile.get("password"), None);
    }

    #[tokio::test]
    async fn get_profile_without_token_is_rejected() {
        let server = get_test_server();

        let response = server.get(endpoints::PROFILE).await;

        response.assert_status_unauthorized();
    }
}

#[cfg(test)]
mod update_profile_tests {
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::{get_test_server, register_user},
    };

    #[tokio::test]
    async fn update_profile_changes_only_provided_fields() {
        let server = get_test_server();
        let registered = register_user(&server, "jane@doe.com", "hunter22").await;
        let token = registered["token"].as_str().unwrap();

        let response = server
            .put(endpoints::PROFILE)
            .authorization_bearer(token)
            .json(&json!({ "name": "Jane Smith" }))
            .await;

        response.assert_status_ok();

        let profile = response.json::<Value>();
        assert_eq!(profile["name"], "Jane Smith");
        assert_eq!(profile["email"], "jane@doe.com");
    }

    #[tokio::test]
    async fn update_profile_rehashes_a_new_password() {
        let server = get_test_server();
        let registered = register_user(&server, "jane@doe.com", "hunter22").await;
        let token = registered["token"].as_str().unwrap();

        server
            .put(endpoints::PROFILE)
            .authorization_bearer(token)
            .json(&json!({ "password": "correcthorse" }))
            .await
            .assert_status_ok();

        let old_password = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "jane@doe.com", "password": "hunter22" }))
            .await;
        let new_password = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "jane@doe.com", "password": "correcthorse" }))
            .await;

        old_password.assert_status_unauthorized();
        new_password.assert_status_ok();
    }

    #[tokio::test]
    async fn update_profile_rejects_a_short_password() {
        let server = get_test_server();
        let registered = register_user(&server, "jane@doe.com", "hunter22").await;
        let token = registered["token"].as_str().unwrap();

        let response = server
            .put(endpoints::PROFILE)
            .authorization_bearer(token)
            .json(&json!({ "password": "short" }))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({
            "message": "the password must be at least 6 characters long"
        }));
    }

    #[tokio::test]
    async fn update_profile_rejects_an_email_taken_by_another_user() {
        let server = get_test_server();
        register_user(&server, "jane@doe.com", "hunter22").await;
        let other = register_user(&server, "john@doe.com", "hunter22").await;
        let token = other["token"].as_str().unwrap();

        let response = server
            .put(endpoints::PROFILE)
            .authorization_bearer(token)
            .json(&json!({ "email": "jane@doe.com" }))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({ "message": "user already exists" }));
    }

    #[tokio::test]
    async fn update_profile_with_empty_body_changes_nothing() {
        let server = get_test_server();
        let registered = register_user(&server, "jane@doe.com", "hunter22").await;
        let token = registered["token"].as_str().unwrap();

        let response = server
            .put(endpoints::PROFILE)
            .authorization_bearer(token)
            .json(&json!({}))
            .await;

        response.assert_status_ok();

        let profile = response.json::<Value>();
        assert_eq!(profile["name"], registered["name"]);
        assert_eq!(profile["email"], registered["email"]);
    }
}
