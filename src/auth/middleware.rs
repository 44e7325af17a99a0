//! Authentication middleware that gates every protected route.
//!
//! The guard inspects the `Authorization: Bearer <token>` header, verifies
//! the token, loads the referenced user and attaches the password-free
//! [UserProfile](crate::models::UserProfile) to the request extensions. Any
//! failure short-circuits the pipeline with a 401 before the handler runs.

use axum::{
    RequestPartsExt,
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::DecodingKey;

use crate::{
    AppState, Error,
    auth::decode_token,
    stores::{SQLiteUserStore, UserStore},
};

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The key for verifying bearer token signatures.
    pub decoding_key: DecodingKey,
    /// The store used to load the user referenced by a token.
    pub user_store: SQLiteUserStore,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            decoding_key: state.decoding_key.clone(),
            user_store: state.user_store.clone(),
        }
    }
}

/// Middleware function that authenticates the request before it reaches a
/// protected handler.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user): Extension<UserProfile>` to receive the authenticated
/// user.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer = match parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
    {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(_) => return Error::MissingToken.into_response(),
    };

    let user_id = match decode_token(bearer.token(), &state.decoding_key) {
        Ok(user_id) => user_id,
        Err(error) => return error.into_response(),
    };

    // The token may outlive the account it was issued for.
    let user = match state.user_store.get(user_id) {
        Ok(user) => user,
        Err(Error::NotFound) => return Error::UserNotFound.into_response(),
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(user.profile());

    next.run(Request::from_parts(parts, body)).await
}

#[cfg(test)]
mod auth_guard_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use axum::{Extension, Json, Router, middleware, routing::get};
    use axum_test::TestServer;
    use email_address::EmailAddress;
    use jsonwebtoken::{DecodingKey, EncodingKey};
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        auth::encode_token,
        db::initialize,
        models::{PasswordHash, UserID, UserProfile},
        stores::{SQLiteUserStore, UserStore},
    };

    use super::{AuthState, auth_guard};

    const SECRET: &str = "notsosecret";
    const PROTECTED_ROUTE: &str = "/protected";

    async fn protected_handler(Extension(user): Extension<UserProfile>) -> Json<UserProfile> {
        Json(user)
    }

    fn get_test_server() -> (TestServer, UserID, EncodingKey) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let mut user_store = SQLiteUserStore::new(Arc::new(Mutex::new(conn)));

        let user = user_store
            .create(
                "Jane Doe",
                EmailAddress::from_str("jane@doe.com").unwrap(),
                PasswordHash::new_unchecked("hunter2"),
            )
            .unwrap();

        let state = AuthState {
            decoding_key: DecodingKey::from_secret(SECRET.as_ref()),
            user_store,
        };

        let app = Router::new()
            .route(PROTECTED_ROUTE, get(protected_handler))
            .route_layer(middleware::from_fn_with_state(state, auth_guard));

        let server = TestServer::try_new(app).expect("Could not create test server.");

        (server, user.id(), EncodingKey::from_secret(SECRET.as_ref()))
    }

    #[tokio::test]
    async fn request_with_valid_token_reaches_handler() {
        let (server, user_id, encoding_key) = get_test_server();
        let token = encode_token(user_id, &encoding_key).unwrap();

        let response = server
            .get(PROTECTED_ROUTE)
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        let profile = response.json::<Value>();
        assert_eq!(profile["email"], "jane@doe.com");
        assert_eq!(profile.get("password"), None);
    }

    #[tokio::test]
    async fn request_without_header_is_rejected() {
        let (server, _, _) = get_test_server();

        let response = server.get(PROTECTED_ROUTE).await;

        response.assert_status_unauthorized();
        response.assert_json(&json!({ "message": "not authorized, no token" }));
    }

    #[tokio::test]
    async fn request_with_garbage_token_is_rejected() {
        let (server, _, _) = get_test_server();

        let response = server
            .get(PROTECTED_ROUTE)
            .authorization_bearer("not.a.token")
            .await;

        response.assert_status_unauthorized();
        response.assert_json(&json!({ "message": "not authorized, token invalid" }));
    }

    #[tokio::test]
    async fn request_with_wrongly_signed_token_is_rejected() {
        let (server, user_id, _) = get_test_server();
        let forged_key = EncodingKey::from_secret("adifferentsecret".as_ref());
        let token = encode_token(user_id, &forged_key).unwrap();

        let response = server
            .get(PROTECTED_ROUTE)
            .authorization_bearer(token)
            .await;

        response.assert_status_unauthorized();
        response.assert_json(&json!({ "message": "not authorized, token invalid" }));
    }

    #[tokio::test]
    async fn request_for_deleted_user_is_rejected() {
        let (server, _, encoding_key) = get_test_server();
        // A token that verifies but references a user that does not exist.
        let token = encode_token(UserID::new(999), &encoding_key).unwrap();

        let response = server
            .get(PROTECTED_ROUTE)
            .authorization_bearer(token)
            .await;

        response.assert_status_unauthorized();
        response.assert_json(&json!({ "message": "not authorized, user not found" }));
    }
}
