//! Assembles the API routes into the application router.

use axum::{
    Json, Router, middleware,
    routing::{get, post, put},
};
use serde_json::{Value, json};

use crate::{
    AppState,
    auth::auth_guard,
    endpoints,
    routes::{
        create_transaction, delete_profile, delete_transaction, get_profile, get_transactions,
        log_in, register, update_profile, update_transaction,
    },
};

/// Return a router with all the app's routes.
///
/// Health and auth routes are reachable without a token, everything else sits
/// behind the auth middleware.
pub fn build_router(state: AppState) -> Router {
    let unprotected = Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::REGISTER, post(register))
        .route(endpoints::LOG_IN, post(log_in));

    let protected = Router::new()
        .route(
            endpoints::PROFILE,
            get(get_profile).put(update_profile).delete(delete_profile),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions).post(create_transaction),
        )
        .route(
            endpoints::TRANSACTION,
            put(update_transaction).delete(delete_transaction),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    unprotected.merge(protected).with_state(state)
}

/// A route handler for checking that the server is reachable.
async fn get_health() -> Json<Value> {
    Json(json!({ "status": "OK", "message": "server is running" }))
}
