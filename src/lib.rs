//! Tally is a personal finance tracker.
//!
//! This library provides a JSON REST API for registering users, logging in
//! with bearer tokens, and recording income and expense transactions that are
//! only ever visible to their owner.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
pub mod db;
mod endpoints;
mod logging;
pub mod models;
mod routes;
mod routing;
pub mod stores;
#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use logging::logging_middleware;
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more request fields failed validation.
    ///
    /// The string lists every violated field message, joined with ", ".
    #[error("{0}")]
    Validation(String),

    /// The email used to create a user is already registered.
    #[error("user already exists")]
    DuplicateEmail,

    /// The email and password combination did not match a registered user.
    ///
    /// "No such user" and "wrong password" both map here so that the response
    /// does not reveal which check failed.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The request did not carry an `Authorization: Bearer <token>` header.
    #[error("not authorized, no token")]
    MissingToken,

    /// The bearer token was malformed, had a bad signature or has expired.
    ///
    /// All verification failure modes collapse into this variant so that the
    /// response does not leak verification internals.
    #[error("not authorized, token invalid")]
    InvalidToken,

    /// The bearer token was valid but the user it refers to no longer exists.
    #[error("not authorized, user not found")]
    UserNotFound,

    /// The authenticated user does not own the requested resource.
    #[error("not authorized")]
    Forbidden,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The auth token could not be signed.
    #[error("could not create auth token")]
    TokenCreation,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => Error::SqlError(error),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::Validation(_) | Error::DuplicateEmail => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials
            | Error::MissingToken
            | Error::InvalidToken
            | Error::UserNotFound => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            // Errors below are not intended to be shown to the client.
            Error::HashingError(_) | Error::TokenCreation | Error::SqlError(_) => {
                tracing::error!("An unexpected error occurred: {}", self);

                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "internal server error" })),
                )
                    .into_response();
            }
        };

        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
