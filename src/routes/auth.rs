//! Route handlers for registration and log in.

use std::str::FromStr;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::encode_token,
    models::{PasswordHash, User, UserID, ValidatedPassword},
    stores::UserStore,
};

/// The request body for registering a new user.
#[derive(Debug, Deserialize)]
pub struct RegisterData {
    /// The new user's display name.
    pub name: Option<String>,
    /// The new user's email address.
    pub email: Option<String>,
    /// The new user's plaintext password.
    pub password: Option<String>,
}

/// The request body for logging in.
#[derive(Debug, Deserialize)]
pub struct LogInData {
    /// The email entered during log in.
    pub email: Option<String>,
    /// The password entered during log in.
    pub password: Option<String>,
}

/// The response body for a successful registration or log in.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// The user's ID in the database.
    pub id: UserID,
    /// The user's display name.
    pub name: String,
    /// The email address associated with the user.
    pub email: EmailAddress,
    /// A fresh bearer token authenticating as this user.
    pub token: String,
}

impl AuthResponse {
    fn new(user: &User, token: String) -> Self {
        Self {
            id: user.id(),
            name: user.name().to_owned(),
            email: user.email().clone(),
            token,
        }
    }
}

/// A route handler for registering a new user.
///
/// Issues a bearer token right away so the client does not need a separate
/// log in request.
///
/// # Errors
///
/// Returns an [Error::Validation] listing every invalid field, or an
/// [Error::DuplicateEmail] if the email is already registered.
pub async fn register(
    State(state): State<AppState>,
    Json(data): Json<RegisterData>,
) -> Result<impl IntoResponse, Error> {
    let (name, email, password) = validate_registration(data)?;

    let password_hash = PasswordHash::new(password, PasswordHash::DEFAULT_COST)?;

    let mut user_store = state.user_store;
    let user = user_store.create(&name, email, password_hash)?;

    let token = encode_token(user.id(), &state.encoding_key)?;

    tracing::info!("Registered user {} ({})", user.id(), user.email());

    Ok((StatusCode::CREATED, Json(AuthResponse::new(&user, token))))
}

fn validate_registration(
    data: RegisterData,
) -> Result<(String, EmailAddress, ValidatedPassword), Error> {
    let mut violations = Vec::new();

    let name = match data.name.map(|name| name.trim().to_owned()) {
        Some(name) if !name.is_empty() => Some(name),
        _ => {
            violations.push("a name is required".to_owned());
            None
        }
    };

    let email = match data.email {
        Some(raw) => match parse_email(&raw) {
            Some(email) => Some(email),
            None => {
                violations.push("a valid email address is required".to_owned());
                None
            }
        },
        None => {
            violations.push("an email address is required".to_owned());
            None
        }
    };

    let password = match data.password {
        Some(raw) => match ValidatedPassword::new(&raw) {
            Ok(password) => Some(password),
            Err(Error::Validation(message)) => {
                violations.push(message);
                None
            }
            Err(error) => return Err(error),
        },
        None => {
            violations.push("a password is required".to_owned());
            None
        }
    };

    match (name, email, password) {
        (Some(name), Some(email), Some(password)) if violations.is_empty() => {
            Ok((name, email, password))
        }
        _ => Err(Error::Validation(violations.join(", "))),
    }
}

/// Normalize and parse an email address. Stored emails are always lowercase.
pub(crate) fn parse_email(raw: &str) -> Option<EmailAddress> {
    EmailAddress::from_str(&raw.trim().to_lowercase()).ok()
}

/// A route handler for logging in with email and password.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] for an unknown email **and** for a
/// wrong password: the two cases are indistinguishable from the outside so
/// the endpoint cannot be used to enumerate registered emails.
pub async fn log_in(
    State(state): State<AppState>,
    Json(data): Json<LogInData>,
) -> Result<Json<AuthResponse>, Error> {
    let email = data
        .email
        .as_deref()
        .and_then(parse_email)
        .ok_or(Error::InvalidCredentials)?;
    let password = data.password.ok_or(Error::InvalidCredentials)?;

    let user = state
        .user_store
        .get_by_email(&email)
        .map_err(|error| match error {
            Error::NotFound => Error::InvalidCredentials,
            error => error,
        })?;

    let password_matches = user
        .password_hash()
        .verify(&password)
        .map_err(|e| Error::HashingError(e.to_string()))?;

    if !password_matches {
        return Err(Error::InvalidCredentials);
    }

    // Each log in issues a fresh token, previous tokens stay valid until
    // their own expiry.
    let token = encode_token(user.id(), &state.encoding_key)?;

    Ok(Json(AuthResponse::new(&user, token)))
}
