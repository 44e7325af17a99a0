//! Issuing and verifying the signed bearer tokens that stand in for sessions.
//!
//! Tokens are stateless: possession of a valid, unexpired token is equivalent
//! to being the user named in its `sub` claim. There is no revocation list,
//! so a token for a deleted account stays "valid" until the user lookup in
//! the [auth middleware](crate::auth::auth_guard) fails.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, models::UserID};

/// How long an issued token stays valid.
pub const TOKEN_DURATION: Duration = Duration::days(30);

/// The contents of a signed bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user this token authenticates as.
    pub sub: i64,
    /// The time the token was issued, as a unix timestamp.
    pub iat: usize,
    /// The expiry time of the token, as a unix timestamp.
    pub exp: usize,
}

/// Create a signed token that authenticates as `user_id` for the next
/// [TOKEN_DURATION].
///
/// # Errors
///
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(user_id: UserID, encoding_key: &EncodingKey) -> Result<String, Error> {
    encode_token_with_duration(user_id, TOKEN_DURATION, encoding_key)
}

fn encode_token_with_duration(
    user_id: UserID,
    duration: Duration,
    encoding_key: &EncodingKey,
) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id.as_i64(),
        iat: now.unix_timestamp() as usize,
        exp: (now + duration).unix_timestamp() as usize,
    };

    encode(&Header::default(), &claims, encoding_key).map_err(|e| {
        tracing::error!("Error signing auth token: {e}");
        Error::TokenCreation
    })
}

/// Verify `token` and return the user ID it authenticates as.
///
/// # Errors
///
/// Returns [Error::InvalidToken] whether the token is malformed, carries a
/// bad signature or has expired. The failure modes are deliberately not
/// distinguishable from the outside.
pub fn decode_token(token: &str, decoding_key: &DecodingKey) -> Result<UserID, Error> {
    decode::<Claims>(token, decoding_key, &Validation::default())
        .map(|token_data| UserID::new(token_data.claims.sub))
        .map_err(|_| Error::InvalidToken)
}
