//! Bearer token issuance and verification, and the request authentication
//! middleware that gates the protected routes.

mod middleware;
mod token;

pub use middleware::{AuthState, auth_guard};
pub use token::{Claims, TOKEN_DURATION, decode_token, encode_token};
