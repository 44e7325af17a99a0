//! The API endpoint URIs.

/// The route for registering a new user.
pub const REGISTER: &str = "/auth/register";
/// The route for logging in with email and password.
pub const LOG_IN: &str = "/auth/login";
/// The route for the authenticated user's own profile.
pub const PROFILE: &str = "/users/profile";
/// The route for listing and creating the authenticated user's transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route for updating or deleting a single transaction.
pub const TRANSACTION: &str = "/transactions/{transaction_id}";
/// The route for checking that the server is up.
pub const HEALTH: &str = "/health";
