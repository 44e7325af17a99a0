//! Defines the user store trait.

use email_address::EmailAddress;

use crate::{
    Error,
    models::{PasswordHash, User, UserID},
};

/// Handles the creation and retrieval of User objects.
pub trait UserStore {
    /// Create a new user.
    ///
    /// The caller is responsible for hashing the password and normalizing the
    /// email address to lowercase before calling this function.
    ///
    /// # Errors
    ///
    /// Returns [Error::DuplicateEmail] if the email is already registered.
    fn create(
        &mut self,
        name: &str,
        email: EmailAddress,
        password_hash: PasswordHash,
    ) -> Result<User, Error>;

    /// Get a user by their ID.
    ///
    /// Returns [Error::NotFound] if no user with the given ID exists.
    fn get(&self, id: UserID) -> Result<User, Error>;

    /// Get a user by their email, including the password hash for credential
    /// verification.
    ///
    /// Returns [Error::NotFound] if no user with the given email exists.
    fn get_by_email(&self, email: &EmailAddress) -> Result<User, Error>;

    /// Overwrite the stored name, email and password hash for `user`.
    ///
    /// The caller re-hashes the password before building the updated `user`
    /// when it changed.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if the user does not exist, or
    /// [Error::DuplicateEmail] if the new email belongs to another user.
    fn update(&mut self, user: &User) -> Result<(), Error>;

    /// Delete a user by their ID.
    ///
    /// Deleting a user does **not** remove their transactions; callers that
    /// want the cascade must call
    /// [TransactionStore::delete_by_user](crate::stores::TransactionStore::delete_by_user)
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if the user does not exist.
    fn delete(&mut self, id: UserID) -> Result<(), Error>;
}
