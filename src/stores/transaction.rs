//! Defines the transaction store trait.

use crate::{
    Error,
    models::{Transaction, TransactionBuilder, TransactionID, UserID},
};

/// Handles the creation and retrieval of transactions.
///
/// Ownership checks are the caller's job: the store will happily return or
/// mutate any row it is asked about.
pub trait TransactionStore {
    /// Persist a new transaction from validated fields.
    fn create(&mut self, builder: TransactionBuilder) -> Result<Transaction, Error>;

    /// Retrieve a transaction by its `id`.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if `id` does not refer to a transaction.
    fn get(&self, id: TransactionID) -> Result<Transaction, Error>;

    /// Retrieve all transactions owned by `user_id`, newest first.
    fn get_by_user(&self, user_id: UserID) -> Result<Vec<Transaction>, Error>;

    /// Overwrite the stored fields for `transaction`.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if the transaction does not exist.
    fn update(&mut self, transaction: &Transaction) -> Result<(), Error>;

    /// Delete a transaction by its `id`.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if the transaction does not exist.
    fn delete(&mut self, id: TransactionID) -> Result<(), Error>;

    /// Delete every transaction owned by `user_id`, returning how many rows
    /// were removed.
    ///
    /// Used when a user account is deleted. Deleting zero rows is not an
    /// error: a user may have no transactions.
    fn delete_by_user(&mut self, user_id: UserID) -> Result<usize, Error>;
}
