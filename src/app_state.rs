//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;

use crate::{
    Error,
    db::initialize,
    stores::{SQLiteTransactionStore, SQLiteUserStore},
};

/// The state of the REST server.
///
/// Everything a request handler shares with other requests lives here: the
/// token signing keys and the store handles. It is built once at process
/// start from explicit configuration, there are no ambient globals.
#[derive(Clone)]
pub struct AppState {
    /// The key for signing bearer tokens.
    pub encoding_key: EncodingKey,
    /// The key for verifying bearer token signatures.
    pub decoding_key: DecodingKey,
    /// The store for managing [users](crate::models::User).
    pub user_store: SQLiteUserStore,
    /// The store for managing [transactions](crate::models::Transaction).
    pub transaction_store: SQLiteTransactionStore,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models. `secret` is the server-held secret both token keys
    /// are derived from.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, secret: &str) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            user_store: SQLiteUserStore::new(connection.clone()),
            transaction_store: SQLiteTransactionStore::new(connection),
        })
    }
}
