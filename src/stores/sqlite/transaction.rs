//! Implements a SQLite backed transaction store.
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, types::Type};
use time::OffsetDateTime;

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{Transaction, TransactionBuilder, TransactionID, TransactionType, UserID},
    stores::TransactionStore,
};

/// Stores transactions in a SQLite database.
///
/// Note that because a transaction references its owning
/// [User](crate::models::User), the user table must be set up in the database.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl TransactionStore for SQLiteTransactionStore {
    /// Create a new transaction in the database.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    ///
    /// Returns [Error::SqlError] if there is an SQL error, e.g. the owner
    /// does not satisfy the foreign key constraint.
    fn create(&mut self, builder: TransactionBuilder) -> Result<Transaction, Error> {
        let transaction = self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "INSERT INTO \"transaction\" (user_id, type, amount, category, description, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING id, user_id, type, amount, category, description, created_at",
            )?
            .query_row(
                (
                    builder.user_id.as_i64(),
                    builder.transaction_type.to_string(),
                    builder.amount,
                    &builder.category,
                    &builder.description,
                    builder.created_at,
                ),
                Self::map_row,
            )?;

        Ok(transaction)
    }

    /// Retrieve a transaction in the database by its `id`.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if `id` does not refer to a valid
    /// transaction, or [Error::SqlError] if there is some other SQL error.
    fn get(&self, id: TransactionID) -> Result<Transaction, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, user_id, type, amount, category, description, created_at
                 FROM \"transaction\" WHERE id = :id",
            )?
            .query_row(&[(":id", &id.as_i64())], Self::map_row)
            .map_err(|e| e.into())
    }

    /// Retrieve all of `user_id`'s transactions, most recently created first.
    ///
    /// The ID is used as a tiebreak so that two transactions created in the
    /// same instant still come back in insertion order, newest first.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    fn get_by_user(&self, user_id: UserID) -> Result<Vec<Transaction>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, user_id, type, amount, category, description, created_at
                 FROM \"transaction\" WHERE user_id = :user_id
                 ORDER BY created_at DESC, id DESC",
            )?
            .query_map(&[(":user_id", &user_id.as_i64())], Self::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
            .collect()
    }

    /// Overwrite the stored fields for `transaction`.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    fn update(&mut self, transaction: &Transaction) -> Result<(), Error> {
        let rows_affected = self.connection.lock().unwrap().execute(
            "UPDATE \"transaction\"
             SET type = ?1, amount = ?2, category = ?3, description = ?4
             WHERE id = ?5",
            (
                transaction.transaction_type().to_string(),
                transaction.amount(),
                transaction.category(),
                transaction.description(),
                transaction.id().as_i64(),
            ),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Delete the transaction with the specified `id`.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    fn delete(&mut self, id: TransactionID) -> Result<(), Error> {
        let rows_affected = self
            .connection
            .lock()
            .unwrap()
            .execute("DELETE FROM \"transaction\" WHERE id = ?1", [id.as_i64()])?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Delete every transaction owned by `user_id`.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    fn delete_by_user(&mut self, user_id: UserID) -> Result<usize, Error> {
        self.connection
            .lock()
            .unwrap()
            .execute(
                "DELETE FROM \"transaction\" WHERE user_id = ?1",
                [user_id.as_i64()],
            )
            .map_err(|e| e.into())
    }
}

impl CreateTable for SQLiteTransactionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS \"transaction\" (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    type TEXT NOT NULL,
                    amount REAL NOT NULL,
                    category TEXT NOT NULL,
                    description TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY(user_id) REFERENCES user(id)
                    )",
            (),
        )?;

        // Listing is always per-user and newest first.
        connection.execute(
            "CREATE INDEX IF NOT EXISTS transaction_user_created_at
             ON \"transaction\" (user_id, created_at DESC)",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteTransactionStore {
    type ReturnType = Transaction;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id = TransactionID::new(row.get(offset)?);
        let user_id = UserID::new(row.get(offset + 1)?);
        let raw_type: String = row.get(offset + 2)?;
        let amount = row.get(offset + 3)?;
        let category = row.get(offset + 4)?;
        let description = row.get(offset + 5)?;
        let created_at: OffsetDateTime = row.get(offset + 6)?;

        let transaction_type: TransactionType = raw_type.parse().map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                offset + 2,
                Type::Text,
                format!("invalid transaction type {raw_type:?}").into(),
            )
        })?;

        Ok(Transaction::new_unchecked(
            id,
            user_id,
            transaction_type,
            amount,
            category,
            description,
            created_at,
        ))
    }
}
