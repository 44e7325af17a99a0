/*! This module defines and implements traits for interacting with the application's database. */

use rusqlite::{Connection, Error, Row};

use crate::stores::{SQLiteTransactionStore, SQLiteUserStore};

/// A trait for adding an object schema to a database.
pub trait CreateTable {
    /// Create a table for the model.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    fn create_table(connection: &Connection) -> Result<(), Error>;
}

/// A trait for mapping from a `rusqlite::Row` from a SQLite database to a concrete rust type.
pub trait MapRow {
    /// The type that the implementation maps rows to.
    type ReturnType;

    /// Map a row to [Self::ReturnType], reading from the first column.
    ///
    /// # Errors
    /// Returns an error if a column is missing or contains an unexpected type.
    fn map_row(row: &Row) -> Result<Self::ReturnType, Error> {
        Self::map_row_with_offset(row, 0)
    }

    /// Map a row to [Self::ReturnType], reading from the column at `offset`.
    ///
    /// # Errors
    /// Returns an error if a column is missing or contains an unexpected type.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, Error>;
}

/// Create the tables and indices for the application's domain models.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.execute("PRAGMA foreign_keys = ON", ())?;

    SQLiteUserStore::create_table(connection)?;
    SQLiteTransactionStore::create_table(connection)?;

    Ok(())
}
