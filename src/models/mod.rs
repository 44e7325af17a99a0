//! This module defines the domain data types.

pub use password::{PasswordHash, ValidatedPassword};
pub use transaction::{Transaction, TransactionBuilder, TransactionID, TransactionType};
pub use user::{User, UserID, UserProfile};

mod password;
mod transaction;
mod user;
