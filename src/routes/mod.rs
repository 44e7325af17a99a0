//! HTTP request handlers, grouped the way the API groups its routes.

mod auth;
mod transactions;
mod users;

pub use auth::{log_in, register};
pub use transactions::{
    create_transaction, delete_transaction, get_transactions, update_transaction,
};
pub use users::{delete_profile, get_profile, update_profile};
