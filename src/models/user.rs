//! This file defines a user of the application and its supporting types.

use std::fmt::Display;

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::PasswordHash;

/// A newtype wrapper for integer user IDs.
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserID(i64);

impl UserID {
    /// Create a user ID from an integer.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The underlying integer ID.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// This is the internal credential record: it carries the password hash and
/// therefore does not implement `Serialize`. Use [UserProfile] for anything
/// that leaves the server.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserID,
    name: String,
    email: EmailAddress,
    password_hash: PasswordHash,
    created_at: OffsetDateTime,
}

impl User {
    /// Create a user from its fields.
    ///
    /// This is intended for use by [stores](crate::stores) reconstructing a
    /// persisted user. To register a new user go through
    /// [UserStore::create](crate::stores::UserStore::create).
    pub fn new(
        id: UserID,
        name: String,
        email: EmailAddress,
        password_hash: PasswordHash,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            name,
            email,
            password_hash,
            created_at,
        }
    }

    /// The user's ID in the database.
    pub fn id(&self) -> UserID {
        self.id
    }

    /// The user's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The email address associated with the user.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// The user's password hash.
    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    /// When the user registered.
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// The public projection of this user, with the password hash excluded.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

/// The public shape of a user.
///
/// This is what handlers return to clients and what the auth middleware
/// attaches to requests. It has no password field by construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    /// The user's ID in the database.
    pub id: UserID,
    /// The user's display name.
    pub name: String,
    /// The email address associated with the user.
    pub email: EmailAddress,
    /// When the user registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
