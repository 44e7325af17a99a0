//! Implements a SQLite backed user store.
use std::sync::{Arc, Mutex};

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{PasswordHash, User, UserID},
    stores::UserStore,
};

/// Handles the creation and retrieval of User objects.
#[derive(Debug, Clone)]
pub struct SQLiteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserStore {
    /// Create a new user store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl UserStore for SQLiteUserStore {
    /// Create and insert a new user into the database.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    ///
    /// Returns [Error::DuplicateEmail] if the email is already registered, or
    /// [Error::SqlError] if an SQL related error occurred.
    fn create(
        &mut self,
        name: &str,
        email: EmailAddress,
        password_hash: PasswordHash,
    ) -> Result<User, Error> {
        let connection = self.connection.lock().unwrap();
        let created_at = OffsetDateTime::now_utc();

        connection.execute(
            "INSERT INTO user (name, email, password, created_at) VALUES (?1, ?2, ?3, ?4)",
            (
                name,
                &email.to_string(),
                password_hash.to_string(),
                created_at,
            ),
        )?;

        let id = UserID::new(connection.last_insert_rowid());

        Ok(User::new(
            id,
            name.to_string(),
            email,
            password_hash,
            created_at,
        ))
    }

    /// Get the user from the database that has the specified `id`, or return [Error::NotFound] if such user does not exist.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    fn get(&self, id: UserID) -> Result<User, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare("SELECT id, name, email, password, created_at FROM user WHERE id = :id")?
            .query_row(&[(":id", &id.as_i64())], SQLiteUserStore::map_row)
            .map_err(|e| e.into())
    }

    /// Get the user from the database that has the specified `email` address, or return [Error::NotFound] if such user does not exist.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    fn get_by_email(&self, email: &EmailAddress) -> Result<User, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare("SELECT id, name, email, password, created_at FROM user WHERE email = :email")?
            .query_row(
                &[(":email", &email.to_string())],
                SQLiteUserStore::map_row,
            )
            .map_err(|e| e.into())
    }

    /// Overwrite the stored name, email and password hash for `user`.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    fn update(&mut self, user: &User) -> Result<(), Error> {
        let rows_affected = self.connection.lock().unwrap().execute(
            "UPDATE user SET name = ?1, email = ?2, password = ?3 WHERE id = ?4",
            (
                user.name(),
                &user.email().to_string(),
                user.password_hash().to_string(),
                user.id().as_i64(),
            ),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Delete the user with the specified `id`.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    fn delete(&mut self, id: UserID) -> Result<(), Error> {
        let rows_affected = self
            .connection
            .lock()
            .unwrap()
            .execute("DELETE FROM user WHERE id = ?1", [id.as_i64()])?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

impl CreateTable for SQLiteUserStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS user (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    email TEXT UNIQUE NOT NULL,
                    password TEXT NOT NULL,
                    created_at TEXT NOT NULL
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteUserStore {
    type ReturnType = User;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_id = row.get(offset)?;
        let name: String = row.get(offset + 1)?;
        let raw_email: String = row.get(offset + 2)?;
        let raw_password_hash: String = row.get(offset + 3)?;
        let created_at: OffsetDateTime = row.get(offset + 4)?;

        let id = UserID::new(raw_id);
        let email = EmailAddress::new_unchecked(raw_email);
        let password_hash = PasswordHash::new_unchecked(&raw_password_hash);

        Ok(User::new(id, name, email, password_hash, created_at))
    }
}

#[cfg(test)]
mod user_store_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use email_address::EmailAddress;
    use rusqlite::Connection;

    use crate::{
        Error,
        db::CreateTable,
        models::{PasswordHash, User, UserID},
    };

    use super::{SQLiteUserStore, UserStore};

    fn get_store() -> SQLiteUserStore {
        let conn = Connection::open_in_memory().unwrap();
        SQLiteUserStore::create_table(&conn).unwrap();

        SQLiteUserStore::new(Arc::new(Mutex::new(conn)))
    }

    fn create_test_user(store: &mut SQLiteUserStore) -> User {
        store
            .create(
                "Jane Doe",
                EmailAddress::from_str("jane@doe.com").unwrap(),
                PasswordHash::new_unchecked("hunter2"),
            )
            .unwrap()
    }

    #[test]
    fn insert_user_succeeds() {
        let mut store = get_store();

        let email = EmailAddress::from_str("hello@world.com").unwrap();
        let password_hash = PasswordHash::new_unchecked("hunter2");

        let inserted_user = store
            .create("Jo Bloggs", email.clone(), password_hash.clone())
            .unwrap();

        assert!(inserted_user.id().as_i64() > 0);
        assert_eq!(inserted_user.name(), "Jo Bloggs");
        assert_eq!(inserted_user.email(), &email);
        assert_eq!(inserted_user.password_hash(), &password_hash);
    }

    #[test]
    fn insert_user_fails_on_duplicate_email() {
        let mut store = get_store();

        let email = EmailAddress::from_str("hello@world.com").unwrap();

        assert!(
            store
                .create("First", email.clone(), PasswordHash::new_unchecked("hunter2"))
                .is_ok()
        );

        assert_eq!(
            store.create(
                "Second",
                email.clone(),
                PasswordHash::new_unchecked("hunter3")
            ),
            Err(Error::DuplicateEmail)
        );
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let store = get_store();

        assert_eq!(store.get(UserID::new(42)), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let mut store = get_store();
        let test_user = create_test_user(&mut store);

        let retrieved_user = store.get(test_user.id()).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_fails_with_non_existent_email() {
        let store = get_store();

        // This email is not in the database.
        let email = EmailAddress::from_str("notavalidemail@foo.bar").unwrap();

        assert_eq!(store.get_by_email(&email), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_email() {
        let mut store = get_store();
        let test_user = create_test_user(&mut store);

        let retrieved_user = store.get_by_email(test_user.email()).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn update_user_overwrites_fields() {
        let mut store = get_store();
        let test_user = create_test_user(&mut store);

        let updated_user = User::new(
            test_user.id(),
            "Janet Doe".to_owned(),
            EmailAddress::from_str("janet@doe.com").unwrap(),
            PasswordHash::new_unchecked("hunter3"),
            test_user.created_at(),
        );

        store.update(&updated_user).unwrap();

        let retrieved_user = store.get(test_user.id()).unwrap();
        assert_eq!(retrieved_user.name(), "Janet Doe");
        assert_eq!(retrieved_user.email().as_str(), "janet@doe.com");
        assert_eq!(
            retrieved_user.password_hash(),
            &PasswordHash::new_unchecked("hunter3")
        );
    }

    #[test]
    fn update_user_fails_on_non_existent_id() {
        let mut store = get_store();

        let user = User::new(
            UserID::new(42),
            "Nobody".to_owned(),
            EmailAddress::from_str("no@body.com").unwrap(),
            PasswordHash::new_unchecked("hunter2"),
            time::OffsetDateTime::now_utc(),
        );

        assert_eq!(store.update(&user), Err(Error::NotFound));
    }

    #[test]
    fn update_user_fails_on_email_taken_by_another_user() {
        let mut store = get_store();
        let first = create_test_user(&mut store);
        let second = store
            .create(
                "John Doe",
                EmailAddress::from_str("john@doe.com").unwrap(),
                PasswordHash::new_unchecked("hunter2"),
            )
            .unwrap();

        let updated_second = User::new(
            second.id(),
            second.name().to_owned(),
            first.email().clone(),
            second.password_hash().clone(),
            second.created_at(),
        );

        assert_eq!(store.update(&updated_second), Err(Error::DuplicateEmail));
    }

    #[test]
    fn delete_user_removes_row() {
        let mut store = get_store();
        let test_user = create_test_user(&mut store);

        store.delete(test_user.id()).unwrap();

        assert_eq!(store.get(test_user.id()), Err(Error::NotFound));
    }

    #[test]
    fn delete_user_fails_on_non_existent_id() {
        let mut store = get_store();

        assert_eq!(store.delete(UserID::new(42)), Err(Error::NotFound));
    }
}
