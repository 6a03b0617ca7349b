use chrono::{DateTime, Utc};
use regex::Regex;
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use std::sync::OnceLock;

use crate::error::{Result, ShopError};
use crate::password;
use crate::store::{self, Store};

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn username_re() -> &'static Regex {
    USERNAME_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\-]{3,80}$").expect("valid username regex"))
}

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"))
}

pub fn validate_username(username: &str) -> Result<()> {
    if !username_re().is_match(username) {
        return Err(ShopError::InvalidInput {
            field: "username",
            reason: "3-80 characters of letters, digits, '_', '.' or '-'".into(),
        });
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    if email.len() > 120 || !email_re().is_match(email) {
        return Err(ShopError::InvalidInput {
            field: "email",
            reason: format!("'{email}' is not an email address"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "SELECT id, username, email, is_admin, created_at, password_hash FROM users";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<(User, String)> {
    Ok((
        User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            is_admin: row.get(3)?,
            created_at: store::timestamp_column(row, 4)?,
        },
        row.get(5)?,
    ))
}

fn required(value: &str) -> Result<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ShopError::MissingFields);
    }
    Ok(trimmed)
}

impl User {
    /// Create a customer account.
    pub fn register(store: &Store, username: &str, email: &str, pw: &str) -> Result<User> {
        Self::insert(store, username, email, pw, false)
    }

    fn insert(store: &Store, username: &str, email: &str, pw: &str, is_admin: bool) -> Result<User> {
        let username = required(username)?;
        let email = required(email)?;
        if pw.is_empty() {
            return Err(ShopError::MissingFields);
        }
        validate_username(username)?;
        validate_email(email)?;

        if Self::find_by_username(store, username)?.is_some() {
            return Err(ShopError::UsernameTaken(username.to_string()));
        }
        let email_taken = store
            .conn()
            .query_row("SELECT 1 FROM users WHERE email = ?1", [email], |_| Ok(()))
            .optional()?
            .is_some();
        if email_taken {
            return Err(ShopError::EmailTaken(email.to_string()));
        }

        store.conn().execute(
            "INSERT INTO users (username, email, password_hash, is_admin, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![username, email, password::hash(pw), is_admin, store::now()],
        )?;
        let id = store.conn().last_insert_rowid();
        tracing::info!(user_id = id, %username, is_admin, "user registered");
        Self::get(store, id)
    }

    /// Check credentials. Unknown users and wrong passwords yield the same
    /// error.
    pub fn authenticate(store: &Store, username: &str, pw: &str) -> Result<User> {
        let found = store
            .conn()
            .query_row(
                &format!("{USER_COLUMNS} WHERE username = ?1"),
                [username.trim()],
                user_from_row,
            )
            .optional()?;
        let Some((user, hash)) = found else {
            return Err(ShopError::InvalidCredentials);
        };
        match password::verify(pw, &hash) {
            Some(true) => Ok(user),
            Some(false) => Err(ShopError::InvalidCredentials),
            None => Err(ShopError::CorruptPasswordHash(user.id)),
        }
    }

    pub fn find(store: &Store, id: i64) -> Result<Option<User>> {
        Ok(store
            .conn()
            .query_row(&format!("{USER_COLUMNS} WHERE id = ?1"), [id], user_from_row)
            .optional()?
            .map(|(user, _)| user))
    }

    pub fn get(store: &Store, id: i64) -> Result<User> {
        Self::find(store, id)?.ok_or_else(|| ShopError::UserNotFound(id.to_string()))
    }

    pub fn find_by_username(store: &Store, username: &str) -> Result<Option<User>> {
        Ok(store
            .conn()
            .query_row(
                &format!("{USER_COLUMNS} WHERE username = ?1"),
                [username],
                user_from_row,
            )
            .optional()?
            .map(|(user, _)| user))
    }

    /// Create an administrator unless the username already exists.
    /// Returns the new user, or `None` when it was already present.
    pub fn ensure_admin(store: &Store, username: &str, email: &str, pw: &str) -> Result<Option<User>> {
        if Self::find_by_username(store, username)?.is_some() {
            return Ok(None);
        }
        Self::insert(store, username, email, pw, true).map(Some)
    }

    pub fn set_admin(store: &Store, username: &str, is_admin: bool) -> Result<User> {
        let changed = store.conn().execute(
            "UPDATE users SET is_admin = ?1 WHERE username = ?2",
            params![is_admin, username],
        )?;
        if changed == 0 {
            return Err(ShopError::UserNotFound(username.to_string()));
        }
        tracing::info!(%username, is_admin, "admin flag changed");
        Self::find_by_username(store, username)?
            .ok_or_else(|| ShopError::UserNotFound(username.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_authenticate() {
        let store = Store::open_in_memory().unwrap();
        let user = User::register(&store, "alice", "alice@example.com", "s3cret").unwrap();
        assert!(!user.is_admin);

        let authed = User::authenticate(&store, "alice", "s3cret").unwrap();
        assert_eq!(authed.id, user.id);
    }

    #[test]
    fn wrong_password_and_unknown_user_look_the_same() {
        let store = Store::open_in_memory().unwrap();
        User::register(&store, "alice", "alice@example.com", "s3cret").unwrap();
        assert!(matches!(
            User::authenticate(&store, "alice", "nope"),
            Err(ShopError::InvalidCredentials)
        ));
        assert!(matches!(
            User::authenticate(&store, "bob", "s3cret"),
            Err(ShopError::InvalidCredentials)
        ));
    }

    #[test]
    fn password_is_not_stored_in_clear() {
        let store = Store::open_in_memory().unwrap();
        User::register(&store, "alice", "alice@example.com", "s3cret").unwrap();
        let stored: String = store
            .conn()
            .query_row("SELECT password_hash FROM users", [], |r| r.get(0))
            .unwrap();
        assert!(!stored.contains("s3cret"));
    }

    #[test]
    fn duplicate_username_and_email_are_rejected() {
        let store = Store::open_in_memory().unwrap();
        User::register(&store, "alice", "alice@example.com", "pw").unwrap();
        assert!(matches!(
            User::register(&store, "alice", "other@example.com", "pw"),
            Err(ShopError::UsernameTaken(_))
        ));
        assert!(matches!(
            User::register(&store, "alice2", "alice@example.com", "pw"),
            Err(ShopError::EmailTaken(_))
        ));
    }

    #[test]
    fn missing_and_invalid_fields() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(
            User::register(&store, "", "a@b.co", "pw"),
            Err(ShopError::MissingFields)
        ));
        assert!(matches!(
            User::register(&store, "alice", "a@b.co", ""),
            Err(ShopError::MissingFields)
        ));
        assert!(matches!(
            User::register(&store, "al", "a@b.co", "pw"),
            Err(ShopError::InvalidInput { field: "username", .. })
        ));
        assert!(matches!(
            User::register(&store, "alice", "not-an-email", "pw"),
            Err(ShopError::InvalidInput { field: "email", .. })
        ));
    }

    #[test]
    fn ensure_admin_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        let created = User::ensure_admin(&store, "admin", "admin@shop.com", "admin123").unwrap();
        assert!(created.unwrap().is_admin);
        assert!(User::ensure_admin(&store, "admin", "admin@shop.com", "admin123")
            .unwrap()
            .is_none());
    }

    #[test]
    fn set_admin_promotes_and_demotes() {
        let store = Store::open_in_memory().unwrap();
        User::register(&store, "carol", "carol@example.com", "pw").unwrap();
        assert!(User::set_admin(&store, "carol", true).unwrap().is_admin);
        assert!(!User::set_admin(&store, "carol", false).unwrap().is_admin);
        assert!(matches!(
            User::set_admin(&store, "nobody", true),
            Err(ShopError::UserNotFound(_))
        ));
    }
}
