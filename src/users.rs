// 👤 Credential Store
// Users: identity, display name, email, one-way hashed secret
//
// The secret only ever lives in the `password_hash` column. `User` is the
// outward shape and has no field that could carry it.

use anyhow::{anyhow, Context, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{is_constraint_violation, new_id, parse_timestamp};

// ============================================================================
// USER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Registration payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Error, Debug)]
pub enum RegisterError {
    #[error("Please provide all required fields")]
    MissingFields,

    #[error("User already exists")]
    EmailTaken,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

// ============================================================================
// SECRETS
// ============================================================================

/// Argon2id hash with a fresh random salt (PHC string format)
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// ============================================================================
// STORE OPERATIONS
// ============================================================================

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Create a user. Email must not already be registered.
pub fn register_user(conn: &Connection, input: &RegisterInput) -> Result<User, RegisterError> {
    let (name, email, password) = match (
        non_blank(&input.name),
        non_blank(&input.email),
        input.password.as_deref().filter(|p| !p.is_empty()),
    ) {
        (Some(name), Some(email), Some(password)) => (name, email, password),
        _ => return Err(RegisterError::MissingFields),
    };

    let exists: bool = conn
        .query_row("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)", [email], |row| row.get(0))
        .context("Failed to look up email")?;
    if exists {
        return Err(RegisterError::EmailTaken);
    }

    let user = User {
        id: new_id(),
        name: name.to_string(),
        email: email.to_string(),
        created_at: Utc::now(),
    };
    let password_hash = hash_password(password)?;

    let result = conn.execute(
        "INSERT INTO users (id, name, email, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user.id, user.name, user.email, password_hash, user.created_at.to_rfc3339()],
    );

    match result {
        Ok(_) => Ok(user),
        // Lost a race with a concurrent registration of the same email
        Err(e) if is_constraint_violation(&e) => Err(RegisterError::EmailTaken),
        Err(e) => Err(RegisterError::Store(anyhow::Error::new(e).context("Failed to insert user"))),
    }
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        created_at: parse_timestamp(3, row.get(3)?)?,
    })
}

/// Look up a user by identity, secret excluded
pub fn find_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    conn.query_row(
        "SELECT id, name, email, created_at FROM users WHERE id = ?1",
        [id],
        user_from_row,
    )
    .optional()
    .context("Failed to load user")
}

/// Resolve email + password to a user. Unknown email and wrong password
/// are indistinguishable to the caller.
pub fn authenticate(conn: &Connection, email: &str, password: &str) -> Result<Option<User>> {
    let row = conn
        .query_row(
            "SELECT id, name, email, created_at, password_hash FROM users WHERE email = ?1",
            [email.trim()],
            |row| Ok((user_from_row(row)?, row.get::<_, String>(4)?)),
        )
        .optional()
        .context("Failed to load credentials")?;

    Ok(match row {
        Some((user, hash)) if verify_password(password, &hash) => Some(user),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn input(name: &str, email: &str, password: &str) -> RegisterInput {
        RegisterInput {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[test]
    fn test_register_and_find() {
        let conn = test_conn();

        let user = register_user(&conn, &input("Asha", "asha@example.com", "hunter22")).unwrap();
        let found = find_user_by_id(&conn, &user.id).unwrap().unwrap();

        assert_eq!(found.id, user.id);
        assert_eq!(found.name, "Asha");
        assert_eq!(found.email, "asha@example.com");
        assert!(find_user_by_id(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let conn = test_conn();
        register_user(&conn, &input("Asha", "asha@example.com", "pw1")).unwrap();

        let err = register_user(&conn, &input("Other", "asha@example.com", "pw2")).unwrap_err();
        assert!(matches!(err, RegisterError::EmailTaken));

        // Case-sensitive as stored
        assert!(register_user(&conn, &input("Other", "Asha@example.com", "pw2")).is_ok());
    }

    #[test]
    fn test_missing_fields_rejected() {
        let conn = test_conn();

        let err = register_user(&conn, &input("", "a@example.com", "pw")).unwrap_err();
        assert!(matches!(err, RegisterError::MissingFields));

        let err = register_user(
            &conn,
            &RegisterInput {
                name: Some("A".into()),
                email: Some("a@example.com".into()),
                password: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, RegisterError::MissingFields));
    }

    #[test]
    fn test_authenticate() {
        let conn = test_conn();
        let user = register_user(&conn, &input("Asha", "asha@example.com", "hunter22")).unwrap();

        let ok = authenticate(&conn, "asha@example.com", "hunter22").unwrap();
        assert_eq!(ok.map(|u| u.id), Some(user.id));

        assert!(authenticate(&conn, "asha@example.com", "wrong").unwrap().is_none());
        assert!(authenticate(&conn, "nobody@example.com", "hunter22").unwrap().is_none());
    }

    #[test]
    fn test_secret_is_hashed_and_never_serialized() {
        let conn = test_conn();
        let user = register_user(&conn, &input("Asha", "asha@example.com", "hunter22")).unwrap();

        let stored: String = conn
            .query_row("SELECT password_hash FROM users WHERE id = ?1", [&user.id], |row| row.get(0))
            .unwrap();
        assert_ne!(stored, "hunter22");
        assert!(stored.starts_with("$argon2"));

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["_id"], user.id.as_str());
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
