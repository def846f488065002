// Signet — Principal data models
//
// SECURITY: secret key, password hash, and session token are private fields.
// They never appear in Debug output, log messages, or serialized output;
// access goes through explicit getters.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::{Entity, IntoValue};

/// Lenient RFC 3339 parse for timestamp columns.
fn parse_timestamp(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A user principal. Secret fields are private — access only via getters.
#[derive(Clone, Serialize)]
pub struct User {
    pub name: String,
    /// Public query identifier, unique across the directory.
    pub query_id: String,
    /// Secret signing key paired with the query id — never logged or serialized.
    #[serde(skip)]
    secret_key: String,
    /// Argon2id password hash — never logged or serialized.
    #[serde(skip)]
    password: String,
    /// Session token — never logged or serialized.
    #[serde(skip)]
    token: String,
    pub is_administrator: bool,
    pub is_enabled: bool,
    /// Canonical text of the current certificate, if one is assigned.
    pub certificate: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: String,
        query_id: String,
        secret_key: String,
        password: String,
        token: String,
        is_administrator: bool,
        is_enabled: bool,
    ) -> Self {
        Self {
            name,
            query_id,
            secret_key,
            password,
            token,
            is_administrator,
            is_enabled,
            certificate: None,
            created_at: Utc::now(),
        }
    }

    /// The secret key. Callers must keep this out of logs and responses.
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// The Argon2id password hash.
    pub fn hashed_password(&self) -> &str {
        &self.password
    }

    /// The session token.
    pub fn session_token(&self) -> &str {
        &self.token
    }
}

/// Custom Debug implementation that never reveals secret material.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("name", &self.name)
            .field("query_id", &self.query_id)
            .field("secret_key", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .field("token", &"[REDACTED]")
            .field("is_administrator", &self.is_administrator)
            .field("is_enabled", &self.is_enabled)
            .field("certificate", &self.certificate)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (query_id={}, enabled={}, admin={})",
            self.name, self.query_id, self.is_enabled, self.is_administrator
        )
    }
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const KEY: &'static str = "name";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "query_id",
        "secret_key",
        "password",
        "token",
        "is_administrator",
        "is_enabled",
        "certificate",
        "created_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let created_at: String = row.get(8)?;
        Ok(Self {
            name: row.get(0)?,
            query_id: row.get(1)?,
            secret_key: row.get(2)?,
            password: row.get(3)?,
            token: row.get(4)?,
            is_administrator: row.get(5)?,
            is_enabled: row.get(6)?,
            certificate: row.get(7)?,
            created_at: parse_timestamp(&created_at),
        })
    }

    fn insert_values(&self) -> Vec<Value> {
        vec![
            self.name.clone().into_value(),
            self.query_id.clone().into_value(),
            self.secret_key.clone().into_value(),
            self.password.clone().into_value(),
            self.token.clone().into_value(),
            self.is_administrator.into_value(),
            self.is_enabled.into_value(),
            self.certificate.clone().into_value(),
            self.created_at.to_rfc3339().into_value(),
        ]
    }
}

// ─── Group ───────────────────────────────────────────────────────────────────

/// A group principal. Membership lives in the `group_members` roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn new(name: String) -> Self {
        Self {
            name,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group {}", self.name)
    }
}

impl Entity for Group {
    const TABLE: &'static str = "groups";
    const KEY: &'static str = "name";
    const COLUMNS: &'static [&'static str] = &["name", "created_at"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let created_at: String = row.get(1)?;
        Ok(Self {
            name: row.get(0)?,
            created_at: parse_timestamp(&created_at),
        })
    }

    fn insert_values(&self) -> Vec<Value> {
        vec![
            self.name.clone().into_value(),
            self.created_at.to_rfc3339().into_value(),
        ]
    }
}

// ─── Roster rows ─────────────────────────────────────────────────────────────

/// One roster entry: `user_name` belongs to `group_name`.
#[derive(Debug, Clone)]
pub struct GroupMember {
    pub group_name: String,
    pub user_name: String,
}

impl Entity for GroupMember {
    const TABLE: &'static str = "group_members";
    const KEY: &'static str = "group_name";
    const COLUMNS: &'static [&'static str] = &["group_name", "user_name"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            group_name: row.get(0)?,
            user_name: row.get(1)?,
        })
    }

    fn insert_values(&self) -> Vec<Value> {
        vec![
            self.group_name.clone().into_value(),
            self.user_name.clone().into_value(),
        ]
    }
}

// ─── Historical certificates ─────────────────────────────────────────────────

/// Append-only record of a certificate once associated with a user. Rows are
/// never deleted; rotation only clears the user's current certificate.
#[derive(Debug, Clone)]
pub struct HistoricalCertificate {
    pub user_name: String,
    pub certificate: String,
    pub recorded_at: DateTime<Utc>,
}

impl HistoricalCertificate {
    pub fn new(user_name: &str, certificate: &str) -> Self {
        Self {
            user_name: user_name.to_string(),
            certificate: certificate.to_string(),
            recorded_at: Utc::now(),
        }
    }
}

impl Entity for HistoricalCertificate {
    const TABLE: &'static str = "historical_certificates";
    const KEY: &'static str = "user_name";
    const COLUMNS: &'static [&'static str] = &["user_name", "certificate", "recorded_at"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let recorded_at: String = row.get(2)?;
        Ok(Self {
            user_name: row.get(0)?,
            certificate: row.get(1)?,
            recorded_at: parse_timestamp(&recorded_at),
        })
    }

    fn insert_values(&self) -> Vec<Value> {
        vec![
            self.user_name.clone().into_value(),
            self.certificate.clone().into_value(),
            self.recorded_at.to_rfc3339().into_value(),
        ]
    }
}

// ─── Confirmation ────────────────────────────────────────────────────────────

/// Out-of-band registration artifact, written best-effort after user create.
#[derive(Clone, Serialize)]
pub struct Confirmation {
    pub user_name: String,
    /// Registration confirmation code — never logged or serialized.
    #[serde(skip)]
    code: String,
    pub created_at: DateTime<Utc>,
}

impl Confirmation {
    pub fn new(user_name: &str, code: String) -> Self {
        Self {
            user_name: user_name.to_string(),
            code,
            created_at: Utc::now(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Debug for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Confirmation")
            .field("user_name", &self.user_name)
            .field("code", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Entity for Confirmation {
    const TABLE: &'static str = "confirmations";
    const KEY: &'static str = "user_name";
    const COLUMNS: &'static [&'static str] = &["user_name", "code", "created_at"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let created_at: String = row.get(2)?;
        Ok(Self {
            user_name: row.get(0)?,
            code: row.get(1)?,
            created_at: parse_timestamp(&created_at),
        })
    }

    fn insert_values(&self) -> Vec<Value> {
        vec![
            self.user_name.clone().into_value(),
            self.code.clone().into_value(),
            self.created_at.to_rfc3339().into_value(),
        ]
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User::new(
            "alice".to_string(),
            "QID123".to_string(),
            "sk_super_secret_value".to_string(),
            "argon2id:salt:hash_secret".to_string(),
            "tok_session_secret".to_string(),
            true,
            true,
        )
    }

    #[test]
    fn test_user_debug_redacts_secrets() {
        let debug_output = format!("{:?}", sample_user());
        assert!(debug_output.contains("[REDACTED]"));
        for secret in ["sk_super_secret_value", "hash_secret", "tok_session_secret"] {
            assert!(
                !debug_output.contains(secret),
                "Debug output must never contain secret material"
            );
        }
    }

    #[test]
    fn test_user_display_has_no_secrets() {
        let display_output = format!("{}", sample_user());
        assert!(display_output.contains("alice"));
        assert!(!display_output.contains("sk_super_secret_value"));
        assert!(!display_output.contains("tok_session_secret"));
    }

    #[test]
    fn test_user_serialization_skips_secret_fields() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(json.contains("alice"));
        assert!(json.contains("QID123"), "query id is public");
        for secret in ["secret_key", "password", "token", "sk_super_secret_value"] {
            assert!(
                !json.contains(secret),
                "serialized user must never contain secret fields"
            );
        }
    }

    #[test]
    fn test_confirmation_debug_redacts_code() {
        let confirmation = Confirmation::new("alice", "code_secret_42".to_string());
        let debug_output = format!("{:?}", confirmation);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("code_secret_42"));
        assert_eq!(confirmation.code(), "code_secret_42");
    }

    #[test]
    fn test_secret_accessors_return_raw_values() {
        let user = sample_user();
        assert_eq!(user.secret_key(), "sk_super_secret_value");
        assert_eq!(user.hashed_password(), "argon2id:salt:hash_secret");
        assert_eq!(user.session_token(), "tok_session_secret");
    }

    #[test]
    fn test_user_round_trips_through_insert_values() {
        let user = sample_user();
        let values = user.insert_values();
        assert_eq!(values.len(), User::COLUMNS.len());
    }
}
