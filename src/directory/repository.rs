// Signet — Principal Repository
//
// CRUD over user and group principals. Every entity-modifying operation runs
// inside a single transaction scope that commits or rolls back before the
// call returns; the schema's UNIQUE constraints arbitrate concurrent create
// races. Listing operations trade strictness for availability: a store fault
// degrades to an empty result instead of an error.

use rusqlite::params;

use crate::credentials::{Certificate, CredentialGenerator, HmacCredentialGenerator};
use crate::error::{DirectoryError, Result};
use crate::store::{Database, Example, StoreError};

use super::models::{Confirmation, Group, GroupMember, User};

// ─── Capability traits ───────────────────────────────────────────────────────

/// User half of the directory capability surface.
pub trait UserDirectory {
    /// Create a user with freshly generated credentials.
    fn add_user(&self, name: &str, is_admin: bool, is_enabled: bool) -> Result<User>;

    /// Delete a user, returning the deleted record.
    fn delete_user(&self, name: &str) -> Result<User>;

    /// Unique lookup by name.
    fn lookup_user(&self, name: &str) -> Result<User>;

    /// Unique lookup by query identifier.
    fn lookup_query_id(&self, query_id: &str) -> Result<User>;

    /// All users. Despite the name, only enabled users are listed; this
    /// mirrors the established behavior callers depend on.
    fn list_all_users(&self) -> Vec<User>;

    /// Users with `is_enabled` set.
    fn list_enabled_users(&self) -> Vec<User>;

    /// Resolve a certificate to the single enabled user that currently owns
    /// it and carries it in their historical set.
    fn lookup_by_certificate(&self, cert: &Certificate) -> Result<User>;

    /// Whether the certificate sits in exactly one enabled user's historical
    /// set. Zero or multiple owners is a classified failure, not `false`.
    fn is_certificate_revoked(&self, cert: &Certificate) -> Result<bool>;

    /// Set the user's current certificate and append it to the historical set.
    fn assign_certificate(&self, name: &str, cert: &Certificate) -> Result<User>;

    /// Move the current certificate out of "current". The historical record
    /// remains for revocation lookups.
    fn revoke_certificate(&self, name: &str) -> Result<User>;

    /// Enable or disable the user.
    fn set_enabled(&self, name: &str, enabled: bool) -> Result<User>;
}

/// Group half of the directory capability surface.
pub trait GroupDirectory {
    fn add_group(&self, name: &str) -> Result<Group>;

    fn delete_group(&self, name: &str) -> Result<()>;

    fn lookup_group(&self, name: &str) -> Result<Group>;

    /// All groups, best-effort.
    fn list_all_groups(&self) -> Vec<Group>;

    /// Groups whose membership predicate holds for the user. Advisory: store
    /// faults degrade to an empty result.
    fn lookup_user_groups(&self, user: &User) -> Vec<Group>;

    fn add_group_member(&self, group: &str, user: &str) -> Result<()>;

    fn remove_group_member(&self, group: &str, user: &str) -> Result<()>;
}

// ─── Database-backed implementation ──────────────────────────────────────────

/// One concrete implementation satisfies both capability traits.
pub struct DatabaseDirectory<'a> {
    pub(super) db: &'a Database,
    credentials: Box<dyn CredentialGenerator>,
}

impl<'a> DatabaseDirectory<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            credentials: Box::new(HmacCredentialGenerator::new()),
        }
    }

    /// Construct with a custom credential generator (useful for tests).
    pub fn with_generator(db: &'a Database, credentials: Box<dyn CredentialGenerator>) -> Self {
        Self { db, credentials }
    }

    /// The best-effort confirmation record for a user, if the second-phase
    /// write succeeded.
    pub fn confirmation(&self, name: &str) -> Result<Confirmation> {
        self.db
            .with_scope(|tx| tx.query_unique::<Confirmation>(&Example::new().eq("user_name", name)))
            .map_err(|cause| {
                tracing::debug!(user = name, error = %cause, "confirmation lookup failed");
                DirectoryError::NotFound(name.to_string())
            })
    }
}

impl UserDirectory for DatabaseDirectory<'_> {
    fn add_user(&self, name: &str, is_admin: bool, is_enabled: bool) -> Result<User> {
        let user = User::new(
            name.to_string(),
            self.credentials.query_id(name)?,
            self.credentials.secret_key(name)?,
            self.credentials.hashed_password(name)?,
            self.credentials.session_token(name)?,
            is_admin,
            is_enabled,
        );

        if let Err(cause) = self.db.with_scope(|tx| tx.insert(&user)) {
            tracing::debug!(user = name, error = %cause, "user create failed");
            return Err(DirectoryError::Conflict(name.to_string()));
        }

        // Second, independent transaction: the confirmation record is
        // best-effort and must never unwind the committed user.
        match self.credentials.session_token(name) {
            Ok(code) => {
                let confirmation = Confirmation::new(name, code);
                if let Err(e) = self.db.with_scope(|tx| tx.insert(&confirmation)) {
                    tracing::warn!(user = name, error = %e, "confirmation record not created");
                }
            }
            Err(e) => {
                tracing::warn!(user = name, error = %e, "confirmation code not generated");
            }
        }

        tracing::info!(user = name, admin = is_admin, enabled = is_enabled, "user created");
        Ok(user)
    }

    fn delete_user(&self, name: &str) -> Result<User> {
        // Best-effort cleanup of the confirmation record; its absence must
        // never block user deletion.
        let cleanup = self.db.with_scope(|tx| {
            tx.delete_unique::<Confirmation>(&Example::new().eq("user_name", name))
                .map(|_| ())
        });
        if let Err(e) = cleanup {
            tracing::debug!(user = name, error = %e, "confirmation record cleanup skipped");
        }

        match self
            .db
            .with_scope(|tx| tx.delete_unique::<User>(&Example::new().eq("name", name)))
        {
            Ok(user) => {
                tracing::info!(user = name, "user deleted");
                Ok(user)
            }
            Err(cause) => {
                tracing::debug!(user = name, error = %cause, "user delete failed");
                Err(DirectoryError::NotFound(name.to_string()))
            }
        }
    }

    fn lookup_user(&self, name: &str) -> Result<User> {
        self.db
            .with_scope(|tx| tx.query_unique::<User>(&Example::new().eq("name", name)))
            .map_err(|cause| {
                tracing::debug!(user = name, error = %cause, "user lookup failed");
                DirectoryError::NotFound(name.to_string())
            })
    }

    fn lookup_query_id(&self, query_id: &str) -> Result<User> {
        self.db
            .with_scope(|tx| tx.query_unique::<User>(&Example::new().eq("query_id", query_id)))
            .map_err(|cause| {
                tracing::debug!(query_id, error = %cause, "query id lookup failed");
                DirectoryError::NotFound(query_id.to_string())
            })
    }

    fn list_all_users(&self) -> Vec<User> {
        self.list_enabled_users()
    }

    fn list_enabled_users(&self) -> Vec<User> {
        self.db
            .with_scope(|tx| tx.query_all::<User>(&Example::new().eq("is_enabled", true)))
            .unwrap_or_else(|e| {
                tracing::debug!(error = %e, "user listing degraded to empty");
                Vec::new()
            })
    }

    fn lookup_by_certificate(&self, cert: &Certificate) -> Result<User> {
        self.resolve_certificate(cert)
    }

    fn is_certificate_revoked(&self, cert: &Certificate) -> Result<bool> {
        self.check_revoked(cert)
    }

    fn assign_certificate(&self, name: &str, cert: &Certificate) -> Result<User> {
        self.attach_certificate(name, cert)
    }

    fn revoke_certificate(&self, name: &str) -> Result<User> {
        self.retire_certificate(name)
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> Result<User> {
        self.db
            .with_scope(|tx| {
                let mut user = tx.query_unique::<User>(&Example::new().eq("name", name))?;
                tx.execute(
                    "UPDATE users SET is_enabled = ?1 WHERE name = ?2",
                    params![enabled, name],
                )?;
                user.is_enabled = enabled;
                Ok(user)
            })
            .map_err(|cause| classify_missing(name, cause))
    }
}

impl GroupDirectory for DatabaseDirectory<'_> {
    fn add_group(&self, name: &str) -> Result<Group> {
        let group = Group::new(name.to_string());
        if let Err(cause) = self.db.with_scope(|tx| tx.insert(&group)) {
            tracing::debug!(group = name, error = %cause, "group create failed");
            return Err(DirectoryError::Conflict(name.to_string()));
        }
        tracing::info!(group = name, "group created");
        Ok(group)
    }

    fn delete_group(&self, name: &str) -> Result<()> {
        match self
            .db
            .with_scope(|tx| tx.delete_unique::<Group>(&Example::new().eq("name", name)))
        {
            Ok(_) => {
                tracing::info!(group = name, "group deleted");
                Ok(())
            }
            Err(cause) => {
                tracing::debug!(group = name, error = %cause, "group delete failed");
                Err(DirectoryError::NotFound(name.to_string()))
            }
        }
    }

    fn lookup_group(&self, name: &str) -> Result<Group> {
        self.db
            .with_scope(|tx| tx.query_unique::<Group>(&Example::new().eq("name", name)))
            .map_err(|cause| {
                tracing::debug!(group = name, error = %cause, "group lookup failed");
                DirectoryError::NotFound(name.to_string())
            })
    }

    fn list_all_groups(&self) -> Vec<Group> {
        self.db
            .with_scope(|tx| tx.query_all::<Group>(&Example::new()))
            .unwrap_or_else(|e| {
                tracing::debug!(error = %e, "group listing degraded to empty");
                Vec::new()
            })
    }

    fn lookup_user_groups(&self, user: &User) -> Vec<Group> {
        self.groups_for(user)
    }

    fn add_group_member(&self, group: &str, user: &str) -> Result<()> {
        let result = self.db.with_scope(|tx| {
            // Both principals must exist before the roster row goes in.
            tx.query_unique::<Group>(&Example::new().eq("name", group))?;
            tx.query_unique::<User>(&Example::new().eq("name", user))?;
            tx.insert(&GroupMember {
                group_name: group.to_string(),
                user_name: user.to_string(),
            })
        });
        match result {
            Ok(()) => Ok(()),
            Err(cause @ StoreError::NotUnique { count: 0, .. }) => {
                tracing::debug!(group, user, error = %cause, "roster add failed");
                Err(DirectoryError::NotFound(format!("{group} or {user}")))
            }
            Err(cause) if cause.is_constraint_violation() => {
                tracing::debug!(group, user, error = %cause, "roster add failed");
                Err(DirectoryError::Conflict(format!("{user} in {group}")))
            }
            Err(cause) => {
                tracing::debug!(group, user, error = %cause, "roster add failed");
                Err(DirectoryError::Store(cause))
            }
        }
    }

    fn remove_group_member(&self, group: &str, user: &str) -> Result<()> {
        self.db
            .with_scope(|tx| {
                tx.delete_unique::<GroupMember>(
                    &Example::new().eq("group_name", group).eq("user_name", user),
                )
                .map(|_| ())
            })
            .map_err(|cause| {
                tracing::debug!(group, user, error = %cause, "roster remove failed");
                DirectoryError::NotFound(format!("{user} in {group}"))
            })
    }
}

/// Map a unique-lookup failure to NotFound when zero rows matched, and keep
/// the store fault otherwise.
pub(super) fn classify_missing(name: &str, cause: StoreError) -> DirectoryError {
    match cause.match_count() {
        Some(0) => DirectoryError::NotFound(name.to_string()),
        _ => {
            tracing::debug!(principal = name, error = %cause, "store failure");
            DirectoryError::Store(cause)
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
