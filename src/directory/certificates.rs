// Signet — Certificate Matcher
//
// Resolves an X.509 certificate to the single user that owns it, across the
// "current" field and the historical set. Matching is string equality over
// the canonical transcoded form. Zero matches and multiple matches are both
// fatal, but classified differently so callers can react to ambiguity.

use rusqlite::params;

use crate::credentials::Certificate;
use crate::error::{DirectoryError, Result};
use crate::store::{Example, Related};

use super::models::{HistoricalCertificate, User};
use super::repository::{classify_missing, DatabaseDirectory};

/// Historical certificate rows, related to `users` by owner name.
const HISTORICAL: Related = Related {
    table: "historical_certificates",
    parent_key: "user_name",
};

impl DatabaseDirectory<'_> {
    /// Exactly-one resolution across current and historical certificate sets.
    ///
    /// A match requires the user's current certificate to equal the canonical
    /// form AND the historical set to contain it; assignment writes both, so
    /// an active certificate always satisfies the pair.
    pub(super) fn resolve_certificate(&self, cert: &Certificate) -> Result<User> {
        let canonical = cert.canonical_text();
        let session = self.db.read_session();
        let mut matches: Vec<User> = session.query_with_related(
            &Example::new()
                .eq("certificate", canonical.as_str())
                .eq("is_enabled", true),
            HISTORICAL,
            &Example::new().eq("certificate", canonical.as_str()),
        )?;

        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(DirectoryError::NotFound(
                "no user with the specified certificate".to_string(),
            )),
            count => {
                tracing::warn!(subject = cert.subject(), count, "ambiguous certificate match");
                Err(DirectoryError::Ambiguous {
                    count,
                    subject: cert.subject().to_string(),
                })
            }
        }
    }

    /// True when exactly one enabled user's historical set contains the
    /// certificate. The current-certificate field is left unconstrained, so a
    /// rotated-out certificate still resolves here.
    pub(super) fn check_revoked(&self, cert: &Certificate) -> Result<bool> {
        let canonical = cert.canonical_text();
        let session = self.db.read_session();
        let matches: Vec<User> = session.query_with_related(
            &Example::new().eq("is_enabled", true),
            HISTORICAL,
            &Example::new().eq("certificate", canonical.as_str()),
        )?;

        match matches.len() {
            1 => Ok(true),
            0 => Err(DirectoryError::NotFound(format!(
                "failed to identify user (found 0) from certificate: {}",
                cert.subject()
            ))),
            count => {
                tracing::warn!(subject = cert.subject(), count, "ambiguous revocation check");
                Err(DirectoryError::Ambiguous {
                    count,
                    subject: cert.subject().to_string(),
                })
            }
        }
    }

    /// Set the current certificate and append it to the append-only
    /// historical set, in one scope.
    pub(super) fn attach_certificate(&self, name: &str, cert: &Certificate) -> Result<User> {
        let canonical = cert.canonical_text();
        let result = self.db.with_scope(|tx| {
            let mut user = tx.query_unique::<User>(&Example::new().eq("name", name))?;
            tx.execute(
                "UPDATE users SET certificate = ?1 WHERE name = ?2",
                params![canonical, name],
            )?;
            // Re-assigning a certificate the set already holds is a no-op
            // for the historical relation.
            let already_recorded = Example::new()
                .eq("user_name", name)
                .eq("certificate", canonical.as_str());
            if tx.query_all::<HistoricalCertificate>(&already_recorded)?.is_empty() {
                tx.insert(&HistoricalCertificate::new(name, &canonical))?;
            }
            user.certificate = Some(canonical.clone());
            Ok(user)
        });
        match result {
            Ok(user) => {
                tracing::info!(user = name, subject = cert.subject(), "certificate assigned");
                Ok(user)
            }
            Err(cause) => Err(classify_missing(name, cause)),
        }
    }

    /// Clear the current certificate; the historical row stays behind for
    /// revocation lookups.
    pub(super) fn retire_certificate(&self, name: &str) -> Result<User> {
        let updated: Option<User> = self
            .db
            .with_scope(|tx| {
                let mut user = tx.query_unique::<User>(&Example::new().eq("name", name))?;
                if user.certificate.is_none() {
                    return Ok(None);
                }
                tx.execute("UPDATE users SET certificate = NULL WHERE name = ?1", [name])?;
                user.certificate = None;
                Ok(Some(user))
            })
            .map_err(|cause| classify_missing(name, cause))?;

        match updated {
            Some(user) => {
                tracing::info!(user = name, "certificate revoked");
                Ok(user)
            }
            None => Err(DirectoryError::NotFound(format!(
                "no current certificate for {name}"
            ))),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::super::repository::UserDirectory;
    use super::*;
    use crate::store::Database;

    fn pem(tag: u8) -> Certificate {
        // Distinct single-byte DER bodies give distinct canonical forms.
        Certificate::from_der(&format!("CN=subject-{tag}"), &[0x30, tag])
    }

    fn directory_with_user<'a>(db: &'a Database, name: &str) -> DatabaseDirectory<'a> {
        let dir = DatabaseDirectory::new(db);
        dir.add_user(name, false, true).unwrap();
        dir
    }

    #[test]
    fn test_lookup_by_certificate_finds_single_owner() {
        let db = Database::open_in_memory().unwrap();
        let dir = directory_with_user(&db, "alice");
        dir.add_user("bob", false, true).unwrap();

        let cert = pem(1);
        dir.assign_certificate("alice", &cert).unwrap();
        dir.assign_certificate("bob", &pem(2)).unwrap();

        let owner = dir.lookup_by_certificate(&cert).unwrap();
        assert_eq!(owner.name, "alice");
        assert_eq!(owner.certificate, Some(cert.canonical_text()));
    }

    #[test]
    fn test_lookup_by_certificate_zero_matches_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let dir = directory_with_user(&db, "alice");

        let err = dir.lookup_by_certificate(&pem(9)).unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound(_)));
    }

    #[test]
    fn test_lookup_by_certificate_two_owners_is_ambiguous() {
        let db = Database::open_in_memory().unwrap();
        let dir = directory_with_user(&db, "alice");
        dir.add_user("bob", false, true).unwrap();

        let cert = pem(1);
        dir.assign_certificate("alice", &cert).unwrap();
        dir.assign_certificate("bob", &cert).unwrap();

        let err = dir.lookup_by_certificate(&cert).unwrap_err();
        match err {
            DirectoryError::Ambiguous { count, subject } => {
                assert_eq!(count, 2);
                assert_eq!(subject, "CN=subject-1");
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn test_disabled_user_excluded_from_resolution() {
        let db = Database::open_in_memory().unwrap();
        let dir = directory_with_user(&db, "alice");

        let cert = pem(1);
        dir.assign_certificate("alice", &cert).unwrap();
        dir.set_enabled("alice", false).unwrap();

        let err = dir.lookup_by_certificate(&cert).unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound(_)));
    }

    #[test]
    fn test_revoked_certificate_no_longer_resolves_but_reports_revoked() {
        let db = Database::open_in_memory().unwrap();
        let dir = directory_with_user(&db, "alice");

        let cert = pem(1);
        dir.assign_certificate("alice", &cert).unwrap();
        assert!(dir.lookup_by_certificate(&cert).is_ok());

        let retired = dir.revoke_certificate("alice").unwrap();
        assert!(retired.certificate.is_none());

        let err = dir.lookup_by_certificate(&cert).unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound(_)));

        assert!(dir.is_certificate_revoked(&cert).unwrap());
    }

    #[test]
    fn test_is_certificate_revoked_counts_matches() {
        let db = Database::open_in_memory().unwrap();
        let dir = directory_with_user(&db, "alice");
        dir.add_user("bob", false, true).unwrap();

        // Zero matches: classified NotFound carrying the subject.
        let stranger = pem(7);
        let err = dir.is_certificate_revoked(&stranger).unwrap_err();
        match err {
            DirectoryError::NotFound(msg) => assert!(msg.contains("CN=subject-7")),
            other => panic!("expected NotFound, got {other:?}"),
        }

        // Two users sharing a historical certificate: ambiguous.
        let shared = pem(1);
        dir.assign_certificate("alice", &shared).unwrap();
        dir.assign_certificate("bob", &shared).unwrap();
        let err = dir.is_certificate_revoked(&shared).unwrap_err();
        assert!(matches!(err, DirectoryError::Ambiguous { count: 2, .. }));
    }

    #[test]
    fn test_rotation_keeps_historical_set_append_only() {
        let db = Database::open_in_memory().unwrap();
        let dir = directory_with_user(&db, "alice");

        let first = pem(1);
        let second = pem(2);
        dir.assign_certificate("alice", &first).unwrap();
        dir.assign_certificate("alice", &second).unwrap();

        // Current certificate is the newest; the rotated-out one is still
        // attributable through the historical set.
        let owner = dir.lookup_by_certificate(&second).unwrap();
        assert_eq!(owner.certificate, Some(second.canonical_text()));
        assert!(dir.is_certificate_revoked(&first).unwrap());

        let rows: i64 = db
            .conn()
            .query_row(
                "SELECT count(*) FROM historical_certificates WHERE user_name = 'alice'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(rows, 2);
    }

    #[test]
    fn test_assign_certificate_to_missing_user_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let dir = DatabaseDirectory::new(&db);
        let err = dir.assign_certificate("nobody", &pem(1)).unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound(_)));
    }

    #[test]
    fn test_revoke_without_current_certificate_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let dir = directory_with_user(&db, "alice");
        let err = dir.revoke_certificate("alice").unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound(_)));
    }

    #[test]
    fn test_matching_is_exact_not_prefix() {
        let db = Database::open_in_memory().unwrap();
        let dir = directory_with_user(&db, "alice");

        dir.assign_certificate("alice", &Certificate::from_der("CN=alice", &[0x30, 0x01, 0x02]))
            .unwrap();

        // A prefix of the stored DER produces different canonical text and
        // must not match.
        let prefix = Certificate::from_der("CN=alice", &[0x30, 0x01]);
        let err = dir.lookup_by_certificate(&prefix).unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound(_)));
    }
}
