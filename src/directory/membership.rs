// Signet — Group Membership Resolver
//
// Computes the set of groups a user belongs to. The caller-supplied record
// may be stale, so the user is re-resolved by name inside the same scope the
// group scan runs in; every "belongs" check then sees one consistent view.
// Membership is advisory: any store fault degrades to an empty result.

use crate::store::Example;

use super::models::{Group, GroupMember, User};
use super::repository::DatabaseDirectory;

impl DatabaseDirectory<'_> {
    pub(super) fn groups_for(&self, user: &User) -> Vec<Group> {
        let result = self.db.with_scope(|tx| {
            let member = tx.query_unique::<User>(&Example::new().eq("name", user.name.as_str()))?;
            let mut groups = Vec::new();
            for group in tx.query_all::<Group>(&Example::new())? {
                let roster = tx.query_all::<GroupMember>(
                    &Example::new()
                        .eq("group_name", group.name.as_str())
                        .eq("user_name", member.name.as_str()),
                )?;
                if !roster.is_empty() {
                    groups.push(group);
                }
            }
            Ok(groups)
        });

        match result {
            Ok(groups) => groups,
            Err(e) => {
                tracing::debug!(user = %user.name, error = %e, "membership lookup degraded to empty");
                Vec::new()
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
