// Signet — Query-by-example predicates
//
// An `Example` is a partially-populated template: every field added to it
// becomes an exact-equality predicate. There is no wildcard, substring, or
// case-folded matching — certificate resolution depends on byte-exact
// comparison of canonical text.

use rusqlite::types::Value;
use rusqlite::Row;

/// A record type that can be stored and matched by example.
pub trait Entity: Sized {
    /// Table backing this entity.
    const TABLE: &'static str;
    /// Primary key column, used as the join target for related collections.
    const KEY: &'static str;
    /// Column list, in the order `from_row` and `insert_values` use.
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Values for an INSERT, one per entry in `COLUMNS`.
    fn insert_values(&self) -> Vec<Value>;
}

/// Conversion into a SQLite value for predicate and insert positions.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Integer(self as i64)
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Integer(self)
    }
}

impl IntoValue for Option<String> {
    fn into_value(self) -> Value {
        match self {
            Some(s) => Value::Text(s),
            None => Value::Null,
        }
    }
}

/// Exact-match predicate template over one table.
#[derive(Debug, Clone, Default)]
pub struct Example {
    predicates: Vec<(&'static str, Value)>,
}

impl Example {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality predicate on `column`.
    pub fn eq(mut self, column: &'static str, value: impl IntoValue) -> Self {
        self.predicates.push((column, value.into_value()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Compile to a WHERE fragment and its parameter values.
    ///
    /// `alias` qualifies column names for join queries; `start` is the first
    /// placeholder index, so two examples can share one statement.
    pub fn where_clause(&self, alias: Option<&str>, start: usize) -> (String, Vec<Value>) {
        if self.predicates.is_empty() {
            return ("1 = 1".to_string(), Vec::new());
        }
        let mut parts = Vec::with_capacity(self.predicates.len());
        let mut values = Vec::with_capacity(self.predicates.len());
        for (i, (column, value)) in self.predicates.iter().enumerate() {
            let qualified = match alias {
                Some(a) => format!("{a}.{column}"),
                None => (*column).to_string(),
            };
            parts.push(format!("{qualified} = ?{}", start + i));
            values.push(value.clone());
        }
        (parts.join(" AND "), values)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_example_matches_everything() {
        let (clause, values) = Example::new().where_clause(None, 1);
        assert_eq!(clause, "1 = 1");
        assert!(values.is_empty());
    }

    #[test]
    fn test_populated_fields_become_equality_predicates() {
        let example = Example::new().eq("name", "alice").eq("is_enabled", true);
        let (clause, values) = example.where_clause(None, 1);
        assert_eq!(clause, "name = ?1 AND is_enabled = ?2");
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], Value::Text("alice".to_string()));
        assert_eq!(values[1], Value::Integer(1));
    }

    #[test]
    fn test_alias_and_placeholder_offset() {
        let example = Example::new().eq("certificate", "abc");
        let (clause, values) = example.where_clause(Some("h"), 3);
        assert_eq!(clause, "h.certificate = ?3");
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_exact_match_only_no_pattern_expansion() {
        // A value containing SQL LIKE metacharacters must stay a literal.
        let example = Example::new().eq("name", "a%b_c");
        let (clause, values) = example.where_clause(None, 1);
        assert!(!clause.contains("LIKE"), "example matching must never use LIKE");
        assert_eq!(values[0], Value::Text("a%b_c".to_string()));
    }
}
