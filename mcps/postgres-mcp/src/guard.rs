//! Query guard - read-only check for client-supplied SQL
//!
//! The check is a case-insensitive substring scan against a fixed denylist of
//! mutating and privilege-altering keywords. It does not parse SQL: an
//! identifier such as `update_time` is rejected, and a mutation spelled in a
//! way the scan cannot see is not. Statements are also executed through the
//! extended query protocol, which refuses multiple statements in one string.

use std::fmt;

/// Keywords whose presence anywhere in the text rejects a query
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "CREATE", "DROP", "ALTER", "TRUNCATE", "GRANT", "REVOKE",
    "COPY", "MERGE",
];

/// Outcome of checking one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(Rejection),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

/// Why a query was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Empty or whitespace-only text
    Empty,
    /// Matched keywords, in denylist order
    ForbiddenKeywords(Vec<&'static str>),
}

impl Rejection {
    /// Matched keywords; empty for [`Rejection::Empty`]
    pub fn keywords(&self) -> &[&'static str] {
        match self {
            Rejection::Empty => &[],
            Rejection::ForbiddenKeywords(found) => found,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Empty => write!(f, "Query is empty"),
            Rejection::ForbiddenKeywords(found) => write!(
                f,
                "Only read-only queries are allowed; found forbidden keyword(s): {}",
                found.join(", ")
            ),
        }
    }
}

/// Decide whether `sql` may be executed
pub fn validate(sql: &str) -> Verdict {
    if sql.trim().is_empty() {
        tracing::warn!("Rejected empty query");
        return Verdict::Reject(Rejection::Empty);
    }

    let upper = sql.to_uppercase();
    let found: Vec<&'static str> = FORBIDDEN_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| upper.contains(keyword))
        .collect();

    if found.is_empty() {
        Verdict::Accept
    } else {
        tracing::warn!(keywords = ?found, "Rejected query containing forbidden keywords");
        Verdict::Reject(Rejection::ForbiddenKeywords(found))
    }
}
