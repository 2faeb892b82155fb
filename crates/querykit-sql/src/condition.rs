//! Boolean condition values for WHERE and HAVING clauses

use crate::formatter::lowercase;
use crate::joiner::strip_leading_connector;

/// A boolean SQL fragment
///
/// Conditions are built bottom-up and rendered by joining children with
/// `and` / `or`. No parentheses are added: raw fragments that need grouping
/// carry their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Caller-written SQL, optionally starting with `WHERE` or `AND`
    Raw(String),

    /// All children must hold
    And(Vec<Condition>),

    /// At least one child must hold
    Or(Vec<Condition>),
}

impl Condition {
    /// Wrap caller-written SQL
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    /// Conjunction of `conditions`
    pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::And(conditions.into_iter().collect())
    }

    /// Disjunction of `conditions`
    pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::Or(conditions.into_iter().collect())
    }

    /// Whether this renders to nothing
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Raw(sql) => strip_leading_connector(sql).is_empty(),
            Self::And(children) | Self::Or(children) => children.iter().all(Condition::is_empty),
        }
    }

    /// Render as SQL with lowercase keywords
    pub fn to_sql(&self) -> String {
        match self {
            Self::Raw(sql) => lowercase(strip_leading_connector(sql)),
            Self::And(children) => Self::join(children, " and "),
            Self::Or(children) => Self::join(children, " or "),
        }
    }

    fn join(children: &[Condition], separator: &str) -> String {
        children
            .iter()
            .filter(|child| !child.is_empty())
            .map(Condition::to_sql)
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn raw_strips_where_prefix() {
        assert_eq!(Condition::raw("WHERE active = true").to_sql(), "active = true");
        assert_eq!(Condition::raw("AND status = 'ACTIVE'").to_sql(), "status = 'ACTIVE'");
    }

    #[test]
    fn raw_lowercases_keywords_only() {
        assert_eq!(
            Condition::raw("WHERE ps IN ('12345', '67890') AND name LIKE '%John%' OR email IS NULL").to_sql(),
            "ps IN ('12345', '67890') and name LIKE '%John%' or email IS NULL"
        );
    }

    #[test]
    fn and_joins_children() {
        let condition = Condition::and([Condition::raw("active = true"), Condition::raw("age >= 18")]);
        assert_eq!(condition.to_sql(), "active = true and age >= 18");
    }

    #[test]
    fn or_nests_without_parentheses() {
        let condition = Condition::or([
            Condition::raw("(a = 1 AND b = 2)"),
            Condition::and([Condition::raw("c = 3"), Condition::raw("d = 4")]),
        ]);
        assert_eq!(condition.to_string(), "(a = 1 and b = 2) or c = 3 and d = 4");
    }

    #[test]
    fn empty_children_are_skipped() {
        let condition = Condition::and([Condition::raw(""), Condition::raw("x = 1"), Condition::raw("WHERE ")]);
        assert_eq!(condition.to_sql(), "x = 1");
        assert!(Condition::or(Vec::new()).is_empty());
        assert!(!condition.is_empty());
    }
}
