//! Joining independent WHERE fragments
//!
//! Query builders collect filter fragments from several places, some written
//! as `where x = 1`, some as `and y = 2`, some bare. [`join_sql_conditions`]
//! turns them into one clause.

use regex::Regex;
use std::sync::LazyLock;

static LEADING_CONNECTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:where|and)\b\s*").expect("connector pattern is valid"));

/// Trim `fragment` and drop one leading `WHERE` or `AND`
pub(crate) fn strip_leading_connector(fragment: &str) -> &str {
    let trimmed = fragment.trim();
    match LEADING_CONNECTOR.find(trimmed) {
        Some(found) => trimmed[found.end()..].trim(),
        None => trimmed,
    }
}

/// Combine condition fragments into a single `where` clause.
///
/// Blank fragments are skipped. Returns an empty string when nothing is left.
///
/// ```
/// use querykit_sql::join_sql_conditions;
///
/// assert_eq!(join_sql_conditions(["WHERE a=1", "where b=2"]), "where a=1 and b=2");
/// assert_eq!(join_sql_conditions(["", "  "]), "");
/// ```
pub fn join_sql_conditions<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = fragments
        .into_iter()
        .filter_map(|fragment| {
            let cleaned = strip_leading_connector(fragment.as_ref());
            (!cleaned.is_empty()).then(|| cleaned.to_string())
        })
        .collect::<Vec<_>>()
        .join(" and ");

    if joined.is_empty() {
        joined
    } else {
        format!("where {}", joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_where_prefixes() {
        assert_eq!(join_sql_conditions(["WHERE a=1", "where b=2"]), "where a=1 and b=2");
    }

    #[test]
    fn strips_and_prefix() {
        assert_eq!(join_sql_conditions(["a = 1", "AND b = 2", "  and c = 3 "]), "where a = 1 and b = 2 and c = 3");
    }

    #[test]
    fn skips_blank_fragments() {
        assert_eq!(join_sql_conditions(["", "x > 1", "   "]), "where x > 1");
    }

    #[test]
    fn nothing_left_is_empty() {
        assert_eq!(join_sql_conditions(Vec::<String>::new()), "");
        assert_eq!(join_sql_conditions(["", " "]), "");
        assert_eq!(join_sql_conditions(["WHERE"]), "");
    }

    #[test]
    fn keeps_words_starting_with_connectors() {
        assert_eq!(join_sql_conditions(["android = 1", "whereabouts = 2"]), "where android = 1 and whereabouts = 2");
    }

    #[test]
    fn only_one_connector_is_stripped() {
        assert_eq!(strip_leading_connector("WHERE AND x"), "AND x");
    }

    #[test]
    fn optional_fragments() {
        let fragments = [Some("a = 1"), None, Some("where b = 2")];
        assert_eq!(join_sql_conditions(fragments.iter().flatten()), "where a = 1 and b = 2");
    }
}
