//! SQL keyword case normalisation
//!
//! Generated SQL is emitted with lowercase keywords. Callers hand in
//! fragments written in any case (`ORDER BY name DESC NULLS LAST`), so a
//! fixed set of keywords is rewritten to its canonical lowercase form.
//! Operators such as `IN`, `LIKE`, `BETWEEN`, `IS NULL` and `EXISTS` are
//! not part of the set and keep the caller's case.

use crate::tokenizer::quoted_spans;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Keywords rewritten by [`lowercase`]. Multi-word entries come first so a
/// two-word keyword is always matched as one unit.
const KEYWORDS: &[&str] = &[
    r"nulls\s+first",
    r"nulls\s+last",
    r"order\s+by",
    r"group\s+by",
    r"left\s+join",
    r"inner\s+join",
    "select",
    "distinct",
    "from",
    "where",
    "having",
    "and",
    "or",
    "not",
    "asc",
    "desc",
    "limit",
    "offset",
    "as",
    "join",
    "on",
    "union",
    "with",
    "case",
    "when",
    "then",
    "else",
    "end",
];

static KEYWORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"(?i)\b(?:{})\b", KEYWORDS.join("|"));
    Regex::new(&pattern).expect("keyword pattern is valid")
});

/// Lowercase whole-word SQL keywords, leaving literals and quoted
/// identifiers untouched.
///
/// ```
/// use querykit_sql::formatter::lowercase;
///
/// assert_eq!(lowercase("SELECT description, ASCII(name) FROM users"), "select description, ASCII(name) from users");
/// assert_eq!(lowercase("ASC name DESC"), "asc name desc");
/// ```
pub fn lowercase(sql: &str) -> String {
    let protected = quoted_spans(sql);

    KEYWORD_PATTERN
        .replace_all(sql, |caps: &Captures| {
            let found = &caps[0];
            let start = caps.get(0).map_or(0, |m| m.start());

            if protected.iter().any(|span| span.contains(&start)) {
                found.to_string()
            } else {
                found
                    .split_whitespace()
                    .map(str::to_lowercase)
                    .collect::<Vec<_>>()
                    .join(" ")
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_order_by_keywords() {
        assert_eq!(
            lowercase("SELECT * FROM users ORDER BY name ASC, description DESC"),
            "select * from users order by name asc, description desc"
        );
    }

    #[test]
    fn leaves_words_containing_keywords() {
        assert_eq!(
            lowercase("SELECT description, ASCII(name) FROM users"),
            "select description, ASCII(name) from users"
        );
        assert_eq!(lowercase("description_asc DESC"), "description_asc desc");
        assert_eq!(lowercase("FROMAGE, ORDERS, android"), "FROMAGE, ORDERS, android");
    }

    #[test]
    fn keywords_at_string_boundaries() {
        assert_eq!(lowercase("ASC name DESC"), "asc name desc");
    }

    #[test]
    fn multi_word_keywords_collapse_whitespace() {
        assert_eq!(lowercase("x DESC NULLS   LAST"), "x desc nulls last");
        assert_eq!(lowercase("ORDER\n BY x"), "order by x");
    }

    #[test]
    fn case_expressions() {
        assert_eq!(
            lowercase("CASE WHEN active THEN 'Active' ELSE 'Inactive' END"),
            "case when active then 'Active' else 'Inactive' end"
        );
    }

    #[test]
    fn literals_and_quoted_identifiers_are_untouched() {
        assert_eq!(lowercase("a = 'SELECT AND OR' AND b"), "a = 'SELECT AND OR' and b");
        assert_eq!(lowercase("\"ORDER\" AS \"FROM\""), "\"ORDER\" as \"FROM\"");
    }

    #[test]
    fn operators_outside_the_set_keep_case() {
        assert_eq!(
            lowercase("ps IN ('1') AND x BETWEEN 1 AND 2 AND y IS NULL AND EXISTS (SELECT 1)"),
            "ps IN ('1') and x BETWEEN 1 and 2 and y IS NULL and EXISTS (select 1)"
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(lowercase(""), "");
    }
}
