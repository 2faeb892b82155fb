//! Table-alias placeholder injection for condition text
//!
//! Conditions are written against bare columns (`age > 10`) or against some
//! other alias (`ax.age > 10`). Before the condition can be attached to a
//! joined query, each reference to a known column is re-pointed at a
//! `%s.` placeholder that the caller fills with the real join alias:
//!
//! ```text
//! ax.salary > (SELECT AVG(by.salary) FROM emp1)
//! %s.salary > (SELECT AVG(salary) FROM emp1)
//! ```
//!
//! Rules:
//! - string literals are never rewritten;
//! - a word followed by `(` is a function name;
//! - a qualifier of two or more characters is swapped for the placeholder;
//! - inside a `(SELECT ...)` scope known columns stay bare and such
//!   qualifiers are dropped, the outer alias does not apply there;
//! - `and` / `or` joining the condition's predicates are re-emitted
//!   uppercase; the `and` of a `BETWEEN`, connectors inside a subquery and
//!   all other keywords keep their case;
//! - output spacing is normalised by [`crate::tokenizer::render`].

use crate::quoting::unquote;
use crate::tokenizer::{self, Token};
use std::collections::HashSet;

/// The placeholder segment emitted in front of rewritten columns
pub const ALIAS_PLACEHOLDER: &str = "%s";

/// Qualifiers shorter than this are left alone
const MIN_QUALIFIER_LEN: usize = 2;

/// Rewrite references to `known_columns` in `condition` to use the
/// [`ALIAS_PLACEHOLDER`] prefix.
///
/// Matching is case-insensitive and ignores quoting on the column. An empty
/// `known_columns` returns the condition unchanged.
pub fn replace_table_aliases<S: AsRef<str>>(condition: &str, known_columns: &[S]) -> String {
    if known_columns.is_empty() || condition.trim().is_empty() {
        return condition.to_string();
    }

    let known: HashSet<String> = known_columns
        .iter()
        .map(|column| unquote(column.as_ref().trim()).to_lowercase())
        .collect();

    let tokens = tokenizer::tokens(condition);
    let mut scopes: Vec<bool> = Vec::new();
    // Scope depth of a BETWEEN still waiting for its AND
    let mut pending_between: Option<usize> = None;
    let mut rewritten = Vec::with_capacity(tokens.len());
    let mut replaced = 0usize;

    for (index, token) in tokens.iter().enumerate() {
        let in_subquery = scopes.iter().any(|opens_select| *opens_select);

        let output = match token {
            Token::LeftParen => {
                let opens_select = tokens.get(index + 1).is_some_and(|next| next.is_keyword("select"));
                scopes.push(opens_select);
                token.clone()
            }
            Token::RightParen => {
                scopes.pop();
                if pending_between.is_some_and(|depth| depth > scopes.len()) {
                    pending_between = None;
                }
                token.clone()
            }
            Token::Keyword(word) if word.eq_ignore_ascii_case("between") => {
                pending_between = Some(scopes.len());
                token.clone()
            }
            Token::Keyword(word) if word.eq_ignore_ascii_case("and") && pending_between == Some(scopes.len()) => {
                pending_between = None;
                token.clone()
            }
            Token::Keyword(word) if !in_subquery && is_connector(word) => {
                Token::Keyword(word.to_uppercase())
            }
            Token::Identifier(segments) => {
                let follows_as = index > 0 && tokens[index - 1].is_keyword("as");

                match rewrite_reference(segments, &known, in_subquery) {
                    Some(reference) if !follows_as => {
                        replaced += 1;
                        reference
                    }
                    _ => token.clone(),
                }
            }
            _ => token.clone(),
        };

        rewritten.push(output);
    }

    tracing::trace!(replaced, "rewrote column references to alias placeholder");

    tokenizer::render(&rewritten)
}

fn is_connector(word: &str) -> bool {
    word.eq_ignore_ascii_case("and") || word.eq_ignore_ascii_case("or")
}

/// New identifier for a reference to a known column, or `None` when the
/// reference is left as written.
fn rewrite_reference(segments: &[String], known: &HashSet<String>, in_subquery: bool) -> Option<Token> {
    let (column, qualifier) = segments.split_last()?;

    if column == "*" || !known.contains(&unquote(column).to_lowercase()) {
        return None;
    }

    if !qualifier.is_empty() {
        let qualifier_len: usize = qualifier.iter().map(|segment| unquote(segment).chars().count()).sum();
        if qualifier_len < MIN_QUALIFIER_LEN {
            return None;
        }
    } else if in_subquery {
        return None;
    }

    let segments = if in_subquery {
        vec![column.clone()]
    } else {
        vec![ALIAS_PLACEHOLDER.to_string(), column.clone()]
    };

    Some(Token::Identifier(segments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rewrite(condition: &str, columns: &[&str]) -> String {
        replace_table_aliases(condition, columns)
    }

    #[test]
    fn prefixes_bare_columns() {
        assert_eq!(
            rewrite("age > 10 and country = 'NO'", &["age", "country"]),
            "%s.age > 10 AND %s.country = 'NO'"
        );
    }

    #[test]
    fn swaps_existing_alias() {
        assert_eq!(rewrite("ax.country = 'NO'", &["country"]), "%s.country = 'NO'");
        assert_eq!(rewrite("\"ax\".\"country\" = 'NO'", &["country"]), "%s.\"country\" = 'NO'");
    }

    #[test]
    fn single_letter_qualifiers_are_kept() {
        assert_eq!(rewrite("u.country = 'NO'", &["country"]), "u.country = 'NO'");
    }

    #[test]
    fn preserves_quoting_on_column() {
        assert_eq!(rewrite("\"first_name\" = 'Ana'", &["first_name"]), "%s.\"first_name\" = 'Ana'");
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(rewrite("AGE >= 18", &["age"]), "%s.AGE >= 18");
        assert_eq!(rewrite("age >= 18", &["AGE"]), "%s.age >= 18");
    }

    #[test]
    fn unknown_columns_are_untouched() {
        assert_eq!(rewrite("status = 1 and age > 2", &["age"]), "status = 1 AND %s.age > 2");
    }

    #[test]
    fn function_names_are_not_columns() {
        assert_eq!(rewrite("lower(name) = 'x'", &["lower", "name"]), "lower(%s.name) = 'x'");
    }

    #[test]
    fn literals_are_opaque() {
        assert_eq!(rewrite("name = 'age and name'", &["name", "age"]), "%s.name = 'age and name'");
    }

    #[test]
    fn subquery_scope_keeps_columns_bare() {
        assert_eq!(
            rewrite("ax.salary > (SELECT AVG(by.salary) FROM emp1)", &["salary"]),
            "%s.salary > (SELECT AVG(salary) FROM emp1)"
        );
    }

    #[test]
    fn rewriting_resumes_after_subquery() {
        assert_eq!(
            rewrite("id IN (SELECT id FROM t WHERE age > 1) and age < 5", &["id", "age"]),
            "%s.id IN (SELECT id FROM t WHERE age > 1) AND %s.age < 5"
        );
    }

    #[test]
    fn plain_grouping_is_not_a_scope() {
        assert_eq!(
            rewrite("(age > 1 or (status = 2)) and x = 1", &["age", "status"]),
            "(%s.age > 1 OR (%s.status = 2)) AND x = 1"
        );
    }

    #[test]
    fn deep_nesting_tracks_scope_by_depth() {
        let condition = "a = 1 and b IN (SELECT b FROM t WHERE (c > 1 and d IN (SELECT d FROM u))) and (c = 2)";
        assert_eq!(
            rewrite(condition, &["a", "b", "c", "d"]),
            "%s.a = 1 AND %s.b IN (SELECT b FROM t WHERE (c > 1 and d IN (SELECT d FROM u))) AND (%s.c = 2)"
        );
    }

    #[test]
    fn subquery_inside_grouping() {
        assert_eq!(
            rewrite("(x = 1 or EXISTS ( select 1 from t where t1.x = 2))", &["x"]),
            "(%s.x = 1 OR EXISTS (select 1 from t where x = 2))"
        );
    }

    #[test]
    fn keywords_keep_case() {
        assert_eq!(
            rewrite("age IS NOT NULL and name like 'a%' and x between 1 and 2", &["age", "name", "x"]),
            "%s.age IS NOT NULL AND %s.name like 'a%' AND %s.x between 1 and 2"
        );
    }

    #[test]
    fn only_the_conditions_own_connectors_are_uppercased() {
        assert_eq!(
            rewrite("x between 1 and 2 and y not between (lo) and hi or z = 1", &["x", "y", "z"]),
            "%s.x between 1 and 2 AND %s.y not between (lo) and hi OR %s.z = 1"
        );
        assert_eq!(
            rewrite("id in (select id from t where a = 1 or b between 2 and 3) and x = 1", &["id", "x"]),
            "%s.id in (select id from t where a = 1 or b between 2 and 3) AND %s.x = 1"
        );
    }

    #[test]
    fn non_reserved_words_can_be_columns() {
        assert_eq!(rewrite("last > 1 and first = 2", &["last", "first"]), "%s.last > 1 AND %s.first = 2");
        assert_eq!(rewrite("ax.interval >= 7 or nulls = 0", &["interval", "nulls"]), "%s.interval >= 7 OR %s.nulls = 0");
        assert_eq!(rewrite("id = any(ids)", &["id", "ids"]), "%s.id = any(%s.ids)");
    }

    #[test]
    fn division_gets_spaces() {
        assert_eq!(rewrite("discount/100 > 0.5", &["discount"]), "%s.discount / 100 > 0.5");
    }

    #[test]
    fn cast_target_is_not_a_column() {
        assert_eq!(rewrite("cast(value as numeric) > 1", &["value", "numeric"]), "cast(%s.value as numeric) > 1");
    }

    #[test]
    fn case_expression() {
        assert_eq!(
            rewrite("CASE WHEN score > 5 THEN 1 ELSE 0 END = 1", &["score"]),
            "CASE WHEN %s.score > 5 THEN 1 ELSE 0 END = 1"
        );
    }

    #[test]
    fn empty_known_columns_is_identity() {
        let condition = "ax.age>10 and x/2 = 1";
        assert_eq!(rewrite(condition, &[]), condition);
    }

    #[test]
    fn one_placeholder_per_reference() {
        let rewritten = rewrite("a = b or a > 1", &["a", "b"]);
        assert_eq!(rewritten.matches("%s.").count(), 3);
    }
}
