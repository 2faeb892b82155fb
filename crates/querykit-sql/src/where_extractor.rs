//! Column extraction from the outermost WHERE clause
//!
//! Parses a full statement and collects the bare names of every column the
//! top-level SELECT filters on. Subqueries are not descended into.

use crate::parser::{ParseError, SqlParser};
use crate::quoting::remove_table_alias;
use querykit_core::{Diagnostic, DiagnosticCode, DialectConfig, Severity};
use sqlparser::ast::{Expr, FunctionArg, FunctionArgExpr, FunctionArguments, Select, SetExpr, Statement};
use std::collections::BTreeSet;

/// Errors that keep a column set from being produced
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("No SQL statement to extract from")]
    EmptyStatement,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Not a query: {0}")]
    UnsupportedStatement(String),
}

impl ExtractError {
    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Parse(error) => error.to_diagnostic(),
            Self::EmptyStatement => {
                Diagnostic::new(DiagnosticCode::SqlEmptyStatement, Severity::Error, self.to_string())
            }
            Self::UnsupportedStatement(_) => {
                Diagnostic::new(DiagnosticCode::SqlUnsupportedStatement, Severity::Error, self.to_string())
            }
        }
    }
}

/// Extracts WHERE-clause columns using a configured dialect
pub struct WhereClauseExtractor {
    parser: SqlParser,
}

impl WhereClauseExtractor {
    /// Extractor using the generic dialect
    pub fn new() -> Self {
        Self {
            parser: SqlParser::new(),
        }
    }

    /// Extractor using a specific dialect
    pub fn with_dialect(dialect: DialectConfig) -> Self {
        Self {
            parser: SqlParser::from_dialect(dialect),
        }
    }

    /// Columns referenced in the top-level SELECT's WHERE clause, with
    /// qualifiers and quotes stripped. Case is kept as written.
    pub fn extract(&self, sql: &str) -> Result<BTreeSet<String>, ExtractError> {
        if sql.trim().is_empty() {
            return Err(ExtractError::EmptyStatement);
        }

        let parsed = self.parser.parse(sql, None)?;
        let statement = parsed.first_statement().ok_or(ExtractError::EmptyStatement)?;
        let query = parsed
            .as_query()
            .ok_or_else(|| ExtractError::UnsupportedStatement(statement_kind(statement)))?;

        let mut columns = BTreeSet::new();
        if let Some(selection) = top_select(&query.body).and_then(|select| select.selection.as_ref()) {
            collect_columns(selection, &mut columns);
        }

        tracing::debug!(count = columns.len(), "extracted where-clause columns");

        Ok(columns)
    }
}

impl Default for WhereClauseExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Columns referenced in the outermost WHERE clause of `sql`, parsed with
/// the generic dialect.
pub fn extract_where_columns(sql: &str) -> Result<BTreeSet<String>, ExtractError> {
    WhereClauseExtractor::new().extract(sql)
}

/// The SELECT a query body starts with. For set operations that is the
/// left-most branch.
fn top_select(body: &SetExpr) -> Option<&Select> {
    match body {
        SetExpr::Select(select) => Some(select.as_ref()),
        SetExpr::Query(query) => top_select(&query.body),
        SetExpr::SetOperation { left, .. } => top_select(left),
        _ => None,
    }
}

fn collect_columns(expr: &Expr, columns: &mut BTreeSet<String>) {
    match expr {
        Expr::Identifier(ident) => {
            columns.insert(remove_table_alias(&ident.to_string()));
        }
        Expr::CompoundIdentifier(idents) => {
            let reference = idents.iter().map(ToString::to_string).collect::<Vec<_>>().join(".");
            columns.insert(remove_table_alias(&reference));
        }
        Expr::BinaryOp { left, right, .. } | Expr::IsDistinctFrom(left, right) | Expr::IsNotDistinctFrom(left, right) => {
            collect_columns(left, columns);
            collect_columns(right, columns);
        }
        Expr::UnaryOp { expr, .. }
        | Expr::Nested(expr)
        | Expr::IsNull(expr)
        | Expr::IsNotNull(expr)
        | Expr::IsTrue(expr)
        | Expr::IsNotTrue(expr)
        | Expr::IsFalse(expr)
        | Expr::IsNotFalse(expr)
        | Expr::IsUnknown(expr)
        | Expr::IsNotUnknown(expr)
        | Expr::Cast { expr, .. } => collect_columns(expr, columns),
        Expr::InList { expr, list, .. } => {
            collect_columns(expr, columns);
            for item in list {
                collect_columns(item, columns);
            }
        }
        // The subquery has its own scope; only the tested expression counts.
        Expr::InSubquery { expr, .. } => collect_columns(expr, columns),
        Expr::Between { expr, low, high, .. } => {
            collect_columns(expr, columns);
            collect_columns(low, columns);
            collect_columns(high, columns);
        }
        Expr::Like { expr, pattern, .. } | Expr::ILike { expr, pattern, .. } | Expr::SimilarTo { expr, pattern, .. } => {
            collect_columns(expr, columns);
            collect_columns(pattern, columns);
        }
        Expr::Function(function) => {
            if let FunctionArguments::List(list) = &function.args {
                for arg in list.args.iter().filter_map(function_arg_expr) {
                    collect_columns(arg, columns);
                }
            }
        }
        Expr::Case {
            operand,
            conditions,
            results,
            else_result,
            ..
        } => {
            for nested in operand.iter().chain(else_result.iter()) {
                collect_columns(nested, columns);
            }
            for nested in conditions.iter().chain(results.iter()) {
                collect_columns(nested, columns);
            }
        }
        Expr::Tuple(items) => {
            for item in items {
                collect_columns(item, columns);
            }
        }
        Expr::AnyOp { left, right, .. }
        | Expr::AllOp { left, right, .. }
        | Expr::Position {
            expr: left,
            r#in: right,
            ..
        }
        | Expr::AtTimeZone {
            timestamp: left,
            time_zone: right,
            ..
        }
        | Expr::InUnnest {
            expr: left,
            array_expr: right,
            ..
        } => {
            collect_columns(left, columns);
            collect_columns(right, columns);
        }
        Expr::Substring {
            expr,
            substring_from,
            substring_for,
            ..
        } => {
            collect_columns(expr, columns);
            for nested in substring_from.iter().chain(substring_for.iter()) {
                collect_columns(nested, columns);
            }
        }
        Expr::Trim {
            expr,
            trim_what,
            trim_characters,
            ..
        } => {
            collect_columns(expr, columns);
            if let Some(what) = trim_what {
                collect_columns(what, columns);
            }
            for nested in trim_characters.iter().flatten() {
                collect_columns(nested, columns);
            }
        }
        Expr::Extract { expr, .. } | Expr::Ceil { expr, .. } | Expr::Floor { expr, .. } | Expr::Collate { expr, .. } => {
            collect_columns(expr, columns)
        }
        Expr::Interval(interval) => collect_columns(&interval.value, columns),
        _ => {}
    }
}

fn function_arg_expr(arg: &FunctionArg) -> Option<&Expr> {
    match arg {
        FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) | FunctionArg::Named { arg: FunctionArgExpr::Expr(expr), .. } => {
            Some(expr)
        }
        _ => None,
    }
}

/// Leading keyword of a statement, for error messages
fn statement_kind(statement: &Statement) -> String {
    statement
        .to_string()
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn columns(sql: &str) -> Vec<String> {
        extract_where_columns(sql).unwrap().into_iter().collect()
    }

    #[test]
    fn duplicates_collapse() {
        assert_eq!(columns("SELECT * FROM t WHERE c>10 AND c<20"), vec!["c"]);
    }

    #[test]
    fn subquery_columns_are_not_collected() {
        assert_eq!(
            columns("SELECT * FROM orders WHERE customer_id IN (SELECT id FROM customers WHERE region = 'EU')"),
            vec!["customer_id"]
        );
        assert_eq!(
            columns("SELECT * FROM t WHERE EXISTS (SELECT 1 FROM u WHERE u.x = t.y) AND status = 1"),
            vec!["status"]
        );
    }

    #[test]
    fn no_where_is_empty() {
        assert!(extract_where_columns("SELECT * FROM t").unwrap().is_empty());
    }

    #[test]
    fn failures() {
        assert!(matches!(extract_where_columns(""), Err(ExtractError::EmptyStatement)));
        assert!(matches!(extract_where_columns("   "), Err(ExtractError::EmptyStatement)));
        assert!(matches!(extract_where_columns("SELECT * FROM"), Err(ExtractError::Parse(_))));
        assert!(matches!(
            extract_where_columns("DELETE FROM t WHERE id = 1"),
            Err(ExtractError::UnsupportedStatement(kind)) if kind == "DELETE"
        ));
    }

    #[test]
    fn strips_aliases_and_quotes() {
        assert_eq!(
            columns(r#"SELECT * FROM users u WHERE u."First_Name" = 'a' AND u.age > 1"#),
            vec!["First_Name", "age"]
        );
    }

    #[test]
    fn walks_predicates() {
        let sql = "SELECT * FROM t WHERE a IN (1, 2) AND b BETWEEN 1 AND lim \
                   AND name LIKE 'x%' AND deleted_at IS NULL AND NOT flag \
                   AND lower(email) = 'x' AND (p = 1 OR q = 2) \
                   AND CASE WHEN kind = 1 THEN v ELSE w END > 0 AND CAST(s AS INT) = 3";
        assert_eq!(
            columns(sql),
            vec!["a", "b", "deleted_at", "email", "flag", "kind", "lim", "name", "p", "q", "s", "v", "w"]
        );
    }

    #[test]
    fn string_functions_with_own_syntax() {
        assert_eq!(columns("SELECT * FROM t WHERE substring(code, 1, 2) = 'AB'"), vec!["code"]);
        assert_eq!(columns("SELECT * FROM t WHERE substring(code FROM start FOR len) = 'AB'"), vec!["code", "len", "start"]);
        assert_eq!(columns("SELECT * FROM t WHERE trim(name) = 'x'"), vec!["name"]);
        assert_eq!(columns("SELECT * FROM t WHERE trim(BOTH pad FROM name) = 'x'"), vec!["name", "pad"]);
        assert_eq!(columns("SELECT * FROM t WHERE position('a' in label) > 0"), vec!["label"]);
    }

    #[test]
    fn numeric_and_temporal_functions() {
        assert_eq!(columns("SELECT * FROM t WHERE extract(year from created) = 2024"), vec!["created"]);
        assert_eq!(columns("SELECT * FROM t WHERE ceil(score) > 1 AND floor(ratio) < 2"), vec!["ratio", "score"]);
        assert_eq!(columns("SELECT * FROM t WHERE created AT TIME ZONE 'UTC' > '2024-01-01'"), vec!["created"]);
        assert_eq!(columns("SELECT * FROM t WHERE created AT TIME ZONE zone_name > '2024-01-01'"), vec!["created", "zone_name"]);
        assert_eq!(
            columns("SELECT * FROM t WHERE due < created + INTERVAL grace_days DAY"),
            vec!["created", "due", "grace_days"]
        );
    }

    #[test]
    fn quantified_comparisons_keep_both_sides() {
        assert_eq!(columns("SELECT * FROM t WHERE id = ANY(ids)"), vec!["id", "ids"]);
        assert_eq!(columns("SELECT * FROM t WHERE score > ALL(limits)"), vec!["limits", "score"]);
    }

    #[test]
    fn unnest_and_collate_predicates() {
        let bigquery = WhereClauseExtractor::with_dialect(DialectConfig::BigQuery);
        let found = bigquery.extract("SELECT * FROM t WHERE code IN UNNEST(tags)").unwrap();
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec!["code", "tags"]);

        let postgres = WhereClauseExtractor::with_dialect(DialectConfig::Postgres);
        let found = postgres.extract(r#"SELECT * FROM t WHERE name COLLATE "C" = 'a'"#).unwrap();
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn union_uses_first_branch() {
        assert_eq!(columns("SELECT a FROM t WHERE x = 1 UNION SELECT a FROM u WHERE y = 2"), vec!["x"]);
    }

    #[test]
    fn parse_error_diagnostic() {
        let error = extract_where_columns("SELECT * FROM").unwrap_err();
        assert_eq!(error.to_diagnostic().code, DiagnosticCode::SqlParseError);
        assert_eq!(ExtractError::EmptyStatement.to_diagnostic().code, DiagnosticCode::SqlEmptyStatement);
    }

    #[test]
    fn dialect_specific_extractor() {
        let extractor = WhereClauseExtractor::with_dialect(DialectConfig::Postgres);
        let found = extractor.extract("SELECT * FROM t WHERE payload->>'k' = 'v' AND id = 1").unwrap();
        assert!(found.contains("id"));
        assert!(found.contains("payload"));
    }
}
