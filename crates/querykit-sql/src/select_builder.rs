//! Fluent SELECT statement assembly
//!
//! [`SelectBuilder`] collects the pieces of a statement in any order and
//! renders them in SQL clause order:
//!
//! ```
//! use querykit_sql::{Condition, SelectBuilder};
//!
//! let sql = SelectBuilder::new()
//!     .add_column("name")
//!     .from("users", "u")
//!     .where_(Condition::and([Condition::raw("active = true"), Condition::raw("age >= 18")]))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(sql, "select name from users as u where active = true and age >= 18");
//! ```

use crate::condition::Condition;
use crate::formatter::lowercase;
use crate::order::{parse_order_by, Direction, NullOrdering, OrderItem};
use crate::quoting::ColumnRef;
use crate::tokenizer::{self, Token};
use querykit_core::{Diagnostic, DiagnosticCode, Severity};

/// Reasons a statement cannot be rendered
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("No table to select from")]
    MissingFrom,

    #[error("No columns to select")]
    NoColumns,
}

impl BuildError {
    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(DiagnosticCode::BuilderIncomplete, Severity::Error, self.to_string())
    }
}

#[derive(Debug, Clone)]
struct Cte {
    name: String,
    body: String,
}

#[derive(Debug, Clone)]
struct SelectColumn {
    expression: String,
    source_alias: Option<String>,
    output_alias: Option<String>,
}

impl SelectColumn {
    fn to_sql(&self) -> String {
        let expression = self.expression.trim();

        // An alias written into the expression wins over everything else.
        if let Some((head, alias)) = split_inline_alias(expression) {
            return format!("{} as {}", lowercase(head), alias);
        }

        let mut sql = lowercase(expression);
        if let Some(source) = &self.source_alias {
            if ColumnRef::parse(expression).is_some_and(|column| !column.is_qualified()) {
                sql = format!("{}.{}", source, sql);
            }
        }
        if let Some(alias) = &self.output_alias {
            sql = format!("{} as {}", sql, alias);
        }

        sql
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinKind {
    Left,
    Inner,
}

#[derive(Debug, Clone)]
struct Join {
    kind: JoinKind,
    table: String,
    alias: String,
    on: String,
}

impl Join {
    fn to_sql(&self) -> String {
        let keyword = match self.kind {
            JoinKind::Left => "left join",
            JoinKind::Inner => "inner join",
        };
        format!("{} {} {} on {}", keyword, self.table, self.alias, self.on.trim())
    }
}

/// Accumulates the parts of a SELECT statement
///
/// Not meant to be shared between threads while it is being filled in.
#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    ctes: Vec<Cte>,
    columns: Vec<SelectColumn>,
    from: Option<(String, String)>,
    joins: Vec<Join>,
    where_condition: Option<Condition>,
    group_by: Vec<String>,
    having: Option<Condition>,
    order_by: Vec<OrderItem>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a common table expression, rendered `name as ( body )`
    pub fn with_cte(&mut self, name: impl Into<String>, body: impl Into<String>) -> &mut Self {
        self.ctes.push(Cte {
            name: name.into(),
            body: body.into(),
        });
        self
    }

    /// Append an output column
    ///
    /// An inline alias (`u.name AS user_name`) is kept as written.
    pub fn add_column(&mut self, expression: impl Into<String>) -> &mut Self {
        self.push_column(expression.into(), None, None)
    }

    /// Append an output column read from `source_alias`
    ///
    /// The alias is only prepended to bare column names.
    pub fn add_column_from(&mut self, expression: impl Into<String>, source_alias: &str) -> &mut Self {
        self.push_column(expression.into(), non_blank(source_alias), None)
    }

    /// Append an output column with an explicit output alias
    ///
    /// Blank aliases count as absent. An inline alias in `expression` takes
    /// precedence over `output_alias`.
    pub fn add_column_as(
        &mut self,
        expression: impl Into<String>,
        source_alias: &str,
        output_alias: &str,
    ) -> &mut Self {
        self.push_column(expression.into(), non_blank(source_alias), non_blank(output_alias))
    }

    fn push_column(
        &mut self,
        expression: String,
        source_alias: Option<String>,
        output_alias: Option<String>,
    ) -> &mut Self {
        self.columns.push(SelectColumn {
            expression,
            source_alias,
            output_alias,
        });
        self
    }

    /// Set the base table, rendered `from table as alias`
    pub fn from(&mut self, table: impl Into<String>, alias: impl Into<String>) -> &mut Self {
        self.from = Some((table.into(), alias.into()));
        self
    }

    /// Add `left join table alias on ...`. `on` receives the join alias.
    pub fn left_join(&mut self, table: impl Into<String>, alias: impl Into<String>, on: impl FnOnce(&str) -> String) -> &mut Self {
        self.push_join(JoinKind::Left, table.into(), alias.into(), on)
    }

    /// Add `inner join table alias on ...`. `on` receives the join alias.
    pub fn inner_join(&mut self, table: impl Into<String>, alias: impl Into<String>, on: impl FnOnce(&str) -> String) -> &mut Self {
        self.push_join(JoinKind::Inner, table.into(), alias.into(), on)
    }

    fn push_join(&mut self, kind: JoinKind, table: String, alias: String, on: impl FnOnce(&str) -> String) -> &mut Self {
        let on = on(&alias);
        self.joins.push(Join { kind, table, alias, on });
        self
    }

    /// Set the WHERE condition, replacing any previous one
    pub fn where_(&mut self, condition: Condition) -> &mut Self {
        self.where_condition = Some(condition);
        self
    }

    /// Append GROUP BY columns
    pub fn group_by<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.extend(
            columns
                .into_iter()
                .map(Into::into)
                .filter(|column| !column.trim().is_empty()),
        );
        self
    }

    /// Set the HAVING condition, replacing any previous one
    pub fn having(&mut self, condition: Condition) -> &mut Self {
        self.having = Some(condition);
        self
    }

    /// Append one ORDER BY entry. A blank column is ignored.
    pub fn order_by(&mut self, column: &str, direction: Direction, nulls: NullOrdering) -> &mut Self {
        if !column.trim().is_empty() {
            self.order_by.push(OrderItem::new(column.trim(), direction, nulls));
        }
        self
    }

    /// Append entries parsed from free text such as
    /// `ORDER BY last_name ASC, created_at DESC NULLS LAST`
    pub fn order_by_raw(&mut self, text: &str) -> &mut Self {
        self.order_by.extend(parse_order_by(text));
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    /// Fetch one extra row so callers can tell whether another page exists
    pub fn limit_plus_one(&mut self, limit: u64) -> &mut Self {
        self.limit(limit.saturating_add(1))
    }

    /// Limit to `requested`, capped at `max`
    pub fn limit_with_max(&mut self, requested: u64, max: u64) -> &mut Self {
        self.limit(requested.min(max))
    }

    /// Render the statement
    pub fn build(&self) -> Result<String, BuildError> {
        let (table, alias) = self.from.as_ref().ok_or(BuildError::MissingFrom)?;
        if self.columns.is_empty() {
            return Err(BuildError::NoColumns);
        }

        let mut clauses = Vec::new();

        if !self.ctes.is_empty() {
            let ctes = self
                .ctes
                .iter()
                .map(|cte| format!("{} as ( {} )", cte.name, cte.body.trim()))
                .collect::<Vec<_>>()
                .join(", ");
            clauses.push(format!("with {}", ctes));
        }

        let columns = self.columns.iter().map(SelectColumn::to_sql).collect::<Vec<_>>().join(", ");
        clauses.push(format!("select {}", columns));

        if alias.trim().is_empty() {
            clauses.push(format!("from {}", table));
        } else {
            clauses.push(format!("from {} as {}", table, alias));
        }

        clauses.extend(self.joins.iter().map(Join::to_sql));

        if let Some(condition) = self.where_condition.as_ref().filter(|condition| !condition.is_empty()) {
            clauses.push(format!("where {}", condition.to_sql()));
        }

        if !self.group_by.is_empty() {
            let columns = self.group_by.iter().map(|column| lowercase(column)).collect::<Vec<_>>();
            clauses.push(format!("group by {}", columns.join(", ")));
        }

        if let Some(condition) = self.having.as_ref().filter(|condition| !condition.is_empty()) {
            clauses.push(format!("having {}", condition.to_sql()));
        }

        if !self.order_by.is_empty() {
            let order = self.order_by.iter().map(OrderItem::to_sql).collect::<Vec<_>>().join(", ");
            clauses.push(format!("order by {}", order));
        }

        if let Some(limit) = self.limit {
            clauses.push(format!("limit {}", limit));
        }
        if let Some(offset) = self.offset {
            clauses.push(format!("offset {}", offset));
        }

        tracing::debug!(
            columns = self.columns.len(),
            joins = self.joins.len(),
            ctes = self.ctes.len(),
            "built select statement"
        );

        Ok(clauses.join(" "))
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Split `expr AS alias` on the last `as` outside parentheses and literals
fn split_inline_alias(expression: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    let mut found = None;

    for spanned in tokenizer::tokenize(expression) {
        match &spanned.token {
            Token::LeftParen => depth += 1,
            Token::RightParen => depth = depth.saturating_sub(1),
            token if depth == 0 && token.is_keyword("as") => found = Some(spanned.span.clone()),
            _ => {}
        }
    }

    let span = found?;
    let head = expression[..span.start].trim();
    let alias = expression[span.end..].trim();

    (!head.is_empty() && !alias.is_empty()).then_some((head, alias))
}
