//! SQL text assembly and lightweight parsing
//!
//! This crate handles:
//! - Quoting and qualifier helpers for single column references
//! - Splitting column blobs and lowercasing keywords
//! - Re-pointing column references in conditions at an alias placeholder
//! - Extracting WHERE-clause columns using datafusion-sqlparser-rs
//! - Joining condition fragments and assembling SELECT statements

pub mod alias_rewriter;
pub mod columns;
pub mod condition;
pub mod formatter;
pub mod joiner;
pub mod order;
pub mod parser;
pub mod quoting;
pub mod select_builder;
pub mod tokenizer;
pub mod where_extractor;

pub use alias_rewriter::{replace_table_aliases, ALIAS_PLACEHOLDER};
pub use columns::split_columns;
pub use condition::Condition;
pub use formatter::lowercase;
pub use joiner::join_sql_conditions;
pub use order::{parse_order_by, Direction, NullOrdering, OrderItem, OrderParseError};
pub use parser::{ParseError, ParsedSql, SqlParser};
pub use quoting::{extract_qualifier, is_qualified_with_alias, remove_table_alias, unqualify, unquote, ColumnRef};
pub use select_builder::{BuildError, SelectBuilder};
pub use where_extractor::{extract_where_columns, ExtractError, WhereClauseExtractor};
