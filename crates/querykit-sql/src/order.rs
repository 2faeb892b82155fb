//! ORDER BY specifications and free-text parsing

use crate::formatter::lowercase;
use crate::tokenizer::{self, Token};
use regex::Regex;
use std::sync::LazyLock;

static ORDER_BY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*order\s+by\b").expect("order by prefix pattern is valid"));

static ORDER_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(?P<column>.*?)(?:\s+(?P<direction>asc|desc))?(?:\s+nulls\s+(?P<nulls>first|last))?$")
        .expect("order segment pattern is valid")
});

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
    /// Leave it to the database
    #[default]
    Unspecified,
}

impl std::str::FromStr for Direction {
    type Err = OrderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            "" => Ok(Self::Unspecified),
            other => Err(OrderParseError::InvalidDirection(other.to_string())),
        }
    }
}

/// Placement of NULL values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NullOrdering {
    First,
    Last,
    #[default]
    Unspecified,
}

impl std::str::FromStr for NullOrdering {
    type Err = OrderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase();
        match normalized.as_str() {
            "nulls first" | "first" => Ok(Self::First),
            "nulls last" | "last" => Ok(Self::Last),
            "" => Ok(Self::Unspecified),
            _ => Err(OrderParseError::InvalidNullOrdering(s.trim().to_string())),
        }
    }
}

/// One ORDER BY entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub column: String,
    pub direction: Direction,
    pub nulls: NullOrdering,
}

impl OrderItem {
    pub fn new(column: impl Into<String>, direction: Direction, nulls: NullOrdering) -> Self {
        Self {
            column: column.into(),
            direction,
            nulls,
        }
    }

    /// Parse `column [asc|desc] [nulls first|nulls last]`
    pub fn parse(segment: &str) -> Option<Self> {
        let caps = ORDER_SEGMENT.captures(segment.trim())?;
        let column = caps.name("column")?.as_str().trim();
        if column.is_empty() {
            return None;
        }

        let direction = match caps.name("direction") {
            Some(found) if found.as_str().eq_ignore_ascii_case("asc") => Direction::Asc,
            Some(_) => Direction::Desc,
            None => Direction::Unspecified,
        };
        let nulls = match caps.name("nulls") {
            Some(found) if found.as_str().eq_ignore_ascii_case("first") => NullOrdering::First,
            Some(_) => NullOrdering::Last,
            None => NullOrdering::Unspecified,
        };

        Some(Self::new(column, direction, nulls))
    }

    /// Render as `column [asc|desc] [nulls first|nulls last]`
    pub fn to_sql(&self) -> String {
        let mut sql = lowercase(self.column.trim());

        match self.direction {
            Direction::Asc => sql.push_str(" asc"),
            Direction::Desc => sql.push_str(" desc"),
            Direction::Unspecified => {}
        }
        match self.nulls {
            NullOrdering::First => sql.push_str(" nulls first"),
            NullOrdering::Last => sql.push_str(" nulls last"),
            NullOrdering::Unspecified => {}
        }

        sql
    }
}

/// Parse a free-text ORDER BY list such as
/// `order by name desc nulls last, created_at asc`.
///
/// A leading `order by` is stripped once. Entries are split on commas that
/// sit outside parentheses and literals; blank entries are skipped.
pub fn parse_order_by(text: &str) -> Vec<OrderItem> {
    let body = match ORDER_BY_PREFIX.find(text) {
        Some(prefix) => &text[prefix.end()..],
        None => text,
    };

    split_top_level(body)
        .into_iter()
        .filter_map(OrderItem::parse)
        .collect()
}

/// Split on commas at parenthesis depth zero
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for spanned in tokenizer::tokenize(text) {
        match spanned.token {
            Token::LeftParen => depth += 1,
            Token::RightParen => depth = depth.saturating_sub(1),
            Token::Comma if depth == 0 => {
                parts.push(&text[start..spanned.span.start]);
                start = spanned.span.end;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);

    parts
}

/// Errors parsing a structured direction or null ordering
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderParseError {
    #[error("Invalid sort direction: {0}")]
    InvalidDirection(String),

    #[error("Invalid null ordering: {0}")]
    InvalidNullOrdering(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(text: &str) -> Vec<String> {
        parse_order_by(text).iter().map(OrderItem::to_sql).collect()
    }

    #[test]
    fn parses_every_combination() {
        assert_eq!(render("last_updated"), vec!["last_updated"]);
        assert_eq!(render("last_updated ASC"), vec!["last_updated asc"]);
        assert_eq!(render("last_updated NULLS LAST"), vec!["last_updated nulls last"]);
        assert_eq!(render("last_updated DESC NULLS FIRST"), vec!["last_updated desc nulls first"]);
    }

    #[test]
    fn strips_order_by_prefix_once() {
        assert_eq!(
            render("order by name desc nulls last, created_at asc"),
            vec!["name desc nulls last", "created_at asc"]
        );
        assert_eq!(render("ORDER BY created_at DESC"), vec!["created_at desc"]);
    }

    #[test]
    fn column_names_containing_direction_words() {
        assert_eq!(render("description_asc DESC"), vec!["description_asc desc"]);
        assert_eq!(render("nulls_first_flag"), vec!["nulls_first_flag"]);
    }

    #[test]
    fn case_expressions_and_function_commas() {
        assert_eq!(
            render("CASE WHEN status = 'A,B' THEN 1 ELSE 2 END ASC, coalesce(a, b) DESC"),
            vec!["case when status = 'A,B' then 1 else 2 end asc", "coalesce(a, b) desc"]
        );
    }

    #[test]
    fn blank_input_yields_nothing() {
        assert!(parse_order_by("").is_empty());
        assert!(parse_order_by("  ,  ").is_empty());
        assert!(parse_order_by("order by").is_empty());
    }

    #[test]
    fn structured_values_from_str() {
        assert_eq!("DESC".parse::<Direction>().unwrap(), Direction::Desc);
        assert_eq!("NULLS  LAST".parse::<NullOrdering>().unwrap(), NullOrdering::Last);
        assert!("sideways".parse::<Direction>().is_err());
        assert!("nulls middle".parse::<NullOrdering>().is_err());
    }
}
