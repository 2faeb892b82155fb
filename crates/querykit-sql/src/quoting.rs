//! Quoting and identifier helpers
//!
//! Operates on single column-reference tokens such as `name`, `t.name`,
//! `"ax"."first_name"` or `` schema.`table`.col ``. Anything that is not a
//! plain (optionally qualified) identifier - function calls, arithmetic,
//! wildcards, malformed dotted text - is treated as "not a column".

/// A parsed column reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    /// Everything before the last segment, dot-joined with quoting preserved
    pub qualifier: Option<String>,

    /// The last segment, quoting preserved
    pub column: String,
}

impl ColumnRef {
    /// Parse a column reference, returning `None` for anything that is not
    /// a dotted chain of valid identifier segments.
    pub fn parse(text: &str) -> Option<Self> {
        let segments = split_segments(text.trim())?;

        if !segments.iter().all(|segment| is_identifier_segment(segment)) {
            return None;
        }

        let (column, qualifier) = segments.split_last()?;

        Some(Self {
            qualifier: if qualifier.is_empty() {
                None
            } else {
                Some(qualifier.join("."))
            },
            column: (*column).to_string(),
        })
    }

    /// Whether the reference carries a qualifier
    pub fn is_qualified(&self) -> bool {
        self.qualifier.is_some()
    }
}

/// Strip one pair of matching `"` or `` ` `` quotes.
///
/// Inputs shorter than two characters and mismatched quotes are returned
/// unchanged.
pub fn unquote(text: &str) -> &str {
    if text.len() < 2 {
        return text;
    }

    for quote in ['"', '`'] {
        if let Some(inner) = text.strip_prefix(quote).and_then(|rest| rest.strip_suffix(quote)) {
            return inner;
        }
    }

    text
}

/// Whether `text` is a column reference with at least one qualifier segment
pub fn is_qualified_with_alias(text: &str) -> bool {
    ColumnRef::parse(text).is_some_and(|column| column.is_qualified())
}

/// The qualifier of a column reference (`schema.table` for
/// `schema.table.col`), or `None` when `text` is unqualified or not a
/// column reference.
pub fn extract_qualifier(text: &str) -> Option<String> {
    ColumnRef::parse(text).and_then(|column| column.qualifier)
}

/// The last segment of a qualified column reference, quoting preserved.
///
/// Anything that is not a qualified column reference comes back unchanged.
pub fn unqualify(text: &str) -> &str {
    let trimmed = text.trim();

    match ColumnRef::parse(trimmed) {
        Some(column) if column.is_qualified() => split_segments(trimmed)
            .and_then(|segments| segments.last().copied())
            .unwrap_or(text),
        _ => text,
    }
}

/// The last dot-separated segment of `text`, with surrounding quotes removed.
///
/// Unlike [`unqualify`] this never refuses its input: malformed references
/// are split on the last dot.
pub fn remove_table_alias(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let last = split_segments(text)
        .and_then(|segments| segments.last().copied())
        .or_else(|| text.rsplit('.').next())
        .unwrap_or(text);

    unquote(last.trim()).to_string()
}

/// Whether `segment` is a single plain or quoted identifier
pub(crate) fn is_identifier_segment(segment: &str) -> bool {
    if segment.len() > 2 {
        for quote in ['"', '`'] {
            if let Some(inner) = segment.strip_prefix(quote).and_then(|rest| rest.strip_suffix(quote)) {
                return !inner.is_empty() && quotes_are_doubled(inner, quote);
            }
        }
    }

    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

/// Every `quote` inside a quoted identifier must be escaped by doubling it.
/// A lone one closes the identifier early, as in `"a" || "b"`.
fn quotes_are_doubled(inner: &str, quote: char) -> bool {
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == quote && chars.next() != Some(quote) {
            return false;
        }
    }
    true
}

/// Split on dots that sit outside quotes. `None` if a quote is left open.
fn split_segments(text: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut open_quote: Option<char> = None;

    for (index, c) in text.char_indices() {
        match open_quote {
            Some(quote) if c == quote => open_quote = None,
            Some(_) => {}
            None => match c {
                '"' | '`' => open_quote = Some(c),
                '.' => {
                    segments.push(&text[start..index]);
                    start = index + 1;
                }
                _ => {}
            },
        }
    }

    if open_quote.is_some() {
        return None;
    }

    segments.push(&text[start..]);
    Some(segments)
}
