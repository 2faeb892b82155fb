//! Column-list splitting
//!
//! Column blobs come from configuration and templates one expression per
//! line, usually with trailing commas:
//!
//! ```text
//! ax.enrollment,
//! coalesce(ax.value, 0) as value,
//! ```
//!
//! The split is line oriented. Parentheses are not parsed, so an expression
//! spread over several lines comes back as several elements.

/// Split a newline-delimited column blob into trimmed expressions.
pub fn split_columns(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            let trimmed = line.trim();
            trimmed.strip_suffix(',').map(str::trim_end).unwrap_or(trimmed)
        })
        .filter(|column| !column.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_lines_and_trims_commas() {
        let columns = split_columns("id,\n  name ,\n\temail\n");
        assert_eq!(columns, vec!["id", "name", "email"]);
    }

    #[test]
    fn skips_blank_and_comma_only_lines() {
        let columns = split_columns("id,\n\n   \n ,\n,\nname");
        assert_eq!(columns, vec!["id", "name"]);
    }

    #[test]
    fn empty_input() {
        assert!(split_columns("").is_empty());
        assert!(split_columns("\n\n").is_empty());
    }

    #[test]
    fn keeps_function_calls_on_one_line() {
        let columns = split_columns("func(a, b) as result,\nother");
        assert_eq!(columns, vec!["func(a, b) as result", "other"]);
    }

    #[test]
    fn only_one_trailing_comma_is_removed() {
        assert_eq!(split_columns("a,,"), vec!["a,"]);
    }

    #[test]
    fn handles_windows_line_endings() {
        assert_eq!(split_columns("a,\r\nb\r\n"), vec!["a", "b"]);
    }

    #[test]
    fn multi_line_expressions_are_split() {
        let columns = split_columns("coalesce(\n  a,\n  b\n) as c");
        assert_eq!(columns, vec!["coalesce(", "a", "b", ") as c"]);
    }
}
