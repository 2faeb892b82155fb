//! Lightweight SQL tokenizer
//!
//! Only the constructs the toolkit manipulates are recognised: string
//! literals, quoted and dotted identifiers, function names, numbers,
//! parentheses, commas, operators and a fixed keyword set. Whitespace is
//! dropped; every token keeps the byte span it came from so callers can cut
//! the original text.

use std::ops::Range;

/// Words that are never treated as column references. Non-reserved words
/// such as `first`, `last` or `interval` are left out since they are valid
/// column names.
const KEYWORDS: &[&str] = &[
    "and", "as", "asc", "between", "by", "case", "cross", "desc", "distinct", "else", "end",
    "except", "exists", "false", "from", "group", "having", "ilike", "in", "inner", "intersect",
    "is", "join", "like", "limit", "not", "null", "offset", "on", "or", "order", "select",
    "then", "true", "union", "when", "where", "with",
];

/// Operators made of more than one character, longest first
const MULTI_CHAR_OPERATORS: &[&str] = &["->>", "#>>", "<=", ">=", "<>", "!=", "||", "::", "->", "#>"];

const SINGLE_CHAR_OPERATORS: &str = "=<>!+-*/%|&^~#";

/// Whether `word` is in the keyword set (case-insensitive)
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|keyword| keyword.eq_ignore_ascii_case(word))
}

/// A single SQL token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `'text'`, quotes and escapes included
    StringLiteral(String),

    /// Dotted identifier chain; each segment keeps its own quoting
    Identifier(Vec<String>),

    /// Identifier followed by `(`
    Function(String),

    /// Keyword, original case preserved
    Keyword(String),

    /// Numeric literal
    Number(String),

    /// Bind parameter (`?` or `$1`)
    Parameter(String),

    LeftParen,
    RightParen,
    Comma,

    /// Comparison, arithmetic or other operator
    Operator(String),

    /// Anything else (`;`, `[`, ...)
    Other(char),
}

impl Token {
    /// Text this token renders as
    pub fn as_sql(&self) -> String {
        match self {
            Token::StringLiteral(text)
            | Token::Function(text)
            | Token::Keyword(text)
            | Token::Number(text)
            | Token::Parameter(text)
            | Token::Operator(text) => text.clone(),
            Token::Identifier(segments) => segments.join("."),
            Token::LeftParen => "(".to_string(),
            Token::RightParen => ")".to_string(),
            Token::Comma => ",".to_string(),
            Token::Other(c) => c.to_string(),
        }
    }

    /// Whether this is the keyword `keyword` (case-insensitive)
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Keyword(word) if word.eq_ignore_ascii_case(keyword))
    }
}

/// A token together with its byte range in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub span: Range<usize>,
}

/// Tokenize `text`, keeping source spans
pub fn tokenize(text: &str) -> Vec<Spanned> {
    Lexer::new(text).run()
}

/// Tokenize `text`, dropping spans
pub fn tokens(text: &str) -> Vec<Token> {
    tokenize(text).into_iter().map(|spanned| spanned.token).collect()
}

/// Byte ranges covered by string literals and quoted identifiers
pub fn quoted_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if !matches!(c, '\'' | '"' | '`') {
            continue;
        }

        let mut end = text.len();
        while let Some((index, next)) = chars.next() {
            if next == c {
                if matches!(chars.peek(), Some((_, following)) if *following == c) {
                    chars.next();
                    continue;
                }
                end = index + next.len_utf8();
                break;
            }
        }
        spans.push(start..end);
    }

    spans
}

/// Re-emit tokens with normalised spacing.
///
/// Binary operators get one space on each side, commas one space after,
/// nothing goes inside parentheses, function names and unary signs are
/// glued to what follows, `::` casts are glued on both sides.
pub fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut previous: Option<&Token> = None;
    let mut previous_unary = false;

    for token in tokens {
        if let Some(prev) = previous {
            if !previous_unary && needs_space(prev, token) {
                out.push(' ');
            }
        }

        previous_unary = is_unary_sign(previous, token);
        out.push_str(&token.as_sql());
        previous = Some(token);
    }

    out
}

fn needs_space(previous: &Token, current: &Token) -> bool {
    match (previous, current) {
        (_, Token::RightParen | Token::Comma) => false,
        (Token::LeftParen, _) => false,
        (Token::Function(_), Token::LeftParen) => false,
        (Token::Operator(op), _) if op == "::" => false,
        (_, Token::Operator(op)) if op == "::" => false,
        _ => true,
    }
}

fn is_unary_sign(previous: Option<&Token>, current: &Token) -> bool {
    let Token::Operator(op) = current else {
        return false;
    };
    if op != "-" && op != "+" {
        return false;
    }

    matches!(
        previous,
        None | Some(Token::LeftParen | Token::Comma | Token::Operator(_) | Token::Keyword(_))
    )
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

struct Lexer<'a> {
    text: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.char_indices().collect(),
            pos: 0,
        }
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|(_, c)| *c)
    }

    /// Byte offset of the current position
    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.text.len(), |(index, _)| *index)
    }

    fn run(mut self) -> Vec<Spanned> {
        let mut out = Vec::new();

        while let Some(c) = self.peek(0) {
            if c.is_whitespace() {
                self.pos += 1;
                continue;
            }

            let start = self.offset();
            let token = if c == '\'' {
                self.read_quoted('\'');
                Token::StringLiteral(self.text[start..self.offset()].to_string())
            } else if is_identifier_start(c) || c == '"' || c == '`' {
                self.read_identifier()
            } else if c.is_ascii_digit() || (c == '.' && self.peek(1).is_some_and(|n| n.is_ascii_digit())) {
                self.read_number();
                Token::Number(self.text[start..self.offset()].to_string())
            } else if c == '?' || (c == '$' && self.peek(1).is_some_and(|n| n.is_ascii_digit())) {
                self.pos += 1;
                while self.peek(0).is_some_and(|n| n.is_ascii_digit()) {
                    self.pos += 1;
                }
                Token::Parameter(self.text[start..self.offset()].to_string())
            } else {
                self.read_punctuation(c)
            };

            out.push(Spanned {
                token,
                span: start..self.offset(),
            });
        }

        out
    }

    /// Consume a quoted run starting at the current opening quote. A doubled
    /// quote is an escape; an unterminated run extends to the end.
    fn read_quoted(&mut self, quote: char) {
        self.pos += 1;
        while let Some(c) = self.peek(0) {
            self.pos += 1;
            if c == quote {
                if self.peek(0) == Some(quote) {
                    self.pos += 1;
                    continue;
                }
                return;
            }
        }
    }

    fn read_segment(&mut self) -> String {
        let start = self.offset();
        match self.peek(0) {
            Some(quote @ ('"' | '`')) => self.read_quoted(quote),
            _ => {
                while self.peek(0).is_some_and(is_identifier_char) {
                    self.pos += 1;
                }
            }
        }
        self.text[start..self.offset()].to_string()
    }

    fn read_identifier(&mut self) -> Token {
        let mut segments = vec![self.read_segment()];

        while self.peek(0) == Some('.') {
            match self.peek(1) {
                Some('*') => {
                    self.pos += 2;
                    segments.push("*".to_string());
                    break;
                }
                Some(next) if is_identifier_start(next) || next == '"' || next == '`' => {
                    self.pos += 1;
                    segments.push(self.read_segment());
                }
                _ => break,
            }
        }

        let single_word = segments.len() == 1 && !segments[0].starts_with(['"', '`']);
        if single_word && is_keyword(&segments[0]) {
            return Token::Keyword(segments.remove(0));
        }

        let last_is_plain = segments
            .last()
            .is_some_and(|segment| segment != "*" && !segment.starts_with(['"', '`']));
        if last_is_plain && self.next_non_whitespace() == Some('(') {
            return Token::Function(segments.join("."));
        }

        Token::Identifier(segments)
    }

    fn next_non_whitespace(&self) -> Option<char> {
        self.chars[self.pos..]
            .iter()
            .map(|(_, c)| *c)
            .find(|c| !c.is_whitespace())
    }

    fn read_number(&mut self) {
        while self.peek(0).is_some_and(|c| c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }

        if matches!(self.peek(0), Some('e' | 'E')) {
            let signed = matches!(self.peek(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += digit_at;
                while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
        }
    }

    fn read_punctuation(&mut self, c: char) -> Token {
        match c {
            '(' => {
                self.pos += 1;
                return Token::LeftParen;
            }
            ')' => {
                self.pos += 1;
                return Token::RightParen;
            }
            ',' => {
                self.pos += 1;
                return Token::Comma;
            }
            _ => {}
        }

        let rest = &self.text[self.offset()..];
        if let Some(op) = MULTI_CHAR_OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            self.pos += op.chars().count();
            return Token::Operator((*op).to_string());
        }

        self.pos += 1;
        if SINGLE_CHAR_OPERATORS.contains(c) {
            Token::Operator(c.to_string())
        } else {
            Token::Other(c)
        }
    }
}
