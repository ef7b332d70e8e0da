//! Lexer for JavaScript source code
//!
//! Converts source text into a terminated sequence of tokens. Scanning is
//! total: characters that start no known construct become single-character
//! `Unknown` tokens, and unterminated strings, templates and block comments
//! run to end of input. Every sequence ends with exactly one `Eof` token.

use std::fmt;

use log::debug;
use rustc_hash::FxHashSet;
use serde::Serialize;

/// Reserved words. `true`/`false`/`null` are reclassified as literals.
const KEYWORDS: &[&str] = &[
    "var",
    "let",
    "const",
    "function",
    "class",
    "import",
    "export",
    "if",
    "else",
    "for",
    "while",
    "do",
    "switch",
    "case",
    "default",
    "break",
    "continue",
    "return",
    "throw",
    "try",
    "catch",
    "finally",
    "true",
    "false",
    "null",
    "undefined",
    "NaN",
    "Infinity",
    "this",
    "super",
    "new",
    "typeof",
    "instanceof",
    "void",
    "delete",
    "in",
    "of",
    "with",
    "yield",
    "await",
    "async",
];

const OPERATORS: &[&str] = &[
    // arithmetic
    "+", "-", "*", "/", "%", "**", "++", "--",
    // assignment
    "=", "+=", "-=", "*=", "/=", "%=", "**=",
    // comparison
    "==", "===", "!=", "!==", ">", "<", ">=", "<=",
    // logical
    "!", "&&", "||", "??", "?.", "?",
    // bitwise
    "&", "|", "^", "~", "<<", ">>", ">>>",
    "&=", "|=", "^=", "<<=", ">>=", ">>>=",
    // misc
    "=>", "...",
];

const PUNCTUATION: &[&str] = &["(", ")", "[", "]", "{", "}", ",", ";", ":", "."];

/// Longest operator or punctuator, in characters
const MAX_OPERATOR_LEN: usize = 4;

/// Source span information
///
/// `start`/`end` are byte offsets into the source; lines and columns are
/// 1-based and count characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Span {
    pub fn new(
        start: usize,
        end: usize,
        line: u32,
        column: u32,
        end_line: u32,
        end_column: u32,
    ) -> Self {
        Self {
            start,
            end,
            line,
            column,
            end_line,
            end_column,
        }
    }

    /// Zero-width span at a single position
    pub fn point(pos: usize, line: u32, column: u32) -> Self {
        Self::new(pos, pos, line, column, line, column)
    }

    /// Span from the start of `self` to the end of `other`
    pub fn to(self, other: Span) -> Span {
        if other.end < self.start {
            return self;
        }
        Span::new(
            self.start,
            other.end,
            self.line,
            self.column,
            other.end_line,
            other.end_column,
        )
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::point(0, 1, 1)
    }
}

/// Token categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Keyword,
    Identifier,
    Number,
    String,
    TemplateString,
    Boolean,
    Null,
    Operator,
    Punctuation,
    Comment,
    Eof,
    Unknown,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Keyword => "KEYWORD",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Number => "NUMBER",
            TokenKind::String => "STRING",
            TokenKind::TemplateString => "TEMPLATE_STRING",
            TokenKind::Boolean => "BOOLEAN",
            TokenKind::Null => "NULL",
            TokenKind::Operator => "OPERATOR",
            TokenKind::Punctuation => "PUNCTUATION",
            TokenKind::Comment => "COMMENT",
            TokenKind::Eof => "EOF",
            TokenKind::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// A token with its raw lexeme and source location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub value: String,
    #[serde(flatten)]
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            value: value.into(),
            span,
        }
    }

    pub fn eof(pos: usize, line: u32, column: u32) -> Self {
        Self::new(TokenKind::Eof, "", Span::point(pos, line, column))
    }

    /// Token covering everything `end` consumed since `start`
    fn scanned(kind: TokenKind, start: &Cursor<'_>, end: &Cursor<'_>) -> Self {
        Self::new(
            kind,
            end.slice_from(start.pos),
            Span::new(
                start.pos,
                end.pos,
                start.line,
                start.column,
                end.line,
                end.column,
            ),
        )
    }

    pub fn line(&self) -> u32 {
        self.span.line
    }

    pub fn column(&self) -> u32 {
        self.span.column
    }

    pub fn is(&self, kind: TokenKind, value: &str) -> bool {
        self.kind == kind && self.value == value
    }

    pub fn is_keyword(&self, value: &str) -> bool {
        self.is(TokenKind::Keyword, value)
    }

    pub fn is_operator(&self, value: &str) -> bool {
        self.is(TokenKind::Operator, value)
    }

    pub fn is_punctuation(&self, value: &str) -> bool {
        self.is(TokenKind::Punctuation, value)
    }
}

/// Scan position over a source string
///
/// The cursor is `Copy`: scan routines snapshot it before consuming a token
/// and compare against the snapshot afterwards to build the token's lexeme
/// and span.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    source: &'a str,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Unconsumed input
    pub fn rest(&self) -> &'a str {
        self.source.get(self.pos..).unwrap_or("")
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn peek_next(&self) -> Option<char> {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next()
    }

    /// Consume one character. Only `\n` starts a new line.
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
    }

    /// Source text from byte offset `start` up to the cursor
    pub fn slice_from(&self, start: usize) -> &'a str {
        self.source.get(start..self.pos).unwrap_or("")
    }
}

/// Lexer for tokenizing JavaScript source code
///
/// Holds only the immutable keyword/operator tables, so one instance can
/// tokenize any number of sources.
#[derive(Debug, Clone)]
pub struct Lexer {
    keywords: FxHashSet<&'static str>,
    operators: FxHashSet<&'static str>,
    punctuation: FxHashSet<&'static str>,
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexer {
    pub fn new() -> Self {
        Self {
            keywords: KEYWORDS.iter().copied().collect(),
            operators: OPERATORS.iter().copied().collect(),
            punctuation: PUNCTUATION.iter().copied().collect(),
        }
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains(word)
    }

    /// Tokenize `source`, always ending with one `Eof` token
    pub fn tokenize(&self, source: &str) -> Vec<Token> {
        debug!("tokenizing {} bytes", source.len());
        let mut cursor = Cursor::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token(&mut cursor);
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        debug!("produced {} tokens", tokens.len());
        tokens
    }

    /// Scan the next token, or `Eof` once input is exhausted
    pub fn next_token(&self, cursor: &mut Cursor<'_>) -> Token {
        skip_whitespace(cursor);

        let start = *cursor;
        let Some(ch) = cursor.peek() else {
            return Token::eof(cursor.pos, cursor.line, cursor.column);
        };

        let kind = match ch {
            '/' if matches!(cursor.peek_next(), Some('/' | '*')) => scan_comment(cursor),
            '0'..='9' => scan_number(cursor),
            '.' if cursor.peek_next().is_some_and(|c| c.is_ascii_digit()) => scan_number(cursor),
            '"' | '\'' => scan_string(cursor, ch),
            '`' => scan_template(cursor),
            c if is_ident_start(c) => self.scan_word(cursor),
            _ => self.scan_operator(cursor),
        };

        Token::scanned(kind, &start, cursor)
    }

    fn scan_word(&self, cursor: &mut Cursor<'_>) -> TokenKind {
        let start = cursor.pos;
        cursor.advance_while(is_ident_continue);
        let word = cursor.slice_from(start);

        if !self.keywords.contains(word) {
            return TokenKind::Identifier;
        }
        match word {
            "true" | "false" => TokenKind::Boolean,
            "null" => TokenKind::Null,
            _ => TokenKind::Keyword,
        }
    }

    /// Longest match against operators and punctuation, 4 characters down to 1
    fn scan_operator(&self, cursor: &mut Cursor<'_>) -> TokenKind {
        let rest = cursor.rest();
        for len in (1..=MAX_OPERATOR_LEN).rev() {
            let end = match rest.char_indices().nth(len) {
                Some((idx, _)) => idx,
                None if rest.chars().count() == len => rest.len(),
                None => continue,
            };
            let Some(candidate) = rest.get(..end) else {
                continue;
            };

            let kind = if self.operators.contains(candidate) {
                TokenKind::Operator
            } else if self.punctuation.contains(candidate) {
                TokenKind::Punctuation
            } else {
                continue;
            };

            for _ in 0..len {
                cursor.advance();
            }
            return kind;
        }

        cursor.advance();
        TokenKind::Unknown
    }
}

/// Tokenize `source` with a fresh [`Lexer`]
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new().tokenize(source)
}

fn skip_whitespace(cursor: &mut Cursor<'_>) {
    cursor.advance_while(char::is_whitespace);
}

/// `//` to end of line, or `/* ... */` (possibly unterminated)
fn scan_comment(cursor: &mut Cursor<'_>) -> TokenKind {
    cursor.advance(); // /
    if cursor.eat('/') {
        cursor.advance_while(|c| c != '\n');
        return TokenKind::Comment;
    }

    cursor.advance(); // *
    while let Some(ch) = cursor.advance() {
        if ch == '*' && cursor.eat('/') {
            break;
        }
    }
    TokenKind::Comment
}

/// Digits with at most one `.` and at most one exponent marker
fn scan_number(cursor: &mut Cursor<'_>) -> TokenKind {
    let mut has_dot = false;
    let mut has_exponent = false;

    while let Some(ch) = cursor.peek() {
        match ch {
            '0'..='9' => {
                cursor.advance();
            }
            '.' if !has_dot => {
                has_dot = true;
                cursor.advance();
            }
            'e' | 'E' if !has_exponent => {
                has_exponent = true;
                cursor.advance();
                if matches!(cursor.peek(), Some('+' | '-')) {
                    cursor.advance();
                }
            }
            _ => break,
        }
    }

    TokenKind::Number
}

/// Quoted string; escapes are kept verbatim
fn scan_string(cursor: &mut Cursor<'_>, quote: char) -> TokenKind {
    scan_delimited(cursor, quote);
    TokenKind::String
}

/// Backtick string; `${` is kept as plain text
fn scan_template(cursor: &mut Cursor<'_>) -> TokenKind {
    scan_delimited(cursor, '`');
    TokenKind::TemplateString
}

fn scan_delimited(cursor: &mut Cursor<'_>, delimiter: char) {
    cursor.advance(); // opening delimiter
    while let Some(ch) = cursor.advance() {
        if ch == delimiter {
            break;
        }
        if ch == '\\' {
            cursor.advance();
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}
