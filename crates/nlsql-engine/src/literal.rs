//! Strict parser for annotation literals
//!
//! The annotation model answers with a nested list literal:
//!
//! ```text
//! ["<table description>", [["<column>: description, sample values: v1, v2"], ...]]
//! ```
//!
//! Grammar accepted here, and nothing else:
//!
//! ```text
//! document := ws value ws
//! value    := string | list | tuple | '(' ws value ws ')'
//! list     := '[' ws ( value ws ( ',' ws value ws )* ( ',' ws )? )? ']'
//! tuple    := '(' ws ( value ws ( ',' ws value ws )+ ( ',' ws )? | value ws ',' ws )? ')'
//! string   := "'" char* "'" | '"' char* '"'
//! ```
//!
//! Lists and tuples both parse to [`Literal::List`]. Strings follow Python
//! escape rules: `\\ \' \" \a \b \f \n \r \t \v`, octal `\ooo`, `\xhh`,
//! `\uxxxx`, `\Uxxxxxxxx` and backslash-newline. Any other escape is kept
//! as written, backslash included. A bare line break inside a string is
//! rejected, as are numbers, mappings, markdown fences and any text around
//! the literal.

use nlsql_core::{ColumnAnnotation, InvalidColumnEntry, TableAnnotation};

/// Nesting depth at which parsing gives up
const MAX_DEPTH: usize = 32;

/// Parsed literal value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Str(String),
    List(Vec<Literal>),
}

/// Error when an annotation response does not follow the literal contract
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnotationParseError {
    #[error("Syntax error at offset {position}: {reason}")]
    Syntax { position: usize, reason: String },

    #[error("Unexpected annotation shape: {0}")]
    Shape(String),

    #[error(transparent)]
    Column(#[from] InvalidColumnEntry),
}

/// Parse a complete literal document
pub fn parse_literal(input: &str) -> Result<Literal, AnnotationParseError> {
    let mut parser = Parser { input, pos: 0 };
    parser.skip_ws();
    let value = parser.parse_value(0)?;
    parser.skip_ws();
    if parser.pos < input.len() {
        return Err(parser.error("unexpected text after literal"));
    }
    Ok(value)
}

/// Parse an annotation response into a [`TableAnnotation`]
///
/// The document must be a two-element list: the table description string
/// and a list of column entries. A column entry is a one-string list or a
/// bare string.
pub fn parse_annotation(table_name: &str, raw: &str) -> Result<TableAnnotation, AnnotationParseError> {
    let Literal::List(items) = parse_literal(raw)? else {
        return Err(AnnotationParseError::Shape("expected a list, found a string".to_string()));
    };

    let [description, columns] = <[Literal; 2]>::try_from(items).map_err(|items| {
        AnnotationParseError::Shape(format!("expected 2 elements, found {}", items.len()))
    })?;

    let Literal::Str(description) = description else {
        return Err(AnnotationParseError::Shape("table description must be a string".to_string()));
    };
    let Literal::List(columns) = columns else {
        return Err(AnnotationParseError::Shape("column annotations must be a list".to_string()));
    };

    let columns = columns
        .into_iter()
        .enumerate()
        .map(|(idx, column)| {
            let entry = column_entry(idx, column)?;
            Ok(ColumnAnnotation::parse_entry(&entry)?)
        })
        .collect::<Result<Vec<_>, AnnotationParseError>>()?;

    Ok(TableAnnotation::new(table_name, description, columns))
}

fn column_entry(idx: usize, column: Literal) -> Result<String, AnnotationParseError> {
    match column {
        Literal::Str(entry) => Ok(entry),
        Literal::List(mut inner) if inner.len() == 1 => match inner.pop() {
            Some(Literal::Str(entry)) => Ok(entry),
            _ => Err(AnnotationParseError::Shape(format!(
                "column {} must contain a string",
                idx
            ))),
        },
        Literal::List(inner) => Err(AnnotationParseError::Shape(format!(
            "column {} must hold exactly one string, found {} elements",
            idx,
            inner.len()
        ))),
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, reason: impl Into<String>) -> AnnotationParseError {
        AnnotationParseError::Syntax {
            position: self.pos,
            reason: reason.into(),
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Literal, AnnotationParseError> {
        if depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        match self.peek() {
            Some('[') => self.parse_sequence(']', depth),
            Some('(') => self.parse_sequence(')', depth),
            Some(quote @ ('\'' | '"')) => self.parse_string(quote).map(Literal::Str),
            Some(c) => Err(self.error(format!("expected a string or a list, found '{}'", c))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_sequence(&mut self, close: char, depth: usize) -> Result<Literal, AnnotationParseError> {
        self.bump();
        self.skip_ws();

        let mut items = Vec::new();
        if self.peek() == Some(close) {
            self.bump();
            return Ok(Literal::List(items));
        }

        loop {
            items.push(self.parse_value(depth + 1)?);
            self.skip_ws();

            let at = self.pos;
            match self.bump() {
                Some(',') => {
                    self.skip_ws();
                    if self.peek() == Some(close) {
                        self.bump();
                        return Ok(Literal::List(items));
                    }
                }
                Some(c) if c == close => {
                    // `(x)` groups a value, `(x,)` is a tuple
                    if close == ')' && items.len() == 1 {
                        return Ok(items.remove(0));
                    }
                    return Ok(Literal::List(items));
                }
                Some(c) => {
                    self.pos = at;
                    return Err(self.error(format!("expected ',' or '{}', found '{}'", close, c)));
                }
                None => return Err(self.error("unterminated list")),
            }
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String, AnnotationParseError> {
        let start = self.pos;
        self.bump();

        let mut out = String::new();
        loop {
            let at = self.pos;
            match self.bump() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('\n') => {}
                    Some('\r') => {
                        if self.peek() == Some('\n') {
                            self.bump();
                        }
                    }
                    Some('\\') => out.push('\\'),
                    Some('\'') => out.push('\''),
                    Some('"') => out.push('"'),
                    Some('a') => out.push('\u{07}'),
                    Some('b') => out.push('\u{08}'),
                    Some('f') => out.push('\u{0c}'),
                    Some('v') => out.push('\u{0b}'),
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    Some('x') => out.push(self.hex_escape(at, 'x', 2)?),
                    Some('u') => out.push(self.hex_escape(at, 'u', 4)?),
                    Some('U') => out.push(self.hex_escape(at, 'U', 8)?),
                    Some(digit @ '0'..='7') => out.push(self.octal_escape(digit)),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => break,
                },
                Some('\n') => return Err(self.error("line break inside string")),
                Some(c) => out.push(c),
                None => break,
            }
        }

        Err(AnnotationParseError::Syntax {
            position: start,
            reason: "unterminated string".to_string(),
        })
    }

    /// Read exactly `digits` hex digits after `\x`, `\u` or `\U`
    fn hex_escape(&mut self, escape_at: usize, letter: char, digits: usize) -> Result<char, AnnotationParseError> {
        let bad_escape = |reason: String| AnnotationParseError::Syntax {
            position: escape_at,
            reason,
        };

        let end = self.pos + digits;
        let code = self
            .input
            .get(self.pos..end)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .ok_or_else(|| bad_escape(format!("truncated '\\{}' escape", letter)))?;
        let c = char::from_u32(code)
            .ok_or_else(|| bad_escape(format!("invalid code point U+{:04X}", code)))?;

        self.pos = end;
        Ok(c)
    }

    /// Up to three octal digits, the first already consumed
    fn octal_escape(&mut self, first: char) -> char {
        let mut value = first.to_digit(8).unwrap_or(0);
        for _ in 0..2 {
            match self.peek().and_then(|c| c.to_digit(8)) {
                Some(d) => {
                    value = value * 8 + d;
                    self.bump();
                }
                None => break,
            }
        }
        char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}
