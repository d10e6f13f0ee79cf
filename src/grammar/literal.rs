//! Safe literal parser for tag argument lists.
//!
//! Argument lists are a parenthesized, comma-separated sequence of literals:
//!
//! ```text
//! (2, true, ["__pycache__", build])
//! ```
//!
//! Accepted literals are booleans (`true`/`false`/`True`/`False`), `None`
//! (or `null`), signed integers, quoted strings with backslash escapes,
//! bracketed lists, and bare identifiers (taken as strings). Nothing is
//! evaluated; anything else is a parse error.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// A parsed argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Literal>),
    None,
}

impl Literal {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(s) => Some(s),
            _ => None,
        }
    }

    /// String items of a list literal. Non-string items yield `None`.
    pub fn as_str_list(&self) -> Option<Vec<String>> {
        match self {
            Literal::List(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => None,
        }
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Str(_) => "string",
            Literal::List(_) => "list",
            Literal::None => "None",
        }
    }
}

impl fmt::Display for Literal {
    /// Renders strings unquoted so literals can be substituted into text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Str(s) => write!(f, "{}", s),
            Literal::None => write!(f, "None"),
            Literal::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Error produced while parsing an argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralError {
    pub message: String,
    pub position: usize,
}

impl fmt::Display for LiteralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at position {}", self.message, self.position)
    }
}

impl std::error::Error for LiteralError {}

type Cursor<'a> = Peekable<CharIndices<'a>>;

/// Parse a full `( ... )` argument list.
///
/// Whitespace around the parentheses is ignored. `()` yields an empty list.
pub fn parse_arg_list(text: &str) -> Result<Vec<Literal>, LiteralError> {
    let mut chars = text.char_indices().peekable();
    skip_ws(&mut chars);
    expect(&mut chars, '(', text.len())?;
    let items = parse_sequence(&mut chars, ')', text.len())?;
    skip_ws(&mut chars);
    if let Some((pos, ch)) = chars.next() {
        return Err(LiteralError {
            message: format!("unexpected '{}' after closing ')'", ch),
            position: pos,
        });
    }
    Ok(items)
}

/// Parse a single literal that makes up the whole input, e.g. `[RL, BF]`.
pub fn parse_literal(text: &str) -> Result<Literal, LiteralError> {
    let mut chars = text.char_indices().peekable();
    skip_ws(&mut chars);
    let value = parse_value(&mut chars, text.len())?;
    skip_ws(&mut chars);
    if let Some((pos, ch)) = chars.next() {
        return Err(LiteralError {
            message: format!("unexpected '{}' after literal", ch),
            position: pos,
        });
    }
    Ok(value)
}

/// Parse comma-separated values up to and including `close`.
fn parse_sequence(chars: &mut Cursor<'_>, close: char, end: usize) -> Result<Vec<Literal>, LiteralError> {
    let mut items = Vec::new();

    loop {
        skip_ws(chars);
        match chars.peek() {
            Some(&(_, c)) if c == close => {
                chars.next();
                return Ok(items);
            }
            None => {
                return Err(LiteralError {
                    message: format!("missing closing '{}'", close),
                    position: end,
                });
            }
            _ => {}
        }

        items.push(parse_value(chars, end)?);

        skip_ws(chars);
        match chars.next() {
            Some((_, ',')) => continue,
            Some((_, c)) if c == close => return Ok(items),
            Some((pos, c)) => {
                return Err(LiteralError {
                    message: format!("expected ',' or '{}', found '{}'", close, c),
                    position: pos,
                });
            }
            None => {
                return Err(LiteralError {
                    message: format!("missing closing '{}'", close),
                    position: end,
                });
            }
        }
    }
}

fn parse_value(chars: &mut Cursor<'_>, end: usize) -> Result<Literal, LiteralError> {
    let Some(&(pos, ch)) = chars.peek() else {
        return Err(LiteralError {
            message: "expected a value".to_string(),
            position: end,
        });
    };

    match ch {
        '[' => {
            chars.next();
            Ok(Literal::List(parse_sequence(chars, ']', end)?))
        }
        '"' | '\'' => {
            chars.next();
            parse_string(chars, ch, pos, end).map(Literal::Str)
        }
        c if c == '-' || c == '+' || c.is_ascii_digit() => parse_int(chars, pos),
        c if c.is_alphabetic() || c == '_' => {
            let word = take_word(chars);
            Ok(match word.as_str() {
                "true" | "True" => Literal::Bool(true),
                "false" | "False" => Literal::Bool(false),
                "None" | "null" => Literal::None,
                _ => Literal::Str(word),
            })
        }
        other => Err(LiteralError {
            message: format!("unexpected '{}'", other),
            position: pos,
        }),
    }
}

fn parse_string(
    chars: &mut Cursor<'_>,
    quote: char,
    start: usize,
    end: usize,
) -> Result<String, LiteralError> {
    let mut value = String::new();
    loop {
        match chars.next() {
            Some((_, c)) if c == quote => return Ok(value),
            Some((_, '\\')) => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, c)) => value.push(c),
                None => break,
            },
            Some((_, c)) => value.push(c),
            None => break,
        }
    }
    Err(LiteralError {
        message: format!("unterminated string starting with {}", quote),
        position: start.min(end),
    })
}

fn parse_int(chars: &mut Cursor<'_>, start: usize) -> Result<Literal, LiteralError> {
    let mut digits = String::new();
    if let Some(&(_, sign)) = chars.peek()
        && (sign == '-' || sign == '+')
    {
        digits.push(sign);
        chars.next();
    }
    while let Some(&(_, c)) = chars.peek() {
        if c.is_ascii_digit() || c == '_' {
            if c != '_' {
                digits.push(c);
            }
            chars.next();
        } else {
            break;
        }
    }
    digits.parse::<i64>().map(Literal::Int).map_err(|_| LiteralError {
        message: format!("invalid integer '{}'", digits),
        position: start,
    })
}

fn take_word(chars: &mut Cursor<'_>) -> String {
    let mut word = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '/') {
            word.push(c);
            chars.next();
        } else {
            break;
        }
    }
    word
}

fn skip_ws(chars: &mut Cursor<'_>) {
    while let Some(&(_, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else {
            break;
        }
    }
}

fn expect(chars: &mut Cursor<'_>, wanted: char, end: usize) -> Result<(), LiteralError> {
    match chars.next() {
        Some((_, c)) if c == wanted => Ok(()),
        Some((pos, c)) => Err(LiteralError {
            message: format!("expected '{}', found '{}'", wanted, c),
            position: pos,
        }),
        None => Err(LiteralError {
            message: format!("expected '{}'", wanted),
            position: end,
        }),
    }
}
