//! Line Protocol Parser
//!
//! The wire protocol is one command per line. Parsing happens in two steps:
//!
//! 1. **Framing**: [`parse_line`] pulls one complete line out of a receive
//!    buffer, returning how many bytes it consumed.
//! 2. **Tokenizing**: [`tokenize`] splits the line on whitespace, keeping a
//!    double-quoted run together as one token with the quotes stripped.
//!
//! ## How Framing Works
//!
//! [`parse_line`] reads from a buffer and returns either:
//! - `Ok(Some((line, consumed)))` - A complete line, `consumed` bytes were used
//! - `Ok(None)` - Need more data, no newline yet
//! - `Err(ParseError)` - The line is too long
//!
//! Bytes that are not valid UTF-8 are replaced with `U+FFFD`.
//!
//! ## Tokenizing Examples
//!
//! ```text
//! set name "John Doe"       ->  [set] [name] [John Doe]
//! hset p city "New York"    ->  [hset] [p] [city] [New York]
//! get "unterminated         ->  [get] ["unterminated]
//! ```

use thiserror::Error;

/// Errors that can occur while framing or tokenizing a line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line holds no tokens
    #[error("ERROR: no command provided")]
    EmptyCommand,

    /// No newline within the allowed line length
    #[error("ERROR: line too long: {size} bytes (max: {max})")]
    LineTooLong { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum length of a single command line (64 KB)
pub const MAX_LINE_SIZE: usize = 64 * 1024;

/// Incremental line framer with a configurable length limit.
#[derive(Debug, Clone)]
pub struct LineParser {
    max_line: usize,
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineParser {
    pub fn new() -> Self {
        Self {
            max_line: MAX_LINE_SIZE,
        }
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self { max_line }
    }

    /// Attempts to take one line from `buf`.
    ///
    /// The returned line has its `\n` (and a preceding `\r`) removed.
    pub fn parse(&self, buf: &[u8]) -> ParseResult<Option<(String, usize)>> {
        let Some(pos) = buf.iter().position(|&b| b == b'\n') else {
            if buf.len() > self.max_line {
                return Err(ParseError::LineTooLong {
                    size: buf.len(),
                    max: self.max_line,
                });
            }
            return Ok(None);
        };

        if pos > self.max_line {
            return Err(ParseError::LineTooLong {
                size: pos,
                max: self.max_line,
            });
        }

        Ok(Some((decode(&buf[..pos]), pos + 1)))
    }

    /// Takes the unterminated tail left in `buf` once the peer has closed.
    ///
    /// Returns `None` when nothing but the end of stream is left.
    pub fn parse_remainder(&self, buf: &[u8]) -> ParseResult<Option<String>> {
        if buf.is_empty() {
            return Ok(None);
        }
        if buf.len() > self.max_line {
            return Err(ParseError::LineTooLong {
                size: buf.len(),
                max: self.max_line,
            });
        }
        Ok(Some(decode(buf)))
    }
}

/// Strips a trailing `\r` and decodes, replacing invalid UTF-8.
fn decode(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Takes one line from `buf` using the default length limit.
pub fn parse_line(buf: &[u8]) -> ParseResult<Option<(String, usize)>> {
    LineParser::new().parse(buf)
}

/// Splits a command line into tokens.
///
/// A token starting with `"` runs up to the next `"` (at least one character
/// later) and loses its quotes. A quote with no partner is kept as a plain
/// character of a whitespace-delimited token.
pub fn tokenize(line: &str) -> ParseResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut rest = line;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        if let Some((token, tail)) = take_quoted(rest) {
            tokens.push(token.to_string());
            rest = tail;
            continue;
        }

        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        tokens.push(rest[..end].to_string());
        rest = &rest[end..];
    }

    if tokens.is_empty() {
        return Err(ParseError::EmptyCommand);
    }
    Ok(tokens)
}

/// Splits `"inner"tail` into `(inner, tail)`; `inner` is never empty.
fn take_quoted(s: &str) -> Option<(&str, &str)> {
    let quoted = s.strip_prefix('"')?;
    let first = quoted.chars().next()?;
    let skip = first.len_utf8();
    let end = skip + quoted[skip..].find('"')?;
    Some((&quoted[..end], &quoted[end + 1..]))
}
