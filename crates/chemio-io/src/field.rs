//! Line reading and fixed-column field parsing
//!
//! Field parsers are pure: they return a [`FieldValue`] describing what was
//! found, and the caller applies the reader mode once through
//! [`FieldValue::resolve`]. Missing trailing fields are `Defaulted`, never
//! invalid, so short lines are padded the same way in both modes.

use std::fmt;
use std::io::BufRead;

use crate::error::{IoError, IoResult};
use crate::options::ReaderMode;

/// Width of a V2000 coordinate field (`xxxxx.xxxx`)
pub const COORDINATE_WIDTH: usize = 10;
/// Offset of the decimal point inside a coordinate field
pub const COORDINATE_DECIMAL: usize = 5;

/// Outcome of parsing one field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<T> {
    /// Well-formed value
    Ok(T),
    /// Field absent or blank; the value is the format default
    Defaulted(T),
    /// Field present but malformed; `fallback` is the best-effort value
    Invalid { reason: String, fallback: T },
}

impl<T: fmt::Debug> FieldValue<T> {
    /// Apply the reader mode: strict readers fail on invalid fields,
    /// relaxed readers log a warning and use the fallback
    pub fn resolve(self, mode: ReaderMode, line: usize) -> IoResult<T> {
        match self {
            FieldValue::Ok(v) | FieldValue::Defaulted(v) => Ok(v),
            FieldValue::Invalid { reason, fallback } => {
                if mode.is_strict() {
                    Err(IoError::parse(line, reason))
                } else {
                    log::warn!("line {}: {}; using {:?}", line, reason, fallback);
                    Ok(fallback)
                }
            }
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, FieldValue::Invalid { .. })
    }

    pub fn map<U>(self, f: impl Fn(T) -> U) -> FieldValue<U> {
        match self {
            FieldValue::Ok(v) => FieldValue::Ok(f(v)),
            FieldValue::Defaulted(v) => FieldValue::Defaulted(f(v)),
            FieldValue::Invalid { reason, fallback } => FieldValue::Invalid {
                reason,
                fallback: f(fallback),
            },
        }
    }
}

/// Report a violation that has no value to substitute (the caller drops
/// the offending item): an error in strict mode, a warning otherwise
pub fn tolerate(mode: ReaderMode, line: usize, reason: impl Into<String>) -> IoResult<()> {
    let reason = reason.into();
    if mode.is_strict() {
        Err(IoError::parse(line, reason))
    } else {
        log::warn!("line {}: {}; ignored", line, reason);
        Ok(())
    }
}

/// Columns `start..start + width` of a line, clipped to the line length
pub fn column(line: &str, start: usize, width: usize) -> &str {
    let end = (start + width).min(line.len());
    if start >= end {
        return "";
    }
    line.get(start..end).unwrap_or("")
}

/// Fixed-width decimal coordinate with the decimal point at a fixed offset
pub fn coordinate(line: &str, start: usize) -> FieldValue<f32> {
    let raw = column(line, start, COORDINATE_WIDTH);
    let text = raw.trim();
    if text.is_empty() {
        return FieldValue::Invalid {
            reason: format!("missing coordinate at column {}", start + 1),
            fallback: 0.0,
        };
    }
    let value = match text.parse::<f32>() {
        Ok(v) => v,
        Err(_) => {
            return FieldValue::Invalid {
                reason: format!("malformed coordinate '{}'", text),
                fallback: 0.0,
            }
        }
    };
    if raw.as_bytes().get(COORDINATE_DECIMAL) == Some(&b'.') {
        FieldValue::Ok(value)
    } else {
        FieldValue::Invalid {
            reason: format!(
                "decimal point of coordinate '{}' is not at column {}",
                text,
                start + COORDINATE_DECIMAL + 1
            ),
            fallback: value,
        }
    }
}

/// Fixed-width integer; blank or missing fields default to 0
pub fn integer(line: &str, start: usize, width: usize) -> FieldValue<i32> {
    let text = column(line, start, width).trim();
    if text.is_empty() {
        return FieldValue::Defaulted(0);
    }
    match text.parse::<i32>() {
        Ok(v) => FieldValue::Ok(v),
        Err(_) => FieldValue::Invalid {
            reason: format!("malformed integer '{}' at column {}", text, start + 1),
            fallback: 0,
        },
    }
}

/// Fixed-width non-negative count; `None` when absent or malformed
pub fn count(line: &str, start: usize, width: usize) -> Option<usize> {
    column(line, start, width).trim().parse().ok()
}

/// Buffered line source tracking 1-based line numbers
///
/// Line terminators (`\n`, `\r\n`) are stripped. One line of lookahead is
/// available through [`LineReader::peek`].
pub struct LineReader<R> {
    reader: R,
    line_number: usize,
    peeked: Option<Option<String>>,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R) -> Self {
        LineReader {
            reader,
            line_number: 0,
            peeked: None,
        }
    }

    /// Number of the last line returned by [`LineReader::next_line`]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn fetch(&mut self) -> IoResult<Option<String>> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => Ok(None),
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                Ok(Some(line))
            }
            Err(e) => Err(IoError::Io(e)),
        }
    }

    /// Next line, or `None` at end of input
    pub fn next_line(&mut self) -> IoResult<Option<String>> {
        let line = match self.peeked.take() {
            Some(line) => line,
            None => self.fetch()?,
        };
        if line.is_some() {
            self.line_number += 1;
        }
        Ok(line)
    }

    /// Next line, failing at end of input
    pub fn expect_line(&mut self, what: &str) -> IoResult<String> {
        match self.next_line()? {
            Some(line) => Ok(line),
            None => Err(IoError::parse(
                self.line_number + 1,
                format!("expected {}, got end of file", what),
            )),
        }
    }

    /// Look at the next line without consuming it
    pub fn peek(&mut self) -> IoResult<Option<&str>> {
        if self.peeked.is_none() {
            let line = self.fetch()?;
            self.peeked = Some(line);
        }
        Ok(self.peeked.as_ref().and_then(|l| l.as_deref()))
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_clips() {
        assert_eq!(column("abcdef", 2, 3), "cde");
        assert_eq!(column("abcdef", 4, 10), "ef");
        assert_eq!(column("abc", 5, 3), "");
    }

    #[test]
    fn test_coordinate() {
        let line = "   -0.0073   -0.5272    0.9655 H   0  3";
        assert_eq!(coordinate(line, 0), FieldValue::Ok(-0.0073));
        assert_eq!(coordinate(line, 20), FieldValue::Ok(0.9655));

        let shifted = "  -0.00730";
        let field = coordinate(shifted, 0);
        assert!(field.is_invalid());
        assert!(field.clone().resolve(ReaderMode::Strict, 5).is_err());
        assert_eq!(field.resolve(ReaderMode::Relaxed, 5).unwrap(), -0.0073);

        assert!(coordinate("", 0).is_invalid());
    }

    #[test]
    fn test_integer() {
        assert_eq!(integer("  1  0  3", 6, 3), FieldValue::Ok(3));
        assert_eq!(integer("  1", 6, 3), FieldValue::Defaulted(0));
        assert!(integer("  x", 0, 3).is_invalid());
    }

    #[test]
    fn test_tolerate() {
        assert!(tolerate(ReaderMode::Strict, 3, "bad").is_err());
        assert!(tolerate(ReaderMode::Relaxed, 3, "bad").is_ok());
    }

    #[test]
    fn test_line_reader() {
        let mut reader = LineReader::new("first\r\nsecond\nthird".as_bytes());
        assert_eq!(reader.peek().unwrap(), Some("first"));
        assert_eq!(reader.line_number(), 0);
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("first"));
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("second"));
        assert_eq!(reader.line_number(), 2);
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("third"));
        assert_eq!(reader.next_line().unwrap(), None);
        assert_eq!(reader.peek().unwrap(), None);
        assert!(reader.expect_line("atom line").is_err());
    }
}
