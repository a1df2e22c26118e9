//! Non-destructive input peeking
//!
//! Format detection needs the first lines of an input, while the reader
//! chosen afterwards must see the input from its first byte. [`peek`]
//! buffers the leading lines of the decompressed stream and hands back a
//! [`PeekedInput`] that replays them before the rest.

use std::io::{self, BufRead, BufReader, Chain, Cursor, Read};

use crate::compress::MaybeGzReader;
use crate::error::{IoError, IoResult};

/// Upper bound on lines inspected by detection
pub const MAX_PEEK_LINES: usize = 64;
/// Upper bound on bytes inspected by detection
pub const MAX_PEEK_BYTES: usize = 64 * 1024;

/// An input whose leading bytes were read for detection, rewound to its start
pub struct PeekedInput<R: Read> {
    inner: Chain<Cursor<Vec<u8>>, MaybeGzReader<BufReader<R>>>,
    compressed: bool,
}

impl<R: Read> PeekedInput<R> {
    /// Whether the underlying input was gzip-compressed
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }
}

impl<R: Read> Read for PeekedInput<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> BufRead for PeekedInput<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}

/// Read up to `max_lines` lines (and at most `max_bytes` bytes) from the
/// logical content of `input`
///
/// gzip input is decompressed first. Lines are returned without their
/// terminators; invalid UTF-8 is replaced rather than rejected, since binary
/// formats are identified from their leading bytes too.
pub fn peek<R: Read>(
    input: R,
    max_lines: usize,
    max_bytes: usize,
) -> IoResult<(Vec<String>, PeekedInput<R>)> {
    let mut source = MaybeGzReader::sniff(BufReader::new(input))?;
    let compressed = source.is_compressed();

    let mut prefix = Vec::new();
    let mut lines = Vec::new();
    while lines.len() < max_lines && prefix.len() < max_bytes {
        let mut raw = Vec::new();
        let limit = (max_bytes - prefix.len()) as u64;
        let n = match (&mut source).take(limit).read_until(b'\n', &mut raw) {
            Ok(n) => n,
            Err(e) if compressed => return Err(IoError::Decompression(e.to_string())),
            Err(e) => return Err(IoError::Io(e)),
        };
        if n == 0 {
            break;
        }
        prefix.extend_from_slice(&raw);
        lines.push(decode_line(&raw));
    }

    let input = PeekedInput {
        inner: Cursor::new(prefix).chain(source),
        compressed,
    };
    Ok((lines, input))
}

fn decode_line(raw: &[u8]) -> String {
    let mut line = String::from_utf8_lossy(raw).into_owned();
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_rewinds() {
        let text = "4\nBortrifluorid\nB 0.0 0.0 0.0\nF 1.3 0.0 0.0\n";
        let (lines, mut input) = peek(text.as_bytes(), 2, MAX_PEEK_BYTES).unwrap();
        assert_eq!(lines, vec!["4", "Bortrifluorid"]);
        assert!(!input.is_compressed());

        let mut replay = String::new();
        input.read_to_string(&mut replay).unwrap();
        assert_eq!(replay, text);
    }

    #[test]
    fn test_byte_limit() {
        let text = "abcdefghij\nklm\n";
        let (lines, mut input) = peek(text.as_bytes(), 10, 4).unwrap();
        assert_eq!(lines, vec!["abcd"]);

        let mut first = String::new();
        input.read_line(&mut first).unwrap();
        assert_eq!(first, "abcdefghij\n");
    }

    #[test]
    fn test_empty_input() {
        let (lines, mut input) = peek(io::empty(), 10, 100).unwrap();
        assert!(lines.is_empty());
        let mut rest = Vec::new();
        input.read_to_end(&mut rest).unwrap();
        assert!(rest.is_empty());
    }
}
