//! Compression support
//!
//! gzip input is recognised from its magic bytes, so compressed streams need
//! no `.gz` extension. Peeking goes through `BufRead::fill_buf`, which leaves
//! the bytes in place for the next reader.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use flate2::bufread::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::IoResult;

/// gzip member header magic
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Check whether a buffered stream starts with the gzip magic, without consuming it
pub fn peek_is_gzip<R: BufRead>(reader: &mut R) -> io::Result<bool> {
    // fill_buf only refills an empty buffer, so a magic split across two
    // reads of the underlying source is treated as plain text
    Ok(reader.fill_buf()?.starts_with(&GZIP_MAGIC))
}

/// Check if a path indicates a gzip file (by extension)
pub fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

/// Reader that transparently handles gzip compression
pub enum MaybeGzReader<R: BufRead> {
    /// Plain uncompressed reader
    Plain(R),
    /// Gzip-compressed reader
    Gzip(BufReader<MultiGzDecoder<R>>),
}

impl<R: BufRead> MaybeGzReader<R> {
    /// Wrap a buffered stream, decompressing it when it starts with the gzip magic
    pub fn sniff(mut reader: R) -> io::Result<Self> {
        if peek_is_gzip(&mut reader)? {
            log::debug!("gzip magic found, decompressing input");
            Ok(MaybeGzReader::Gzip(BufReader::new(MultiGzDecoder::new(reader))))
        } else {
            Ok(MaybeGzReader::Plain(reader))
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, MaybeGzReader::Gzip(_))
    }
}

impl<R: BufRead> Read for MaybeGzReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            MaybeGzReader::Plain(r) => r.read(buf),
            MaybeGzReader::Gzip(r) => r.read(buf),
        }
    }
}

impl<R: BufRead> BufRead for MaybeGzReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            MaybeGzReader::Plain(r) => r.fill_buf(),
            MaybeGzReader::Gzip(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            MaybeGzReader::Plain(r) => r.consume(amt),
            MaybeGzReader::Gzip(r) => r.consume(amt),
        }
    }
}

/// Open a file for reading, decompressing it when its content is gzip
pub fn open_file(path: &Path) -> IoResult<MaybeGzReader<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(MaybeGzReader::sniff(BufReader::new(file))?)
}

/// Create a gzip encoder for a writer
pub fn gzip_writer<W: Write>(writer: W) -> GzEncoder<W> {
    GzEncoder::new(writer, Compression::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = gzip_writer(Vec::new());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_is_gzip_path() {
        assert!(is_gzip_path(Path::new("file.sdf.gz")));
        assert!(is_gzip_path(Path::new("file.GZ")));
        assert!(!is_gzip_path(Path::new("file.sdf")));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut plain = Cursor::new(b"4\nBortrifluorid\n".to_vec());
        assert!(!peek_is_gzip(&mut plain).unwrap());
        let mut text = String::new();
        plain.read_to_string(&mut text).unwrap();
        assert_eq!(text, "4\nBortrifluorid\n");
    }

    #[test]
    fn test_sniff_decompresses() {
        let original = b"Hello, World! This is a test of gzip compression.";
        let mut reader = MaybeGzReader::sniff(Cursor::new(gzip(original))).unwrap();
        assert!(reader.is_compressed());

        let mut decompressed = Vec::new();
        reader.read_to_end(&mut decompressed).unwrap();
        assert_eq!(original.as_slice(), decompressed.as_slice());
    }

    #[test]
    fn test_empty_input_is_plain() {
        let reader = MaybeGzReader::sniff(Cursor::new(Vec::new())).unwrap();
        assert!(!reader.is_compressed());
    }
}
