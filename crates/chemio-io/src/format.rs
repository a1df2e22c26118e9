//! Format descriptors
//!
//! A [`FormatDescriptor`] names a file format, says how to recognise it from
//! the first lines of a file and which constructors produce its reader and
//! writer. Descriptors are immutable once handed to a
//! [`FormatRegistry`](crate::FormatRegistry).

use std::fmt;
use std::io::{BufRead, Write};
use std::sync::Arc;

use bitflags::bitflags;

use crate::options::ReaderOptions;
use crate::traits::{MoleculeReader, MoleculeWriter};

bitflags! {
    /// Features a format can carry
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u32 {
        const COORDINATES_2D = 1 << 0;
        const COORDINATES_3D = 1 << 1;
        const BOND_ORDERS = 1 << 2;
        const FORMAL_CHARGES = 1 << 3;
        const ISOTOPES = 1 << 4;
        const STEREO = 1 << 5;
        const SGROUPS = 1 << 6;
        /// Named key/value data attached to records
        const PROPERTIES = 1 << 7;
        /// Several records per file
        const MULTIPLE_RECORDS = 1 << 8;
        const QUERY_BONDS = 1 << 9;
        const REACTIONS = 1 << 10;
    }
}

/// Predicate over the leading lines of an input
pub type LineMatcher = fn(&[String]) -> bool;

/// Builds a reader over a (rewound, decompressed) input
pub type ReaderConstructor =
    for<'a> fn(Box<dyn BufRead + 'a>, ReaderOptions) -> Box<dyn MoleculeReader + 'a>;

/// Builds a writer over an output
pub type WriterConstructor = for<'a> fn(Box<dyn Write + 'a>) -> Box<dyn MoleculeWriter + 'a>;

/// Description of one chemical file format
#[derive(Clone)]
pub struct FormatDescriptor {
    /// Unique format name
    pub name: String,
    pub mime_type: Option<String>,
    /// File extensions without the dot; the first is preferred
    pub extensions: Vec<String>,
    pub is_xml: bool,
    pub capabilities: Capabilities,
    /// Tie-break rank when several formats match; higher wins
    pub priority: i32,
    /// Number of leading lines the matcher needs to see
    pub required_lines: usize,
    pub matcher: Option<LineMatcher>,
    pub reader: Option<ReaderConstructor>,
    pub writer: Option<WriterConstructor>,
}

impl FormatDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        FormatDescriptor {
            name: name.into(),
            mime_type: None,
            extensions: Vec::new(),
            is_xml: false,
            capabilities: Capabilities::empty(),
            priority: 0,
            required_lines: 0,
            matcher: None,
            reader: None,
            writer: None,
        }
    }

    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn xml(mut self) -> Self {
        self.is_xml = true;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Make the format detectable from its first `required_lines` lines
    pub fn with_matcher(mut self, matcher: LineMatcher, required_lines: usize) -> Self {
        self.matcher = Some(matcher);
        self.required_lines = required_lines.max(1);
        self
    }

    pub fn with_reader(mut self, reader: ReaderConstructor) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn with_writer(mut self, writer: WriterConstructor) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn preferred_extension(&self) -> Option<&str> {
        self.extensions.first().map(String::as_str)
    }

    #[inline]
    pub fn is_sniffable(&self) -> bool {
        self.matcher.is_some()
    }

    #[inline]
    pub fn has_reader(&self) -> bool {
        self.reader.is_some()
    }

    #[inline]
    pub fn has_writer(&self) -> bool {
        self.writer.is_some()
    }

    pub fn supports(&self, capability: Capabilities) -> bool {
        self.capabilities.contains(capability)
    }

    /// Apply the matcher to the first `required_lines` of a prefix
    pub fn matches(&self, lines: &[String]) -> bool {
        match self.matcher {
            Some(matcher) => matcher(&lines[..lines.len().min(self.required_lines)]),
            None => false,
        }
    }
}

impl fmt::Debug for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatDescriptor")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("extensions", &self.extensions)
            .field("is_xml", &self.is_xml)
            .field("capabilities", &self.capabilities)
            .field("priority", &self.priority)
            .field("sniffable", &self.is_sniffable())
            .field("reader", &self.has_reader())
            .field("writer", &self.has_writer())
            .finish()
    }
}

impl fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Outcome of format detection
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    /// Winning format, `None` when nothing matched
    pub format: Option<Arc<FormatDescriptor>>,
    /// Priority of the winning format
    pub priority: i32,
}

impl MatchResult {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn matched(format: Arc<FormatDescriptor>) -> Self {
        let priority = format.priority;
        MatchResult {
            format: Some(format),
            priority,
        }
    }

    #[inline]
    pub fn is_match(&self) -> bool {
        self.format.is_some()
    }

    /// Name of the matched format
    pub fn name(&self) -> Option<&str> {
        self.format.as_deref().map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_line_is_magic(lines: &[String]) -> bool {
        lines.first().is_some_and(|l| l.starts_with("MAGIC"))
    }

    #[test]
    fn test_builder() {
        let format = FormatDescriptor::new("Magic")
            .with_mime_type("chemical/x-magic")
            .with_extensions(&["mgc", "magic"])
            .with_capabilities(Capabilities::COORDINATES_3D | Capabilities::BOND_ORDERS)
            .with_matcher(first_line_is_magic, 1)
            .with_priority(3);

        assert_eq!(format.preferred_extension(), Some("mgc"));
        assert!(format.supports(Capabilities::BOND_ORDERS));
        assert!(!format.supports(Capabilities::SGROUPS));
        assert!(format.is_sniffable());
        assert!(!format.has_reader());
        assert_eq!(format.to_string(), "Magic");
    }

    #[test]
    fn test_matcher_sees_required_lines_only() {
        fn second_line(lines: &[String]) -> bool {
            lines.len() > 1
        }
        let format = FormatDescriptor::new("Two").with_matcher(second_line, 1);
        let lines = vec!["a".to_string(), "b".to_string()];
        assert!(!format.matches(&lines));
    }

    #[test]
    fn test_match_result() {
        let result = MatchResult::unknown();
        assert!(!result.is_match());
        assert_eq!(result.name(), None);

        let format = Arc::new(FormatDescriptor::new("Magic").with_priority(7));
        let result = MatchResult::matched(format);
        assert!(result.is_match());
        assert_eq!(result.name(), Some("Magic"));
        assert_eq!(result.priority, 7);
    }
}
