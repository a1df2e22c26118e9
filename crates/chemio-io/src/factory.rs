//! Reader and writer construction from a format registry
//!
//! [`ReaderFactory`] detects the format of an input and hands the rewound
//! input to the matching reader; [`WriterFactory`] looks writers up by
//! format name.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use std::sync::Arc;

use crate::compress::MaybeGzReader;
use crate::error::{IoError, IoResult};
use crate::format::FormatDescriptor;
use crate::options::{ReaderOptions, SettingListener};
use crate::registry::FormatRegistry;
use crate::traits::{MoleculeReader, MoleculeWriter};

/// Creates readers for detected or named formats
#[derive(Debug, Clone)]
pub struct ReaderFactory {
    registry: Arc<FormatRegistry>,
    options: ReaderOptions,
}

impl ReaderFactory {
    pub fn new(registry: Arc<FormatRegistry>) -> Self {
        Self::with_options(registry, ReaderOptions::default())
    }

    pub fn with_options(registry: Arc<FormatRegistry>, options: ReaderOptions) -> Self {
        ReaderFactory { registry, options }
    }

    pub fn registry(&self) -> &Arc<FormatRegistry> {
        &self.registry
    }

    /// Options passed to every reader this factory creates
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut ReaderOptions {
        &mut self.options
    }

    /// Apply named settings (e.g. `ReaderMode=Strict`) from a listener
    pub fn apply_listener(&mut self, listener: &dyn SettingListener) -> IoResult<()> {
        self.options.apply_listener(listener)
    }

    /// Detect the format of `input` and create its reader
    ///
    /// Fails with [`IoError::UnknownFormat`] when nothing matches and with
    /// [`IoError::NoReader`] when the matching format cannot be read. The
    /// reader sees the input from its first byte, decompressed when it was
    /// gzip.
    pub fn create_reader<'a, R: Read + 'a>(&self, input: R) -> IoResult<Box<dyn MoleculeReader + 'a>> {
        let (result, input) = self.registry.guess_format(input)?;
        let Some(format) = result.format else {
            return Err(IoError::UnknownFormat(
                "no registered format matched the input".to_string(),
            ));
        };
        log::debug!(
            "detected {} (priority {}){}",
            format.name,
            result.priority,
            if input.is_compressed() { ", gzip" } else { "" }
        );
        self.instantiate(&format, Box::new(input))
    }

    /// Create a reader for a named format, skipping detection
    pub fn create_reader_for<'a, R: Read + 'a>(
        &self,
        name: &str,
        input: R,
    ) -> IoResult<Box<dyn MoleculeReader + 'a>> {
        let format = self
            .registry
            .get(name)
            .ok_or_else(|| IoError::UnknownFormat(name.to_string()))?;
        let input = MaybeGzReader::sniff(BufReader::new(input))?;
        self.instantiate(&format, Box::new(input))
    }

    /// Open a file and create its reader
    ///
    /// Content detection comes first; the file extension (ignoring `.gz`)
    /// is the fallback when no format matches the content.
    pub fn create_file_reader(&self, path: &Path) -> IoResult<Box<dyn MoleculeReader>> {
        let file = File::open(path)?;
        let (result, input) = self.registry.guess_format(file)?;
        let format = match result.format {
            Some(format) => format,
            None => {
                let format = self
                    .registry
                    .find_by_extension(path)
                    .ok_or_else(|| IoError::UnknownFormat(path.display().to_string()))?;
                log::debug!(
                    "{}: content not recognized, using {} from the extension",
                    path.display(),
                    format.name
                );
                format
            }
        };
        self.instantiate(&format, Box::new(input))
    }

    fn instantiate<'a>(
        &self,
        format: &FormatDescriptor,
        input: Box<dyn std::io::BufRead + 'a>,
    ) -> IoResult<Box<dyn MoleculeReader + 'a>> {
        let constructor = format
            .reader
            .ok_or_else(|| IoError::NoReader(format.name.clone()))?;
        Ok(constructor(input, self.options))
    }
}

/// Creates writers for named formats
#[derive(Debug, Clone)]
pub struct WriterFactory {
    registry: Arc<FormatRegistry>,
}

impl WriterFactory {
    pub fn new(registry: Arc<FormatRegistry>) -> Self {
        WriterFactory { registry }
    }

    /// Create a writer; [`IoError::NoWriter`] when the format has none
    pub fn create_writer<'a, W: Write + 'a>(
        &self,
        name: &str,
        output: W,
    ) -> IoResult<Box<dyn MoleculeWriter + 'a>> {
        let format = self
            .registry
            .get(name)
            .ok_or_else(|| IoError::UnknownFormat(name.to_string()))?;
        let constructor = format
            .writer
            .ok_or_else(|| IoError::NoWriter(format.name.clone()))?;
        Ok(constructor(Box::new(output)))
    }

    /// Create a writer chosen by file extension; `.gz` paths are compressed
    pub fn create_file_writer(&self, path: &Path) -> IoResult<Box<dyn MoleculeWriter>> {
        let format = self
            .registry
            .find_by_extension(path)
            .ok_or_else(|| IoError::UnknownFormat(path.display().to_string()))?;
        let constructor = format
            .writer
            .ok_or_else(|| IoError::NoWriter(format.name.clone()))?;
        let file = std::io::BufWriter::new(File::create(path)?);
        if crate::compress::is_gzip_path(path) {
            Ok(constructor(Box::new(crate::compress::gzip_writer(file))))
        } else {
            Ok(constructor(Box::new(file)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::names;
    use crate::options::{PropertiesListener, ReaderMode};

    fn factory() -> ReaderFactory {
        ReaderFactory::new(Arc::new(FormatRegistry::with_builtins()))
    }

    #[test]
    fn test_create_reader_detects() {
        let reader = factory()
            .create_reader("3\nwater\nO 0 0 0\nH 0.96 0 0\nH -0.24 0.93 0\n".as_bytes())
            .unwrap();
        assert_eq!(reader.format_name(), names::XYZ);
    }

    #[test]
    fn test_create_reader_errors() {
        let err = factory().create_reader("just some text\n".as_bytes()).err().unwrap();
        assert!(matches!(err, IoError::UnknownFormat(_)));

        let err = factory().create_reader("VjCD0100\u{4}\u{3}\u{2}\u{1}".as_bytes()).err().unwrap();
        assert!(matches!(err, IoError::NoReader(ref name) if name == names::CDX));

        let err = factory().create_reader_for("Nonexistent", "".as_bytes()).err().unwrap();
        assert!(matches!(err, IoError::UnknownFormat(_)));
    }

    #[test]
    fn test_named_reader_skips_detection() {
        let mut reader = factory().create_reader_for(names::XYZ, "".as_bytes()).unwrap();
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn test_listener_settings() {
        let mut factory = factory();
        let listener = PropertiesListener::new().with("ReaderMode", "Strict");
        factory.apply_listener(&listener).unwrap();
        assert_eq!(factory.options().mode, ReaderMode::Strict);
    }

    #[test]
    fn test_create_writer() {
        let writers = WriterFactory::new(Arc::new(FormatRegistry::with_builtins()));
        let mut out = Vec::new();
        assert!(writers.create_writer(names::SDF, &mut out).is_ok());
        let err = writers.create_writer(names::CML, &mut out).err().unwrap();
        assert!(matches!(err, IoError::NoWriter(_)));
        let err = writers.create_writer("Nonexistent", &mut out).err().unwrap();
        assert!(matches!(err, IoError::UnknownFormat(_)));
    }
}
