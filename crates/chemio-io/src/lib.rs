//! Chemical file format detection, reading and writing
//!
//! This crate identifies chemical structure files from their content and
//! parses them into [`chemio_mol::Molecule`]s:
//!
//! - **SDF/MOL** - MDL Structure-data files and Molfiles (V2000 and V3000)
//! - **CML** - Chemical Markup Language
//! - **PDB** - Protein Data Bank coordinate entries
//! - **XYZ** - Simple XYZ coordinate format
//!
//! MDL RXN and ChemDraw CDX files are recognized but have no reader.
//!
//! # Quick Start
//!
//! ```no_run
//! use chemio_io::{read_file, write_str, formats::names};
//! use std::path::Path;
//!
//! // Detect the format from the content (gzip is handled transparently)
//! let molecules = read_file(Path::new("ligands.sdf.gz")).unwrap();
//!
//! // Write the first one as a V2000 Molfile
//! let text = write_str(&molecules[0], names::MDL_V2000).unwrap();
//! ```
//!
//! # Detection and readers
//!
//! A [`FormatRegistry`] holds [`FormatDescriptor`]s; each may carry a
//! matcher over the leading lines of an input, a reader and a writer.
//! [`FormatRegistry::guess_format`] peeks a bounded prefix and returns the
//! input rewound to its first byte, so the chosen reader sees everything.
//! [`ReaderFactory`] combines both steps.
//!
//! Readers run in one of two [`ReaderMode`]s: strict readers fail on the
//! first recoverable violation, relaxed readers (the default) log it and
//! carry on with a fallback value.
//!
//! # Format-specific modules
//!
//! - [`mdl`] - Molfile / SDF reader and V2000 writer
//! - [`cml`] - CML reader
//! - [`pdb`] - PDB reader with ATOM/HETATM/CONECT records
//! - [`xyz`] - XYZ reader and writer

pub mod cml;
pub mod compress;
pub mod detect;
pub mod error;
pub mod factory;
pub mod field;
pub mod format;
pub mod formats;
pub mod mdl;
pub mod options;
pub mod pdb;
pub mod registry;
pub mod traits;
pub mod xyz;

// Re-exports
pub use detect::PeekedInput;
pub use error::{IoError, IoResult};
pub use factory::{ReaderFactory, WriterFactory};
pub use format::{Capabilities, FormatDescriptor, MatchResult};
pub use options::{ReaderMode, ReaderOptions, SettingListener};
pub use registry::FormatRegistry;
pub use traits::{MoleculeReader, MoleculeWriter};

use std::path::Path;
use std::sync::{Arc, OnceLock};

use chemio_mol::Molecule;

/// Shared registry of the built-in formats
pub fn builtin_registry() -> Arc<FormatRegistry> {
    static REGISTRY: OnceLock<Arc<FormatRegistry>> = OnceLock::new();
    REGISTRY
        .get_or_init(|| Arc::new(FormatRegistry::with_builtins()))
        .clone()
}

/// Read all molecules from a string, detecting the format
///
/// Blank input yields no molecules.
pub fn read_str(content: &str) -> IoResult<Vec<Molecule>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    ReaderFactory::new(builtin_registry())
        .create_reader(content.as_bytes())?
        .read_all()
}

/// Read all molecules from a file, detecting the format
///
/// gzip content is recognized from its magic bytes. When the content
/// matches no format, the file extension decides.
pub fn read_file(path: &Path) -> IoResult<Vec<Molecule>> {
    read_file_with(path, ReaderOptions::default())
}

/// Read all molecules from a file with explicit reader options
pub fn read_file_with(path: &Path, options: ReaderOptions) -> IoResult<Vec<Molecule>> {
    ReaderFactory::with_options(builtin_registry(), options)
        .create_file_reader(path)?
        .read_all()
}

/// Write a molecule in a named format
pub fn write_str(mol: &Molecule, format_name: &str) -> IoResult<String> {
    let mut buffer = Vec::new();
    {
        let mut writer = WriterFactory::new(builtin_registry()).create_writer(format_name, &mut buffer)?;
        writer.write(mol)?;
        writer.flush()?;
    }
    String::from_utf8(buffer)
        .map_err(|e| IoError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Write molecules to a file, choosing the format from the extension
pub fn write_file(path: &Path, molecules: &[Molecule]) -> IoResult<()> {
    let mut writer = WriterFactory::new(builtin_registry()).create_file_writer(path)?;
    writer.write_all(molecules)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_is_shared() {
        let a = builtin_registry();
        let b = builtin_registry();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), 8);
    }

    #[test]
    fn test_read_str_empty() {
        assert!(read_str("").unwrap().is_empty());
        assert!(read_str("\n  \n").unwrap().is_empty());
    }

    #[test]
    fn test_read_str_xyz() {
        let mols = read_str("1\nhelium\nHe 0.0 0.0 0.0\n").unwrap();
        assert_eq!(mols.len(), 1);
        assert_eq!(mols[0].title(), "helium");
    }
}
