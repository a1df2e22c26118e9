//! Reader and writer traits for structure formats
//!
//! Readers own their input for their whole lifetime; dropping a reader
//! closes the stream, including after a failed read.

use chemio_mol::Molecule;

use crate::error::{IoError, IoResult};

/// Trait for reading molecular structures from a source
pub trait MoleculeReader {
    /// Name of the format this reader parses
    fn format_name(&self) -> &'static str;

    /// Read the next record
    ///
    /// Returns `Ok(None)` once the input is exhausted; an empty input
    /// yields `Ok(None)` on the first call. After an error the reader
    /// yields no further records.
    fn read_next(&mut self) -> IoResult<Option<Molecule>>;

    /// Read a single molecule, failing with [`IoError::EmptyFile`] when
    /// there is none
    fn read(&mut self) -> IoResult<Molecule> {
        self.read_next()?.ok_or(IoError::EmptyFile)
    }

    /// Read all remaining records
    fn read_all(&mut self) -> IoResult<Vec<Molecule>> {
        let mut molecules = Vec::new();
        while let Some(mol) = self.read_next()? {
            molecules.push(mol);
        }
        Ok(molecules)
    }
}

/// Trait for writing molecular structures to a destination
pub trait MoleculeWriter {
    /// Write a single molecule to the destination
    fn write(&mut self, mol: &Molecule) -> IoResult<()>;

    /// Write multiple molecules to the destination
    fn write_all(&mut self, molecules: &[Molecule]) -> IoResult<()> {
        for mol in molecules {
            self.write(mol)?;
        }
        Ok(())
    }

    /// Flush any buffered data
    fn flush(&mut self) -> IoResult<()>;
}
