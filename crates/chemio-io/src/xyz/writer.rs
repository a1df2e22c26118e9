//! XYZ file writer

use std::io::Write;

use chemio_mol::Molecule;

use crate::error::IoResult;
use crate::traits::MoleculeWriter;

/// XYZ file writer; each molecule becomes one frame
pub struct XyzWriter<W> {
    writer: W,
}

impl<W: Write> XyzWriter<W> {
    pub fn new(writer: W) -> Self {
        XyzWriter { writer }
    }

    fn write_frame(&mut self, mol: &Molecule) -> IoResult<()> {
        writeln!(self.writer, "{}", mol.atom_count())?;
        // the comment line holds a single line of text
        writeln!(self.writer, "{}", mol.title().lines().next().unwrap_or_default())?;

        for atom in mol.atoms() {
            let coord = atom.position().unwrap_or_default();
            let symbol = if atom.is_pseudo() { "X" } else { atom.element.symbol() };
            writeln!(
                self.writer,
                "{:2}  {:14.8}  {:14.8}  {:14.8}",
                symbol, coord.x, coord.y, coord.z
            )?;
        }
        Ok(())
    }
}

impl<W: Write> MoleculeWriter for XyzWriter<W> {
    fn write(&mut self, mol: &Molecule) -> IoResult<()> {
        self.write_frame(mol)
    }

    fn flush(&mut self) -> IoResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MoleculeReader;
    use crate::xyz::XyzReader;
    use chemio_mol::{Atom, MoleculeDraft};
    use lin_alg::f32::Vec3;

    fn water() -> Molecule {
        let mut draft = MoleculeDraft::new("water");
        draft.add_atom(Atom::from_symbol("O").with_point3d(Vec3::new(0.0, 0.0, 0.0)));
        draft.add_atom(Atom::from_symbol("H").with_point3d(Vec3::new(0.96, 0.0, 0.0)));
        draft.add_atom(Atom::from_symbol("H").with_point3d(Vec3::new(-0.24, 0.93, 0.0)));
        draft.finalize().unwrap()
    }

    #[test]
    fn test_write_xyz() {
        let mut output = Vec::new();
        XyzWriter::new(&mut output).write(&water()).unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "3");
        assert_eq!(lines[1], "water");
        assert!(lines[2].starts_with("O "));
        assert!(lines[3].starts_with("H "));
    }

    #[test]
    fn test_roundtrip() {
        let mol = water();
        let mut output = Vec::new();
        {
            let mut writer = XyzWriter::new(&mut output);
            writer.write_all(&[mol.clone(), mol.clone()]).unwrap();
        }

        let parsed = XyzReader::new(output.as_slice()).read_all().unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].atom_count(), mol.atom_count());
        assert_eq!(parsed[1].title(), "water");
    }
}
