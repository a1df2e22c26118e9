//! Molfile / SD file writer
//!
//! Writes V2000 connection tables. Charges, radicals and isotopes are
//! repeated in `M  CHG`/`M  RAD`/`M  ISO` lines, which readers give
//! precedence over the atom block.

use std::io::Write;

use chemio_mol::{Atom, Molecule, Radical};

use super::ctab::charge_to_code;
use super::{END_LINE, RECORD_SEPARATOR};
use crate::error::{IoError, IoResult};
use crate::field::COORDINATE_WIDTH;
use crate::traits::MoleculeWriter;

/// Largest atom or bond count a V2000 counts line can hold
const MAX_V2000_ENTRIES: usize = 999;
/// Entries per `M  CHG`-style line
const ENTRIES_PER_LINE: usize = 8;
/// Members per `M  SAL` / `M  SBL` line
const MEMBERS_PER_LINE: usize = 15;

/// MDL Molfile / SD file writer
pub struct MdlWriter<W> {
    writer: W,
    /// Append data items and `$$$$` after each record
    sdf: bool,
}

impl<W: Write> MdlWriter<W> {
    /// Writer producing bare Molfiles
    pub fn molfile(writer: W) -> Self {
        MdlWriter { writer, sdf: false }
    }

    /// Writer producing SD file records
    pub fn sdf(writer: W) -> Self {
        MdlWriter { writer, sdf: true }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_molecule(&mut self, mol: &Molecule) -> IoResult<()> {
        let n_atoms = mol.atom_count();
        let n_bonds = mol.bond_count();
        if n_atoms > MAX_V2000_ENTRIES || n_bonds > MAX_V2000_ENTRIES {
            return Err(IoError::unsupported(format!(
                "molecule too large for V2000 ({} atoms, {} bonds; max {})",
                n_atoms, n_bonds, MAX_V2000_ENTRIES
            )));
        }

        if let Some(point) = mol
            .atoms()
            .filter_map(Atom::position)
            .find(|p| [p.x, p.y, p.z].iter().any(|&v| !fits_coordinate(v)))
        {
            return Err(IoError::unsupported(format!(
                "coordinate ({}, {}, {}) does not fit a V2000 atom line",
                point.x, point.y, point.z
            )));
        }

        let title = mol.title();
        writeln!(self.writer, "{}", &title[..floor_char_boundary(title, 80)])?;
        let dimension = if mol.has_3d_coordinates() { "3D" } else { "2D" };
        writeln!(self.writer, "  chemio            {}", dimension)?;
        writeln!(self.writer, "{}", mol.comment())?;
        writeln!(
            self.writer,
            "{:3}{:3}  0  0  0  0  0  0  0  0999 V2000",
            n_atoms, n_bonds
        )?;

        for atom in mol.atoms() {
            self.write_atom(atom)?;
        }
        for bond in mol.bonds() {
            writeln!(
                self.writer,
                "{:3}{:3}{:3}{:3}  0  0  0",
                bond.begin.one_based(),
                bond.end.one_based(),
                bond.order.to_mdl(),
                bond.stereo.to_mdl()
            )?;
        }

        self.write_atom_properties(mol)?;
        self.write_sgroups(mol)?;
        writeln!(self.writer, "{}", END_LINE)?;
        Ok(())
    }

    fn write_atom(&mut self, atom: &Atom) -> IoResult<()> {
        let point = atom.position().unwrap_or_default();
        let mass_diff = match atom.mass_difference() {
            d @ -3..=4 => d,
            _ => 0,
        };
        let valence = match atom.valence {
            None => 0,
            Some(0) => 15,
            Some(v) => v.min(14),
        };
        writeln!(
            self.writer,
            "{:10.4}{:10.4}{:10.4} {:<3}{:2}{:3}{:3}{:3}  0{:3}  0  0  0{:3}  0  0",
            point.x,
            point.y,
            point.z,
            block_symbol(atom),
            mass_diff,
            charge_to_code(atom.formal_charge, atom.radical),
            atom.stereo_parity,
            atom.query_hydrogen_count,
            valence,
            atom.map_number.min(999)
        )?;
        Ok(())
    }

    /// `M  CHG`, `M  RAD`, `M  ISO`, alias and value lines
    fn write_atom_properties(&mut self, mol: &Molecule) -> IoResult<()> {
        let charges: Vec<(u32, i32)> = mol
            .atoms_indexed()
            .filter(|(_, a)| a.formal_charge != 0)
            .map(|(i, a)| (i.one_based(), a.formal_charge as i32))
            .collect();
        let radicals: Vec<(u32, i32)> = mol
            .atoms_indexed()
            .filter(|(_, a)| a.radical != Radical::None)
            .map(|(i, a)| (i.one_based(), a.radical.to_mdl() as i32))
            .collect();
        let isotopes: Vec<(u32, i32)> = mol
            .atoms_indexed()
            .filter_map(|(i, a)| a.mass_number.map(|m| (i.one_based(), m as i32)))
            .collect();

        // radicals must be restated whenever charges are, and vice versa
        self.write_pairs("CHG", &charges)?;
        self.write_pairs("RAD", &radicals)?;
        self.write_pairs("ISO", &isotopes)?;

        for (index, atom) in mol.atoms_indexed() {
            let alias = atom
                .label
                .as_deref()
                .filter(|label| !atom.is_pseudo() || *label != block_symbol(atom));
            if let Some(alias) = alias {
                writeln!(self.writer, "A  {:3}", index.one_based())?;
                writeln!(self.writer, "{}", alias)?;
            }
            if let Some(value) = &atom.value {
                writeln!(self.writer, "V  {:3} {}", index.one_based(), value)?;
            }
        }
        Ok(())
    }

    fn write_pairs(&mut self, tag: &str, entries: &[(u32, i32)]) -> IoResult<()> {
        for chunk in entries.chunks(ENTRIES_PER_LINE) {
            write!(self.writer, "M  {}{:3}", tag, chunk.len())?;
            for (atom, value) in chunk {
                write!(self.writer, " {:3} {:3}", atom, value)?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_sgroups(&mut self, mol: &Molecule) -> IoResult<()> {
        let groups = mol.sgroups();
        if groups.is_empty() {
            return Ok(());
        }

        let numbered: Vec<(usize, &chemio_mol::Sgroup)> =
            groups.iter().enumerate().map(|(i, g)| (i + 1, g)).collect();
        for chunk in numbered.chunks(ENTRIES_PER_LINE) {
            write!(self.writer, "M  STY{:3}", chunk.len())?;
            for (n, group) in chunk {
                write!(self.writer, " {:3} {}", n, group.kind.code())?;
            }
            writeln!(self.writer)?;
        }

        for &(n, group) in &numbered {
            if let Some(subtype) = &group.subtype {
                writeln!(self.writer, "M  SST  1 {:3} {}", n, subtype)?;
            }
            let atoms: Vec<u32> = group.atoms.iter().map(|a| a.one_based()).collect();
            self.write_members("SAL", n, &atoms)?;
            let bonds: Vec<u32> = group.bonds.iter().map(|b| b.one_based()).collect();
            self.write_members("SBL", n, &bonds)?;
            if let Some(label) = &group.label {
                writeln!(self.writer, "M  SMT {:3} {}", n, label)?;
            }
            if let Some(connectivity) = group.connectivity {
                writeln!(self.writer, "M  SCN  1 {:3} {}", n, connectivity.code())?;
            }
            for bracket in &group.brackets {
                writeln!(
                    self.writer,
                    "M  SDI {:3}  4 {:9.4} {:9.4} {:9.4} {:9.4}",
                    n, bracket.first[0], bracket.first[1], bracket.second[0], bracket.second[1]
                )?;
            }
            if let Some(parent) = group.parent {
                writeln!(self.writer, "M  SPL  1 {:3} {:3}", n, parent + 1)?;
            }
            if let Some(name) = &group.field_name {
                writeln!(self.writer, "M  SDT {:3} {}", n, name)?;
            }
            if let Some(data) = &group.data {
                writeln!(self.writer, "M  SED {:3} {}", n, data)?;
            }
        }
        Ok(())
    }

    fn write_members(&mut self, tag: &str, group: usize, members: &[u32]) -> IoResult<()> {
        for chunk in members.chunks(MEMBERS_PER_LINE) {
            write!(self.writer, "M  {} {:3}{:3}", tag, group, chunk.len())?;
            for member in chunk {
                write!(self.writer, " {:3}", member)?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_data_items(&mut self, mol: &Molecule) -> IoResult<()> {
        for (name, value) in mol.properties() {
            writeln!(self.writer, "> <{}>", name)?;
            writeln!(self.writer, "{}", value)?;
            writeln!(self.writer)?;
        }
        writeln!(self.writer, "{}", RECORD_SEPARATOR)?;
        Ok(())
    }
}

/// Atom-block symbol; labels too long for the 3-column field become `R`
fn block_symbol(atom: &Atom) -> &str {
    if atom.symbol.is_empty() {
        "*"
    } else if atom.symbol.len() > 3 {
        "R"
    } else {
        &atom.symbol
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

impl<W: Write> MoleculeWriter for MdlWriter<W> {
    fn write(&mut self, mol: &Molecule) -> IoResult<()> {
        self.write_molecule(mol)?;
        if self.sdf {
            self.write_data_items(mol)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> IoResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Whether `{:10.4}` keeps a coordinate within its ten columns
fn fits_coordinate(value: f32) -> bool {
    value.is_finite() && format!("{:10.4}", value).len() <= COORDINATE_WIDTH
}
