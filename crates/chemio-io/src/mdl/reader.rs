//! Molfile / SD file reader

use std::io::BufRead;

use chemio_mol::{Molecule, MoleculeDraft};

use super::ctab::{self, CountsLine, CtabVersion};
use super::properties::PropertyBlock;
use super::{v3000, END_LINE, RECORD_SEPARATOR};
use crate::error::{IoError, IoResult};
use crate::field::{self, LineReader};
use crate::formats::names;
use crate::options::ReaderOptions;
use crate::traits::MoleculeReader;

/// Position of an [`MdlReader`] within the current record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Header,
    CountsLine,
    AtomBlock,
    BondBlock,
    PropertiesBlock,
    /// SD file data items after `M  END`
    DataItems,
    /// Input exhausted
    Done,
    /// A record failed to parse; no further records are returned
    Failed,
}

/// MDL Molfile (V2000 and V3000) and SD file reader
pub struct MdlReader<R> {
    lines: LineReader<R>,
    options: ReaderOptions,
    state: ReaderState,
    format_name: &'static str,
}

impl<R: BufRead> MdlReader<R> {
    /// Create a reader with default (relaxed) options
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ReaderOptions::default())
    }

    pub fn with_options(reader: R, options: ReaderOptions) -> Self {
        MdlReader {
            lines: LineReader::new(reader),
            options,
            state: ReaderState::Header,
            format_name: names::MDL_V2000,
        }
    }

    /// Report a different format name (SDF, V3000) from [`MoleculeReader::format_name`]
    pub fn named(mut self, format_name: &'static str) -> Self {
        self.format_name = format_name;
        self
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Line number of the last line consumed
    pub fn line_number(&self) -> usize {
        self.lines.line_number()
    }

    /// Read the three header lines, or detect a headerless connection table
    ///
    /// Only the first line of the input may start a headerless table; later
    /// records always carry a header. Returns `None` when only separators or
    /// blank lines remain.
    fn read_header(&mut self) -> IoResult<Option<(MoleculeDraft, String)>> {
        let first = loop {
            match self.lines.next_line()? {
                None => return Ok(None),
                Some(line) if line.starts_with(RECORD_SEPARATOR) => continue,
                Some(line) => break line,
            }
        };

        if self.lines.line_number() == 1 && ctab::counts_line_version(&first).is_some() {
            let atom_follows = self.lines.peek()?.is_some_and(ctab::looks_like_atom_line);
            if atom_follows {
                log::debug!(
                    "line {}: connection table without header",
                    self.lines.line_number()
                );
                return Ok(Some((MoleculeDraft::new(""), first)));
            }
        }

        let mut header = vec![first];
        while header.len() < 3 {
            match self.lines.next_line()? {
                Some(line) => header.push(line),
                None if header.iter().all(|l| l.trim().is_empty()) => return Ok(None),
                None => {
                    return Err(IoError::parse(
                        self.lines.line_number() + 1,
                        "expected header line, got end of file",
                    ))
                }
            }
        }

        self.state = ReaderState::CountsLine;
        let counts = match self.lines.next_line()? {
            Some(line) => line,
            None if header.iter().all(|l| l.trim().is_empty()) => return Ok(None),
            None => {
                return Err(IoError::parse(
                    self.lines.line_number() + 1,
                    "expected counts line, got end of file",
                ))
            }
        };

        let mut header = header.into_iter();
        let mut draft = MoleculeDraft::new(header.next().unwrap_or_default().trim());
        draft.program_line = header.next().unwrap_or_default();
        draft.comment = header.next().unwrap_or_default();
        Ok(Some((draft, counts)))
    }

    fn read_v2000(
        &mut self,
        draft: &mut MoleculeDraft,
        counts: &CountsLine,
        declared: Option<u8>,
    ) -> IoResult<()> {
        self.state = ReaderState::AtomBlock;
        let mut atoms = Vec::with_capacity(counts.atoms);
        let mut points = Vec::with_capacity(counts.atoms);
        for i in 0..counts.atoms {
            let line = self.lines.expect_line(&format!("atom {}", i + 1))?;
            let (atom, point) =
                ctab::parse_atom_line(&line, self.lines.line_number(), &self.options)?;
            atoms.push(atom);
            points.push(point);
        }
        super::assign_coordinates(&mut atoms, &points, declared, &self.options);
        for atom in atoms {
            draft.add_atom(atom);
        }

        self.state = ReaderState::BondBlock;
        let mut bond_map = Vec::with_capacity(counts.bonds);
        for i in 0..counts.bonds {
            let line = self.lines.expect_line(&format!("bond {}", i + 1))?;
            let line_number = self.lines.line_number();
            let bond = match ctab::parse_bond_line(&line, line_number, &self.options)? {
                Some(b) => super::add_bond(
                    draft,
                    b.first as u32,
                    b.second as u32,
                    b.order,
                    b.stereo,
                    &self.options,
                    line_number,
                )?,
                None => None,
            };
            bond_map.push(bond);
        }

        self.state = ReaderState::PropertiesBlock;
        let mut properties = PropertyBlock::new();
        loop {
            let ends = match self.lines.peek()? {
                None => true,
                Some(next) => next.starts_with(RECORD_SEPARATOR) || super::is_data_header(next),
            };
            if ends {
                log::debug!(
                    "line {}: connection table ends without '{}'",
                    self.lines.line_number(),
                    END_LINE
                );
                break;
            }
            let Some(line) = self.lines.next_line()? else { break };
            if line.starts_with(END_LINE) {
                break;
            }
            let line_number = self.lines.line_number();
            properties.read_line(&line, line_number, &mut self.lines, &self.options)?;
        }
        properties.apply(draft, &bond_map, &self.options)
    }

    /// Data items up to the record separator or end of input
    fn read_data_items(&mut self, draft: &mut MoleculeDraft) -> IoResult<()> {
        self.state = ReaderState::DataItems;
        while let Some(line) = self.lines.next_line()? {
            if line.starts_with(RECORD_SEPARATOR) {
                return Ok(());
            }
            let line_number = self.lines.line_number();
            if super::is_data_header(&line) {
                let mut value: Vec<String> = Vec::new();
                while let Some(next) = self.lines.next_line()? {
                    if next.trim().is_empty() {
                        break;
                    }
                    value.push(next);
                }
                match data_item_name(&line) {
                    Some(name) => draft.set_property(name, value.join("\n")),
                    None => field::tolerate(
                        self.options.mode,
                        line_number,
                        format!("data header '{}' has no field name", line),
                    )?,
                }
            } else if !line.trim().is_empty() {
                field::tolerate(
                    self.options.mode,
                    line_number,
                    format!("unexpected line '{}' after connection table", line.trim_end()),
                )?;
            }
        }
        Ok(())
    }

    fn parse_molecule(&mut self) -> IoResult<Option<Molecule>> {
        self.state = ReaderState::Header;
        let Some((mut draft, counts_line)) = self.read_header()? else {
            return Ok(None);
        };

        self.state = ReaderState::CountsLine;
        let counts = ctab::parse_counts_line(&counts_line, self.lines.line_number())?;
        let declared = super::declared_dimension(&draft.program_line);

        match counts.version {
            CtabVersion::V2000 => self.read_v2000(&mut draft, &counts, declared)?,
            CtabVersion::V3000 => {
                self.state = ReaderState::AtomBlock;
                v3000::read_ctab(&mut self.lines, &mut draft, declared, &self.options)?;
            }
        }

        self.read_data_items(&mut draft)?;
        let molecule = draft.finalize_with(self.options.add_stereo_elements)?;
        self.state = ReaderState::Header;
        Ok(Some(molecule))
    }
}

/// Field name of a `> <NAME>` data header
fn data_item_name(header: &str) -> Option<String> {
    let start = header.find('<')? + 1;
    let len = header[start..].find('>')?;
    let name = header[start..start + len].trim();
    (!name.is_empty()).then(|| name.to_string())
}

impl<R: BufRead> MoleculeReader for MdlReader<R> {
    fn format_name(&self) -> &'static str {
        self.format_name
    }

    fn read_next(&mut self) -> IoResult<Option<Molecule>> {
        if matches!(self.state, ReaderState::Done | ReaderState::Failed) {
            return Ok(None);
        }
        match self.parse_molecule() {
            Ok(Some(mol)) => Ok(Some(mol)),
            Ok(None) => {
                self.state = ReaderState::Done;
                Ok(None)
            }
            Err(e) => {
                log::debug!("{} reader failed in state {:?}: {}", self.format_name, self.state, e);
                self.state = ReaderState::Failed;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ReaderMode;
    use chemio_mol::{AtomIndex, BondOrder, BondStereo, Element};
    use std::io::Cursor;

    const WATER: &str = "\
water
  chemio            2D

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
    0.9572    0.0000    0.0000 H   0  0  0  0  0  0  0  0  0  0  0  0
   -0.2400    0.9266    0.0000 H   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0  0  0  0
  1  3  1  0  0  0  0
M  END
";

    fn reader(text: &str, mode: ReaderMode) -> MdlReader<Cursor<&[u8]>> {
        MdlReader::with_options(
            Cursor::new(text.as_bytes()),
            ReaderOptions::default().with_mode(mode),
        )
    }

    #[test]
    fn test_read_molfile() {
        let mol = reader(WATER, ReaderMode::Strict).read().unwrap();
        assert_eq!(mol.title(), "water");
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.atom(AtomIndex(0)).unwrap().element, Element::OXYGEN);
        assert!(mol.has_2d_coordinates());
        assert_eq!(mol.implicit_hydrogen_count(), 0);
    }

    #[test]
    fn test_empty_input() {
        let mut r = reader("", ReaderMode::Strict);
        assert!(r.read_next().unwrap().is_none());
        assert_eq!(r.state(), ReaderState::Done);
        assert!(matches!(reader("\n\n", ReaderMode::Strict).read(), Err(IoError::EmptyFile)));
    }

    #[test]
    fn test_headerless_proton() {
        let text = "  1  0  0  0  0                 1\n   -0.0073   -0.5272    0.9655 H   0  3  0  0  0\n";
        for mode in [ReaderMode::Strict, ReaderMode::Relaxed] {
            let mol = reader(text, mode).read().unwrap();
            assert_eq!(mol.atom_count(), 1);
            assert_eq!(mol.bond_count(), 0);
            assert_eq!(mol.atom(AtomIndex(0)).unwrap().formal_charge, 1);
            assert!(mol.has_3d_coordinates());
        }
    }

    #[test]
    fn test_numeric_title_in_later_record() {
        let second = "\
  1  1
    0.0000    0.0000    0.0000 N   program line
comment
  1  0  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 N   0  0  0  0  0  0  0  0  0  0  0  0
M  END
$$$$
";
        let text = format!("{WATER}$$$$\n{second}");
        let mols = reader(&text, ReaderMode::Strict).read_all().unwrap();
        assert_eq!(mols.len(), 2);
        assert_eq!(mols[1].title(), "1  1");
        assert_eq!(mols[1].atom_count(), 1);
        assert_eq!(mols[1].atom(AtomIndex(0)).unwrap().element, Element::NITROGEN);
    }

    #[test]
    fn test_sdf_records_and_data() {
        let text = format!(
            "{WATER}> <ID>\nW-1\n\n> <NOTE>\n$$$$ is a price tier\nsecond line\n\n$$$$\n{WATER}$$$$\n"
        );
        let mut r = reader(&text, ReaderMode::Strict).named(names::SDF);
        let molecules = r.read_all().unwrap();
        assert_eq!(molecules.len(), 2);
        assert_eq!(molecules[0].property("ID"), Some("W-1"));
        assert_eq!(
            molecules[0].property("NOTE"),
            Some("$$$$ is a price tier\nsecond line")
        );
        assert!(molecules[1].properties().is_empty());
        assert_eq!(r.format_name(), names::SDF);
    }

    #[test]
    fn test_missing_end_line() {
        let text = WATER.replace("M  END\n", "");
        let mol = reader(&text, ReaderMode::Strict).read().unwrap();
        assert_eq!(mol.atom_count(), 3);
    }

    #[test]
    fn test_truncated_atom_block() {
        let text: String = WATER.lines().take(6).map(|l| format!("{}\n", l)).collect();
        let mut r = reader(&text, ReaderMode::Relaxed);
        assert!(r.read_next().is_err());
        assert_eq!(r.state(), ReaderState::Failed);
        assert!(r.read_next().unwrap().is_none());
    }

    #[test]
    fn test_stereo_mode() {
        let text = WATER.replace("  1  2  1  0  0  0  0", "  1  2  2  1  0  0  0");
        assert!(reader(&text, ReaderMode::Strict).read().is_err());

        let mol = reader(&text, ReaderMode::Relaxed).read().unwrap();
        let bond = mol.bonds().next().unwrap();
        assert_eq!(bond.order, BondOrder::Double);
        assert_eq!(bond.stereo, BondStereo::None);
    }

    #[test]
    fn test_out_of_range_bond() {
        let text = WATER.replace("  1  3  1  0", "  1  9  1  0");
        assert!(reader(&text, ReaderMode::Strict).read().is_err());
        assert_eq!(reader(&text, ReaderMode::Relaxed).read().unwrap().bond_count(), 1);
    }

    #[test]
    fn test_v3000_handoff() {
        let text = "\
ammonium
  chemio            2D

  0  0  0     0  0            999 V3000
M  V30 BEGIN CTAB
M  V30 COUNTS 1 0 0 0 0
M  V30 BEGIN ATOM
M  V30 1 N 0 0 0 0 CHG=1
M  V30 END ATOM
M  V30 END CTAB
M  END
";
        let mol = reader(text, ReaderMode::Strict).read().unwrap();
        assert_eq!(mol.title(), "ammonium");
        assert_eq!(mol.atom(AtomIndex(0)).unwrap().formal_charge, 1);
        assert_eq!(mol.implicit_hydrogen_count(), 4);
    }

    #[test]
    fn test_data_item_name() {
        assert_eq!(data_item_name("> <ID>").as_deref(), Some("ID"));
        assert_eq!(data_item_name(">  25  <MELTING.POINT>").as_deref(), Some("MELTING.POINT"));
        assert_eq!(data_item_name("> <>"), None);
    }
}
