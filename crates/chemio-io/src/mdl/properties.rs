//! V2000 properties block (`M  CHG`, `A  `, `M  STY`, ...)
//!
//! Lines are collected while reading up to `M  END` and applied to the
//! draft afterwards: charge and radical lines supersede the atom block, and
//! Sgroup lines may reference groups whose `STY` line comes later.

use std::io::BufRead;

use chemio_mol::{
    AtomIndex, BondIndex, MoleculeDraft, Radical, Sgroup, SgroupBracket, SgroupConnectivity,
    SgroupType,
};
use indexmap::IndexMap;

use crate::error::IoResult;
use crate::field::{self, LineReader};
use crate::options::ReaderOptions;

/// One atom-keyed value from a property line
#[derive(Debug, Clone)]
struct AtomEntry<T> {
    line: usize,
    atom: u32,
    value: T,
}

/// Sgroup property lines, keyed by the Sgroup number used in the file
#[derive(Debug, Clone)]
enum SgroupLine {
    Kind(SgroupType),
    Subtype(String),
    Atoms(Vec<u32>),
    Bonds(Vec<u32>),
    Label(String),
    Connectivity(SgroupConnectivity),
    Bracket(SgroupBracket),
    Parent(u32),
    FieldName(String),
    Data(String),
}

/// Collected properties of one connection table
#[derive(Debug, Default)]
pub(crate) struct PropertyBlock {
    charges: Vec<AtomEntry<i32>>,
    radicals: Vec<AtomEntry<i32>>,
    isotopes: Vec<AtomEntry<i32>>,
    aliases: Vec<AtomEntry<String>>,
    values: Vec<AtomEntry<String>>,
    sgroups: Vec<(usize, u32, SgroupLine)>,
}

/// Whitespace tokens following the 6-character tag of an `M  XXX` line
fn tokens(line: &str) -> Vec<&str> {
    field::column(line, 6, line.len()).split_whitespace().collect()
}

/// Sgroup number at columns 8-10 and free text from column 12
fn indexed_text(line: &str) -> Option<(u32, String)> {
    let index = field::count(line, 6, 4)? as u32;
    let text = field::column(line, 11, line.len()).trim_end().to_string();
    Some((index, text))
}

impl PropertyBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one properties-block line; `lines` supplies continuation
    /// lines of alias and group-abbreviation entries
    pub fn read_line<R: BufRead>(
        &mut self,
        line: &str,
        line_number: usize,
        lines: &mut LineReader<R>,
        options: &ReaderOptions,
    ) -> IoResult<()> {
        let mode = options.mode;
        let tag = field::column(line, 0, 6);
        match tag {
            "M  CHG" | "M  RAD" | "M  ISO" => {
                let pairs = self.read_pairs(line, line_number, options)?;
                let target = match tag {
                    "M  CHG" => &mut self.charges,
                    "M  RAD" => &mut self.radicals,
                    _ => &mut self.isotopes,
                };
                target.extend(pairs.into_iter().map(|(atom, value)| AtomEntry {
                    line: line_number,
                    atom,
                    value,
                }));
            }
            "M  STY" | "M  SST" | "M  SCN" | "M  SPL" | "M  SLB" => {
                self.read_sgroup_pairs(tag, line, line_number, options)?;
            }
            "M  SAL" | "M  SBL" => {
                let numbers: Vec<u32> = tokens(line)
                    .iter()
                    .filter_map(|t| t.parse().ok())
                    .collect();
                match numbers.as_slice() {
                    [index, count, members @ ..] if *count as usize == members.len() => {
                        let members = members.to_vec();
                        let entry = if tag == "M  SAL" {
                            SgroupLine::Atoms(members)
                        } else {
                            SgroupLine::Bonds(members)
                        };
                        self.sgroups.push((line_number, *index, entry));
                    }
                    _ => field::tolerate(mode, line_number, format!("malformed '{}' line", tag))?,
                }
            }
            "M  SMT" | "M  SDT" | "M  SED" => match indexed_text(line) {
                Some((index, text)) => {
                    let entry = match tag {
                        "M  SMT" => SgroupLine::Label(text.trim().to_string()),
                        // field name occupies the first 30 columns of the text
                        "M  SDT" => SgroupLine::FieldName(
                            field::column(&text, 0, 30).trim().to_string(),
                        ),
                        _ => SgroupLine::Data(text),
                    };
                    self.sgroups.push((line_number, index, entry));
                }
                None => field::tolerate(mode, line_number, format!("malformed '{}' line", tag))?,
            },
            "M  SDI" => {
                let fields = tokens(line);
                let parsed: Option<Vec<f32>> =
                    fields.iter().skip(2).map(|t| t.parse().ok()).collect();
                match (fields.first().and_then(|t| t.parse::<u32>().ok()), parsed) {
                    (Some(index), Some(xy)) if xy.len() == 4 => {
                        let bracket = SgroupBracket {
                            first: [xy[0], xy[1]],
                            second: [xy[2], xy[3]],
                        };
                        self.sgroups.push((line_number, index, SgroupLine::Bracket(bracket)));
                    }
                    _ => field::tolerate(mode, line_number, "malformed 'M  SDI' line")?,
                }
            }
            _ if line.starts_with("A  ") => {
                let atom = field::count(line, 3, 3);
                let text = lines.expect_line("alias text")?;
                match atom {
                    Some(atom) => self.aliases.push(AtomEntry {
                        line: line_number,
                        atom: atom as u32,
                        value: text.trim().to_string(),
                    }),
                    None => field::tolerate(mode, line_number, "malformed alias line")?,
                }
            }
            _ if line.starts_with("V  ") => match field::count(line, 3, 3) {
                Some(atom) => self.values.push(AtomEntry {
                    line: line_number,
                    atom: atom as u32,
                    value: field::column(line, 7, line.len()).trim_end().to_string(),
                }),
                None => field::tolerate(mode, line_number, "malformed atom value line")?,
            },
            _ if line.starts_with("G  ") => {
                // group abbreviation text follows on its own line
                lines.expect_line("group abbreviation")?;
            }
            _ if line.starts_with("S  SKP") => {
                let skip = field::count(line, 6, 3).unwrap_or(0);
                for _ in 0..skip {
                    lines.expect_line("skipped property line")?;
                }
            }
            _ => {
                log::debug!("line {}: ignoring property line '{}'", line_number, line.trim_end());
            }
        }
        Ok(())
    }

    /// `M  XXXnn8 aaa vvv ...` pairs of atom number and value
    fn read_pairs(
        &self,
        line: &str,
        line_number: usize,
        options: &ReaderOptions,
    ) -> IoResult<Vec<(u32, i32)>> {
        let fields = tokens(line);
        let declared = fields.first().and_then(|t| t.parse::<usize>().ok());
        let values: Vec<i32> = fields.iter().skip(1).filter_map(|t| t.parse().ok()).collect();
        let pairs: Vec<(u32, i32)> = values
            .chunks_exact(2)
            .filter_map(|pair| u32::try_from(pair[0]).ok().map(|atom| (atom, pair[1])))
            .collect();

        match declared {
            Some(n) if n == pairs.len() && values.len() == 2 * n => Ok(pairs),
            Some(n) => {
                field::tolerate(
                    options.mode,
                    line_number,
                    format!("property line declares {} entries but holds {}", n, pairs.len()),
                )?;
                Ok(pairs)
            }
            None => {
                field::tolerate(options.mode, line_number, "missing entry count")?;
                Ok(Vec::new())
            }
        }
    }

    fn read_sgroup_pairs(
        &mut self,
        tag: &str,
        line: &str,
        line_number: usize,
        options: &ReaderOptions,
    ) -> IoResult<()> {
        let mode = options.mode;
        let fields = tokens(line);
        let declared = fields.first().and_then(|t| t.parse::<usize>().ok());
        let pairs: Vec<(&str, &str)> = fields[1.min(fields.len())..]
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect();
        if declared != Some(pairs.len()) {
            field::tolerate(mode, line_number, format!("malformed '{}' line", tag))?;
        }

        for (index, value) in pairs {
            let Ok(index) = index.parse::<u32>() else {
                field::tolerate(mode, line_number, format!("invalid Sgroup number '{}'", index))?;
                continue;
            };
            let entry = match tag {
                "M  STY" => match value.parse::<SgroupType>() {
                    Ok(kind) => SgroupLine::Kind(kind),
                    Err(reason) => {
                        field::tolerate(mode, line_number, reason)?;
                        continue;
                    }
                },
                "M  SST" => SgroupLine::Subtype(value.to_string()),
                "M  SCN" => match SgroupConnectivity::from_code(value) {
                    Some(connectivity) => SgroupLine::Connectivity(connectivity),
                    None => {
                        field::tolerate(mode, line_number, format!("invalid connectivity '{}'", value))?;
                        continue;
                    }
                },
                "M  SPL" => match value.parse() {
                    Ok(parent) => SgroupLine::Parent(parent),
                    Err(_) => {
                        field::tolerate(mode, line_number, format!("invalid parent '{}'", value))?;
                        continue;
                    }
                },
                // unique label numbers carry no information once groups are read
                _ => continue,
            };
            self.sgroups.push((line_number, index, entry));
        }
        Ok(())
    }

    /// Apply the collected lines to a draft
    ///
    /// `bond_map` maps 1-based file bond numbers to the bonds actually
    /// added; relaxed readers may have dropped some.
    pub fn apply(
        self,
        draft: &mut MoleculeDraft,
        bond_map: &[Option<BondIndex>],
        options: &ReaderOptions,
    ) -> IoResult<()> {
        let mode = options.mode;
        let n_atoms = draft.atom_count();
        let atom_index = |atom: u32, line: usize| -> IoResult<Option<AtomIndex>> {
            match AtomIndex::from_one_based(atom).filter(|a| a.as_usize() < n_atoms) {
                Some(index) => Ok(Some(index)),
                None => {
                    field::tolerate(
                        mode,
                        line,
                        format!("atom number {} out of range 1..={}", atom, n_atoms),
                    )?;
                    Ok(None)
                }
            }
        };

        if !self.charges.is_empty() || !self.radicals.is_empty() {
            for atom in draft.atoms_mut() {
                atom.formal_charge = 0;
                atom.radical = Radical::None;
            }
        }

        for entry in self.charges {
            let Some(index) = atom_index(entry.atom, entry.line)? else { continue };
            let charge = match i8::try_from(entry.value) {
                Ok(c) if (-15..=15).contains(&c) => c,
                _ => {
                    field::tolerate(mode, entry.line, format!("charge {} out of range", entry.value))?;
                    continue;
                }
            };
            if let Some(atom) = draft.atom_mut(index) {
                atom.formal_charge = charge;
            }
        }

        for entry in self.radicals {
            let Some(index) = atom_index(entry.atom, entry.line)? else { continue };
            let Some(radical) = Radical::from_mdl(entry.value) else {
                field::tolerate(mode, entry.line, format!("invalid radical {}", entry.value))?;
                continue;
            };
            if let Some(atom) = draft.atom_mut(index) {
                atom.radical = radical;
            }
        }

        for entry in self.isotopes {
            let Some(index) = atom_index(entry.atom, entry.line)? else { continue };
            let Ok(mass) = u16::try_from(entry.value) else {
                field::tolerate(mode, entry.line, format!("invalid mass number {}", entry.value))?;
                continue;
            };
            if let Some(atom) = draft.atom_mut(index) {
                atom.mass_number = (mass > 0).then_some(mass);
            }
        }

        for entry in self.aliases {
            let Some(index) = atom_index(entry.atom, entry.line)? else { continue };
            if let Some(atom) = draft.atom_mut(index) {
                atom.label = Some(entry.value);
            }
        }

        for entry in self.values {
            let Some(index) = atom_index(entry.atom, entry.line)? else { continue };
            if let Some(atom) = draft.atom_mut(index) {
                atom.value = Some(entry.value);
            }
        }

        apply_sgroups(self.sgroups, draft, bond_map, options)
    }
}

fn apply_sgroups(
    lines: Vec<(usize, u32, SgroupLine)>,
    draft: &mut MoleculeDraft,
    bond_map: &[Option<BondIndex>],
    options: &ReaderOptions,
) -> IoResult<()> {
    let mode = options.mode;

    // first pass: every STY line defines a group, in file order
    let mut groups: IndexMap<u32, (usize, Sgroup)> = IndexMap::new();
    for (line, index, entry) in &lines {
        if let SgroupLine::Kind(kind) = entry {
            if groups.contains_key(index) {
                field::tolerate(mode, *line, format!("Sgroup {} defined twice", index))?;
                continue;
            }
            groups.insert(*index, (*line, Sgroup::new(*kind)));
        }
    }

    let n_atoms = draft.atom_count();
    let mut parents: Vec<(usize, u32, u32)> = Vec::new();
    for (line, index, entry) in lines {
        if matches!(entry, SgroupLine::Kind(_)) {
            continue;
        }
        let Some((defined_at, group)) = groups.get_mut(&index) else {
            field::tolerate(mode, line, format!("Sgroup {} is not defined", index))?;
            continue;
        };
        if line < *defined_at {
            field::tolerate(
                mode,
                line,
                format!("Sgroup {} referenced before its type is given", index),
            )?;
        }

        match entry {
            SgroupLine::Kind(_) => {}
            SgroupLine::Subtype(subtype) => group.subtype = Some(subtype),
            SgroupLine::Label(label) => group.label = Some(label),
            SgroupLine::Connectivity(connectivity) => group.connectivity = Some(connectivity),
            SgroupLine::Bracket(bracket) => group.brackets.push(bracket),
            SgroupLine::FieldName(name) => group.field_name = Some(name),
            SgroupLine::Data(text) => match group.data.as_mut() {
                Some(data) => data.push_str(&text),
                None => group.data = Some(text),
            },
            SgroupLine::Atoms(atoms) => {
                for atom in atoms {
                    match AtomIndex::from_one_based(atom).filter(|a| a.as_usize() < n_atoms) {
                        Some(a) => group.atoms.push(a),
                        None => field::tolerate(
                            mode,
                            line,
                            format!("Sgroup {} references missing atom {}", index, atom),
                        )?,
                    }
                }
            }
            SgroupLine::Bonds(bonds) => {
                for bond in bonds {
                    let mapped = (bond as usize)
                        .checked_sub(1)
                        .and_then(|i| bond_map.get(i).copied().flatten());
                    match mapped {
                        Some(b) => group.bonds.push(b),
                        None => field::tolerate(
                            mode,
                            line,
                            format!("Sgroup {} references missing bond {}", index, bond),
                        )?,
                    }
                }
            }
            SgroupLine::Parent(parent) => parents.push((line, index, parent)),
        }
    }

    for (line, index, parent) in parents {
        match groups.get_index_of(&parent) {
            Some(position) if parent != index => {
                if let Some((_, group)) = groups.get_mut(&index) {
                    group.parent = Some(position);
                }
            }
            _ => field::tolerate(
                mode,
                line,
                format!("Sgroup {} has invalid parent {}", index, parent),
            )?,
        }
    }

    for (_, (_, group)) in groups {
        draft.add_sgroup(group)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemio_mol::{Atom, BondOrder};
    use std::io::Cursor;

    fn draft(n_atoms: usize) -> MoleculeDraft {
        let mut draft = MoleculeDraft::new("t");
        for _ in 0..n_atoms {
            draft.add_atom(Atom::from_symbol("C"));
        }
        draft
    }

    fn read(block: &str, options: &ReaderOptions) -> IoResult<PropertyBlock> {
        let mut lines = LineReader::new(Cursor::new(block.as_bytes()));
        let mut props = PropertyBlock::new();
        while let Some(line) = lines.next_line()? {
            let n = lines.line_number();
            props.read_line(&line, n, &mut lines, options)?;
        }
        Ok(props)
    }

    #[test]
    fn test_charges_supersede_atom_block() {
        let options = ReaderOptions::default();
        let mut mol = draft(3);
        mol.atom_mut(AtomIndex(2)).unwrap().formal_charge = 2;

        let props = read("M  CHG  2   1   1   2  -1\nM  ISO  1   3  13\n", &options).unwrap();
        props.apply(&mut mol, &[], &options).unwrap();

        assert_eq!(mol.atom(AtomIndex(0)).unwrap().formal_charge, 1);
        assert_eq!(mol.atom(AtomIndex(1)).unwrap().formal_charge, -1);
        assert_eq!(mol.atom(AtomIndex(2)).unwrap().formal_charge, 0);
        assert_eq!(mol.atom(AtomIndex(2)).unwrap().mass_number, Some(13));
    }

    #[test]
    fn test_alias_and_value() {
        let options = ReaderOptions::default();
        let mut mol = draft(2);
        let props = read("A    2\nCOOH\nV    1 some value\n", &options).unwrap();
        props.apply(&mut mol, &[], &options).unwrap();
        assert_eq!(mol.atom(AtomIndex(1)).unwrap().label.as_deref(), Some("COOH"));
        assert_eq!(mol.atom(AtomIndex(0)).unwrap().value.as_deref(), Some("some value"));
    }

    #[test]
    fn test_out_of_range_atom() {
        let block = "M  CHG  1   9   1\n";
        let strict = ReaderOptions::strict();
        let props = read(block, &strict).unwrap();
        assert!(props.apply(&mut draft(2), &[], &strict).is_err());

        let relaxed = ReaderOptions::default();
        let props = read(block, &relaxed).unwrap();
        let mut mol = draft(2);
        props.apply(&mut mol, &[], &relaxed).unwrap();
        assert!(mol.atoms_mut().all(|a| a.formal_charge == 0));
    }

    #[test]
    fn test_count_mismatch() {
        let block = "M  CHG  2   1   1\n";
        assert!(read(block, &ReaderOptions::strict()).is_err());
        assert!(read(block, &ReaderOptions::default()).is_ok());
    }

    #[test]
    fn test_sgroups() {
        let options = ReaderOptions::default();
        let mut mol = draft(3);
        let b0 = mol.add_bond(AtomIndex(0), AtomIndex(1), BondOrder::Single).unwrap();
        let b1 = mol.add_bond(AtomIndex(1), AtomIndex(2), BondOrder::Single).unwrap();
        let block = "\
M  STY  2   1 SRU   2 DAT
M  SAL   1  2   1   2
M  SBL   1  1   2
M  SMT   1 n
M  SCN  1   1 HT
M  SDI   1  4    1.0000    2.0000    1.0000    3.0000
M  SAL   2  1   3
M  SDT   2 MP
M  SED   2 123-125
M  SPL  1   2   1
";
        let props = read(block, &options).unwrap();
        props.apply(&mut mol, &[Some(b0), Some(b1)], &options).unwrap();

        let mol = mol.finalize().unwrap();
        let groups = mol.sgroups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].kind, SgroupType::RepeatUnit);
        assert_eq!(groups[0].atoms, vec![AtomIndex(0), AtomIndex(1)]);
        assert_eq!(groups[0].bonds, vec![b1]);
        assert_eq!(groups[0].label.as_deref(), Some("n"));
        assert_eq!(groups[0].connectivity, Some(SgroupConnectivity::HeadToTail));
        assert_eq!(groups[0].brackets.len(), 1);
        assert_eq!(groups[1].field_name.as_deref(), Some("MP"));
        assert_eq!(groups[1].data.as_deref(), Some("123-125"));
        assert_eq!(groups[1].parent, Some(0));
    }

    #[test]
    fn test_sgroup_reference_before_definition() {
        let block = "M  SAL   1  1   1\nM  STY  1   1 SUP\n";
        let strict = ReaderOptions::strict();
        let props = read(block, &strict).unwrap();
        assert!(props.apply(&mut draft(1), &[], &strict).is_err());

        let relaxed = ReaderOptions::default();
        let props = read(block, &relaxed).unwrap();
        let mut mol = draft(1);
        props.apply(&mut mol, &[], &relaxed).unwrap();
        assert_eq!(mol.sgroup_count(), 1);
    }

    #[test]
    fn test_undefined_sgroup_dropped() {
        let relaxed = ReaderOptions::default();
        let props = read("M  SAL   4  1   1\n", &relaxed).unwrap();
        let mut mol = draft(1);
        props.apply(&mut mol, &[], &relaxed).unwrap();
        assert_eq!(mol.sgroup_count(), 0);
    }
}
