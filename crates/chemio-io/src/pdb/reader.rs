//! PDB file reader

use std::collections::VecDeque;
use std::io::BufRead;

use ahash::AHashMap;
use chemio_mol::{Atom, AtomIndex, BondOrder, Molecule, MoleculeDraft};
use lin_alg::f32::Vec3;

use crate::error::IoResult;
use crate::field::{self, LineReader};
use crate::formats::names;
use crate::options::ReaderOptions;
use crate::traits::MoleculeReader;

use super::record_name;
use super::records::{AtomRecord, ConectRecord};

/// Atom records of one model, with the line each came from
type Model = Vec<(usize, AtomRecord)>;

/// PDB file reader
///
/// An entry runs up to `END` (or end of input). Each `MODEL` of the entry
/// is returned as its own molecule; `CONECT` records apply to all of them.
pub struct PdbReader<R> {
    lines: LineReader<R>,
    options: ReaderOptions,
    pending: VecDeque<Molecule>,
    finished: bool,
}

impl<R: BufRead> PdbReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ReaderOptions::default())
    }

    pub fn with_options(reader: R, options: ReaderOptions) -> Self {
        PdbReader {
            lines: LineReader::new(reader),
            options,
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Parse one entry; returns `false` at end of input
    fn parse_entry(&mut self) -> IoResult<bool> {
        let mut models: Vec<Model> = vec![Vec::new()];
        let mut conects: Vec<(usize, ConectRecord)> = Vec::new();
        let mut title = String::new();
        let mut compound = String::new();
        let mut seen_any = false;

        while let Some(line) = self.lines.next_line()? {
            let n = self.lines.line_number();
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            seen_any = true;

            match record_name(line) {
                "ATOM" | "HETATM" => match AtomRecord::parse(line) {
                    Ok(record) => {
                        if let Some(model) = models.last_mut() {
                            model.push((n, record));
                        }
                    }
                    Err(reason) => field::tolerate(self.options.mode, n, reason)?,
                },
                "CONECT" => match ConectRecord::parse(line) {
                    Ok(record) => conects.push((n, record)),
                    Err(reason) => field::tolerate(self.options.mode, n, reason)?,
                },
                "TITLE" => append_text(&mut title, field::column(line, 10, 70)),
                "COMPND" => append_text(&mut compound, field::column(line, 10, 70)),
                "MODEL" => {
                    if models.last().is_some_and(|m| !m.is_empty()) {
                        models.push(Vec::new());
                    }
                }
                "ENDMDL" | "TER" => {}
                "END" => break,
                other => log::trace!("line {}: record {} not read", n, other),
            }
        }

        if !seen_any {
            return Ok(false);
        }

        let title = if title.is_empty() { compound } else { title };
        for model in models.into_iter().filter(|m| !m.is_empty()) {
            let molecule = self.build_molecule(&title, model, &conects)?;
            self.pending.push_back(molecule);
        }
        Ok(true)
    }

    fn build_molecule(
        &self,
        title: &str,
        records: Model,
        conects: &[(usize, ConectRecord)],
    ) -> IoResult<Molecule> {
        let mut draft = MoleculeDraft::with_capacity(title, records.len(), conects.len());

        // Map from PDB serial number to atom index
        let mut serial_to_index: AHashMap<i32, AtomIndex> = AHashMap::new();

        for (n, record) in &records {
            let point = Vec3::new(record.x, record.y, record.z);
            let atom = match record.element() {
                Some(element) => Atom::new(element.symbol(), element),
                None => {
                    field::tolerate(
                        self.options.mode,
                        *n,
                        format!("no element for atom '{}'", record.name),
                    )?;
                    Atom::pseudo(record.name.as_str())
                }
            };
            let index = draft.add_atom(atom.with_charge(record.formal_charge()).with_point3d(point));
            if let Some(serial) = record.serial {
                if serial_to_index.insert(serial, index).is_some() {
                    log::debug!("line {}: atom serial {} reused", n, serial);
                }
            }
        }

        // CONECT records list each bond from both ends
        for (n, conect) in conects {
            for &bonded in &conect.bonded {
                let (Some(&a), Some(&b)) = (
                    serial_to_index.get(&conect.atom),
                    serial_to_index.get(&bonded),
                ) else {
                    field::tolerate(
                        self.options.mode,
                        *n,
                        format!("CONECT {}-{} references an unknown atom", conect.atom, bonded),
                    )?;
                    continue;
                };
                if a == b || draft.find_bond(a, b).is_some() {
                    continue;
                }
                draft.add_bond(a, b, BondOrder::Single)?;
            }
        }

        Ok(draft.finalize_with(self.options.add_stereo_elements)?)
    }
}

fn append_text(text: &mut String, continuation: &str) {
    let continuation = continuation.trim();
    if continuation.is_empty() {
        return;
    }
    if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(continuation);
}

impl<R: BufRead> MoleculeReader for PdbReader<R> {
    fn format_name(&self) -> &'static str {
        names::PDB
    }

    fn read_next(&mut self) -> IoResult<Option<Molecule>> {
        loop {
            if let Some(molecule) = self.pending.pop_front() {
                return Ok(Some(molecule));
            }
            if self.finished {
                return Ok(None);
            }
            match self.parse_entry() {
                Ok(true) => {}
                Ok(false) => self.finished = true,
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            }
        }
    }
}
