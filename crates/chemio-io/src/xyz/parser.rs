//! XYZ file parser

use std::io::BufRead;

use chemio_mol::{Atom, Element, Molecule, MoleculeDraft};
use lin_alg::f32::Vec3;

use crate::error::{IoError, IoResult};
use crate::field::{self, LineReader};
use crate::formats::names;
use crate::options::ReaderOptions;
use crate::traits::MoleculeReader;

/// XYZ file reader; every frame is returned as its own molecule
pub struct XyzReader<R> {
    lines: LineReader<R>,
    options: ReaderOptions,
    failed: bool,
}

impl<R: BufRead> XyzReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ReaderOptions::default())
    }

    pub fn with_options(reader: R, options: ReaderOptions) -> Self {
        XyzReader {
            lines: LineReader::new(reader),
            options,
            failed: false,
        }
    }

    fn parse_frame(&mut self) -> IoResult<Option<Molecule>> {
        let count_line = loop {
            match self.lines.next_line()? {
                None => return Ok(None),
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => break line,
            }
        };
        let n_atoms: usize = count_line.trim().parse().map_err(|_| {
            IoError::parse(
                self.lines.line_number(),
                format!("invalid atom count '{}'", count_line.trim()),
            )
        })?;

        let title = self.lines.expect_line("comment line")?;
        let mut draft = MoleculeDraft::with_capacity(title.trim(), n_atoms, 0);

        for i in 0..n_atoms {
            let line = self.lines.expect_line(&format!("atom {}", i + 1))?;
            let line_number = self.lines.line_number();
            let Some((symbol, point)) = split_atom_line(&line) else {
                return Err(IoError::parse(
                    line_number,
                    format!("expected 'symbol x y z', got '{}'", line.trim()),
                ));
            };
            let atom = self.atom_for(symbol, line_number)?;
            draft.add_atom(atom.with_point3d(point));
        }

        Ok(Some(draft.finalize_with(self.options.add_stereo_elements)?))
    }

    /// Element symbol or atomic number
    fn atom_for(&self, symbol: &str, line: usize) -> IoResult<Atom> {
        let element = match symbol.parse::<u8>() {
            Ok(n) => Element::from_atomic_number(n),
            Err(_) => Element::from_symbol(symbol),
        };
        match element {
            Some(element) => Ok(Atom::new(element.symbol(), element)),
            None => {
                field::tolerate(self.options.mode, line, format!("unknown element '{}'", symbol))?;
                Ok(Atom::pseudo(symbol))
            }
        }
    }
}

/// Symbol and coordinates of an atom line; extra columns are ignored
pub(crate) fn split_atom_line(line: &str) -> Option<(&str, Vec3)> {
    let mut parts = line.split_whitespace();
    let symbol = parts.next()?;
    let mut xyz = [0.0f32; 3];
    for slot in &mut xyz {
        *slot = parts.next()?.parse().ok()?;
    }
    let symbol_like = symbol.chars().all(|c| c.is_ascii_alphanumeric())
        && (symbol.chars().all(|c| c.is_ascii_digit())
            || symbol.chars().next().is_some_and(|c| c.is_ascii_alphabetic()));
    symbol_like.then(|| (symbol, Vec3::new(xyz[0], xyz[1], xyz[2])))
}

impl<R: BufRead> MoleculeReader for XyzReader<R> {
    fn format_name(&self) -> &'static str {
        names::XYZ
    }

    fn read_next(&mut self) -> IoResult<Option<Molecule>> {
        if self.failed {
            return Ok(None);
        }
        let frame = self.parse_frame();
        self.failed = frame.is_err();
        frame
    }
}
