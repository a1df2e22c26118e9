//! MDL connection-table formats
//!
//! Molfiles (V2000 and V3000) and SD files share one reader: a V2000
//! counts line tagged `V3000` hands the record over to the V3000 block
//! parser, and the data items of SD files are read after `M  END`.
//!
//! - [`MdlReader`] - Molfile / SDF reader with strict and relaxed modes
//! - [`MdlWriter`] - V2000 Molfile / SDF writer

mod ctab;
mod properties;
mod reader;
mod v3000;
mod writer;

pub use ctab::{charge_from_code, charge_to_code, CountsLine, CtabVersion};
pub use reader::{MdlReader, ReaderState};
pub use writer::MdlWriter;

use chemio_mol::{Atom, AtomIndex, BondIndex, BondOrder, BondStereo, Element, MoleculeDraft};
use lin_alg::f32::Vec3;

use crate::error::{IoError, IoResult};
use crate::field::{self, FieldValue};
use crate::options::ReaderOptions;

/// Record separator of SD files
pub const RECORD_SEPARATOR: &str = "$$$$";
/// Terminator of the properties block
pub const END_LINE: &str = "M  END";

/// Detection: a Molfile header followed by a V2000 counts line
pub fn matches_molfile(lines: &[String]) -> bool {
    lines
        .get(3)
        .and_then(|l| ctab::counts_line_version(l))
        .is_some_and(|v| v == CtabVersion::V2000)
}

/// Detection: a counts line tagged V3000, or the start of a V3000 CTAB
pub fn matches_v3000(lines: &[String]) -> bool {
    let tagged = lines
        .get(3)
        .and_then(|l| ctab::counts_line_version(l))
        .is_some_and(|v| v == CtabVersion::V3000);
    tagged || lines.iter().any(|l| l.starts_with("M  V30 BEGIN CTAB"))
}

/// Detection: a Molfile whose prefix shows SD data items or a record separator
pub fn matches_sdf(lines: &[String]) -> bool {
    let has_ctab = lines
        .get(3)
        .and_then(|l| ctab::counts_line_version(l))
        .is_some();
    has_ctab
        && lines
            .iter()
            .skip(4)
            .any(|l| l.starts_with(RECORD_SEPARATOR) || is_data_header(l))
}

/// `> <NAME>` style data item header
pub(crate) fn is_data_header(line: &str) -> bool {
    line.starts_with('>') && line.contains('<') && line.contains('>')
}

/// Symbols read as pseudo atoms rather than elements
fn is_pseudo_symbol(symbol: &str) -> bool {
    matches!(
        symbol,
        "R" | "R#" | "A" | "AH" | "Q" | "QH" | "*" | "L" | "LP" | "X" | "XH" | "M" | "MH" | "Pol"
    ) || symbol
        .strip_prefix('R')
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Build an atom for an atom-block symbol
///
/// `D` and `T` become hydrogen isotopes when the options ask for it.
/// Unknown symbols are invalid; the fallback is a pseudo atom.
pub(crate) fn atom_for_symbol(symbol: &str, options: &ReaderOptions) -> FieldValue<Atom> {
    match symbol {
        "" => FieldValue::Invalid {
            reason: "missing atom symbol".to_string(),
            fallback: Atom::pseudo("*"),
        },
        "D" | "T" if options.interpret_hydrogen_isotopes => {
            let mut atom = Atom::new("H", Element::HYDROGEN);
            atom.mass_number = Some(if symbol == "D" { 2 } else { 3 });
            FieldValue::Ok(atom)
        }
        "D" | "T" => FieldValue::Ok(Atom::pseudo(symbol)),
        s if is_pseudo_symbol(s) => FieldValue::Ok(Atom::pseudo(s)),
        s => match Element::from_symbol(s) {
            Some(element) => FieldValue::Ok(Atom::new(element.symbol(), element)),
            None => FieldValue::Invalid {
                reason: format!("unknown atom symbol '{}'", s),
                fallback: Atom::pseudo(s),
            },
        },
    }
}

/// Coordinate dimension declared in columns 21-22 of the program line
pub(crate) fn declared_dimension(program_line: &str) -> Option<u8> {
    match field::column(program_line, 20, 2) {
        "2D" | "2d" => Some(2),
        "3D" | "3d" => Some(3),
        _ => None,
    }
}

/// Store parsed coordinates as 2D or 3D points
///
/// Points become 3D when forced, when the header declares 3D, or when any
/// z coordinate is non-zero.
pub(crate) fn assign_coordinates(
    atoms: &mut [Atom],
    points: &[[f32; 3]],
    declared: Option<u8>,
    options: &ReaderOptions,
) {
    let any_z = points.iter().any(|p| p[2] != 0.0);
    let as_3d = options.force_read_as_3d || declared == Some(3) || any_z;
    for (atom, &[x, y, z]) in atoms.iter_mut().zip(points) {
        if as_3d {
            atom.point3d = Some(Vec3::new(x, y, z));
            atom.point2d = None;
        } else {
            atom.point2d = Some([x, y]);
            atom.point3d = None;
        }
    }
}

/// Resolve a symbol field against the reader mode
pub(crate) fn resolve_symbol(
    symbol: &str,
    options: &ReaderOptions,
    line: usize,
) -> IoResult<Atom> {
    atom_for_symbol(symbol, options).resolve(options.mode, line)
}

/// Add a bond between 1-based atom numbers
///
/// Numbers outside the atom block, self bonds and duplicates fail in strict
/// mode; relaxed readers drop the bond and return `None`.
pub(crate) fn add_bond(
    draft: &mut MoleculeDraft,
    first: u32,
    second: u32,
    order: BondOrder,
    stereo: BondStereo,
    options: &ReaderOptions,
    line: usize,
) -> IoResult<Option<BondIndex>> {
    let n_atoms = draft.atom_count();
    let index = |n: u32| AtomIndex::from_one_based(n).filter(|a| a.as_usize() < n_atoms);
    let (Some(begin), Some(end)) = (index(first), index(second)) else {
        field::tolerate(
            options.mode,
            line,
            format!("bond {}-{} references an atom outside 1..={}", first, second, n_atoms),
        )?;
        return Ok(None);
    };
    match draft.add_bond_with_stereo(begin, end, order, stereo) {
        Ok(bond) => Ok(Some(bond)),
        Err(e) if options.mode.is_strict() => Err(IoError::parse(line, e.to_string())),
        Err(e) => {
            log::warn!("line {}: {}; bond dropped", line, e);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    const MOLFILE: &str = "water\n  chemio            2D\n\n  3  2  0  0  0  0  0  0  0  0999 V2000\n";

    #[test]
    fn test_matchers() {
        let mol = lines(MOLFILE);
        assert!(matches_molfile(&mol));
        assert!(!matches_v3000(&mol));
        assert!(!matches_sdf(&mol));

        let v3000 = lines("x\n\n\n  0  0  0     0  0            999 V3000\nM  V30 BEGIN CTAB\n");
        assert!(matches_v3000(&v3000));
        assert!(!matches_molfile(&v3000));

        let sdf = lines(&format!("{}M  END\n> <ID>\n1\n\n$$$$\n", MOLFILE));
        assert!(matches_sdf(&sdf));
    }

    #[test]
    fn test_symbols() {
        let options = ReaderOptions::default();
        let d = atom_for_symbol("D", &options).resolve(options.mode, 1).unwrap();
        assert_eq!(d.element, Element::HYDROGEN);
        assert_eq!(d.mass_number, Some(2));

        let plain = ReaderOptions::default().with_hydrogen_isotopes(false);
        let d = atom_for_symbol("D", &plain).resolve(plain.mode, 1).unwrap();
        assert!(d.is_pseudo());

        assert!(atom_for_symbol("R#", &options).resolve(options.mode, 1).unwrap().is_pseudo());
        assert!(atom_for_symbol("R12", &options).resolve(options.mode, 1).unwrap().is_pseudo());
        assert!(atom_for_symbol("Zz", &options).is_invalid());
        assert!(atom_for_symbol("", &options).is_invalid());
    }

    #[test]
    fn test_dimension() {
        assert_eq!(declared_dimension("  chemio            3D"), Some(3));
        assert_eq!(declared_dimension("  -ISIS-  04231216572D"), Some(2));
        assert_eq!(declared_dimension(""), None);
    }
}
