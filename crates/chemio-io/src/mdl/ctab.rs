//! V2000 fixed-column lines: counts, atoms and bonds
//!
//! ```text
//! counts: aaabbblllfffcccsssxxxrrrpppiiimmmvvvvvv
//! atom:   xxxxx.xxxxyyyyy.yyyyzzzzz.zzzz aaaddcccssshhhbbbvvvHHHrrriiimmmnnneee
//! bond:   111222tttsssxxxrrrccc
//! ```

use chemio_mol::{Atom, BondOrder, BondStereo, Radical};

use crate::error::{IoError, IoResult};
use crate::field::{self, FieldValue};
use crate::options::ReaderOptions;

/// Connection table version named on the counts line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CtabVersion {
    V2000,
    V3000,
}

/// Parsed counts line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountsLine {
    pub atoms: usize,
    pub bonds: usize,
    /// Chiral flag (column 15)
    pub chiral: bool,
    pub version: CtabVersion,
}

/// Version of a line that is shaped like a counts line, `None` otherwise
///
/// The version tag sits in columns 34-39; older files omit it, in which
/// case the line must only hold numeric fields.
pub(crate) fn counts_line_version(line: &str) -> Option<CtabVersion> {
    field::count(line, 0, 3)?;
    field::count(line, 3, 3)?;

    let tag = field::column(line, 33, 6).trim();
    let tag = if tag.is_empty() {
        line.split_whitespace().last().unwrap_or("")
    } else {
        tag
    };
    if tag.eq_ignore_ascii_case("V3000") {
        return Some(CtabVersion::V3000);
    }
    if tag.eq_ignore_ascii_case("V2000") {
        return Some(CtabVersion::V2000);
    }
    let untagged = field::column(line, 6, line.len())
        .split_whitespace()
        .all(|t| t.bytes().all(|b| b.is_ascii_digit()));
    untagged.then_some(CtabVersion::V2000)
}

/// Whether a line is shaped like a V2000 atom line
pub(crate) fn looks_like_atom_line(line: &str) -> bool {
    let numeric = |start| {
        field::column(line, start, field::COORDINATE_WIDTH)
            .trim()
            .parse::<f32>()
            .is_ok()
    };
    numeric(0)
        && numeric(10)
        && numeric(20)
        && field::column(line, 31, 3)
            .trim()
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '*')
}

/// Parse a counts line; a line that is not one means the input is not a Molfile
pub(crate) fn parse_counts_line(line: &str, line_number: usize) -> IoResult<CountsLine> {
    let version = counts_line_version(line).ok_or_else(|| {
        IoError::parse(line_number, format!("invalid counts line '{}'", line.trim_end()))
    })?;
    let atoms = field::count(line, 0, 3)
        .ok_or_else(|| IoError::parse(line_number, "invalid atom count"))?;
    let bonds = field::count(line, 3, 3)
        .ok_or_else(|| IoError::parse(line_number, "invalid bond count"))?;
    let chiral = field::count(line, 12, 3) == Some(1);
    Ok(CountsLine {
        atoms,
        bonds,
        chiral,
        version,
    })
}

/// Formal charge and radical encoded by an atom-block charge code
///
/// `{0:0, 1:+3, 2:+2, 3:+1, 4:doublet radical, 5:-1, 6:-2, 7:-3}`
pub fn charge_from_code(code: i32) -> Option<(i8, Radical)> {
    let charge = match code {
        0 => 0,
        1 => 3,
        2 => 2,
        3 => 1,
        4 => return Some((0, Radical::Doublet)),
        5 => -1,
        6 => -2,
        7 => -3,
        _ => return None,
    };
    Some((charge, Radical::None))
}

/// Atom-block charge code for a charge and radical; 0 when the pair has none
pub fn charge_to_code(charge: i8, radical: Radical) -> u8 {
    match (charge, radical) {
        (0, Radical::Doublet) => 4,
        (3, _) => 1,
        (2, _) => 2,
        (1, _) => 3,
        (-1, _) => 5,
        (-2, _) => 6,
        (-3, _) => 7,
        _ => 0,
    }
}

/// Atom and raw coordinates from one atom line
pub(crate) fn parse_atom_line(
    line: &str,
    line_number: usize,
    options: &ReaderOptions,
) -> IoResult<(Atom, [f32; 3])> {
    let mode = options.mode;
    let fixed = [
        field::coordinate(line, 0),
        field::coordinate(line, 10),
        field::coordinate(line, 20),
    ];

    // relaxed readers retry badly aligned lines as whitespace-separated tokens
    if !mode.is_strict() && fixed.iter().any(FieldValue::is_invalid) {
        if let Some(parsed) = parse_atom_tokens(line, line_number, options)? {
            log::warn!(
                "line {}: atom line is not column aligned; read as free format",
                line_number
            );
            return Ok(parsed);
        }
    }

    let mut point = [0.0f32; 3];
    for (slot, value) in point.iter_mut().zip(fixed) {
        *slot = value.resolve(mode, line_number)?;
    }

    let symbol = field::column(line, 31, 3).trim();
    let mut atom = super::resolve_symbol(symbol, options, line_number)?;

    let mass_diff = field::integer(line, 34, 2);
    let charge_code = field::integer(line, 36, 3);
    let parity = field::integer(line, 39, 3);
    let hydrogens = field::integer(line, 42, 3);
    let valence = field::integer(line, 48, 3);
    let map = field::integer(line, 60, 3);

    apply_atom_fields(
        &mut atom,
        AtomFields {
            mass_diff,
            charge_code,
            parity,
            hydrogens,
            valence,
            map,
        },
        options,
        line_number,
    )?;
    Ok((atom, point))
}

/// Optional atom-line fields after the symbol
struct AtomFields {
    mass_diff: FieldValue<i32>,
    charge_code: FieldValue<i32>,
    parity: FieldValue<i32>,
    hydrogens: FieldValue<i32>,
    valence: FieldValue<i32>,
    map: FieldValue<i32>,
}

fn apply_atom_fields(
    atom: &mut Atom,
    fields: AtomFields,
    options: &ReaderOptions,
    line_number: usize,
) -> IoResult<()> {
    let mode = options.mode;

    let mass_diff = in_range(fields.mass_diff, -3..=4, "mass difference").resolve(mode, line_number)?;
    if mass_diff != 0 && !atom.is_pseudo() {
        let mass = atom.element.nominal_mass() as i32 + mass_diff;
        atom.mass_number = u16::try_from(mass).ok();
    }

    let code = fields.charge_code.resolve(mode, line_number)?;
    let (charge, radical) = match charge_from_code(code) {
        Some(decoded) => decoded,
        None => FieldValue::Invalid {
            reason: format!("invalid charge code {}", code),
            fallback: (0, Radical::None),
        }
        .resolve(mode, line_number)?,
    };
    atom.formal_charge = charge;
    atom.radical = radical;

    atom.stereo_parity = in_range(fields.parity, 0..=3, "stereo parity").resolve(mode, line_number)? as u8;
    atom.query_hydrogen_count =
        in_range(fields.hydrogens, 0..=5, "hydrogen count").resolve(mode, line_number)? as u8;

    atom.valence = match in_range(fields.valence, 0..=15, "valence").resolve(mode, line_number)? {
        0 => None,
        15 => Some(0),
        v => Some(v as u8),
    };

    let map = fields.map.resolve(mode, line_number)?;
    atom.map_number = u32::try_from(map).unwrap_or(0);
    Ok(())
}

fn in_range(
    value: FieldValue<i32>,
    range: std::ops::RangeInclusive<i32>,
    what: &str,
) -> FieldValue<i32> {
    match value {
        FieldValue::Ok(v) if !range.contains(&v) => FieldValue::Invalid {
            reason: format!("{} {} out of range", what, v),
            fallback: 0,
        },
        other => other,
    }
}

/// Free-format atom line: `x y z symbol [mass_diff charge_code ...]`
fn parse_atom_tokens(
    line: &str,
    line_number: usize,
    options: &ReaderOptions,
) -> IoResult<Option<(Atom, [f32; 3])>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 4 {
        return Ok(None);
    }
    let mut point = [0.0f32; 3];
    for (slot, token) in point.iter_mut().zip(&tokens) {
        match token.parse() {
            Ok(v) => *slot = v,
            Err(_) => return Ok(None),
        }
    }

    let mut atom = super::resolve_symbol(tokens[3], options, line_number)?;
    let token = |i: usize| -> FieldValue<i32> {
        match tokens.get(i) {
            None => FieldValue::Defaulted(0),
            Some(t) => match t.parse() {
                Ok(v) => FieldValue::Ok(v),
                Err(_) => FieldValue::Invalid {
                    reason: format!("malformed integer '{}'", t),
                    fallback: 0,
                },
            },
        }
    };
    let fields = AtomFields {
        mass_diff: token(4),
        charge_code: token(5),
        parity: token(6),
        hydrogens: token(7),
        valence: token(9),
        map: token(13),
    };
    apply_atom_fields(&mut atom, fields, options, line_number)?;
    Ok(Some((atom, point)))
}

/// Parsed bond line; atom numbers stay 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BondLine {
    pub first: usize,
    pub second: usize,
    pub order: BondOrder,
    pub stereo: BondStereo,
}

/// Parse a bond line
///
/// Atom numbers must be positive; range checks against the atom block are
/// the caller's. A stereo code that does not fit the bond order is dropped
/// in relaxed mode.
pub(crate) fn parse_bond_line(
    line: &str,
    line_number: usize,
    options: &ReaderOptions,
) -> IoResult<Option<BondLine>> {
    let mode = options.mode;
    let first = field::count(line, 0, 3).filter(|&n| n > 0);
    let second = field::count(line, 3, 3).filter(|&n| n > 0);
    let (first, second) = match (first, second) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            field::tolerate(
                mode,
                line_number,
                format!("invalid atom numbers in bond line '{}'", line.trim_end()),
            )?;
            return Ok(None);
        }
    };

    let code = field::integer(line, 6, 3).resolve(mode, line_number)?;
    let order = match BondOrder::from_mdl(code) {
        Some(order) => order,
        None => FieldValue::Invalid {
            reason: format!("invalid bond type {}", code),
            fallback: BondOrder::Unset,
        }
        .resolve(mode, line_number)?,
    };

    let code = field::integer(line, 9, 3).resolve(mode, line_number)?;
    let mut stereo = match BondStereo::from_mdl(code) {
        Some(stereo) => stereo,
        None => FieldValue::Invalid {
            reason: format!("invalid bond stereo {}", code),
            fallback: BondStereo::None,
        }
        .resolve(mode, line_number)?,
    };
    if !stereo.is_legal_for(order) {
        field::tolerate(
            mode,
            line_number,
            format!("bond stereo {:?} is not allowed on a {:?} bond", stereo, order),
        )?;
        stereo = BondStereo::None;
    }

    Ok(Some(BondLine {
        first,
        second,
        order,
        stereo,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ReaderMode;
    use chemio_mol::Element;

    #[test]
    fn test_counts_line() {
        let counts = parse_counts_line("  3  2  0  0  1  0  0  0  0  0999 V2000", 4).unwrap();
        assert_eq!((counts.atoms, counts.bonds), (3, 2));
        assert!(counts.chiral);
        assert_eq!(counts.version, CtabVersion::V2000);

        let legacy = parse_counts_line("  1  0  0  0  0                 1", 1).unwrap();
        assert_eq!((legacy.atoms, legacy.bonds), (1, 0));
        assert_eq!(legacy.version, CtabVersion::V2000);

        let v3000 = parse_counts_line("  0  0  0     0  0            999 v3000", 4).unwrap();
        assert_eq!(v3000.version, CtabVersion::V3000);

        assert!(parse_counts_line("Bortrifluorid", 2).is_err());
        assert!(counts_line_version("  4  3 title words").is_none());
    }

    #[test]
    fn test_charge_codes() {
        assert_eq!(charge_from_code(0), Some((0, Radical::None)));
        assert_eq!(charge_from_code(1), Some((3, Radical::None)));
        assert_eq!(charge_from_code(3), Some((1, Radical::None)));
        assert_eq!(charge_from_code(4), Some((0, Radical::Doublet)));
        assert_eq!(charge_from_code(5), Some((-1, Radical::None)));
        assert_eq!(charge_from_code(8), None);
        for code in 0..=7 {
            let (charge, radical) = charge_from_code(code).unwrap();
            assert_eq!(charge_to_code(charge, radical) as i32, code);
        }
    }

    #[test]
    fn test_atom_line() {
        let options = ReaderOptions::default();
        let line = "    1.2990   -0.7500    0.0000 N   0  3  0  0  0  0  0  0  0  5  0  0";
        let (atom, point) = parse_atom_line(line, 5, &options).unwrap();
        assert_eq!(atom.element, Element::NITROGEN);
        assert_eq!(atom.formal_charge, 1);
        assert_eq!(atom.map_number, 5);
        assert_eq!(point, [1.299, -0.75, 0.0]);

        // trailing fields may be missing
        let (atom, _) = parse_atom_line("    0.0000    0.0000    0.0000 C", 5, &options).unwrap();
        assert_eq!(atom.formal_charge, 0);

        let (atom, _) = parse_atom_line("    0.0000    0.0000    0.0000 C   1", 5, &options).unwrap();
        assert_eq!(atom.mass_number, Some(13));
    }

    #[test]
    fn test_invalid_charge_code() {
        let line = "    0.0000    0.0000    0.0000 C   0  9";
        assert!(parse_atom_line(line, 7, &ReaderOptions::strict()).is_err());
        let (atom, _) = parse_atom_line(line, 7, &ReaderOptions::default()).unwrap();
        assert_eq!(atom.formal_charge, 0);
    }

    #[test]
    fn test_free_format_fallback() {
        let line = "0.5 1.5 0.0 O 0 5";
        let (atom, point) = parse_atom_line(line, 9, &ReaderOptions::default()).unwrap();
        assert_eq!(atom.element, Element::OXYGEN);
        assert_eq!(atom.formal_charge, -1);
        assert_eq!(point, [0.5, 1.5, 0.0]);
        assert!(parse_atom_line(line, 9, &ReaderOptions::strict()).is_err());
    }

    #[test]
    fn test_bond_line() {
        let options = ReaderOptions::default();
        let bond = parse_bond_line("  1  2  2  0", 1, &options).unwrap().unwrap();
        assert_eq!((bond.first, bond.second), (1, 2));
        assert_eq!(bond.order, BondOrder::Double);
        assert_eq!(bond.stereo, BondStereo::None);

        let short = parse_bond_line("  1  2  1", 1, &options).unwrap().unwrap();
        assert_eq!(short.stereo, BondStereo::None);

        let query = parse_bond_line("  1  2  8  0", 1, &options).unwrap().unwrap();
        assert!(query.order.is_query());
    }

    #[test]
    fn test_stereo_on_double_bond() {
        let line = "  1  2  2  1  0  0  0";
        let strict = ReaderOptions::default().with_mode(ReaderMode::Strict);
        assert!(parse_bond_line(line, 3, &strict).is_err());

        let relaxed = parse_bond_line(line, 3, &ReaderOptions::default()).unwrap().unwrap();
        assert_eq!(relaxed.order, BondOrder::Double);
        assert_eq!(relaxed.stereo, BondStereo::None);
    }
}
