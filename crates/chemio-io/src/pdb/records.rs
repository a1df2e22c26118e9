//! PDB record types and their fixed-column parsers

use chemio_mol::Element;

use crate::field;

/// Trimmed fixed-width column
fn column(line: &str, start: usize, width: usize) -> &str {
    field::column(line, start, width).trim()
}

/// Parsed ATOM or HETATM record
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    /// Record type: true for HETATM, false for ATOM
    pub hetatm: bool,
    /// Atom serial number; `None` when the column is blank
    pub serial: Option<i32>,
    /// Atom name with its column justification trimmed
    pub name: String,
    pub residue_name: String,
    pub chain: String,
    pub residue_number: i32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Element symbol column (77-78)
    pub element: String,
    /// Charge column (79-80), e.g. `2+`
    pub charge: String,
}

impl AtomRecord {
    /// Parse an ATOM/HETATM line
    ///
    /// Coordinates are required; every other column may be blank.
    pub fn parse(line: &str) -> Result<Self, String> {
        let coord = |start: usize, axis: &str| -> Result<f32, String> {
            let text = column(line, start, 8);
            text.parse()
                .map_err(|_| format!("invalid {} coordinate '{}'", axis, text))
        };
        let x = coord(30, "x")?;
        let y = coord(38, "y")?;
        let z = coord(46, "z")?;

        Ok(AtomRecord {
            hetatm: line.starts_with("HETATM"),
            serial: column(line, 6, 5).parse().ok(),
            name: column(line, 12, 4).to_string(),
            residue_name: column(line, 17, 3).to_string(),
            chain: column(line, 21, 1).to_string(),
            residue_number: column(line, 22, 4).parse().unwrap_or(0),
            x,
            y,
            z,
            element: column(line, 76, 2).to_string(),
            charge: column(line, 78, 2).to_string(),
        })
    }

    /// Element from the element column, falling back to the atom name
    pub fn element(&self) -> Option<Element> {
        if !self.element.is_empty() {
            if let Some(element) = Element::from_symbol(&self.element) {
                return Some(element);
            }
        }
        infer_element_from_name(&self.name)
    }

    pub fn formal_charge(&self) -> i8 {
        parse_pdb_charge(&self.charge)
    }
}

/// Infer the element of an atom from its name
///
/// Leading digits (`1HB`) are skipped. Two-letter elements are only taken
/// when the name is not a common protein atom name (`CA` is C-alpha, not
/// calcium).
pub fn infer_element_from_name(name: &str) -> Option<Element> {
    let letters = name
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_digit());
    let mut chars = letters.chars().filter(char::is_ascii_alphabetic);
    let first = chars.next()?;

    if let Some(second) = chars.next() {
        let protein_name = matches!(
            letters,
            "CA" | "CB" | "CG" | "CD" | "CE" | "CZ" | "CH" | "NE" | "NH" | "NZ" | "OG" | "OH"
                | "OE" | "OD" | "SD" | "SG" | "HG" | "HD" | "HE" | "HH" | "HZ"
        ) || letters.len() > 2;
        if !protein_name {
            if let Some(element) = Element::from_symbol(&format!("{}{}", first, second)) {
                return Some(element);
            }
        }
    }

    Element::from_symbol(&first.to_string())
}

/// Parse a PDB charge column (`2+`, `1-`, `+2`, `+`, `-`)
pub fn parse_pdb_charge(charge: &str) -> i8 {
    let digit = |c: char| c.to_digit(10).map_or(0, |d| d as i8);
    let chars: Vec<char> = charge.trim().chars().collect();
    match chars.as_slice() {
        ['+'] => 1,
        ['-'] => -1,
        [d, '+'] | ['+', d] if d.is_ascii_digit() => digit(*d),
        [d, '-'] | ['-', d] if d.is_ascii_digit() => -digit(*d),
        _ => 0,
    }
}

/// CONECT record for bond connectivity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConectRecord {
    /// Serial number of the central atom
    pub atom: i32,
    /// Serial numbers of bonded atoms (up to 4 per record)
    pub bonded: Vec<i32>,
}

impl ConectRecord {
    pub fn parse(line: &str) -> Result<Self, String> {
        let atom = column(line, 6, 5)
            .parse()
            .map_err(|_| format!("invalid CONECT atom serial '{}'", column(line, 6, 5)))?;
        let bonded = [11, 16, 21, 26]
            .into_iter()
            .filter_map(|start| column(line, start, 5).parse::<i32>().ok())
            .filter(|&serial| serial > 0)
            .collect();
        Ok(ConectRecord { atom, bonded })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_atom_record() {
        let line =
            "ATOM      1  N   ALA A   1       1.000   2.000   3.000  1.00 20.00           N  ";
        let record = AtomRecord::parse(line).unwrap();

        assert_eq!(record.serial, Some(1));
        assert_eq!(record.name, "N");
        assert_eq!(record.residue_name, "ALA");
        assert_eq!(record.chain, "A");
        assert_eq!(record.residue_number, 1);
        assert!((record.x - 1.0).abs() < 0.001);
        assert!((record.z - 3.0).abs() < 0.001);
        assert_eq!(record.element(), Some(Element::NITROGEN));
        assert!(!record.hetatm);
    }

    #[test]
    fn test_parse_bad_coordinates() {
        let line = "HETATM    1  O   HOH A   1       1.000   x.xxx   3.000";
        assert!(AtomRecord::parse(line).unwrap_err().contains("y coordinate"));
    }

    #[test]
    fn test_infer_element() {
        assert_eq!(infer_element_from_name("CA"), Some(Element::CARBON));
        assert_eq!(infer_element_from_name("CL"), Some(Element::CHLORINE));
        assert_eq!(infer_element_from_name("N"), Some(Element::NITROGEN));
        assert_eq!(infer_element_from_name("1HB"), Some(Element::HYDROGEN));
        assert_eq!(infer_element_from_name("OXT"), Some(Element::OXYGEN));
        assert_eq!(infer_element_from_name(""), None);
    }

    #[test]
    fn test_parse_charge() {
        assert_eq!(parse_pdb_charge("2+"), 2);
        assert_eq!(parse_pdb_charge("1-"), -1);
        assert_eq!(parse_pdb_charge("+"), 1);
        assert_eq!(parse_pdb_charge(""), 0);
    }

    #[test]
    fn test_parse_conect_record() {
        let record = ConectRecord::parse("CONECT    1    2    3    4    5").unwrap();
        assert_eq!(record.atom, 1);
        assert_eq!(record.bonded, vec![2, 3, 4, 5]);
        assert!(ConectRecord::parse("CONECT").is_err());
    }
}
