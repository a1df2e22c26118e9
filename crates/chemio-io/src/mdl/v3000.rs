//! V3000 connection tables
//!
//! Every line starts with `M  V30`; a trailing `-` continues the statement
//! on the next line. Statements are whitespace-separated fields, positional
//! or `KEY=value`, where values may be quoted strings or parenthesized lists.

use std::fmt::Debug;
use std::io::BufRead;
use std::str::FromStr;

use ahash::AHashMap;
use chemio_mol::{
    Atom, AtomIndex, BondIndex, BondOrder, BondStereo, MoleculeDraft, Radical, Sgroup, SgroupBracket,
    SgroupConnectivity, SgroupType,
};
use indexmap::IndexMap;
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, space0},
    multi::many0,
    sequence::{delimited, preceded, terminated},
    IResult,
};

use crate::error::{IoError, IoResult};
use crate::field::{self, FieldValue, LineReader};
use crate::options::ReaderOptions;

const PREFIX: &str = "M  V30";

/// Field value of a V3000 statement
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Text(String),
    List(Vec<String>),
}

impl Value {
    fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::List(_) => None,
        }
    }
}

/// One field of a statement; `key` is set for `KEY=value` fields
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Field {
    pub key: Option<String>,
    pub value: Value,
}

/// Quoted string; `""` inside the quotes is a literal quote
fn quoted(input: &str) -> IResult<&str, Value> {
    let (mut rest, _) = char('"')(input)?;
    let mut text = String::new();
    loop {
        let (after, chunk) = take_while(|c| c != '"')(rest)?;
        text.push_str(chunk);
        let (after, _) = char('"')(after)?;
        match after.strip_prefix('"') {
            Some(more) => {
                text.push('"');
                rest = more;
            }
            None => return Ok((after, Value::Text(text))),
        }
    }
}

/// Parenthesized, whitespace-separated list
fn list(input: &str) -> IResult<&str, Value> {
    let item = preceded(space0, take_while1(|c: char| !c.is_whitespace() && c != ')'));
    let (input, items) = delimited(char('('), many0(item), preceded(space0, char(')')))(input)?;
    Ok((input, Value::List(items.into_iter().map(String::from).collect())))
}

fn bare(input: &str) -> IResult<&str, Value> {
    let (input, text) =
        take_while1(|c: char| !c.is_whitespace() && !matches!(c, '=' | '(' | ')' | '"'))(input)?;
    Ok((input, Value::Text(text.to_string())))
}

fn value(input: &str) -> IResult<&str, Value> {
    alt((quoted, list, bare))(input)
}

fn keyed(input: &str) -> IResult<&str, Field> {
    let (input, key) =
        terminated(take_while1(|c: char| c.is_ascii_alphanumeric()), char('='))(input)?;
    let (input, value) = value(input)?;
    Ok((
        input,
        Field {
            key: Some(key.to_ascii_uppercase()),
            value,
        },
    ))
}

fn positional(input: &str) -> IResult<&str, Field> {
    let (input, value) = value(input)?;
    Ok((input, Field { key: None, value }))
}

fn fields(input: &str) -> IResult<&str, Vec<Field>> {
    terminated(many0(preceded(space0, alt((keyed, positional)))), space0)(input)
}

/// Split a statement into fields; the error is the reason it is malformed
pub(crate) fn parse_fields(statement: &str) -> Result<Vec<Field>, String> {
    match fields(statement) {
        Ok(("", fields)) => Ok(fields),
        Ok((rest, _)) => Err(format!("unexpected text '{}' in V3000 statement", rest)),
        Err(e) => Err(format!("malformed V3000 statement: {}", e)),
    }
}

/// A parsed statement and the line it started on
#[derive(Debug)]
struct Statement {
    line: usize,
    fields: Vec<Field>,
}

impl Statement {
    fn positional(&self) -> Vec<&Value> {
        self.fields
            .iter()
            .filter(|f| f.key.is_none())
            .map(|f| &f.value)
            .collect()
    }

    fn keyed(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .filter_map(|f| f.key.as_deref().map(|k| (k, &f.value)))
    }

    fn word(&self, n: usize) -> Option<&str> {
        self.positional().get(n).and_then(|v| v.as_text())
    }

    /// `BEGIN name` / `END name`
    fn block(&self, keyword: &str) -> Option<String> {
        self.word(0)
            .filter(|w| w.eq_ignore_ascii_case(keyword))
            .and_then(|_| self.word(1))
            .map(str::to_ascii_uppercase)
    }
}

fn number<T: FromStr + Debug>(value: Option<&Value>, what: &str, fallback: T) -> FieldValue<T> {
    match value.and_then(Value::as_text) {
        None => FieldValue::Invalid {
            reason: format!("missing {}", what),
            fallback,
        },
        Some(text) => match text.parse() {
            Ok(v) => FieldValue::Ok(v),
            Err(_) => FieldValue::Invalid {
                reason: format!("malformed {} '{}'", what, text),
                fallback,
            },
        },
    }
}

/// Numbers of a counted list such as `ATOMS=(3 1 2 5)`
fn counted_list(value: &Value, line: usize, options: &ReaderOptions) -> IoResult<Vec<u32>> {
    let Value::List(items) = value else {
        field::tolerate(options.mode, line, "expected a parenthesized list")?;
        return Ok(Vec::new());
    };
    let numbers: Option<Vec<u32>> = items.iter().map(|i| i.parse().ok()).collect();
    match numbers.as_deref() {
        Some([count, rest @ ..]) if *count as usize == rest.len() => Ok(rest.to_vec()),
        _ => {
            field::tolerate(
                options.mode,
                line,
                format!("malformed list ({})", items.join(" ")),
            )?;
            Ok(Vec::new())
        }
    }
}

/// Source of joined statements for one connection table
struct Statements<'r, R> {
    lines: &'r mut LineReader<R>,
    options: ReaderOptions,
}

impl<'r, R: BufRead> Statements<'r, R> {
    /// Next statement, `None` at `M  END` or end of input
    ///
    /// Malformed statements are skipped in relaxed mode.
    fn next(&mut self) -> IoResult<Option<Statement>> {
        loop {
            let Some(line) = self.lines.next_line()? else {
                log::debug!("V3000 connection table ends without 'M  END'");
                return Ok(None);
            };
            let start = self.lines.line_number();
            if line.starts_with(super::END_LINE) {
                return Ok(None);
            }
            let Some(mut text) = line.strip_prefix(PREFIX).map(str::to_string) else {
                field::tolerate(
                    self.options.mode,
                    start,
                    format!("expected a '{}' line, got '{}'", PREFIX, line.trim_end()),
                )?;
                continue;
            };
            let mut broken = false;
            while text.trim_end().ends_with('-') {
                let keep = text.trim_end().len() - 1;
                text.truncate(keep);
                // an unprefixed line is left for the next statement
                if self.lines.peek()?.is_some_and(|l| !l.starts_with(PREFIX)) {
                    field::tolerate(
                        self.options.mode,
                        self.lines.line_number() + 1,
                        "continuation line without 'M  V30' prefix",
                    )?;
                    broken = true;
                    break;
                }
                let next = self.lines.expect_line("V3000 continuation line")?;
                let rest = &next[PREFIX.len()..];
                text.push_str(rest.strip_prefix(' ').unwrap_or(rest));
            }
            if broken {
                continue;
            }
            let fields = match parse_fields(text.trim()) {
                Ok(fields) => fields,
                Err(reason) => {
                    field::tolerate(self.options.mode, start, reason)?;
                    continue;
                }
            };
            if fields.is_empty() {
                continue;
            }
            return Ok(Some(Statement {
                line: start,
                fields,
            }));
        }
    }
}

/// Read a V3000 connection table up to `M  END` into `draft`
///
/// `declared` is the dimension from the header's program line.
pub(crate) fn read_ctab<R: BufRead>(
    lines: &mut LineReader<R>,
    draft: &mut MoleculeDraft,
    declared: Option<u8>,
    options: &ReaderOptions,
) -> IoResult<()> {
    let mut statements = Statements {
        lines,
        options: *options,
    };
    let mut ctab = CtabState::default();

    while let Some(statement) = statements.next()? {
        if let Some(block) = statement.block("BEGIN") {
            match block.as_str() {
                "CTAB" => {}
                "ATOM" => {
                    read_block(&mut statements, "ATOM", |s| ctab.read_atom(s, options))?;
                    ctab.flush_atoms(draft, declared, options);
                }
                "BOND" => {
                    read_block(&mut statements, "BOND", |s| ctab.read_bond(s, draft, options))?;
                }
                "SGROUP" => {
                    read_block(&mut statements, "SGROUP", |s| ctab.read_sgroup(s, options))?;
                }
                other => {
                    log::debug!("line {}: skipping V3000 {} block", statement.line, other);
                    let other = other.to_string();
                    read_block(&mut statements, &other, |_| Ok(()))?;
                }
            }
        } else if statement.block("END").as_deref() == Some("CTAB") {
            continue;
        } else if statement
            .word(0)
            .is_some_and(|w| w.eq_ignore_ascii_case("COUNTS"))
        {
            let positional = statement.positional();
            let mode = options.mode;
            ctab.declared_atoms =
                Some(number(positional.get(1).copied(), "atom count", 0usize).resolve(mode, statement.line)?);
            ctab.declared_bonds =
                Some(number(positional.get(2).copied(), "bond count", 0usize).resolve(mode, statement.line)?);
        } else {
            log::debug!("line {}: ignoring V3000 statement", statement.line);
        }
    }

    ctab.finish(draft, options)
}

/// Feed the statements of a block to `f` until its `END` statement
fn read_block<R: BufRead>(
    statements: &mut Statements<'_, R>,
    name: &str,
    mut f: impl FnMut(&Statement) -> IoResult<()>,
) -> IoResult<()> {
    let start = statements.lines.line_number();
    while let Some(statement) = statements.next()? {
        if statement.block("END").as_deref() == Some(name) {
            return Ok(());
        }
        f(&statement)?;
    }
    Err(IoError::parse(start, format!("V3000 {} block is not closed", name)))
}

#[derive(Default)]
struct CtabState {
    declared_atoms: Option<usize>,
    declared_bonds: Option<usize>,
    atoms: Vec<Atom>,
    points: Vec<[f32; 3]>,
    /// File atom id to 1-based position in the atom block
    atom_ids: AHashMap<u32, u32>,
    bond_ids: AHashMap<u32, BondIndex>,
    /// Groups keyed by file id, with the parent id when given
    sgroups: IndexMap<u32, (Sgroup, Option<(usize, u32)>)>,
}

impl CtabState {
    fn read_atom(&mut self, statement: &Statement, options: &ReaderOptions) -> IoResult<()> {
        let mode = options.mode;
        let line = statement.line;
        let mut positional = statement.positional();

        // `NOT [C,N]` atom lists take two fields
        let negated = positional
            .get(1)
            .and_then(|v| v.as_text())
            .is_some_and(|t| t.eq_ignore_ascii_case("NOT"));
        if negated {
            positional.remove(1);
        }

        let id = number(positional.first().copied(), "atom id", 0u32).resolve(mode, line)?;
        let symbol = positional.get(1).and_then(|v| v.as_text()).unwrap_or("");
        let mut atom = if negated || symbol.starts_with('[') {
            Atom::pseudo("L")
        } else {
            super::resolve_symbol(symbol, options, line)?
        };

        let mut point = [0.0f32; 3];
        for (axis, slot) in point.iter_mut().enumerate() {
            *slot = number(positional.get(2 + axis).copied(), "coordinate", 0.0f32).resolve(mode, line)?;
        }
        if let Some(map) = positional.get(5) {
            atom.map_number = number(Some(*map), "atom map", 0u32).resolve(mode, line)?;
        }

        for (key, value) in statement.keyed() {
            match key {
                "CHG" => atom.formal_charge = number(Some(value), "charge", 0i8).resolve(mode, line)?,
                "MASS" => {
                    let mass = number(Some(value), "mass", 0u16).resolve(mode, line)?;
                    atom.mass_number = (mass > 0).then_some(mass);
                }
                "RAD" => {
                    let code = number(Some(value), "radical", 0i32).resolve(mode, line)?;
                    atom.radical = match Radical::from_mdl(code) {
                        Some(radical) => radical,
                        None => FieldValue::Invalid {
                            reason: format!("invalid radical {}", code),
                            fallback: Radical::None,
                        }
                        .resolve(mode, line)?,
                    };
                }
                "VAL" => {
                    atom.valence = match number(Some(value), "valence", 0i32).resolve(mode, line)? {
                        -1 => Some(0),
                        v @ 1..=14 => Some(v as u8),
                        _ => None,
                    };
                }
                "CFG" => {
                    let parity = number(Some(value), "atom configuration", 0u8).resolve(mode, line)?;
                    atom.stereo_parity = parity.min(3);
                }
                other => log::debug!("line {}: ignoring atom property {}", line, other),
            }
        }

        if self.atom_ids.contains_key(&id) {
            return field::tolerate(mode, line, format!("duplicate atom id {}", id));
        }
        self.atoms.push(atom);
        self.points.push(point);
        self.atom_ids.insert(id, self.atoms.len() as u32);
        Ok(())
    }

    /// Move the collected atoms into the draft once the atom block is closed
    fn flush_atoms(&mut self, draft: &mut MoleculeDraft, declared: Option<u8>, options: &ReaderOptions) {
        super::assign_coordinates(&mut self.atoms, &self.points, declared, options);
        for atom in self.atoms.drain(..) {
            draft.add_atom(atom);
        }
        self.points.clear();
    }

    fn read_bond(
        &mut self,
        statement: &Statement,
        draft: &mut MoleculeDraft,
        options: &ReaderOptions,
    ) -> IoResult<()> {
        let mode = options.mode;
        let line = statement.line;
        let positional = statement.positional();

        let id = number(positional.first().copied(), "bond id", 0u32).resolve(mode, line)?;
        let code = number(positional.get(1).copied(), "bond type", 0i32).resolve(mode, line)?;
        let order = match BondOrder::from_mdl(code) {
            Some(order) => order,
            None => FieldValue::Invalid {
                reason: format!("invalid bond type {}", code),
                fallback: BondOrder::Unset,
            }
            .resolve(mode, line)?,
        };

        let mut stereo = BondStereo::None;
        for (key, value) in statement.keyed() {
            if key == "CFG" {
                let cfg = number(Some(value), "bond configuration", 0i32).resolve(mode, line)?;
                stereo = match BondStereo::from_v3000(cfg, order) {
                    Some(stereo) => stereo,
                    None => FieldValue::Invalid {
                        reason: format!("invalid bond configuration {}", cfg),
                        fallback: BondStereo::None,
                    }
                    .resolve(mode, line)?,
                };
            }
        }
        if !stereo.is_legal_for(order) {
            field::tolerate(
                mode,
                line,
                format!("bond stereo {:?} is not allowed on a {:?} bond", stereo, order),
            )?;
            stereo = BondStereo::None;
        }

        let endpoint = |n: usize| -> IoResult<u32> {
            let id = number(positional.get(n).copied(), "bond atom", 0u32).resolve(mode, line)?;
            Ok(self.atom_ids.get(&id).copied().unwrap_or(0))
        };
        let (first, second) = (endpoint(2)?, endpoint(3)?);

        if let Some(bond) = super::add_bond(draft, first, second, order, stereo, options, line)? {
            self.bond_ids.insert(id, bond);
        }
        Ok(())
    }

    fn read_sgroup(&mut self, statement: &Statement, options: &ReaderOptions) -> IoResult<()> {
        let mode = options.mode;
        let line = statement.line;
        let positional = statement.positional();

        let id = number(positional.first().copied(), "Sgroup id", 0u32).resolve(mode, line)?;
        let kind = positional.get(1).and_then(|v| v.as_text()).unwrap_or("");
        let kind = match kind.parse::<SgroupType>() {
            Ok(kind) => kind,
            Err(reason) => return field::tolerate(mode, line, reason),
        };

        let mut group = Sgroup::new(kind);
        let mut parent = None;
        for (key, value) in statement.keyed() {
            match key {
                "ATOMS" => {
                    for atom in counted_list(value, line, options)? {
                        match self.atom_ids.get(&atom) {
                            Some(&n) => group.atoms.push(AtomIndex(n - 1)),
                            None => field::tolerate(mode, line, format!("Sgroup references missing atom {}", atom))?,
                        }
                    }
                }
                "BONDS" | "XBONDS" | "CBONDS" => {
                    for bond in counted_list(value, line, options)? {
                        match self.bond_ids.get(&bond) {
                            Some(&b) if !group.bonds.contains(&b) => group.bonds.push(b),
                            Some(_) => {}
                            None => field::tolerate(mode, line, format!("Sgroup references missing bond {}", bond))?,
                        }
                    }
                }
                "LABEL" => group.label = value.as_text().map(String::from),
                "SUBTYPE" => group.subtype = value.as_text().map(String::from),
                "CONNECT" => {
                    group.connectivity = value.as_text().and_then(SgroupConnectivity::from_code)
                }
                "FIELDNAME" => group.field_name = value.as_text().map(String::from),
                "FIELDDATA" => group.data = value.as_text().map(String::from),
                "PARENT" => {
                    parent = Some((line, number(Some(value), "parent", 0u32).resolve(mode, line)?))
                }
                "BRKXYZ" => {
                    let Value::List(items) = value else { continue };
                    let xyz: Option<Vec<f32>> = items.iter().skip(1).map(|i| i.parse().ok()).collect();
                    match xyz.as_deref() {
                        Some([x1, y1, _, x2, y2, ..]) => group.brackets.push(SgroupBracket {
                            first: [*x1, *y1],
                            second: [*x2, *y2],
                        }),
                        _ => field::tolerate(mode, line, "malformed BRKXYZ list")?,
                    }
                }
                other => log::debug!("line {}: ignoring Sgroup property {}", line, other),
            }
        }

        if self.sgroups.contains_key(&id) {
            return field::tolerate(mode, line, format!("duplicate Sgroup id {}", id));
        }
        self.sgroups.insert(id, (group, parent));
        Ok(())
    }

    fn finish(mut self, draft: &mut MoleculeDraft, options: &ReaderOptions) -> IoResult<()> {
        let mode = options.mode;
        if !self.atoms.is_empty() {
            // atom block never closed by BEGIN BOND; keep what was read
            self.flush_atoms(draft, None, options);
        }
        if let Some(n) = self.declared_atoms.filter(|&n| n != draft.atom_count()) {
            field::tolerate(
                mode,
                0,
                format!("COUNTS declares {} atoms, block holds {}", n, draft.atom_count()),
            )?;
        }
        if let Some(n) = self.declared_bonds.filter(|&n| n != draft.bond_count()) {
            field::tolerate(
                mode,
                0,
                format!("COUNTS declares {} bonds, block holds {}", n, draft.bond_count()),
            )?;
        }

        let positions: AHashMap<u32, usize> = self
            .sgroups
            .keys()
            .enumerate()
            .map(|(position, &id)| (id, position))
            .collect();
        for (id, (mut group, parent)) in self.sgroups {
            if let Some((line, parent)) = parent {
                match positions.get(&parent) {
                    Some(&position) if parent != id => group.parent = Some(position),
                    _ => field::tolerate(mode, line, format!("Sgroup {} has invalid parent {}", id, parent))?,
                }
            }
            draft.add_sgroup(group)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(text: &str, options: &ReaderOptions) -> IoResult<MoleculeDraft> {
        let mut lines = LineReader::new(Cursor::new(text.as_bytes()));
        let mut draft = MoleculeDraft::new("t");
        read_ctab(&mut lines, &mut draft, None, options)?;
        Ok(draft)
    }

    #[test]
    fn test_fields() {
        let fields = parse_fields(r#"1 C 0.5 -1 0 0 CHG=-1 ATOMS=(2 1 3) LABEL="a ""b""""#).unwrap();
        assert_eq!(fields.len(), 9);
        assert_eq!(fields[1].value, Value::Text("C".into()));
        assert_eq!(fields[6].key.as_deref(), Some("CHG"));
        assert_eq!(
            fields[7].value,
            Value::List(vec!["2".into(), "1".into(), "3".into()])
        );
        assert_eq!(fields[8].value, Value::Text(r#"a "b""#.into()));
        assert!(parse_fields("1 C (2 1").is_err());
    }

    const ETHANOL: &str = "\
M  V30 BEGIN CTAB
M  V30 COUNTS 3 2 1 0 0
M  V30 BEGIN ATOM
M  V30 1 C 0 0 0 0
M  V30 2 C 1.2990 0.75 0 0 -
M  V30 CHG=1
M  V30 4 O 2.5981 0 0 0 MASS=18
M  V30 END ATOM
M  V30 BEGIN BOND
M  V30 1 1 1 2 CFG=1
M  V30 2 1 2 4
M  V30 END BOND
M  V30 BEGIN SGROUP
M  V30 1 SUP 0 ATOMS=(1 4) XBONDS=(1 2) LABEL=OH
M  V30 END SGROUP
M  V30 END CTAB
M  END
";

    #[test]
    fn test_read_ctab() {
        let draft = read(ETHANOL, &ReaderOptions::default()).unwrap();
        assert_eq!(draft.atom_count(), 3);
        assert_eq!(draft.bond_count(), 2);
        assert_eq!(draft.atom(AtomIndex(1)).unwrap().formal_charge, 1);
        assert_eq!(draft.atom(AtomIndex(2)).unwrap().mass_number, Some(18));
        assert_eq!(draft.atom(AtomIndex(1)).unwrap().point2d, Some([1.299, 0.75]));
        assert_eq!(draft.bond(BondIndex(0)).unwrap().stereo, BondStereo::Up);
        // atom id 4 is the third atom
        assert!(draft.find_bond(AtomIndex(1), AtomIndex(2)).is_some());

        let mol = draft.finalize().unwrap();
        let group = &mol.sgroups()[0];
        assert_eq!(group.kind, SgroupType::Superatom);
        assert_eq!(group.atoms, vec![AtomIndex(2)]);
        assert_eq!(group.bonds, vec![BondIndex(1)]);
        assert_eq!(group.label.as_deref(), Some("OH"));
    }

    #[test]
    fn test_unknown_blocks_skipped() {
        let text = "\
M  V30 BEGIN CTAB
M  V30 COUNTS 1 0 0 0 0
M  V30 BEGIN ATOM
M  V30 1 N 0 0 0 0 VAL=-1
M  V30 END ATOM
M  V30 BEGIN COLLECTION
M  V30 MDLV30/STEABS ATOMS=(1 1)
M  V30 END COLLECTION
M  V30 END CTAB
M  END
";
        let draft = read(text, &ReaderOptions::strict()).unwrap();
        assert_eq!(draft.atom_count(), 1);
        assert_eq!(draft.atom(AtomIndex(0)).unwrap().valence, Some(0));
    }

    #[test]
    fn test_count_mismatch() {
        let text = "\
M  V30 COUNTS 2 0 0 0 0
M  V30 BEGIN ATOM
M  V30 1 C 0 0 0 0
M  V30 END ATOM
M  END
";
        assert!(read(text, &ReaderOptions::strict()).is_err());
        assert_eq!(read(text, &ReaderOptions::default()).unwrap().atom_count(), 1);
    }

    #[test]
    fn test_malformed_statement_skipped_when_relaxed() {
        let text = ETHANOL.replace("LABEL=OH", "LABEL=\"OH");
        let err = read(&text, &ReaderOptions::strict()).unwrap_err();
        assert!(matches!(err, IoError::Parse { line: 14, .. }));

        let mol = read(&text, &ReaderOptions::default()).unwrap().finalize().unwrap();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert!(mol.sgroups().is_empty());
    }

    #[test]
    fn test_continuation_without_prefix() {
        let text = "\
M  V30 BEGIN ATOM
M  V30 1 C 0 0 0 0
M  V30 2 O 1.2 0 0 0 -
CHG=-1
M  V30 3 N 2.4 0 0 0
M  V30 END ATOM
M  END
";
        let err = read(text, &ReaderOptions::strict()).unwrap_err();
        assert!(matches!(err, IoError::Parse { line: 4, .. }));

        // the broken atom and the stray line are dropped
        let draft = read(text, &ReaderOptions::default()).unwrap();
        assert_eq!(draft.atom_count(), 2);
        assert_eq!(draft.atom(AtomIndex(1)).unwrap().element, chemio_mol::Element::NITROGEN);
    }

    #[test]
    fn test_unclosed_block() {
        let text = "M  V30 BEGIN ATOM\nM  V30 1 C 0 0 0 0\nM  END\n";
        assert!(read(text, &ReaderOptions::default()).is_err());
    }
}
