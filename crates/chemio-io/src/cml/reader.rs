//! CML document reader

use std::io::BufRead;

use ahash::AHashMap;
use chemio_mol::{Atom, AtomIndex, BondIndex, BondOrder, BondStereo, Element, Molecule, MoleculeDraft};
use lin_alg::f32::Vec3;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use smallvec::SmallVec;

use crate::error::{IoError, IoResult};
use crate::formats::names;
use crate::options::ReaderOptions;
use crate::traits::MoleculeReader;

type Attributes = SmallVec<[(String, String); 8]>;

fn attribute<'a>(attrs: &'a Attributes, key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

#[derive(Debug)]
struct PendingBond {
    position: u64,
    refs: (String, String),
    order: BondOrder,
    stereo: BondStereo,
}

/// Molecule under construction; nested `molecule` elements are merged
#[derive(Debug, Default)]
struct MoleculeBuilder {
    depth: usize,
    title: String,
    atoms: Vec<Atom>,
    ids: AHashMap<String, usize>,
    hydrogen_counts: Vec<(usize, u8)>,
    bonds: Vec<PendingBond>,
    current_bond: Option<usize>,
    in_bond_stereo: bool,
}

/// Chemical Markup Language reader
///
/// Every top-level `molecule` element is one record. Atoms and bonds can be
/// given one per element or in array form.
pub struct CmlReader<R> {
    xml: Reader<R>,
    options: ReaderOptions,
    buf: Vec<u8>,
    finished: bool,
}

impl<R: BufRead> CmlReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ReaderOptions::default())
    }

    pub fn with_options(reader: R, options: ReaderOptions) -> Self {
        let mut xml = Reader::from_reader(reader);
        xml.config_mut().trim_text(true);
        CmlReader {
            xml,
            options,
            buf: Vec::new(),
            finished: false,
        }
    }

    fn position(&self) -> u64 {
        self.xml.buffer_position()
    }

    /// Strict mode fails; relaxed mode logs and carries on
    fn tolerate(&self, reason: impl Into<String>) -> IoResult<()> {
        let reason = reason.into();
        if self.options.mode.is_strict() {
            Err(IoError::xml(self.position(), reason))
        } else {
            log::warn!("byte {}: {}; ignored", self.position(), reason);
            Ok(())
        }
    }

    fn attributes(&self, element: &BytesStart) -> IoResult<Attributes> {
        let mut attrs = Attributes::new();
        for attr in element.attributes() {
            let attr = attr.map_err(|e| IoError::xml(self.position(), e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| IoError::xml(self.position(), e.to_string()))?;
            attrs.push((key, value.into_owned()));
        }
        Ok(attrs)
    }

    fn parse_molecule(&mut self) -> IoResult<Option<Molecule>> {
        let mut builder: Option<MoleculeBuilder> = None;
        let mut buf = std::mem::take(&mut self.buf);

        let result = loop {
            buf.clear();
            let event = match self.xml.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => break Err(IoError::xml(self.xml.error_position(), e.to_string())),
            };

            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let empty = matches!(event, Event::Empty(_));
                    let name = e.local_name();
                    let attrs = match self.attributes(e) {
                        Ok(attrs) => attrs,
                        Err(e) => break Err(e),
                    };
                    let step = match name.as_ref() {
                        b"molecule" => {
                            let b = builder.get_or_insert_with(MoleculeBuilder::default);
                            if b.depth == 0 {
                                b.title = attribute(&attrs, "title")
                                    .or_else(|| attribute(&attrs, "id"))
                                    .unwrap_or_default()
                                    .to_string();
                            }
                            if empty {
                                if b.depth == 0 {
                                    break builder.take().map(|b| self.finish(b)).transpose();
                                }
                            } else {
                                b.depth += 1;
                            }
                            Ok(())
                        }
                        _ if builder.is_none() => Ok(()),
                        b"atom" => self.read_atom(builder.as_mut(), &attrs),
                        b"atomArray" => self.read_atom_array(builder.as_mut(), &attrs),
                        b"bond" => {
                            let before = builder.as_ref().map_or(0, |b| b.bonds.len());
                            let result = self.read_bond(builder.as_mut(), &attrs);
                            if let Some(b) = builder.as_mut() {
                                b.current_bond = (!empty && b.bonds.len() > before).then_some(before);
                            }
                            result
                        }
                        b"bondArray" => self.read_bond_array(builder.as_mut(), &attrs),
                        b"bondStereo" => {
                            if let Some(b) = builder.as_mut() {
                                b.in_bond_stereo = !empty;
                            }
                            Ok(())
                        }
                        _ => Ok(()),
                    };
                    if let Err(e) = step {
                        break Err(e);
                    }
                }
                Event::Text(ref t) => {
                    let Some(b) = builder.as_mut() else { continue };
                    if !b.in_bond_stereo {
                        continue;
                    }
                    let text = match t.unescape() {
                        Ok(text) => text,
                        Err(e) => break Err(IoError::xml(self.position(), e.to_string())),
                    };
                    let stereo = match text.trim() {
                        "W" => Some(BondStereo::Up),
                        "H" => Some(BondStereo::Down),
                        other => {
                            log::warn!(
                                "byte {}: bond stereo '{}' not supported; dropped",
                                self.position(),
                                other
                            );
                            None
                        }
                    };
                    if let (Some(stereo), Some(i)) = (stereo, b.current_bond) {
                        b.bonds[i].stereo = stereo;
                    }
                }
                Event::End(ref e) => {
                    let Some(b) = builder.as_mut() else { continue };
                    match e.local_name().as_ref() {
                        b"bondStereo" => b.in_bond_stereo = false,
                        b"bond" => b.current_bond = None,
                        b"molecule" => {
                            b.depth = b.depth.saturating_sub(1);
                            if b.depth == 0 {
                                break builder.take().map(|b| self.finish(b)).transpose();
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof => {
                    self.finished = true;
                    break match builder.take() {
                        Some(b) => self
                            .tolerate("document ended inside a molecule")
                            .and_then(|_| self.finish(b))
                            .map(Some),
                        None => Ok(None),
                    };
                }
                _ => {}
            }
        };

        self.buf = buf;
        result
    }

    fn atom_for_element(&self, element_type: Option<&str>) -> IoResult<Atom> {
        match element_type {
            None | Some("") => {
                self.tolerate("atom without elementType")?;
                Ok(Atom::pseudo("*"))
            }
            Some(symbol @ ("R" | "Du" | "*")) => Ok(Atom::pseudo(symbol)),
            Some(symbol) => match Element::from_symbol(symbol) {
                Some(element) => Ok(Atom::new(element.symbol(), element)),
                None => {
                    self.tolerate(format!("unknown element '{}'", symbol))?;
                    Ok(Atom::pseudo(symbol))
                }
            },
        }
    }

    fn number<T: std::str::FromStr>(&self, value: Option<&str>, what: &str) -> IoResult<Option<T>> {
        let Some(value) = value else { return Ok(None) };
        match value.trim().parse() {
            Ok(n) => Ok(Some(n)),
            Err(_) => {
                self.tolerate(format!("invalid {} '{}'", what, value))?;
                Ok(None)
            }
        }
    }

    /// Apply coordinates, charge, isotope and hydrogen count to an atom
    fn fill_atom(&self, atom: &mut Atom, get: &dyn Fn(&str) -> Option<String>) -> IoResult<Option<u8>> {
        let coord = |key: &str| self.number::<f32>(get(key).as_deref(), key);
        let (x3, y3, z3) = (coord("x3")?, coord("y3")?, coord("z3")?);
        let (x2, y2) = (coord("x2")?, coord("y2")?);
        if let (Some(x), Some(y), Some(z)) = (x3, y3, z3) {
            atom.point3d = Some(Vec3::new(x, y, z));
        } else if let (Some(x), Some(y)) = (x2, y2) {
            if self.options.force_read_as_3d {
                atom.point3d = Some(Vec3::new(x, y, 0.0));
            } else {
                atom.point2d = Some([x, y]);
            }
        }
        if let Some(charge) = self.number::<i8>(get("formalCharge").as_deref(), "formalCharge")? {
            atom.formal_charge = charge;
        }
        if let Some(mass) = self.number::<u16>(get("isotopeNumber").as_deref(), "isotopeNumber")? {
            atom.mass_number = Some(mass);
        }
        self.number::<u8>(get("hydrogenCount").as_deref(), "hydrogenCount")
    }

    fn push_atom(
        &self,
        builder: &mut MoleculeBuilder,
        id: Option<String>,
        atom: Atom,
        hydrogens: Option<u8>,
    ) -> IoResult<()> {
        let index = builder.atoms.len();
        let id = id.unwrap_or_else(|| format!("a{}", index + 1));
        if builder.ids.contains_key(&id) {
            self.tolerate(format!("duplicate atom id '{}'", id))?;
        } else {
            builder.ids.insert(id, index);
        }
        if let Some(h) = hydrogens {
            builder.hydrogen_counts.push((index, h));
        }
        builder.atoms.push(atom);
        Ok(())
    }

    fn read_atom(&self, builder: Option<&mut MoleculeBuilder>, attrs: &Attributes) -> IoResult<()> {
        let Some(builder) = builder else { return Ok(()) };
        let mut atom = self.atom_for_element(attribute(attrs, "elementType"))?;
        let hydrogens = self.fill_atom(&mut atom, &|key| attribute(attrs, key).map(String::from))?;
        let id = attribute(attrs, "id").map(String::from);
        self.push_atom(builder, id, atom, hydrogens)
    }

    /// `atomArray` with space-separated `atomID`, `elementType`, ... lists
    fn read_atom_array(&self, builder: Option<&mut MoleculeBuilder>, attrs: &Attributes) -> IoResult<()> {
        let Some(builder) = builder else { return Ok(()) };
        let column = |key: &str| -> Vec<&str> {
            attribute(attrs, key)
                .map(|v| v.split_whitespace().collect())
                .unwrap_or_default()
        };
        let ids = column("atomID");
        let elements = column("elementType");
        if ids.is_empty() && elements.is_empty() {
            return Ok(());
        }
        let n = ids.len().max(elements.len());

        const KEYS: [&str; 8] = [
            "x2", "y2", "x3", "y3", "z3", "formalCharge", "isotopeNumber", "hydrogenCount",
        ];
        let columns: Vec<(&str, Vec<&str>)> = KEYS
            .iter()
            .map(|&k| (k, column(k)))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        let short = std::iter::once(("elementType", elements.len()))
            .chain(std::iter::once(("atomID", ids.len())))
            .chain(columns.iter().map(|(k, v)| (*k, v.len())))
            .find(|&(_, len)| len != 0 && len != n);
        if let Some((key, len)) = short {
            self.tolerate(format!("atomArray {} has {} entries, expected {}", key, len, n))?;
        }

        for i in 0..n {
            let mut atom = self.atom_for_element(elements.get(i).copied())?;
            let get = |key: &str| {
                columns
                    .iter()
                    .find(|(k, _)| *k == key)
                    .and_then(|(_, v)| v.get(i))
                    .map(|s| s.to_string())
            };
            let hydrogens = self.fill_atom(&mut atom, &get)?;
            let id = ids.get(i).map(|s| s.to_string());
            self.push_atom(builder, id, atom, hydrogens)?;
        }
        Ok(())
    }

    fn bond_order(&self, order: Option<&str>) -> IoResult<BondOrder> {
        Ok(match order.map(str::trim) {
            None => BondOrder::Single,
            Some("1" | "S" | "s") => BondOrder::Single,
            Some("2" | "D" | "d") => BondOrder::Double,
            Some("3" | "T" | "t") => BondOrder::Triple,
            Some("A" | "a") => BondOrder::Aromatic,
            Some(other) => {
                self.tolerate(format!("invalid bond order '{}'", other))?;
                BondOrder::Unset
            }
        })
    }

    fn read_bond(&self, builder: Option<&mut MoleculeBuilder>, attrs: &Attributes) -> IoResult<()> {
        let Some(builder) = builder else { return Ok(()) };
        let refs: Vec<&str> = attribute(attrs, "atomRefs2")
            .map(|v| v.split_whitespace().collect())
            .unwrap_or_default();
        let [first, second] = refs.as_slice() else {
            return self.tolerate(format!("bond atomRefs2 needs two atoms, got {}", refs.len()));
        };
        let order = self.bond_order(attribute(attrs, "order"))?;
        builder.bonds.push(PendingBond {
            position: self.position(),
            refs: (first.to_string(), second.to_string()),
            order,
            stereo: BondStereo::None,
        });
        Ok(())
    }

    /// `bondArray` with `atomRef1`, `atomRef2` and `order` lists
    fn read_bond_array(&self, builder: Option<&mut MoleculeBuilder>, attrs: &Attributes) -> IoResult<()> {
        let Some(builder) = builder else { return Ok(()) };
        let column = |key: &str| -> Vec<&str> {
            attribute(attrs, key)
                .map(|v| v.split_whitespace().collect())
                .unwrap_or_default()
        };
        let (first, second, orders) = (column("atomRef1"), column("atomRef2"), column("order"));
        if first.len() != second.len() || (!orders.is_empty() && orders.len() != first.len()) {
            self.tolerate(format!(
                "bondArray lists differ in length ({}, {}, {})",
                first.len(),
                second.len(),
                orders.len()
            ))?;
        }
        for (i, (a, b)) in first.iter().zip(&second).enumerate() {
            let order = self.bond_order(orders.get(i).copied())?;
            builder.bonds.push(PendingBond {
                position: self.position(),
                refs: (a.to_string(), b.to_string()),
                order,
                stereo: BondStereo::None,
            });
        }
        Ok(())
    }

    fn finish(&self, builder: MoleculeBuilder) -> IoResult<Molecule> {
        let mut draft =
            MoleculeDraft::with_capacity(builder.title, builder.atoms.len(), builder.bonds.len());
        for atom in builder.atoms {
            draft.add_atom(atom);
        }

        for bond in &builder.bonds {
            let lookup = |id: &str| builder.ids.get(id).map(|&i| AtomIndex(i as u32));
            let (Some(begin), Some(end)) = (lookup(&bond.refs.0), lookup(&bond.refs.1)) else {
                self.tolerate(format!(
                    "bond {} {} references an unknown atom id",
                    bond.refs.0, bond.refs.1
                ))?;
                continue;
            };
            if let Err(e) = draft.add_bond_with_stereo(begin, end, bond.order, bond.stereo) {
                if self.options.mode.is_strict() {
                    return Err(IoError::xml(bond.position, e.to_string()));
                }
                log::warn!("byte {}: {}; bond dropped", bond.position, e);
            }
        }

        // hydrogenCount is the total count; explicit hydrogen neighbours are
        // already part of the bond sum
        for (index, total) in builder.hydrogen_counts {
            let atom = AtomIndex(index as u32);
            let mut halves = 0u32;
            let mut explicit_h = 0u32;
            for b in 0..draft.bond_count() {
                let Some(bond) = draft.bond(BondIndex(b as u32)) else { continue };
                let Some(other) = bond.other(atom) else { continue };
                halves += bond.order.valence_halves();
                if draft.atom(other).is_some_and(|a| a.element == Element::HYDROGEN) {
                    explicit_h += 1;
                }
            }
            let implicit = (total as u32).saturating_sub(explicit_h);
            if let Some(a) = draft.atom_mut(atom) {
                a.valence = u8::try_from(halves.div_ceil(2) + implicit).ok();
            }
        }

        Ok(draft.finalize_with(self.options.add_stereo_elements)?)
    }
}

impl<R: BufRead> MoleculeReader for CmlReader<R> {
    fn format_name(&self) -> &'static str {
        names::CML
    }

    fn read_next(&mut self) -> IoResult<Option<Molecule>> {
        if self.finished {
            return Ok(None);
        }
        let result = self.parse_molecule();
        if result.is_err() {
            self.finished = true;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ReaderMode;

    const FORMALDEHYDE: &str = r#"<?xml version="1.0"?>
<cml xmlns="http://www.xml-cml.org/schema">
  <molecule id="m1" title="formaldehyde">
    <atomArray>
      <atom id="a1" elementType="C" x2="0.0" y2="0.0"/>
      <atom id="a2" elementType="O" x2="1.2" y2="0.0"/>
    </atomArray>
    <bondArray>
      <bond atomRefs2="a1 a2" order="2"/>
    </bondArray>
  </molecule>
</cml>
"#;

    fn read_all(text: &str, options: ReaderOptions) -> IoResult<Vec<Molecule>> {
        CmlReader::with_options(text.as_bytes(), options).read_all()
    }

    #[test]
    fn test_read_elements() {
        let mols = read_all(FORMALDEHYDE, ReaderOptions::default()).unwrap();
        assert_eq!(mols.len(), 1);
        let mol = &mols[0];
        assert_eq!(mol.title(), "formaldehyde");
        assert_eq!(mol.atom_count(), 2);
        assert_eq!(mol.bond_count(), 1);
        assert_eq!(mol.bond(BondIndex(0)).unwrap().order, BondOrder::Double);
        let carbon = mol.atom(AtomIndex(0)).unwrap();
        assert_eq!(carbon.element, Element::CARBON);
        assert_eq!(carbon.point2d, Some([0.0, 0.0]));
        assert_eq!(carbon.implicit_hydrogens, Some(2));
        assert!(mol.has_2d_coordinates());
    }

    #[test]
    fn test_force_3d() {
        let options = ReaderOptions::default().with_force_read_as_3d(true);
        let mol = &read_all(FORMALDEHYDE, options).unwrap()[0];
        let oxygen = mol.atom(AtomIndex(1)).unwrap();
        assert!(oxygen.point2d.is_none());
        let point = oxygen.point3d.unwrap();
        assert_eq!((point.x, point.y, point.z), (1.2, 0.0, 0.0));
    }

    #[test]
    fn test_array_form() {
        let text = r#"<molecule id="acetate">
  <atomArray atomID="a1 a2 a3 a4" elementType="C C O O" formalCharge="0 0 0 -1"
             x3="0 1.5 2.1 2.1" y3="0 0 1.0 -1.0" z3="0 0 0 0"/>
  <bondArray atomRef1="a1 a2 a2" atomRef2="a2 a3 a4" order="S D S"/>
</molecule>"#;
        let mol = &read_all(text, ReaderOptions::default()).unwrap()[0];
        assert_eq!(mol.title(), "acetate");
        assert_eq!(mol.atom_count(), 4);
        assert_eq!(mol.bond_count(), 3);
        assert_eq!(mol.atom(AtomIndex(3)).unwrap().formal_charge, -1);
        assert!(mol.has_3d_coordinates());
        assert_eq!(mol.atom(AtomIndex(0)).unwrap().implicit_hydrogens, Some(3));
    }

    #[test]
    fn test_multiple_molecules_and_stereo() {
        let text = r#"<cml>
  <molecule id="one">
    <atomArray><atom id="a1" elementType="C"/><atom id="a2" elementType="N"/></atomArray>
    <bondArray><bond atomRefs2="a1 a2" order="1"><bondStereo>W</bondStereo></bond></bondArray>
  </molecule>
  <molecule id="two"><atomArray><atom id="b1" elementType="Na" formalCharge="1"/></atomArray></molecule>
</cml>"#;
        let mols = read_all(text, ReaderOptions::default()).unwrap();
        assert_eq!(mols.len(), 2);
        assert_eq!(mols[0].bond(BondIndex(0)).unwrap().stereo, BondStereo::Up);
        assert_eq!(mols[1].atom(AtomIndex(0)).unwrap().formal_charge, 1);
    }

    #[test]
    fn test_cis_trans_stereo_dropped() {
        let text = r#"<molecule><atomArray>
  <atom id="a1" elementType="C"/><atom id="a2" elementType="C"/>
</atomArray><bondArray>
  <bond atomRefs2="a1 a2" order="D"><bondStereo atomRefs4="a1 a1 a2 a2">C</bondStereo></bond>
</bondArray></molecule>"#;
        let mol = &read_all(text, ReaderOptions::strict()).unwrap()[0];
        let bond = mol.bond(BondIndex(0)).unwrap();
        assert_eq!(bond.order, BondOrder::Double);
        assert_eq!(bond.stereo, BondStereo::None);
    }

    #[test]
    fn test_hydrogen_count() {
        let text = r#"<molecule><atomArray>
  <atom id="a1" elementType="C" hydrogenCount="2"/>
  <atom id="a2" elementType="C" hydrogenCount="2"/>
</atomArray><bondArray><bond atomRefs2="a1 a2" order="2"/></bondArray></molecule>"#;
        let mol = &read_all(text, ReaderOptions::default()).unwrap()[0];
        assert_eq!(mol.atom(AtomIndex(0)).unwrap().implicit_hydrogens, Some(2));
        assert_eq!(mol.implicit_hydrogen_count(), 4);
    }

    #[test]
    fn test_unknown_atom_ref() {
        let text = r#"<molecule><atomArray><atom id="a1" elementType="C"/></atomArray>
<bondArray><bond atomRefs2="a1 a9" order="1"/></bondArray></molecule>"#;
        let mol = &read_all(text, ReaderOptions::default()).unwrap()[0];
        assert_eq!(mol.bond_count(), 0);

        let err = read_all(text, ReaderOptions::strict()).unwrap_err();
        assert!(matches!(err, IoError::Xml { .. }));
    }

    #[test]
    fn test_unknown_element() {
        let text = r#"<molecule><atomArray><atom id="a1" elementType="Xx"/></atomArray></molecule>"#;
        let mol = &read_all(text, ReaderOptions::default()).unwrap()[0];
        assert!(mol.atom(AtomIndex(0)).unwrap().is_pseudo());
        assert!(read_all(text, ReaderOptions::default().with_mode(ReaderMode::Strict)).is_err());
    }

    #[test]
    fn test_empty_and_truncated() {
        assert!(read_all("", ReaderOptions::default()).unwrap().is_empty());
        assert!(read_all("<cml></cml>", ReaderOptions::default()).unwrap().is_empty());

        let truncated = r#"<molecule id="x"><atomArray><atom id="a1" elementType="O"/></atomArray>"#;
        let mols = read_all(truncated, ReaderOptions::default()).unwrap();
        assert_eq!(mols.len(), 1);
        assert!(read_all(truncated, ReaderOptions::strict()).is_err());
    }
}
