//! Built-in format descriptors
//!
//! The registration order of the built-ins comes from the
//! `resources/io_formats.set` manifest compiled into the crate.

use std::io::{BufRead, Write};

use crate::cml::{self, CmlReader};
use crate::format::{Capabilities, FormatDescriptor};
use crate::mdl::{self, MdlReader, MdlWriter};
use crate::options::ReaderOptions;
use crate::pdb::{self, PdbReader};
use crate::traits::{MoleculeReader, MoleculeWriter};
use crate::xyz::{self, XyzReader, XyzWriter};

/// Manifest listing the built-in formats
pub const BUILTIN_MANIFEST: &str = include_str!("../resources/io_formats.set");

/// Names of the built-in formats
pub mod names {
    pub const SDF: &str = "MDL Structure-data file";
    pub const MDL_V2000: &str = "MDL Molfile";
    pub const MDL_V3000: &str = "MDL Molfile V3000";
    pub const MDL_RXN: &str = "MDL RXN";
    pub const CML: &str = "Chemical Markup Language";
    pub const PDB: &str = "Protein Brookhaven Database (PDB)";
    pub const XYZ: &str = "XYZ";
    pub const CDX: &str = "ChemDraw eXchange file";
}

/// Identifiers of a manifest, skipping blank lines and `#` comments
pub fn manifest_identifiers(manifest: &str) -> impl Iterator<Item = &str> {
    manifest
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
}

/// Built-in descriptors in manifest order
pub fn builtin_descriptors() -> Vec<FormatDescriptor> {
    manifest_identifiers(BUILTIN_MANIFEST)
        .filter_map(builtin)
        .collect()
}

/// Resolve a manifest identifier (or a format name) to its descriptor
pub fn builtin(identifier: &str) -> Option<FormatDescriptor> {
    let descriptor = match identifier {
        "SDFFormat" | names::SDF => sdf(),
        "MDLV2000Format" | names::MDL_V2000 => mdl_v2000(),
        "MDLV3000Format" | names::MDL_V3000 => mdl_v3000(),
        "MDLRXNFormat" | names::MDL_RXN => mdl_rxn(),
        "CMLFormat" | names::CML => cml(),
        "PDBFormat" | names::PDB => pdb(),
        "XYZFormat" | names::XYZ => xyz(),
        "CDXFormat" | names::CDX => cdx(),
        _ => return None,
    };
    Some(descriptor)
}

const MDL_CAPABILITIES: Capabilities = Capabilities::COORDINATES_2D
    .union(Capabilities::COORDINATES_3D)
    .union(Capabilities::BOND_ORDERS)
    .union(Capabilities::FORMAL_CHARGES)
    .union(Capabilities::ISOTOPES)
    .union(Capabilities::STEREO)
    .union(Capabilities::SGROUPS)
    .union(Capabilities::QUERY_BONDS);

fn sdf() -> FormatDescriptor {
    FormatDescriptor::new(names::SDF)
        .with_mime_type("chemical/x-mdl-sdfile")
        .with_extensions(&["sdf", "sd"])
        .with_capabilities(
            MDL_CAPABILITIES | Capabilities::PROPERTIES | Capabilities::MULTIPLE_RECORDS,
        )
        .with_matcher(mdl::matches_sdf, 64)
        .with_priority(20)
        .with_reader(sdf_reader)
        .with_writer(sdf_writer)
}

fn mdl_v2000() -> FormatDescriptor {
    FormatDescriptor::new(names::MDL_V2000)
        .with_mime_type("chemical/x-mdl-molfile")
        .with_extensions(&["mol", "mdl"])
        .with_capabilities(MDL_CAPABILITIES)
        .with_matcher(mdl::matches_molfile, 4)
        .with_priority(10)
        .with_reader(molfile_reader)
        .with_writer(molfile_writer)
}

fn mdl_v3000() -> FormatDescriptor {
    FormatDescriptor::new(names::MDL_V3000)
        .with_mime_type("chemical/x-mdl-molfile")
        .with_extensions(&["mol"])
        .with_capabilities(MDL_CAPABILITIES)
        .with_matcher(mdl::matches_v3000, 8)
        .with_priority(15)
        .with_reader(v3000_reader)
}

fn mdl_rxn() -> FormatDescriptor {
    FormatDescriptor::new(names::MDL_RXN)
        .with_mime_type("chemical/x-mdl-rxnfile")
        .with_extensions(&["rxn"])
        .with_capabilities(MDL_CAPABILITIES | Capabilities::REACTIONS)
        .with_matcher(matches_rxn, 1)
        .with_priority(10)
}

fn cml() -> FormatDescriptor {
    FormatDescriptor::new(names::CML)
        .with_mime_type("chemical/x-cml")
        .with_extensions(&["cml", "xml"])
        .xml()
        .with_capabilities(
            Capabilities::COORDINATES_2D
                | Capabilities::COORDINATES_3D
                | Capabilities::BOND_ORDERS
                | Capabilities::FORMAL_CHARGES
                | Capabilities::ISOTOPES
                | Capabilities::MULTIPLE_RECORDS,
        )
        .with_matcher(cml::matches, 20)
        .with_priority(10)
        .with_reader(cml_reader)
}

fn pdb() -> FormatDescriptor {
    FormatDescriptor::new(names::PDB)
        .with_mime_type("chemical/x-pdb")
        .with_extensions(&["pdb", "ent"])
        .with_capabilities(
            Capabilities::COORDINATES_3D
                | Capabilities::FORMAL_CHARGES
                | Capabilities::MULTIPLE_RECORDS,
        )
        .with_matcher(pdb::matches, 10)
        .with_priority(5)
        .with_reader(pdb_reader)
}

fn xyz() -> FormatDescriptor {
    FormatDescriptor::new(names::XYZ)
        .with_mime_type("chemical/x-xyz")
        .with_extensions(&["xyz"])
        .with_capabilities(Capabilities::COORDINATES_3D | Capabilities::MULTIPLE_RECORDS)
        .with_matcher(xyz::matches, 3)
        .with_priority(5)
        .with_reader(xyz_reader)
        .with_writer(xyz_writer)
}

fn cdx() -> FormatDescriptor {
    FormatDescriptor::new(names::CDX)
        .with_mime_type("chemical/x-cdx")
        .with_extensions(&["cdx"])
        .with_capabilities(
            Capabilities::COORDINATES_2D | Capabilities::BOND_ORDERS | Capabilities::STEREO,
        )
        .with_matcher(matches_cdx, 1)
        .with_priority(10)
}

fn matches_rxn(lines: &[String]) -> bool {
    lines.first().is_some_and(|l| l.starts_with("$RXN"))
}

fn matches_cdx(lines: &[String]) -> bool {
    lines.first().is_some_and(|l| l.starts_with("VjCD0100"))
}

fn sdf_reader<'a>(input: Box<dyn BufRead + 'a>, options: ReaderOptions) -> Box<dyn MoleculeReader + 'a> {
    Box::new(MdlReader::with_options(input, options).named(names::SDF))
}

fn molfile_reader<'a>(input: Box<dyn BufRead + 'a>, options: ReaderOptions) -> Box<dyn MoleculeReader + 'a> {
    Box::new(MdlReader::with_options(input, options))
}

fn v3000_reader<'a>(input: Box<dyn BufRead + 'a>, options: ReaderOptions) -> Box<dyn MoleculeReader + 'a> {
    Box::new(MdlReader::with_options(input, options).named(names::MDL_V3000))
}

fn cml_reader<'a>(input: Box<dyn BufRead + 'a>, options: ReaderOptions) -> Box<dyn MoleculeReader + 'a> {
    Box::new(CmlReader::with_options(input, options))
}

fn pdb_reader<'a>(input: Box<dyn BufRead + 'a>, options: ReaderOptions) -> Box<dyn MoleculeReader + 'a> {
    Box::new(PdbReader::with_options(input, options))
}

fn xyz_reader<'a>(input: Box<dyn BufRead + 'a>, options: ReaderOptions) -> Box<dyn MoleculeReader + 'a> {
    Box::new(XyzReader::with_options(input, options))
}

fn sdf_writer<'a>(output: Box<dyn Write + 'a>) -> Box<dyn MoleculeWriter + 'a> {
    Box::new(MdlWriter::sdf(output))
}

fn molfile_writer<'a>(output: Box<dyn Write + 'a>) -> Box<dyn MoleculeWriter + 'a> {
    Box::new(MdlWriter::molfile(output))
}

fn xyz_writer<'a>(output: Box<dyn Write + 'a>) -> Box<dyn MoleculeWriter + 'a> {
    Box::new(XyzWriter::new(output))
}
