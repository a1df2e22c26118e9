//! Format registry and content detection
//!
//! The registry is an explicit object rather than a global: build one with
//! [`FormatRegistry::with_builtins`] (or [`crate::builtin_registry`] for a
//! shared instance) and register custom formats on it. Registration takes a
//! write lock; detection and lookups only take read locks, so a registry
//! can be shared across threads behind an `Arc`.
//!
//! When several formats match the same input, the one with the highest
//! priority wins and equal priorities go to the earliest registered format.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::detect::{self, PeekedInput, MAX_PEEK_BYTES, MAX_PEEK_LINES};
use crate::error::{IoError, IoResult};
use crate::format::{Capabilities, FormatDescriptor, MatchResult};
use crate::formats;

#[derive(Default)]
struct RegistryInner {
    /// Descriptors in registration order
    formats: Vec<Arc<FormatDescriptor>>,
    /// Format name to slot in `formats`
    by_name: AHashMap<String, usize>,
}

/// Catalog of known formats
#[derive(Default)]
pub struct FormatRegistry {
    inner: RwLock<RegistryInner>,
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_list()
            .entries(inner.formats.iter().map(|format| &format.name))
            .finish()
    }
}

impl FormatRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in formats, in manifest order
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for descriptor in formats::builtin_descriptors() {
            registry.register(descriptor);
        }
        registry
    }

    /// Create a registry from a manifest of built-in format identifiers
    ///
    /// The manifest lists one identifier per line; blank lines and `#`
    /// comments are ignored. Unknown identifiers are an error.
    pub fn from_manifest(manifest: &str) -> IoResult<Self> {
        let registry = Self::new();
        for identifier in formats::manifest_identifiers(manifest) {
            let descriptor = formats::builtin(identifier)
                .ok_or_else(|| IoError::UnknownFormat(identifier.to_string()))?;
            registry.register(descriptor);
        }
        Ok(registry)
    }

    /// Register a format
    ///
    /// Registering a name again replaces the earlier descriptor in place,
    /// keeping its position in the registration order.
    pub fn register(&self, descriptor: FormatDescriptor) -> Arc<FormatDescriptor> {
        let descriptor = Arc::new(descriptor);
        let mut inner = self.inner.write();
        match inner.by_name.get(&descriptor.name).copied() {
            Some(slot) => {
                log::debug!("re-registering format '{}'", descriptor.name);
                inner.formats[slot] = Arc::clone(&descriptor);
            }
            None => {
                let slot = inner.formats.len();
                inner.by_name.insert(descriptor.name.clone(), slot);
                inner.formats.push(Arc::clone(&descriptor));
            }
        }
        descriptor
    }

    /// Look up a format by name
    pub fn get(&self, name: &str) -> Option<Arc<FormatDescriptor>> {
        let inner = self.inner.read();
        inner
            .by_name
            .get(name)
            .map(|&slot| Arc::clone(&inner.formats[slot]))
    }

    /// All formats in registration order
    pub fn formats(&self) -> Vec<Arc<FormatDescriptor>> {
        self.inner.read().formats.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().formats.is_empty()
    }

    /// Number of leading lines detection has to read
    pub fn required_lines(&self) -> usize {
        self.inner
            .read()
            .formats
            .iter()
            .filter(|f| f.is_sniffable())
            .map(|f| f.required_lines)
            .max()
            .unwrap_or(0)
            .min(MAX_PEEK_LINES)
    }

    /// Find the best-matching format for a prefix of lines
    pub fn guess_lines(&self, lines: &[String]) -> MatchResult {
        if lines.is_empty() {
            return MatchResult::unknown();
        }
        let inner = self.inner.read();
        let mut best: Option<&Arc<FormatDescriptor>> = None;
        for format in inner.formats.iter().filter(|f| f.matches(lines)) {
            match best {
                Some(current) if format.priority <= current.priority => {
                    if format.priority == current.priority {
                        log::debug!(
                            "'{}' also matches; keeping earlier '{}'",
                            format.name,
                            current.name
                        );
                    }
                }
                _ => best = Some(format),
            }
        }
        match best {
            Some(format) => {
                log::debug!("detected format '{}'", format.name);
                MatchResult::matched(Arc::clone(format))
            }
            None => MatchResult::unknown(),
        }
    }

    /// Detect the format of an input
    ///
    /// Only a bounded prefix is read. The returned [`PeekedInput`] yields
    /// the whole (decompressed) content from its first byte. An unknown
    /// format is reported through the [`MatchResult`], not as an error;
    /// errors are reserved for failures reading the input.
    pub fn guess_format<R: Read>(&self, input: R) -> IoResult<(MatchResult, PeekedInput<R>)> {
        let (lines, input) = detect::peek(input, self.required_lines(), MAX_PEEK_BYTES)?;
        Ok((self.guess_lines(&lines), input))
    }

    /// Formats whose capabilities include `capability`, in registration order
    pub fn find_formats_by_capability(&self, capability: Capabilities) -> Vec<Arc<FormatDescriptor>> {
        self.inner
            .read()
            .formats
            .iter()
            .filter(|f| f.supports(capability))
            .cloned()
            .collect()
    }

    /// Find a format from a file name, ignoring a trailing `.gz`
    ///
    /// Formats whose preferred extension matches win over formats listing
    /// it as an alternate.
    pub fn find_by_extension(&self, path: &Path) -> Option<Arc<FormatDescriptor>> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        let (_, extension) = name.rsplit_once('.')?;

        let inner = self.inner.read();
        let preferred = inner
            .formats
            .iter()
            .find(|f| f.preferred_extension().is_some_and(|e| e.eq_ignore_ascii_case(extension)));
        preferred
            .or_else(|| {
                inner
                    .formats
                    .iter()
                    .find(|f| f.extensions.iter().any(|e| e.eq_ignore_ascii_case(extension)))
            })
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts_with_a(lines: &[String]) -> bool {
        lines.first().is_some_and(|l| l.starts_with('A'))
    }

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    #[test]
    fn test_register_last_write_wins() {
        let registry = FormatRegistry::new();
        registry.register(FormatDescriptor::new("One").with_extensions(&["one"]));
        registry.register(FormatDescriptor::new("Two"));
        registry.register(FormatDescriptor::new("One").with_extensions(&["uno"]));

        assert_eq!(registry.len(), 2);
        let names: Vec<_> = registry.formats().iter().map(|f| f.name.clone()).collect();
        assert_eq!(names, vec!["One", "Two"]);
        assert_eq!(registry.get("One").unwrap().extensions, vec!["uno"]);
    }

    #[test]
    fn test_tie_break() {
        let registry = FormatRegistry::new();
        registry.register(FormatDescriptor::new("First").with_matcher(starts_with_a, 1));
        registry.register(FormatDescriptor::new("Second").with_matcher(starts_with_a, 1));
        assert_eq!(registry.guess_lines(&lines("ABC")).name(), Some("First"));

        registry.register(
            FormatDescriptor::new("Preferred")
                .with_matcher(starts_with_a, 1)
                .with_priority(5),
        );
        assert_eq!(registry.guess_lines(&lines("ABC")).name(), Some("Preferred"));
        assert!(!registry.guess_lines(&lines("xyz")).is_match());
        assert!(!registry.guess_lines(&[]).is_match());
    }

    #[test]
    fn test_builtin_manifest() {
        let registry = FormatRegistry::from_manifest(formats::BUILTIN_MANIFEST).unwrap();
        assert_eq!(registry.len(), FormatRegistry::with_builtins().len());
        assert!(FormatRegistry::from_manifest("NoSuchFormat\n").is_err());
        assert!(FormatRegistry::from_manifest("# comment\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_capability_lookup() {
        let registry = FormatRegistry::with_builtins();
        let names: Vec<_> = registry
            .find_formats_by_capability(Capabilities::SGROUPS)
            .iter()
            .map(|f| f.name.clone())
            .collect();
        assert!(names.contains(&formats::names::SDF.to_string()));
        assert!(!names.contains(&formats::names::XYZ.to_string()));
    }

    #[test]
    fn test_find_by_extension() {
        let registry = FormatRegistry::with_builtins();
        let name = |p: &str| registry.find_by_extension(Path::new(p)).map(|f| f.name.clone());
        assert_eq!(name("bf3.xyz").as_deref(), Some(formats::names::XYZ));
        assert_eq!(name("set.SDF.gz").as_deref(), Some(formats::names::SDF));
        assert_eq!(name("mol.mol").as_deref(), Some(formats::names::MDL_V2000));
        assert_eq!(name("1crn.ent").as_deref(), Some(formats::names::PDB));
        assert_eq!(name("noext"), None);
    }

    #[test]
    fn test_concurrent_register_and_detect() {
        fn never(_: &[String]) -> bool {
            false
        }

        let registry = FormatRegistry::with_builtins();
        let builtins = registry.len();
        let xyz = "3\nwater\nO 0 0 0\nH 0.96 0 0\nH -0.24 0.93 0\n";

        std::thread::scope(|scope| {
            for t in 0..4 {
                let registry = &registry;
                scope.spawn(move || {
                    for i in 0..25 {
                        registry.register(
                            FormatDescriptor::new(format!("Custom {t}-{i}"))
                                .with_matcher(never, 3)
                                .with_priority(100),
                        );
                    }
                });
            }
            for _ in 0..4 {
                let registry = &registry;
                scope.spawn(move || {
                    for _ in 0..50 {
                        let (result, _) = registry.guess_format(xyz.as_bytes()).unwrap();
                        assert_eq!(result.name(), Some(formats::names::XYZ));
                    }
                });
            }
        });

        assert_eq!(registry.len(), builtins + 100);
        for t in 0..4 {
            for i in 0..25 {
                assert!(registry.get(&format!("Custom {t}-{i}")).is_some());
            }
        }
        let (result, _) = registry.guess_format(xyz.as_bytes()).unwrap();
        assert_eq!(result.name(), Some(formats::names::XYZ));
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FormatRegistry>();
    }
}
