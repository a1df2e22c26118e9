//! Reader options and named settings
//!
//! Every option of [`ReaderOptions`] is also reachable by name, so callers
//! that only deal in strings (property files, GUIs, command lines) can
//! configure readers through [`ReaderOptions::set_by_name`] or a
//! [`SettingListener`].

use std::fmt;
use std::str::FromStr;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{IoError, IoResult};

/// Setting names understood by [`ReaderOptions::set_by_name`]
pub mod names {
    pub const READER_MODE: &str = "ReaderMode";
    pub const FORCE_READ_AS_3D: &str = "ForceReadAs3DCoordinates";
    pub const INTERPRET_HYDROGEN_ISOTOPES: &str = "InterpretHydrogenIsotopes";
    pub const ADD_STEREO_ELEMENTS: &str = "AddStereoElements";
}

/// How recoverable format violations are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReaderMode {
    /// Any violation aborts the read with a parse error
    Strict,
    /// Violations are logged and replaced by a fallback value
    #[default]
    Relaxed,
}

impl ReaderMode {
    pub fn name(&self) -> &'static str {
        match self {
            ReaderMode::Strict => "Strict",
            ReaderMode::Relaxed => "Relaxed",
        }
    }

    #[inline]
    pub fn is_strict(&self) -> bool {
        *self == ReaderMode::Strict
    }
}

impl FromStr for ReaderMode {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ReaderMode::Strict),
            "relaxed" => Ok(ReaderMode::Relaxed),
            other => Err(IoError::invalid_setting(
                names::READER_MODE,
                format!("expected Strict or Relaxed, got '{}'", other),
            )),
        }
    }
}

impl fmt::Display for ReaderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of a named setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingValue {
    Bool(bool),
    /// One of a fixed set of named choices
    Choice(String),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(v) => Some(*v),
            SettingValue::Choice(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Choice(v) => Some(v),
            SettingValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(v) => write!(f, "{}", v),
            SettingValue::Choice(v) => f.write_str(v),
        }
    }
}

/// A named reader setting with its current value
#[derive(Debug, Clone, PartialEq)]
pub struct IoSetting {
    pub name: &'static str,
    pub description: &'static str,
    pub value: SettingValue,
    /// Accepted string values
    pub options: &'static [&'static str],
}

const BOOL_OPTIONS: &[&str] = &["true", "false"];
const MODE_OPTIONS: &[&str] = &["Strict", "Relaxed"];

/// Source of answers for named settings
pub trait SettingListener {
    /// Value to use for the setting, or `None` to keep the current one
    fn answer(&self, setting: &IoSetting) -> Option<String>;
}

/// Listener answering from a name → value map
#[derive(Debug, Clone, Default)]
pub struct PropertiesListener {
    values: AHashMap<String, String>,
}

impl PropertiesListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertiesListener {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        PropertiesListener {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl SettingListener for PropertiesListener {
    fn answer(&self, setting: &IoSetting) -> Option<String> {
        self.values.get(setting.name).cloned()
    }
}

/// Options controlling how structure readers interpret their input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    pub mode: ReaderMode,
    /// Store 2D coordinate fields as 3D points
    pub force_read_as_3d: bool,
    /// Read `D` and `T` symbols as hydrogen isotopes instead of pseudo atoms
    pub interpret_hydrogen_isotopes: bool,
    /// Perceive stereo elements from coordinates when finalizing
    pub add_stereo_elements: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            mode: ReaderMode::Relaxed,
            force_read_as_3d: false,
            interpret_hydrogen_isotopes: true,
            add_stereo_elements: true,
        }
    }
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self::default().with_mode(ReaderMode::Strict)
    }

    pub fn with_mode(mut self, mode: ReaderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_force_read_as_3d(mut self, force: bool) -> Self {
        self.force_read_as_3d = force;
        self
    }

    pub fn with_hydrogen_isotopes(mut self, interpret: bool) -> Self {
        self.interpret_hydrogen_isotopes = interpret;
        self
    }

    pub fn with_stereo_elements(mut self, add: bool) -> Self {
        self.add_stereo_elements = add;
        self
    }

    /// Current options as named settings
    pub fn settings(&self) -> Vec<IoSetting> {
        vec![
            IoSetting {
                name: names::READER_MODE,
                description: "Treat recoverable format violations as errors (Strict) or warnings (Relaxed)",
                value: SettingValue::Choice(self.mode.name().to_string()),
                options: MODE_OPTIONS,
            },
            IoSetting {
                name: names::FORCE_READ_AS_3D,
                description: "Store 2D coordinates as 3D points",
                value: SettingValue::Bool(self.force_read_as_3d),
                options: BOOL_OPTIONS,
            },
            IoSetting {
                name: names::INTERPRET_HYDROGEN_ISOTOPES,
                description: "Read D and T as deuterium and tritium",
                value: SettingValue::Bool(self.interpret_hydrogen_isotopes),
                options: BOOL_OPTIONS,
            },
            IoSetting {
                name: names::ADD_STEREO_ELEMENTS,
                description: "Perceive stereo elements from 2D/3D coordinates",
                value: SettingValue::Bool(self.add_stereo_elements),
                options: BOOL_OPTIONS,
            },
        ]
    }

    /// Look up a setting value by name
    pub fn get_by_name(&self, name: &str) -> Option<SettingValue> {
        self.settings()
            .into_iter()
            .find(|s| s.name == name)
            .map(|s| s.value)
    }

    /// Set an option from its string form
    pub fn set_by_name(&mut self, name: &str, value: &str) -> IoResult<()> {
        match name {
            names::READER_MODE => self.mode = value.parse()?,
            names::FORCE_READ_AS_3D => self.force_read_as_3d = parse_bool(name, value)?,
            names::INTERPRET_HYDROGEN_ISOTOPES => {
                self.interpret_hydrogen_isotopes = parse_bool(name, value)?
            }
            names::ADD_STEREO_ELEMENTS => self.add_stereo_elements = parse_bool(name, value)?,
            _ => return Err(IoError::invalid_setting(name, "unknown setting")),
        }
        Ok(())
    }

    /// Ask a listener about every setting and apply its answers
    pub fn apply_listener(&mut self, listener: &dyn SettingListener) -> IoResult<()> {
        for setting in self.settings() {
            if let Some(answer) = listener.answer(&setting) {
                log::debug!("setting {} = {}", setting.name, answer);
                self.set_by_name(setting.name, &answer)?;
            }
        }
        Ok(())
    }
}

fn parse_bool(name: &str, value: &str) -> IoResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(IoError::invalid_setting(
            name,
            format!("expected true or false, got '{}'", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ReaderOptions::default();
        assert_eq!(options.mode, ReaderMode::Relaxed);
        assert!(!options.force_read_as_3d);
        assert!(options.interpret_hydrogen_isotopes);
        assert!(options.add_stereo_elements);
    }

    #[test]
    fn test_set_by_name() {
        let mut options = ReaderOptions::default();
        options.set_by_name("ReaderMode", "strict").unwrap();
        options.set_by_name("ForceReadAs3DCoordinates", "TRUE").unwrap();
        assert_eq!(options.mode, ReaderMode::Strict);
        assert!(options.force_read_as_3d);
        assert_eq!(
            options.get_by_name("ReaderMode"),
            Some(SettingValue::Choice("Strict".to_string()))
        );

        assert!(matches!(
            options.set_by_name("AddStereoElements", "maybe"),
            Err(IoError::InvalidSetting { .. })
        ));
        assert!(options.set_by_name("NoSuchSetting", "true").is_err());
    }

    #[test]
    fn test_properties_listener() {
        let listener: PropertiesListener = [
            ("InterpretHydrogenIsotopes", "false"),
            ("AddStereoElements", "false"),
        ]
        .into_iter()
        .collect();

        let mut options = ReaderOptions::default();
        options.apply_listener(&listener).unwrap();
        assert!(!options.interpret_hydrogen_isotopes);
        assert!(!options.add_stereo_elements);
        assert_eq!(options.mode, ReaderMode::Relaxed);
    }
}
