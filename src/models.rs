// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// --- COMMAND SPECIFICATION MODELS ---
// These are what the user writes in configuration (TOML or JSON). The
// template engine compiles them into its internal token representation.

/// A declarative command specification: an ordered sequence of entries,
/// one per command-line argument (plus `definition` entries, which carry
/// pre-bound named defaults instead of producing an argument).
///
/// In TOML this is an array of inline tables:
///
/// ```toml
/// cc = [
///     { t = "gcc" },
///     { c = [{ t = "-o" }, { p = 1 }] },
///     { p = 0 },
///     { d = { use_path = "true" } },
/// ]
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(transparent)]
pub struct CommandSpec(pub Vec<SpecEntry>);

impl CommandSpec {
    /// Parses a specification from a JSON array, e.g.
    /// `[{"t": "make"}, {"p": 0}]`.
    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}

/// One entry of a command specification: a single `key = value` pair whose
/// key carries the placeholder type tag (`t`/`text`, `p`/`positional`,
/// `n`/`named`, `c`/`complex`, `d`/`definition`).
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(transparent)]
pub struct SpecEntry(pub HashMap<String, SpecValue>);

impl SpecEntry {
    /// Builds an entry from one key/value pair.
    pub fn pair(key: impl Into<String>, value: SpecValue) -> Self {
        let mut map = HashMap::with_capacity(1);
        map.insert(key.into(), value);
        Self(map)
    }

    /// The entry's single pair, or `None` when the entry holds zero or
    /// several keys (the formats we load from cannot express a duplicate
    /// key within one entry, so a well-formed entry is exactly one pair).
    pub fn single(&self) -> Option<(&str, &SpecValue)> {
        let mut pairs = self.0.iter();
        match (pairs.next(), pairs.next()) {
            (Some((key, value)), None) => Some((key.as_str(), value)),
            _ => None,
        }
    }
}

/// The value side of a specification entry.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum SpecValue {
    /// An unsigned slot index (`p = 0`).
    Index(u64),
    /// Literal text, or the key of a named slot.
    Text(String),
    /// The children of a `complex` entry.
    Children(Vec<SpecEntry>),
    /// The key/value pairs of a `definition` entry.
    Pairs(HashMap<String, String>),
}

impl SpecValue {
    /// The value as literal text. Integers are stringified, the way a
    /// stringly-typed configuration tree would hand them out.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Index(index) => Some(index.to_string()),
            _ => None,
        }
    }

    /// The value as a positional slot index. A string that parses as an
    /// unsigned integer is accepted.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => usize::try_from(*index).ok(),
            Self::Text(text) => text.parse().ok(),
            _ => None,
        }
    }
}

// --- RESOLVER CONFIGURATION ---

/// Configured lookup tables for the path resolver. Values may use `~` and
/// environment variables; they are expanded when the resolver is built.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Logical name -> substitute name, applied before any other rule.
    #[serde(default)]
    pub alias: HashMap<String, String>,
    /// Name -> concrete path, returned directly when matched.
    #[serde(default)]
    pub absolute: HashMap<String, String>,
}

// --- TOOL REGISTRY CONFIGURATION ---

/// Top-level configuration for a set of invocable tools: declared command
/// specifications plus the resolver tables used for bare tool names.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ToolsConfig {
    #[serde(default)]
    pub tools: HashMap<String, CommandSpec>,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl ToolsConfig {
    /// Parses a full tools configuration from TOML.
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_from_json() {
        let spec = CommandSpec::from_json_str(
            r#"[{"t": "make"}, {"p": 0}, {"n": "mode"}, {"d": {"mode": "debug"}}]"#,
        )
        .unwrap();
        assert_eq!(spec.0.len(), 4);
        assert!(matches!(spec.0[0].single(), Some(("t", SpecValue::Text(s))) if s == "make"));
        assert!(matches!(spec.0[1].single(), Some(("p", SpecValue::Index(0)))));
        assert!(matches!(spec.0[3].single(), Some(("d", SpecValue::Pairs(_)))));
    }

    #[test]
    fn tools_config_from_toml() {
        let config = ToolsConfig::from_toml_str(
            r#"
            [resolver.alias]
            cc = "gcc"

            [resolver.absolute]
            gcc = "/opt/toolchain/bin/gcc"

            [tools]
            make = [{ t = "make" }, { p = 0 }]
            link = [{ c = [{ t = "--out=" }, { p = 0 }] }]
            "#,
        )
        .unwrap();
        assert_eq!(config.resolver.alias.get("cc").unwrap(), "gcc");
        assert_eq!(config.tools.len(), 2);
        let make = config.tools.get("make").unwrap();
        assert!(matches!(make.0[1].single(), Some(("p", SpecValue::Index(0)))));
        let link = config.tools.get("link").unwrap();
        assert!(matches!(link.0[0].single(), Some(("c", SpecValue::Children(c))) if c.len() == 2));
    }

    #[test]
    fn value_coercions() {
        assert_eq!(SpecValue::Index(3).as_text().as_deref(), Some("3"));
        assert_eq!(SpecValue::Text("7".into()).as_index(), Some(7));
        assert_eq!(SpecValue::Text("seven".into()).as_index(), None);
        assert_eq!(SpecValue::Children(Vec::new()).as_text(), None);
    }

    #[test]
    fn multi_key_entry_is_not_single() {
        let mut map = HashMap::new();
        map.insert("t".to_string(), SpecValue::Text("a".into()));
        map.insert("p".to_string(), SpecValue::Index(0));
        assert!(SpecEntry(map).single().is_none());
    }
}
