//! Placeholder substitution for template files.
//!
//! Templates mark substitution points with `@KEY@`. Expansion is a single
//! left-to-right pass: each `@...@` token whose inner text is a key in the
//! map is replaced by the value verbatim, and everything else (including
//! tokens with unknown keys) is copied through unchanged. Replacement values
//! are never rescanned.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use regex::Regex;
use serde::Deserialize;

use crate::builder::errors::ExtError;
use crate::builder::task::{Extension, Task, TaskContext};
use crate::core::env::BuildEnv;

/// Placeholder delimiter.
pub const DELIMITER: char = '@';

/// Mapping from placeholder key to replacement value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>")]
pub struct SubstitutionMap {
    entries: BTreeMap<String, String>,
}

impl SubstitutionMap {
    /// Create an empty map.
    pub fn new() -> Self {
        SubstitutionMap::default()
    }

    /// Add a key. Keys must be non-empty and must not contain the delimiter.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ExtError> {
        let key = key.into();
        if key.is_empty() || key.contains(DELIMITER) {
            return Err(ExtError::InvalidPlaceholderKey { key });
        }
        self.entries.insert(key, value.into());
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Result<Self, ExtError> {
        self.insert(key, value)?;
        Ok(self)
    }

    /// Build a map from key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ExtError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = SubstitutionMap::new();
        for (key, value) in pairs {
            map.insert(key, value)?;
        }
        Ok(map)
    }

    /// Load a map from a TOML table of string values.
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read substitutions: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse substitutions: {}", path.display()))
    }

    /// Merge another map into this one (other takes precedence).
    pub fn merge(&mut self, other: SubstitutionMap) {
        self.entries.extend(other.entries);
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<BTreeMap<String, String>> for SubstitutionMap {
    type Error = ExtError;

    fn try_from(entries: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        SubstitutionMap::from_pairs(entries)
    }
}

/// Expand every `@KEY@` whose key is in `map`.
pub fn expand(text: &str, map: &SubstitutionMap) -> String {
    if map.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find(DELIMITER) {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        let Some(close) = after_open.find(DELIMITER) else {
            out.push(DELIMITER);
            rest = after_open;
            break;
        };

        match map.get(&after_open[..close]) {
            Some(value) => {
                out.push_str(value);
                rest = &after_open[close + 1..];
            }
            None => {
                // The closing delimiter may open the next token
                out.push(DELIMITER);
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@([A-Za-z_][A-Za-z0-9_]*)@").expect("valid placeholder regex"))
}

/// Keys of identifier-like `@KEY@` tokens still present in `text`.
pub fn unexpanded_placeholders(text: &str) -> Vec<String> {
    let mut keys: Vec<String> = placeholder_regex()
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

/// The `subst` tool kind. It has no external requirements.
pub struct SubstExtension;

impl Extension for SubstExtension {
    fn name(&self) -> &'static str {
        "subst"
    }

    fn description(&self) -> &'static str {
        "Expand @KEY@ placeholders in template files"
    }

    fn check(&self, _env: &BuildEnv) -> Result<(), ExtError> {
        Ok(())
    }
}

/// Writes a template with its placeholders expanded.
///
/// Inputs are the template file and the substitution map (the parameter
/// artifact). The map is declared through [`Task::input_values`], plus the
/// file it was loaded from when there is one. The only output is `target`.
/// The template is never modified.
#[derive(Debug, Clone)]
pub struct SubstTask {
    source: PathBuf,
    target: PathBuf,
    substitutions: SubstitutionMap,
    params: Option<PathBuf>,
}

impl SubstTask {
    pub fn new(
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        substitutions: SubstitutionMap,
    ) -> Self {
        SubstTask {
            source: source.into(),
            target: target.into(),
            substitutions,
            params: None,
        }
    }

    /// Record the TOML file the substitutions were loaded from.
    pub fn with_params_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.params = Some(path.into());
        self
    }

    pub fn substitutions(&self) -> &SubstitutionMap {
        &self.substitutions
    }

    fn read_template(&self, path: &Path) -> Result<String, ExtError> {
        let io_err = |source| ExtError::SubstitutionIo {
            path: self.source.clone(),
            source,
        };
        let bytes = std::fs::read(path).map_err(io_err)?;
        String::from_utf8(bytes)
            .map_err(|e| io_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }
}

impl Task for SubstTask {
    fn kind(&self) -> &'static str {
        "subst"
    }

    fn inputs(&self) -> Vec<PathBuf> {
        let mut inputs = vec![self.source.clone()];
        inputs.extend(self.params.clone());
        inputs
    }

    fn input_values(&self) -> Vec<(String, String)> {
        self.substitutions
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn outputs(&self) -> Vec<PathBuf> {
        vec![self.target.clone()]
    }

    fn describe(&self) -> String {
        format!("SUBST {} {}", self.target.display(), self.source.display())
    }

    fn run(&self, cx: &TaskContext<'_>) -> Result<(), ExtError> {
        let source = cx.path(&self.source);
        let target = cx.path(&self.target);

        if crate::util::fs::same_file(&source, &target) {
            return Err(ExtError::SubstitutionIo {
                path: self.target.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "output would overwrite the template",
                ),
            });
        }

        let text = self.read_template(&source)?;
        let expanded = expand(&text, &self.substitutions);

        let leftover = unexpanded_placeholders(&expanded);
        if !leftover.is_empty() {
            tracing::debug!(
                "{}: placeholders left unexpanded: {}",
                self.target.display(),
                leftover.join(", ")
            );
        }

        crate::util::fs::write_bytes(&target, expanded.as_bytes()).map_err(|source| {
            ExtError::SubstitutionIo {
                path: self.target.clone(),
                source,
            }
        })
    }
}
