use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
    iter,
    str::FromStr,
};

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod lock;
pub mod resolved;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error("Invalid module coordinate `{0}`, expected `group:artifact`")]
    InvalidCoordinate(String),
    #[error("Invalid lock entry `{entry}` on line {line}, expected `group:artifact:version`")]
    InvalidLockEntry { line: usize, entry: String },
    #[error("Module {0} is locked more than once")]
    DuplicateLockEntry(ModuleCoordinate),
    #[error("Invalid scope name `{0}`")]
    InvalidScopeName(String),
    #[error("Scope {0} appears more than once in the resolution report")]
    DuplicateScope(ScopeName),
    #[error("Invalid module `{component}` in scope {scope}, expected `group:module:version`")]
    InvalidComponent { scope: ScopeName, component: String },
    #[error("Module {coordinate} is resolved with different versions in scope {scope}")]
    DuplicateComponent {
        scope: ScopeName,
        coordinate: ModuleCoordinate,
    },
}

/// Identifies a module irrespective of its version.
///
/// Coordinates are ordered by their `group:artifact` notation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleCoordinate {
    group: String,
    artifact: String,
}

impl ModuleCoordinate {
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
        }
    }

    /// Parses a strict `group:artifact` notation, as used for configured upgrade modules.
    pub fn from_notation(notation: &str) -> Result<Self, ParseError> {
        let re = Regex::new(r"^(?P<group>[^:\s]+):(?P<artifact>[^:\s]+)$").unwrap();
        let captures = re
            .captures(notation.trim())
            .ok_or_else(|| ParseError::InvalidCoordinate(notation.to_string()))?;
        Ok(Self::new(&captures["group"], &captures["artifact"]))
    }

    /// Splits at the first colon. Anything after it belongs to the artifact.
    pub(crate) fn split_first(notation: &str) -> Option<Self> {
        match notation.split_once(':') {
            Some((group, artifact)) if !group.is_empty() && !artifact.is_empty() => {
                Some(Self::new(group, artifact))
            }
            _ => None,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    fn notation_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.group
            .bytes()
            .chain(iter::once(b':'))
            .chain(self.artifact.bytes())
    }
}

impl Ord for ModuleCoordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.notation_bytes()
            .cmp(other.notation_bytes())
            .then_with(|| self.group.cmp(&other.group))
    }
}

impl PartialOrd for ModuleCoordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for ModuleCoordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

impl FromStr for ModuleCoordinate {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_notation(s)
    }
}

impl TryFrom<String> for ModuleCoordinate {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_notation(&value)
    }
}

impl From<ModuleCoordinate> for String {
    fn from(value: ModuleCoordinate) -> Self {
        value.to_string()
    }
}

/// Name of an independently resolved dependency scope, e.g. `compileClasspath`.
///
/// Scope names double as lock file names, so path separators are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScopeName {
    value: String,
}

impl ScopeName {
    pub fn new(value: impl Into<String>) -> Result<Self, ParseError> {
        let value = value.into();
        let valid = !value.is_empty()
            && !value.starts_with('.')
            && !value
                .chars()
                .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control());
        if valid {
            Ok(Self { value })
        } else {
            Err(ParseError::InvalidScopeName(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl Display for ScopeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for ScopeName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ScopeName {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScopeName> for String {
    fn from(value: ScopeName) -> Self {
        value.value
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn parse_notation() {
        let coordinate = ModuleCoordinate::from_notation("org.slf4j:slf4j-api").unwrap();
        assert_eq!(coordinate.group(), "org.slf4j");
        assert_eq!(coordinate.artifact(), "slf4j-api");
        assert_eq!(coordinate.to_string(), "org.slf4j:slf4j-api");
    }

    #[test]
    fn reject_invalid_notation() {
        for notation in ["", "foo", ":bar", "foo:", "a:b:c", "a b:c"] {
            assert!(
                ModuleCoordinate::from_notation(notation).is_err(),
                "{notation} should not parse"
            );
        }
    }

    #[test]
    fn order_by_notation() {
        let coordinates: BTreeSet<ModuleCoordinate> = ["a.x:b", "a:c", "a:b", "a-z:a"]
            .into_iter()
            .map(|notation| notation.parse().unwrap())
            .collect();
        let ordered: Vec<String> = coordinates.iter().map(ToString::to_string).collect();
        assert_eq!(ordered, vec!["a-z:a", "a.x:b", "a:b", "a:c"]);
    }

    #[test]
    fn split_keeps_extra_colons_in_artifact() {
        let coordinate = ModuleCoordinate::split_first("a:b:c").unwrap();
        assert_eq!(coordinate.group(), "a");
        assert_eq!(coordinate.artifact(), "b:c");
        assert_eq!(ModuleCoordinate::split_first("abc"), None);
    }

    #[test]
    fn scope_names() {
        assert_eq!(
            ScopeName::new("compileClasspath").unwrap().as_str(),
            "compileClasspath"
        );
        for name in ["", ".hidden", "a/b", "a\\b", "a b"] {
            assert!(ScopeName::new(name).is_err(), "{name} should be rejected");
        }
    }
}
