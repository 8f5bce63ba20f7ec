use std::{
    collections::HashSet,
    fmt::{Display, Formatter},
    path::Path,
};

use super::{resolved::ResolvedModules, ModuleCoordinate, ParseError};

const HEADER: &str = "\
# This is a generated file for dependency locking.
# Manual edits can break the build and are not advised.
# This file is expected to be part of source control.
";

/// A single `group:artifact:version` line of a lock record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockEntry {
    coordinate: ModuleCoordinate,
    version: String,
    line: String,
}

impl LockEntry {
    pub fn new(coordinate: ModuleCoordinate, version: impl Into<String>) -> Self {
        let version = version.into();
        let line = format!("{coordinate}:{version}");
        Self {
            coordinate,
            version,
            line,
        }
    }

    /// Splits the line at its last colon into coordinate and version.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (module, version) = line.rsplit_once(':')?;
        if version.is_empty() {
            return None;
        }
        let coordinate = ModuleCoordinate::split_first(module)?;
        Some(Self {
            coordinate,
            version: version.to_string(),
            line: line.to_string(),
        })
    }

    pub fn coordinate(&self) -> &ModuleCoordinate {
        &self.coordinate
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    /// Whether `resolved_version` appears anywhere in the locked line.
    ///
    /// Containment rather than equality, so qualifiers appended to a locked
    /// version still match.
    pub fn matches_version(&self, resolved_version: &str) -> bool {
        self.line.contains(resolved_version)
    }
}

impl Display for LockEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.line)
    }
}

/// Locked modules of one scope, in on-disk order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockRecord {
    entries: Vec<LockEntry>,
}

impl LockRecord {
    pub fn new(entries: Vec<LockEntry>) -> Result<Self, ParseError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.coordinate()) {
                return Err(ParseError::DuplicateLockEntry(entry.coordinate().clone()));
            }
        }
        Ok(Self { entries })
    }

    /// Locks every resolved module at its resolved version.
    pub fn from_modules(modules: &ResolvedModules) -> Self {
        Self {
            entries: modules
                .iter()
                .map(|(coordinate, version)| LockEntry::new(coordinate.clone(), version))
                .collect(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ParseError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Parses lock file contents. Blank lines and `#` comments are skipped.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let entries = s
            .lines()
            .enumerate()
            .filter(|(_, line)| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with('#')
            })
            .map(|(index, line)| {
                LockEntry::parse(line).ok_or_else(|| ParseError::InvalidLockEntry {
                    line: index + 1,
                    entry: line.trim().to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(entries)
    }

    /// Renders the lock file contents, entries sorted by coordinate.
    pub fn render(&self) -> String {
        let mut entries: Vec<&LockEntry> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.coordinate().cmp(b.coordinate()));

        let mut out = String::from(HEADER);
        for entry in entries {
            out.push_str(entry.line());
            out.push('\n');
        }
        out
    }

    pub fn entries(&self) -> &[LockEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &LockEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
