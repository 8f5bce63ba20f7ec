use std::{
    collections::{btree_map, BTreeMap, BTreeSet},
    path::Path,
};

use log::debug;
use serde::Deserialize;

use super::{ModuleCoordinate, ParseError, ScopeName};

/// A component the resolver selected for a scope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ResolvedComponent {
    Module {
        group: String,
        module: String,
        version: String,
    },
    /// A component that is not an external module, e.g. another project of the build.
    Project { project: String },
}

/// Resolved version per module coordinate, iterated in coordinate order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedModules {
    modules: BTreeMap<ModuleCoordinate, String>,
}

impl ResolvedModules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps external modules only; other components never take part in locking.
    pub fn from_components<'a>(
        components: impl IntoIterator<Item = &'a ResolvedComponent>,
    ) -> Self {
        components
            .into_iter()
            .filter_map(|component| match component {
                ResolvedComponent::Module {
                    group,
                    module,
                    version,
                } => Some((ModuleCoordinate::new(group, module), version.clone())),
                ResolvedComponent::Project { .. } => None,
            })
            .collect()
    }

    pub fn insert(
        &mut self,
        coordinate: ModuleCoordinate,
        version: impl Into<String>,
    ) -> Option<String> {
        self.modules.insert(coordinate, version.into())
    }

    pub fn get(&self, coordinate: &ModuleCoordinate) -> Option<&str> {
        self.modules.get(coordinate).map(String::as_str)
    }

    pub fn contains(&self, coordinate: &ModuleCoordinate) -> bool {
        self.modules.contains_key(coordinate)
    }

    pub fn coordinates(&self) -> impl Iterator<Item = &ModuleCoordinate> {
        self.modules.keys()
    }

    pub fn coordinate_set(&self) -> BTreeSet<ModuleCoordinate> {
        self.modules.keys().cloned().collect()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, ModuleCoordinate, String> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl FromIterator<(ModuleCoordinate, String)> for ResolvedModules {
    fn from_iter<T: IntoIterator<Item = (ModuleCoordinate, String)>>(iter: T) -> Self {
        Self {
            modules: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ResolvedModules {
    type Item = (&'a ModuleCoordinate, &'a String);
    type IntoIter = btree_map::Iter<'a, ModuleCoordinate, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.iter()
    }
}

/// Resolution result of every scope of a build, as handed over by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResolutionReport {
    #[serde(default)]
    pub scopes: Vec<ResolvedScope>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResolvedScope {
    pub name: ScopeName,
    #[serde(default)]
    pub components: Vec<ResolvedComponent>,
}

impl ResolvedScope {
    pub fn modules(&self) -> ResolvedModules {
        let modules = ResolvedModules::from_components(&self.components);
        debug!("Found the following modules for {}: {:?}", self.name, modules.modules);
        modules
    }

    /// Every module must survive being written as a `group:artifact:version` lock line.
    fn check_components(&self) -> Result<(), ParseError> {
        let mut versions = BTreeMap::new();
        for component in &self.components {
            if let ResolvedComponent::Module {
                group,
                module,
                version,
            } = component
            {
                if ![group, module, version].iter().all(|field| is_lock_field(field)) {
                    return Err(ParseError::InvalidComponent {
                        scope: self.name.clone(),
                        component: format!("{group}:{module}:{version}"),
                    });
                }
                let coordinate = ModuleCoordinate::new(group, module);
                match versions.insert(coordinate.clone(), version) {
                    Some(previous) if previous != version => {
                        return Err(ParseError::DuplicateComponent {
                            scope: self.name.clone(),
                            coordinate,
                        })
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

fn is_lock_field(value: &str) -> bool {
    !value.is_empty() && !value.contains(|c: char| c == ':' || c.is_whitespace())
}

impl ResolutionReport {
    pub fn from_file(path: &Path) -> Result<Self, ParseError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let report = toml::from_str::<ResolutionReport>(s)?;
        let mut seen = BTreeSet::new();
        for scope in &report.scopes {
            if !seen.insert(&scope.name) {
                return Err(ParseError::DuplicateScope(scope.name.clone()));
            }
            scope.check_components()?;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::lock::LockRecord;

    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn load_resolution_report() {
        let text = r#"
            [[scopes]]
            name = "compileClasspath"

            [[scopes.components]]
            group = "org.slf4j"
            module = "slf4j-api"
            version = "1.7.25"

            [[scopes.components]]
            project = ":core"

            [[scopes.components]]
            group = "com.google.guava"
            module = "guava"
            version = "27.0-jre"

            [[scopes]]
            name = "runtimeClasspath"
        "#;
        let report = ResolutionReport::parse(text).unwrap();
        assert_eq!(report.scopes.len(), 2);
        assert_eq!(
            report.scopes[0].components[1],
            ResolvedComponent::Project {
                project: ":core".to_string()
            }
        );

        let modules = report.scopes[0].modules();
        let notations: Vec<String> = modules
            .iter()
            .map(|(coordinate, version)| format!("{coordinate}:{version}"))
            .collect();
        assert_eq!(
            notations,
            vec!["com.google.guava:guava:27.0-jre", "org.slf4j:slf4j-api:1.7.25"]
        );
        assert!(report.scopes[1].modules().is_empty());
    }

    #[test]
    fn reject_duplicate_scopes() {
        let text = r#"
            [[scopes]]
            name = "compileClasspath"

            [[scopes]]
            name = "compileClasspath"
        "#;
        assert!(matches!(
            ResolutionReport::parse(text),
            Err(ParseError::DuplicateScope(_))
        ));
    }

    #[test]
    fn reject_invalid_scope_name() {
        let text = r#"
            [[scopes]]
            name = "../escape"
        "#;
        assert!(ResolutionReport::parse(text).is_err());
    }

    fn scope_with_module(group: &str, module: &str, version: &str) -> String {
        format!(
            r#"
            [[scopes]]
            name = "compileClasspath"

            [[scopes.components]]
            group = "{group}"
            module = "{module}"
            version = "{version}"
            "#
        )
    }

    #[test]
    fn reject_components_that_break_lock_lines() {
        let cases = [
            ("a", "b", "1:2", "a:b:1:2"),
            ("a", "b", "", "a:b:"),
            ("a", "b", "1.0 beta", "a:b:1.0 beta"),
            ("", "b", "1.0", ":b:1.0"),
            ("a:x", "b", "1.0", "a:x:b:1.0"),
            ("a", "", "1.0", "a::1.0"),
            ("a", "b:c", "1.0", "a:b:c:1.0"),
            ("a", " b", "1.0", "a: b:1.0"),
        ];
        for (group, module, version, expected) in cases {
            match ResolutionReport::parse(&scope_with_module(group, module, version)) {
                Err(ParseError::InvalidComponent { scope, component }) => {
                    assert_eq!(scope.as_str(), "compileClasspath");
                    assert_eq!(component, expected);
                }
                other => panic!("{expected} was not rejected: {other:?}"),
            }
        }
    }

    #[test]
    fn accepted_components_round_trip_through_lock() {
        let text = scope_with_module("org.slf4j", "slf4j-api", "1.7.25");
        let report = ResolutionReport::parse(&text).unwrap();
        let modules = report.scopes[0].modules();
        let lock = LockRecord::parse(&LockRecord::from_modules(&modules).render()).unwrap();
        let entries: Vec<(String, String)> = lock
            .iter()
            .map(|entry| (entry.coordinate().to_string(), entry.version().to_string()))
            .collect();
        assert_eq!(
            entries,
            vec![("org.slf4j:slf4j-api".to_string(), "1.7.25".to_string())]
        );
    }

    #[test]
    fn reject_module_resolved_with_different_versions() {
        let text = r#"
            [[scopes]]
            name = "compileClasspath"

            [[scopes.components]]
            group = "a"
            module = "b"
            version = "1.0"

            [[scopes.components]]
            group = "a"
            module = "b"
            version = "2.0"
        "#;
        match ResolutionReport::parse(text) {
            Err(ParseError::DuplicateComponent { scope, coordinate }) => {
                assert_eq!(scope.as_str(), "compileClasspath");
                assert_eq!(coordinate, ModuleCoordinate::new("a", "b"));
            }
            other => panic!("duplicate module was not rejected: {other:?}"),
        }
    }

    #[test]
    fn repeated_module_with_same_version_is_kept_once() {
        let text = r#"
            [[scopes]]
            name = "compileClasspath"

            [[scopes.components]]
            group = "a"
            module = "b"
            version = "1.0"

            [[scopes.components]]
            group = "a"
            module = "b"
            version = "1.0"
        "#;
        let report = ResolutionReport::parse(text).unwrap();
        assert_eq!(report.scopes[0].modules().len(), 1);
    }
}
