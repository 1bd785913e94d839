//! Agent classpath assembly.
//!
//! The plugin dependency list is filtered (the grinder launcher is provided
//! separately; only the pinned Jython may appear), optionally extended with
//! the project's runtime jars, resolved to local files and joined into
//! `grinder.jvm.classpath`. Resolution failures skip the dependency and never
//! abort assembly.
use crate::properties::{PropertySet, CLASSPATH_KEY};
use crate::util::normalize_path;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Separator between classpath entries on this platform.
pub const PATH_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

const GRINDER_ARTIFACT_ID: &str = "grinder";
const JYTHON_ARTIFACT_MARKER: &str = "jython";
const SCOPE_PROVIDED: &str = "provided";
const SCOPE_TEST: &str = "test";

fn default_scope() -> String {
    "compile".to_string()
}

fn default_artifact_type() -> String {
    "jar".to_string()
}

/// One runtime artifact as declared by the build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyDescriptor {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(rename = "type", default = "default_artifact_type")]
    pub artifact_type: String,
}

impl DependencyDescriptor {
    /// Compile-scoped jar.
    pub fn jar(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            scope: default_scope(),
            artifact_type: default_artifact_type(),
        }
    }

    pub fn coordinates(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }

    pub fn versionless_key(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{coordinates} not found at {}", .path.display())]
    NotFound { coordinates: String, path: PathBuf },
    #[error("{coordinates}: no local repository (pass --local-repository)")]
    NoRepository { coordinates: String },
}

/// Maps a dependency to a file on disk.
pub trait ArtifactResolver {
    fn resolve(&self, dependency: &DependencyDescriptor) -> Result<PathBuf, ResolveError>;
}

/// Resolver over a Maven-layout local repository.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<group dirs>/<artifact>/<version>/<artifact>-<version>.<type>`
    pub fn artifact_path(&self, dependency: &DependencyDescriptor) -> PathBuf {
        let mut path = self.root.clone();
        for segment in dependency.group_id.split('.') {
            path.push(segment);
        }
        path.push(&dependency.artifact_id);
        path.push(&dependency.version);
        path.push(format!(
            "{}-{}.{}",
            dependency.artifact_id, dependency.version, dependency.artifact_type
        ));
        path
    }
}

impl ArtifactResolver for LocalRepository {
    fn resolve(&self, dependency: &DependencyDescriptor) -> Result<PathBuf, ResolveError> {
        let path = self.artifact_path(dependency);
        if !path.is_file() {
            return Err(ResolveError::NotFound {
                coordinates: dependency.coordinates(),
                path,
            });
        }
        Ok(path)
    }
}

/// Resolver used when no local repository could be located.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRepository;

impl ArtifactResolver for NoRepository {
    fn resolve(&self, dependency: &DependencyDescriptor) -> Result<PathBuf, ResolveError> {
        Err(ResolveError::NoRepository {
            coordinates: dependency.coordinates(),
        })
    }
}

/// Inputs to one assembly.
#[derive(Debug, Clone, Copy)]
pub struct ClasspathRequest<'a> {
    pub plugin_artifacts: &'a [DependencyDescriptor],
    pub project_dependencies: &'a [DependencyDescriptor],
    pub include_project_dependencies: bool,
    pub jython_version: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDependency {
    pub coordinates: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClasspathAssembly {
    /// The joined value stored under `grinder.jvm.classpath`.
    pub value: String,
    pub entries: Vec<String>,
    /// Dependencies filtered out by identity or version rules.
    pub excluded: Vec<String>,
    /// Dependencies that matched but could not be resolved.
    pub skipped: Vec<SkippedDependency>,
}

/// Whether a plugin artifact belongs on the agent classpath.
pub fn admits_plugin_artifact(dependency: &DependencyDescriptor, jython_version: &str) -> bool {
    if dependency.artifact_id == GRINDER_ARTIFACT_ID {
        return false;
    }
    !dependency.artifact_id.contains(JYTHON_ARTIFACT_MARKER) || dependency.version == jython_version
}

/// Whether a project dependency is a runtime jar.
pub fn admits_project_dependency(dependency: &DependencyDescriptor) -> bool {
    dependency.artifact_type == "jar"
        && dependency.scope != SCOPE_PROVIDED
        && dependency.scope != SCOPE_TEST
}

/// Assemble the classpath and store it in `properties`.
///
/// Plugin entries are joined without a trailing separator. Every project
/// entry is followed by a separator, so the value only ends with one when the
/// project pass contributed.
pub fn assemble_classpath(
    properties: &mut PropertySet,
    request: &ClasspathRequest<'_>,
    resolver: &dyn ArtifactResolver,
) -> ClasspathAssembly {
    let mut assembly = ClasspathAssembly::default();

    let mut plugin_entries = Vec::new();
    for dependency in request.plugin_artifacts {
        if !admits_plugin_artifact(dependency, request.jython_version) {
            tracing::debug!(dependency = %dependency.coordinates(), "excluded from classpath");
            assembly.excluded.push(dependency.coordinates());
            continue;
        }
        tracing::debug!(
            group_id = %dependency.group_id,
            artifact_id = %dependency.artifact_id,
            version = %dependency.version,
            "plugin dependency"
        );
        if let Some(entry) = resolve_entry(dependency, resolver, &mut assembly) {
            plugin_entries.push(entry);
        }
    }
    let separator = PATH_SEPARATOR.to_string();
    let mut value = plugin_entries.join(separator.as_str());
    assembly.entries = plugin_entries;

    if request.include_project_dependencies {
        for dependency in request.project_dependencies {
            if !admits_project_dependency(dependency) {
                tracing::debug!(dependency = %dependency.coordinates(), "project dependency not on runtime classpath");
                assembly.excluded.push(dependency.coordinates());
                continue;
            }
            tracing::debug!(dependency = %dependency.versionless_key(), "adding project dependency");
            if let Some(entry) = resolve_entry(dependency, resolver, &mut assembly) {
                if !value.is_empty() && !value.ends_with(PATH_SEPARATOR) {
                    value.push(PATH_SEPARATOR);
                }
                value.push_str(&entry);
                value.push(PATH_SEPARATOR);
                assembly.entries.push(entry);
            }
        }
    }

    properties.set(CLASSPATH_KEY, value.clone());
    assembly.value = value;
    tracing::debug!(
        entries = assembly.entries.len(),
        skipped = assembly.skipped.len(),
        "classpath configured"
    );
    assembly
}

fn resolve_entry(
    dependency: &DependencyDescriptor,
    resolver: &dyn ArtifactResolver,
    assembly: &mut ClasspathAssembly,
) -> Option<String> {
    match resolver.resolve(dependency) {
        Ok(path) => Some(normalize_path(&path)),
        Err(err) => {
            tracing::warn!(dependency = %dependency.coordinates(), error = %err, "skipping unresolved dependency");
            assembly.skipped.push(SkippedDependency {
                coordinates: dependency.coordinates(),
                reason: err.to_string(),
            });
            None
        }
    }
}

#[cfg(test)]
#[path = "classpath_tests.rs"]
mod tests;
