//! Build configuration helpers.
//!
//! The build config carries what a host build tool would inject: declared
//! options, the project property map and the dependency lists. It is loaded,
//! validated and then resolved into [`PipelineInputs`].
use crate::classpath::DependencyDescriptor;
use crate::paths::ProjectPaths;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const BUILD_CONFIG_SCHEMA_VERSION: u32 = 1;

/// Jython version The Grinder agent runs scripts with.
pub const GRINDER_JYTHON_VERSION: &str = "2.2.1";
/// Jython version The Grinder Analyzer runs with.
pub const GRINDER_ANALYZER_JYTHON_VERSION: &str = "2.5.2";

/// Which Jython runtime the generated classpath is pinned to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ScriptingProfile {
    #[default]
    Agent,
    Analyzer,
}

impl ScriptingProfile {
    pub fn jython_version(self) -> &'static str {
        match self {
            ScriptingProfile::Agent => GRINDER_JYTHON_VERSION,
            ScriptingProfile::Analyzer => GRINDER_ANALYZER_JYTHON_VERSION,
        }
    }
}

fn default_schema_version() -> u32 {
    BUILD_CONFIG_SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Explicit grinder properties file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Explicit test script directory; blank means the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_test: Option<String>,
    #[serde(default)]
    pub daemon_option: bool,
    #[serde(default)]
    pub daemon_period: i64,
    #[serde(default)]
    pub include_dependencies: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_repository: Option<PathBuf>,
    #[serde(default)]
    pub profile: ScriptingProfile,
    /// Overrides the profile's pinned Jython version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jython_version: Option<String>,
    /// Project properties; only `grinder.*` keys with values are used.
    #[serde(default)]
    pub properties: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub plugin_artifacts: Vec<DependencyDescriptor>,
    #[serde(default)]
    pub project_dependencies: Vec<DependencyDescriptor>,
}

/// Build the config used when nothing is declared.
pub fn default_build_config() -> BuildConfig {
    BuildConfig {
        schema_version: BUILD_CONFIG_SCHEMA_VERSION,
        path: None,
        path_test: None,
        daemon_option: false,
        daemon_period: 0,
        include_dependencies: false,
        local_repository: None,
        profile: ScriptingProfile::Agent,
        jython_version: None,
        properties: BTreeMap::new(),
        plugin_artifacts: Vec::new(),
        project_dependencies: Vec::new(),
    }
}

/// Render a pretty JSON stub for `init`, listing the usual agent runtime.
pub fn build_config_stub() -> Result<String> {
    let mut config = default_build_config();
    config.plugin_artifacts = vec![
        DependencyDescriptor::jar("net.sf.grinder", "grinder", "3.11"),
        DependencyDescriptor::jar("net.sf.grinder", "grinder-core", "3.11"),
        DependencyDescriptor::jar("org.python", "jython", GRINDER_JYTHON_VERSION),
    ];
    serde_json::to_string_pretty(&config).context("serialize build config stub")
}

pub fn load_build_config(path: &Path) -> Result<BuildConfig> {
    let bytes = fs::read(path).with_context(|| format!("read build config {}", path.display()))?;
    let config: BuildConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse build config {}", path.display()))?;
    Ok(config)
}

pub fn write_build_config(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn validate_build_config(config: &BuildConfig) -> Result<()> {
    if config.schema_version != BUILD_CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported build config schema_version {}",
            config.schema_version
        ));
    }
    if let Some(version) = config.jython_version.as_deref() {
        if version.trim().is_empty() {
            return Err(anyhow!("jython_version must be non-empty when set"));
        }
    }
    validate_descriptors(&config.plugin_artifacts, "plugin_artifacts")?;
    validate_descriptors(&config.project_dependencies, "project_dependencies")?;
    Ok(())
}

fn validate_descriptors(descriptors: &[DependencyDescriptor], label: &str) -> Result<()> {
    for (idx, descriptor) in descriptors.iter().enumerate() {
        let missing = [
            ("group_id", &descriptor.group_id),
            ("artifact_id", &descriptor.artifact_id),
            ("version", &descriptor.version),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());
        if let Some((field, _)) = missing {
            return Err(anyhow!("{label}[{idx}].{field} must be non-empty"));
        }
    }
    Ok(())
}

/// Everything one pipeline run consumes, with defaults already applied.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub paths: ProjectPaths,
    pub properties_path: Option<PathBuf>,
    pub test_dir: Option<String>,
    pub daemon_option: bool,
    pub daemon_period: i64,
    pub include_dependencies: bool,
    pub jython_version: String,
    /// Process-wide `-D` definitions, in declaration order.
    pub system_properties: Vec<(String, String)>,
    pub build_properties: BTreeMap<String, Option<String>>,
    pub plugin_artifacts: Vec<DependencyDescriptor>,
    pub project_dependencies: Vec<DependencyDescriptor>,
}

impl PipelineInputs {
    pub fn from_config(
        paths: ProjectPaths,
        config: BuildConfig,
        system_properties: Vec<(String, String)>,
    ) -> Self {
        let jython_version = config
            .jython_version
            .unwrap_or_else(|| config.profile.jython_version().to_string());
        Self {
            paths,
            properties_path: config.path,
            test_dir: config.path_test,
            daemon_option: config.daemon_option,
            daemon_period: config.daemon_period,
            include_dependencies: config.include_dependencies,
            jython_version,
            system_properties,
            build_properties: config.properties,
            plugin_artifacts: config.plugin_artifacts,
            project_dependencies: config.project_dependencies,
        }
    }
}

/// Resolve the local repository root: explicit value, else `~/.m2/repository`.
///
/// `None` when no value is given and the home directory cannot be located.
pub fn resolve_local_repository(paths: &ProjectPaths, explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(paths.resolve(path));
    }
    dirs::home_dir().map(|home| home.join(".m2").join("repository"))
}

/// Parse a `key=value` definition as given to `-D`.
pub fn parse_define(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid definition {raw:?} (expected key=value)"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid definition {raw:?} (empty key)"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
