//! Property source merging.
//!
//! The merged set is the base properties file, overlaid with `grinder.*`
//! system definitions, overlaid with `grinder.*` build properties. A later
//! source wins on every key it declares.
use crate::config::PipelineInputs;
use crate::error::ConfigError;
use crate::paths::{ProjectPaths, PROPERTIES_EXTENSION};
use crate::properties::{parse_properties, PropertySet, GRINDER_PREFIX};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub properties: PropertySet,
    pub properties_file: PathBuf,
    pub system_applied: usize,
    pub build_applied: usize,
}

/// Find the base properties file.
///
/// Without an explicit path, the default directory must hold exactly one
/// entry and it must be a `.properties` file.
pub fn resolve_properties_file(
    paths: &ProjectPaths,
    explicit: Option<&Path>,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(paths.resolve(path));
    }
    let dir = paths.properties_dir();
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::MissingPropertiesDir(dir));
        }
        Err(source) => return Err(ConfigError::ReadDir { path: dir, source }),
    };
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::ReadDir {
            path: dir.clone(),
            source,
        })?;
        files.push(entry.path());
    }
    match files.len() {
        0 => Err(ConfigError::EmptyPropertiesDir(dir)),
        1 => {
            let file = files.remove(0);
            let has_extension = file
                .extension()
                .is_some_and(|ext| ext == PROPERTIES_EXTENSION);
            if !has_extension {
                return Err(ConfigError::WrongExtension(file));
            }
            Ok(file)
        }
        count => Err(ConfigError::AmbiguousPropertiesDir { dir, count }),
    }
}

/// Read and parse a properties file.
///
/// Files that are not valid UTF-8 are decoded as ISO-8859-1, which is what
/// `java.util.Properties` assumes.
pub fn load_base_properties(path: &Path) -> Result<PropertySet, ConfigError> {
    let bytes = fs::read(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ConfigError::MissingPropertiesFile(path.to_path_buf())
        } else {
            ConfigError::UnreadablePropertiesFile {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().into_iter().map(char::from).collect(),
    };
    parse_properties(&text).map_err(|source| ConfigError::MalformedPropertiesFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Merge base file, system definitions and build properties.
pub fn merge_property_sources(inputs: &PipelineInputs) -> Result<MergeOutcome, ConfigError> {
    let properties_file = resolve_properties_file(&inputs.paths, inputs.properties_path.as_deref())?;
    let mut properties = load_base_properties(&properties_file)?;
    if properties.is_empty() {
        tracing::warn!(path = %properties_file.display(), "grinder properties file defines no properties");
    }
    tracing::debug!(
        path = %properties_file.display(),
        count = properties.len(),
        "loaded grinder properties file"
    );

    let system_applied = properties.overlay_prefixed(
        GRINDER_PREFIX,
        inputs
            .system_properties
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str())),
    );
    let build_applied = properties.overlay_prefixed(
        GRINDER_PREFIX,
        inputs
            .build_properties
            .iter()
            .filter_map(|(key, value)| value.as_deref().map(|value| (key.as_str(), value))),
    );
    tracing::debug!(system_applied, build_applied, "merged property sources");

    Ok(MergeOutcome {
        properties,
        properties_file,
        system_applied,
        build_applied,
    })
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
