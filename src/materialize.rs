//! Per-script agent configuration.
//!
//! Each discovered script gets `grinder_agent_<base>.properties` in the
//! staging directory plus a byte-for-byte copy of the script. Any I/O failure
//! aborts the step; files written for earlier scripts stay in place.
use crate::discovery::Discovery;
use crate::error::ConfigError;
use crate::paths::{agent_properties_file_name, ProjectPaths};
use crate::properties::{PropertySet, SCRIPT_KEY};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedArtifact {
    pub source_script: String,
    pub properties_path: PathBuf,
    pub script_path: PathBuf,
}

fn write_staged_bytes(staging_root: &Path, rel_path: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    let staging_path = staging_root.join(rel_path);
    if let Some(parent) = staging_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&staging_path, bytes)?;
    Ok(staging_path)
}

fn copy_staged(source: &Path, staging_root: &Path, rel_path: &str) -> io::Result<PathBuf> {
    let staging_path = staging_root.join(rel_path);
    if let Some(parent) = staging_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, &staging_path)?;
    Ok(staging_path)
}

/// Render the agent properties for one script.
pub fn agent_properties(properties: &PropertySet, script: &str) -> String {
    let mut copy = properties.clone();
    copy.set(SCRIPT_KEY, script);
    copy.to_properties_string(Some(&format!("Grinder Agent Properties for {script}")))
}

pub fn materialize(
    paths: &ProjectPaths,
    properties: &PropertySet,
    discovery: &Discovery,
) -> Result<Vec<GeneratedArtifact>, ConfigError> {
    let config_dir = paths.config_dir();
    fs::create_dir_all(&config_dir).map_err(|source| ConfigError::CreateDir {
        path: config_dir.clone(),
        source,
    })?;

    let fail = |source: io::Error| ConfigError::Materialize {
        scripts: discovery.scripts.iter().cloned().collect(),
        source,
    };

    let mut file_names = BTreeSet::new();
    let mut artifacts = Vec::with_capacity(discovery.scripts.len());
    for script in &discovery.scripts {
        tracing::debug!(script = %script, "using file for copy");
        let file_name = agent_properties_file_name(script);
        if !file_names.insert(file_name.clone()) {
            tracing::warn!(script = %script, file = %file_name, "generated file name collides with an earlier script");
        }
        let text = agent_properties(properties, script);
        let properties_path =
            write_staged_bytes(&config_dir, &file_name, text.as_bytes()).map_err(fail)?;
        let script_path =
            copy_staged(&discovery.test_dir.join(script), &config_dir, script).map_err(fail)?;
        artifacts.push(GeneratedArtifact {
            source_script: script.clone(),
            properties_path,
            script_path,
        });
    }
    tracing::debug!(count = artifacts.len(), "grinder agents configured");
    Ok(artifacts)
}

#[cfg(test)]
#[path = "materialize_tests.rs"]
mod tests;
