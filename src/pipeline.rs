//! Configuration generation pipeline.
//!
//! Stages run in a fixed order, each on the state left by the previous one:
//! merge, classpath, discovery, log directory, daemon options, materialize.
//! The first fatal error stops the run and is returned to the caller.
use crate::classpath::{assemble_classpath, ArtifactResolver, ClasspathAssembly, ClasspathRequest};
use crate::config::PipelineInputs;
use crate::discovery::discover_tests;
use crate::error::ConfigError;
use crate::materialize::materialize;
use crate::merge::merge_property_sources;
use crate::options::{resolve_options, RuntimeOptions};
use crate::paths::{ProjectPaths, LOG_DIR_REL};
use crate::properties::{PropertySet, LOG_DIRECTORY_KEY};
use crate::util::display_path;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct ReportArtifact {
    pub script: String,
    pub properties_file: String,
    pub script_copy: String,
}

/// What one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub properties_file: String,
    pub properties: PropertySet,
    pub classpath: ClasspathAssembly,
    pub test_dir: String,
    pub scripts: Vec<String>,
    pub log_dir: String,
    pub options: RuntimeOptions,
    pub artifacts: Vec<ReportArtifact>,
}

/// Create the agent log directory and point `grinder.logDirectory` at it.
pub fn prepare_log_directory(
    properties: &mut PropertySet,
    paths: &ProjectPaths,
) -> Result<PathBuf, ConfigError> {
    let log_dir = paths.log_dir();
    fs::create_dir_all(&log_dir).map_err(|source| ConfigError::CreateDir {
        path: log_dir.clone(),
        source,
    })?;
    if properties.contains_key(LOG_DIRECTORY_KEY) {
        tracing::debug!("replacing configured {LOG_DIRECTORY_KEY}");
    }
    properties.set(LOG_DIRECTORY_KEY, LOG_DIR_REL);
    tracing::debug!(log_dir = LOG_DIR_REL, "log directory");
    Ok(log_dir)
}

pub fn run(
    inputs: &PipelineInputs,
    resolver: &dyn ArtifactResolver,
) -> Result<PipelineReport, ConfigError> {
    let paths = &inputs.paths;
    let root = Some(paths.root());

    let merged = merge_property_sources(inputs)?;
    let mut properties = merged.properties;

    let request = ClasspathRequest {
        plugin_artifacts: &inputs.plugin_artifacts,
        project_dependencies: &inputs.project_dependencies,
        include_project_dependencies: inputs.include_dependencies,
        jython_version: &inputs.jython_version,
    };
    let classpath = assemble_classpath(&mut properties, &request, resolver);

    let discovery = discover_tests(&properties, paths, inputs.test_dir.as_deref())?;
    let log_dir = prepare_log_directory(&mut properties, paths)?;
    let options = resolve_options(inputs.daemon_option, inputs.daemon_period);
    let artifacts = materialize(paths, &properties, &discovery)?;

    tracing::info!(
        properties_file = %display_path(&merged.properties_file, root),
        system_properties = merged.system_applied,
        build_properties = merged.build_applied,
        scripts = discovery.scripts.len(),
        classpath_entries = classpath.entries.len(),
        skipped_dependencies = classpath.skipped.len(),
        "grinder agent configuration generated"
    );

    Ok(PipelineReport {
        properties_file: display_path(&merged.properties_file, root),
        properties,
        classpath,
        test_dir: display_path(&discovery.test_dir, root),
        scripts: discovery.scripts.into_iter().collect(),
        log_dir: display_path(&log_dir, root),
        options,
        artifacts: artifacts
            .iter()
            .map(|artifact| ReportArtifact {
                script: artifact.source_script.clone(),
                properties_file: display_path(&artifact.properties_path, root),
                script_copy: display_path(&artifact.script_path, root),
            })
            .collect(),
    })
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
