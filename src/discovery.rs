//! Test script discovery.
use crate::error::ConfigError;
use crate::paths::ProjectPaths;
use crate::properties::{PropertySet, SCRIPT_KEY};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Script names to generate agent configuration for.
pub type TestScriptSet = BTreeSet<String>;

#[derive(Debug, Clone)]
pub struct Discovery {
    pub test_dir: PathBuf,
    pub scripts: TestScriptSet,
}

/// Explicit test directory if non-blank, else `src/test/jython`.
pub fn resolve_test_dir(paths: &ProjectPaths, explicit: Option<&str>) -> PathBuf {
    match explicit.map(str::trim).filter(|value| !value.is_empty()) {
        Some(dir) => paths.resolve(Path::new(dir)),
        None => paths.default_test_dir(),
    }
}

/// Discover scripts from `grinder.script` or the test directory listing.
///
/// A listed `grinder.script` is taken as-is without touching the
/// filesystem; otherwise every direct entry of the test directory counts.
pub fn discover_tests(
    properties: &PropertySet,
    paths: &ProjectPaths,
    explicit_dir: Option<&str>,
) -> Result<Discovery, ConfigError> {
    let test_dir = resolve_test_dir(paths, explicit_dir);
    let scripts = match properties.get(SCRIPT_KEY) {
        Some(list) => {
            let scripts = split_script_list(list);
            if scripts.is_empty() {
                return Err(ConfigError::EmptyScriptList);
            }
            scripts
        }
        None => list_test_dir(&test_dir)?,
    };
    tracing::debug!(?scripts, test_dir = %test_dir.display(), "jython test files");
    Ok(Discovery { test_dir, scripts })
}

fn split_script_list(list: &str) -> TestScriptSet {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn list_test_dir(dir: &Path) -> Result<TestScriptSet, ConfigError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::MissingTestDir(dir.to_path_buf()));
        }
        Err(source) => {
            return Err(ConfigError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })
        }
    };
    let mut scripts = TestScriptSet::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        scripts.insert(entry.file_name().to_string_lossy().into_owned());
    }
    if scripts.is_empty() {
        return Err(ConfigError::EmptyTestDir(dir.to_path_buf()));
    }
    Ok(scripts)
}
