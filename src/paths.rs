//! Typed paths into a project layout.
//!
//! All defaults are relative to the project root; explicit paths from the
//! build config or CLI are resolved against the same root.
use std::path::{Path, PathBuf};

/// Default directory holding the single grinder properties file.
pub const PROPERTIES_DIR_REL: &str = "src/test/config";
/// Default directory holding the test scripts.
pub const TEST_DIR_REL: &str = "src/test/jython";
/// Staging directory for generated agent configuration.
pub const CONFIG_DIR_REL: &str = "target/test/config";
/// Agent log directory.
pub const LOG_DIR_REL: &str = "target/test/log_files";
/// Default build config file name.
pub const BUILD_CONFIG_FILE: &str = "grinder-config.json";

pub const AGENT_PROPERTIES_PREFIX: &str = "grinder_agent_";
pub const PROPERTIES_EXTENSION: &str = "properties";

#[derive(Debug, Clone)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a relative path onto the root; absolute paths pass through.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn properties_dir(&self) -> PathBuf {
        self.root.join(PROPERTIES_DIR_REL)
    }

    pub fn default_test_dir(&self) -> PathBuf {
        self.root.join(TEST_DIR_REL)
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join(CONFIG_DIR_REL)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join(LOG_DIR_REL)
    }

    pub fn build_config_path(&self) -> PathBuf {
        self.root.join(BUILD_CONFIG_FILE)
    }
}

/// `grinder_agent_<base>.properties`, where `<base>` drops the last extension.
pub fn agent_properties_file_name(script: &str) -> String {
    format!(
        "{AGENT_PROPERTIES_PREFIX}{}.{PROPERTIES_EXTENSION}",
        script_base_name(script)
    )
}

/// File name of `script` without directories or its last extension.
pub fn script_base_name(script: &str) -> &str {
    let name = script.rsplit(|ch| ch == '/' || ch == '\\').next().unwrap_or(script);
    match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_strips_last_extension_and_directories() {
        assert_eq!(script_base_name("a.py"), "a");
        assert_eq!(script_base_name("suite/login.test.py"), "login.test");
        assert_eq!(script_base_name("C:\\tests\\b.py"), "b");
        assert_eq!(script_base_name("noext"), "noext");
    }

    #[test]
    fn agent_file_names_follow_pattern() {
        assert_eq!(agent_properties_file_name("a.py"), "grinder_agent_a.properties");
        assert_eq!(
            agent_properties_file_name("suite/b.test.py"),
            "grinder_agent_b.test.properties"
        );
        let paths = ProjectPaths::new(PathBuf::from("/work"));
        assert_eq!(
            paths.config_dir(),
            PathBuf::from("/work/target/test/config")
        );
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let paths = ProjectPaths::new(PathBuf::from("/work"));
        assert_eq!(paths.resolve(Path::new("/tmp/x")), PathBuf::from("/tmp/x"));
        assert_eq!(
            paths.resolve(Path::new("conf/g.properties")),
            PathBuf::from("/work/conf/g.properties")
        );
    }
}
