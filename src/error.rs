//! Fatal configuration errors and the banner they are reported with.
//!
//! Every variant ends the run; `main` maps them to a nonzero exit status after
//! [`log_config_error`] has printed the banner.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration directory {} does not exist", .0.display())]
    MissingPropertiesDir(PathBuf),

    #[error("{} is empty", .0.display())]
    EmptyPropertiesDir(PathBuf),

    #[error("{} contains {count} files; only one grinder properties file is allowed", .dir.display())]
    AmbiguousPropertiesDir { dir: PathBuf, count: usize },

    #[error("{} must have a '.properties' extension", .0.display())]
    WrongExtension(PathBuf),

    #[error("grinder properties file {} does not exist", .0.display())]
    MissingPropertiesFile(PathBuf),

    #[error("could not read grinder properties file {}: {source}", .path.display())]
    UnreadablePropertiesFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed grinder properties file {}: {source}", .path.display())]
    MalformedPropertiesFile {
        path: PathBuf,
        #[source]
        source: crate::properties::ParseError,
    },

    #[error("test directory {} does not exist", .0.display())]
    MissingTestDir(PathBuf),

    #[error("test directory {} is empty", .0.display())]
    EmptyTestDir(PathBuf),

    #[error("grinder.script does not name any test script")]
    EmptyScriptList,

    #[error("could not create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not copy files {scripts:?}: {source}")]
    Materialize {
        scripts: Vec<String>,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// What the user should do about the error.
    pub fn remediation(&self) -> &'static str {
        match self {
            ConfigError::MissingPropertiesDir(_) => {
                "Create this directory to configure the grinder properties file, or set `path` in the build config."
            }
            ConfigError::EmptyPropertiesDir(_) => {
                "Copy the grinder properties file into this directory or set `path` in the build config."
            }
            ConfigError::AmbiguousPropertiesDir { .. } => {
                "Keep a single grinder properties file in this directory or set `path` in the build config."
            }
            ConfigError::WrongExtension(_) => "Rename the file so it ends in '.properties'.",
            ConfigError::MissingPropertiesFile(_) | ConfigError::UnreadablePropertiesFile { .. } => {
                "Check the `path` value in the build config."
            }
            ConfigError::MalformedPropertiesFile { .. } => {
                "Fix the reported line of the grinder properties file."
            }
            ConfigError::MissingTestDir(_) => {
                "Create this directory to configure the test file, or set `path_test` in the build config."
            }
            ConfigError::EmptyTestDir(_) => {
                "Copy test files to this directory or set `path_test` in the build config."
            }
            ConfigError::EmptyScriptList => "List at least one script in grinder.script.",
            ConfigError::CreateDir { .. } | ConfigError::ReadDir { .. } => {
                "Check permissions on the project directory."
            }
            ConfigError::Materialize { .. } => {
                "Make sure every listed script exists in the test directory and target/ is writable."
            }
        }
    }
}

/// Log the configuration error banner.
pub fn log_config_error(err: &ConfigError) {
    tracing::error!("");
    tracing::error!(" ----------------------------");
    tracing::error!("|   Configuration ERROR!!!   |");
    tracing::error!(" ----------------------------");
    tracing::error!("");
    tracing::error!(" {err}");
    tracing::error!("");
    tracing::error!(" {}", err.remediation());
}
