//! Shared test infrastructure for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Throwaway project laid out the way `grinder-config` expects.
pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    /// Project with one properties file and the given test scripts.
    pub fn new(base_properties: &str, scripts: &[&str]) -> Self {
        let project = Self::empty();
        project.write("src/test/config/grinder.properties", base_properties);
        for script in scripts {
            project.write(
                &format!("src/test/jython/{script}"),
                &format!("# {script}\nfrom net.grinder.script.Grinder import grinder\n"),
            );
        }
        project
    }

    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directory");
        }
        fs::write(&path, contents).expect("write file");
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).expect("read file")
    }

    /// Run `grinder-config <subcommand> --project-root <root> <args>`.
    pub fn run(&self, subcommand: &str, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_grinder-config"))
            .arg(subcommand)
            .arg("--project-root")
            .arg(self.root())
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .expect("run grinder-config")
    }
}

/// Value of `key` in a `.properties` file without escapes.
pub fn property<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| line.strip_prefix(key)?.strip_prefix('='))
}
