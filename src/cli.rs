//! CLI argument parsing for the configuration generator.
//!
//! Flags mirror the build-declared options; any flag given here overrides the
//! same value in the build config file.
use crate::config::{parse_define, ScriptingProfile};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "grinder-config",
    version,
    about = "Generate Grinder agent configuration for a project",
    after_help = "Examples:\n  grinder-config init --project-root .\n  grinder-config generate --project-root . --daemon --daemon-period 30000\n  grinder-config generate -D grinder.threads=10 --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Generate(GenerateArgs),
}

/// Init command inputs for writing a build config stub.
#[derive(Parser, Debug)]
#[command(about = "Write a grinder-config.json stub into the project")]
pub struct InitArgs {
    /// Project root the layout is relative to
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_root: PathBuf,

    /// Overwrite an existing grinder-config.json
    #[arg(long)]
    pub force: bool,
}

/// Generate command inputs; unset flags fall back to the build config.
#[derive(Parser, Debug)]
#[command(about = "Merge properties, assemble the classpath and write agent configuration")]
pub struct GenerateArgs {
    /// Project root the layout is relative to
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_root: PathBuf,

    /// Build config file (defaults to <project-root>/grinder-config.json if present)
    #[arg(long, value_name = "PATH")]
    pub build_config: Option<PathBuf>,

    /// Grinder properties file (skips the src/test/config lookup)
    #[arg(long, value_name = "PATH")]
    pub properties: Option<PathBuf>,

    /// Test script directory
    #[arg(long, value_name = "DIR")]
    pub test_dir: Option<String>,

    /// Run the agent with the -daemon option
    #[arg(long, conflicts_with = "no_daemon")]
    pub daemon: bool,

    /// Run the agent without the -daemon option, even if the build config enables it
    #[arg(long)]
    pub no_daemon: bool,

    /// Agent sleep time between runs in milliseconds
    #[arg(long, value_name = "MS", allow_negative_numbers = true)]
    pub daemon_period: Option<i64>,

    /// Append the project's runtime jars to the agent classpath
    #[arg(long)]
    pub include_dependencies: bool,

    /// Local artifact repository (defaults to ~/.m2/repository)
    #[arg(long, value_name = "DIR")]
    pub local_repository: Option<PathBuf>,

    /// Jython runtime the classpath is pinned to
    #[arg(long, value_enum)]
    pub profile: Option<ScriptingProfile>,

    /// Pin an explicit Jython version instead of the profile's
    #[arg(long, value_name = "VERSION")]
    pub jython_version: Option<String>,

    /// System property definition; only grinder.* keys are used
    #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_define)]
    pub define: Vec<(String, String)>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Write the run report as JSON to a file
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub verbose: bool,
}
