use anyhow::{anyhow, Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod classpath;
mod cli;
mod config;
mod discovery;
mod error;
mod materialize;
mod merge;
mod options;
mod paths;
mod pipeline;
mod properties;
mod util;

use crate::classpath::{ArtifactResolver, LocalRepository, NoRepository};
use crate::cli::{Command, GenerateArgs, InitArgs, RootArgs};
use crate::config::{BuildConfig, PipelineInputs};
use crate::error::{log_config_error, ConfigError};
use crate::paths::ProjectPaths;

/// Exit status for fatal configuration errors.
const CONFIG_ERROR_EXIT: u8 = 2;

fn main() -> ExitCode {
    let args = match RootArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };
    let verbose = matches!(&args.command, Command::Generate(generate) if generate.verbose);
    init_tracing(verbose);

    let result = match args.command {
        Command::Init(args) => run_init(args),
        Command::Generate(args) => run_generate(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<ConfigError>() {
            Some(config_err) => {
                log_config_error(config_err);
                ExitCode::from(CONFIG_ERROR_EXIT)
            }
            None => {
                eprintln!("Error: {err:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

fn ensure_project_root(path: &Path, create: bool) -> Result<PathBuf> {
    if create {
        fs::create_dir_all(path).context("create project root")?;
    }
    path.canonicalize()
        .with_context(|| format!("resolve project root {}", path.display()))
}

fn run_init(args: InitArgs) -> Result<()> {
    let paths = ProjectPaths::new(ensure_project_root(&args.project_root, true)?);
    let config_path = paths.build_config_path();
    if config_path.is_file() && !args.force {
        return Err(anyhow!(
            "build config already exists at {} (use --force to overwrite)",
            config_path.display()
        ));
    }
    config::write_build_config(&config_path, &config::build_config_stub()?)?;
    println!("wrote {}", config_path.display());
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let paths = ProjectPaths::new(ensure_project_root(&args.project_root, false)?);
    let mut build_config = match args.build_config.as_deref() {
        Some(path) => config::load_build_config(path)?,
        None if paths.build_config_path().is_file() => {
            config::load_build_config(&paths.build_config_path())?
        }
        None => config::default_build_config(),
    };
    apply_cli_overrides(&mut build_config, &args);
    config::validate_build_config(&build_config)?;

    let repository =
        config::resolve_local_repository(&paths, build_config.local_repository.as_deref())
            .map(LocalRepository::new);
    let resolver: &dyn ArtifactResolver = match &repository {
        Some(repository) => {
            tracing::debug!(repository = %repository.root().display(), "local repository");
            repository
        }
        None => &NoRepository,
    };

    let inputs = PipelineInputs::from_config(paths, build_config, args.define);
    let report = pipeline::run(&inputs, resolver)?;

    if let Some(out) = &args.report {
        let json = serde_json::to_string_pretty(&report).context("serialize run report")?;
        fs::write(out, json).with_context(|| format!("write {}", out.display()))?;
    }
    if args.json {
        let json = serde_json::to_string_pretty(&report).context("serialize run report")?;
        println!("{json}");
    } else {
        for artifact in &report.artifacts {
            println!("wrote {}", artifact.properties_file);
        }
    }
    Ok(())
}

fn apply_cli_overrides(build_config: &mut BuildConfig, args: &GenerateArgs) {
    if let Some(path) = &args.properties {
        build_config.path = Some(path.clone());
    }
    if let Some(dir) = &args.test_dir {
        build_config.path_test = Some(dir.clone());
    }
    if args.daemon {
        build_config.daemon_option = true;
    }
    if args.no_daemon {
        build_config.daemon_option = false;
    }
    if let Some(period) = args.daemon_period {
        build_config.daemon_period = period;
    }
    if args.include_dependencies {
        build_config.include_dependencies = true;
    }
    if let Some(repository) = &args.local_repository {
        build_config.local_repository = Some(repository.clone());
    }
    if let Some(profile) = args.profile {
        build_config.profile = profile;
    }
    if let Some(version) = &args.jython_version {
        build_config.jython_version = Some(version.clone());
    }
}
