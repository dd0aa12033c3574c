//! Build command implementation

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_SUCCESS};
use crate::build::{BuildEngine, BuildManifest};
use crate::builtin;
use crate::config::loader::{find_config, load_config, CONFIG_FILENAME};
use crate::io::Environment;

/// Run the build command
pub fn run_build(config: Option<&Path>, force: bool) -> ExitCode {
    let config_path: PathBuf = match config.map(Path::to_path_buf).or_else(find_config) {
        Some(path) => path,
        None => {
            eprintln!("Error: no {} found in the current directory or its parents", CONFIG_FILENAME);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    tracing::debug!(config = %config_path.display(), "using config");

    let mut configuration = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let environment = match Environment::physical() {
        Ok(env) => env,
        Err(e) => {
            eprintln!("Error: cannot determine the working directory: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let engine = match BuildEngine::new(environment, builtin::components()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let fs = engine.environment().file_system();

    let previous = match (&configuration.output_directory, force) {
        (Some(output), false) => match BuildManifest::load_from(fs, output) {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::warn!("Ignoring unreadable manifest: {}", e);
                None
            }
        },
        _ => None,
    };

    if force {
        println!("Building (force rebuild, ignoring manifest)...");
    } else {
        println!("Building (incremental)...");
    }

    let manifest = match engine.build(&mut configuration, previous.as_ref()) {
        Ok(manifest) => manifest,
        Err(e) => {
            eprintln!("Build error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if let Some(output) = &configuration.output_directory {
        if let Err(e) = manifest.save_to(fs, output) {
            eprintln!("Error saving manifest: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    }

    println!("{}", manifest.summary());
    if manifest.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}
