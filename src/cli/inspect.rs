//! Inspect command implementation

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_SUCCESS};
use crate::build::BuildManifest;

/// Run the inspect command
pub fn run_inspect(path: &Path, json: bool) -> ExitCode {
    let manifest = match File::open(path) {
        Ok(file) => BuildManifest::load(&mut BufReader::new(file)),
        Err(e) => {
            eprintln!("Error: cannot open {}: {}", path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let manifest = match manifest {
        Ok(manifest) => manifest,
        Err(e) => {
            eprintln!("Error reading manifest {}: {}", path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if json {
        return match serde_json::to_string_pretty(&manifest) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::from(EXIT_SUCCESS)
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    print!("{}", format_manifest(&manifest));
    ExitCode::from(EXIT_SUCCESS)
}

/// Human-readable listing, one asset per line.
fn format_manifest(manifest: &BuildManifest) -> String {
    let mut out = String::new();
    for item in manifest.items() {
        let checksum = item.checksum.get(..12).unwrap_or(&item.checksum);
        out.push_str(&format!(
            "{:<8} {}  {} bytes  {}\n",
            item.status.to_string(),
            item.asset.path,
            item.length,
            checksum
        ));
        for (key, value) in item.asset.metadata.iter() {
            out.push_str(&format!("         {} = {}\n", key, value));
        }
        for dependency in &item.dependencies {
            out.push_str(&format!("         depends on {}\n", dependency.path));
        }
        if !item.message.is_empty() {
            out.push_str(&format!("         {}\n", item.message));
        }
    }
    out.push_str(&manifest.summary());
    out.push('\n');
    out
}
