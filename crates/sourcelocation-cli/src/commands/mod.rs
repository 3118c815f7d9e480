pub mod files;
pub mod lines;

use crate::OutputFormat;
use anyhow::{Context, Result};
use serde::Serialize;
use sourcelocation::Diff;
use std::io::Read;
use std::path::Path;

/// Read and parse a unified diff from a file, or from stdin when the path is `-`
pub fn load_diff(path: &Path, strip: usize) -> Result<Diff> {
    let text = if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read diff from stdin")?;
        text
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };

    let diff: Diff = text
        .parse()
        .with_context(|| format!("Failed to parse diff {}", path.display()))?;
    tracing::debug!(files = diff.file_diffs().len(), "Loaded diff");

    diff.strip(strip)
        .with_context(|| format!("Failed to strip {strip} path components"))
}

/// Print a machine-readable value; returns `false` for human output
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Human => Ok(false),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(true)
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(value)?);
            Ok(true)
        }
    }
}
