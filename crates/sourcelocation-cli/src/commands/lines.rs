use super::{load_diff, print_structured};
use crate::{OutputFormat, Side};
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

pub fn run(diff_path: &Path, strip: usize, side: Side, format: OutputFormat) -> Result<()> {
    let diff = load_diff(diff_path, strip)?;
    let lines = match side {
        Side::Old => diff.deleted_lines(),
        Side::New => diff.inserted_lines(),
    };

    if print_structured(&lines, format)? {
        return Ok(());
    }

    if lines.is_empty() {
        println!("{}", "No changed lines".yellow());
    } else {
        println!("{lines}");
        println!(
            "{}",
            format!("✓ {} lines in {} files", lines.len(), lines.files().count()).green()
        );
    }

    Ok(())
}
