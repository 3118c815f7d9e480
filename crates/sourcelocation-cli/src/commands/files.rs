use super::{load_diff, print_structured};
use crate::OutputFormat;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

pub fn run(diff_path: &Path, strip: usize, format: OutputFormat) -> Result<()> {
    let diff = load_diff(diff_path, strip)?;
    let files = diff.files();

    if print_structured(&files, format)? {
        return Ok(());
    }

    if files.is_empty() {
        println!("{}", "No files changed".yellow());
        return Ok(());
    }

    for file_diff in diff.file_diffs() {
        let hunks = file_diff.hunks().len();
        println!(
            "{} ({} {})",
            file_diff.filename().bold(),
            hunks,
            if hunks == 1 { "hunk" } else { "hunks" }
        );
    }

    Ok(())
}
