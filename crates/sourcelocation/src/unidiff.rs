use crate::location::parse_number;
use crate::{Diff, FileDiff, Hunk, HunkLine, Result, SourceLocationError};

/// Reads unified diffs as produced by `git diff`, `diff -u` and `svn diff`.
///
/// Anything before a `---` line (`diff --git`, `index`, `Index:`, ...) is
/// skipped. Hunks consume exactly the number of lines their header declares.
struct Reader<'a> {
    lines: Vec<&'a str>,
    position: usize,
}

impl<'a> Reader<'a> {
    fn new(text: &'a str) -> Self {
        // split on '\n' alone so a '\r' ending stays part of the line content
        let mut lines: Vec<&'a str> = text.split('\n').collect();
        if text.is_empty() || text.ends_with('\n') {
            lines.pop();
        }
        Self { lines, position: 0 }
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.position).copied()
    }

    fn next_line(&mut self) -> Option<&'a str> {
        let line = self.peek()?;
        self.position += 1;
        Some(line)
    }

    /// Skip blank lines, returning whether any input remains
    fn skip_blank(&mut self) -> bool {
        while let Some(line) = self.peek() {
            if !line.trim().is_empty() {
                return true;
            }
            self.position += 1;
        }
        false
    }

    /// Fail if anything but blank lines is left after a `kind`
    fn finish(&mut self, kind: &'static str) -> Result<()> {
        if !self.skip_blank() {
            return Ok(());
        }
        let line = self.peek().unwrap_or_default();
        Err(SourceLocationError::parse(
            kind,
            format!("unexpected trailing line {line:?}"),
        ))
    }

    fn read_file_diff(&mut self) -> Result<FileDiff> {
        let old_filename = loop {
            let line = self.next_line().ok_or_else(|| {
                SourceLocationError::parse("file diff", "couldn't find line starting with '---'")
            })?;
            if let Some(rest) = line.strip_prefix("--- ") {
                break header_filename(rest);
            }
            tracing::trace!(line, "Skipping preamble line");
        };

        let new_filename = self
            .next_line()
            .and_then(|line| line.strip_prefix("+++ "))
            .map(header_filename)
            .ok_or_else(|| {
                SourceLocationError::parse(
                    "file diff",
                    format!("expected '+++' line after '--- {old_filename}'"),
                )
            })?;

        let mut hunks = Vec::new();
        while self.peek().is_some_and(|line| line.starts_with("@@")) {
            hunks.push(self.read_hunk()?);
        }

        tracing::debug!(
            old_filename = %old_filename,
            new_filename = %new_filename,
            hunks = hunks.len(),
            "Read file diff"
        );
        FileDiff::new(old_filename, new_filename, hunks)
    }

    fn read_hunk(&mut self) -> Result<Hunk> {
        let header = self.next_line().unwrap_or_default();
        let (old_start, old_count, new_start, new_count, section) = parse_hunk_header(header)?;

        let mut old_remaining = old_count;
        let mut new_remaining = new_count;
        let mut lines = Vec::with_capacity(old_count.max(new_count));

        while old_remaining > 0 || new_remaining > 0 {
            let line = self.next_line().ok_or_else(|| {
                SourceLocationError::parse(
                    "hunk",
                    format!("unexpected end of input in {header:?}"),
                )
            })?;
            if line.starts_with('\\') {
                continue;
            }

            let hunk_line: HunkLine = line.parse().map_err(|_| {
                SourceLocationError::parse(
                    "hunk",
                    format!("unexpected line {line:?} in {header:?}"),
                )
            })?;
            let takes_old = hunk_line.is_old_side();
            let takes_new = hunk_line.is_new_side();

            if (takes_old && old_remaining == 0) || (takes_new && new_remaining == 0) {
                return Err(SourceLocationError::parse(
                    "hunk",
                    format!("more lines than declared in {header:?}"),
                ));
            }
            old_remaining -= usize::from(takes_old);
            new_remaining -= usize::from(takes_new);
            lines.push(hunk_line);
        }

        // "\ No newline at end of file"
        while self.peek().is_some_and(|line| line.starts_with('\\')) {
            self.position += 1;
        }

        let hunk = Hunk::new(old_start, old_count, new_start, new_count, lines)?;
        Ok(match section {
            Some(section) => hunk.with_section(section),
            None => hunk,
        })
    }
}

/// Parse `@@ -a[,b] +c[,d] @@[ section]`
fn parse_hunk_header(header: &str) -> Result<(usize, usize, usize, usize, Option<&str>)> {
    let invalid =
        || SourceLocationError::parse("hunk header", format!("invalid header {header:?}"));

    let header = header.strip_suffix('\r').unwrap_or(header);
    let rest = header.strip_prefix("@@ -").ok_or_else(invalid)?;
    let (ranges, section) = rest.split_once(" @@").ok_or_else(invalid)?;
    let (old_range, new_range) = ranges.split_once(" +").ok_or_else(invalid)?;
    let (old_start, old_count) = parse_hunk_range(old_range)?;
    let (new_start, new_count) = parse_hunk_range(new_range)?;

    let section = section.strip_prefix(' ').unwrap_or(section);
    let section = (!section.is_empty()).then_some(section);
    Ok((old_start, old_count, new_start, new_count, section))
}

/// Parse `start[,count]`; an omitted count means one line
fn parse_hunk_range(range: &str) -> Result<(usize, usize)> {
    match range.split_once(',') {
        Some((start, count)) => Ok((
            parse_number("hunk header", start)?,
            parse_number("hunk header", count)?,
        )),
        None => Ok((parse_number("hunk header", range)?, 1)),
    }
}

/// Filename from a `---`/`+++` header; anything after a tab is a timestamp
/// or revision
fn header_filename(rest: &str) -> String {
    rest.split('\t').next().unwrap_or(rest).trim().to_string()
}

pub(crate) fn read_diff(text: &str) -> Result<Diff> {
    let mut reader = Reader::new(text);
    let mut file_diffs = Vec::new();
    while reader.skip_blank() {
        file_diffs.push(reader.read_file_diff()?);
    }
    Ok(Diff::from_file_diffs(file_diffs))
}

pub(crate) fn read_file_diff(text: &str) -> Result<FileDiff> {
    let mut reader = Reader::new(text);
    let file_diff = reader.read_file_diff()?;
    reader.finish("file diff")?;
    Ok(file_diff)
}

pub(crate) fn read_hunk(text: &str) -> Result<Hunk> {
    let mut reader = Reader::new(text);
    reader.skip_blank();
    let hunk = reader.read_hunk()?;
    reader.finish("hunk")?;
    Ok(hunk)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hunk_header() {
        assert_eq!(
            parse_hunk_header("@@ -6,6 +6,8 @@").unwrap(),
            (6, 6, 6, 8, None)
        );
        assert_eq!(
            parse_hunk_header("@@ -3 +3,0 @@ fn main() {").unwrap(),
            (3, 1, 3, 0, Some("fn main() {"))
        );
        assert!(parse_hunk_header("@@ -a,1 +1,1 @@").is_err());
        assert!(parse_hunk_header("@@ -1,1 +1,1").is_err());
        assert!(parse_hunk_header("-1,1 +1,1 @@").is_err());
    }

    #[test]
    fn test_header_filename_drops_revision() {
        assert_eq!(header_filename("src/joblist.c\t(revision 1794)"), "src/joblist.c");
        assert_eq!(header_filename("b/file two.txt"), "b/file two.txt");
    }

    #[test]
    fn test_read_hunk_consumes_declared_lines() {
        let text = [
            "--- a.txt",
            "+++ a.txt",
            "@@ -1,7 +1,6 @@",
            "-The Way that can be told of is not the eternal Way;",
            "-The name that can be named is not the eternal name.",
            " The Nameless is the origin of Heaven and Earth;",
            "-The Named is the mother of all things.",
            "+The named is the mother of all things.",
            "+",
            " Therefore let there always be non-being,",
            "   so we may see their subtlety,",
            " And let there always be being,",
        ]
        .join("\n");

        let mut reader = Reader::new(&text);
        let file_diff = reader.read_file_diff().unwrap();
        assert!(!reader.skip_blank());
        assert_eq!(file_diff.hunks().len(), 1);
        assert_eq!(file_diff.to_string(), text);
    }

    #[test]
    fn test_empty_context_line_and_no_newline_marker() {
        let text =
            "--- a.txt\n+++ a.txt\n@@ -1,2 +1,2 @@\n\n-x\n+y\n\\ No newline at end of file\n";
        let diff = read_diff(text).unwrap();
        let hunk = &diff.file_diffs()[0].hunks()[0];
        assert_eq!(hunk.lines()[0], HunkLine::Context(String::new()));
        assert_eq!(hunk.lines().len(), 3);
    }

    #[test]
    fn test_truncated_hunk_is_rejected() {
        let text = "--- a.txt\n+++ a.txt\n@@ -1,3 +1,3 @@\n a\n b\n";
        assert!(matches!(
            read_diff(text),
            Err(SourceLocationError::Parse { kind: "hunk", .. })
        ));
    }

    #[test]
    fn test_overlong_hunk_side_is_rejected() {
        let text = "--- a.txt\n+++ a.txt\n@@ -1,1 +1,2 @@\n-a\n-b\n+c\n";
        assert!(read_diff(text).is_err());
    }

    #[test]
    fn test_missing_file_header_is_rejected() {
        assert!(read_diff("diff --git a/x b/x\nindex 123..456\n").is_err());
        assert!(read_diff("--- a/x\n@@ -1,1 +1,1 @@\n").is_err());
        assert!(read_diff("\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_crlf_line_endings_stay_in_content() {
        let text = "--- a.txt\r\n+++ a.txt\r\n@@ -1,2 +1,2 @@ top\r\n a\r\n-b\r\n+c\r\n";
        let diff = read_diff(text).unwrap();
        let file_diff = &diff.file_diffs()[0];
        assert_eq!(file_diff.old_filename(), "a.txt");

        let hunk = &file_diff.hunks()[0];
        assert_eq!(hunk.section(), Some("top"));
        assert_eq!(
            hunk.lines(),
            &[
                HunkLine::Context("a\r".to_string()),
                HunkLine::Deleted("b\r".to_string()),
                HunkLine::Inserted("c\r".to_string()),
            ]
        );
    }

    #[test]
    fn test_single_value_readers_reject_trailing_input() {
        let file_diff = "--- a.txt\n+++ a.txt\n@@ -1 +1 @@\n-a\n+b\n\n";
        assert!(read_file_diff(file_diff).is_ok());

        let two = format!("{file_diff}--- b.txt\n+++ b.txt\n");
        assert!(matches!(
            read_file_diff(&two),
            Err(SourceLocationError::Parse { kind: "file diff", .. })
        ));
        assert!(read_hunk("@@ -1 +1 @@\n-a\n+b\n+c\n").is_err());
    }
}
