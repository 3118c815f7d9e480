use crate::error::HunkSide;
use crate::location::non_empty;
use crate::{FileLine, FileLineSet, Result, SourceLocationError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Filename used by unified diffs for the missing side of an added or
/// deleted file
pub const DEV_NULL: &str = "/dev/null";

/// A single line within a hunk, encoded with its ` `, `+` or `-` prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum HunkLine {
    /// Unchanged line, present on both sides
    Context(String),
    /// Line only present in the new version
    Inserted(String),
    /// Line only present in the old version
    Deleted(String),
}

impl HunkLine {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Context(text) | Self::Inserted(text) | Self::Deleted(text) => text,
        }
    }

    #[must_use]
    pub const fn is_old_side(&self) -> bool {
        matches!(self, Self::Context(_) | Self::Deleted(_))
    }

    #[must_use]
    pub const fn is_new_side(&self) -> bool {
        matches!(self, Self::Context(_) | Self::Inserted(_))
    }
}

impl fmt::Display for HunkLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context(text) => write!(f, " {text}"),
            Self::Inserted(text) => write!(f, "+{text}"),
            Self::Deleted(text) => write!(f, "-{text}"),
        }
    }
}

impl FromStr for HunkLine {
    type Err = SourceLocationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.chars().next() {
            Some('+') => Ok(Self::Inserted(s[1..].to_string())),
            Some('-') => Ok(Self::Deleted(s[1..].to_string())),
            Some(' ') => Ok(Self::Context(s[1..].to_string())),
            // some tools strip the space from empty context lines
            None => Ok(Self::Context(String::new())),
            Some(_) => Err(SourceLocationError::parse(
                "hunk line",
                format!("expected ' ', '+' or '-' prefix in {s:?}"),
            )),
        }
    }
}

/// A contiguous block of changed lines between an old and a new version of
/// a file.
///
/// The old side of a hunk is its context and deleted lines, the new side its
/// context and inserted lines. The declared line counts always match the
/// content of each side. A side with lines starts at line 1 or later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Hunk {
    old_start_line: usize,
    old_line_count: usize,
    new_start_line: usize,
    new_line_count: usize,
    section: Option<String>,
    lines: Vec<HunkLine>,
}

impl Hunk {
    pub fn new(
        old_start_line: usize,
        old_line_count: usize,
        new_start_line: usize,
        new_line_count: usize,
        lines: Vec<HunkLine>,
    ) -> Result<Self> {
        check_span(HunkSide::Old, old_start_line, old_line_count)?;
        check_span(HunkSide::New, new_start_line, new_line_count)?;

        let old_actual = lines.iter().filter(|l| l.is_old_side()).count();
        if old_actual != old_line_count {
            return Err(SourceLocationError::HunkLineCount {
                side: HunkSide::Old,
                declared: old_line_count,
                actual: old_actual,
            });
        }

        let new_actual = lines.iter().filter(|l| l.is_new_side()).count();
        if new_actual != new_line_count {
            return Err(SourceLocationError::HunkLineCount {
                side: HunkSide::New,
                declared: new_line_count,
                actual: new_actual,
            });
        }

        Ok(Self {
            old_start_line,
            old_line_count,
            new_start_line,
            new_line_count,
            section: None,
            lines,
        })
    }

    /// Build a hunk that replaces `old_lines` with `new_lines`, taking the
    /// counts from the supplied content
    pub fn from_sides<O, N>(
        old_start_line: usize,
        old_lines: impl IntoIterator<Item = O>,
        new_start_line: usize,
        new_lines: impl IntoIterator<Item = N>,
    ) -> Result<Self>
    where
        O: Into<String>,
        N: Into<String>,
    {
        let mut lines: Vec<HunkLine> = old_lines
            .into_iter()
            .map(|line| HunkLine::Deleted(line.into()))
            .collect();
        let old_line_count = lines.len();
        lines.extend(new_lines.into_iter().map(|line| HunkLine::Inserted(line.into())));
        let new_line_count = lines.len() - old_line_count;

        Self::new(
            old_start_line,
            old_line_count,
            new_start_line,
            new_line_count,
            lines,
        )
    }

    /// Attach the section heading shown after the `@@` header
    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        let section = section.into();
        self.section = (!section.is_empty()).then_some(section);
        self
    }

    #[must_use]
    pub const fn old_start_line(&self) -> usize {
        self.old_start_line
    }

    #[must_use]
    pub const fn old_line_count(&self) -> usize {
        self.old_line_count
    }

    #[must_use]
    pub const fn new_start_line(&self) -> usize {
        self.new_start_line
    }

    #[must_use]
    pub const fn new_line_count(&self) -> usize {
        self.new_line_count
    }

    #[must_use]
    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    #[must_use]
    pub fn lines(&self) -> &[HunkLine] {
        &self.lines
    }

    /// Content of the old version covered by this hunk
    pub fn old_lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines
            .iter()
            .filter(|l| l.is_old_side())
            .map(HunkLine::text)
    }

    /// Content of the new version covered by this hunk
    pub fn new_lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines
            .iter()
            .filter(|l| l.is_new_side())
            .map(HunkLine::text)
    }

    /// Old-side line numbers of the deleted lines
    pub fn deleted_lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.old_side_numbers()
            .filter_map(|(line, number)| matches!(line, HunkLine::Deleted(_)).then_some(number))
    }

    /// New-side line numbers of the inserted lines
    pub fn inserted_lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.new_side_numbers()
            .filter_map(|(line, number)| matches!(line, HunkLine::Inserted(_)).then_some(number))
    }

    fn old_side_numbers(&self) -> impl Iterator<Item = (&HunkLine, usize)> + '_ {
        self.lines
            .iter()
            .filter(|l| l.is_old_side())
            .zip(self.old_start_line..=usize::MAX)
    }

    fn new_side_numbers(&self) -> impl Iterator<Item = (&HunkLine, usize)> + '_ {
        self.lines
            .iter()
            .filter(|l| l.is_new_side())
            .zip(self.new_start_line..=usize::MAX)
    }
}

impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@@ -{},{} +{},{} @@",
            self.old_start_line, self.old_line_count, self.new_start_line, self.new_line_count
        )?;
        if let Some(section) = &self.section {
            write!(f, " {section}")?;
        }
        for line in &self.lines {
            write!(f, "\n{line}")?;
        }
        Ok(())
    }
}

impl FromStr for Hunk {
    type Err = SourceLocationError;

    fn from_str(s: &str) -> Result<Self> {
        crate::unidiff::read_hunk(s)
    }
}

/// Line numbers of a side with lines must fit in `1..=usize::MAX`
fn check_span(side: HunkSide, start: usize, count: usize) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    if start == 0 {
        return Err(SourceLocationError::InvalidLine(start));
    }
    if start.checked_add(count - 1).is_none() {
        return Err(SourceLocationError::HunkOutOfRange { side, start, count });
    }
    Ok(())
}

/// A hunk together with the file it belongs to.
///
/// Encoded as a single-hunk unified diff: `---`/`+++` header, then the hunk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FileHunk {
    old_filename: String,
    new_filename: String,
    hunk: Hunk,
}

impl FileHunk {
    /// A hunk that changes `filename` in place
    pub fn new(filename: impl Into<String>, hunk: Hunk) -> Result<Self> {
        let filename = non_empty(filename.into())?;
        Ok(Self {
            old_filename: filename.clone(),
            new_filename: filename,
            hunk,
        })
    }

    /// A hunk whose old and new versions live under different names
    pub fn renamed(
        old_filename: impl Into<String>,
        new_filename: impl Into<String>,
        hunk: Hunk,
    ) -> Result<Self> {
        Ok(Self {
            old_filename: non_empty(old_filename.into())?,
            new_filename: non_empty(new_filename.into())?,
            hunk,
        })
    }

    /// The file this hunk applies to: the new name, unless the file is deleted
    #[must_use]
    pub fn filename(&self) -> &str {
        effective_filename(&self.old_filename, &self.new_filename)
    }

    #[must_use]
    pub fn old_filename(&self) -> &str {
        &self.old_filename
    }

    #[must_use]
    pub fn new_filename(&self) -> &str {
        &self.new_filename
    }

    #[must_use]
    pub const fn hunk(&self) -> &Hunk {
        &self.hunk
    }

    #[must_use]
    pub fn into_hunk(self) -> Hunk {
        self.hunk
    }
}

impl fmt::Display for FileHunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "--- {}\n+++ {}\n{}",
            self.old_filename, self.new_filename, self.hunk
        )
    }
}

impl FromStr for FileHunk {
    type Err = SourceLocationError;

    fn from_str(s: &str) -> Result<Self> {
        let FileDiff {
            old_filename,
            new_filename,
            hunks,
        } = s.parse()?;
        let [hunk]: [Hunk; 1] = hunks.try_into().map_err(|hunks: Vec<Hunk>| {
            SourceLocationError::parse(
                "file hunk",
                format!("expected exactly one hunk, found {}", hunks.len()),
            )
        })?;
        Ok(Self {
            old_filename,
            new_filename,
            hunk,
        })
    }
}

/// The changes made to a single text file, hunks ordered by old start line
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FileDiff {
    old_filename: String,
    new_filename: String,
    hunks: Vec<Hunk>,
}

impl FileDiff {
    /// Build a file diff from a file header and its hunks, in any order
    pub fn new(
        old_filename: impl Into<String>,
        new_filename: impl Into<String>,
        mut hunks: Vec<Hunk>,
    ) -> Result<Self> {
        // stable: hunks starting on the same line keep their input order
        hunks.sort_by_key(Hunk::old_start_line);
        Ok(Self {
            old_filename: non_empty(old_filename.into())?,
            new_filename: non_empty(new_filename.into())?,
            hunks,
        })
    }

    /// Build a file diff from hunks that all belong to the same file
    pub fn from_hunks(hunks: impl IntoIterator<Item = FileHunk>) -> Result<Self> {
        let mut hunks = hunks.into_iter();
        let first = hunks.next().ok_or(SourceLocationError::NoHunks)?;

        let mut body = vec![first.hunk];
        for file_hunk in hunks {
            if file_hunk.old_filename != first.old_filename
                || file_hunk.new_filename != first.new_filename
            {
                return Err(SourceLocationError::MismatchedFilenames {
                    expected: effective_filename(&first.old_filename, &first.new_filename)
                        .to_string(),
                    found: file_hunk.filename().to_string(),
                });
            }
            body.push(file_hunk.hunk);
        }

        Self::new(first.old_filename, first.new_filename, body)
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        effective_filename(&self.old_filename, &self.new_filename)
    }

    #[must_use]
    pub fn old_filename(&self) -> &str {
        &self.old_filename
    }

    #[must_use]
    pub fn new_filename(&self) -> &str {
        &self.new_filename
    }

    #[must_use]
    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    pub fn file_hunks(&self) -> impl Iterator<Item = FileHunk> + '_ {
        self.hunks.iter().map(|hunk| FileHunk {
            old_filename: self.old_filename.clone(),
            new_filename: self.new_filename.clone(),
            hunk: hunk.clone(),
        })
    }

    /// Remove the first `num_components` path components from both names,
    /// like `patch -p`. `/dev/null` is left alone.
    pub fn strip(&self, num_components: usize) -> Result<Self> {
        Ok(Self {
            old_filename: strip_components(&self.old_filename, num_components)?,
            new_filename: strip_components(&self.new_filename, num_components)?,
            hunks: self.hunks.clone(),
        })
    }

    /// Lines of the old version removed by this diff
    #[must_use]
    pub fn deleted_lines(&self) -> FileLineSet {
        let lines = self.hunks.iter().flat_map(|hunk| hunk.deleted_lines());
        collect_lines(&self.old_filename, lines)
    }

    /// Lines of the new version added by this diff
    #[must_use]
    pub fn inserted_lines(&self) -> FileLineSet {
        let lines = self.hunks.iter().flat_map(|hunk| hunk.inserted_lines());
        collect_lines(&self.new_filename, lines)
    }
}

fn collect_lines(filename: &str, lines: impl Iterator<Item = usize>) -> FileLineSet {
    // hunks only number lines from 1 and filenames are never empty,
    // so every line is accepted
    lines
        .filter_map(|line| FileLine::new(filename, line).ok())
        .collect()
}

impl fmt::Display for FileDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--- {}\n+++ {}", self.old_filename, self.new_filename)?;
        for hunk in &self.hunks {
            write!(f, "\n{hunk}")?;
        }
        Ok(())
    }
}

impl FromStr for FileDiff {
    type Err = SourceLocationError;

    fn from_str(s: &str) -> Result<Self> {
        crate::unidiff::read_file_diff(s)
    }
}

/// A set of changes to one or more text files
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Diff {
    file_diffs: Vec<FileDiff>,
}

impl Diff {
    #[must_use]
    pub fn from_file_diffs(file_diffs: Vec<FileDiff>) -> Self {
        Self { file_diffs }
    }

    /// Group hunks by file into one `FileDiff` per file.
    ///
    /// File diffs are ordered by the first appearance of their file in
    /// `hunks`, not alphabetically. Hunks of a file are ordered by old start
    /// line.
    pub fn from_hunks(hunks: impl IntoIterator<Item = FileHunk>) -> Result<Self> {
        let mut groups: IndexMap<(String, String), Vec<FileHunk>> = IndexMap::new();
        for file_hunk in hunks {
            let key = (
                file_hunk.old_filename.clone(),
                file_hunk.new_filename.clone(),
            );
            groups.entry(key).or_default().push(file_hunk);
        }

        let file_diffs = groups
            .into_values()
            .map(|hunks| FileDiff::from_hunks(hunks))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { file_diffs })
    }

    #[must_use]
    pub fn file_diffs(&self) -> &[FileDiff] {
        &self.file_diffs
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.file_diffs.is_empty()
    }

    /// Names of the files changed by this diff
    #[must_use]
    pub fn files(&self) -> Vec<&str> {
        self.file_diffs.iter().map(FileDiff::filename).collect()
    }

    pub fn file_hunks(&self) -> impl Iterator<Item = FileHunk> + '_ {
        self.file_diffs.iter().flat_map(|file_diff| file_diff.file_hunks())
    }

    /// Remove the first `num_components` path components from every file
    pub fn strip(&self, num_components: usize) -> Result<Self> {
        let file_diffs = self
            .file_diffs
            .iter()
            .map(|file_diff| file_diff.strip(num_components))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { file_diffs })
    }

    /// Lines of the old versions removed by this diff, keyed by old filename
    #[must_use]
    pub fn deleted_lines(&self) -> FileLineSet {
        self.file_diffs
            .iter()
            .fold(FileLineSet::new(), |lines, file_diff| {
                lines.union(&file_diff.deleted_lines())
            })
    }

    /// Lines of the new versions added by this diff, keyed by new filename
    #[must_use]
    pub fn inserted_lines(&self) -> FileLineSet {
        self.file_diffs
            .iter()
            .fold(FileLineSet::new(), |lines, file_diff| {
                lines.union(&file_diff.inserted_lines())
            })
    }
}

/// Renders as a unified diff, every file diff terminated by a newline
impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file_diff in &self.file_diffs {
            writeln!(f, "{file_diff}")?;
        }
        Ok(())
    }
}

impl FromStr for Diff {
    type Err = SourceLocationError;

    fn from_str(s: &str) -> Result<Self> {
        crate::unidiff::read_diff(s)
    }
}

macro_rules! text_encoding {
    ($($ty:ty),* $(,)?) => {$(
        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.to_string()
            }
        }

        impl TryFrom<String> for $ty {
            type Error = SourceLocationError;

            fn try_from(s: String) -> Result<Self> {
                s.parse()
            }
        }
    )*};
}

text_encoding!(HunkLine, Hunk, FileHunk, FileDiff, Diff);

fn effective_filename<'a>(old_filename: &'a str, new_filename: &'a str) -> &'a str {
    if new_filename == DEV_NULL {
        old_filename
    } else {
        new_filename
    }
}

fn strip_components(filename: &str, num_components: usize) -> Result<String> {
    if num_components == 0 || filename == DEV_NULL {
        return Ok(filename.to_string());
    }
    let stripped = filename
        .split('/')
        .skip(num_components)
        .collect::<Vec<_>>()
        .join("/");
    non_empty(stripped)
}
