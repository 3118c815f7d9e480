use crate::location::{non_empty, parse_number};
use crate::{Result, SourceLocationError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// A one-indexed line within a specific file.
///
/// File lines order by filename (plain string order), then line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FileLine {
    filename: String,
    line: usize,
}

impl FileLine {
    pub fn new(filename: impl Into<String>, line: usize) -> Result<Self> {
        let filename = non_empty(filename.into())?;
        if line < 1 {
            return Err(SourceLocationError::InvalidLine(line));
        }
        Ok(Self { filename, line })
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }
}

impl fmt::Display for FileLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filename, self.line)
    }
}

impl FromStr for FileLine {
    type Err = SourceLocationError;

    fn from_str(s: &str) -> Result<Self> {
        let (filename, line) = s.rsplit_once(':').ok_or_else(|| {
            SourceLocationError::parse("file line", format!("missing ':' in {s:?}"))
        })?;
        Self::new(filename, parse_number("file line", line)?)
    }
}

impl From<FileLine> for String {
    fn from(line: FileLine) -> Self {
        line.to_string()
    }
}

impl TryFrom<String> for FileLine {
    type Error = SourceLocationError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// A set of file lines, grouped by file.
///
/// Files keep the order in which they were first added; lines within a
/// file are always kept sorted. Serializes as `{filename: [line, ...]}`
/// with ascending lines.
///
/// Not safe for concurrent writers without external synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    into = "IndexMap<String, Vec<usize>>",
    try_from = "IndexMap<String, Vec<usize>>"
)]
pub struct FileLineSet {
    contents: IndexMap<String, BTreeSet<usize>>,
}

impl FileLineSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a `{filename: lines}` mapping, validating every entry
    pub fn from_dict<F, L>(dict: impl IntoIterator<Item = (F, L)>) -> Result<Self>
    where
        F: Into<String>,
        L: IntoIterator<Item = usize>,
    {
        let mut set = Self::new();
        for (filename, lines) in dict {
            let filename = non_empty(filename.into())?;
            for line in lines {
                set.add(FileLine::new(filename.clone(), line)?);
            }
        }
        Ok(set)
    }

    /// Insert a line, returning `false` if it was already present
    pub fn add(&mut self, line: FileLine) -> bool {
        self.contents
            .entry(line.filename)
            .or_default()
            .insert(line.line)
    }

    #[must_use]
    pub fn contains(&self, line: &FileLine) -> bool {
        self.contents
            .get(&line.filename)
            .is_some_and(|lines| lines.contains(&line.line))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contents.values().map(BTreeSet::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Names of the files that have at least one line in this set
    pub fn files(&self) -> impl Iterator<Item = &str> + '_ {
        self.contents.keys().map(String::as_str)
    }

    /// Iterate over every line, file by file, lines ascending
    pub fn iter(&self) -> impl Iterator<Item = FileLine> + '_ {
        self.contents.iter().flat_map(|(filename, lines)| {
            lines.iter().map(move |&line| FileLine {
                filename: filename.clone(),
                line,
            })
        })
    }

    /// Iterate over the lines that belong to `filename`
    pub fn lines_in_file<'a>(&'a self, filename: &'a str) -> impl Iterator<Item = FileLine> + 'a {
        self.contents
            .get(filename)
            .into_iter()
            .flatten()
            .map(move |&line| FileLine {
                filename: filename.to_string(),
                line,
            })
    }

    /// Lines of this set that satisfy `predicate`
    #[must_use]
    pub fn filter(&self, mut predicate: impl FnMut(&FileLine) -> bool) -> Self {
        self.iter().filter(|line| predicate(line)).collect()
    }

    /// Lines in either set, merged file by file
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut union = self.clone();
        for (filename, lines) in &other.contents {
            union
                .contents
                .entry(filename.clone())
                .or_default()
                .extend(lines.iter().copied());
        }
        union
    }

    /// Lines present in both sets
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let mut contents = IndexMap::new();
        for (filename, lines) in &self.contents {
            let Some(other_lines) = other.contents.get(filename) else {
                continue;
            };
            let common: BTreeSet<usize> = lines.intersection(other_lines).copied().collect();
            if !common.is_empty() {
                contents.insert(filename.clone(), common);
            }
        }
        Self { contents }
    }

    /// The subset of lines that belong to any of the given files
    #[must_use]
    pub fn restricted_to_files<S: AsRef<str>>(
        &self,
        filenames: impl IntoIterator<Item = S>,
    ) -> Self {
        let mut contents = IndexMap::new();
        for filename in filenames {
            if let Some((filename, lines)) = self.contents.get_key_value(filename.as_ref()) {
                contents.insert(filename.clone(), lines.clone());
            }
        }
        Self { contents }
    }

    /// `{filename: [line, ...]}` with every file's lines in ascending order
    #[must_use]
    pub fn to_dict(&self) -> IndexMap<String, Vec<usize>> {
        self.contents
            .iter()
            .map(|(filename, lines)| (filename.clone(), lines.iter().copied().collect()))
            .collect()
    }
}

/// One file per output line, with runs of consecutive lines compressed:
/// `foo.c: 1..5; 7`
impl fmt::Display for FileLineSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (filename, lines) in &self.contents {
            let mut runs: Vec<(usize, usize)> = Vec::new();
            for &line in lines {
                match runs.last_mut() {
                    Some((_, stop)) if stop.checked_add(1) == Some(line) => *stop = line,
                    _ => runs.push((line, line)),
                }
            }

            if !first {
                writeln!(f)?;
            }
            first = false;

            write!(f, "{filename}: ")?;
            for (i, (start, stop)) in runs.iter().enumerate() {
                if i > 0 {
                    write!(f, "; ")?;
                }
                if start == stop {
                    write!(f, "{start}")?;
                } else {
                    write!(f, "{start}..{stop}")?;
                }
            }
        }
        Ok(())
    }
}

impl FromIterator<FileLine> for FileLineSet {
    fn from_iter<I: IntoIterator<Item = FileLine>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<FileLine> for FileLineSet {
    fn extend<I: IntoIterator<Item = FileLine>>(&mut self, iter: I) {
        for line in iter {
            self.add(line);
        }
    }
}

impl<'a> IntoIterator for &'a FileLineSet {
    type Item = FileLine;
    type IntoIter = Box<dyn Iterator<Item = FileLine> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl From<FileLineSet> for IndexMap<String, Vec<usize>> {
    fn from(set: FileLineSet) -> Self {
        set.to_dict()
    }
}

impl TryFrom<IndexMap<String, Vec<usize>>> for FileLineSet {
    type Error = SourceLocationError;

    fn try_from(dict: IndexMap<String, Vec<usize>>) -> Result<Self> {
        Self::from_dict(dict)
    }
}

/// A map keyed by file lines, stored per file.
///
/// Operations on this map are not thread safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLineMap<T> {
    contents: IndexMap<String, BTreeMap<usize, T>>,
    len: usize,
}

impl<T> Default for FileLineMap<T> {
    fn default() -> Self {
        Self {
            contents: IndexMap::new(),
            len: 0,
        }
    }
}

impl<T> FileLineMap<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous value for that line
    pub fn insert(&mut self, line: FileLine, value: T) -> Option<T> {
        let previous = self
            .contents
            .entry(line.filename)
            .or_default()
            .insert(line.line, value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    #[must_use]
    pub fn get(&self, line: &FileLine) -> Option<&T> {
        self.contents.get(&line.filename)?.get(&line.line)
    }

    pub fn get_mut(&mut self, line: &FileLine) -> Option<&mut T> {
        self.contents.get_mut(&line.filename)?.get_mut(&line.line)
    }

    #[must_use]
    pub fn contains_key(&self, line: &FileLine) -> bool {
        self.get(line).is_some()
    }

    /// Remove a line, dropping its file once no lines remain
    pub fn remove(&mut self, line: &FileLine) -> Option<T> {
        let lines = self.contents.get_mut(&line.filename)?;
        let value = lines.remove(&line.line)?;
        if lines.is_empty() {
            self.contents.shift_remove(&line.filename);
        }
        self.len -= 1;
        Some(value)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over entries, file by file, lines ascending
    pub fn iter(&self) -> impl Iterator<Item = (FileLine, &T)> + '_ {
        self.contents.iter().flat_map(|(filename, lines)| {
            lines.iter().map(move |(&line, value)| {
                (
                    FileLine {
                        filename: filename.clone(),
                        line,
                    },
                    value,
                )
            })
        })
    }

    /// The set of lines that have a value
    #[must_use]
    pub fn keys(&self) -> FileLineSet {
        self.iter().map(|(line, _)| line).collect()
    }
}

impl<T> FromIterator<(FileLine, T)> for FileLineMap<T> {
    fn from_iter<I: IntoIterator<Item = (FileLine, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (line, value) in iter {
            map.insert(line, value);
        }
        map
    }
}
