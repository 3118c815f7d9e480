use crate::{FileLine, Result, SourceLocationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// A character location within an unspecified file.
///
/// Lines are one-indexed and columns are zero-indexed, matching what most
/// editors show in their status bar. `Location::new(1, 0)` is the first
/// character of a file.
///
/// Locations order by line, then column. The text form `line:column` also
/// decodes line 0, which only appears in offsets produced by
/// [`RelativeLocation`](crate::RelativeLocation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Location {
    line: usize,
    column: usize,
}

impl Location {
    /// Create a location, rejecting line 0.
    pub fn new(line: usize, column: usize) -> Result<Self> {
        if line < 1 {
            return Err(SourceLocationError::InvalidLine(line));
        }
        Ok(Self { line, column })
    }

    /// Build a location offset without the one-indexed line check.
    ///
    /// Only relative locations may have line 0.
    pub(crate) const fn offset(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// One-indexed line number
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Zero-indexed column number
    #[must_use]
    pub const fn column(&self) -> usize {
        self.column
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl FromStr for Location {
    type Err = SourceLocationError;

    fn from_str(s: &str) -> Result<Self> {
        let (line, column) = s.split_once(':').ok_or_else(|| {
            SourceLocationError::parse("location", format!("missing ':' in {s:?}"))
        })?;
        let line = parse_number("location", line)?;
        let column = parse_number("location", column)?;
        if line == 0 {
            // relative offset on its origin's line
            return Ok(Self::offset(line, column));
        }
        Self::new(line, column)
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.to_string()
    }
}

impl TryFrom<String> for Location {
    type Error = SourceLocationError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// A contiguous, half-open range of locations: `start` is included and
/// `stop` is not.
///
/// A range whose start equals its stop is empty and marks an insertion
/// point. Ranges order by start, then stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct LocationRange {
    start: Location,
    stop: Location,
}

impl LocationRange {
    pub fn new(start: Location, stop: Location) -> Result<Self> {
        if start > stop {
            return Err(SourceLocationError::InvalidRange { start, stop });
        }
        Ok(Self { start, stop })
    }

    /// An empty range marking the insertion point `at`
    #[must_use]
    pub const fn empty(at: Location) -> Self {
        Self {
            start: at,
            stop: at,
        }
    }

    #[must_use]
    pub const fn start(&self) -> Location {
        self.start
    }

    #[must_use]
    pub const fn stop(&self) -> Location {
        self.stop
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.stop
    }

    #[must_use]
    pub const fn is_single_line(&self) -> bool {
        self.start.line == self.stop.line
    }

    /// Number of locations covered by a single-line range.
    ///
    /// Ranges spanning several lines would need the length of every line in
    /// between, which a range does not know, so they are rejected.
    pub fn length(&self) -> Result<usize> {
        if !self.is_single_line() {
            return Err(SourceLocationError::MultiLineLength(self.to_string()));
        }
        Ok(self.stop.column - self.start.column)
    }

    /// Check whether `location` lies in `[start, stop)`
    #[must_use]
    pub fn contains(&self, location: Location) -> bool {
        self.start <= location && location < self.stop
    }

    /// Check whether two half-open ranges share at least one location.
    /// Adjacent ranges such as `1:0::1:5` and `1:5::1:9` do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.stop && other.start < self.stop
    }

    /// Line numbers touched by this range.
    ///
    /// A stop at column 0 of a later line excludes that line, since no
    /// character of it is covered. An empty range touches its own line.
    #[must_use]
    pub fn lines(&self) -> RangeInclusive<usize> {
        let last = if self.stop.column == 0 && self.stop.line > self.start.line {
            self.stop.line - 1
        } else {
            self.stop.line
        };
        self.start.line..=last
    }
}

impl fmt::Display for LocationRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.start, self.stop)
    }
}

impl FromStr for LocationRange {
    type Err = SourceLocationError;

    fn from_str(s: &str) -> Result<Self> {
        let (start, stop) = s.split_once("::").ok_or_else(|| {
            SourceLocationError::parse("location range", format!("missing '::' in {s:?}"))
        })?;
        Self::new(start.parse()?, stop.parse()?)
    }
}

impl From<LocationRange> for String {
    fn from(range: LocationRange) -> Self {
        range.to_string()
    }
}

impl TryFrom<String> for LocationRange {
    type Error = SourceLocationError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// A character location within a particular file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FileLocation {
    filename: String,
    location: Location,
}

impl FileLocation {
    pub fn new(filename: impl Into<String>, location: Location) -> Result<Self> {
        Ok(Self {
            filename: non_empty(filename.into())?,
            location,
        })
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub const fn location(&self) -> Location {
        self.location
    }

    #[must_use]
    pub const fn line(&self) -> usize {
        self.location.line
    }

    #[must_use]
    pub const fn column(&self) -> usize {
        self.location.column
    }

    pub(crate) fn with_location(&self, location: Location) -> Self {
        Self {
            filename: self.filename.clone(),
            location,
        }
    }
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.filename, self.location)
    }
}

impl FromStr for FileLocation {
    type Err = SourceLocationError;

    fn from_str(s: &str) -> Result<Self> {
        let (filename, location) = s.rsplit_once('@').ok_or_else(|| {
            SourceLocationError::parse("file location", format!("missing '@' in {s:?}"))
        })?;
        Self::new(filename, location.parse()?)
    }
}

impl From<FileLocation> for String {
    fn from(location: FileLocation) -> Self {
        location.to_string()
    }
}

impl TryFrom<String> for FileLocation {
    type Error = SourceLocationError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// A half-open range of locations within a particular file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FileLocationRange {
    filename: String,
    range: LocationRange,
}

impl FileLocationRange {
    pub fn new(filename: impl Into<String>, range: LocationRange) -> Result<Self> {
        Ok(Self {
            filename: non_empty(filename.into())?,
            range,
        })
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub const fn range(&self) -> LocationRange {
        self.range
    }

    #[must_use]
    pub const fn start(&self) -> Location {
        self.range.start
    }

    #[must_use]
    pub const fn stop(&self) -> Location {
        self.range.stop
    }

    /// Check whether `location` is in the same file and inside this range
    #[must_use]
    pub fn contains(&self, location: &FileLocation) -> bool {
        self.filename == location.filename && self.range.contains(location.location)
    }

    /// Check whether both ranges are in the same file and overlap
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.filename == other.filename && self.range.overlaps(&other.range)
    }

    /// The file lines touched by this range, in ascending order.
    pub fn lines(&self) -> impl Iterator<Item = FileLine> + '_ {
        self.range
            .lines()
            .filter_map(move |line| FileLine::new(self.filename.clone(), line).ok())
    }

    pub(crate) fn with_range(&self, range: LocationRange) -> Self {
        Self {
            filename: self.filename.clone(),
            range,
        }
    }
}

impl fmt::Display for FileLocationRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.filename, self.range)
    }
}

impl FromStr for FileLocationRange {
    type Err = SourceLocationError;

    fn from_str(s: &str) -> Result<Self> {
        let (filename, range) = s.rsplit_once('@').ok_or_else(|| {
            SourceLocationError::parse("file location range", format!("missing '@' in {s:?}"))
        })?;
        Self::new(filename, range.parse()?)
    }
}

impl From<FileLocationRange> for String {
    fn from(range: FileLocationRange) -> Self {
        range.to_string()
    }
}

impl TryFrom<String> for FileLocationRange {
    type Error = SourceLocationError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

pub(crate) fn non_empty(filename: String) -> Result<String> {
    if filename.is_empty() {
        return Err(SourceLocationError::EmptyFilename);
    }
    Ok(filename)
}

pub(crate) fn parse_number(kind: &'static str, s: &str) -> Result<usize> {
    s.trim()
        .parse()
        .map_err(|e| SourceLocationError::parse(kind, format!("invalid number {s:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(line: usize, column: usize) -> Location {
        Location::new(line, column).unwrap()
    }

    fn range(start: (usize, usize), stop: (usize, usize)) -> LocationRange {
        LocationRange::new(loc(start.0, start.1), loc(stop.0, stop.1)).unwrap()
    }

    #[test]
    fn test_location_rejects_line_zero() {
        assert_eq!(
            Location::new(0, 3),
            Err(SourceLocationError::InvalidLine(0))
        );
        assert!(Location::new(1, 0).is_ok());
    }

    #[test]
    fn test_location_ordering() {
        assert!(loc(1, 9) < loc(2, 0));
        assert!(loc(2, 1) < loc(2, 4));
        assert_eq!(loc(3, 3).cmp(&loc(3, 3)), std::cmp::Ordering::Equal);
        assert!(loc(4, 0) > loc(3, 80));
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        let result = LocationRange::new(loc(2, 0), loc(1, 5));
        assert_eq!(
            result,
            Err(SourceLocationError::InvalidRange {
                start: loc(2, 0),
                stop: loc(1, 5),
            })
        );

        let empty = LocationRange::new(loc(2, 0), loc(2, 0)).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty, LocationRange::empty(loc(2, 0)));
    }

    #[test]
    fn test_range_contains_is_half_open() {
        let r = range((1, 0), (1, 5));
        assert!(r.contains(loc(1, 0)));
        assert!(r.contains(loc(1, 3)));
        assert!(!r.contains(loc(1, 5)));
        assert!(!r.contains(loc(2, 0)));

        assert!(!LocationRange::empty(loc(1, 0)).contains(loc(1, 0)));
    }

    #[test]
    fn test_range_contains_across_lines() {
        let r = range((2, 4), (4, 1));
        assert!(r.contains(loc(3, 100)));
        assert!(r.contains(loc(4, 0)));
        assert!(!r.contains(loc(2, 3)));
        assert!(!r.contains(loc(4, 1)));
    }

    #[test]
    fn test_range_overlaps() {
        assert!(range((1, 0), (1, 5)).overlaps(&range((1, 3), (1, 8))));
        assert!(range((1, 3), (1, 8)).overlaps(&range((1, 0), (1, 5))));
        assert!(!range((1, 0), (1, 5)).overlaps(&range((1, 5), (1, 9))));
        assert!(range((1, 0), (3, 0)).overlaps(&range((2, 0), (2, 1))));
    }

    #[test]
    fn test_range_length() {
        assert_eq!(range((3, 2), (3, 9)).length(), Ok(7));
        assert_eq!(LocationRange::empty(loc(3, 2)).length(), Ok(0));
        assert_eq!(
            range((3, 2), (4, 0)).length(),
            Err(SourceLocationError::MultiLineLength("3:2::4:0".to_string()))
        );
    }

    #[test]
    fn test_range_lines() {
        assert_eq!(range((3, 2), (3, 9)).lines(), 3..=3);
        assert_eq!(range((3, 2), (5, 1)).lines(), 3..=5);
        assert_eq!(range((3, 2), (5, 0)).lines(), 3..=4);
        assert_eq!(LocationRange::empty(loc(7, 0)).lines(), 7..=7);
    }

    #[test]
    fn test_file_wrappers_reject_empty_filename() {
        assert_eq!(
            FileLocation::new("", loc(1, 0)),
            Err(SourceLocationError::EmptyFilename)
        );
        assert_eq!(
            FileLocationRange::new("", range((1, 0), (1, 1))),
            Err(SourceLocationError::EmptyFilename)
        );
    }

    #[test]
    fn test_file_location_ordering() {
        let a = FileLocation::new("a.py", loc(9, 0)).unwrap();
        let b = FileLocation::new("b.py", loc(1, 0)).unwrap();
        let b2 = FileLocation::new("b.py", loc(1, 1)).unwrap();
        assert!(a < b);
        assert!(b < b2);
        assert_eq!(b.line(), 1);
        assert_eq!(b2.column(), 1);
    }

    #[test]
    fn test_file_location_range_contains_requires_same_file() {
        let r = FileLocationRange::new("a.py", range((1, 0), (2, 0))).unwrap();
        assert!(r.contains(&FileLocation::new("a.py", loc(1, 7)).unwrap()));
        assert!(!r.contains(&FileLocation::new("b.py", loc(1, 7)).unwrap()));

        let other = FileLocationRange::new("b.py", range((1, 0), (2, 0))).unwrap();
        assert!(!r.overlaps(&other));
        assert!(r.overlaps(&r));
    }

    #[test]
    fn test_file_location_range_lines() {
        let r = FileLocationRange::new("a.py", range((4, 2), (6, 0))).unwrap();
        let lines: Vec<String> = r.lines().map(|l| l.to_string()).collect();
        assert_eq!(lines, vec!["a.py:4", "a.py:5"]);
    }

    #[test]
    fn test_textual_encoding() {
        assert_eq!(loc(10, 4).to_string(), "10:4");
        assert_eq!("10:4".parse::<Location>(), Ok(loc(10, 4)));
        assert!("10".parse::<Location>().is_err());
        assert!("x:4".parse::<Location>().is_err());
        assert_eq!("0:4".parse::<Location>(), Ok(Location::offset(0, 4)));

        let r = range((1, 0), (2, 3));
        assert_eq!(r.to_string(), "1:0::2:3");
        assert_eq!("1:0::2:3".parse::<LocationRange>(), Ok(r));
        assert!("2:0::1:0".parse::<LocationRange>().is_err());

        let fl = FileLocation::new("user@host.py", loc(3, 1)).unwrap();
        assert_eq!(fl.to_string(), "user@host.py@3:1");
        assert_eq!("user@host.py@3:1".parse::<FileLocation>(), Ok(fl));

        let flr = FileLocationRange::new("src/a.rs", r).unwrap();
        assert_eq!(flr.to_string(), "src/a.rs@1:0::2:3");
        assert_eq!("src/a.rs@1:0::2:3".parse::<FileLocationRange>(), Ok(flr));
        assert_eq!(
            "@1:0::2:3".parse::<FileLocationRange>(),
            Err(SourceLocationError::EmptyFilename)
        );
    }

    #[test]
    fn test_serde_uses_textual_encoding() {
        let r = range((1, 0), (1, 5));
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "\"1:0::1:5\"");
        let decoded: LocationRange = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, r);

        let inverted = serde_json::from_str::<LocationRange>("\"1:5::1:0\"");
        assert!(inverted.is_err());
    }
}
