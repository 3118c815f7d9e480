use crate::location::non_empty;
use crate::{
    FileLocation, FileLocationRange, Location, LocationRange, RelativeLocation, Result,
    SourceLocationError,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A set of location ranges, grouped by file.
///
/// Every range is stored under its own filename. Files keep their
/// first-insertion order and ranges within a file are sorted.
/// Serializes as `{filename: ["start::stop", ...]}`.
///
/// Not safe for concurrent writers without external synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    into = "IndexMap<String, Vec<LocationRange>>",
    try_from = "IndexMap<String, Vec<LocationRange>>"
)]
pub struct FileLocationRangeSet {
    contents: IndexMap<String, BTreeSet<LocationRange>>,
}

impl FileLocationRangeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a `{filename: ranges}` mapping
    pub fn from_dict<F, R>(dict: impl IntoIterator<Item = (F, R)>) -> Result<Self>
    where
        F: Into<String>,
        R: IntoIterator<Item = LocationRange>,
    {
        let mut set = Self::new();
        for (filename, ranges) in dict {
            let filename = non_empty(filename.into())?;
            for range in ranges {
                set.insert(filename.clone(), range);
            }
        }
        Ok(set)
    }

    /// Insert a range, returning `false` if it was already present
    pub fn add(&mut self, range: FileLocationRange) -> bool {
        self.insert(range.filename().to_string(), range.range())
    }

    fn insert(&mut self, filename: String, range: LocationRange) -> bool {
        self.contents.entry(filename).or_default().insert(range)
    }

    #[must_use]
    pub fn contains(&self, range: &FileLocationRange) -> bool {
        self.contents
            .get(range.filename())
            .is_some_and(|ranges| ranges.contains(&range.range()))
    }

    /// Check whether any range stored for the location's file contains it
    #[must_use]
    pub fn contains_location(&self, location: &FileLocation) -> bool {
        self.contents
            .get(location.filename())
            .is_some_and(|ranges| ranges.iter().any(|r| r.contains(location.location())))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contents.values().map(BTreeSet::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn files(&self) -> impl Iterator<Item = &str> + '_ {
        self.contents.keys().map(String::as_str)
    }

    /// Iterate over every range, file by file, ranges ascending
    pub fn iter(&self) -> impl Iterator<Item = FileLocationRange> + '_ {
        self.contents.iter().flat_map(|(filename, ranges)| {
            ranges
                .iter()
                .filter_map(move |&r| qualify(filename, r))
        })
    }

    /// Iterate over the ranges stored for `filename`
    pub fn ranges_in_file<'a>(
        &'a self,
        filename: &'a str,
    ) -> impl Iterator<Item = FileLocationRange> + 'a {
        self.contents
            .get(filename)
            .into_iter()
            .flatten()
            .filter_map(move |&r| qualify(filename, r))
    }

    /// Ranges in either set, merged file by file
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut union = self.clone();
        for (filename, ranges) in &other.contents {
            union
                .contents
                .entry(filename.clone())
                .or_default()
                .extend(ranges.iter().copied());
        }
        union
    }

    /// Re-express every range relative to `origin`, keeping filenames
    pub fn with_relative_locations(&self, origin: Location) -> Result<Self> {
        let mut contents = IndexMap::with_capacity(self.contents.len());
        for (filename, ranges) in &self.contents {
            let relative = ranges
                .iter()
                .map(|r| r.with_relative_location(origin))
                .collect::<Result<BTreeSet<_>>>()?;
            contents.insert(filename.clone(), relative);
        }
        Ok(Self { contents })
    }

    /// `{filename: [range, ...]}` with every file's ranges in ascending order
    #[must_use]
    pub fn to_dict(&self) -> IndexMap<String, Vec<LocationRange>> {
        self.contents
            .iter()
            .map(|(filename, ranges)| (filename.clone(), ranges.iter().copied().collect()))
            .collect()
    }
}

fn qualify(filename: &str, range: LocationRange) -> Option<FileLocationRange> {
    // keys are validated on the way in, so this never drops anything
    FileLocationRange::new(filename, range).ok()
}

impl FromIterator<FileLocationRange> for FileLocationRangeSet {
    fn from_iter<I: IntoIterator<Item = FileLocationRange>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<FileLocationRange> for FileLocationRangeSet {
    fn extend<I: IntoIterator<Item = FileLocationRange>>(&mut self, iter: I) {
        for range in iter {
            self.add(range);
        }
    }
}

impl<'a> IntoIterator for &'a FileLocationRangeSet {
    type Item = FileLocationRange;
    type IntoIter = Box<dyn Iterator<Item = FileLocationRange> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl From<FileLocationRangeSet> for IndexMap<String, Vec<LocationRange>> {
    fn from(set: FileLocationRangeSet) -> Self {
        set.to_dict()
    }
}

impl TryFrom<IndexMap<String, Vec<LocationRange>>> for FileLocationRangeSet {
    type Error = SourceLocationError;

    fn try_from(dict: IndexMap<String, Vec<LocationRange>>) -> Result<Self> {
        Self::from_dict(dict)
    }
}
