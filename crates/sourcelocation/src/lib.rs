//! Value types for locations, ranges, lines and diffs within source files.
//!
//! Lines are one-indexed and columns zero-indexed throughout. Every value
//! type is immutable once built, and constructors reject values that would
//! break an invariant with a [`SourceLocationError`].

mod diff;
mod error;
mod fileline;
mod location;
mod range_set;
mod relative;
mod unidiff;

pub use diff::{Diff, FileDiff, FileHunk, Hunk, HunkLine, DEV_NULL};
pub use error::{HunkSide, Result, SourceLocationError};
pub use fileline::{FileLine, FileLineMap, FileLineSet};
pub use location::{FileLocation, FileLocationRange, Location, LocationRange};
pub use range_set::FileLocationRangeSet;
pub use relative::RelativeLocation;
