use crate::{
    FileLocation, FileLocationRange, Location, LocationRange, Result, SourceLocationError,
};

/// Re-express a value's locations as offsets from an origin.
///
/// Lines are shifted by `origin.line()`; columns are shifted by
/// `origin.column()` only on the origin's own line. The result is a
/// relative offset, so its line may be 0. Filenames are never touched.
pub trait RelativeLocation: Sized {
    fn with_relative_location(&self, origin: Location) -> Result<Self>;
}

impl RelativeLocation for Location {
    fn with_relative_location(&self, origin: Location) -> Result<Self> {
        if *self < origin {
            return Err(SourceLocationError::PrecedesOrigin {
                location: *self,
                origin,
            });
        }
        let line = self.line() - origin.line();
        let column = if line == 0 {
            self.column() - origin.column()
        } else {
            self.column()
        };
        Ok(Self::offset(line, column))
    }
}

impl RelativeLocation for LocationRange {
    fn with_relative_location(&self, origin: Location) -> Result<Self> {
        let start = self.start().with_relative_location(origin)?;
        let stop = self.stop().with_relative_location(origin)?;
        // shifting both ends by the same origin keeps start <= stop
        Self::new(start, stop)
    }
}

impl RelativeLocation for FileLocation {
    fn with_relative_location(&self, origin: Location) -> Result<Self> {
        Ok(self.with_location(self.location().with_relative_location(origin)?))
    }
}

impl RelativeLocation for FileLocationRange {
    fn with_relative_location(&self, origin: Location) -> Result<Self> {
        Ok(self.with_range(self.range().with_relative_location(origin)?))
    }
}
