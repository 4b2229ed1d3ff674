//! Numbered file versions (`name.v###.ext`)
//!
//! A versioned file carries a `v` marker followed by a zero-padded integer as
//! its second-to-last dot-separated segment: `shot.v001.exr`,
//! `asset.layout.v012.json`. The stem and the extension must both be
//! non-empty. Ordering and matching use the integer value; the padding width
//! is recorded only so callers can build the next file name.

use std::fmt;

/// Version marker extracted from a file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileVersion {
    number: u64,
    width: usize,
}

impl FileVersion {
    /// Extract the version marker from a file name
    ///
    /// Returns `None` when `file_name` does not follow `name.v###.ext`.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let mut segments = file_name.rsplitn(3, '.');
        let extension = segments.next()?;
        let marker = segments.next()?;
        let stem = segments.next()?;

        if stem.is_empty() || extension.is_empty() {
            return None;
        }

        let digits = marker.strip_prefix('v')?;
        Self::from_digits(digits)
    }

    /// Parse a requested version such as `"1"`, `"001"` or `"v001"`
    #[must_use]
    pub fn parse_request(text: &str) -> Option<Self> {
        let text = text.trim();
        let digits = text
            .strip_prefix('v')
            .or_else(|| text.strip_prefix('V'))
            .unwrap_or(text);
        Self::from_digits(digits)
    }

    /// Build a version from a number and a padding width
    #[must_use]
    pub const fn new(number: u64, width: usize) -> Self {
        Self { number, width }
    }

    /// Integer value of the version
    #[must_use]
    pub const fn number(&self) -> u64 {
        self.number
    }

    /// Number of digits the version was written with
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Same width, number incremented by one
    #[must_use]
    pub const fn next(&self) -> Self {
        Self {
            number: self.number + 1,
            width: self.width,
        }
    }

    fn from_digits(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let number = digits.parse().ok()?;
        Some(Self {
            number,
            width: digits.len(),
        })
    }
}

impl fmt::Display for FileVersion {
    /// Formats as the marker segment, e.g. `v007`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{:0width$}", self.number, width = self.width)
    }
}
