//! Source positions.
//!
//! A `Position` is a half-open range of offsets `[left, right)` within a named
//! file. Positions are attached to call descriptors and their inputs so that
//! diagnostics can point back at the code that produced them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A half-open offset range within a source file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// File name or other stable identifier for the source.
    pub file: Arc<str>,
    /// Inclusive start offset.
    pub left: u32,
    /// Exclusive end offset.
    pub right: u32,
}

impl Position {
    #[must_use]
    pub fn new(file: impl Into<Arc<str>>, left: u32, right: u32) -> Self {
        Self {
            file: file.into(),
            left,
            right: right.max(left),
        }
    }

    /// A position used when no source location is known.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new("", 0, 0)
    }

    #[must_use]
    pub const fn len(&self) -> u32 {
        self.right - self.left
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.right == self.left
    }

    /// The smallest position covering both `self` and `other`.
    ///
    /// Positions in different files do not combine; `self` is returned.
    #[must_use]
    pub fn spanning(&self, other: &Position) -> Position {
        if self.file != other.file {
            return self.clone();
        }
        Position {
            file: Arc::clone(&self.file),
            left: self.left.min(other.left),
            right: self.right.max(other.right),
        }
    }

    /// Joins every position into one span, or `None` when there are none.
    pub fn spanning_all<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Option<Position> {
        let mut iter = positions.into_iter();
        let first = iter.next()?.clone();
        Some(iter.fold(first, |acc, p| acc.spanning(p)))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}+{}", self.file, self.left, self.len())
    }
}

#[cfg(test)]
#[path = "../tests/position_tests.rs"]
mod tests;
