//! Byte-offset spans for diagnostics.
//!
//! Offsets are measured from the start of the owning input source, not the
//! overall session, since each archive is its own stream.

/// A half-open byte range within one input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: u64,
    /// End offset (exclusive).
    pub end: u64,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// A zero-width span at the given offset.
    #[inline]
    pub fn at(offset: u64) -> Self {
        Self { start: offset, end: offset }
    }

    /// Length of the span in bytes.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Check if the span is zero-width.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A position within a named input source, for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Display name of the source (file name, archive name, "<stdin>", ...).
    pub source: String,
    /// Byte offset within that source.
    pub offset: u64,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source, self.offset)
    }
}
