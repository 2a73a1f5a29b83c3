//! Byte ranges into a declaration document, used to anchor diagnostics.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A one-byte span at `offset`, clamped to the end of `text`.
    pub fn point(text: &str, offset: usize) -> Self {
        let start = offset.min(text.len());
        let end = if start < text.len() { start + 1 } else { start };
        Self { start, end }
    }

    /// Resolves a 1-based `line`/`column` pair into a point span.
    pub fn from_line_column(text: &str, line: usize, column: usize) -> Self {
        let mut offset = 0usize;
        for (index, chunk) in text.split_inclusive('\n').enumerate() {
            if index + 1 == line {
                let column_offset = column.saturating_sub(1).min(chunk.len());
                return Self::point(text, offset + column_offset);
            }
            offset += chunk.len();
        }
        Self::point(text, text.len())
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<Span> for std::ops::Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
