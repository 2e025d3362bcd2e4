//! Source positions.
//!
//! Every position handed out by the engine is 1-based and end-inclusive:
//! `start_line`/`start_column` address the first byte of an element and
//! `end_line`/`end_column` address its last byte. Columns count bytes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
pub struct Span {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Number of lines covered, counting both ends.
    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// Byte offsets of line starts, for converting byte ranges to [`Span`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Number of lines, where a trailing newline does not open a new line.
    pub fn line_count(&self) -> usize {
        if self.len == 0 {
            return 0;
        }
        let last_start = *self.line_starts.last().unwrap_or(&0);
        if last_start == self.len {
            self.line_starts.len() - 1
        } else {
            self.line_starts.len()
        }
    }

    /// 1-based (line, column) of the byte at `offset`. Offsets past the end
    /// clamp to the end of the text.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }

    /// Span of the byte range `start..end` (end exclusive, as tree-sitter
    /// reports it), converted to the inclusive convention.
    pub fn span(&self, start: usize, end: usize) -> Span {
        let (start_line, start_column) = self.position(start);
        let last = if end > start { end - 1 } else { start };
        let (end_line, end_column) = self.position(last);
        Span::new(start_line, start_column, end_line, end_column)
    }

    /// Byte range of the 1-based line `line`, without its line terminator.
    pub fn line_range(&self, text: &str, line: usize) -> Option<std::ops::Range<usize>> {
        if line == 0 || line > self.line_count() {
            return None;
        }
        let start = self.line_starts[line - 1];
        let mut end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.len);
        if end > start && text.as_bytes().get(end - 1) == Some(&b'\r') {
            end -= 1;
        }
        Some(start..end)
    }

    /// Byte range covering lines `first..=last`, including the terminator of
    /// `last` when there is one.
    pub fn lines_range(&self, first: usize, last: usize) -> Option<std::ops::Range<usize>> {
        if first == 0 || first > last || first > self.line_count() {
            return None;
        }
        let last = last.min(self.line_count());
        let start = self.line_starts[first - 1];
        let end = self.line_starts.get(last).copied().unwrap_or(self.len);
        Some(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_is_one_based() {
        let idx = LineIndex::new("ab\ncd\n");
        assert_eq!(idx.position(0), (1, 1));
        assert_eq!(idx.position(1), (1, 2));
        assert_eq!(idx.position(3), (2, 1));
        assert_eq!(idx.line_count(), 2);
    }

    #[test]
    fn test_span_is_end_inclusive() {
        let text = "class A {\n}\n";
        let idx = LineIndex::new(text);
        // "class A {\n}" spans bytes 0..11
        let span = idx.span(0, 11);
        assert_eq!(span, Span::new(1, 1, 2, 1));
    }

    #[test]
    fn test_empty_range_collapses() {
        let idx = LineIndex::new("abc");
        assert_eq!(idx.span(2, 2), Span::new(1, 3, 1, 3));
    }

    #[test]
    fn test_line_count_without_trailing_newline() {
        assert_eq!(LineIndex::new("a\nb").line_count(), 2);
        assert_eq!(LineIndex::new("").line_count(), 0);
    }

    #[test]
    fn test_lines_range_clamps_to_eof() {
        let text = "one\ntwo\nthree";
        let idx = LineIndex::new(text);
        let r = idx.lines_range(2, 10).unwrap();
        assert_eq!(&text[r], "two\nthree");
        assert!(idx.lines_range(4, 5).is_none());
        assert!(idx.lines_range(0, 1).is_none());
    }
}
