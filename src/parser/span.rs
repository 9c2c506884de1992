// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Inclusive token ranges

use serde::{Deserialize, Serialize};

/// Inclusive range of token indices within one expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenSpan {
    /// Index of the first token
    pub start: usize,
    /// Index of the last token
    pub end: usize,
}

impl TokenSpan {
    /// Create a span covering `start..=end`
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {start} past end {end}");
        Self { start, end }
    }

    /// Span covering a single token
    pub fn single(index: usize) -> Self {
        Self::new(index, index)
    }

    /// Span covering `len` tokens starting at `start`, if any
    pub fn from_len(start: usize, len: usize) -> Option<Self> {
        (len > 0).then(|| Self::new(start, start + len - 1))
    }

    /// Number of tokens covered
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Spans are never empty
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `index` lies inside the span
    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }

    /// Smallest span covering both
    pub fn merge(self, other: TokenSpan) -> TokenSpan {
        TokenSpan::new(self.start.min(other.start), self.end.max(other.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_basics() {
        let span = TokenSpan::new(2, 4);
        assert_eq!(span.len(), 3);
        assert!(span.contains(2));
        assert!(span.contains(4));
        assert!(!span.contains(5));
        assert_eq!(span.merge(TokenSpan::single(7)), TokenSpan::new(2, 7));
    }

    #[test]
    fn test_from_len() {
        assert_eq!(TokenSpan::from_len(3, 0), None);
        assert_eq!(TokenSpan::from_len(3, 2), Some(TokenSpan::new(3, 4)));
    }
}
