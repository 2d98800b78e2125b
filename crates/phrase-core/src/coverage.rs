//! Source-position coverage bitsets.

use std::fmt;

const BLOCK_BITS: usize = 64;

/// The set of source positions already translated by a hypothesis.
///
/// Stored as one bit per position. Values are never mutated in place during
/// search: extending a hypothesis produces a new `Coverage` via [`Coverage::with_span`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Coverage {
    blocks: Vec<u64>,
    len: usize,
    count: usize,
}

impl Coverage {
    /// Empty coverage for a sentence of `len` positions.
    pub fn empty(len: usize) -> Self {
        Self {
            blocks: vec![0; len.div_ceil(BLOCK_BITS)],
            len,
            count: 0,
        }
    }

    /// Sentence length this coverage is defined over.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of covered positions.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_full(&self) -> bool {
        self.count == self.len
    }

    /// Whether position `pos` is covered. Out-of-range positions are not.
    pub fn is_covered(&self, pos: usize) -> bool {
        pos < self.len && self.blocks[pos / BLOCK_BITS] & (1 << (pos % BLOCK_BITS)) != 0
    }

    /// Whether every position in `[start, end)` is uncovered and in range.
    pub fn is_span_free(&self, start: usize, end: usize) -> bool {
        start < end && end <= self.len && (start..end).all(|pos| !self.is_covered(pos))
    }

    /// A copy of this coverage with `[start, end)` added.
    ///
    /// The span must be free; overlapping an already covered position is a
    /// caller bug.
    pub fn with_span(&self, start: usize, end: usize) -> Self {
        debug_assert!(
            self.is_span_free(start, end),
            "span {start}..{end} overlaps coverage {self:?}"
        );
        let mut next = self.clone();
        for pos in start..end {
            next.blocks[pos / BLOCK_BITS] |= 1 << (pos % BLOCK_BITS);
        }
        next.count += end - start;
        next
    }

    /// Index of the first uncovered position, if any.
    pub fn first_gap(&self) -> Option<usize> {
        (0..self.len).find(|&pos| !self.is_covered(pos))
    }

    /// Covered positions in ascending order.
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&pos| self.is_covered(pos))
    }
}

impl fmt::Debug for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits: String = (0..self.len)
            .map(|pos| if self.is_covered(pos) { '1' } else { '0' })
            .collect();
        write!(f, "Coverage({bits})")
    }
}
