//! Span policies: which sequence ends must be consumed.
//!
//! Policies only change the seeds of the first frame and the termination
//! predicate. Everything is expressed as ends-free bounds.

use crate::front::Fr;
use serde::{Deserialize, Serialize};
use std::cmp::max;
use std::ops::RangeInclusive;
use wf_types::{Error, Result, MAX_SEQ_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignmentSpan {
    /// Both sequences are aligned completely.
    #[default]
    EndToEnd,
    /// Both sequences start at the beginning; the alignment may stop as soon as
    /// one of them is consumed.
    Extension,
    /// Leading and trailing gaps of the given lengths are free.
    EndsFree {
        pattern_begin_free: usize,
        pattern_end_free: usize,
        text_begin_free: usize,
        text_end_free: usize,
    },
}

/// Free amounts for one alignment call, checked against the sequence lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanBounds {
    pub pattern_begin_free: Fr,
    pub pattern_end_free: Fr,
    pub text_begin_free: Fr,
    pub text_end_free: Fr,
}

impl AlignmentSpan {
    pub fn ends_free(
        pattern_begin_free: usize,
        pattern_end_free: usize,
        text_begin_free: usize,
        text_end_free: usize,
    ) -> Self {
        AlignmentSpan::EndsFree {
            pattern_begin_free,
            pattern_end_free,
            text_begin_free,
            text_end_free,
        }
    }

    /// The span for the reversed sequences: begin and end freedom swap.
    pub fn reversed(&self) -> Self {
        match *self {
            AlignmentSpan::EndsFree {
                pattern_begin_free,
                pattern_end_free,
                text_begin_free,
                text_end_free,
            } => AlignmentSpan::EndsFree {
                pattern_begin_free: pattern_end_free,
                pattern_end_free: pattern_begin_free,
                text_begin_free: text_end_free,
                text_end_free: text_begin_free,
            },
            // Free leading gaps after reversal are not expressible as an extension.
            AlignmentSpan::Extension => AlignmentSpan::EndsFree {
                pattern_begin_free: usize::MAX,
                pattern_end_free: 0,
                text_begin_free: usize::MAX,
                text_end_free: 0,
            },
            AlignmentSpan::EndToEnd => AlignmentSpan::EndToEnd,
        }
    }

    /// Validates the input lengths and resolves the policy into bounds.
    /// `usize::MAX` stands for "the whole sequence".
    pub fn resolve(&self, plen: usize, tlen: usize) -> Result<SpanBounds> {
        for (name, len) in [("pattern", plen), ("text", tlen)] {
            if len > MAX_SEQ_LEN {
                return Err(Error::sequence(format!(
                    "the {name} has length {len}, more than the supported {MAX_SEQ_LEN}"
                )));
            }
        }
        let (pbf, pef, tbf, tef) = match *self {
            AlignmentSpan::EndToEnd => (0, 0, 0, 0),
            AlignmentSpan::Extension => (0, plen, 0, tlen),
            AlignmentSpan::EndsFree {
                pattern_begin_free,
                pattern_end_free,
                text_begin_free,
                text_end_free,
            } => {
                let check = |name: &str, free: usize, len: usize| {
                    if free == usize::MAX {
                        Ok(len)
                    } else if free > len {
                        Err(Error::sequence(format!(
                            "{name} of {free} exceeds the sequence length {len}"
                        )))
                    } else {
                        Ok(free)
                    }
                };
                (
                    check("pattern-begin-free", pattern_begin_free, plen)?,
                    check("pattern-end-free", pattern_end_free, plen)?,
                    check("text-begin-free", text_begin_free, tlen)?,
                    check("text-end-free", text_end_free, tlen)?,
                )
            }
        };
        Ok(SpanBounds {
            pattern_begin_free: pbf as Fr,
            pattern_end_free: pef as Fr,
            text_begin_free: tbf as Fr,
            text_end_free: tef as Fr,
        })
    }
}

impl SpanBounds {
    /// Diagonals seeded at score 0.
    #[inline]
    pub fn seed_range(&self) -> RangeInclusive<Fr> {
        -self.pattern_begin_free..=self.text_begin_free
    }

    /// The seed offset of diagonal `k`: the cell on the free leading edge.
    #[inline]
    pub fn seed_offset(k: Fr) -> Fr {
        max(k, 0)
    }

    /// True when reaching text position `h` on diagonal `k` completes the alignment.
    #[inline]
    pub fn is_terminal(&self, k: Fr, h: Fr, plen: Fr, tlen: Fr) -> bool {
        let v = h - k;
        (h == tlen && plen - v <= self.pattern_end_free)
            || (v == plen && tlen - h <= self.text_end_free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_needs_the_corner() {
        let b = AlignmentSpan::EndToEnd.resolve(4, 3).unwrap();
        assert_eq!(b.seed_range(), 0..=0);
        assert!(b.is_terminal(-1, 3, 4, 3));
        assert!(!b.is_terminal(0, 3, 4, 3));
        assert!(!b.is_terminal(-1, 2, 4, 3));
    }

    #[test]
    fn extension_stops_at_either_end() {
        let b = AlignmentSpan::Extension.resolve(4, 10).unwrap();
        assert_eq!(b.seed_range(), 0..=0);
        // Pattern consumed at text position 5.
        assert!(b.is_terminal(1, 5, 4, 10));
        // Text consumed with 2 pattern symbols left.
        let b = AlignmentSpan::Extension.resolve(10, 4).unwrap();
        assert!(b.is_terminal(-4, 4, 10, 4));
    }

    #[test]
    fn ends_free_seeds_leading_edges() {
        let b = AlignmentSpan::ends_free(2, 0, 3, 1).resolve(5, 6).unwrap();
        assert_eq!(b.seed_range(), -2..=3);
        assert_eq!(SpanBounds::seed_offset(-2), 0);
        assert_eq!(SpanBounds::seed_offset(3), 3);
        // One trailing text symbol may stay unaligned.
        assert!(b.is_terminal(0, 5, 5, 6));
        assert!(!b.is_terminal(-1, 4, 5, 6));
    }

    #[test]
    fn rejects_excess_freedom() {
        let r = AlignmentSpan::ends_free(6, 0, 0, 0).resolve(5, 6);
        assert!(matches!(r, Err(Error::Sequence { .. })));
        let r = AlignmentSpan::ends_free(0, 0, 0, usize::MAX).resolve(5, 6);
        assert_eq!(r.unwrap().text_end_free, 6);
    }

    #[test]
    fn reversal_swaps_freedom() {
        let s = AlignmentSpan::ends_free(1, 2, 3, 4);
        assert_eq!(s.reversed(), AlignmentSpan::ends_free(2, 1, 4, 3));
        assert_eq!(s.reversed().reversed(), s);
    }
}
