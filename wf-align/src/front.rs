//! A `Frame` holds the offsets of every component for a single score.
//!
//! Offsets are indexed by diagonal `k = h - v`, where `h` is the text position
//! and `v` the pattern position. The stored value is `h`, the furthest text
//! position reached on that diagonal.

use std::{
    fmt::Debug,
    ops::{Index, IndexMut, RangeInclusive},
};
use wf_types::Component;

/// The type for storing offsets.
pub type Fr = i32;

/// Marks a diagonal that is not reached. Far enough from `Fr::MIN` that adding
/// a small advance never overflows.
pub const NULL_OFFSET: Fr = Fr::MIN / 2;

/// The layers of one score, over an inclusive range of diagonals.
/// Buffers come from and return to the `WavefrontAllocator`.
#[derive(Clone)]
pub struct Frame {
    /// One buffer per component, indexed by `Component::index`.
    pub(crate) layers: Vec<Vec<Fr>>,
    /// The inclusive range of diagonals stored.
    pub(crate) range: RangeInclusive<Fr>,
}

impl Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("range", &self.range)
            .field("layers", &self.layers)
            .finish()
    }
}

impl Frame {
    /// Get a reference to the frame's range.
    #[inline]
    pub fn range(&self) -> &RangeInclusive<Fr> {
        &self.range
    }

    #[inline]
    pub fn lo(&self) -> Fr {
        *self.range.start()
    }

    #[inline]
    pub fn hi(&self) -> Fr {
        *self.range.end()
    }

    #[inline]
    pub fn len(&self) -> usize {
        (self.hi() - self.lo() + 1).max(0) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn layer(&self, c: Component) -> Layer<'_> {
        Layer {
            l: &self.layers[c.index()],
            lo: self.lo(),
        }
    }

    #[inline]
    pub fn layer_mut(&mut self, c: Component) -> MutLayer<'_> {
        let lo = self.lo();
        MutLayer {
            l: &mut self.layers[c.index()],
            lo,
        }
    }

    /// The offset of `c` on diagonal `k`, or `NULL_OFFSET` outside the range.
    #[inline]
    pub fn get(&self, c: Component, k: Fr) -> Fr {
        match self.layers.get(c.index()) {
            Some(l) => Layer { l, lo: self.lo() }.get(k),
            None => NULL_OFFSET,
        }
    }

    /// True when no component reaches diagonal `k`.
    pub fn is_null_at(&self, k: Fr) -> bool {
        let i = (k - self.lo()) as usize;
        self.layers.iter().all(|l| l[i] == NULL_OFFSET)
    }

    /// Shrinks the range to `range`, which must be a sub-range of the current one.
    /// Keeps the buffers, so only the visible window moves.
    pub(crate) fn shrink(&mut self, range: RangeInclusive<Fr>) {
        debug_assert!(range.start() >= self.range.start() && range.end() <= self.range.end());
        if range.is_empty() {
            for l in &mut self.layers {
                l.clear();
            }
            self.range = range;
            return;
        }
        let front = (range.start() - self.lo()) as usize;
        let len = (range.end() - range.start() + 1) as usize;
        for l in &mut self.layers {
            l.drain(..front);
            l.truncate(len);
        }
        self.range = range;
    }
}

// ========== LAYER STRUCTS ==========

/// A reference to a single layer of a single frame.
/// Contains the lowest diagonal needed to index it.
pub struct Layer<'a> {
    l: &'a [Fr],
    lo: Fr,
}

/// A mutable reference to a single layer of a single frame.
pub struct MutLayer<'a> {
    l: &'a mut [Fr],
    lo: Fr,
}

impl<'a> Layer<'a> {
    /// The offset on diagonal `k`, or `NULL_OFFSET` outside the range.
    #[inline]
    pub fn get(&self, k: Fr) -> Fr {
        let i = k - self.lo;
        if i < 0 {
            return NULL_OFFSET;
        }
        self.l.get(i as usize).copied().unwrap_or(NULL_OFFSET)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Fr, Fr)> + 'a {
        let lo = self.lo;
        self.l.iter().enumerate().map(move |(i, &h)| (lo + i as Fr, h))
    }
}

impl<'a> Index<Fr> for Layer<'a> {
    type Output = Fr;

    #[inline]
    fn index(&self, k: Fr) -> &Self::Output {
        &self.l[(k - self.lo) as usize]
    }
}
impl<'a> Index<Fr> for MutLayer<'a> {
    type Output = Fr;

    #[inline]
    fn index(&self, k: Fr) -> &Self::Output {
        &self.l[(k - self.lo) as usize]
    }
}
impl<'a> IndexMut<Fr> for MutLayer<'a> {
    #[inline]
    fn index_mut(&mut self, k: Fr) -> &mut Self::Output {
        &mut self.l[(k - self.lo) as usize]
    }
}
