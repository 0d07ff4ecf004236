//! Recycles the buffers backing `Frame`s.
//!
//! Buffers are kept in free lists by size class: class `c` holds buffers with
//! capacity at least `2^c`. A request of length `n` is served from class
//! `ceil(log2(n))`, so a recycled buffer never reallocates.

use crate::front::{Fr, Frame, NULL_OFFSET};
use std::ops::RangeInclusive;

/// Counters, reset by `reset`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Buffers created with a fresh heap allocation.
    pub allocated: usize,
    /// Buffers served from a free list.
    pub reused: usize,
    /// Buffers grown by copying into a larger one.
    pub copied: usize,
    /// Frames currently handed out.
    pub live_frames: usize,
    pub peak_live_frames: usize,
}

#[derive(Debug, Default)]
pub struct WavefrontAllocator {
    free: Vec<Vec<Vec<Fr>>>,
    stats: AllocatorStats,
}

#[inline]
fn class_of_request(len: usize) -> usize {
    len.max(1).next_power_of_two().trailing_zeros() as usize
}

#[inline]
fn class_of_capacity(cap: usize) -> usize {
    (usize::BITS - 1 - cap.max(1).leading_zeros()) as usize
}

impl WavefrontAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &AllocatorStats {
        &self.stats
    }

    /// A buffer of length `len` filled with `NULL_OFFSET`.
    fn buffer(&mut self, len: usize) -> Vec<Fr> {
        let class = class_of_request(len);
        let mut buf = match self.free.get_mut(class).and_then(|l| l.pop()) {
            Some(buf) => {
                self.stats.reused += 1;
                buf
            }
            None => {
                self.stats.allocated += 1;
                Vec::with_capacity(1 << class)
            }
        };
        buf.clear();
        buf.resize(len, NULL_OFFSET);
        buf
    }

    fn recycle(&mut self, buf: Vec<Fr>) {
        if buf.capacity() == 0 {
            return;
        }
        let class = class_of_capacity(buf.capacity());
        if self.free.len() <= class {
            self.free.resize_with(class + 1, Vec::new);
        }
        self.free[class].push(buf);
    }

    /// A frame with `layers` components over `range`, with every offset unreached.
    pub fn allocate(&mut self, layers: usize, range: RangeInclusive<Fr>) -> Frame {
        let len = (range.end() - range.start() + 1).max(0) as usize;
        let frame = Frame {
            layers: (0..layers).map(|_| self.buffer(len)).collect(),
            range,
        };
        self.stats.live_frames += 1;
        self.stats.peak_live_frames = self.stats.peak_live_frames.max(self.stats.live_frames);
        frame
    }

    /// Extends `frame` to cover `range`, which must contain the current range.
    /// Existing offsets are kept; new diagonals are unreached.
    pub fn grow(&mut self, frame: &mut Frame, range: RangeInclusive<Fr>) {
        debug_assert!(range.start() <= frame.range.start() && range.end() >= frame.range.end());
        let before = (frame.lo() - range.start()) as usize;
        let old_len = frame.len();
        let new_len = (range.end() - range.start() + 1) as usize;
        for i in 0..frame.layers.len() {
            if frame.layers[i].capacity() >= new_len {
                let l = &mut frame.layers[i];
                l.resize(new_len, NULL_OFFSET);
                l.copy_within(0..old_len, before);
                l[..before].fill(NULL_OFFSET);
            } else {
                let mut buf = self.buffer(new_len);
                buf[before..before + old_len].copy_from_slice(&frame.layers[i]);
                let old = std::mem::replace(&mut frame.layers[i], buf);
                self.recycle(old);
                self.stats.copied += 1;
            }
        }
        frame.range = range;
    }

    /// Returns the buffers of `frame` to the free lists.
    pub fn release(&mut self, frame: Frame) {
        for buf in frame.layers {
            self.recycle(buf);
        }
        self.stats.live_frames = self.stats.live_frames.saturating_sub(1);
    }

    /// Prepares for a new alignment. Free lists are kept; counters restart.
    pub fn reset(&mut self) {
        self.stats = AllocatorStats::default();
    }

    /// Drops every pooled buffer.
    pub fn clear(&mut self) {
        self.free.clear();
        self.stats = AllocatorStats::default();
    }

    /// Number of buffers waiting in the free lists.
    pub fn pooled(&self) -> usize {
        self.free.iter().map(|l| l.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_types::Component::*;

    #[test]
    fn size_classes() {
        assert_eq!(class_of_request(1), 0);
        assert_eq!(class_of_request(5), 3);
        assert_eq!(class_of_request(8), 3);
        assert_eq!(class_of_capacity(8), 3);
        assert_eq!(class_of_capacity(15), 3);
        assert_eq!(class_of_capacity(16), 4);
    }

    #[test]
    fn allocate_fills_with_null() {
        let mut a = WavefrontAllocator::new();
        let f = a.allocate(3, -2..=2);
        assert_eq!(f.num_layers(), 3);
        assert_eq!(f.len(), 5);
        assert!((-2..=2).all(|k| f.is_null_at(k)));
        assert_eq!(a.stats().allocated, 3);
    }

    #[test]
    fn released_buffers_are_reused() {
        let mut a = WavefrontAllocator::new();
        let mut f = a.allocate(1, 0..=6);
        f.layer_mut(M)[3] = 10;
        a.release(f);
        assert_eq!(a.pooled(), 1);
        // Same class, so the buffer comes back clean.
        let f = a.allocate(1, 0..=4);
        assert_eq!(a.stats().reused, 1);
        assert!((0..=4).all(|k| f.get(M, k) == NULL_OFFSET));
        assert_eq!(a.stats().live_frames, 1);
        assert_eq!(a.stats().peak_live_frames, 1);
    }

    #[test]
    fn grow_keeps_values() {
        let mut a = WavefrontAllocator::new();
        let mut f = a.allocate(2, 0..=0);
        f.layer_mut(M)[0] = 4;
        f.layer_mut(I1)[0] = 2;
        a.grow(&mut f, -3..=2);
        assert_eq!(f.range(), &(-3..=2));
        assert_eq!(f.get(M, 0), 4);
        assert_eq!(f.get(I1, 0), 2);
        assert_eq!(f.get(M, -3), NULL_OFFSET);
        assert_eq!(f.get(M, 2), NULL_OFFSET);
        // A single-slot buffer can not hold 6 diagonals.
        assert_eq!(a.stats().copied, 2);

        // Growing within capacity happens in place.
        let mut g = a.allocate(1, 0..=2);
        g.layer_mut(M)[0] = 5;
        g.layer_mut(M)[2] = 9;
        a.grow(&mut g, -1..=2);
        assert_eq!(
            (g.get(M, -1), g.get(M, 0), g.get(M, 1), g.get(M, 2)),
            (NULL_OFFSET, 5, NULL_OFFSET, 9)
        );
        assert_eq!(a.stats().copied, 2);
    }
}
