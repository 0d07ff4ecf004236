//! The propagation engine.
//!
//! Terminology:
//! - `s`: the score of a frame. Frames are computed for every score, in order.
//! - `k`: a diagonal, `k = h - v`. Insertions move to `k+1`, deletions to `k-1`.
//! - `h`: an offset, the text position reached on a diagonal.
//! - `W`: the largest step cost. Frame `s` only depends on frames `s-W..=s`.
//!
//! A frame is computed in three steps: every component is evaluated from the
//! earlier frames (gap layers first, since `M` closes gaps within the same
//! score), the `M` layer is extended greedily along matches, and the cutoffs
//! trim the range.

use crate::allocator::WavefrontAllocator;
use crate::front::{Fr, Frame, NULL_OFFSET};
use crate::heuristic::{HeuristicConfig, HeuristicState};
use crate::memory::{FrameArena, MemoryMode};
use crate::span::SpanBounds;
use crate::status::{AlignStats, StatusReporter};
use std::cmp::{max, min};
use std::iter::zip;
use wf_types::{Component, Component::M, Cost, Error, Result, ScoringModel, Seq, Transition};

/// Engine storage, reused across alignments.
#[derive(Debug)]
pub(crate) struct Wavefronts {
    pub alloc: WavefrontAllocator,
    pub arena: FrameArena,
    pub heuristic: HeuristicState,
}

impl Wavefronts {
    pub fn new() -> Self {
        Self {
            alloc: WavefrontAllocator::new(),
            arena: FrameArena::new(),
            heuristic: HeuristicState::new(&HeuristicConfig::none(), 0, 0),
        }
    }

    /// Releases the frames of the previous call.
    pub fn reset(&mut self, mode: MemoryMode, window: Cost, interval: Cost) {
        self.arena.reset(&mut self.alloc, mode, window, interval);
        self.alloc.reset();
    }

    pub fn release(&mut self) {
        self.arena.clear(&mut self.alloc);
    }
}

/// The cell where the alignment ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Terminal {
    pub score: Cost,
    pub k: Fr,
    pub h: Fr,
}

/// The inputs of a single alignment call.
pub(crate) struct Instance<'a> {
    pub cm: &'a ScoringModel,
    pub pattern: Seq<'a>,
    pub text: Seq<'a>,
    pub plen: Fr,
    pub tlen: Fr,
    pub bounds: SpanBounds,
    pub config: &'a HeuristicConfig,
}

impl<'a> Instance<'a> {
    pub fn new(
        cm: &'a ScoringModel,
        pattern: Seq<'a>,
        text: Seq<'a>,
        bounds: SpanBounds,
        config: &'a HeuristicConfig,
    ) -> Self {
        Self {
            cm,
            pattern,
            text,
            plen: pattern.len() as Fr,
            tlen: text.len() as Fr,
            bounds,
            config,
        }
    }

    /// True when offset `h` on diagonal `k` is a cell of the DP matrix.
    #[inline]
    pub fn contains(&self, k: Fr, h: Fr) -> bool {
        let v = h - k;
        0 <= h && h <= self.tlen && 0 <= v && v <= self.plen
    }

    /// The offset transition `t` reaches on diagonal `k` at score `s`.
    /// `same` gives the offsets of score `s` itself, for gap closes.
    #[inline]
    pub fn source(
        &self,
        arena: &FrameArena,
        s: Cost,
        k: Fr,
        t: &Transition,
        same: impl Fn(Component) -> Fr,
    ) -> Option<Fr> {
        let src = if t.cost == 0 {
            same(t.from)
        } else {
            arena.offset(s - t.cost, t.from, k - t.shift())
        };
        if src == NULL_OFFSET {
            return None;
        }
        let h = src + t.advance();
        self.contains(k, h).then_some(h)
    }

    /// The offset of component `to` on diagonal `k` at score `s`, before extension.
    #[inline]
    fn eval(
        &self,
        arena: &FrameArena,
        s: Cost,
        k: Fr,
        to: Component,
        same: impl Fn(Component) -> Fr + Copy,
    ) -> Fr {
        self.cm
            .transitions_into(to)
            .iter()
            .filter_map(|t| self.source(arena, s, k, t, same))
            .max()
            .unwrap_or(NULL_OFFSET)
    }

    /// True when any component would reach diagonal `k` at score `s`.
    fn reaches(&self, arena: &FrameArena, s: Cost, k: Fr) -> bool {
        let mut same = [NULL_OFFSET; 5];
        for &c in self.cm.components() {
            let h = self.eval(arena, s, k, c, |g| same[g.index()]);
            same[c.index()] = h;
        }
        same.iter().any(|&h| h != NULL_OFFSET)
    }

    /// Greedily extends every diagonal of the `M` layer along matching symbols.
    fn extend(&self, frame: &mut Frame, stats: &mut AlignStats) {
        let range = frame.range().clone();
        let mut m = frame.layer_mut(M);
        for k in range {
            let h = m[k];
            if h == NULL_OFFSET {
                continue;
            }
            let v = h - k;
            let n = zip(&self.pattern[v as usize..], &self.text[h as usize..])
                .take_while(|(a, b)| a == b)
                .count();
            m[k] = h + n as Fr;
            stats.extended += n;
        }
    }

    /// Applies the cutoffs and trims the frame. Returns `None` when nothing is left.
    fn finish_frame(
        &self,
        s: Cost,
        mut frame: Frame,
        alloc: &mut WavefrontAllocator,
        heuristic: &mut HeuristicState,
    ) -> Option<Frame> {
        let range = heuristic.apply(self.config, s, &frame);
        if range.is_empty() {
            alloc.release(frame);
            return None;
        }
        if range != *frame.range() {
            frame.shrink(range);
        }
        Some(frame)
    }

    /// The frame of score 0: the seeds of the span policy, extended.
    pub fn init_frame(
        &self,
        alloc: &mut WavefrontAllocator,
        heuristic: &mut HeuristicState,
        stats: &mut AlignStats,
    ) -> Option<Frame> {
        let seeds = self.bounds.seed_range();
        let mut frame = alloc.allocate(self.cm.num_components(), 0..=0);
        frame.layer_mut(M)[0] = 0;
        if seeds != (0..=0) {
            alloc.grow(&mut frame, seeds.clone());
            let mut m = frame.layer_mut(M);
            for k in seeds.clone() {
                m[k] = SpanBounds::seed_offset(k);
            }
        }
        let kept = heuristic.kept_range();
        heuristic.mark_outside(seeds.filter(|k| !kept.contains(k)).count());

        self.extend(&mut frame, stats);
        self.finish_frame(0, frame, alloc, heuristic)
    }

    /// Computes the frame of score `s` from the frames in `arena`.
    pub fn next_frame(
        &self,
        s: Cost,
        alloc: &mut WavefrontAllocator,
        arena: &FrameArena,
        heuristic: &mut HeuristicState,
        stats: &mut AlignStats,
    ) -> Option<Frame> {
        // The union of the source ranges, shifted by each transition.
        let mut lo = Fr::MAX;
        let mut hi = Fr::MIN;
        for t in self.cm.transitions().filter(|t| t.cost > 0) {
            if let Some(src) = arena.get(s - t.cost) {
                lo = min(lo, src.lo() + t.shift());
                hi = max(hi, src.hi() + t.shift());
            }
        }
        lo = max(lo, -self.plen);
        hi = min(hi, self.tlen);
        if lo > hi {
            return None;
        }

        let kept = heuristic.kept_range();
        heuristic.mark_outside(
            (lo..=hi)
                .filter(|k| !kept.contains(k) && self.reaches(arena, s, *k))
                .count(),
        );
        let lo = max(lo, *kept.start());
        let hi = min(hi, *kept.end());
        if lo > hi {
            return None;
        }

        let mut frame = alloc.allocate(self.cm.num_components(), lo..=hi);
        for &c in self.cm.components() {
            for k in lo..=hi {
                let h = self.eval(arena, s, k, c, |g| frame.get(g, k));
                frame.layer_mut(c)[k] = h;
            }
        }
        self.extend(&mut frame, stats);
        self.finish_frame(s, frame, alloc, heuristic)
    }

    /// The terminal cell reached in `frame`, if any. The largest antidiagonal
    /// wins, then the lowest diagonal.
    fn terminal(&self, s: Cost, frame: &Frame) -> Option<Terminal> {
        let mut best: Option<Terminal> = None;
        for (k, h) in frame.layer(M).iter() {
            if h == NULL_OFFSET || !self.bounds.is_terminal(k, h, self.plen, self.tlen) {
                continue;
            }
            if best.map_or(true, |b| 2 * h - k > 2 * b.h - b.k) {
                best = Some(Terminal { score: s, k, h });
            }
        }
        best
    }

    /// Computes frames score by score until the alignment is complete.
    pub fn run<R: StatusReporter>(
        &self,
        ws: &mut Wavefronts,
        max_score: Option<Cost>,
        reporter: &mut R,
        stats: &mut AlignStats,
    ) -> Result<Terminal> {
        ws.heuristic = HeuristicState::new(self.config, self.plen, self.tlen);
        let frame = self.init_frame(&mut ws.alloc, &mut ws.heuristic, stats);
        ws.arena.push(&mut ws.alloc, frame, ws.heuristic);
        stats.frames += 1;

        let mut s = 0;
        loop {
            let frame = ws.arena.get(s);
            reporter.new_score(s, frame.map(|f| f.range()), ws.arena.live_frames());
            if let Some(terminal) = frame.and_then(|f| self.terminal(s, f)) {
                return Ok(terminal);
            }

            if ws.heuristic.is_exhausted() {
                return Err(Error::unreachable(s, "every diagonal was cut off"));
            }
            if ws.arena.is_exhausted() {
                return Err(Error::unreachable(
                    s,
                    if ws.heuristic.pruned() {
                        "all reachable diagonals were pruned"
                    } else {
                        "no diagonal is reachable"
                    },
                ));
            }
            if let Some(bound) = max_score {
                if s >= bound {
                    return Err(Error::unreachable(
                        s,
                        format!("the score bound {bound} was reached"),
                    ));
                }
            }

            s += 1;
            let frame = self.next_frame(
                s,
                &mut ws.alloc,
                &ws.arena,
                &mut ws.heuristic,
                stats,
            );
            ws.arena.push(&mut ws.alloc, frame, ws.heuristic);
            stats.frames += 1;
        }
    }

    /// Makes the frames `lo..=hi` available. Discarded frames are recomputed
    /// from the closest earlier checkpoint; regenerated frames above `hi` are
    /// released first.
    pub fn ensure(&self, ws: &mut Wavefronts, lo: Cost, hi: Cost, stats: &mut AlignStats) {
        let Some(t) = ws.arena.highest_discarded(lo, hi) else {
            return;
        };
        ws.arena.release_scratch_above(&mut ws.alloc, hi);
        let Some(checkpoint) = ws.arena.checkpoint_before(t) else {
            unreachable!("score 0 is always a checkpoint");
        };
        let mut heuristic = checkpoint.heuristic;
        log::trace!(
            "regenerating frames {}..={t} from checkpoint {}",
            checkpoint.score + 1,
            checkpoint.score
        );
        // Statistics of the forward pass are not affected by recomputation.
        let mut scratch_stats = AlignStats::default();
        for u in checkpoint.score + 1..=t {
            let frame = self.next_frame(
                u,
                &mut ws.alloc,
                &ws.arena,
                &mut heuristic,
                &mut scratch_stats,
            );
            if ws.arena.is_discarded(u) {
                stats.regenerated += 1;
            }
            ws.arena.restore(&mut ws.alloc, u, frame);
        }
    }
}
