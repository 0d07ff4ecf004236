//! Progress callbacks and per-alignment statistics.

use crate::front::Fr;
use derive_more::AddAssign;
use std::ops::RangeInclusive;
use wf_types::{Cost, Seq};

#[derive(Default, Clone, Copy, AddAssign, Debug, PartialEq)]
pub struct Timing {
    /// forward + backtrace
    pub total: f64,
    /// computing frames up to the terminal score
    pub forward: f64,
    pub backtrace: f64,
}

#[derive(Default, Clone, AddAssign, Debug, PartialEq)]
pub struct AlignStats {
    pub len_pattern: usize,
    pub len_text: usize,
    /// The final score, or the score at which the search gave up.
    pub score: Cost,
    /// Frames computed by the forward pass.
    pub frames: usize,
    /// Frames computed again during the backtrace.
    pub regenerated: usize,
    /// Symbols skipped by greedy matching.
    pub extended: usize,
    /// Reachable diagonals dropped by the cutoffs.
    pub pruned: usize,
    /// Offset buffers that needed a fresh heap allocation.
    pub buffers_allocated: usize,
    /// Offset buffers served from the free lists.
    pub buffers_reused: usize,
    pub peak_live_frames: usize,

    pub timing: Timing,
    pub sample_size: usize,
}

impl AlignStats {
    pub fn init(a: Seq, b: Seq) -> Self {
        Self {
            len_pattern: a.len(),
            len_text: b.len(),
            sample_size: 1,
            ..Default::default()
        }
    }
}

/// The diagnostic line emitted per score. The format is not stable.
pub fn status_line(s: Cost, range: Option<&RangeInclusive<Fr>>, live_frames: usize) -> String {
    match range {
        Some(r) => format!("score={s} k=[{},{}] frames={live_frames}", r.start(), r.end()),
        None => format!("score={s} k=[] frames={live_frames}"),
    }
}

/// Callbacks to follow the progress of an alignment.
pub trait StatusReporter {
    /// Called after the frame of score `s` was computed. `range` is `None`
    /// when nothing is reachable at this score.
    fn new_score(&mut self, _s: Cost, _range: Option<&RangeInclusive<Fr>>, _live_frames: usize) {}

    /// Called once at the end of every alignment, also when it failed.
    fn finish(&mut self, _stats: &AlignStats) {}
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct NoStatus;

impl StatusReporter for NoStatus {}

/// Writes the diagnostic line every `every` scores at `trace` level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogStatus {
    pub every: Cost,
}

impl Default for LogStatus {
    fn default() -> Self {
        LogStatus { every: 1 }
    }
}

impl StatusReporter for LogStatus {
    fn new_score(&mut self, s: Cost, range: Option<&RangeInclusive<Fr>>, live_frames: usize) {
        if self.every > 0 && s % self.every == 0 {
            log::trace!("{}", status_line(s, range, live_frames));
        }
    }

    fn finish(&mut self, stats: &AlignStats) {
        log::debug!(
            "{}x{} score={} frames={} regenerated={} extended={} pruned={} peak_frames={} t={:.3}ms",
            stats.len_pattern,
            stats.len_text,
            stats.score,
            stats.frames,
            stats.regenerated,
            stats.extended,
            stats.pruned,
            stats.peak_live_frames,
            1000. * stats.timing.total
        );
    }
}
