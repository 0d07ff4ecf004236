//!
//! # Wavefront alignment
//!
//! Computes optimal alignments under edit, linear, gap-affine and dual-affine
//! costs by growing wavefronts of furthest reaching offsets score by score.
//!
//! It can be used in two ways:
//! - Create a reusable `WavefrontAligner` from a `ScoringModel`.
//! - Deserialize or parse (`cli::AlignerArgs`) an `AlignerParams` and `build` it.
//!
//! An aligner owns its frame arena and must not be shared between threads;
//! use `fork` to create more engines sharing the same model.
//!

mod allocator;
mod front;
mod memory;
mod trace;
mod wavefront;

#[cfg(feature = "cli")]
pub mod cli;
pub mod heuristic;
pub mod span;
pub mod status;

pub use allocator::{AllocatorStats, WavefrontAllocator};
pub use front::{Fr, Frame, NULL_OFFSET};
pub use heuristic::{HeuristicConfig, HeuristicState};
pub use memory::{MemoryMode, DEFAULT_CHECKPOINT_INTERVAL, LOW_MEMORY_CHECKPOINTS};
pub use span::AlignmentSpan;
pub use status::{AlignStats, LogStatus, NoStatus, StatusReporter};

use instant::Instant;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;
use wavefront::{Instance, Wavefronts};
use wf_types::{
    Aligner, Cigar, Cost, Error, Penalties, Result, ScoringKind, ScoringModel, Seq,
};

fn default_checkpoint_interval() -> Cost {
    DEFAULT_CHECKPOINT_INTERVAL
}

/// Serializable configuration of a `WavefrontAligner`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AlignerParams {
    pub scoring: ScoringKind,
    pub penalties: Penalties,
    #[serde(default)]
    pub memory: MemoryMode,
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: Cost,
    #[serde(default)]
    pub heuristic: HeuristicConfig,
    /// Give up once this score is reached without completing the alignment.
    #[serde(default)]
    pub max_score: Option<Cost>,
}

impl Default for AlignerParams {
    fn default() -> Self {
        Self {
            scoring: ScoringKind::default(),
            penalties: Penalties::default(),
            memory: MemoryMode::default(),
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            heuristic: HeuristicConfig::default(),
            max_score: None,
        }
    }
}

impl AlignerParams {
    pub fn model(&self) -> Result<ScoringModel> {
        ScoringModel::new(self.scoring, self.penalties)
    }

    /// Validates the configuration and builds an aligner.
    pub fn build(&self) -> Result<WavefrontAligner> {
        WavefrontAligner::new(self.model()?)
            .memory_mode(self.memory)
            .checkpoint_interval(self.checkpoint_interval)?
            .heuristic(self.heuristic)?
            .max_score(self.max_score)
    }
}

/// The result of a successful alignment.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pub score: Cost,
    /// Covers exactly `pattern_range` and `text_range`; free leading and
    /// trailing parts are not included.
    pub cigar: Cigar,
    pub pattern_range: Range<usize>,
    pub text_range: Range<usize>,
    /// False when a cutoff dropped a reachable diagonal. The score is then an
    /// upper bound of the optimum.
    pub exact: bool,
}

impl Alignment {
    /// The gapped rows of the aligned parts of the sequences.
    pub fn aligned_rows(&self, pattern: Seq, text: Seq) -> (Vec<u8>, Vec<u8>) {
        self.cigar.to_aligned(
            &pattern[self.pattern_range.clone()],
            &text[self.text_range.clone()],
        )
    }
}

/// A reusable alignment engine.
#[derive(Debug)]
pub struct WavefrontAligner<R: StatusReporter = NoStatus> {
    cm: Arc<ScoringModel>,
    memory: MemoryMode,
    checkpoint_interval: Cost,
    heuristic: HeuristicConfig,
    max_score: Option<Cost>,
    reporter: R,
    wavefronts: Wavefronts,
    stats: AlignStats,
}

impl WavefrontAligner<NoStatus> {
    pub fn new(cm: impl Into<Arc<ScoringModel>>) -> Self {
        Self {
            cm: cm.into(),
            memory: MemoryMode::default(),
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            heuristic: HeuristicConfig::default(),
            max_score: None,
            reporter: NoStatus,
            wavefronts: Wavefronts::new(),
            stats: AlignStats::default(),
        }
    }
}

impl<R: StatusReporter> WavefrontAligner<R> {
    pub fn memory_mode(mut self, memory: MemoryMode) -> Self {
        self.memory = memory;
        self
    }

    pub fn checkpoint_interval(mut self, interval: Cost) -> Result<Self> {
        if interval <= 0 {
            return Err(Error::config("the checkpoint interval must be positive"));
        }
        self.checkpoint_interval = interval;
        Ok(self)
    }

    pub fn heuristic(mut self, heuristic: HeuristicConfig) -> Result<Self> {
        heuristic.validate()?;
        self.heuristic = heuristic;
        Ok(self)
    }

    pub fn max_score(mut self, max_score: Option<Cost>) -> Result<Self> {
        if let Some(m) = max_score {
            if m < 0 {
                return Err(Error::config(format!("the score bound {m} is negative")));
            }
        }
        self.max_score = max_score;
        Ok(self)
    }

    pub fn with_reporter<R2: StatusReporter>(self, reporter: R2) -> WavefrontAligner<R2> {
        WavefrontAligner {
            cm: self.cm,
            memory: self.memory,
            checkpoint_interval: self.checkpoint_interval,
            heuristic: self.heuristic,
            max_score: self.max_score,
            reporter,
            wavefronts: self.wavefronts,
            stats: self.stats,
        }
    }

    /// A fresh engine with the same configuration, sharing the scoring model.
    pub fn fork(&self) -> Self
    where
        R: Clone,
    {
        Self {
            cm: Arc::clone(&self.cm),
            memory: self.memory,
            checkpoint_interval: self.checkpoint_interval,
            heuristic: self.heuristic,
            max_score: self.max_score,
            reporter: self.reporter.clone(),
            wavefronts: Wavefronts::new(),
            stats: AlignStats::default(),
        }
    }

    pub fn model(&self) -> &ScoringModel {
        &self.cm
    }

    pub fn model_arc(&self) -> Arc<ScoringModel> {
        Arc::clone(&self.cm)
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Statistics of the last alignment call.
    pub fn stats(&self) -> &AlignStats {
        &self.stats
    }

    /// Buffers pooled by the allocator for the next call.
    pub fn pooled_buffers(&self) -> usize {
        self.wavefronts.alloc.pooled()
    }

    /// Drops all pooled memory.
    pub fn shrink(&mut self) {
        self.wavefronts.release();
        self.wavefronts.alloc.clear();
    }

    pub fn align(&mut self, pattern: Seq, text: Seq, span: AlignmentSpan) -> Result<Alignment> {
        let start = Instant::now();
        let bounds = span.resolve(pattern.len(), text.len())?;
        let mut stats = AlignStats::init(pattern, text);

        let inst = Instance::new(&self.cm, pattern, text, bounds, &self.heuristic);
        self.wavefronts.reset(
            self.memory,
            self.cm.max_step_cost(),
            self.checkpoint_interval,
        );

        let forward = inst.run(
            &mut self.wavefronts,
            self.max_score,
            &mut self.reporter,
            &mut stats,
        );
        stats.timing.forward = start.elapsed().as_secs_f64();
        let exact = !self.wavefronts.heuristic.pruned();
        stats.pruned = self.wavefronts.heuristic.dropped();

        let result = match forward {
            Ok(terminal) => {
                stats.score = terminal.score;
                let t = Instant::now();
                let trace = inst.backtrace(&mut self.wavefronts, terminal, &mut stats);
                stats.timing.backtrace = t.elapsed().as_secs_f64();
                trace.map(|trace| Alignment {
                    score: terminal.score,
                    cigar: trace.cigar,
                    pattern_range: trace.start.0 as usize..trace.end.0 as usize,
                    text_range: trace.start.1 as usize..trace.end.1 as usize,
                    exact,
                })
            }
            Err(e) => {
                if let Error::Unreachable { score, .. } = e {
                    stats.score = score;
                }
                Err(e)
            }
        };

        let alloc = self.wavefronts.alloc.stats();
        stats.buffers_allocated = alloc.allocated;
        stats.buffers_reused = alloc.reused;
        stats.peak_live_frames = self.wavefronts.arena.peak_live_frames();
        stats.timing.total = start.elapsed().as_secs_f64();
        self.wavefronts.release();

        match &result {
            Ok(aln) if !aln.exact => {
                log::warn!("cutoffs dropped reachable diagonals; score {} may not be optimal", aln.score)
            }
            Ok(aln) => log::debug!(
                "aligned {}x{} with score {} in {} frames",
                pattern.len(),
                text.len(),
                aln.score,
                stats.frames
            ),
            Err(e @ Error::Unreachable { .. }) if self.heuristic.is_enabled() => {
                log::warn!("{e} Consider relaxing the cutoffs.")
            }
            Err(e) => log::debug!("{e}"),
        }

        self.reporter.finish(&stats);
        self.stats = stats;
        result
    }

    pub fn align_end_to_end(&mut self, pattern: Seq, text: Seq) -> Result<Alignment> {
        self.align(pattern, text, AlignmentSpan::EndToEnd)
    }

    pub fn align_extension(&mut self, pattern: Seq, text: Seq) -> Result<Alignment> {
        self.align(pattern, text, AlignmentSpan::Extension)
    }

    pub fn align_ends_free(
        &mut self,
        pattern: Seq,
        text: Seq,
        pattern_begin_free: usize,
        pattern_end_free: usize,
        text_begin_free: usize,
        text_end_free: usize,
    ) -> Result<Alignment> {
        self.align(
            pattern,
            text,
            AlignmentSpan::ends_free(
                pattern_begin_free,
                pattern_end_free,
                text_begin_free,
                text_end_free,
            ),
        )
    }

    /// Aligns the reversed sequences and maps the result back to forward
    /// coordinates. Among equally good alignments this prefers the one found
    /// from the ends inward.
    pub fn align_reversed(
        &mut self,
        pattern: Seq,
        text: Seq,
        span: AlignmentSpan,
    ) -> Result<Alignment> {
        let rev = |s: Seq| s.iter().rev().copied().collect::<Vec<u8>>();
        let (rp, rt) = (rev(pattern), rev(text));
        let mut aln = self.align(&rp, &rt, span.reversed())?;
        aln.cigar.reverse();
        let mirror = |r: &Range<usize>, len: usize| len - r.end..len - r.start;
        aln.pattern_range = mirror(&aln.pattern_range, pattern.len());
        aln.text_range = mirror(&aln.text_range, text.len());
        Ok(aln)
    }
}

impl<R: StatusReporter> Aligner for WavefrontAligner<R> {
    fn align(&mut self, a: Seq, b: Seq) -> Result<(Cost, Cigar)> {
        let aln = self.align_end_to_end(a, b)?;
        Ok((aln.score, aln.cigar))
    }
}
