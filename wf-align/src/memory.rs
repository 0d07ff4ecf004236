//! The arena of frames, indexed by score, and the policy for discarding them.
//!
//! Computing frame `s` reads frames `s-W..s`, where `W` is the largest step
//! cost of the model. A checkpoint at score `c` keeps the window
//! `c-W+1..=c` together with the heuristic state right after frame `c`, which
//! is enough to recompute every later frame.

use crate::allocator::WavefrontAllocator;
use crate::front::{Fr, Frame, NULL_OFFSET};
use crate::heuristic::HeuristicState;
use serde::{Deserialize, Serialize};
use wf_types::{Component, Cost};

/// Which frames are kept for the backtrace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum MemoryMode {
    /// Keep every frame.
    #[default]
    FullHistory,
    /// Keep a checkpoint every `checkpoint_interval` scores.
    CheckpointedMedium,
    /// Keep a bounded number of checkpoints, spreading them out as the score grows.
    CheckpointedLow,
}

/// Checkpoints kept by `CheckpointedLow` before the interval doubles.
pub const LOW_MEMORY_CHECKPOINTS: usize = 16;

pub const DEFAULT_CHECKPOINT_INTERVAL: Cost = 32;

#[derive(Debug)]
pub(crate) enum Slot {
    /// Nothing is reachable at this score.
    Null,
    Live(Frame),
    /// Computed and dropped; must be regenerated before use.
    Discarded,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    pub score: Cost,
    pub heuristic: HeuristicState,
}

#[derive(Debug)]
pub(crate) struct FrameArena {
    mode: MemoryMode,
    window: Cost,
    interval: Cost,
    slots: Vec<Slot>,
    checkpoints: Vec<Checkpoint>,
    /// Scores of regenerated frames that are currently live.
    scratch: Vec<Cost>,
    live: usize,
    peak_live: usize,
}

impl FrameArena {
    pub fn new() -> Self {
        Self {
            mode: MemoryMode::FullHistory,
            window: 1,
            interval: DEFAULT_CHECKPOINT_INTERVAL,
            slots: vec![],
            checkpoints: vec![],
            scratch: vec![],
            live: 0,
            peak_live: 0,
        }
    }

    /// Releases all frames and prepares for a new alignment.
    pub fn reset(
        &mut self,
        alloc: &mut WavefrontAllocator,
        mode: MemoryMode,
        window: Cost,
        interval: Cost,
    ) {
        self.clear(alloc);
        self.mode = mode;
        self.window = window.max(1);
        self.interval = interval.max(1);
        self.peak_live = 0;
    }

    /// Releases all frames.
    pub fn clear(&mut self, alloc: &mut WavefrontAllocator) {
        for slot in self.slots.drain(..) {
            if let Slot::Live(frame) = slot {
                alloc.release(frame);
            }
        }
        self.checkpoints.clear();
        self.scratch.clear();
        self.live = 0;
    }

    #[inline]
    pub fn window(&self) -> Cost {
        self.window
    }

    /// The score of the last frame pushed.
    #[inline]
    pub fn top(&self) -> Cost {
        self.slots.len() as Cost - 1
    }

    #[inline]
    pub fn live_frames(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn peak_live_frames(&self) -> usize {
        self.peak_live
    }

    pub fn checkpoint_scores(&self) -> impl Iterator<Item = Cost> + '_ {
        self.checkpoints.iter().map(|c| c.score)
    }

    #[inline]
    pub fn get(&self, s: Cost) -> Option<&Frame> {
        if s < 0 {
            return None;
        }
        match self.slots.get(s as usize) {
            Some(Slot::Live(frame)) => Some(frame),
            Some(Slot::Discarded) => {
                debug_assert!(false, "frame {s} was discarded");
                None
            }
            _ => None,
        }
    }

    /// The offset of component `c` on diagonal `k` at score `s`.
    #[inline]
    pub fn offset(&self, s: Cost, c: Component, k: Fr) -> Fr {
        self.get(s).map_or(NULL_OFFSET, |f| f.get(c, k))
    }

    pub fn is_discarded(&self, s: Cost) -> bool {
        matches!(self.slots.get(s as usize), Some(Slot::Discarded))
    }

    /// True when no frame in the last `W` scores reaches anything, so that no
    /// later frame can either.
    pub fn is_exhausted(&self) -> bool {
        let top = self.top();
        (top - self.window + 1..=top)
            .filter(|&s| s >= 0)
            .all(|s| matches!(self.slots[s as usize], Slot::Null))
    }

    fn is_checkpoint(&self, s: Cost) -> bool {
        s % self.interval == 0
    }

    /// True when `s` lies in the window of a kept checkpoint.
    fn is_protected(&self, s: Cost) -> bool {
        match self.mode {
            MemoryMode::FullHistory => true,
            _ => self
                .checkpoints
                .iter()
                .any(|c| c.score - self.window < s && s <= c.score),
        }
    }

    /// Appends the frame for the next score. `heuristic` is the state right
    /// after computing it.
    pub fn push(
        &mut self,
        alloc: &mut WavefrontAllocator,
        frame: Option<Frame>,
        heuristic: HeuristicState,
    ) {
        self.slots.push(match frame {
            Some(frame) => {
                self.live += 1;
                self.peak_live = self.peak_live.max(self.live);
                Slot::Live(frame)
            }
            None => Slot::Null,
        });
        let s = self.top();

        if self.mode == MemoryMode::FullHistory {
            return;
        }
        if self.is_checkpoint(s) {
            self.checkpoints.push(Checkpoint {
                score: s,
                heuristic,
            });
        }
        if self.mode == MemoryMode::CheckpointedLow
            && self.checkpoints.len() > LOW_MEMORY_CHECKPOINTS
        {
            self.interval *= 2;
            let interval = self.interval;
            let released: Vec<Cost> = self
                .checkpoints
                .iter()
                .filter(|c| c.score % interval != 0)
                .map(|c| c.score)
                .collect();
            self.checkpoints.retain(|c| c.score % interval == 0);
            log::trace!("checkpoint interval doubled to {interval} at score {s}");
            for c in released {
                for t in c - self.window + 1..=c {
                    // Frames still in the working window stay.
                    if t >= 0 && t <= s - self.window {
                        self.discard(alloc, t);
                    }
                }
            }
        }
        let t = s - self.window;
        if t >= 0 {
            self.discard(alloc, t);
        }
    }

    /// Drops frame `t` unless a checkpoint protects it.
    fn discard(&mut self, alloc: &mut WavefrontAllocator, t: Cost) {
        if self.is_protected(t) {
            return;
        }
        if !matches!(self.slots[t as usize], Slot::Live(_)) {
            return;
        }
        if let Slot::Live(frame) = std::mem::replace(&mut self.slots[t as usize], Slot::Discarded) {
            alloc.release(frame);
            self.live -= 1;
        }
    }

    /// The highest discarded score in `lo..=hi`.
    pub fn highest_discarded(&self, lo: Cost, hi: Cost) -> Option<Cost> {
        (lo.max(0)..=hi).rev().find(|&s| self.is_discarded(s))
    }

    /// The last checkpoint strictly below `s`.
    pub fn checkpoint_before(&self, s: Cost) -> Option<Checkpoint> {
        self.checkpoints.iter().rev().find(|c| c.score < s).copied()
    }

    /// Releases regenerated frames above `cursor`; the backtrace has passed them.
    pub fn release_scratch_above(&mut self, alloc: &mut WavefrontAllocator, cursor: Cost) {
        let slots = &mut self.slots;
        let mut released = 0;
        self.scratch.retain(|&s| {
            if s <= cursor {
                return true;
            }
            if let Slot::Live(frame) = std::mem::replace(&mut slots[s as usize], Slot::Discarded) {
                alloc.release(frame);
                released += 1;
            }
            false
        });
        self.live -= released;
    }

    /// Stores a recomputed frame for score `s`. Frames that are still live
    /// are kept, since the recomputation is identical.
    pub fn restore(&mut self, alloc: &mut WavefrontAllocator, s: Cost, frame: Option<Frame>) {
        let discarded = self.is_discarded(s);
        match frame {
            Some(frame) if discarded => {
                self.slots[s as usize] = Slot::Live(frame);
                self.scratch.push(s);
                self.live += 1;
                self.peak_live = self.peak_live.max(self.live);
            }
            None if discarded => self.slots[s as usize] = Slot::Null,
            Some(frame) => alloc.release(frame),
            None => {}
        }
    }
}
