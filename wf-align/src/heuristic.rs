//! Band and drop-off cutoffs that bound the diagonals explored.
//!
//! Cutoffs only ever shrink the kept range of diagonals. Whenever a diagonal
//! holding a reachable offset is dropped the result is marked inexact.

use crate::front::{Fr, Frame, NULL_OFFSET};
use serde::{Deserialize, Serialize};
use std::cmp::{max, min};
use std::ops::RangeInclusive;
use wf_types::{Component::M, Cost, Error, Result};

fn default_steps_between_cutoffs() -> Cost {
    1
}

/// User configuration of the cutoffs. The default disables all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeuristicConfig {
    /// Static band `(min_k, max_k)` of diagonals to explore.
    #[serde(default)]
    pub band: Option<(Fr, Fr)>,

    /// Drop end diagonals whose antidiagonal `2h - k` lags more than this
    /// behind the best one of the same score.
    #[serde(default)]
    pub drop_off: Option<Fr>,

    /// Apply the drop-off every this many scores.
    #[serde(default = "default_steps_between_cutoffs")]
    pub steps_between_cutoffs: Cost,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            band: None,
            drop_off: None,
            steps_between_cutoffs: default_steps_between_cutoffs(),
        }
    }
}

impl HeuristicConfig {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn band(min_k: Fr, max_k: Fr) -> Self {
        Self {
            band: Some((min_k, max_k)),
            ..Self::default()
        }
    }

    pub fn drop_off(drop: Fr) -> Self {
        Self {
            drop_off: Some(drop),
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.band.is_some() || self.drop_off.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some((lo, hi)) = self.band {
            if lo > hi {
                return Err(Error::config(format!("the band {lo}..={hi} is empty")));
            }
        }
        if let Some(drop) = self.drop_off {
            if drop < 0 {
                return Err(Error::config(format!("the drop-off {drop} is negative")));
            }
        }
        if self.steps_between_cutoffs <= 0 {
            return Err(Error::config("steps-between-cutoffs must be positive"));
        }
        Ok(())
    }
}

/// Per-alignment cutoff state. Small and `Copy`, so that checkpoints can
/// snapshot it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicState {
    k_lo: Fr,
    k_hi: Fr,
    /// Best antidiagonal seen at the last drop-off.
    best: Fr,
    pruned: bool,
    dropped: usize,
}

impl HeuristicState {
    pub fn new(config: &HeuristicConfig, plen: Fr, tlen: Fr) -> Self {
        let (lo, hi) = config.band.unwrap_or((Fr::MIN, Fr::MAX));
        Self {
            k_lo: max(-plen, lo),
            k_hi: min(tlen, hi),
            best: NULL_OFFSET,
            pruned: false,
            dropped: 0,
        }
    }

    /// The diagonals that may still be computed.
    #[inline]
    pub fn kept_range(&self) -> RangeInclusive<Fr> {
        self.k_lo..=self.k_hi
    }

    /// True when every diagonal has been cut off.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.k_lo > self.k_hi
    }

    /// True when a reachable diagonal was dropped.
    #[inline]
    pub fn pruned(&self) -> bool {
        self.pruned
    }

    #[inline]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    #[inline]
    pub fn best_antidiagonal(&self) -> Option<Fr> {
        (self.best != NULL_OFFSET).then_some(self.best)
    }

    /// Records `n` reachable diagonals that fell outside the kept range.
    pub(crate) fn mark_outside(&mut self, n: usize) {
        if n > 0 {
            self.pruned = true;
            self.dropped += n;
        }
    }

    /// Applies the cutoffs to `frame`, computed at score `s`, and returns the
    /// range it should be trimmed to. Unreached diagonals at both ends are
    /// always trimmed; that is exact and does not count as pruning.
    pub(crate) fn apply(
        &mut self,
        config: &HeuristicConfig,
        s: Cost,
        frame: &Frame,
    ) -> RangeInclusive<Fr> {
        let mut lo = max(frame.lo(), self.k_lo);
        let mut hi = min(frame.hi(), self.k_hi);
        trim_null(frame, &mut lo, &mut hi);

        if let Some(drop) = config.drop_off.filter(|_| s % config.steps_between_cutoffs == 0) {
            let m = frame.layer(M);
            let antidiagonal = |k: Fr| {
                let h = m.get(k);
                (h != NULL_OFFSET).then(|| 2 * h - k)
            };
            if let Some(best) = (lo..=hi).filter_map(antidiagonal).max() {
                self.best = best;
                let lags = |k: Fr| antidiagonal(k).map_or(false, |ad| best - ad > drop);
                while lo <= hi && lags(lo) {
                    self.mark_outside(1);
                    lo += 1;
                    self.k_lo = lo;
                    trim_null(frame, &mut lo, &mut hi);
                }
                while lo <= hi && lags(hi) {
                    self.mark_outside(1);
                    hi -= 1;
                    self.k_hi = hi;
                    trim_null(frame, &mut lo, &mut hi);
                }
            }
        }
        lo..=hi
    }
}

fn trim_null(frame: &Frame, lo: &mut Fr, hi: &mut Fr) {
    while *lo <= *hi && frame.is_null_at(*lo) {
        *lo += 1;
    }
    while *lo <= *hi && frame.is_null_at(*hi) {
        *hi -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::WavefrontAllocator;

    fn m_frame(lo: Fr, m: &[Fr]) -> Frame {
        let mut a = WavefrontAllocator::new();
        let mut f = a.allocate(1, lo..=lo + m.len() as Fr - 1);
        for (i, &h) in m.iter().enumerate() {
            f.layer_mut(M)[lo + i as Fr] = h;
        }
        f
    }

    #[test]
    fn band_is_clamped_to_matrix() {
        let h = HeuristicState::new(&HeuristicConfig::band(-100, 3), 10, 20);
        assert_eq!(h.kept_range(), -10..=3);
        let h = HeuristicState::new(&HeuristicConfig::none(), 10, 20);
        assert_eq!(h.kept_range(), -10..=20);
    }

    #[test]
    fn trims_null_ends_without_pruning() {
        let config = HeuristicConfig::none();
        let mut h = HeuristicState::new(&config, 10, 10);
        let f = m_frame(-2, &[NULL_OFFSET, 3, NULL_OFFSET, 4, NULL_OFFSET]);
        assert_eq!(h.apply(&config, 1, &f), -1..=1);
        assert!(!h.pruned());
        assert_eq!(h.kept_range(), -10..=10);
    }

    #[test]
    fn drop_off_cuts_lagging_ends() {
        let config = HeuristicConfig::drop_off(4);
        let mut h = HeuristicState::new(&config, 100, 100);
        // Antidiagonals: k=-2: 2*1+2=4, k=-1: 2*8+1=17, k=0: 20, k=1: 2*3-1=5.
        let f = m_frame(-2, &[1, 8, 10, 3]);
        assert_eq!(h.apply(&config, 1, &f), -1..=0);
        assert!(h.pruned());
        assert_eq!(h.dropped(), 2);
        assert_eq!(h.kept_range(), -1..=0);
        assert_eq!(h.best_antidiagonal(), Some(20));
    }

    #[test]
    fn drop_off_only_every_few_steps() {
        let config = HeuristicConfig {
            steps_between_cutoffs: 3,
            ..HeuristicConfig::drop_off(0)
        };
        let mut h = HeuristicState::new(&config, 100, 100);
        let f = m_frame(0, &[1, 10]);
        assert_eq!(h.apply(&config, 2, &f), 0..=1);
        assert!(!h.pruned());
        assert_eq!(h.apply(&config, 3, &f), 1..=1);
        assert!(h.pruned());
    }

    #[test]
    fn validation() {
        assert!(HeuristicConfig::band(3, 2).validate().is_err());
        assert!(HeuristicConfig::drop_off(-1).validate().is_err());
        let c = HeuristicConfig {
            steps_between_cutoffs: 0,
            ..Default::default()
        };
        assert!(c.validate().is_err());
        assert!(HeuristicConfig::band(-5, 5).validate().is_ok());
    }
}
