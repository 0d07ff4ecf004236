//! This module contains the `ScoringModel` and its transition table.
//!
//! A gap of length `l` in a piece `(open, extend)` costs `open + l * extend`.
//! Matches are free.

use crate::{CigarOp, Cost, Error, Result};
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

/// The model tag. Determines which components exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ScoringKind {
    /// Mismatches and indels cost 1.
    Edit,
    /// Mismatch cost and per-symbol indel cost.
    Linear,
    /// One gap-open/gap-extend pair.
    #[default]
    Affine,
    /// Two competing gap-open/gap-extend pairs.
    #[cfg_attr(feature = "cli", value(name = "affine2p"))]
    Affine2Piece,
}

/// Raw penalties. Which fields are used depends on the `ScoringKind`:
/// `Linear` uses `mismatch` and `gap_extend1`, `Affine` adds `gap_open1`, and
/// `Affine2Piece` adds the second pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Penalties {
    pub mismatch: Cost,
    pub gap_open1: Cost,
    pub gap_extend1: Cost,
    #[serde(default)]
    pub gap_open2: Cost,
    #[serde(default)]
    pub gap_extend2: Cost,
}

impl Penalties {
    pub const EDIT: Penalties = Penalties {
        mismatch: 1,
        gap_open1: 0,
        gap_extend1: 1,
        gap_open2: 0,
        gap_extend2: 0,
    };
}

impl Default for Penalties {
    fn default() -> Self {
        Penalties {
            mismatch: 4,
            gap_open1: 6,
            gap_extend1: 2,
            gap_open2: 24,
            gap_extend2: 1,
        }
    }
}

/// One DP component. `M` holds match/mismatch states, the others are the
/// insertion and deletion layers of the first and second gap piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    M,
    I1,
    D1,
    I2,
    D2,
}

pub use Component::*;

impl Component {
    pub const ALL: [Component; 5] = [M, I1, D1, I2, D2];

    /// Index of the component in per-frame storage.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn is_gap(self) -> bool {
        self != M
    }

    /// The operation emitted while staying inside this gap component.
    pub fn gap_op(self) -> Option<CigarOp> {
        match self {
            I1 | I2 => Some(CigarOp::Ins),
            D1 | D2 => Some(CigarOp::Del),
            M => None,
        }
    }
}

/// An edge of the edit graph between two components.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from: Component,
    pub to: Component,
    /// `None` for a gap close, which consumes no symbols and costs nothing.
    pub op: Option<CigarOp>,
    pub cost: Cost,
}

impl Transition {
    /// The target diagonal minus the source diagonal.
    #[inline]
    pub fn shift(&self) -> i32 {
        match self.op {
            Some(CigarOp::Ins) => 1,
            Some(CigarOp::Del) => -1,
            _ => 0,
        }
    }

    /// The number of text symbols consumed.
    #[inline]
    pub fn advance(&self) -> i32 {
        match self.op {
            Some(CigarOp::Match | CigarOp::Sub | CigarOp::Ins) => 1,
            _ => 0,
        }
    }
}

type Transitions = SmallVec<[Transition; 5]>;

/// An immutable scoring configuration together with the transition table
/// derived from it. Cheap to share between threads.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoringModel {
    kind: ScoringKind,
    penalties: Penalties,
    /// For each component, the transitions into it in backtrace priority order.
    into: [Transitions; 5],
    /// Components in the order they must be computed: gap layers before `M`,
    /// since gap-close edges stay within a frame.
    order: SmallVec<[Component; 5]>,
    max_step_cost: Cost,
}

impl ScoringModel {
    pub fn new(kind: ScoringKind, penalties: Penalties) -> Result<Self> {
        for (name, value) in [
            ("mismatch", penalties.mismatch),
            ("gap-open1", penalties.gap_open1),
            ("gap-extend1", penalties.gap_extend1),
            ("gap-open2", penalties.gap_open2),
            ("gap-extend2", penalties.gap_extend2),
        ] {
            if value < 0 {
                return Err(Error::config(format!(
                    "the {name} penalty is negative ({value})"
                )));
            }
        }
        let penalties = match kind {
            ScoringKind::Edit => Penalties::EDIT,
            _ => penalties,
        };
        let Penalties {
            mismatch,
            gap_open1,
            gap_extend1,
            gap_open2,
            gap_extend2,
        } = penalties;

        // A free step would make a wavefront depend on itself.
        if mismatch == 0 {
            return Err(Error::config("the mismatch penalty must be positive"));
        }
        if gap_extend1 == 0 {
            return Err(Error::config("the gap-extend1 penalty must be positive"));
        }
        match kind {
            ScoringKind::Linear if gap_open1 != 0 => {
                return Err(Error::config(
                    "the linear model takes no gap-open penalty; use the affine model",
                ));
            }
            ScoringKind::Affine2Piece if gap_extend2 == 0 => {
                return Err(Error::config("the gap-extend2 penalty must be positive"));
            }
            _ => {}
        }

        let mut into: [Transitions; 5] = Default::default();
        let mut add = |from: Component, to: Component, op: Option<CigarOp>, cost: Cost| {
            into[to.index()].push(Transition { from, to, op, cost });
        };

        let order: SmallVec<[Component; 5]> = match kind {
            ScoringKind::Edit | ScoringKind::Linear => {
                add(M, M, Some(CigarOp::Sub), mismatch);
                add(M, M, Some(CigarOp::Ins), gap_extend1);
                add(M, M, Some(CigarOp::Del), gap_extend1);
                smallvec![M]
            }
            ScoringKind::Affine | ScoringKind::Affine2Piece => {
                let mut pieces = vec![(I1, D1, gap_open1, gap_extend1)];
                if kind == ScoringKind::Affine2Piece {
                    pieces.push((I2, D2, gap_open2, gap_extend2));
                }
                for &(ins, del, open, extend) in &pieces {
                    // Opening before extending.
                    add(M, ins, Some(CigarOp::Ins), open + extend);
                    add(ins, ins, Some(CigarOp::Ins), extend);
                    add(M, del, Some(CigarOp::Del), open + extend);
                    add(del, del, Some(CigarOp::Del), extend);
                }
                add(M, M, Some(CigarOp::Sub), mismatch);
                for &(ins, del, _, _) in &pieces {
                    add(ins, M, None, 0);
                    add(del, M, None, 0);
                }
                let mut order: SmallVec<[Component; 5]> =
                    pieces.iter().flat_map(|p| [p.0, p.1]).collect();
                order.push(M);
                order
            }
        };

        let max_step_cost = into
            .iter()
            .flatten()
            .map(|t| t.cost)
            .max()
            .unwrap_or(0);

        Ok(ScoringModel {
            kind,
            penalties,
            into,
            order,
            max_step_cost,
        })
    }

    pub fn edit() -> Self {
        // Edit penalties are fixed and always valid.
        Self::new(ScoringKind::Edit, Penalties::EDIT).unwrap_or_else(|_| unreachable!())
    }

    pub fn linear(mismatch: Cost, indel: Cost) -> Result<Self> {
        Self::new(
            ScoringKind::Linear,
            Penalties {
                mismatch,
                gap_open1: 0,
                gap_extend1: indel,
                gap_open2: 0,
                gap_extend2: 0,
            },
        )
    }

    pub fn affine(mismatch: Cost, open: Cost, extend: Cost) -> Result<Self> {
        Self::new(
            ScoringKind::Affine,
            Penalties {
                mismatch,
                gap_open1: open,
                gap_extend1: extend,
                gap_open2: 0,
                gap_extend2: 0,
            },
        )
    }

    pub fn affine2p(
        mismatch: Cost,
        open1: Cost,
        extend1: Cost,
        open2: Cost,
        extend2: Cost,
    ) -> Result<Self> {
        Self::new(
            ScoringKind::Affine2Piece,
            Penalties {
                mismatch,
                gap_open1: open1,
                gap_extend1: extend1,
                gap_open2: open2,
                gap_extend2: extend2,
            },
        )
    }

    #[inline]
    pub fn kind(&self) -> ScoringKind {
        self.kind
    }

    #[inline]
    pub fn penalties(&self) -> &Penalties {
        &self.penalties
    }

    #[inline]
    pub fn mismatch(&self) -> Cost {
        self.penalties.mismatch
    }

    /// Components of this model in computation order (`M` last).
    #[inline]
    pub fn components(&self) -> &[Component] {
        &self.order
    }

    #[inline]
    pub fn num_components(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn has_component(&self, c: Component) -> bool {
        c.index() < self.order.len()
    }

    /// The transitions ending in `c`, in backtrace priority order.
    #[inline]
    pub fn transitions_into(&self, c: Component) -> &[Transition] {
        &self.into[c.index()]
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.into.iter().flatten()
    }

    /// All ways to leave `from` while consuming `op`, with their cost and target.
    pub fn transitions_from(
        &self,
        from: Component,
        op: CigarOp,
    ) -> impl Iterator<Item = &Transition> {
        self.transitions()
            .filter(move |t| t.from == from && t.op == Some(op))
    }

    /// Looks up the edge `from -> to` consuming `op`.
    pub fn transition(
        &self,
        from: Component,
        to: Component,
        op: Option<CigarOp>,
    ) -> Option<&Transition> {
        self.transitions_into(to)
            .iter()
            .find(|t| t.from == from && t.op == op)
    }

    /// The largest cost of a single edge. Computing a frame looks back this many scores.
    #[inline]
    pub fn max_step_cost(&self) -> Cost {
        self.max_step_cost
    }

    /// The `(open, extend)` pairs of the model. Linear indels have open cost 0.
    pub fn gap_pieces(&self) -> SmallVec<[(Cost, Cost); 2]> {
        let p = &self.penalties;
        match self.kind {
            ScoringKind::Edit | ScoringKind::Linear => smallvec![(0, p.gap_extend1)],
            ScoringKind::Affine => smallvec![(p.gap_open1, p.gap_extend1)],
            ScoringKind::Affine2Piece => smallvec![
                (p.gap_open1, p.gap_extend1),
                (p.gap_open2, p.gap_extend2)
            ],
        }
    }

    /// The cheapest cost of a single gap of the given length.
    pub fn gap_cost(&self, len: Cost) -> Cost {
        if len == 0 {
            return 0;
        }
        self.gap_pieces()
            .iter()
            .map(|&(open, extend)| open + len * extend)
            .min()
            .unwrap_or(Cost::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_penalties() {
        let r = ScoringModel::affine(4, -1, 2);
        assert!(matches!(r, Err(Error::Config { .. })));
        let r = ScoringModel::affine2p(4, 6, 2, 24, -1);
        assert!(matches!(r, Err(Error::Config { .. })));
        // Edit replaces the penalties, but only after they are checked.
        let r = ScoringModel::new(
            ScoringKind::Edit,
            Penalties {
                gap_extend1: -3,
                ..Penalties::EDIT
            },
        );
        assert!(matches!(r, Err(Error::Config { .. })));
    }

    #[test]
    fn rejects_free_steps() {
        assert!(ScoringModel::linear(0, 1).is_err());
        assert!(ScoringModel::affine(1, 2, 0).is_err());
        assert!(ScoringModel::affine2p(1, 2, 1, 4, 0).is_err());
    }

    #[test]
    fn linear_rejects_gap_open() {
        let r = ScoringModel::new(
            ScoringKind::Linear,
            Penalties {
                mismatch: 1,
                gap_open1: 3,
                gap_extend1: 1,
                gap_open2: 0,
                gap_extend2: 0,
            },
        );
        assert!(r.is_err());
    }

    #[test]
    fn edit_ignores_given_penalties() {
        let cm = ScoringModel::new(ScoringKind::Edit, Penalties::default()).unwrap();
        assert_eq!(cm.penalties(), &Penalties::EDIT);
        assert_eq!(cm.max_step_cost(), 1);
        assert_eq!(cm.components(), &[M]);
    }

    #[test]
    fn affine_table() {
        let cm = ScoringModel::affine(4, 6, 2).unwrap();
        assert_eq!(cm.components(), &[I1, D1, M]);
        assert_eq!(cm.max_step_cost(), 8);

        let into_i1 = cm.transitions_into(I1);
        assert_eq!(into_i1.len(), 2);
        // Opening is preferred over extending.
        assert_eq!((into_i1[0].from, into_i1[0].cost), (M, 8));
        assert_eq!((into_i1[1].from, into_i1[1].cost), (I1, 2));

        let into_m = cm.transitions_into(M);
        assert_eq!(into_m[0].op, Some(CigarOp::Sub));
        assert_eq!(into_m[1].from, I1);
        assert_eq!(into_m[2].from, D1);
        assert_eq!(into_m[1].cost, 0);

        assert_eq!(cm.transition(M, D1, Some(CigarOp::Del)).map(|t| t.cost), Some(8));
        assert_eq!(cm.transition(D1, D1, Some(CigarOp::Del)).map(|t| t.cost), Some(2));
        assert!(cm.transition(I1, D1, Some(CigarOp::Del)).is_none());
    }

    #[test]
    fn dual_affine_pieces_compete() {
        let cm = ScoringModel::affine2p(4, 6, 2, 24, 1).unwrap();
        assert_eq!(cm.components(), &[I1, D1, I2, D2, M]);
        let opens: Vec<_> = cm
            .transitions_from(M, CigarOp::Ins)
            .map(|t| (t.to, t.cost))
            .collect();
        assert_eq!(opens, vec![(I1, 8), (I2, 25)]);
        // Short gaps use the first piece, long gaps the second.
        assert_eq!(cm.gap_cost(1), 8);
        assert_eq!(cm.gap_cost(18), 42);
        assert_eq!(cm.gap_cost(30), 54);
        assert_eq!(cm.max_step_cost(), 25);
    }

    #[test]
    fn geometry() {
        let cm = ScoringModel::linear(3, 2).unwrap();
        let into_m = cm.transitions_into(M);
        let geo: Vec<_> = into_m.iter().map(|t| (t.shift(), t.advance())).collect();
        assert_eq!(geo, vec![(0, 1), (1, 1), (-1, 0)]);
    }
}
