//! Backtrace from the terminal cell to a seed.
//!
//! At every step the predecessor is re-derived from the stored frames with the
//! same rules that computed them. Ties are broken by the order of
//! `ScoringModel::transitions_into`: a mismatch before gap closes, the first
//! gap piece before the second, and opening a gap before extending it.

use crate::front::Fr;
use crate::span::SpanBounds;
use crate::status::AlignStats;
use crate::wavefront::{Instance, Terminal, Wavefronts};
use wf_types::{
    Cigar, Component, Component::M, Cost, Error, Result, ScoringModel, Seq, Transition,
};

/// The traced alignment of the sub-rectangle `start..end`, as `(v, h)` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Trace {
    pub cigar: Cigar,
    pub start: (Fr, Fr),
    pub end: (Fr, Fr),
}

/// The state of the walk.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    s: Cost,
    k: Fr,
    h: Fr,
    c: Component,
}

impl Cursor {
    /// Moves back over transition `t`, recording its operation.
    fn step(&mut self, t: &Transition, cigar: &mut Cigar) {
        if let Some(op) = t.op {
            cigar.push_op(op);
        }
        self.h -= t.advance();
        self.k -= t.shift();
        self.s -= t.cost;
        self.c = t.from;
    }
}

impl<'a> Instance<'a> {
    pub fn backtrace(
        &self,
        ws: &mut Wavefronts,
        terminal: Terminal,
        stats: &mut AlignStats,
    ) -> Result<Trace> {
        let window = ws.arena.window();
        let score = terminal.score;
        let mut cur = Cursor {
            s: score,
            k: terminal.k,
            h: terminal.h,
            c: M,
        };
        let broken = |cur: &Cursor| Error::BacktraceInconsistency {
            expected: score,
            actual: score - cur.s,
        };

        // Operations are collected back to front.
        let mut cigar = Cigar::default();

        loop {
            self.ensure(ws, cur.s - window, cur.s, stats);
            let arena = &ws.arena;
            let (s, k) = (cur.s, cur.k);
            let same = |c: Component| arena.offset(s, c, k);

            if cur.c == M {
                if cur.s == 0 {
                    let seed = SpanBounds::seed_offset(cur.k);
                    if !self.bounds.seed_range().contains(&cur.k) || cur.h < seed {
                        return Err(broken(&cur));
                    }
                    cigar.match_push(cur.h - seed);
                    cur.h = seed;
                    break;
                }
                // The first of the largest candidates, as in the forward pass.
                let mut best: Option<(&Transition, Fr)> = None;
                for t in self.cm.transitions_into(M) {
                    if let Some(base) = self.source(arena, s, k, t, same) {
                        if best.map_or(true, |(_, b)| base > b) {
                            best = Some((t, base));
                        }
                    }
                }
                let Some((t, base)) = best.filter(|&(_, base)| base <= cur.h) else {
                    return Err(broken(&cur));
                };
                cigar.match_push(cur.h - base);
                cur.h = base;
                cur.step(t, &mut cigar);
            } else {
                let h = cur.h;
                let Some(t) = self
                    .cm
                    .transitions_into(cur.c)
                    .iter()
                    .find(|t| self.source(arena, s, k, t, same) == Some(h))
                else {
                    return Err(broken(&cur));
                };
                cur.step(t, &mut cigar);
            }
        }

        cigar.reverse();
        let trace = Trace {
            cigar,
            start: (cur.h - cur.k, cur.h),
            end: (terminal.h - terminal.k, terminal.h),
        };
        check_trace(self.cm, self.pattern, self.text, &trace, score)?;
        Ok(trace)
    }
}

/// The emitted operations must spell out `pattern[start.0..end.0]` into
/// `text[start.1..end.1]` and cost exactly `score`.
fn check_trace(
    cm: &ScoringModel,
    pattern: Seq,
    text: Seq,
    trace: &Trace,
    score: Cost,
) -> Result<()> {
    let Trace { cigar, start, end } = trace;
    let broken = || Error::BacktraceInconsistency {
        expected: score,
        actual: cigar.score(cm),
    };
    if cigar.pattern_len() as Fr != end.0 - start.0
        || cigar.text_len() as Fr != end.1 - start.1
    {
        return Err(broken());
    }
    let (Some(p), Some(t)) = (
        pattern.get(start.0 as usize..end.0 as usize),
        text.get(start.1 as usize..end.1 as usize),
    ) else {
        return Err(broken());
    };
    match cigar.verify(cm, p, t) {
        Some(actual) if actual == score => Ok(()),
        _ => Err(broken()),
    }
}
