use crate::{Cost, ScoringModel, Seq};
use serde::{Serialize, Serializer};
use std::fmt;
use std::slice;

/// A single edit operation. `Ins` consumes one text symbol, `Del` consumes one
/// pattern symbol.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum CigarOp {
    Match,
    Sub,
    Ins,
    Del,
}

impl CigarOp {
    pub fn to_char(self) -> char {
        match self {
            CigarOp::Match => 'M',
            CigarOp::Sub => 'X',
            CigarOp::Ins => 'I',
            CigarOp::Del => 'D',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'M' | '=' => CigarOp::Match,
            'X' => CigarOp::Sub,
            'I' => CigarOp::Ins,
            'D' => CigarOp::Del,
            _ => return None,
        })
    }

    #[inline]
    pub fn consumes_pattern(self) -> bool {
        self != CigarOp::Ins
    }

    #[inline]
    pub fn consumes_text(self) -> bool {
        self != CigarOp::Del
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub struct CigarElem {
    pub op: CigarOp,
    pub cnt: i32,
}

/// A run-length encoded list of edit operations, in forward order.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct Cigar {
    ops: Vec<CigarElem>,
}

impl fmt::Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for elem in &self.ops {
            write!(f, "{}{}", elem.cnt, elem.op.to_char())?;
        }
        Ok(())
    }
}

impl Serialize for Cigar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'a> IntoIterator for &'a Cigar {
    type Item = &'a CigarElem;
    type IntoIter = slice::Iter<'a, CigarElem>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

impl Cigar {
    /// Parses a compacted cigar like `3M1X2I`. A missing count means 1.
    pub fn parse(s: &str) -> Option<Self> {
        let mut cigar = Cigar::default();
        let mut cnt: Option<i32> = None;
        for c in s.chars() {
            if let Some(d) = c.to_digit(10) {
                cnt = Some(cnt.unwrap_or(0).checked_mul(10)?.checked_add(d as i32)?);
                continue;
            }
            let op = CigarOp::from_char(c)?;
            cigar.push_elem(CigarElem {
                op,
                cnt: cnt.take().unwrap_or(1),
            });
        }
        if cnt.is_some() {
            return None;
        }
        Some(cigar)
    }

    pub fn iter(&self) -> slice::Iter<'_, CigarElem> {
        self.ops.iter()
    }

    /// Number of run-length elements.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn push_op(&mut self, op: CigarOp) {
        self.push_elem(CigarElem { op, cnt: 1 });
    }

    pub fn push_elem(&mut self, elem: CigarElem) {
        if elem.cnt == 0 {
            return;
        }
        if let Some(s) = self.ops.last_mut() {
            if s.op == elem.op {
                s.cnt += elem.cnt;
                return;
            }
        }
        self.ops.push(elem);
    }

    /// Extend the cigar by the given number of matches.
    pub fn match_push(&mut self, cnt: i32) {
        self.push_elem(CigarElem {
            op: CigarOp::Match,
            cnt,
        });
    }

    /// Reverse the cigar string.
    pub fn reverse(&mut self) {
        self.ops.reverse()
    }

    /// Append another cigar to this one.
    pub fn append(&mut self, other: &mut Self) {
        let Some(first) = other.ops.first_mut() else {
            return;
        };
        if let Some(s) = self.ops.last() {
            if s.op == first.op {
                first.cnt += s.cnt;
                self.ops.pop();
            }
        }
        self.ops.append(&mut other.ops);
    }

    /// The expanded operation string, e.g. `MDMM`.
    pub fn ops_string(&self) -> String {
        self.ops
            .iter()
            .flat_map(|e| std::iter::repeat(e.op.to_char()).take(e.cnt as usize))
            .collect()
    }

    pub fn pattern_len(&self) -> usize {
        self.ops
            .iter()
            .filter(|e| e.op.consumes_pattern())
            .map(|e| e.cnt as usize)
            .sum()
    }

    pub fn text_len(&self) -> usize {
        self.ops
            .iter()
            .filter(|e| e.op.consumes_text())
            .map(|e| e.cnt as usize)
            .sum()
    }

    /// The cost of the cigar under `cm`. Each maximal run of insertions or
    /// deletions is priced as a single gap using the cheapest gap piece.
    pub fn score(&self, cm: &ScoringModel) -> Cost {
        let mut cost = 0;
        let mut gap: Option<(CigarOp, Cost)> = None;
        for elem in &self.ops {
            match elem.op {
                CigarOp::Ins | CigarOp::Del => {
                    gap = match gap {
                        Some((op, len)) if op == elem.op => Some((op, len + elem.cnt)),
                        Some((_, len)) => {
                            cost += cm.gap_cost(len);
                            Some((elem.op, elem.cnt))
                        }
                        None => Some((elem.op, elem.cnt)),
                    };
                }
                CigarOp::Match | CigarOp::Sub => {
                    if let Some((_, len)) = gap.take() {
                        cost += cm.gap_cost(len);
                    }
                    if elem.op == CigarOp::Sub {
                        cost += elem.cnt * cm.mismatch();
                    }
                }
            }
        }
        if let Some((_, len)) = gap {
            cost += cm.gap_cost(len);
        }
        cost
    }

    /// Checks that the cigar transforms `pattern` into `text`: matches are on
    /// equal symbols, substitutions on different ones, and both sequences are
    /// consumed exactly. Returns the cost of the cigar when it is valid.
    pub fn verify(&self, cm: &ScoringModel, pattern: Seq, text: Seq) -> Option<Cost> {
        let (mut i, mut j) = (0usize, 0usize);
        for elem in &self.ops {
            for _ in 0..elem.cnt {
                match elem.op {
                    CigarOp::Match | CigarOp::Sub => {
                        let (a, b) = (pattern.get(i)?, text.get(j)?);
                        if (a == b) != (elem.op == CigarOp::Match) {
                            return None;
                        }
                        i += 1;
                        j += 1;
                    }
                    CigarOp::Ins => {
                        text.get(j)?;
                        j += 1;
                    }
                    CigarOp::Del => {
                        pattern.get(i)?;
                        i += 1;
                    }
                }
            }
        }
        if i != pattern.len() || j != text.len() {
            return None;
        }
        Some(self.score(cm))
    }

    /// Renders the two gapped rows of the alignment, using `-` for gaps.
    /// Panics when the cigar is longer than the sequences.
    pub fn to_aligned(&self, pattern: Seq, text: Seq) -> (Vec<u8>, Vec<u8>) {
        let mut rows = (Vec::new(), Vec::new());
        let (mut i, mut j) = (0, 0);
        for elem in &self.ops {
            for _ in 0..elem.cnt {
                if elem.op.consumes_pattern() {
                    rows.0.push(pattern[i]);
                    i += 1;
                } else {
                    rows.0.push(b'-');
                }
                if elem.op.consumes_text() {
                    rows.1.push(text[j]);
                    j += 1;
                } else {
                    rows.1.push(b'-');
                }
            }
        }
        rows
    }
}
