//! A quadratic Gotoh-style DP over all gap pieces, used as ground truth.

use itertools::Itertools;
use wf_types::{Cost, ScoringKind, ScoringModel, Seq};

const INF: Cost = Cost::MAX / 2;

/// Free leading and trailing parts: `(pattern_begin, pattern_end, text_begin, text_end)`.
/// Amounts larger than a sequence are clamped to its length.
pub type FreeEnds = (usize, usize, usize, usize);

pub const END_TO_END: FreeEnds = (0, 0, 0, 0);

/// The optimal cost of aligning `a` (pattern) to `b` (text) under `cm`.
pub fn align_cost(cm: &ScoringModel, a: Seq, b: Seq, free: FreeEnds) -> Cost {
    let (pbf, pef, tbf, tef) = free;
    let (n, m) = (a.len(), b.len());
    let pieces = cm.gap_pieces();
    let x = cm.mismatch();

    // One row per pattern position; `ins[p]` and `del[p]` per gap piece.
    let mut best = vec![vec![INF; m + 1]; n + 1];
    let mut ins = vec![vec![vec![INF; m + 1]; n + 1]; pieces.len()];
    let mut del = vec![vec![vec![INF; m + 1]; n + 1]; pieces.len()];

    for (i, j) in (0..=n).cartesian_product(0..=m) {
        let mut cell = if (i == 0 && j <= tbf) || (j == 0 && i <= pbf) {
            0
        } else {
            INF
        };
        if i > 0 && j > 0 {
            let sub = if a[i - 1] == b[j - 1] { 0 } else { x };
            cell = cell.min(best[i - 1][j - 1] + sub);
        }
        for (p, &(open, extend)) in pieces.iter().enumerate() {
            if j > 0 {
                ins[p][i][j] = (best[i][j - 1] + open + extend).min(ins[p][i][j - 1] + extend);
            }
            if i > 0 {
                del[p][i][j] = (best[i - 1][j] + open + extend).min(del[p][i - 1][j] + extend);
            }
            cell = cell.min(ins[p][i][j]).min(del[p][i][j]);
        }
        best[i][j] = cell.min(INF);
    }

    let last_row = (0..=m).filter(|&j| m - j <= tef).map(|j| best[n][j]);
    let last_col = (0..=n).filter(|&i| n - i <= pef).map(|i| best[i][m]);
    last_row.chain(last_col).min().unwrap_or(INF)
}

/// Unit cost edit distance.
pub fn edit_distance(a: Seq, b: Seq) -> Cost {
    triple_accel::levenshtein_exp(a, b) as Cost
}

/// The optimal end-to-end cost, cross-checked against `triple_accel` for the
/// edit model.
pub fn cost(cm: &ScoringModel, a: Seq, b: Seq) -> Cost {
    let cost = align_cost(cm, a, b, END_TO_END);
    if cm.kind() == ScoringKind::Edit {
        assert_eq!(cost, edit_distance(a, b));
    }
    cost
}
