use log::debug;

use super::{EncodingContext, Extension, LengthBound};
use crate::formula::{Formula, LinExpr};
use crate::types::IntVar;

/// Full-column and full-row indicators, ordered lexicographically against
/// their reflections.
///
/// `col_c` holds when the circuits crossing column `c` fill the whole length,
/// `row_r` when the circuits crossing row `r` fill the whole width. Requiring
/// `cols ≤lex reverse(cols)` keeps one of each pair of horizontally mirrored
/// packings, and likewise for rows. Over a length range the vertical mirror
/// depends on the length, so the row comparison is guarded by `length = l`
/// for every candidate `l`.
#[derive(Debug, Default, Copy, Clone)]
pub struct DualChannelingExtension;

impl Extension for DualChannelingExtension {
    fn name(&self) -> &'static str {
        "dual"
    }

    fn constrain(&self, ctx: &mut EncodingContext<'_>) {
        let w = ctx.board_width();
        let n = ctx.layout.circuits.len();
        let length = ctx.layout.length;

        let mut cols = Vec::with_capacity(w as usize);
        for col in 0..w as i64 {
            let terms = (0..n)
                .map(|i| {
                    let c = ctx.vars(i);
                    let spans = Formula::and([
                        Formula::le(c.xhat, col),
                        Formula::lt(col, c.xhat + c.width),
                    ]);
                    (spans, c.height)
                })
                .collect::<Vec<_>>();
            let full = weighted(ctx, terms, length.into());
            let v = ctx.set.new_bool(format!("col_{}", col));
            ctx.set.assert(Formula::iff(v, full));
            cols.push(Formula::Var(v));
        }

        let mut rows = Vec::with_capacity(ctx.rows() as usize);
        for row in 0..ctx.rows() as i64 {
            let terms = (0..n)
                .map(|i| {
                    let c = ctx.vars(i);
                    let spans = Formula::and([
                        Formula::le(c.yhat, row),
                        Formula::lt(row, c.yhat + c.height),
                    ]);
                    (spans, c.width)
                })
                .collect::<Vec<_>>();
            let full = weighted(ctx, terms, (w as i64).into());
            let v = ctx.set.new_bool(format!("row_{}", row));
            ctx.set.assert(Formula::iff(v, full));
            rows.push(Formula::Var(v));
        }

        ctx.set.assert(Formula::lex_lesseq(&cols, &reversed(&cols)));

        match ctx.bound() {
            LengthBound::Fixed(_) => {
                ctx.set.assert(Formula::lex_lesseq(&rows, &reversed(&rows)));
            }
            LengthBound::Range => {
                let instance = ctx.instance();
                for l in instance.min_length()..=instance.max_length() {
                    let prefix = &rows[..l as usize];
                    ctx.set.assert(Formula::implies(
                        Formula::eq(length, l as i64),
                        Formula::lex_lesseq(prefix, &reversed(prefix)),
                    ));
                }
            }
        }

        debug!("dual: {} column and {} row indicators", cols.len(), rows.len());
    }
}

fn reversed(fs: &[Formula]) -> Vec<Formula> {
    fs.iter().rev().cloned().collect()
}

/// `Σ [spans]·dim = rhs`, where each dimension may itself be a variable.
///
/// Weighted sums only take constant weights, so a variable dimension is split
/// over its domain: `[spans ∧ dim = d]·d`.
fn weighted(ctx: &EncodingContext<'_>, terms: Vec<(Formula, IntVar)>, rhs: LinExpr) -> Formula {
    let mut res = Vec::new();
    for (spans, dim) in terms {
        let domain = ctx.set.domain(dim);
        if domain.is_fixed() {
            res.push((spans, domain.lb));
        } else {
            for d in domain.lb..=domain.ub {
                res.push((Formula::and([spans.clone(), Formula::eq(dim, d)]), d));
            }
        }
    }
    Formula::sum_eq(res, rhs)
}
