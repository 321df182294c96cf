//! Arithmetic placement: containment and pairwise separation on the coordinate
//! variables, plus the row and column capacity bounds shared by every encoding.

use log::debug;

use super::EncodingContext;
use crate::formula::Formula;

/// Containment and non-overlap over the coordinate variables.
pub fn encode(ctx: &mut EncodingContext<'_>) {
    let w = ctx.board_width() as i64;
    let length = ctx.layout.length;
    let n = ctx.layout.circuits.len();

    for i in 0..n {
        let c = ctx.vars(i);
        ctx.set.assert(Formula::le(c.xhat + c.width, w));
        ctx.set.assert(Formula::le(c.yhat + c.height, length));
    }

    for i in 0..n {
        for j in i + 1..n {
            let a = ctx.vars(i);
            let b = ctx.vars(j);
            ctx.set.assert(Formula::or([
                Formula::le(a.xhat + a.width, b.xhat),
                Formula::le(b.xhat + b.width, a.xhat),
                Formula::le(a.yhat + a.height, b.yhat),
                Formula::le(b.yhat + b.height, a.yhat),
            ]));
        }
    }
}

/// Capacity bounds: the circuits crossing a column are stacked within the
/// board length, and the circuits crossing a row fit side by side in the width.
pub fn implied_bounds(ctx: &mut EncodingContext<'_>) {
    let w = ctx.board_width();
    let n = ctx.layout.circuits.len();
    let length = ctx.layout.length;

    for col in 0..w as i64 {
        let mut terms = Vec::new();
        for i in 0..n {
            let c = ctx.vars(i);
            for o in ctx.orientations(i) {
                if o.width > w {
                    continue;
                }
                let spans = Formula::and([
                    o.guard,
                    Formula::le(c.xhat, col),
                    Formula::le(col - o.width as i64 + 1, c.xhat),
                ]);
                terms.push((spans, o.height as i64));
            }
        }
        ctx.set.assert(Formula::sum_le(terms, length));
    }

    for row in 0..ctx.rows() as i64 {
        let mut terms = Vec::new();
        for i in 0..n {
            let c = ctx.vars(i);
            for o in ctx.orientations(i) {
                if o.width > w {
                    continue;
                }
                let spans = Formula::and([
                    o.guard,
                    Formula::le(c.yhat, row),
                    Formula::le(row - o.height as i64 + 1, c.yhat),
                ]);
                terms.push((spans, o.width as i64));
            }
        }
        ctx.set.assert(Formula::sum_le(terms, w as i64));
    }

    debug!("implied bounds: {} columns, {} rows", w, ctx.rows());
}
