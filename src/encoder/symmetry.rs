//! Partial symmetry breaking.
//!
//! Each rule is an independent set of implications over the coordinate and
//! effective-dimension variables, so the rules compose with any base encoding
//! and with rotation. Mirrored duplicates of a packing may still remain.

use log::debug;

use super::{EncodingContext, Extension, SymmetryConfig};
use crate::formula::Formula;

#[derive(Debug, Copy, Clone)]
pub struct SymmetryBreaker {
    config: SymmetryConfig,
}

impl SymmetryBreaker {
    pub fn new(config: SymmetryConfig) -> Self {
        Self { config }
    }

    /// Circuits with the same intrinsic dimensions are interchangeable: order
    /// them along a shared column, and along a shared row.
    fn shape_order(&self, ctx: &mut EncodingContext<'_>) -> usize {
        let circuits = ctx.instance().circuits();
        let mut count = 0;
        for i in 0..circuits.len() {
            for j in i + 1..circuits.len() {
                let (ci, cj) = (&circuits[i], &circuits[j]);
                if (ci.width, ci.height) != (cj.width, cj.height) {
                    continue;
                }
                let a = ctx.vars(i);
                let b = ctx.vars(j);
                ctx.set.assert(Formula::implies(
                    Formula::and([Formula::eq(a.xhat, b.xhat), Formula::eq(a.width, b.width)]),
                    Formula::le(a.yhat, b.yhat),
                ));
                ctx.set.assert(Formula::implies(
                    Formula::and([Formula::eq(a.yhat, b.yhat), Formula::eq(a.height, b.height)]),
                    Formula::le(a.xhat, b.xhat),
                ));
                count += 1;
            }
        }
        count
    }

    /// A column of two stacked circuits `i` (bottom) and `j` (top) next to a
    /// circuit `k` of the same total height can swap sides with `k`; keep the
    /// arrangement with `k` on the left.
    fn three_block(&self, ctx: &mut EncodingContext<'_>) -> usize {
        let n = ctx.layout.circuits.len();
        let shapes: Vec<Vec<(u32, u32)>> = (0..n).map(|i| ctx.shapes(i)).collect();
        let mut count = 0;

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                for k in 0..n {
                    if k == i || k == j {
                        continue;
                    }
                    let fits = shapes[i].iter().any(|&(wi, hi)| {
                        shapes[j].iter().any(|&(wj, hj)| {
                            wi == wj && shapes[k].iter().any(|&(_, hk)| hi + hj == hk)
                        })
                    });
                    if !fits {
                        continue;
                    }

                    let (a, b, c) = (ctx.vars(i), ctx.vars(j), ctx.vars(k));
                    let stacked = Formula::and([
                        Formula::eq(a.xhat, b.xhat),
                        Formula::eq(a.width, b.width),
                        Formula::eq(a.yhat + a.height, b.yhat),
                        Formula::eq(c.yhat, a.yhat),
                        Formula::eq(a.height + b.height, c.height),
                        Formula::or([
                            Formula::eq(a.xhat + a.width, c.xhat),
                            Formula::eq(c.xhat + c.width, a.xhat),
                        ]),
                    ]);
                    ctx.set.assert(Formula::implies(stacked, Formula::le(c.xhat, a.xhat)));
                    count += 1;
                }
            }
        }
        count
    }

    /// Puts the largest circuit to the lower left of the second largest.
    fn anchor(&self, ctx: &mut EncodingContext<'_>) -> bool {
        let mut order: Vec<usize> = (0..ctx.layout.circuits.len()).collect();
        let circuits = ctx.instance().circuits();
        // Stable: lower index first on equal area.
        order.sort_by_key(|&i| std::cmp::Reverse(circuits[i].area()));
        let [a, b, ..] = order[..] else {
            return false;
        };
        let (a, b) = (ctx.vars(a), ctx.vars(b));
        ctx.set.assert(Formula::le(a.xhat, b.xhat));
        ctx.set.assert(Formula::le(a.yhat, b.yhat));
        true
    }
}

impl Extension for SymmetryBreaker {
    fn name(&self) -> &'static str {
        "symmetry"
    }

    fn constrain(&self, ctx: &mut EncodingContext<'_>) {
        if self.config.shape_order {
            let pairs = self.shape_order(ctx);
            debug!("symmetry: ordered {} pairs of identical circuits", pairs);
        }
        if self.config.three_block {
            let triples = self.three_block(ctx);
            debug!("symmetry: {} three-block candidates", triples);
        }
        if self.config.anchor && self.anchor(ctx) {
            debug!("symmetry: anchored the two largest circuits");
        }
    }
}
