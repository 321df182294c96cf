use super::{EncodingContext, Extension};
use crate::formula::Formula;

/// Lets every circuit turn by 90°.
///
/// Declares `rotated_i`, widens the effective dimensions to
/// `[min(w, h), max(w, h)]` and channels them to the flag. A square never
/// counts as rotated.
#[derive(Debug, Default, Copy, Clone)]
pub struct RotationExtension;

impl Extension for RotationExtension {
    fn name(&self) -> &'static str {
        "rotation"
    }

    fn declare(&self, ctx: &mut EncodingContext<'_>) {
        let instance = ctx.instance();
        for (c, vars) in instance.circuits().iter().zip(ctx.layout.circuits.iter_mut()) {
            let r = ctx.set.new_bool(format!("rotated_{}", c.id));
            let lo = c.width.min(c.height) as i64;
            let hi = c.width.max(c.height) as i64;
            ctx.set.set_domain(vars.width, lo, hi);
            ctx.set.set_domain(vars.height, lo, hi);
            vars.rotated = Some(r);
        }
    }

    fn constrain(&self, ctx: &mut EncodingContext<'_>) {
        let instance = ctx.instance();
        for (i, c) in instance.circuits().iter().enumerate() {
            let vars = ctx.vars(i);
            let Some(r) = vars.rotated else {
                continue;
            };
            if c.is_square() {
                ctx.set.assert(Formula::not(r));
                continue;
            }
            let (w, h) = (c.width as i64, c.height as i64);
            ctx.set.assert(Formula::implies(
                r,
                Formula::and([Formula::eq(vars.width, h), Formula::eq(vars.height, w)]),
            ));
            ctx.set.assert(Formula::implies(
                Formula::not(r),
                Formula::and([Formula::eq(vars.width, w), Formula::eq(vars.height, h)]),
            ));
        }
    }
}
