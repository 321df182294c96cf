//! Lowering of formulas onto a gate-level backend.
//!
//! Both propositional backends (clauses for the CDCL engine, decision diagrams
//! for the finite-domain oracle) only need a handful of gates. Formulas, linear
//! comparisons and weighted sums are lowered onto those gates once, here.

use std::ops::Neg;

use crate::formula::{Formula, LinExpr, SumCmp, WeightedSum};
use crate::types::{BoolVar, Lit};

/// A propositional value: either a known constant or a literal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Signal {
    Const(bool),
    Lit(Lit),
}

impl Signal {
    pub(crate) fn negate(self) -> Self {
        match self {
            Signal::Const(b) => Signal::Const(!b),
            Signal::Lit(l) => Signal::Lit(-l),
        }
    }
}

impl Neg for Signal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

pub(crate) trait Gates {
    type Sig: Copy + PartialEq;

    fn constant(&mut self, value: bool) -> Self::Sig;
    fn var(&mut self, v: BoolVar) -> Self::Sig;
    fn not(&mut self, a: Self::Sig) -> Self::Sig;
    fn and(&mut self, xs: &[Self::Sig]) -> Self::Sig;
    fn or(&mut self, xs: &[Self::Sig]) -> Self::Sig;

    /// Reified `e ≤ 0`.
    fn le(&mut self, e: &LinExpr) -> Self::Sig;

    /// Bounds of `e` over the variable domains.
    fn bounds(&self, e: &LinExpr) -> (i64, i64);

    /// Asserts that the signal holds.
    fn require(&mut self, a: Self::Sig);

    fn iff(&mut self, a: Self::Sig, b: Self::Sig) -> Self::Sig {
        let na = self.not(a);
        let nb = self.not(b);
        let ab = self.or(&[na, b]);
        let ba = self.or(&[a, nb]);
        self.and(&[ab, ba])
    }

    /// Asserts `e ≤ 0`.
    fn require_le(&mut self, e: &LinExpr) {
        let s = self.le(e);
        self.require(s);
    }

    /// Asserts the disjunction.
    fn require_any(&mut self, xs: &[Self::Sig]) {
        let s = self.or(xs);
        self.require(s);
    }
}

/// `e ≤ 0`, folded to a constant when the bounds decide it.
fn lower_le<G: Gates>(g: &mut G, e: &LinExpr) -> G::Sig {
    let (lo, hi) = g.bounds(e);
    if hi <= 0 {
        g.constant(true)
    } else if lo > 0 {
        g.constant(false)
    } else {
        g.le(e)
    }
}

pub(crate) fn lower<G: Gates>(g: &mut G, f: &Formula) -> G::Sig {
    match f {
        Formula::Const(b) => g.constant(*b),
        Formula::Var(v) => g.var(*v),
        Formula::Not(inner) => {
            let a = lower(g, inner);
            g.not(a)
        }
        Formula::And(fs) => {
            let xs: Vec<G::Sig> = fs.iter().map(|f| lower(g, f)).collect();
            g.and(&xs)
        }
        Formula::Or(fs) => {
            let xs: Vec<G::Sig> = fs.iter().map(|f| lower(g, f)).collect();
            g.or(&xs)
        }
        Formula::Implies(a, b) => {
            let a = lower(g, a);
            let b = lower(g, b);
            let na = g.not(a);
            g.or(&[na, b])
        }
        Formula::Iff(a, b) => {
            let a = lower(g, a);
            let b = lower(g, b);
            g.iff(a, b)
        }
        Formula::Le(e) => lower_le(g, e),
        Formula::Sum(sum) => lower_sum(g, sum),
    }
}

/// Asserts a formula, splitting top-level conjunctions and keeping top-level
/// comparisons and disjunctions unreified.
pub(crate) fn assert_formula<G: Gates>(g: &mut G, f: &Formula) {
    match f {
        Formula::Const(true) => {}
        Formula::And(fs) => {
            for f in fs {
                assert_formula(g, f);
            }
        }
        Formula::Le(e) => {
            let (lo, hi) = g.bounds(e);
            if hi <= 0 {
                return;
            }
            if lo > 0 {
                let f = g.constant(false);
                g.require(f);
                return;
            }
            g.require_le(e);
        }
        Formula::Or(fs) => {
            let xs: Vec<G::Sig> = fs.iter().map(|f| lower(g, f)).collect();
            g.require_any(&xs);
        }
        Formula::Implies(a, b) => {
            let a = lower(g, a);
            let b = lower(g, b);
            let na = g.not(a);
            g.require_any(&[na, b]);
        }
        f => {
            let s = lower(g, f);
            g.require(s);
        }
    }
}

/// Weighted sum through a saturating sequential counter.
///
/// `ge[v]` holds when the partial sum of the terms seen so far is at least
/// `v`. Counting stops at `cap`, one past the largest value the right-hand
/// side can take, since every larger sum violates the bound anyway.
fn lower_sum<G: Gates>(g: &mut G, sum: &WeightedSum) -> G::Sig {
    let (_, rhs_ub) = g.bounds(&sum.rhs);
    let total: i64 = sum.terms.iter().map(|&(_, w)| w).sum();
    let cap = total.min((rhs_ub + 1).max(0)) as usize;

    let t = g.constant(true);
    let f = g.constant(false);
    let mut ge = vec![f; cap + 1];
    ge[0] = t;

    for (term, w) in &sum.terms {
        let w = *w as usize;
        if w == 0 {
            continue;
        }
        let b = lower(g, term);
        let mut next = ge.clone();
        for v in 1..=cap {
            let prev = if v <= w { t } else { ge[v - w] };
            let add = g.and(&[b, prev]);
            next[v] = g.or(&[ge[v], add]);
        }
        ge = next;
    }

    let ge_at = |v: i64| -> Option<usize> { (v >= 0 && v as usize <= cap).then_some(v as usize) };

    let mut parts = Vec::new();

    // sum ≤ rhs: sum ≥ v implies rhs ≥ v.
    for v in 0..=cap {
        let fits = lower_le(g, &(LinExpr::constant(v as i64) - sum.rhs.clone()));
        let over = g.not(ge[v]);
        parts.push(g.or(&[over, fits]));
    }

    if sum.cmp == SumCmp::Eq {
        // sum ≥ rhs: rhs ≥ v implies sum ≥ v.
        for v in 1..=rhs_ub {
            let reached = match ge_at(v) {
                Some(i) => ge[i],
                None => f,
            };
            let needs = lower_le(g, &(LinExpr::constant(v) - sum.rhs.clone()));
            let no_need = g.not(needs);
            parts.push(g.or(&[no_need, reached]));
        }
    }

    g.and(&parts)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use test_log::test;

    use crate::constraint::{Assignment, ConstraintSet};
    use crate::types::IntVar;

    /// Evaluates gates directly on a fixed assignment.
    pub(crate) struct Evaluator<'a> {
        pub set: &'a ConstraintSet,
        pub assignment: &'a Assignment,
        pub required: bool,
    }

    impl Gates for Evaluator<'_> {
        type Sig = bool;

        fn constant(&mut self, value: bool) -> bool {
            value
        }
        fn var(&mut self, v: BoolVar) -> bool {
            self.assignment.bool(v)
        }
        fn not(&mut self, a: bool) -> bool {
            !a
        }
        fn and(&mut self, xs: &[bool]) -> bool {
            xs.iter().all(|&x| x)
        }
        fn or(&mut self, xs: &[bool]) -> bool {
            xs.iter().any(|&x| x)
        }
        fn le(&mut self, e: &LinExpr) -> bool {
            e.eval(self.assignment) <= 0
        }
        fn bounds(&self, e: &LinExpr) -> (i64, i64) {
            self.set.bounds(e)
        }
        fn require(&mut self, a: bool) {
            self.required &= a;
        }
    }

    fn sum_matches(terms: Vec<(Formula, i64)>, rhs: IntVar, set: &ConstraintSet) {
        let nb = set.num_bools();
        let d = set.domain(rhs);
        for mask in 0..1u32 << nb {
            for r in d.lb..=d.ub {
                let mut a = Assignment::for_set(set);
                for i in 0..nb {
                    a.set_bool(BoolVar::new(i as u32), mask >> i & 1 == 1);
                }
                a.set_int(rhs, r);
                for f in [
                    Formula::sum_le(terms.clone(), rhs),
                    Formula::sum_eq(terms.clone(), rhs),
                ] {
                    let mut ev = Evaluator {
                        set,
                        assignment: &a,
                        required: true,
                    };
                    assert_eq!(lower(&mut ev, &f), f.eval(&a), "mask = {:b}, rhs = {}", mask, r);
                }
            }
        }
    }

    #[test]
    fn test_sum_counter() {
        let mut set = ConstraintSet::new();
        let b: Vec<Formula> = (0..3).map(|i| Formula::Var(set.new_bool(format!("b{}", i)))).collect();
        let rhs = set.new_int("rhs", 0, 6);
        let terms = vec![(b[0].clone(), 2), (b[1].clone(), 3), (b[2].clone(), 1)];
        sum_matches(terms, rhs, &set);
    }

    #[test]
    fn test_sum_counter_saturates() {
        let mut set = ConstraintSet::new();
        let b: Vec<Formula> = (0..3).map(|i| Formula::Var(set.new_bool(format!("b{}", i)))).collect();
        let rhs = set.new_int("rhs", 1, 2);
        let terms = vec![(b[0].clone(), 2), (b[1].clone(), 2), (b[2].clone(), 1)];
        sum_matches(terms, rhs, &set);
    }

    #[test]
    fn test_assert_splits_conjunctions() {
        let mut set = ConstraintSet::new();
        let x = set.new_int("x", 0, 3);
        let a = Assignment::for_set(&set);
        let mut ev = Evaluator {
            set: &set,
            assignment: &a,
            required: true,
        };
        assert_formula(&mut ev, &Formula::and([Formula::le(x, 2), Formula::truth()]));
        assert!(ev.required);
        assert_formula(&mut ev, &Formula::ge(x, 4));
        assert!(!ev.required);
    }
}
