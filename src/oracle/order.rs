//! Order encoding of bounded integers.
//!
//! An integer `x ∈ [lb, ub]` gets one propositional variable `p(x ≤ b)` per
//! `b ∈ [lb, ub)`, chained by the axioms `p(x ≤ b) → p(x ≤ b+1)`. A linear
//! comparison `Σ aᵢ·xᵢ ≤ c` then becomes a set of clauses over these variables,
//! obtained by enumerating the values of all but the last term.

use crate::constraint::{ConstraintSet, Domain};
use crate::formula::LinExpr;
use crate::types::{IntVar, Lit};

use super::Signal;

pub(crate) struct OrderEncoding {
    domains: Vec<Domain>,
    /// First propositional variable of each integer (meaningful for non-fixed domains).
    base: Vec<u32>,
    first: u32,
    next: u32,
}

impl OrderEncoding {
    /// Allocates the order variables of every integer of `set`, starting from
    /// propositional variable `first` (1-indexed).
    pub(crate) fn new(set: &ConstraintSet, first: u32) -> Self {
        let mut domains = Vec::with_capacity(set.num_ints());
        let mut base = Vec::with_capacity(set.num_ints());
        let mut next = first;
        for x in set.int_vars() {
            let d = set.domain(x);
            domains.push(d);
            base.push(next);
            if !d.is_empty() {
                next += (d.ub - d.lb) as u32;
            }
        }
        Self {
            domains,
            base,
            first,
            next,
        }
    }

    /// Number of propositional variables used.
    pub(crate) fn num_vars(&self) -> u32 {
        self.next - self.first
    }

    /// First variable not used by the encoding.
    pub(crate) fn next_var(&self) -> u32 {
        self.next
    }

    /// Whether some integer has an empty domain.
    pub(crate) fn has_empty_domain(&self) -> bool {
        self.domains.iter().any(Domain::is_empty)
    }

    pub(crate) fn domain(&self, x: IntVar) -> Domain {
        self.domains[x.index()]
    }

    pub(crate) fn bounds(&self, e: &LinExpr) -> (i64, i64) {
        e.bounds(|x| {
            let d = self.domain(x);
            (d.lb, d.ub)
        })
    }

    /// `x ≤ b`
    pub(crate) fn le(&self, x: IntVar, b: i64) -> Signal {
        let d = self.domain(x);
        if b < d.lb {
            Signal::Const(false)
        } else if b >= d.ub {
            Signal::Const(true)
        } else {
            Signal::Lit(Lit::positive(self.base[x.index()] + (b - d.lb) as u32))
        }
    }

    /// `p(x ≤ b) → p(x ≤ b+1)` for every integer.
    pub(crate) fn axioms(&self) -> Vec<Vec<Lit>> {
        let mut clauses = Vec::new();
        for (i, d) in self.domains.iter().enumerate() {
            if d.is_empty() {
                continue;
            }
            let base = self.base[i];
            for k in 1..(d.ub - d.lb) as u32 {
                clauses.push(vec![-Lit::positive(base + k - 1), Lit::positive(base + k)]);
            }
        }
        clauses
    }

    /// Value of `x` under a model of the order variables: the smallest `b`
    /// with `x ≤ b` true.
    pub(crate) fn value(&self, x: IntVar, model: impl Fn(Lit) -> bool) -> i64 {
        let d = self.domain(x);
        for b in d.lb..d.ub {
            if let Signal::Lit(lit) = self.le(x, b) {
                if model(lit) {
                    return b;
                }
            }
        }
        d.ub
    }

    /// Direct signal for `e ≤ 0` when `e` has at most one non-fixed variable.
    pub(crate) fn atom(&self, e: &LinExpr) -> Option<Signal> {
        let (terms, c) = self.normalize(e);
        match terms[..] {
            [] => Some(Signal::Const(c >= 0)),
            [(a, x)] => Some(self.single(a, x, c)),
            _ => None,
        }
    }

    /// Clauses for `e ≤ 0`, each extended with the `prefix` literals.
    ///
    /// Satisfied clauses are dropped and false literals removed, so an empty
    /// clause in the result means the constraint cannot hold.
    pub(crate) fn encode_le(&self, e: &LinExpr, prefix: &[Lit]) -> Vec<Vec<Lit>> {
        let (terms, c) = self.normalize(e);
        let mut clause: Vec<Signal> = prefix.iter().map(|&l| Signal::Lit(l)).collect();
        let mut out = Vec::new();
        self.encode_rec(&terms, c, &mut clause, &mut out);
        out
    }

    /// Folds fixed variables into the constant and sorts the remaining terms by
    /// domain size, largest last. Returns the terms and `c` in `Σ aᵢ·xᵢ ≤ c`.
    fn normalize(&self, e: &LinExpr) -> (Vec<(i64, IntVar)>, i64) {
        let mut c = -e.constant_part();
        let mut terms = Vec::with_capacity(e.terms().len());
        for &(a, x) in e.terms() {
            let d = self.domain(x);
            if d.is_fixed() {
                c -= a * d.lb;
            } else {
                terms.push((a, x));
            }
        }
        terms.sort_by_key(|&(_, x)| self.domain(x).size());
        (terms, c)
    }

    /// `a·x ≤ c`
    fn single(&self, a: i64, x: IntVar, c: i64) -> Signal {
        if a > 0 {
            self.le(x, floor_div(c, a))
        } else {
            // x ≥ ceil(c / a)
            self.le(x, ceil_div(c, a) - 1).negate()
        }
    }

    fn encode_rec(
        &self,
        terms: &[(i64, IntVar)],
        c: i64,
        clause: &mut Vec<Signal>,
        out: &mut Vec<Vec<Lit>>,
    ) {
        if clause.contains(&Signal::Const(true)) {
            return;
        }

        let Some((&(a, x), rest)) = terms.split_last() else {
            if c < 0 {
                emit(clause, out);
            }
            return;
        };

        if rest.is_empty() {
            clause.push(self.single(a, x, c));
            emit(clause, out);
            clause.pop();
            return;
        }

        let d = self.domain(x);
        let rest_lb: i64 = rest
            .iter()
            .map(|&(a, y)| {
                let dy = self.domain(y);
                if a > 0 {
                    a * dy.lb
                } else {
                    a * dy.ub
                }
            })
            .sum();

        if a > 0 {
            // x ≥ b implies Σ rest ≤ c - a·b
            let ub0 = floor_div(c - rest_lb, a);
            for b in d.lb..=d.ub.min(ub0) {
                clause.push(self.le(x, b - 1));
                self.encode_rec(rest, c - a * b, clause, out);
                clause.pop();
            }
            if d.ub > ub0 {
                clause.push(self.le(x, ub0));
                emit(clause, out);
                clause.pop();
            }
        } else {
            // x ≤ b implies Σ rest ≤ c - a·b
            let lb0 = ceil_div(c - rest_lb, a);
            if d.lb < lb0 {
                clause.push(self.le(x, lb0 - 1).negate());
                emit(clause, out);
                clause.pop();
            }
            for b in d.lb.max(lb0)..=d.ub {
                clause.push(self.le(x, b).negate());
                self.encode_rec(rest, c - a * b, clause, out);
                clause.pop();
            }
        }
    }
}

fn emit(clause: &[Signal], out: &mut Vec<Vec<Lit>>) {
    let mut lits = Vec::with_capacity(clause.len());
    for &s in clause {
        match s {
            Signal::Const(true) => return,
            Signal::Const(false) => {}
            Signal::Lit(l) => lits.push(l),
        }
    }
    out.push(lits);
}

pub(crate) fn floor_div(a: i64, b: i64) -> i64 {
    let (a, b) = if b < 0 { (-a, -b) } else { (a, b) };
    a.div_euclid(b)
}

pub(crate) fn ceil_div(a: i64, b: i64) -> i64 {
    -floor_div(-a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::constraint::Assignment;
    use crate::formula::Formula;

    #[test]
    fn test_division() {
        assert_eq!(floor_div(7, 2), 3);
        assert_eq!(floor_div(-7, 2), -4);
        assert_eq!(floor_div(7, -2), -4);
        assert_eq!(floor_div(-7, -2), 3);
        assert_eq!(ceil_div(7, 2), 4);
        assert_eq!(ceil_div(-7, 2), -3);
        assert_eq!(ceil_div(7, -2), -3);
        assert_eq!(ceil_div(6, 3), 2);
    }

    #[test]
    fn test_literals() {
        let mut set = ConstraintSet::new();
        let x = set.new_int("x", 2, 5);
        let y = set.new_int("y", 7, 7);
        let enc = OrderEncoding::new(&set, 1);

        assert_eq!(enc.num_vars(), 3);
        assert_eq!(enc.le(x, 1), Signal::Const(false));
        assert_eq!(enc.le(x, 2), Signal::Lit(Lit::positive(1)));
        assert_eq!(enc.le(x, 4), Signal::Lit(Lit::positive(3)));
        assert_eq!(enc.le(x, 5), Signal::Const(true));
        assert_eq!(enc.le(y, 7), Signal::Const(true));
        assert_eq!(enc.axioms().len(), 2);
    }

    #[test]
    fn test_atom() {
        let mut set = ConstraintSet::new();
        let x = set.new_int("x", 0, 9);
        let w = set.new_int("w", 3, 3);
        let enc = OrderEncoding::new(&set, 1);

        // x + w ≤ 9  <=>  x ≤ 6
        assert_eq!(enc.atom(&(x + w - 9)), Some(enc.le(x, 6)));
        // 4 ≤ x  <=>  ¬(x ≤ 3)
        let e = LinExpr::constant(4) - x;
        assert_eq!(enc.atom(&e), Some(enc.le(x, 3).negate()));
        // 2x ≤ 5  <=>  x ≤ 2
        assert_eq!(enc.atom(&(LinExpr::var(x) * 2 - 5)), Some(enc.le(x, 2)));
        assert_eq!(enc.atom(&(LinExpr::var(w) - 3)), Some(Signal::Const(true)));
    }

    /// Brute force: a value pair satisfies `e ≤ 0` iff the induced order
    /// literals satisfy every clause.
    fn check_exhaustive(e: LinExpr, set: &ConstraintSet, x: IntVar, y: IntVar) {
        let enc = OrderEncoding::new(set, 1);
        let clauses = enc.encode_le(&e, &[]);
        let dx = set.domain(x);
        let dy = set.domain(y);
        for vx in dx.lb..=dx.ub {
            for vy in dy.lb..=dy.ub {
                let mut a = Assignment::for_set(set);
                a.set_int(x, vx);
                a.set_int(y, vy);
                let expected = Formula::Le(e.clone()).eval(&a);
                let holds = |lit: Lit| -> bool {
                    let var = lit.var();
                    let (z, b) = if var <= (dx.ub - dx.lb) as u32 {
                        (vx, dx.lb + var as i64 - 1)
                    } else {
                        (vy, dy.lb + (var - (dx.ub - dx.lb) as u32) as i64 - 1)
                    };
                    (z <= b) == lit.is_positive()
                };
                let actual = clauses.iter().all(|c| c.iter().any(|&l| holds(l)));
                assert_eq!(actual, expected, "x = {}, y = {}", vx, vy);
            }
        }
    }

    #[test]
    fn test_encode_le_positive() {
        let mut set = ConstraintSet::new();
        let x = set.new_int("x", 0, 4);
        let y = set.new_int("y", 1, 5);
        check_exhaustive(x + y - 5, &set, x, y);
    }

    #[test]
    fn test_encode_le_mixed() {
        let mut set = ConstraintSet::new();
        let x = set.new_int("x", 0, 4);
        let y = set.new_int("y", 1, 5);
        check_exhaustive(LinExpr::var(x) * 2 - y + 1, &set, x, y);
        check_exhaustive(y - x, &set, x, y);
    }

    #[test]
    fn test_encode_le_infeasible() {
        let mut set = ConstraintSet::new();
        let x = set.new_int("x", 3, 4);
        let y = set.new_int("y", 3, 5);
        let enc = OrderEncoding::new(&set, 1);
        let clauses = enc.encode_le(&(x + y - 5), &[]);
        assert!(clauses.iter().any(Vec::is_empty));
    }
}
