//! Clausal form of a constraint set.
//!
//! Boolean variables take propositional variables `1..=num_bools`, the order
//! encoding of the integers follows, and Tseitin auxiliaries come last.

use log::debug;

use crate::constraint::{Assignment, ConstraintSet, Domain};
use crate::formula::LinExpr;
use crate::types::{BoolVar, IntVar, Lit};

use super::lower::{assert_formula, Gates, Signal};
use super::order::OrderEncoding;

pub(crate) struct Cnf {
    num_bools: usize,
    num_ints: usize,
    order: OrderEncoding,
    num_vars: u32,
    clauses: Vec<Vec<Lit>>,
    unsat: bool,
}

impl Cnf {
    /// Translates every assertion of `set`.
    pub(crate) fn from_set(set: &ConstraintSet) -> Self {
        let order = OrderEncoding::new(set, set.num_bools() as u32 + 1);
        let mut cnf = Self {
            num_bools: set.num_bools(),
            num_ints: set.num_ints(),
            num_vars: order.next_var() - 1,
            unsat: order.has_empty_domain(),
            clauses: Vec::new(),
            order,
        };
        for clause in cnf.order.axioms() {
            cnf.add_clause(clause);
        }
        for f in set.assertions() {
            assert_formula(&mut cnf, f);
        }
        debug!(
            "cnf: {} variables ({} order), {} clauses{}",
            cnf.num_vars,
            cnf.order.num_vars(),
            cnf.clauses.len(),
            if cnf.unsat { ", trivially unsat" } else { "" }
        );
        cnf
    }

    pub(crate) fn is_trivially_unsat(&self) -> bool {
        self.unsat
    }

    pub(crate) fn num_vars(&self) -> u32 {
        self.num_vars
    }

    /// Clauses in DIMACS convention.
    pub(crate) fn to_dimacs(&self) -> Vec<Vec<i32>> {
        self.clauses
            .iter()
            .map(|c| c.iter().map(|l| l.to_dimacs()).collect())
            .collect()
    }

    /// Clauses in DIMACS convention, with unit clauses for the extra signals.
    pub(crate) fn to_dimacs_with(&self, extra: &[Signal]) -> Option<Vec<Vec<i32>>> {
        let mut clauses = self.to_dimacs();
        for s in extra {
            match *s {
                Signal::Const(true) => {}
                Signal::Const(false) => return None,
                Signal::Lit(l) => clauses.push(vec![l.to_dimacs()]),
            }
        }
        Some(clauses)
    }

    pub(crate) fn domain(&self, x: IntVar) -> Domain {
        self.order.domain(x)
    }

    /// `x ≤ b` as a signal.
    pub(crate) fn le_signal(&self, x: IntVar, b: i64) -> Signal {
        self.order.le(x, b)
    }

    /// Reads an assignment back from a DIMACS model (`model[v - 1]` is the sign
    /// of variable `v`; missing variables are false).
    pub(crate) fn decode(&self, model: &[i32]) -> Assignment {
        let holds = |lit: Lit| {
            let value = model
                .get(lit.var() as usize - 1)
                .is_some_and(|&v| v > 0);
            value == lit.is_positive()
        };
        let mut a = Assignment::new(self.num_bools, self.num_ints);
        for i in 0..self.num_bools {
            a.set_bool(BoolVar::new(i as u32), holds(Lit::positive(i as u32 + 1)));
        }
        for i in 0..self.num_ints {
            let x = IntVar::new(i as u32);
            a.set_int(x, self.order.value(x, holds));
        }
        a
    }

    fn new_var(&mut self) -> Lit {
        self.num_vars += 1;
        Lit::positive(self.num_vars)
    }

    fn add_clause(&mut self, clause: Vec<Lit>) {
        if clause.is_empty() {
            self.unsat = true;
        } else {
            self.clauses.push(clause);
        }
    }

    /// Adds the clause over signals, dropping it if some signal is true.
    fn add_signals(&mut self, signals: &[Signal]) {
        let mut clause = Vec::with_capacity(signals.len());
        for &s in signals {
            match s {
                Signal::Const(true) => return,
                Signal::Const(false) => {}
                Signal::Lit(l) => clause.push(l),
            }
        }
        clause.sort_by_key(|l| (l.var(), l.is_positive()));
        clause.dedup();
        if clause.windows(2).any(|w| w[0] == -w[1]) {
            return;
        }
        self.add_clause(clause);
    }
}

impl Gates for Cnf {
    type Sig = Signal;

    fn constant(&mut self, value: bool) -> Signal {
        Signal::Const(value)
    }

    fn var(&mut self, v: BoolVar) -> Signal {
        Signal::Lit(Lit::positive(v.index() as u32 + 1))
    }

    fn not(&mut self, a: Signal) -> Signal {
        a.negate()
    }

    fn and(&mut self, xs: &[Signal]) -> Signal {
        let negated: Vec<Signal> = xs.iter().map(|s| s.negate()).collect();
        self.or(&negated).negate()
    }

    fn or(&mut self, xs: &[Signal]) -> Signal {
        let mut lits: Vec<Lit> = Vec::with_capacity(xs.len());
        for &s in xs {
            match s {
                Signal::Const(true) => return Signal::Const(true),
                Signal::Const(false) => {}
                Signal::Lit(l) => lits.push(l),
            }
        }
        lits.sort_by_key(|l| (l.var(), l.is_positive()));
        lits.dedup();
        match lits[..] {
            [] => return Signal::Const(false),
            [l] => return Signal::Lit(l),
            _ => {}
        }
        if lits.windows(2).any(|w| w[0] == -w[1]) {
            return Signal::Const(true);
        }

        // r ⇔ (l₁ ∨ … ∨ lₙ)
        let r = self.new_var();
        for &l in &lits {
            self.add_clause(vec![-l, r]);
        }
        let mut clause = lits;
        clause.push(-r);
        self.add_clause(clause);
        Signal::Lit(r)
    }

    fn le(&mut self, e: &LinExpr) -> Signal {
        if let Some(s) = self.order.atom(e) {
            return s;
        }
        // r ⇒ e ≤ 0 and ¬r ⇒ e ≥ 1
        let r = self.new_var();
        for clause in self.order.encode_le(e, &[-r]) {
            self.add_clause(clause);
        }
        let negated = -e.clone() + 1;
        for clause in self.order.encode_le(&negated, &[r]) {
            self.add_clause(clause);
        }
        Signal::Lit(r)
    }

    fn bounds(&self, e: &LinExpr) -> (i64, i64) {
        self.order.bounds(e)
    }

    fn require(&mut self, a: Signal) {
        self.add_signals(&[a]);
    }

    fn require_le(&mut self, e: &LinExpr) {
        for clause in self.order.encode_le(e, &[]) {
            self.add_clause(clause);
        }
    }

    fn require_any(&mut self, xs: &[Signal]) {
        self.add_signals(xs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::formula::Formula;

    #[test]
    fn test_variable_layout() {
        let mut set = ConstraintSet::new();
        let a = set.new_bool("a");
        let _x = set.new_int("x", 0, 3);
        set.assert(Formula::Var(a));
        let cnf = Cnf::from_set(&set);
        // One boolean and three order variables, no auxiliaries.
        assert_eq!(cnf.num_vars(), 4);
        assert!(cnf.to_dimacs().contains(&vec![1]));
        // Two chaining axioms plus the unit clause.
        assert_eq!(cnf.to_dimacs().len(), 3);
    }

    #[test]
    fn test_trivially_unsat() {
        let mut set = ConstraintSet::new();
        let x = set.new_int("x", 0, 3);
        set.assert(Formula::ge(x, 5));
        assert!(Cnf::from_set(&set).is_trivially_unsat());

        let mut set = ConstraintSet::new();
        set.new_int("y", 2, 1);
        assert!(Cnf::from_set(&set).is_trivially_unsat());
    }

    #[test]
    fn test_decode() {
        let mut set = ConstraintSet::new();
        let a = set.new_bool("a");
        let x = set.new_int("x", 2, 5);
        let cnf = Cnf::from_set(&set);
        // a = true; x ≤ 2 false, x ≤ 3 false, x ≤ 4 true
        let assignment = cnf.decode(&[1, -2, -3, 4]);
        assert!(assignment.bool(a));
        assert_eq!(assignment.int(x), 4);
        // A short model leaves everything false: x at its upper bound.
        let assignment = cnf.decode(&[]);
        assert!(!assignment.bool(a));
        assert_eq!(assignment.int(x), 5);
    }

    #[test]
    fn test_or_simplifies() {
        let mut set = ConstraintSet::new();
        let a = set.new_bool("a");
        let mut cnf = Cnf::from_set(&set);
        let la = cnf.var(a);
        assert_eq!(cnf.or(&[la, la.negate()]), Signal::Const(true));
        assert_eq!(cnf.or(&[la, Signal::Const(false)]), la);
        assert_eq!(cnf.and(&[la, Signal::Const(false)]), Signal::Const(false));
        assert_eq!(cnf.num_vars(), 1);
    }
}
