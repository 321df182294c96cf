//! Finite-domain oracle on top of the decision diagram package.
//!
//! Integers are order-encoded exactly as for the clause-based oracles, but
//! every assertion is compiled into one BDD over the boolean and order
//! variables, with no auxiliary variables. The whole solution space is then at
//! hand: satisfiability is a non-zero check, minimization scans the objective
//! bounds upwards, and models can be counted.

use std::time::{Duration, Instant};

use log::{debug, info};
use num_bigint::BigUint;

use crate::bdd::{Bdd, Ref};
use crate::constraint::{Assignment, ConstraintSet};
use crate::error::{ConfigError, Result};
use crate::formula::LinExpr;
use crate::types::{BoolVar, IntVar, Lit};

use super::lower::{assert_formula, Gates, Signal};
use super::order::OrderEncoding;
use super::{OptStatus, SatStatus, SolverOracle};

struct Compiled {
    bdd: Bdd,
    order: OrderEncoding,
    root: Ref,
    num_bools: usize,
    num_ints: usize,
}

impl Compiled {
    fn is_empty(&self) -> bool {
        self.bdd.is_zero(self.root)
    }

    /// One model of `f`, reading variables off a path to the true terminal.
    fn model(&self, f: Ref) -> Option<Assignment> {
        let path = self.bdd.one_sat(f)?;
        let holds = |lit: Lit| {
            let value = path.iter().any(|&l| l.var() == lit.var() && l.is_positive());
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
        Some(a)
    }

    fn num_vars(&self) -> usize {
        self.num_bools + self.order.num_vars() as usize
    }
}

struct BddGates<'a> {
    bdd: &'a Bdd,
    order: &'a OrderEncoding,
    root: Ref,
}

fn signal(bdd: &Bdd, s: Signal) -> Ref {
    match s {
        Signal::Const(b) => bdd.constant(b),
        Signal::Lit(l) => bdd.mk_literal(l.to_dimacs()),
    }
}

impl Gates for BddGates<'_> {
    type Sig = Ref;

    fn constant(&mut self, value: bool) -> Ref {
        self.bdd.constant(value)
    }

    fn var(&mut self, v: BoolVar) -> Ref {
        self.bdd.mk_var(v.index() as u32 + 1)
    }

    fn not(&mut self, a: Ref) -> Ref {
        -a
    }

    fn and(&mut self, xs: &[Ref]) -> Ref {
        self.bdd.apply_and_many(xs.iter().copied())
    }

    fn or(&mut self, xs: &[Ref]) -> Ref {
        self.bdd.apply_or_many(xs.iter().copied())
    }

    fn le(&mut self, e: &LinExpr) -> Ref {
        if let Some(s) = self.order.atom(e) {
            return signal(self.bdd, s);
        }
        let clauses: Vec<Ref> = self
            .order
            .encode_le(e, &[])
            .into_iter()
            .map(|c| self.bdd.mk_clause(c.into_iter().map(Lit::to_dimacs)))
            .collect();
        self.bdd.apply_and_many(clauses)
    }

    fn bounds(&self, e: &LinExpr) -> (i64, i64) {
        self.order.bounds(e)
    }

    fn require(&mut self, a: Ref) {
        self.root = self.bdd.apply_and(self.root, a);
    }
}

/// Compiles the whole set, or gives up at the deadline.
fn compile(set: &ConstraintSet, deadline: Option<Instant>) -> Option<Compiled> {
    let bdd = Bdd::default();
    bdd.set_deadline(deadline);
    let order = OrderEncoding::new(set, set.num_bools() as u32 + 1);

    let root = if order.has_empty_domain() {
        bdd.zero
    } else {
        let axioms: Vec<Ref> = order
            .axioms()
            .into_iter()
            .map(|c| bdd.mk_clause(c.into_iter().map(Lit::to_dimacs)))
            .collect();
        let mut gates = BddGates {
            root: bdd.apply_and_many(axioms),
            bdd: &bdd,
            order: &order,
        };
        for f in set.assertions() {
            if bdd.is_interrupted() {
                debug!("bdd: compilation interrupted, {} nodes", bdd.num_nodes());
                return None;
            }
            if bdd.is_zero(gates.root) {
                break;
            }
            assert_formula(&mut gates, f);
        }
        if bdd.is_interrupted() {
            debug!("bdd: compilation interrupted, {} nodes", bdd.num_nodes());
            return None;
        }
        gates.root
    };
    bdd.set_deadline(None);

    debug!(
        "bdd: compiled {} assertions, {} nodes, root size {}",
        set.assertions().len(),
        bdd.num_nodes(),
        bdd.size(root)
    );
    Some(Compiled {
        bdd,
        order,
        root,
        num_bools: set.num_bools(),
        num_ints: set.num_ints(),
    })
}

/// Oracle that compiles the constraint set into a single decision diagram.
#[derive(Default)]
pub struct FdOracle {
    set: Option<ConstraintSet>,
    compiled: Option<Compiled>,
    model: Option<Assignment>,
}

impl FdOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles the current set if needed. `Ok(false)` on timeout.
    fn ensure_compiled(&mut self, deadline: Option<Instant>) -> Result<bool> {
        if self.compiled.is_some() {
            return Ok(true);
        }
        let set = self.set.as_ref().ok_or(ConfigError::NoConstraints)?;
        self.compiled = compile(set, deadline);
        Ok(self.compiled.is_some())
    }

    /// Number of assignments of the boolean and integer variables satisfying
    /// every assertion.
    pub fn count_models(&mut self) -> Result<BigUint> {
        self.ensure_compiled(None)?;
        Ok(match &self.compiled {
            Some(c) => c.bdd.sat_count(c.root, c.num_vars()),
            None => BigUint::ZERO,
        })
    }
}

impl SolverOracle for FdOracle {
    fn name(&self) -> &'static str {
        "fd"
    }

    fn add_constraints(&mut self, set: ConstraintSet) {
        self.set = Some(set);
        self.compiled = None;
        self.model = None;
    }

    fn check(&mut self, timeout: Duration) -> Result<SatStatus> {
        self.model = None;
        if self.set.is_none() {
            return Err(ConfigError::NoConstraints.into());
        }
        if timeout.is_zero() {
            return Ok(SatStatus::Timeout);
        }
        if !self.ensure_compiled(Some(Instant::now() + timeout))? {
            return Ok(SatStatus::Timeout);
        }
        let Some(c) = &self.compiled else {
            return Ok(SatStatus::Timeout);
        };
        if c.is_empty() {
            return Ok(SatStatus::Unsatisfiable);
        }
        self.model = c.model(c.root);
        Ok(SatStatus::Satisfiable)
    }

    fn supports_minimize(&self) -> bool {
        true
    }

    /// Tries the objective values from its lower bound upwards; the first
    /// value leaving a non-empty diagram is the optimum.
    fn minimize(&mut self, objective: IntVar, timeout: Duration) -> Result<OptStatus> {
        self.model = None;
        if self.set.is_none() {
            return Err(ConfigError::NoConstraints.into());
        }
        if timeout.is_zero() {
            return Ok(OptStatus::Timeout);
        }
        let deadline = Instant::now() + timeout;
        if !self.ensure_compiled(Some(deadline))? {
            return Ok(OptStatus::Timeout);
        }
        let Some(c) = &self.compiled else {
            return Ok(OptStatus::Timeout);
        };
        if c.is_empty() {
            return Ok(OptStatus::Unsatisfiable);
        }

        self.model = c.model(c.root);
        let d = c.order.domain(objective);
        c.bdd.set_deadline(Some(deadline));
        for v in d.lb..=d.ub {
            let bound = signal(&c.bdd, c.order.le(objective, v));
            let g = c.bdd.apply_and(c.root, bound);
            if c.bdd.is_interrupted() {
                c.bdd.set_deadline(None);
                return Ok(OptStatus::Timeout);
            }
            if !c.bdd.is_zero(g) {
                c.bdd.set_deadline(None);
                info!("fd: optimal objective {}", v);
                self.model = c.model(g);
                return Ok(OptStatus::Optimal);
            }
            if Instant::now() >= deadline {
                c.bdd.set_deadline(None);
                return Ok(OptStatus::Timeout);
            }
        }
        // Unreachable for a non-empty diagram: the last bound is the constant true.
        Ok(OptStatus::Optimal)
    }

    fn model(&self) -> Option<&Assignment> {
        self.model.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::formula::Formula;

    const TIMEOUT: Duration = Duration::from_secs(30);

    #[test]
    fn test_check() {
        let mut set = ConstraintSet::new();
        let x = set.new_int("x", 0, 9);
        let y = set.new_int("y", 0, 9);
        set.assert(Formula::eq(x + y, 12));
        set.assert(Formula::lt(x, y));
        let reference = set.clone();

        let mut oracle = FdOracle::new();
        oracle.add_constraints(set);
        assert_eq!(oracle.check(TIMEOUT).unwrap(), SatStatus::Satisfiable);
        assert!(reference.is_satisfied_by(oracle.model().unwrap()));
    }

    #[test]
    fn test_check_unsat() {
        let mut set = ConstraintSet::new();
        let a = set.new_bool("a");
        let x = set.new_int("x", 0, 3);
        set.assert(Formula::implies(a, Formula::ge(x, 2)));
        set.assert(Formula::implies(Formula::not(a), Formula::ge(x, 2)));
        set.assert(Formula::le(x, 1));

        let mut oracle = FdOracle::new();
        oracle.add_constraints(set);
        assert_eq!(oracle.check(TIMEOUT).unwrap(), SatStatus::Unsatisfiable);
        assert!(oracle.model().is_none());
    }

    #[test]
    fn test_count_models() {
        let mut set = ConstraintSet::new();
        let a = set.new_bool("a");
        let x = set.new_int("x", 0, 3);
        let y = set.new_int("y", 0, 3);
        set.assert(Formula::le(x + y, 3));
        set.assert(Formula::implies(a, Formula::eq(x, y)));

        let mut oracle = FdOracle::new();
        oracle.add_constraints(set);
        // Ten pairs with x + y ≤ 3 when a is false, two of them with x = y.
        assert_eq!(oracle.count_models().unwrap(), BigUint::from(12u32));
    }

    #[test]
    fn test_count_empty_domain() {
        let mut set = ConstraintSet::new();
        set.new_int("x", 3, 2);
        let mut oracle = FdOracle::new();
        oracle.add_constraints(set);
        assert_eq!(oracle.count_models().unwrap(), BigUint::ZERO);
    }

    #[test]
    fn test_minimize() {
        let mut set = ConstraintSet::new();
        let x = set.new_int("x", 0, 20);
        let y = set.new_int("y", 0, 20);
        set.assert(Formula::ge(x + y, 7));
        set.assert(Formula::le(y, 3));
        let mut oracle = FdOracle::new();
        oracle.add_constraints(set);
        assert_eq!(oracle.minimize(x, TIMEOUT).unwrap(), OptStatus::Optimal);
        assert_eq!(oracle.model().unwrap().int(x), 4);
    }

    #[test]
    fn test_compilation_keeps_to_the_timeout() {
        // Sixteen pairwise distinct values in [0, 15]: the permutation diagram
        // takes far longer than the timeout to build.
        let mut set = ConstraintSet::new();
        let xs: Vec<IntVar> = (0..16).map(|i| set.new_int(format!("x{}", i), 0, 15)).collect();
        for (i, &a) in xs.iter().enumerate() {
            for &b in &xs[i + 1..] {
                set.assert(Formula::or([Formula::lt(a, b), Formula::lt(b, a)]));
            }
        }

        let mut oracle = FdOracle::new();
        oracle.add_constraints(set);
        let start = Instant::now();
        assert_eq!(oracle.check(Duration::from_millis(100)).unwrap(), SatStatus::Timeout);
        assert!(start.elapsed() < Duration::from_secs(5), "{:?}", start.elapsed());
        assert!(oracle.model().is_none());
    }

    #[test]
    fn test_replaces_constraints() {
        let mut set = ConstraintSet::new();
        let x = set.new_int("x", 0, 3);
        set.assert(Formula::ge(x, 5));
        let mut oracle = FdOracle::new();
        oracle.add_constraints(set);
        assert_eq!(oracle.check(TIMEOUT).unwrap(), SatStatus::Unsatisfiable);

        let mut set = ConstraintSet::new();
        set.new_int("x", 0, 3);
        oracle.add_constraints(set);
        assert_eq!(oracle.check(TIMEOUT).unwrap(), SatStatus::Satisfiable);
    }
}
