//! The constraint set: variable arenas plus an append-only list of assertions.

use std::fmt;

use crate::formula::{Formula, LinExpr};
use crate::types::{BoolVar, IntVar};

/// Inclusive integer domain `[lb, ub]`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Domain {
    pub lb: i64,
    pub ub: i64,
}

impl Domain {
    pub fn new(lb: i64, ub: i64) -> Self {
        Self { lb, ub }
    }

    pub fn is_empty(&self) -> bool {
        self.lb > self.ub
    }

    pub fn is_fixed(&self) -> bool {
        self.lb == self.ub
    }

    pub fn contains(&self, value: i64) -> bool {
        self.lb <= value && value <= self.ub
    }

    /// Number of values in the domain.
    pub fn size(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            (self.ub - self.lb) as u64 + 1
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}]", self.lb, self.ub)
    }
}

/// An accumulating collection of assertions over decision variables.
///
/// Variables are allocated through the set and referred to by index. The set is
/// built by an encoder and then moved into an oracle.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    bools: Vec<String>,
    ints: Vec<(String, Domain)>,
    assertions: Vec<Formula>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh boolean variable. The label is only used for debugging.
    pub fn new_bool(&mut self, label: impl Into<String>) -> BoolVar {
        let v = BoolVar::new(self.bools.len() as u32);
        self.bools.push(label.into());
        v
    }

    /// Allocates a fresh integer variable with domain `[lb, ub]`.
    pub fn new_int(&mut self, label: impl Into<String>, lb: i64, ub: i64) -> IntVar {
        let v = IntVar::new(self.ints.len() as u32);
        self.ints.push((label.into(), Domain::new(lb, ub)));
        v
    }

    /// Narrows or widens the domain of an existing variable.
    pub fn set_domain(&mut self, x: IntVar, lb: i64, ub: i64) {
        self.ints[x.index()].1 = Domain::new(lb, ub);
    }

    pub fn assert(&mut self, f: Formula) {
        match f {
            Formula::Const(true) => {}
            Formula::And(fs) => {
                for f in fs {
                    self.assert(f);
                }
            }
            f => self.assertions.push(f),
        }
    }

    pub fn num_bools(&self) -> usize {
        self.bools.len()
    }

    pub fn num_ints(&self) -> usize {
        self.ints.len()
    }

    pub fn domain(&self, x: IntVar) -> Domain {
        self.ints[x.index()].1
    }

    pub fn bool_label(&self, v: BoolVar) -> &str {
        &self.bools[v.index()]
    }

    pub fn int_label(&self, x: IntVar) -> &str {
        &self.ints[x.index()].0
    }

    pub fn int_vars(&self) -> impl Iterator<Item = IntVar> + '_ {
        (0..self.ints.len()).map(|i| IntVar::new(i as u32))
    }

    pub fn assertions(&self) -> &[Formula] {
        &self.assertions
    }

    pub fn bounds(&self, e: &LinExpr) -> (i64, i64) {
        e.bounds(|x| {
            let d = self.domain(x);
            (d.lb, d.ub)
        })
    }

    /// Checks that the assignment respects every domain and every assertion.
    pub fn is_satisfied_by(&self, assignment: &Assignment) -> bool {
        self.int_vars().all(|x| self.domain(x).contains(assignment.int(x)))
            && self.assertions.iter().all(|f| f.eval(assignment))
    }
}

/// Values of all decision variables of one constraint set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    bools: Vec<bool>,
    ints: Vec<i64>,
}

impl Assignment {
    /// All-false, all-zero assignment of the given shape.
    pub fn new(num_bools: usize, num_ints: usize) -> Self {
        Self {
            bools: vec![false; num_bools],
            ints: vec![0; num_ints],
        }
    }

    /// Assignment shaped for the given set, with every integer at its lower bound.
    pub fn for_set(set: &ConstraintSet) -> Self {
        Self {
            bools: vec![false; set.num_bools()],
            ints: set.int_vars().map(|x| set.domain(x).lb).collect(),
        }
    }

    pub fn bool(&self, v: BoolVar) -> bool {
        self.bools[v.index()]
    }

    pub fn int(&self, x: IntVar) -> i64 {
        self.ints[x.index()]
    }

    pub fn set_bool(&mut self, v: BoolVar, value: bool) {
        self.bools[v.index()] = value;
    }

    pub fn set_int(&mut self, x: IntVar, value: i64) {
        self.ints[x.index()] = value;
    }
}
