//! Formulas over boolean and bounded integer decision variables.
//!
//! The language is deliberately small: boolean connectives, linear comparisons
//! `Σ aᵢ·xᵢ + c ≤ 0`, and weighted sums of formulas compared against a linear
//! expression. Everything the packing encoders need is expressible with it, and
//! every oracle lowers the same three kinds of atoms.

use std::collections::BTreeMap;
use std::ops::{Add, Mul, Neg, Sub};

use crate::constraint::Assignment;
use crate::types::{BoolVar, IntVar};

/// A linear integer expression `Σ aᵢ·xᵢ + c`.
///
/// Terms are kept sorted by variable with non-zero coefficients, so two equal
/// expressions are structurally equal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinExpr {
    terms: Vec<(i64, IntVar)>,
    constant: i64,
}

impl LinExpr {
    pub fn constant(c: i64) -> Self {
        Self {
            terms: Vec::new(),
            constant: c,
        }
    }

    pub fn var(x: IntVar) -> Self {
        Self {
            terms: vec![(1, x)],
            constant: 0,
        }
    }

    pub fn terms(&self) -> &[(i64, IntVar)] {
        &self.terms
    }

    pub fn constant_part(&self) -> i64 {
        self.constant
    }

    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Bounds of the expression, given the domain of every variable.
    pub fn bounds(&self, domain: impl Fn(IntVar) -> (i64, i64)) -> (i64, i64) {
        let mut lo = self.constant;
        let mut hi = self.constant;
        for &(a, x) in &self.terms {
            let (lb, ub) = domain(x);
            if a > 0 {
                lo += a * lb;
                hi += a * ub;
            } else {
                lo += a * ub;
                hi += a * lb;
            }
        }
        (lo, hi)
    }

    pub fn eval(&self, assignment: &Assignment) -> i64 {
        self.terms
            .iter()
            .map(|&(a, x)| a * assignment.int(x))
            .sum::<i64>()
            + self.constant
    }

    fn from_map(map: BTreeMap<IntVar, i64>, constant: i64) -> Self {
        Self {
            terms: map.into_iter().filter(|&(_, a)| a != 0).map(|(x, a)| (a, x)).collect(),
            constant,
        }
    }

    fn combine(self, rhs: Self, sign: i64) -> Self {
        let mut map = BTreeMap::new();
        for (a, x) in self.terms {
            *map.entry(x).or_insert(0) += a;
        }
        for (a, x) in rhs.terms {
            *map.entry(x).or_insert(0) += sign * a;
        }
        Self::from_map(map, self.constant + sign * rhs.constant)
    }
}

impl From<IntVar> for LinExpr {
    fn from(x: IntVar) -> Self {
        LinExpr::var(x)
    }
}

impl From<i64> for LinExpr {
    fn from(c: i64) -> Self {
        LinExpr::constant(c)
    }
}

impl From<i32> for LinExpr {
    fn from(c: i32) -> Self {
        LinExpr::constant(c as i64)
    }
}

impl From<u32> for LinExpr {
    fn from(c: u32) -> Self {
        LinExpr::constant(c as i64)
    }
}

impl<T: Into<LinExpr>> Add<T> for LinExpr {
    type Output = LinExpr;

    fn add(self, rhs: T) -> Self::Output {
        self.combine(rhs.into(), 1)
    }
}

impl<T: Into<LinExpr>> Sub<T> for LinExpr {
    type Output = LinExpr;

    fn sub(self, rhs: T) -> Self::Output {
        self.combine(rhs.into(), -1)
    }
}

impl<T: Into<LinExpr>> Add<T> for IntVar {
    type Output = LinExpr;

    fn add(self, rhs: T) -> Self::Output {
        LinExpr::var(self) + rhs
    }
}

impl<T: Into<LinExpr>> Sub<T> for IntVar {
    type Output = LinExpr;

    fn sub(self, rhs: T) -> Self::Output {
        LinExpr::var(self) - rhs
    }
}

impl Mul<i64> for LinExpr {
    type Output = LinExpr;

    fn mul(self, k: i64) -> Self::Output {
        Self {
            terms: if k == 0 {
                Vec::new()
            } else {
                self.terms.into_iter().map(|(a, x)| (a * k, x)).collect()
            },
            constant: self.constant * k,
        }
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;

    fn neg(self) -> Self::Output {
        self * -1
    }
}

/// Comparison of a weighted sum against its right-hand side.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SumCmp {
    Le,
    Eq,
}

/// `Σ wₖ·[fₖ] (≤ | =) rhs`, with non-negative weights.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSum {
    pub terms: Vec<(Formula, i64)>,
    pub cmp: SumCmp,
    pub rhs: LinExpr,
}

/// A boolean formula over decision variables.
#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    Const(bool),
    Var(BoolVar),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    Iff(Box<Formula>, Box<Formula>),
    /// `expr ≤ 0`.
    Le(LinExpr),
    Sum(Box<WeightedSum>),
}

impl From<BoolVar> for Formula {
    fn from(v: BoolVar) -> Self {
        Formula::Var(v)
    }
}

impl Formula {
    pub fn truth() -> Self {
        Formula::Const(true)
    }

    pub fn falsity() -> Self {
        Formula::Const(false)
    }

    pub fn not(f: impl Into<Formula>) -> Self {
        match f.into() {
            Formula::Const(b) => Formula::Const(!b),
            Formula::Not(inner) => *inner,
            f => Formula::Not(Box::new(f)),
        }
    }

    pub fn and(fs: impl IntoIterator<Item = Formula>) -> Self {
        Formula::And(fs.into_iter().collect())
    }

    pub fn or(fs: impl IntoIterator<Item = Formula>) -> Self {
        Formula::Or(fs.into_iter().collect())
    }

    pub fn implies(lhs: impl Into<Formula>, rhs: impl Into<Formula>) -> Self {
        Formula::Implies(Box::new(lhs.into()), Box::new(rhs.into()))
    }

    pub fn iff(lhs: impl Into<Formula>, rhs: impl Into<Formula>) -> Self {
        Formula::Iff(Box::new(lhs.into()), Box::new(rhs.into()))
    }

    /// `lhs ≤ rhs`
    pub fn le(lhs: impl Into<LinExpr>, rhs: impl Into<LinExpr>) -> Self {
        let lhs: LinExpr = lhs.into();
        Formula::Le(lhs - rhs)
    }

    /// `lhs < rhs`
    pub fn lt(lhs: impl Into<LinExpr>, rhs: impl Into<LinExpr>) -> Self {
        let lhs: LinExpr = lhs.into();
        Formula::Le(lhs - rhs + 1)
    }

    /// `lhs ≥ rhs`
    pub fn ge(lhs: impl Into<LinExpr>, rhs: impl Into<LinExpr>) -> Self {
        Formula::le(rhs, lhs)
    }

    /// `lhs = rhs`
    pub fn eq(lhs: impl Into<LinExpr>, rhs: impl Into<LinExpr>) -> Self {
        let lhs: LinExpr = lhs.into();
        let rhs: LinExpr = rhs.into();
        Formula::And(vec![Formula::Le(lhs.clone() - rhs.clone()), Formula::Le(rhs - lhs)])
    }

    /// `Σ wₖ·[fₖ] ≤ rhs`
    pub fn sum_le(terms: Vec<(Formula, i64)>, rhs: impl Into<LinExpr>) -> Self {
        Self::sum(terms, SumCmp::Le, rhs.into())
    }

    /// `Σ wₖ·[fₖ] = rhs`
    pub fn sum_eq(terms: Vec<(Formula, i64)>, rhs: impl Into<LinExpr>) -> Self {
        Self::sum(terms, SumCmp::Eq, rhs.into())
    }

    fn sum(terms: Vec<(Formula, i64)>, cmp: SumCmp, rhs: LinExpr) -> Self {
        assert!(terms.iter().all(|&(_, w)| w >= 0), "Weights must be non-negative");
        Formula::Sum(Box::new(WeightedSum { terms, cmp, rhs }))
    }

    /// At most one of the formulas holds (pairwise encoding).
    pub fn at_most_one(fs: &[Formula]) -> Self {
        let mut res = Vec::new();
        for i in 0..fs.len() {
            for j in i + 1..fs.len() {
                res.push(Formula::not(Formula::and([fs[i].clone(), fs[j].clone()])));
            }
        }
        Formula::And(res)
    }

    pub fn exactly_one(fs: &[Formula]) -> Self {
        Formula::and([Formula::or(fs.iter().cloned()), Formula::at_most_one(fs)])
    }

    /// Lexicographic `f ≤ g` on equally long boolean sequences, where `≤` on a
    /// pair of booleans is implication.
    ///
    /// ```text
    /// lex(f, g) = (f₀ → g₀) ∧ ((f₀ ↔ g₀) → lex(f[1..], g[1..]))
    /// ```
    pub fn lex_lesseq(f: &[Formula], g: &[Formula]) -> Self {
        assert_eq!(f.len(), g.len(), "Sequences must have equal length");
        let mut res = Formula::truth();
        for (a, b) in f.iter().zip(g).rev() {
            res = Formula::and([
                Formula::implies(a.clone(), b.clone()),
                Formula::implies(Formula::iff(a.clone(), b.clone()), res),
            ]);
        }
        res
    }

    /// Evaluates the formula under a complete assignment.
    pub fn eval(&self, assignment: &Assignment) -> bool {
        match self {
            Formula::Const(b) => *b,
            Formula::Var(v) => assignment.bool(*v),
            Formula::Not(f) => !f.eval(assignment),
            Formula::And(fs) => fs.iter().all(|f| f.eval(assignment)),
            Formula::Or(fs) => fs.iter().any(|f| f.eval(assignment)),
            Formula::Implies(a, b) => !a.eval(assignment) || b.eval(assignment),
            Formula::Iff(a, b) => a.eval(assignment) == b.eval(assignment),
            Formula::Le(e) => e.eval(assignment) <= 0,
            Formula::Sum(sum) => {
                let total: i64 = sum
                    .terms
                    .iter()
                    .filter(|(f, _)| f.eval(assignment))
                    .map(|&(_, w)| w)
                    .sum();
                let rhs = sum.rhs.eval(assignment);
                match sum.cmp {
                    SumCmp::Le => total <= rhs,
                    SumCmp::Eq => total == rhs,
                }
            }
        }
    }
}
