//! Solver oracles: black boxes that decide a [`ConstraintSet`] and report a
//! model.
//!
//! Three oracles are provided. [`SatOracle`] and [`SmtOracle`] order-encode the
//! set into clauses for the `splr` CDCL engine; the latter also minimizes an
//! integer objective. [`FdOracle`] compiles the set into a decision diagram.

use std::time::Duration;

use crate::constraint::{Assignment, ConstraintSet};
use crate::error::{ConfigError, Result};
use crate::types::IntVar;

mod cnf;
mod fd;
mod lower;
mod order;
mod sat;

pub use fd::FdOracle;
pub use sat::{SatOracle, SmtOracle};

pub(crate) use lower::Signal;

/// Answer of a satisfiability query.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SatStatus {
    Satisfiable,
    Unsatisfiable,
    Timeout,
}

/// Answer of a minimization query.
///
/// On [`OptStatus::Timeout`] the oracle may still hold the best model found.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OptStatus {
    Optimal,
    Unsatisfiable,
    Timeout,
}

pub trait SolverOracle {
    /// Short name, for logging.
    fn name(&self) -> &'static str;

    /// Loads a constraint set, replacing any previously loaded one.
    fn add_constraints(&mut self, set: ConstraintSet);

    /// Decides the loaded set within the timeout.
    fn check(&mut self, timeout: Duration) -> Result<SatStatus>;

    fn supports_minimize(&self) -> bool {
        false
    }

    /// Finds a model minimizing `objective`.
    fn minimize(&mut self, _objective: IntVar, _timeout: Duration) -> Result<OptStatus> {
        Err(ConfigError::MinimizeUnsupported { oracle: self.name() }.into())
    }

    /// Model of the last successful query.
    fn model(&self) -> Option<&Assignment>;
}

/// Any of the provided oracles.
pub enum Oracle {
    Sat(SatOracle),
    Smt(SmtOracle),
    Fd(FdOracle),
}

impl Oracle {
    pub fn sat() -> Self {
        Oracle::Sat(SatOracle::new())
    }

    pub fn smt() -> Self {
        Oracle::Smt(SmtOracle::new())
    }

    pub fn fd() -> Self {
        Oracle::Fd(FdOracle::new())
    }

    fn inner(&self) -> &dyn SolverOracle {
        match self {
            Oracle::Sat(o) => o,
            Oracle::Smt(o) => o,
            Oracle::Fd(o) => o,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn SolverOracle {
        match self {
            Oracle::Sat(o) => o,
            Oracle::Smt(o) => o,
            Oracle::Fd(o) => o,
        }
    }
}

impl SolverOracle for Oracle {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn add_constraints(&mut self, set: ConstraintSet) {
        self.inner_mut().add_constraints(set)
    }

    fn check(&mut self, timeout: Duration) -> Result<SatStatus> {
        self.inner_mut().check(timeout)
    }

    fn supports_minimize(&self) -> bool {
        self.inner().supports_minimize()
    }

    fn minimize(&mut self, objective: IntVar, timeout: Duration) -> Result<OptStatus> {
        self.inner_mut().minimize(objective, timeout)
    }

    fn model(&self) -> Option<&Assignment> {
        self.inner().model()
    }
}
