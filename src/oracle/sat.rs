//! Oracles backed by the `splr` CDCL engine.
//!
//! The constraint set is order-encoded into clauses once. Every query hands a
//! copy of the clauses (plus the unit clauses of the query) to a fresh solver
//! on a worker thread and waits for the answer at most until the timeout. The
//! solver carries the same limit, rounded up to whole seconds, so a late
//! worker gives up on its own shortly after its answer is discarded.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use splr::{Certificate, Config, SolveIF, Solver, SolverError};

use crate::constraint::{Assignment, ConstraintSet};
use crate::error::{ConfigError, OracleError, Result};
use crate::types::IntVar;

use super::cnf::Cnf;
use super::lower::Signal;
use super::{OptStatus, SatStatus, SolverOracle};

enum Answer {
    Sat(Assignment),
    Unsat,
    Timeout,
}

/// Runs splr under its own time limit. `Ok(None)` when it gave up.
fn run_splr(clauses: &[Vec<i32>], timeout: Duration) -> std::result::Result<Option<Certificate>, String> {
    let config = Config {
        c_timeout: timeout.as_secs_f64().ceil().max(1.0),
        quiet_mode: true,
        ..Config::default()
    };
    let res = match Solver::try_from((config, clauses)) {
        Ok(mut solver) => solver.solve(),
        Err(res) => res,
    };
    match res {
        Ok(certificate) => Ok(Some(certificate)),
        Err(SolverError::EmptyClause) => Ok(Some(Certificate::UNSAT)),
        Err(SolverError::TimeOut) => Ok(None),
        Err(e) => Err(format!("{:?}", e)),
    }
}

/// Shared state of the clause-based oracles.
#[derive(Default)]
struct Core {
    cnf: Option<Cnf>,
    model: Option<Assignment>,
    /// Workers whose answer came too late, until they give up.
    stragglers: Vec<JoinHandle<()>>,
}

impl Core {
    fn add_constraints(&mut self, set: ConstraintSet) {
        self.cnf = Some(Cnf::from_set(&set));
        self.model = None;
    }

    fn busy_workers(&mut self) -> usize {
        self.stragglers.retain(|h| !h.is_finished());
        self.stragglers.len()
    }

    fn cnf(&self) -> Result<&Cnf> {
        Ok(self.cnf.as_ref().ok_or(ConfigError::NoConstraints)?)
    }

    /// Solves the clauses together with unit clauses for `extra`.
    fn query(&mut self, extra: &[Signal], timeout: Duration) -> Result<Answer> {
        let busy = self.busy_workers();
        if busy > 0 {
            debug!("splr: {} timed-out workers still running", busy);
        }
        let cnf = self.cnf()?;
        if cnf.is_trivially_unsat() {
            return Ok(Answer::Unsat);
        }
        let Some(clauses) = cnf.to_dimacs_with(extra) else {
            return Ok(Answer::Unsat);
        };
        if timeout.is_zero() {
            return Ok(Answer::Timeout);
        }
        if clauses.is_empty() {
            return Ok(Answer::Sat(cnf.decode(&[])));
        }

        debug!(
            "splr: {} variables, {} clauses, timeout {:?}",
            cnf.num_vars(),
            clauses.len(),
            timeout
        );
        let (tx, rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("splr".to_string())
            .spawn(move || {
                let res = run_splr(&clauses, timeout);
                // The receiver is gone after a timeout.
                let _ = tx.send(res);
            })
            .map_err(|e| OracleError::Backend(e.to_string()))?;

        let answer = match rx.recv_timeout(timeout) {
            Ok(Ok(Some(Certificate::SAT(model)))) => Some(Answer::Sat(cnf.decode(&model))),
            Ok(Ok(Some(Certificate::UNSAT))) => Some(Answer::Unsat),
            Ok(Ok(None)) => {
                warn!("splr gave up within {:?}", timeout);
                Some(Answer::Timeout)
            }
            Ok(Err(msg)) => return Err(OracleError::Backend(msg).into()),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => return Err(OracleError::WorkerLost.into()),
        };

        match answer {
            Some(answer) => {
                // The answer is sent last, so this returns right away.
                let _ = worker.join();
                Ok(answer)
            }
            None => {
                warn!("splr did not answer within {:?}", timeout);
                self.stragglers.push(worker);
                Ok(Answer::Timeout)
            }
        }
    }

    fn check(&mut self, timeout: Duration) -> Result<SatStatus> {
        self.model = None;
        Ok(match self.query(&[], timeout)? {
            Answer::Sat(a) => {
                self.model = Some(a);
                SatStatus::Satisfiable
            }
            Answer::Unsat => SatStatus::Unsatisfiable,
            Answer::Timeout => SatStatus::Timeout,
        })
    }
}

/// Plain satisfiability checks.
#[derive(Default)]
pub struct SatOracle {
    core: Core,
}

impl SatOracle {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SolverOracle for SatOracle {
    fn name(&self) -> &'static str {
        "sat"
    }

    fn add_constraints(&mut self, set: ConstraintSet) {
        self.core.add_constraints(set);
    }

    fn check(&mut self, timeout: Duration) -> Result<SatStatus> {
        self.core.check(timeout)
    }

    fn model(&self) -> Option<&Assignment> {
        self.core.model.as_ref()
    }
}

/// Bounded integer arithmetic on top of the CDCL engine, with minimization
/// by bisection over the objective bound.
#[derive(Default)]
pub struct SmtOracle {
    core: Core,
}

impl SmtOracle {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SolverOracle for SmtOracle {
    fn name(&self) -> &'static str {
        "smt"
    }

    fn add_constraints(&mut self, set: ConstraintSet) {
        self.core.add_constraints(set);
    }

    fn check(&mut self, timeout: Duration) -> Result<SatStatus> {
        self.core.check(timeout)
    }

    fn supports_minimize(&self) -> bool {
        true
    }

    /// Finds a first model, then repeatedly asks for a model with the
    /// objective at most halfway between the proven lower bound and the
    /// incumbent. A timeout keeps the incumbent.
    fn minimize(&mut self, objective: IntVar, timeout: Duration) -> Result<OptStatus> {
        let deadline = Instant::now() + timeout;
        self.core.model = None;

        let mut best = match self.core.query(&[], timeout)? {
            Answer::Sat(a) => {
                let value = a.int(objective);
                self.core.model = Some(a);
                value
            }
            Answer::Unsat => return Ok(OptStatus::Unsatisfiable),
            Answer::Timeout => return Ok(OptStatus::Timeout),
        };
        let mut lo = self.core.cnf()?.domain(objective).lb;
        info!("smt: first model with objective {}", best);

        while lo < best {
            let mid = lo + (best - lo) / 2;
            let bound = self.core.cnf()?.le_signal(objective, mid);
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.core.query(&[bound], remaining)? {
                Answer::Sat(a) => {
                    best = a.int(objective);
                    self.core.model = Some(a);
                    info!("smt: improved objective to {}", best);
                }
                Answer::Unsat => {
                    lo = mid + 1;
                    debug!("smt: objective is at least {}", lo);
                }
                Answer::Timeout => return Ok(OptStatus::Timeout),
            }
        }

        Ok(OptStatus::Optimal)
    }

    fn model(&self) -> Option<&Assignment> {
        self.core.model.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::formula::Formula;

    const TIMEOUT: Duration = Duration::from_secs(30);

    fn pigeons(n: usize, holes: usize) -> ConstraintSet {
        let mut set = ConstraintSet::new();
        let vars: Vec<Vec<Formula>> = (0..n)
            .map(|p| {
                (0..holes)
                    .map(|h| Formula::Var(set.new_bool(format!("p{}h{}", p, h))))
                    .collect()
            })
            .collect();
        for row in &vars {
            set.assert(Formula::or(row.iter().cloned()));
        }
        for h in 0..holes {
            let column: Vec<Formula> = vars.iter().map(|row| row[h].clone()).collect();
            set.assert(Formula::at_most_one(&column));
        }
        set
    }

    #[test]
    fn test_check_sat_and_unsat() {
        let mut oracle = SatOracle::new();
        oracle.add_constraints(pigeons(3, 3));
        assert_eq!(oracle.check(TIMEOUT).unwrap(), SatStatus::Satisfiable);
        assert!(oracle.model().is_some());

        let mut oracle = SatOracle::new();
        oracle.add_constraints(pigeons(4, 3));
        assert_eq!(oracle.check(TIMEOUT).unwrap(), SatStatus::Unsatisfiable);
        assert!(oracle.model().is_none());
    }

    #[test]
    fn test_model_satisfies_set() {
        let mut set = ConstraintSet::new();
        let x = set.new_int("x", 0, 9);
        let y = set.new_int("y", 0, 9);
        set.assert(Formula::eq(x + y, 12));
        set.assert(Formula::lt(x, y));
        let reference = set.clone();

        let mut oracle = SatOracle::new();
        oracle.add_constraints(set);
        assert_eq!(oracle.check(TIMEOUT).unwrap(), SatStatus::Satisfiable);
        assert!(reference.is_satisfied_by(oracle.model().unwrap()));
    }

    #[test]
    fn test_query_before_constraints() {
        let mut oracle = SatOracle::new();
        assert!(matches!(
            oracle.check(TIMEOUT),
            Err(crate::error::Error::Config(ConfigError::NoConstraints))
        ));
    }

    #[test]
    fn test_minimize_unsupported() {
        let mut set = ConstraintSet::new();
        let x = set.new_int("x", 0, 3);
        let mut oracle = SatOracle::new();
        oracle.add_constraints(set);
        assert!(!oracle.supports_minimize());
        assert!(matches!(
            oracle.minimize(x, TIMEOUT),
            Err(crate::error::Error::Config(ConfigError::MinimizeUnsupported { .. }))
        ));
    }

    #[test]
    fn test_minimize() {
        let mut set = ConstraintSet::new();
        let x = set.new_int("x", 0, 20);
        let y = set.new_int("y", 0, 20);
        set.assert(Formula::ge(x + y, 7));
        set.assert(Formula::le(y, 3));
        let mut oracle = SmtOracle::new();
        oracle.add_constraints(set);
        assert_eq!(oracle.minimize(x, TIMEOUT).unwrap(), OptStatus::Optimal);
        assert_eq!(oracle.model().unwrap().int(x), 4);
    }

    #[test]
    fn test_minimize_unsat() {
        let mut set = ConstraintSet::new();
        let x = set.new_int("x", 0, 5);
        set.assert(Formula::ge(x, 3));
        set.assert(Formula::le(x, 2));
        let mut oracle = SmtOracle::new();
        oracle.add_constraints(set);
        assert_eq!(oracle.minimize(x, TIMEOUT).unwrap(), OptStatus::Unsatisfiable);
    }

    #[test]
    fn test_timed_out_worker_stops() {
        let mut oracle = SatOracle::new();
        oracle.add_constraints(pigeons(13, 12));
        assert_eq!(oracle.check(Duration::from_millis(200)).unwrap(), SatStatus::Timeout);
        assert!(oracle.model().is_none());

        let start = Instant::now();
        while oracle.core.busy_workers() > 0 {
            assert!(start.elapsed() < Duration::from_secs(30), "splr worker still running");
            thread::sleep(Duration::from_millis(100));
        }
    }

    #[test]
    fn test_zero_timeout() {
        let mut oracle = SatOracle::new();
        oracle.add_constraints(pigeons(3, 3));
        assert_eq!(oracle.check(Duration::ZERO).unwrap(), SatStatus::Timeout);
    }
}
