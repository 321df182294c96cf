//! Minimum-length search over an oracle.
//!
//! Two strategies drive the objective:
//!
//! - **Iterative deepening** encodes every candidate length from the instance's
//!   lower bound upwards with a fresh constraint set and a fresh oracle, and
//!   stops at the first satisfiable one, which is then optimal.
//! - **Direct minimization** encodes the whole length range once and asks an
//!   optimizing oracle to minimize the length variable.
//!
//! Both share one global [`TimeBudget`]: every oracle call gets what is left of
//! it, and no call is issued once it is spent. Infeasibility at a length and
//! running out of time are outcomes, not errors.

use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::constraint::Assignment;
use crate::decode::SolutionDecoder;
use crate::encoder::{Encoded, Encoder, Layout, LengthBound};
use crate::error::{ConfigError, DecodeError, Result};
use crate::instance::Instance;
use crate::oracle::{OptStatus, SatStatus, SolverOracle};
use crate::solution::Solution;

const TIME_LIMIT_REACHED: &str = "time limit reached";

/// Wall-clock budget shared by all oracle calls of one search.
#[derive(Debug, Copy, Clone)]
pub struct TimeBudget {
    limit: Duration,
    start: Instant,
}

impl TimeBudget {
    /// Starts the clock.
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            start: Instant::now(),
        }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// `max(0, limit - elapsed)`
    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.elapsed())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining().is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    /// Proven that no packing exists within the length bounds.
    Infeasible,
    /// A packing of proven minimum length.
    Optimal(Solution),
    /// A packing whose length is not proven minimal.
    Feasible(Solution),
    /// Neither a packing nor a proof of infeasibility.
    Unknown,
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchResult::Infeasible => write!(f, "Infeasible"),
            SearchResult::Optimal(s) => write!(f, "Optimal(length={})", s.length()),
            SearchResult::Feasible(s) => write!(f, "Feasible(length={})", s.length()),
            SearchResult::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    OptimalityProven,
    InfeasibilityProven,
    /// The search stopped early; the string says why.
    Aborted(String),
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::OptimalityProven => write!(f, "Optimality Proven"),
            TerminationReason::InfeasibilityProven => write!(f, "Infeasibility Proven"),
            TerminationReason::Aborted(reason) => write!(f, "Aborted: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStatistics {
    /// Number of `check`/`minimize` calls issued.
    pub oracle_calls: u64,
    /// Candidate lengths encoded (one for direct minimization).
    pub lengths_tried: u64,
    /// Time spent building constraint sets.
    pub encode_time: Duration,
    /// Time spent inside the oracle.
    pub solve_time: Duration,
    pub total_time: Duration,
}

impl fmt::Display for SearchStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Search Statistics:")?;
        writeln!(f, "  Oracle Calls: {}", self.oracle_calls)?;
        writeln!(f, "  Lengths Tried: {}", self.lengths_tried)?;
        writeln!(f, "  Encode Time (secs): {:.3}", self.encode_time.as_secs_f64())?;
        writeln!(f, "  Solve Time (secs): {:.3}", self.solve_time.as_secs_f64())?;
        writeln!(f, "  Total Time (secs): {:.3}", self.total_time.as_secs_f64())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub result: SearchResult,
    pub reason: TerminationReason,
    pub statistics: SearchStatistics,
}

impl SearchOutcome {
    pub fn is_optimal(&self) -> bool {
        matches!(self.result, SearchResult::Optimal(_))
    }

    pub fn is_feasible(&self) -> bool {
        matches!(self.result, SearchResult::Feasible(_))
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self.result, SearchResult::Infeasible)
    }

    pub fn solution(&self) -> Option<&Solution> {
        match &self.result {
            SearchResult::Optimal(s) | SearchResult::Feasible(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.result, self.reason)?;
        write!(f, "{}", self.statistics)
    }
}

/// Runs one search for one instance.
pub struct SearchDriver<'a> {
    instance: &'a Instance,
    encoder: Encoder<'a>,
    timeout: Duration,
}

impl<'a> SearchDriver<'a> {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    pub fn new(instance: &'a Instance, encoder: Encoder<'a>) -> Self {
        Self {
            instance,
            encoder,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Tries every length from the lower bound upwards, each with a fresh
    /// oracle from `new_oracle`.
    pub fn iterative_deepening<O, F>(&self, mut new_oracle: F) -> Result<SearchOutcome>
    where
        O: SolverOracle,
        F: FnMut() -> O,
    {
        let budget = TimeBudget::new(self.timeout);
        let mut stats = SearchStatistics::default();
        let (lo, hi) = (self.instance.min_length(), self.instance.max_length());
        info!("iterative deepening over lengths {}..={}", lo, hi);

        for length in lo..=hi {
            if budget.is_exhausted() {
                return Ok(aborted(stats, &budget));
            }

            let Encoded { set, layout } = self.timed_encode(LengthBound::Fixed(length), &mut stats)?;
            let mut oracle = new_oracle();
            oracle.add_constraints(set);

            let remaining = budget.remaining();
            if remaining.is_zero() {
                return Ok(aborted(stats, &budget));
            }
            stats.oracle_calls += 1;
            let start = Instant::now();
            let status = oracle.check(remaining)?;
            stats.solve_time += start.elapsed();

            match status {
                SatStatus::Satisfiable => {
                    let model = oracle.model().ok_or(DecodeError::NoModel)?;
                    let solution = self.decode(&layout, model)?;
                    info!("length {} is feasible: optimal", length);
                    stats.total_time = budget.elapsed();
                    return Ok(SearchOutcome {
                        result: SearchResult::Optimal(solution),
                        reason: TerminationReason::OptimalityProven,
                        statistics: stats,
                    });
                }
                SatStatus::Unsatisfiable => {
                    info!("length {} is infeasible", length);
                }
                SatStatus::Timeout => {
                    warn!("{} timed out at length {}", oracle.name(), length);
                    return Ok(aborted(stats, &budget));
                }
            }
        }

        stats.total_time = budget.elapsed();
        Ok(SearchOutcome {
            result: SearchResult::Infeasible,
            reason: TerminationReason::InfeasibilityProven,
            statistics: stats,
        })
    }

    /// Encodes the whole length range once and minimizes the length variable.
    pub fn direct<O: SolverOracle>(&self, mut oracle: O) -> Result<SearchOutcome> {
        if !oracle.supports_minimize() {
            return Err(ConfigError::MinimizeUnsupported { oracle: oracle.name() }.into());
        }

        let budget = TimeBudget::new(self.timeout);
        let mut stats = SearchStatistics::default();
        if budget.is_exhausted() {
            return Ok(aborted(stats, &budget));
        }

        let Encoded { set, layout } = self.timed_encode(LengthBound::Range, &mut stats)?;
        oracle.add_constraints(set);

        let remaining = budget.remaining();
        if remaining.is_zero() {
            return Ok(aborted(stats, &budget));
        }
        info!(
            "minimizing length over {}..={} with {}",
            self.instance.min_length(),
            self.instance.max_length(),
            oracle.name()
        );
        stats.oracle_calls += 1;
        let start = Instant::now();
        let status = oracle.minimize(layout.length, remaining)?;
        stats.solve_time += start.elapsed();

        let (result, reason) = match status {
            OptStatus::Optimal => {
                let model = oracle.model().ok_or(DecodeError::NoModel)?;
                let solution = self.decode(&layout, model)?;
                info!("optimal length {}", solution.length());
                (SearchResult::Optimal(solution), TerminationReason::OptimalityProven)
            }
            OptStatus::Unsatisfiable => (SearchResult::Infeasible, TerminationReason::InfeasibilityProven),
            OptStatus::Timeout => {
                let result = match oracle.model() {
                    Some(model) => {
                        let solution = self.decode(&layout, model)?;
                        warn!("timed out with length {} unproven", solution.length());
                        SearchResult::Feasible(solution)
                    }
                    None => {
                        warn!("timed out without a packing");
                        SearchResult::Unknown
                    }
                };
                (result, TerminationReason::Aborted(TIME_LIMIT_REACHED.to_string()))
            }
        };

        stats.total_time = budget.elapsed();
        Ok(SearchOutcome {
            result,
            reason,
            statistics: stats,
        })
    }

    fn timed_encode(&self, bound: LengthBound, stats: &mut SearchStatistics) -> Result<Encoded> {
        let start = Instant::now();
        let encoded = self.encoder.encode(bound)?;
        stats.encode_time += start.elapsed();
        stats.lengths_tried += 1;
        debug!(
            "{:?}: {} assertions encoded in {:?}",
            bound,
            encoded.set.assertions().len(),
            start.elapsed()
        );
        Ok(encoded)
    }

    /// Decodes the model and checks the packing against the instance.
    fn decode(&self, layout: &Layout, model: &Assignment) -> Result<Solution> {
        let solution = SolutionDecoder::new(self.instance, layout)
            .with_rotation(self.encoder.config().rotation)?
            .decode(model)?;
        solution.validate(self.instance).map_err(DecodeError::Invalid)?;
        Ok(solution)
    }
}

fn aborted(mut stats: SearchStatistics, budget: &TimeBudget) -> SearchOutcome {
    stats.total_time = budget.elapsed();
    SearchOutcome {
        result: SearchResult::Unknown,
        reason: TerminationReason::Aborted(TIME_LIMIT_REACHED.to_string()),
        statistics: stats,
    }
}
