//! One-call solving: pick a technology, get a search outcome.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::info;

use crate::encoder::{Encoder, EncoderConfig, Encoding, SymmetryConfig};
use crate::error::{ConfigError, Result};
use crate::instance::{Instance, InstanceLoader};
use crate::oracle::{FdOracle, SatOracle, SmtOracle, SolverOracle};
use crate::search::{SearchDriver, SearchOutcome};

/// Modeling technology: which encoding, oracle and default strategy to use.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Technology {
    /// Coordinates on the finite-domain (decision diagram) oracle, minimized directly.
    Cp,
    /// Boolean grid on the CDCL oracle, by iterative deepening.
    Sat,
    /// Coordinates on the arithmetic oracle, minimized directly.
    Smt,
}

impl Technology {
    pub fn encoding(self) -> Encoding {
        match self {
            Technology::Sat => Encoding::Grid,
            Technology::Cp | Technology::Smt => Encoding::Coordinates,
        }
    }

    pub fn default_strategy(self) -> Strategy {
        match self {
            Technology::Sat => Strategy::IterativeDeepening,
            Technology::Cp | Technology::Smt => Strategy::Direct,
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Technology::Cp => write!(f, "cp"),
            Technology::Sat => write!(f, "sat"),
            Technology::Smt => write!(f, "smt"),
        }
    }
}

impl FromStr for Technology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cp" => Ok(Technology::Cp),
            "sat" => Ok(Technology::Sat),
            "smt" => Ok(Technology::Smt),
            _ => Err(format!("unknown technology '{}', expected cp, sat or smt", s)),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Strategy {
    IterativeDeepening,
    Direct,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SolveConfig {
    pub technology: Technology,
    /// Overrides the technology's default strategy.
    pub strategy: Option<Strategy>,
    pub rotation: bool,
    pub dual: bool,
    pub implied: bool,
    pub symmetry: SymmetryConfig,
    pub timeout: Duration,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            technology: Technology::Sat,
            strategy: None,
            rotation: false,
            dual: false,
            implied: true,
            symmetry: SymmetryConfig::default(),
            timeout: SearchDriver::DEFAULT_TIMEOUT,
        }
    }
}

impl SolveConfig {
    pub fn with_technology(mut self, technology: Technology) -> Self {
        self.technology = technology;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_rotation(mut self, rotation: bool) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_dual(mut self, dual: bool) -> Self {
        self.dual = dual;
        self
    }

    pub fn with_implied(mut self, implied: bool) -> Self {
        self.implied = implied;
        self
    }

    pub fn with_symmetry(mut self, symmetry: SymmetryConfig) -> Self {
        self.symmetry = symmetry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy.unwrap_or(self.technology.default_strategy())
    }

    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig::default()
            .with_encoding(self.technology.encoding())
            .with_rotation(self.rotation)
            .with_dual(self.dual)
            .with_implied(self.implied)
            .with_symmetry(self.symmetry)
    }

    /// Rejects the combinations that fail on every instance.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strategy() != Strategy::Direct {
            return Ok(());
        }
        if self.technology == Technology::Sat {
            return Err(ConfigError::MinimizeUnsupported {
                oracle: SatOracle::new().name(),
            });
        }
        if self.technology.encoding() == Encoding::Grid {
            return Err(ConfigError::GridNeedsFixedLength);
        }
        Ok(())
    }

    /// Instance loader matching the rotation setting.
    pub fn loader(&self) -> InstanceLoader {
        InstanceLoader::new().with_rotation(self.rotation)
    }
}

/// Searches a minimum-length packing of `instance`.
pub fn solve(instance: &Instance, config: &SolveConfig) -> Result<SearchOutcome> {
    config.validate()?;
    let encoder = Encoder::new(instance, config.encoder_config())?;
    let driver = SearchDriver::new(instance, encoder).with_timeout(config.timeout);
    let strategy = config.strategy();
    info!(
        "solving {} circuits on width {} with {} ({:?})",
        instance.len(),
        instance.board_width(),
        config.technology,
        strategy
    );

    match (config.technology, strategy) {
        (Technology::Sat, Strategy::IterativeDeepening) => driver.iterative_deepening(SatOracle::new),
        (Technology::Sat, Strategy::Direct) => driver.direct(SatOracle::new()),
        (Technology::Smt, Strategy::IterativeDeepening) => driver.iterative_deepening(SmtOracle::new),
        (Technology::Smt, Strategy::Direct) => driver.direct(SmtOracle::new()),
        (Technology::Cp, Strategy::IterativeDeepening) => driver.iterative_deepening(FdOracle::new),
        (Technology::Cp, Strategy::Direct) => driver.direct(FdOracle::new()),
    }
}
