//! Error types.
//!
//! Infeasibility at a candidate length and running out of time are not errors:
//! the search driver handles both as ordinary outcomes. Everything here is
//! propagated to the caller unchanged.

use std::fmt;
use std::io;

use crate::instance::InstanceError;
use crate::solution::Violation;

/// A programming-contract violation: the pieces were combined in a way that
/// cannot produce a meaningful answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The grid encoding only exists for a fixed board length.
    GridNeedsFixedLength,
    /// The instance bounds and the encoder disagree on rotation.
    RotationMismatch,
    /// Rotation-aware decoding was requested for a layout without rotation flags.
    RotationUnavailable,
    /// `minimize` was called on an oracle without optimization support.
    MinimizeUnsupported { oracle: &'static str },
    /// The oracle was queried before any constraint set was added.
    NoConstraints,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::GridNeedsFixedLength => {
                write!(f, "The grid encoding requires a fixed board length")
            }
            ConfigError::RotationMismatch => write!(
                f,
                "The instance and the encoder disagree on whether circuits may rotate"
            ),
            ConfigError::RotationUnavailable => write!(
                f,
                "Rotation-aware decoding requested for an encoding without rotation"
            ),
            ConfigError::MinimizeUnsupported { oracle } => {
                write!(f, "The {} oracle cannot minimize an objective", oracle)
            }
            ConfigError::NoConstraints => write!(f, "No constraints were added to the oracle"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Failure inside a solving backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The backend reported an internal error.
    Backend(String),
    /// The worker thread running the backend terminated without an answer.
    WorkerLost,
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleError::Backend(msg) => write!(f, "Backend error: {}", msg),
            OracleError::WorkerLost => write!(f, "Solver worker terminated without an answer"),
        }
    }
}

impl std::error::Error for OracleError {}

/// The assignment does not describe a packing of the layout it was decoded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No model is available (the oracle did not report a solution).
    NoModel,
    /// A circuit has no cell on the grid.
    EmptyCircuit { circuit: usize },
    /// The cells of a circuit do not form a filled rectangle of its area.
    NotRectangular { circuit: usize },
    /// The decoded placements break a packing rule.
    Invalid(Violation),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::NoModel => write!(f, "No model available"),
            DecodeError::EmptyCircuit { circuit } => {
                write!(f, "Circuit {} occupies no cell", circuit)
            }
            DecodeError::NotRectangular { circuit } => {
                write!(f, "Cells of circuit {} do not form its rectangle", circuit)
            }
            DecodeError::Invalid(v) => write!(f, "Invalid packing: {}", v),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Crate-level error.
#[derive(Debug)]
pub enum Error {
    Instance(InstanceError),
    Config(ConfigError),
    Oracle(OracleError),
    Decode(DecodeError),
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Instance(e) => write!(f, "Malformed instance: {}", e),
            Error::Config(e) => write!(f, "Invalid configuration: {}", e),
            Error::Oracle(e) => write!(f, "Oracle failure: {}", e),
            Error::Decode(e) => write!(f, "Decoding failure: {}", e),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Instance(e) => Some(e),
            Error::Config(e) => Some(e),
            Error::Oracle(e) => Some(e),
            Error::Decode(e) => Some(e),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<InstanceError> for Error {
    fn from(e: InstanceError) -> Self {
        Error::Instance(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<OracleError> for Error {
    fn from(e: OracleError) -> Self {
        Error::Oracle(e)
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Error::Decode(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
