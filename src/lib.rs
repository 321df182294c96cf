//! # vlsi-rs: Strip packing of VLSI circuits
//!
//! **`vlsi-rs`** finds the minimum length of a fixed-width board such that a set
//! of rectangular circuits can be placed on it, axis-aligned and without
//! overlap, optionally allowing 90° rotation.
//!
//! The problem is translated into a declarative constraint set by a composable
//! [`Encoder`][crate::encoder::Encoder], handed to a solver oracle, and the
//! minimum length is driven by a [`SearchDriver`][crate::search::SearchDriver].
//!
//! ## Basic Usage
//!
//! ```rust
//! use vlsi_rs::instance::InstanceLoader;
//! use vlsi_rs::solver::{solve, SolveConfig, Technology};
//!
//! // Board width 9, two circuits: 3x3 and 6x6.
//! let instance = InstanceLoader::new().load_str("9\n2\n3 3\n6 6\n").unwrap();
//!
//! let config = SolveConfig::default().with_technology(Technology::Sat);
//! let outcome = solve(&instance, &config).unwrap();
//!
//! assert!(outcome.is_optimal());
//! let solution = outcome.solution().unwrap();
//! assert_eq!(solution.length(), 6);
//! assert!(solution.validate(&instance).is_ok());
//! ```
//!
//! ## Core Components
//!
//! - **[`instance`]**: problem parameters and the instance file format.
//! - **[`constraint`]** and **[`formula`]**: typed decision variables and assertions.
//! - **[`encoder`]**: coordinate and grid encodings, plus the rotation,
//!   symmetry-breaking and dual-channeling extensions.
//! - **[`oracle`]**: the oracle interface and its adapters. Two run the `splr`
//!   CDCL engine; one compiles the model into a decision diagram ([`bdd`]).
//! - **[`search`]**: iterative deepening and direct minimization under a time budget.
//! - **[`decode`]** and **[`solution`]**: placements and the result file format.
//! - **[`solver`]**: technology selection and the one-call [`solve`][crate::solver::solve].

pub mod bdd;
pub mod constraint;
pub mod decode;
pub mod encoder;
pub mod error;
pub mod formula;
pub mod instance;
pub mod oracle;
pub mod search;
pub mod solution;
pub mod solver;
pub mod types;
