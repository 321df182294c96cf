//! End-to-end packing tests.
//!
//! Tests cover the concrete scenarios, the packing properties of every
//! technology, and model counts showing what symmetry breaking removes.

use std::time::Duration;

use num_bigint::BigUint;
use test_log::test;

use vlsi_rs::encoder::{Encoder, EncoderConfig, LengthBound, SymmetryConfig};
use vlsi_rs::error::Error;
use vlsi_rs::instance::{Instance, InstanceError, InstanceLoader};
use vlsi_rs::oracle::{FdOracle, SatOracle, SatStatus, SolverOracle};
use vlsi_rs::search::{SearchResult, TerminationReason};
use vlsi_rs::solution::Solution;
use vlsi_rs::solver::{solve, SolveConfig, Strategy, Technology};

const ALL: [Technology; 3] = [Technology::Cp, Technology::Sat, Technology::Smt];

fn solve_optimal(instance: &Instance, config: &SolveConfig) -> Solution {
    let outcome = solve(instance, config).unwrap();
    assert!(outcome.is_optimal(), "{:?}: {}", config.technology, outcome);
    let solution = outcome.solution().unwrap().clone();
    solution.validate(instance).unwrap();
    solution
}

// ─── Concrete Scenarios ────────────────────────────────────────────────────────

#[test]
fn two_squares() {
    let instance = InstanceLoader::new().load_str("9\n2\n3 3\n6 6\n").unwrap();
    assert_eq!(instance.min_length(), 5);
    assert_eq!(instance.max_length(), 9);

    for technology in ALL {
        let config = SolveConfig::default().with_technology(technology);
        let solution = solve_optimal(&instance, &config);
        assert_eq!(solution.length(), 6);
        let big = solution.placement(1);
        assert_eq!((big.width, big.height), (6, 6));
        assert!(big.y == 0 && (big.x == 0 || big.x == 3), "{:?}", big);
    }
}

#[test]
fn single_circuit() {
    let instance = InstanceLoader::new().load_str("4\n1\n4 5\n").unwrap();
    for technology in ALL {
        let config = SolveConfig::default().with_technology(technology);
        let solution = solve_optimal(&instance, &config);
        assert_eq!(solution.length(), 5);
        let p = solution.placement(0);
        assert_eq!((p.x, p.y, p.width, p.height), (0, 0, 4, 5));
        assert!(!p.rotated);
    }
}

#[test]
fn too_wide_even_rotated() {
    let res = InstanceLoader::new()
        .with_rotation(true)
        .load_str("9\n1\n10 10\n");
    assert!(matches!(res, Err(InstanceError::DoesNotFit { circuit: 0, board_width: 9 })));
}

#[test]
fn count_mismatch() {
    let res = InstanceLoader::new().load_str("9\n3\n3 3\n6 6\n");
    assert!(matches!(
        res,
        Err(InstanceError::CountMismatch { declared: 3, found: 2 })
    ));
}

// ─── Packing Properties ────────────────────────────────────────────────────────

fn medium() -> Instance {
    Instance::new(5, &[(3, 3), (2, 4), (2, 2), (3, 1), (5, 1)], false).unwrap()
}

#[test]
fn technologies_agree() {
    let instance = medium();
    let lengths: Vec<u32> = [Technology::Sat, Technology::Smt]
        .into_iter()
        .map(|t| solve_optimal(&instance, &SolveConfig::default().with_technology(t)).length())
        .collect();
    assert_eq!(lengths[0], lengths[1]);

    let deepening = SolveConfig::default()
        .with_technology(Technology::Smt)
        .with_strategy(Strategy::IterativeDeepening);
    assert_eq!(solve_optimal(&instance, &deepening).length(), lengths[0]);
}

#[test]
fn minimality() {
    let instance = medium();
    let solution = solve_optimal(&instance, &SolveConfig::default());

    let encoder = Encoder::new(&instance, EncoderConfig::default()).unwrap();
    for length in instance.min_length()..solution.length() {
        let encoded = encoder.encode(LengthBound::Fixed(length)).unwrap();
        let mut oracle = SatOracle::new();
        oracle.add_constraints(encoded.set);
        assert_eq!(
            oracle.check(Duration::from_secs(60)).unwrap(),
            SatStatus::Unsatisfiable,
            "length {}",
            length
        );
    }
}

#[test]
fn extensions_keep_the_optimum() {
    let instance = medium();
    let plain = SolveConfig::default()
        .with_technology(Technology::Smt)
        .with_symmetry(SymmetryConfig::none())
        .with_implied(false);
    let expected = solve_optimal(&instance, &plain).length();

    for config in [
        plain.with_dual(true),
        plain.with_implied(true),
        plain.with_symmetry(SymmetryConfig::default()),
    ] {
        assert_eq!(solve_optimal(&instance, &config).length(), expected, "{:?}", config);
    }
}

#[test]
fn rotation_lays_circuits_flat() {
    let config = SolveConfig::default().with_rotation(true);
    let instance = config.loader().load_str("4\n2\n1 4\n1 4\n").unwrap();

    for technology in ALL {
        let solution = solve_optimal(&instance, &config.with_technology(technology));
        assert_eq!(solution.length(), 2);
        for p in solution.placements() {
            assert!(p.rotated);
            assert_eq!((p.width, p.height), (4, 1));
        }
    }
}

#[test]
fn rotation_never_hurts() {
    let instance = Instance::new(4, &[(1, 3), (3, 1), (2, 2), (2, 2)], false).unwrap();
    let upright = solve_optimal(&instance, &SolveConfig::default()).length();

    let config = SolveConfig::default().with_rotation(true);
    let rotatable = Instance::new(4, &[(1, 3), (3, 1), (2, 2), (2, 2)], true).unwrap();
    let solution = solve_optimal(&rotatable, &config);
    assert!(solution.length() <= upright);
    for (p, c) in solution.placements().iter().zip(rotatable.circuits()) {
        let dims = if p.rotated { (c.height, c.width) } else { (c.width, c.height) };
        assert_eq!((p.width, p.height), dims);
    }
}

#[test]
fn zero_budget_is_unknown() {
    let instance = medium();
    for technology in ALL {
        let config = SolveConfig::default()
            .with_technology(technology)
            .with_timeout(Duration::ZERO);
        let outcome = solve(&instance, &config).unwrap();
        assert_eq!(outcome.result, SearchResult::Unknown);
        assert!(matches!(outcome.reason, TerminationReason::Aborted(_)));
        assert_eq!(outcome.statistics.oracle_calls, 0);
    }
}

#[test]
fn decision_diagrams_keep_to_the_budget() {
    let instance = Instance::new(5, &[(4, 3), (4, 3), (3, 4), (2, 4), (4, 1), (3, 3)], false).unwrap();
    let budget = Duration::from_secs(2);
    let config = SolveConfig::default()
        .with_technology(Technology::Cp)
        .with_strategy(Strategy::IterativeDeepening)
        .with_dual(true)
        .with_timeout(budget);
    let outcome = solve(&instance, &config).unwrap();
    assert!(
        outcome.statistics.total_time < budget + Duration::from_secs(3),
        "{}",
        outcome
    );
}

#[test]
fn configuration_errors_propagate() {
    let instance = medium();
    let config = SolveConfig::default().with_strategy(Strategy::Direct);
    assert!(matches!(solve(&instance, &config), Err(Error::Config(_))));
}

#[test]
fn result_file() {
    let instance = InstanceLoader::new().load_str("9\n2\n3 3\n6 6\n").unwrap();
    let solution = solve_optimal(&instance, &SolveConfig::default());

    let path = std::env::temp_dir().join(format!("vlsi-rs-out-{}.txt", std::process::id()));
    solution.write(&path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "9 6");
    assert_eq!(lines[1], "2");
    assert!(lines[2].starts_with("3 3 "));
    assert!(lines[3].starts_with("6 6 "));
}

// ─── Model Counting ────────────────────────────────────────────────────────────

fn count(instance: &Instance, length: u32, symmetry: SymmetryConfig) -> BigUint {
    let config = EncoderConfig::default().with_symmetry(symmetry);
    let encoded = Encoder::new(instance, config)
        .unwrap()
        .encode(LengthBound::Fixed(length))
        .unwrap();
    let mut oracle = FdOracle::new();
    oracle.add_constraints(encoded.set);
    oracle.count_models().unwrap()
}

#[test]
fn identical_shapes_are_ordered() {
    let instance = Instance::new(2, &[(1, 1), (1, 1)], false).unwrap();
    assert_eq!(count(&instance, 1, SymmetryConfig::none()), BigUint::from(2u32));
    let shape_order = SymmetryConfig::none().with_shape_order(true);
    assert_eq!(count(&instance, 1, shape_order), BigUint::from(1u32));
}

#[test]
fn three_block_rule() {
    let instance = Instance::new(3, &[(1, 1), (1, 1), (2, 2)], false).unwrap();
    let none = SymmetryConfig::none();
    assert_eq!(count(&instance, 2, none), BigUint::from(4u32));
    assert_eq!(count(&instance, 2, none.with_shape_order(true)), BigUint::from(2u32));
    assert_eq!(count(&instance, 2, none.with_three_block(true)), BigUint::from(2u32));
    assert_eq!(count(&instance, 2, SymmetryConfig::default()), BigUint::from(1u32));
}
