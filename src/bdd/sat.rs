use std::collections::HashMap;

use num_bigint::BigUint;

use super::{Bdd, Ref};
use crate::types::Lit;

impl Bdd {
    /// Returns one satisfying assignment for the BDD, if any exists.
    ///
    /// The assignment is a path to the true terminal, as literals over the
    /// variables met along it. Variables not on the path are unconstrained.
    ///
    /// Returns `None` if the BDD represents the constant false function.
    pub fn one_sat(&self, node: Ref) -> Option<Vec<Lit>> {
        if self.is_zero(node) {
            return None;
        }

        let mut path = Vec::new();
        let mut current = node;

        // Walk down the BDD, preferring the low branch when it is satisfiable.
        while !self.is_one(current) {
            let var = self.variable(current.index());
            let low = self.low_node(current);
            if !self.is_zero(low) {
                path.push(-Lit::positive(var));
                current = low;
            } else {
                path.push(Lit::positive(var));
                current = self.high_node(current);
            }
        }

        Some(path)
    }

    /// Number of satisfying assignments over variables `1..=num_vars`.
    pub fn sat_count(&self, node: Ref, num_vars: usize) -> BigUint {
        let mut cache = HashMap::new();
        let max = BigUint::from(1u32) << num_vars;
        self.sat_count_(node, &max, &mut cache)
    }

    fn sat_count_(&self, node: Ref, max: &BigUint, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        if self.is_zero(node) {
            return BigUint::ZERO;
        } else if self.is_one(node) {
            return max.clone();
        }

        if let Some(count) = cache.get(&node) {
            return count.clone();
        }

        // Counts are fractions of `max`: each level halves the weight.
        let low = self.low(node.index());
        let high = self.high(node.index());

        let count_low = self.sat_count_(low, max, cache);
        let count_high = self.sat_count_(high, max, cache);

        let count: BigUint = (count_low + count_high) >> 1;
        let count = if node.is_negated() { max - count } else { count };

        cache.insert(node, count.clone());
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_one_sat() {
        let bdd = Bdd::default();

        let f = bdd.mk_cube([1, -2, -3]);
        let model = bdd.one_sat(f);
        let expected: Vec<Lit> = vec![1, -2, -3].into_iter().map(Lit::from_dimacs).collect();
        assert_eq!(model, Some(expected.clone()));

        let g = bdd.apply_and(f, -bdd.mk_cube(expected.iter().map(|l| l.to_dimacs())));
        assert_eq!(bdd.one_sat(g), None);
    }

    #[test]
    fn test_one_sat_prefers_false() {
        let bdd = Bdd::default();

        let f = bdd.mk_clause([1, 2]);
        let model = bdd.one_sat(f).unwrap();
        assert_eq!(model, vec![Lit::from_dimacs(-1), Lit::from_dimacs(2)]);
    }

    #[test]
    fn test_sat_count_terminal() {
        let bdd = Bdd::default();

        assert_eq!(bdd.sat_count(bdd.zero, 3), BigUint::from(0u32));
        assert_eq!(bdd.sat_count(bdd.one, 0), BigUint::from(1u32));
        assert_eq!(bdd.sat_count(bdd.one, 3), BigUint::from(8u32));
    }

    #[test]
    fn test_sat_count_var() {
        let bdd = Bdd::default();

        let x2 = bdd.mk_var(2);
        assert_eq!(bdd.sat_count(x2, 2), BigUint::from(2u32));
        assert_eq!(bdd.sat_count(x2, 3), BigUint::from(4u32));
        assert_eq!(bdd.sat_count(-x2, 3), BigUint::from(4u32));
    }

    #[test]
    fn test_sat_count_clause() {
        let bdd = Bdd::default();

        let f = bdd.mk_clause([1, 2]);
        assert_eq!(bdd.sat_count(f, 2), BigUint::from(3u32));
        assert_eq!(bdd.sat_count(f, 4), BigUint::from(12u32));

        let g = -bdd.mk_cube([1, 2]);
        assert_eq!(bdd.sat_count(g, 2), BigUint::from(3u32));
        assert_eq!(bdd.sat_count(g, 3), BigUint::from(6u32));
    }
}
