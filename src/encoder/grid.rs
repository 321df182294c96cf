//! Boolean occupancy grid.
//!
//! `board[row][col][i]` tells whether circuit `i` covers a cell. Each circuit
//! picks exactly one in-bound placement selector; a selector forces the cells
//! of its rectangle, and a covered cell needs a selector that covers it. The
//! selectors are channeled to the coordinate variables so that the symmetry,
//! rotation and dual extensions work unchanged on top of the grid.

use log::debug;

use super::{EncodingContext, GridVars, Selector};
use crate::formula::Formula;

pub fn encode(ctx: &mut EncodingContext<'_>) {
    let rows = ctx.rows();
    let cols = ctx.board_width();
    let n = ctx.layout.circuits.len();

    let mut cells = Vec::with_capacity(rows as usize * cols as usize * n);
    for row in 0..rows {
        for col in 0..cols {
            for i in 0..n {
                cells.push(ctx.set.new_bool(format!("board_{}_{}_{}", row, col, i)));
            }
        }
    }

    let mut selectors = Vec::with_capacity(n);
    for i in 0..n {
        let mut own = Vec::new();
        for o in ctx.orientations(i) {
            if o.width > cols || o.height > rows {
                continue;
            }
            for y in 0..=rows - o.height {
                for x in 0..=cols - o.width {
                    let var = ctx.set.new_bool(format!(
                        "place_{}_{}_{}{}",
                        i,
                        x,
                        y,
                        if o.rotated { "_r" } else { "" }
                    ));
                    own.push(Selector {
                        var,
                        x,
                        y,
                        width: o.width,
                        height: o.height,
                        rotated: o.rotated,
                    });
                }
            }
        }
        selectors.push(own);
    }

    let grid = GridVars {
        rows,
        cols,
        num_circuits: n,
        cells,
        selectors,
    };

    for row in 0..rows {
        for col in 0..cols {
            let occupants: Vec<Formula> =
                (0..n).map(|i| Formula::Var(grid.cell(row, col, i))).collect();
            ctx.set.assert(Formula::at_most_one(&occupants));
        }
    }

    for i in 0..n {
        let c = ctx.vars(i);
        let own = &grid.selectors[i];

        // An empty disjunction keeps an unplaceable circuit unsatisfiable.
        ctx.set.assert(Formula::or(own.iter().map(|s| Formula::Var(s.var))));

        for s in own {
            let mut implied = Vec::new();
            for row in s.y..s.y + s.height {
                for col in s.x..s.x + s.width {
                    implied.push(Formula::Var(grid.cell(row, col, i)));
                }
            }
            implied.push(Formula::eq(c.xhat, s.x as i64));
            implied.push(Formula::eq(c.yhat, s.y as i64));
            if let Some(r) = c.rotated {
                implied.push(if s.rotated {
                    Formula::Var(r)
                } else {
                    Formula::not(r)
                });
            }
            ctx.set.assert(Formula::implies(s.var, Formula::And(implied)));
        }

        for row in 0..rows {
            for col in 0..cols {
                let covering = own.iter().filter(|s| {
                    s.x <= col && col < s.x + s.width && s.y <= row && row < s.y + s.height
                });
                ctx.set.assert(Formula::implies(
                    grid.cell(row, col, i),
                    Formula::or(covering.map(|s| Formula::Var(s.var))),
                ));
            }
        }
    }

    debug!(
        "grid: {}x{} cells, {} selectors",
        rows,
        cols,
        grid.selectors.iter().map(Vec::len).sum::<usize>()
    );
    ctx.layout.grid = Some(grid);
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use crate::constraint::Assignment;
    use crate::encoder::{Encoded, Encoder, EncoderConfig, Encoding, LengthBound, SymmetryConfig};
    use crate::instance::Instance;

    fn encode_grid(instance: &Instance, l: u32) -> Encoded {
        let config = EncoderConfig::default()
            .with_encoding(Encoding::Grid)
            .with_symmetry(SymmetryConfig::none());
        Encoder::new(instance, config)
            .unwrap()
            .encode(LengthBound::Fixed(l))
            .unwrap()
    }

    /// Marks the selector at `(x, y)` and the cells it covers.
    fn select(encoded: &Encoded, a: &mut Assignment, i: usize, x: u32, y: u32) {
        let grid = encoded.layout.grid.as_ref().unwrap();
        let s = grid.selectors[i]
            .iter()
            .find(|s| s.x == x && s.y == y)
            .unwrap();
        a.set_bool(s.var, true);
        for row in y..y + s.height {
            for col in x..x + s.width {
                a.set_bool(grid.cell(row, col, i), true);
            }
        }
        a.set_int(encoded.layout.circuits[i].xhat, x as i64);
        a.set_int(encoded.layout.circuits[i].yhat, y as i64);
    }

    #[test]
    fn test_selectors_in_bounds() {
        let instance = Instance::new(3, &[(2, 1)], false).unwrap();
        let encoded = encode_grid(&instance, 2);
        let grid = encoded.layout.grid.as_ref().unwrap();
        // Two columns times two rows.
        assert_eq!(grid.selectors[0].len(), 4);
        assert!(grid.selectors[0].iter().all(|s| s.x + s.width <= 3 && s.y + s.height <= 2));
    }

    #[test]
    fn test_no_selector_when_too_tall() {
        let instance = Instance::new(3, &[(1, 3)], false).unwrap();
        let encoded = encode_grid(&instance, 2);
        let grid = encoded.layout.grid.as_ref().unwrap();
        assert!(grid.selectors[0].is_empty());
        let a = Assignment::for_set(&encoded.set);
        assert!(!encoded.set.is_satisfied_by(&a));
    }

    #[test]
    fn test_packing_satisfies() {
        let instance = Instance::new(3, &[(1, 1), (1, 1), (2, 2)], false).unwrap();
        let encoded = encode_grid(&instance, 2);
        let mut a = Assignment::for_set(&encoded.set);
        select(&encoded, &mut a, 0, 2, 0);
        select(&encoded, &mut a, 1, 2, 1);
        select(&encoded, &mut a, 2, 0, 0);
        assert!(encoded.set.is_satisfied_by(&a));
    }

    #[test]
    fn test_stray_cell_violates() {
        let instance = Instance::new(3, &[(1, 1), (1, 1), (2, 2)], false).unwrap();
        let encoded = encode_grid(&instance, 2);
        let mut a = Assignment::for_set(&encoded.set);
        select(&encoded, &mut a, 0, 2, 0);
        select(&encoded, &mut a, 1, 2, 1);
        select(&encoded, &mut a, 2, 0, 0);
        // Circuit 0 claims one more cell than its area.
        let grid = encoded.layout.grid.as_ref().unwrap();
        a.set_bool(grid.cell(1, 2, 0), true);
        assert!(!encoded.set.is_satisfied_by(&a));
    }
}
