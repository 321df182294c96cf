//! Reading placements back from an assignment.
//!
//! Coordinate encodings are read off the integer variables. Grid encodings are
//! read off the occupancy cells: each circuit's placement is the bounding box
//! of its cells, which must be completely filled.

use crate::constraint::{Assignment, ConstraintSet};
use crate::encoder::{GridVars, Layout};
use crate::error::{ConfigError, DecodeError, Result};
use crate::instance::Instance;
use crate::solution::{Placement, Solution};

pub struct SolutionDecoder<'a> {
    instance: &'a Instance,
    layout: &'a Layout,
    rotation: bool,
}

impl<'a> SolutionDecoder<'a> {
    pub fn new(instance: &'a Instance, layout: &'a Layout) -> Self {
        Self {
            instance,
            layout,
            rotation: false,
        }
    }

    /// Reads rotation flags too. Fails if the layout has none.
    pub fn with_rotation(mut self, rotation: bool) -> Result<Self, ConfigError> {
        if rotation && self.layout.circuits.iter().any(|c| c.rotated.is_none()) {
            return Err(ConfigError::RotationUnavailable);
        }
        self.rotation = rotation;
        Ok(self)
    }

    pub fn decode(&self, model: &Assignment) -> Result<Solution> {
        let placements = match &self.layout.grid {
            Some(grid) => self.decode_grid(grid, model)?,
            None => self.decode_coords(model),
        };
        let length = model.int(self.layout.length) as u32;
        Ok(Solution::new(self.instance.board_width(), length, placements))
    }

    fn decode_coords(&self, model: &Assignment) -> Vec<Placement> {
        self.layout
            .circuits
            .iter()
            .zip(self.instance.circuits())
            .map(|(v, c)| {
                let rotated = match v.rotated {
                    Some(r) if self.rotation => model.bool(r) && !c.is_square(),
                    _ => false,
                };
                Placement::new(
                    model.int(v.xhat) as u32,
                    model.int(v.yhat) as u32,
                    model.int(v.width) as u32,
                    model.int(v.height) as u32,
                )
                .rotated(rotated)
            })
            .collect()
    }

    fn decode_grid(&self, grid: &GridVars, model: &Assignment) -> Result<Vec<Placement>, DecodeError> {
        let mut placements = Vec::with_capacity(self.instance.len());
        for (i, c) in self.instance.circuits().iter().enumerate() {
            let mut count = 0u64;
            let mut bbox: Option<(u32, u32, u32, u32)> = None;
            for row in 0..grid.rows {
                for col in 0..grid.cols {
                    if !model.bool(grid.cell(row, col, i)) {
                        continue;
                    }
                    count += 1;
                    bbox = Some(match bbox {
                        None => (col, row, col, row),
                        Some((x0, y0, x1, y1)) => (x0.min(col), y0.min(row), x1.max(col), y1.max(row)),
                    });
                }
            }

            let (x0, y0, x1, y1) = bbox.ok_or(DecodeError::EmptyCircuit { circuit: i })?;
            let width = x1 - x0 + 1;
            let height = y1 - y0 + 1;
            let upright = (width, height) == (c.width, c.height);
            let turned = self.rotation && (width, height) == (c.height, c.width);
            if count != width as u64 * height as u64 || !(upright || turned) {
                return Err(DecodeError::NotRectangular { circuit: i });
            }
            placements.push(Placement::new(x0, y0, width, height).rotated(!upright));
        }
        Ok(placements)
    }
}

/// Builds the assignment describing `solution` under `layout`.
///
/// Placement, rotation, length and grid variables are set from the solution;
/// every other variable keeps its default (false, or the lower bound).
pub fn assignment_for(set: &ConstraintSet, layout: &Layout, solution: &Solution) -> Assignment {
    let mut a = Assignment::for_set(set);
    a.set_int(layout.length, solution.length() as i64);
    for (v, p) in layout.circuits.iter().zip(solution.placements()) {
        a.set_int(v.xhat, p.x as i64);
        a.set_int(v.yhat, p.y as i64);
        a.set_int(v.width, p.width as i64);
        a.set_int(v.height, p.height as i64);
        if let Some(r) = v.rotated {
            a.set_bool(r, p.rotated);
        }
    }

    if let Some(grid) = &layout.grid {
        for (i, p) in solution.placements().iter().enumerate() {
            for row in p.y..p.y + p.height {
                for col in p.x..p.x + p.width {
                    a.set_bool(grid.cell(row, col, i), true);
                }
            }
            let chosen = grid.selectors[i].iter().find(|s| {
                (s.x, s.y, s.width, s.height, s.rotated) == (p.x, p.y, p.width, p.height, p.rotated)
            });
            if let Some(s) = chosen {
                a.set_bool(s.var, true);
            }
        }
    }
    a
}
