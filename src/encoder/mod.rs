//! Translation of a packing instance into a constraint set.
//!
//! One [`Encoder`] covers every model variant: a base [`Encoding`] provides the
//! placement variables, non-overlap and containment, and a list of
//! [`Extension`]s decorate it. Each extension gets a `declare` hook, called
//! before the base constraints are built, and a `constrain` hook, called after.
//!
//! ```
//! use vlsi_rs::encoder::{Encoder, EncoderConfig, LengthBound};
//! use vlsi_rs::instance::Instance;
//!
//! let instance = Instance::new(9, &[(3, 3), (6, 6)], false).unwrap();
//! let encoder = Encoder::new(&instance, EncoderConfig::default()).unwrap();
//! let encoded = encoder.encode(LengthBound::Fixed(6)).unwrap();
//! assert_eq!(encoded.layout.circuits.len(), 2);
//! assert!(!encoded.set.assertions().is_empty());
//! ```

use log::debug;

use crate::constraint::ConstraintSet;
use crate::error::ConfigError;
use crate::formula::Formula;
use crate::instance::Instance;
use crate::types::{BoolVar, IntVar};

pub mod coords;
pub mod dual;
pub mod grid;
pub mod rotation;
pub mod symmetry;

pub use dual::DualChannelingExtension;
pub use rotation::RotationExtension;
pub use symmetry::SymmetryBreaker;

/// Base formulation of the placement.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Encoding {
    /// Integer coordinates with pairwise separation disjunctions.
    Coordinates,
    /// A boolean occupancy grid with one selector per candidate placement.
    Grid,
}

/// Board length handled by one constraint set.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LengthBound {
    /// The length is fixed to the given value.
    Fixed(u32),
    /// The length is a decision variable over the instance bounds.
    Range,
}

/// Switches for the individual symmetry-breaking rules.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SymmetryConfig {
    pub shape_order: bool,
    pub three_block: bool,
    pub anchor: bool,
}

impl Default for SymmetryConfig {
    fn default() -> Self {
        Self {
            shape_order: true,
            three_block: true,
            anchor: false,
        }
    }
}

impl SymmetryConfig {
    /// All rules disabled.
    pub fn none() -> Self {
        Self {
            shape_order: false,
            three_block: false,
            anchor: false,
        }
    }

    pub fn with_shape_order(mut self, enabled: bool) -> Self {
        self.shape_order = enabled;
        self
    }

    pub fn with_three_block(mut self, enabled: bool) -> Self {
        self.three_block = enabled;
        self
    }

    pub fn with_anchor(mut self, enabled: bool) -> Self {
        self.anchor = enabled;
        self
    }

    pub fn is_empty(&self) -> bool {
        !(self.shape_order || self.three_block || self.anchor)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct EncoderConfig {
    pub encoding: Encoding,
    pub rotation: bool,
    pub dual: bool,
    /// Add the row and column capacity bounds.
    pub implied: bool,
    pub symmetry: SymmetryConfig,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::Coordinates,
            rotation: false,
            dual: false,
            implied: true,
            symmetry: SymmetryConfig::default(),
        }
    }
}

impl EncoderConfig {
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
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
}

/// Decision variables of one circuit.
///
/// `width` and `height` are the *effective* dimensions: fixed to the intrinsic
/// ones unless rotation widens them.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CircuitVars {
    pub xhat: IntVar,
    pub yhat: IntVar,
    pub width: IntVar,
    pub height: IntVar,
    pub rotated: Option<BoolVar>,
}

/// A candidate placement of a circuit on the grid.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Selector {
    pub var: BoolVar,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub rotated: bool,
}

/// Variables owned by the grid encoding.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GridVars {
    pub rows: u32,
    pub cols: u32,
    num_circuits: usize,
    cells: Vec<BoolVar>,
    /// Candidate placements, per circuit.
    pub selectors: Vec<Vec<Selector>>,
}

impl GridVars {
    /// `board[row][col][circuit]`
    pub fn cell(&self, row: u32, col: u32, circuit: usize) -> BoolVar {
        let index = (row as usize * self.cols as usize + col as usize) * self.num_circuits + circuit;
        self.cells[index]
    }
}

/// Variable handles needed to read a placement back from an assignment.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Layout {
    pub circuits: Vec<CircuitVars>,
    pub length: IntVar,
    /// Number of rows available for placement.
    pub rows: u32,
    pub grid: Option<GridVars>,
}

impl Layout {
    pub fn has_rotation(&self) -> bool {
        self.circuits.iter().all(|c| c.rotated.is_some()) && !self.circuits.is_empty()
    }
}

/// One admissible orientation of a circuit, active when `guard` holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Orientation {
    pub guard: Formula,
    pub width: u32,
    pub height: u32,
    pub rotated: bool,
}

/// Mutable state shared by the base encoding and the extensions.
pub struct EncodingContext<'a> {
    instance: &'a Instance,
    config: &'a EncoderConfig,
    bound: LengthBound,
    pub set: ConstraintSet,
    pub layout: Layout,
}

impl<'a> EncodingContext<'a> {
    fn new(instance: &'a Instance, config: &'a EncoderConfig, bound: LengthBound) -> Self {
        let mut set = ConstraintSet::new();
        let (rows, length) = match bound {
            LengthBound::Fixed(l) => (l, set.new_int("length", l as i64, l as i64)),
            LengthBound::Range => (
                instance.max_length(),
                set.new_int(
                    "length",
                    instance.min_length() as i64,
                    instance.max_length() as i64,
                ),
            ),
        };

        let w = instance.board_width() as i64;
        let circuits = instance
            .circuits()
            .iter()
            .map(|c| CircuitVars {
                xhat: set.new_int(format!("xhat_{}", c.id), 0, w - 1),
                yhat: set.new_int(format!("yhat_{}", c.id), 0, rows as i64 - 1),
                width: set.new_int(format!("x_{}", c.id), c.width as i64, c.width as i64),
                height: set.new_int(format!("y_{}", c.id), c.height as i64, c.height as i64),
                rotated: None,
            })
            .collect();

        Self {
            instance,
            config,
            bound,
            set,
            layout: Layout {
                circuits,
                length,
                rows,
                grid: None,
            },
        }
    }

    pub fn instance(&self) -> &'a Instance {
        self.instance
    }

    pub fn config(&self) -> &'a EncoderConfig {
        self.config
    }

    pub fn bound(&self) -> LengthBound {
        self.bound
    }

    pub fn board_width(&self) -> u32 {
        self.instance.board_width()
    }

    pub fn rows(&self) -> u32 {
        self.layout.rows
    }

    pub fn vars(&self, i: usize) -> CircuitVars {
        self.layout.circuits[i]
    }

    /// Orientations circuit `i` may take, each guarded by its rotation literal.
    pub fn orientations(&self, i: usize) -> Vec<Orientation> {
        let c = self.instance.circuit(i);
        match self.layout.circuits[i].rotated {
            Some(r) if !c.is_square() => vec![
                Orientation {
                    guard: Formula::not(r),
                    width: c.width,
                    height: c.height,
                    rotated: false,
                },
                Orientation {
                    guard: Formula::Var(r),
                    width: c.height,
                    height: c.width,
                    rotated: true,
                },
            ],
            _ => vec![Orientation {
                guard: Formula::truth(),
                width: c.width,
                height: c.height,
                rotated: false,
            }],
        }
    }

    /// Static `(width, height)` pairs of circuit `i`, independent of any guard.
    pub fn shapes(&self, i: usize) -> Vec<(u32, u32)> {
        self.orientations(i).into_iter().map(|o| (o.width, o.height)).collect()
    }
}

/// A decorator over the base encoding.
pub trait Extension {
    fn name(&self) -> &'static str;

    /// Called before the base constraints: allocate or re-domain variables.
    fn declare(&self, _ctx: &mut EncodingContext<'_>) {}

    /// Called after the base constraints.
    fn constrain(&self, ctx: &mut EncodingContext<'_>);
}

/// Output of [`Encoder::encode`].
#[derive(Debug, Clone)]
pub struct Encoded {
    pub set: ConstraintSet,
    pub layout: Layout,
}

pub struct Encoder<'a> {
    instance: &'a Instance,
    config: EncoderConfig,
    extensions: Vec<Box<dyn Extension>>,
}

impl<'a> Encoder<'a> {
    /// Creates the encoder with the extensions selected by `config`.
    pub fn new(instance: &'a Instance, config: EncoderConfig) -> Result<Self, ConfigError> {
        if instance.rotation() != config.rotation {
            return Err(ConfigError::RotationMismatch);
        }

        let mut extensions: Vec<Box<dyn Extension>> = Vec::new();
        if config.rotation {
            extensions.push(Box::new(RotationExtension));
        }
        if !config.symmetry.is_empty() {
            extensions.push(Box::new(SymmetryBreaker::new(config.symmetry)));
        }
        if config.dual {
            extensions.push(Box::new(DualChannelingExtension));
        }

        Ok(Self {
            instance,
            config,
            extensions,
        })
    }

    /// Appends a custom extension, run after the configured ones.
    pub fn with_extension(mut self, extension: impl Extension + 'static) -> Self {
        self.extensions.push(Box::new(extension));
        self
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> + '_ {
        self.extensions.iter().map(|e| e.name())
    }

    pub fn encode(&self, bound: LengthBound) -> Result<Encoded, ConfigError> {
        if self.config.encoding == Encoding::Grid && bound == LengthBound::Range {
            return Err(ConfigError::GridNeedsFixedLength);
        }

        let mut ctx = EncodingContext::new(self.instance, &self.config, bound);

        for ext in &self.extensions {
            ext.declare(&mut ctx);
        }

        match self.config.encoding {
            Encoding::Coordinates => coords::encode(&mut ctx),
            Encoding::Grid => grid::encode(&mut ctx),
        }
        if self.config.implied {
            coords::implied_bounds(&mut ctx);
        }

        for ext in &self.extensions {
            ext.constrain(&mut ctx);
            debug!("extension {} applied", ext.name());
        }

        debug!(
            "encoded {:?} with {:?}: {} bools, {} ints, {} assertions",
            bound,
            self.config.encoding,
            ctx.set.num_bools(),
            ctx.set.num_ints(),
            ctx.set.assertions().len()
        );

        Ok(Encoded {
            set: ctx.set,
            layout: ctx.layout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_fixed_length_domains() {
        let instance = Instance::new(9, &[(3, 3), (6, 6)], false).unwrap();
        let encoder = Encoder::new(&instance, EncoderConfig::default()).unwrap();
        let Encoded { set, layout } = encoder.encode(LengthBound::Fixed(6)).unwrap();

        assert_eq!(layout.rows, 6);
        assert!(set.domain(layout.length).is_fixed());
        assert_eq!(set.domain(layout.length).lb, 6);
        for c in &layout.circuits {
            assert_eq!(set.domain(c.xhat).ub, 8);
            assert_eq!(set.domain(c.yhat).ub, 5);
            assert!(set.domain(c.width).is_fixed());
            assert!(c.rotated.is_none());
        }
        assert!(layout.grid.is_none());
        assert!(!layout.has_rotation());
    }

    #[test]
    fn test_range_domains() {
        let instance = Instance::new(9, &[(3, 3), (6, 6)], false).unwrap();
        let encoder = Encoder::new(&instance, EncoderConfig::default()).unwrap();
        let Encoded { set, layout } = encoder.encode(LengthBound::Range).unwrap();

        assert_eq!(layout.rows, instance.max_length());
        assert_eq!(set.domain(layout.length).lb, instance.min_length() as i64);
        assert_eq!(set.domain(layout.length).ub, instance.max_length() as i64);
    }

    #[test]
    fn test_grid_needs_fixed_length() {
        let instance = Instance::new(4, &[(4, 5)], false).unwrap();
        let config = EncoderConfig::default().with_encoding(Encoding::Grid);
        let encoder = Encoder::new(&instance, config).unwrap();
        assert_eq!(
            encoder.encode(LengthBound::Range).unwrap_err(),
            ConfigError::GridNeedsFixedLength
        );
        assert!(encoder.encode(LengthBound::Fixed(5)).is_ok());
    }

    #[test]
    fn test_rotation_mismatch() {
        let instance = Instance::new(4, &[(1, 4)], true).unwrap();
        assert!(matches!(
            Encoder::new(&instance, EncoderConfig::default()),
            Err(ConfigError::RotationMismatch)
        ));
        assert!(Encoder::new(&instance, EncoderConfig::default().with_rotation(true)).is_ok());

        let instance = Instance::new(4, &[(1, 4)], false).unwrap();
        assert!(matches!(
            Encoder::new(&instance, EncoderConfig::default().with_rotation(true)),
            Err(ConfigError::RotationMismatch)
        ));
    }

    #[test]
    fn test_extension_selection() {
        let instance = Instance::new(4, &[(1, 4), (2, 2)], true).unwrap();
        let config = EncoderConfig::default().with_rotation(true).with_dual(true);
        let encoder = Encoder::new(&instance, config).unwrap();
        let names: Vec<&str> = encoder.extensions().collect();
        assert_eq!(names, vec!["rotation", "symmetry", "dual"]);

        let config = config.with_symmetry(SymmetryConfig::none()).with_dual(false);
        let encoder = Encoder::new(&instance, config).unwrap();
        let names: Vec<&str> = encoder.extensions().collect();
        assert_eq!(names, vec!["rotation"]);
    }

    #[test]
    fn test_orientations() {
        let instance = Instance::new(4, &[(1, 3), (2, 2)], true).unwrap();
        let config = EncoderConfig::default().with_rotation(true);
        let encoder = Encoder::new(&instance, config).unwrap();
        let Encoded { layout, .. } = encoder.encode(LengthBound::Fixed(4)).unwrap();
        assert!(layout.has_rotation());

        let config = EncoderConfig::default().with_rotation(true);
        let mut ctx = EncodingContext::new(&instance, &config, LengthBound::Fixed(4));
        RotationExtension.declare(&mut ctx);
        assert_eq!(ctx.shapes(0), vec![(1, 3), (3, 1)]);
        assert_eq!(ctx.shapes(1), vec![(2, 2)]);
    }
}
