//! Problem instances: the board width, the circuits and the length bounds.
//!
//! # Instance file format
//!
//! ```text
//! <board width>
//! <n>
//! <width_1> <height_1>
//! ...
//! <width_n> <height_n>
//! ```
//!
//! Every instance is validated before any constraint is built: dimensions must
//! be positive, the number of circuits must match the declared `n`, and every
//! circuit must fit the board in at least one allowed orientation.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// A rectangle to be placed on the board.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Circuit {
    pub id: usize,
    pub width: u32,
    pub height: u32,
}

impl Circuit {
    pub fn new(id: usize, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Orientations `(width, height)` whose width fits a board of the given width.
    ///
    /// The rotated orientation is only listed when rotation is allowed and the
    /// circuit is not a square.
    pub fn fitting_orientations(&self, board_width: u32, rotation: bool) -> Vec<(u32, u32)> {
        let mut res = Vec::with_capacity(2);
        if self.width <= board_width {
            res.push((self.width, self.height));
        }
        if rotation && !self.is_square() && self.height <= board_width {
            res.push((self.height, self.width));
        }
        res
    }
}

/// Error type for malformed instances.
#[derive(Debug)]
pub enum InstanceError {
    /// File I/O error.
    Io(io::Error),
    /// The input ended before all declared values were read.
    UnexpectedEof,
    /// A token could not be parsed as a non-negative integer.
    Parse { line: usize, token: String },
    /// A circuit line does not hold exactly two tokens.
    Malformed { line: usize, tokens: usize },
    /// The number of circuit lines differs from the declared count.
    CountMismatch { declared: usize, found: usize },
    /// The board width is zero.
    InvalidBoardWidth,
    /// A circuit has a zero dimension.
    NonPositiveDimension { circuit: usize },
    /// A circuit is wider than the board in every allowed orientation.
    DoesNotFit { circuit: usize, board_width: u32 },
    /// The length bounds do not fit in 32 bits.
    LengthOverflow,
}

impl From<io::Error> for InstanceError {
    fn from(e: io::Error) -> Self {
        InstanceError::Io(e)
    }
}

impl fmt::Display for InstanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceError::Io(e) => write!(f, "I/O error: {}", e),
            InstanceError::UnexpectedEof => write!(f, "Unexpected end of instance"),
            InstanceError::Parse { line, token } => {
                write!(f, "Could not parse '{}' on line {} as an integer", token, line)
            }
            InstanceError::Malformed { line, tokens } => write!(
                f,
                "Line {} should hold a width and a height, found {} tokens",
                line, tokens
            ),
            InstanceError::CountMismatch { declared, found } => write!(
                f,
                "Instance declares {} circuits but lists {}",
                declared, found
            ),
            InstanceError::InvalidBoardWidth => write!(f, "Board width must be positive"),
            InstanceError::NonPositiveDimension { circuit } => {
                write!(f, "Circuit {} has a non-positive dimension", circuit)
            }
            InstanceError::DoesNotFit { circuit, board_width } => write!(
                f,
                "Circuit {} does not fit a board of width {} in any allowed orientation",
                circuit, board_width
            ),
            InstanceError::LengthOverflow => write!(f, "Board length bounds exceed the 32-bit range"),
        }
    }
}

impl std::error::Error for InstanceError {}

/// A validated strip-packing instance.
///
/// # Invariants
///
/// - `board_width > 0` and every circuit has positive dimensions.
/// - Every circuit fits the board in some allowed orientation.
/// - `min_length <= max_length`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    board_width: u32,
    circuits: Vec<Circuit>,
    rotation: bool,
    min_length: u32,
    max_length: u32,
}

impl Instance {
    /// Validates the dimensions and derives the length bounds.
    ///
    /// `rotation` states whether circuits may be turned by 90°, which affects
    /// both the fit check and the upper bound.
    pub fn new(board_width: u32, dims: &[(u32, u32)], rotation: bool) -> Result<Self, InstanceError> {
        if board_width == 0 {
            return Err(InstanceError::InvalidBoardWidth);
        }

        let mut circuits = Vec::with_capacity(dims.len());
        let mut area = 0u64;
        let mut max_length = 0u64;
        for (id, &(w, h)) in dims.iter().enumerate() {
            if w == 0 || h == 0 {
                return Err(InstanceError::NonPositiveDimension { circuit: id });
            }
            let circuit = Circuit::new(id, w, h);
            // Stacking every circuit in its flattest fitting orientation is always feasible.
            let stacked = circuit
                .fitting_orientations(board_width, rotation)
                .into_iter()
                .map(|(_, h)| h)
                .min()
                .ok_or(InstanceError::DoesNotFit { circuit: id, board_width })?;
            area += circuit.area();
            max_length += stacked as u64;
            circuits.push(circuit);
        }

        let min_length = area.div_ceil(board_width as u64);
        debug_assert!(min_length <= max_length);
        let min_length = u32::try_from(min_length).map_err(|_| InstanceError::LengthOverflow)?;
        let max_length = u32::try_from(max_length).map_err(|_| InstanceError::LengthOverflow)?;

        Ok(Self {
            board_width,
            circuits,
            rotation,
            min_length,
            max_length,
        })
    }

    pub fn board_width(&self) -> u32 {
        self.board_width
    }

    pub fn circuits(&self) -> &[Circuit] {
        &self.circuits
    }

    pub fn circuit(&self, id: usize) -> &Circuit {
        &self.circuits[id]
    }

    pub fn len(&self) -> usize {
        self.circuits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circuits.is_empty()
    }

    /// Whether the bounds were derived with rotation allowed.
    pub fn rotation(&self) -> bool {
        self.rotation
    }

    pub fn min_length(&self) -> u32 {
        self.min_length
    }

    pub fn max_length(&self) -> u32 {
        self.max_length
    }

    pub fn total_area(&self) -> u64 {
        self.circuits.iter().map(Circuit::area).sum()
    }
}

/// Reads instances in the plain-text instance format.
///
/// # Example
///
/// ```
/// use vlsi_rs::instance::InstanceLoader;
///
/// let instance = InstanceLoader::new().load_str("9\n2\n3 3\n6 6\n").unwrap();
/// assert_eq!(instance.board_width(), 9);
/// assert_eq!(instance.min_length(), 5);
/// assert_eq!(instance.max_length(), 9);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct InstanceLoader {
    rotation: bool,
}

impl InstanceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate (and bound) the instance with rotation allowed.
    pub fn with_rotation(mut self, rotation: bool) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<Instance, InstanceError> {
        let content = fs::read_to_string(path)?;
        self.load_str(&content)
    }

    pub fn load_str(&self, content: &str) -> Result<Instance, InstanceError> {
        let mut lines = content
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let (line, text) = lines.next().ok_or(InstanceError::UnexpectedEof)?;
        let board_width = parse_token(line, text)?;
        let (line, text) = lines.next().ok_or(InstanceError::UnexpectedEof)?;
        let declared = parse_token(line, text)? as usize;

        let mut dims = Vec::with_capacity(declared);
        for (line, text) in lines {
            let tokens: Vec<&str> = text.split_whitespace().collect();
            let [w, h] = tokens[..] else {
                return Err(InstanceError::Malformed {
                    line,
                    tokens: tokens.len(),
                });
            };
            dims.push((parse_token(line, w)?, parse_token(line, h)?));
        }
        if dims.len() != declared {
            return Err(InstanceError::CountMismatch {
                declared,
                found: dims.len(),
            });
        }

        Instance::new(board_width, &dims, self.rotation)
    }
}

fn parse_token(line: usize, token: &str) -> Result<u32, InstanceError> {
    token.parse().map_err(|_| InstanceError::Parse {
        line,
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_bounds() {
        let instance = Instance::new(9, &[(3, 3), (6, 6)], false).unwrap();
        assert_eq!(instance.len(), 2);
        assert_eq!(instance.total_area(), 45);
        assert_eq!(instance.min_length(), 5);
        assert_eq!(instance.max_length(), 9);
    }

    #[test]
    fn test_bounds_with_rotation() {
        // Both tall circuits can lie flat.
        let instance = Instance::new(4, &[(1, 4), (1, 4)], true).unwrap();
        assert_eq!(instance.min_length(), 2);
        assert_eq!(instance.max_length(), 2);

        let instance = Instance::new(4, &[(1, 4), (1, 4)], false).unwrap();
        assert_eq!(instance.max_length(), 8);
    }

    #[test]
    fn test_rotation_only_fit() {
        assert!(matches!(
            Instance::new(3, &[(5, 2)], false),
            Err(InstanceError::DoesNotFit { circuit: 0, board_width: 3 })
        ));
        let instance = Instance::new(3, &[(5, 2)], true).unwrap();
        assert_eq!(instance.max_length(), 5);
    }

    #[test]
    fn test_too_wide_in_every_orientation() {
        let res = Instance::new(9, &[(10, 10)], true);
        assert!(matches!(res, Err(InstanceError::DoesNotFit { circuit: 0, .. })));
    }

    #[test]
    fn test_non_positive() {
        assert!(matches!(
            Instance::new(0, &[(1, 1)], false),
            Err(InstanceError::InvalidBoardWidth)
        ));
        assert!(matches!(
            Instance::new(4, &[(1, 1), (0, 2)], false),
            Err(InstanceError::NonPositiveDimension { circuit: 1 })
        ));
    }

    #[test]
    fn test_load_str() {
        let instance = InstanceLoader::new().load_str("4\n1\n4 5\n").unwrap();
        assert_eq!(instance.board_width(), 4);
        assert_eq!(instance.circuit(0), &Circuit::new(0, 4, 5));
        assert_eq!(instance.min_length(), 5);
        assert_eq!(instance.max_length(), 5);
    }

    #[test]
    fn test_load_count_mismatch() {
        let res = InstanceLoader::new().load_str("4\n3\n1 1\n2 2\n");
        assert!(matches!(
            res,
            Err(InstanceError::CountMismatch { declared: 3, found: 2 })
        ));
    }

    #[test]
    fn test_load_bad_token() {
        let res = InstanceLoader::new().load_str("4\n1\n1 x\n");
        match res {
            Err(InstanceError::Parse { line, token }) => {
                assert_eq!(line, 3);
                assert_eq!(token, "x");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(
            InstanceLoader::new().load_str("4\n"),
            Err(InstanceError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_load_malformed_line() {
        for (content, tokens) in [("4\n1\n3 3 7\n", 3), ("4\n1\n3\n", 1)] {
            match InstanceLoader::new().load_str(content) {
                Err(InstanceError::Malformed { line, tokens: found }) => {
                    assert_eq!(line, 3);
                    assert_eq!(found, tokens);
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }

    #[test]
    fn test_length_overflow() {
        let dims = [(1, u32::MAX), (1, u32::MAX)];
        assert!(matches!(
            Instance::new(1, &dims, false),
            Err(InstanceError::LengthOverflow)
        ));
    }
}
