//! Solved packings and the result file format.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::instance::Instance;

/// Position and effective dimensions of one circuit.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub rotated: bool,
}

impl Placement {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotated: false,
        }
    }

    pub fn rotated(mut self, rotated: bool) -> Self {
        self.rotated = rotated;
        self
    }

    /// Whether the interiors of the two rectangles intersect.
    /// Rectangles sharing an edge do not overlap.
    pub fn overlaps(&self, other: &Placement) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// A broken packing rule.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Violation {
    /// The number of placements differs from the number of circuits.
    CircuitCount { expected: usize, found: usize },
    /// The effective dimensions are not the intrinsic ones, in either order.
    Dimensions { circuit: usize },
    /// The circuit sticks out of the board.
    OutOfBoard { circuit: usize },
    /// Two circuits overlap.
    Overlap { first: usize, second: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::CircuitCount { expected, found } => {
                write!(f, "expected {} placements, found {}", expected, found)
            }
            Violation::Dimensions { circuit } => {
                write!(f, "circuit {} has wrong dimensions", circuit)
            }
            Violation::OutOfBoard { circuit } => write!(f, "circuit {} is out of the board", circuit),
            Violation::Overlap { first, second } => {
                write!(f, "circuits {} and {} overlap", first, second)
            }
        }
    }
}

impl std::error::Error for Violation {}

/// A packing of every circuit of an instance on a board of a given length.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Solution {
    board_width: u32,
    length: u32,
    placements: Vec<Placement>,
}

impl Solution {
    pub fn new(board_width: u32, length: u32, placements: Vec<Placement>) -> Self {
        Self {
            board_width,
            length,
            placements,
        }
    }

    pub fn board_width(&self) -> u32 {
        self.board_width
    }

    /// The board length the circuits were packed into.
    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn placement(&self, circuit: usize) -> &Placement {
        &self.placements[circuit]
    }

    /// Checks dimension fidelity, containment and pairwise non-overlap
    /// against `instance`.
    pub fn validate(&self, instance: &Instance) -> Result<(), Violation> {
        if self.placements.len() != instance.len() {
            return Err(Violation::CircuitCount {
                expected: instance.len(),
                found: self.placements.len(),
            });
        }

        for (i, (p, c)) in self.placements.iter().zip(instance.circuits()).enumerate() {
            let upright = (p.width, p.height) == (c.width, c.height);
            let turned = (p.width, p.height) == (c.height, c.width);
            let fits = if instance.rotation() {
                upright || turned
            } else {
                upright && !p.rotated
            };
            if !fits {
                return Err(Violation::Dimensions { circuit: i });
            }
            if p.x + p.width > self.board_width || p.y + p.height > self.length {
                return Err(Violation::OutOfBoard { circuit: i });
            }
        }

        for (i, a) in self.placements.iter().enumerate() {
            for (j, b) in self.placements.iter().enumerate().skip(i + 1) {
                if a.overlaps(b) {
                    return Err(Violation::Overlap { first: i, second: j });
                }
            }
        }

        Ok(())
    }

    /// Writes the solution in the result file format.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, self.to_string())
    }
}

/// Result file format: `W L`, then `n`, then `w h x y` per circuit.
impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.board_width, self.length)?;
        writeln!(f, "{}", self.placements.len())?;
        for p in &self.placements {
            writeln!(f, "{} {} {} {}", p.width, p.height, p.x, p.y)?;
        }
        Ok(())
    }
}
