//! Type-safe handles for decision variables and solver literals.
//!
//! Boolean and integer decision variables are plain indices into the arenas of a
//! [`ConstraintSet`][crate::constraint::ConstraintSet]. Keeping them as distinct
//! newtypes prevents mixing up the two arenas, and keeps variable lookup a
//! vector access instead of a name lookup.
use std::fmt;
use std::ops::Neg;

/// A boolean decision variable (0-indexed into its constraint set).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BoolVar(u32);

impl BoolVar {
    pub fn new(index: u32) -> Self {
        BoolVar(index)
    }

    /// Returns the position of the variable in its arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BoolVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// A bounded integer decision variable (0-indexed into its constraint set).
///
/// The domain of the variable is owned by the constraint set that created it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct IntVar(u32);

impl IntVar {
    pub fn new(index: u32) -> Self {
        IntVar(index)
    }

    /// Returns the position of the variable in its arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for IntVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

/// A propositional literal in DIMACS convention.
///
/// # Invariants
///
/// - The underlying value is never zero.
/// - `lit.var()` is 1-indexed, matching CNF files and the `splr` interface.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Lit(i32);

impl Lit {
    /// Creates a literal from a signed DIMACS integer.
    ///
    /// # Panics
    ///
    /// Panics if `value == 0`.
    pub fn from_dimacs(value: i32) -> Self {
        assert_ne!(value, 0, "Literal must be non-zero");
        Lit(value)
    }

    /// Positive literal of the given 1-indexed variable.
    pub fn positive(var: u32) -> Self {
        Self::from_dimacs(var as i32)
    }

    pub fn to_dimacs(self) -> i32 {
        self.0
    }

    /// Returns the 1-indexed variable of this literal.
    pub fn var(self) -> u32 {
        self.0.unsigned_abs()
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl Neg for Lit {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Lit(-self.0)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_positive() {
            write!(f, "x{}", self.var())
        } else {
            write!(f, "~x{}", self.var())
        }
    }
}
