use std::fmt::{Display, Formatter};
use std::ops::Neg;

/// Edge to a BDD node, with the complement flag stored in the sign.
///
/// The magnitude is the index of the node in the unique table. Index 1 is the
/// terminal node, so `+1` is the constant true function and `-1` the constant
/// false one.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Ref(i32);

impl Ref {
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    pub const fn positive(index: u32) -> Self {
        Self(index as i32)
    }

    pub const fn is_negated(self) -> bool {
        self.0 < 0
    }

    /// Return the internal representation of the reference.
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Return the index of the referenced node.
    pub const fn index(self) -> u32 {
        self.0.unsigned_abs()
    }

    /// Non-negative key, distinct for `f` and `~f`.
    pub(crate) const fn key(self) -> u64 {
        ((self.0.unsigned_abs() as u64) << 1) | (self.0 < 0) as u64
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", if self.is_negated() { "~" } else { "" }, self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negation() {
        let f = Ref::positive(5);
        assert!(!f.is_negated());
        assert!((-f).is_negated());
        assert_eq!((-f).index(), 5);
        assert_eq!(-(-f), f);
        assert_ne!(f.key(), (-f).key());
        assert_eq!((-f).to_string(), "~@5");
    }
}
