//! Wire identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a wire within a circuit.
///
/// Wires are little-endian: wire `w` is bit `w` of a basis-state index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QubitId(pub u32);

impl QubitId {
    /// The basis-state bit mask of this wire.
    #[inline]
    pub fn mask(self) -> usize {
        1usize << self.0
    }

    /// The wire index as `usize`.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u32> for QubitId {
    fn from(id: u32) -> Self {
        QubitId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qubit_display() {
        assert_eq!(format!("{}", QubitId(0)), "q0");
        assert_eq!(format!("{}", QubitId(12)), "q12");
    }

    #[test]
    fn test_qubit_mask() {
        assert_eq!(QubitId(0).mask(), 1);
        assert_eq!(QubitId(3).mask(), 8);
        assert_eq!(QubitId::from(5).index(), 5);
    }
}
