//! Peak identity — sequential ids unique across a detector's lifetime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique, monotonically increasing peak identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeakId(pub u64);

impl fmt::Display for PeakId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeakId({})", self.0)
    }
}

/// Monotonic id generator. The counter is part of the detector snapshot so
/// ids stay unique across a save/load cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakIdGen {
    next: u64,
}

impl PeakIdGen {
    pub fn next_id(&mut self) -> PeakId {
        let id = PeakId(self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic() {
        let mut gen = PeakIdGen::default();
        let a = gen.next_id();
        let b = gen.next_id();
        assert!(b > a);
    }

    #[test]
    fn id_serializes_transparently() {
        assert_eq!(serde_json::to_string(&PeakId(7)).unwrap(), "7");
    }
}
