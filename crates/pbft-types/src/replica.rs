use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a replica in the consensus network.
///
/// Replicas are numbered `0..n` by the surrounding configuration; the core
/// never assigns or validates them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReplicaId(u64);

impl ReplicaId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReplicaId({})", self.0)
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "replica:{}", self.0)
    }
}

impl From<u64> for ReplicaId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_prefixed() {
        assert_eq!(format!("{}", ReplicaId::new(3)), "replica:3");
        assert_eq!(format!("{:?}", ReplicaId::new(3)), "ReplicaId(3)");
    }

    #[test]
    fn ordering_follows_index() {
        assert!(ReplicaId::new(1) < ReplicaId::new(2));
        assert_eq!(ReplicaId::from(7).get(), 7);
    }
}
