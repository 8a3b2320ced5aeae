use std::fmt;

use serde::{Deserialize, Serialize};

use crate::digest::StateDigest;

/// Identifies a checkpoint by sequence number and state digest.
///
/// Carried by the state-transfer events. The event core only moves these
/// around; deciding whether a checkpoint is stable is protocol logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckpointDescriptor {
    /// Sequence number the checkpoint was taken at.
    pub seq_no: u64,
    /// Digest of application state at `seq_no`.
    pub id: StateDigest,
}

impl CheckpointDescriptor {
    pub fn new(seq_no: u64, id: StateDigest) -> Self {
        Self { seq_no, id }
    }

    /// The genesis checkpoint: sequence zero, null digest.
    pub const fn genesis() -> Self {
        Self {
            seq_no: 0,
            id: StateDigest::null(),
        }
    }

    /// Returns `true` if this checkpoint is strictly newer than `other`.
    pub fn is_after(&self, other: &Self) -> bool {
        self.seq_no > other.seq_no
    }
}

impl fmt::Display for CheckpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "checkpoint:{}@{}", self.seq_no, self.id.short_hex())
    }
}
