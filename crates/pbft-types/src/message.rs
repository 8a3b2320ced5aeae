use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::replica::ReplicaId;

/// A consensus message as received from the network, tagged with its sender.
///
/// The payload is opaque here: decoding, authentication, and validation all
/// belong to the protocol state machine that receives it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusMessage {
    /// Replica the message arrived from.
    pub sender: ReplicaId,
    /// Encoded protocol message.
    pub payload: Bytes,
}

impl ConsensusMessage {
    pub fn new(sender: ReplicaId, payload: impl Into<Bytes>) -> Self {
        Self {
            sender,
            payload: payload.into(),
        }
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_shared_not_copied() {
        let payload = Bytes::from_static(b"prepare");
        let msg = ConsensusMessage::new(ReplicaId::new(1), payload.clone());
        assert_eq!(msg.payload.as_ptr(), payload.as_ptr());
        assert_eq!(msg.len(), 7);
        assert!(!msg.is_empty());
    }

    #[test]
    fn serde_roundtrip() {
        let msg = ConsensusMessage::new(ReplicaId::new(2), vec![1u8, 2, 3]);
        let json = serde_json::to_string(&msg).unwrap();
        let back: ConsensusMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
