//! Payload types for the PBFT event core.
//!
//! These are the values carried inside events: who sent a consensus message,
//! which checkpoint a state transfer concerns, and what state that checkpoint
//! commits to. The event core moves them between producers and the protocol
//! state machine without interpreting them.
//!
//! # Key Types
//!
//! - [`ReplicaId`]: Index of a replica in the network
//! - [`StateDigest`]: BLAKE3 digest of application state
//! - [`CheckpointDescriptor`]: Sequence number plus state digest
//! - [`ConsensusMessage`]: Opaque protocol message with its sender

pub mod checkpoint;
pub mod digest;
pub mod error;
pub mod message;
pub mod replica;

pub use checkpoint::CheckpointDescriptor;
pub use digest::StateDigest;
pub use error::TypeError;
pub use message::ConsensusMessage;
pub use replica::ReplicaId;
