//! Message bridge between sandboxed instances and the host.
//!
//! # Responsibility
//! - Carry log, runtime-error and context-menu events out of the sandbox.
//! - Dispatch them through a handler table keyed by message kind.
//!
//! # Invariants
//! - Delivery is best-effort and in order per instance; no acks, no retries.
//! - Messages from instances without a live window are dropped silently.

pub mod channel;
pub mod message;
pub mod router;

pub use channel::{BridgeHub, BridgeSender};
pub use message::{
    decode_payload, BridgeDecodeError, BridgeEnvelope, BridgeMessage, LogLevel, MessageKind,
};
pub use router::{BridgeHandler, BridgeRouter, DispatchContext, HostEvent};
