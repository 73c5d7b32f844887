//! # mbus-core — Foundational Types for the Message Bus
//!
//! This crate is the leaf of the workspace DAG. It defines the identity and
//! status primitives that both ledgers must agree on bit-for-bit:
//!
//! 1. **Content-addressed messages.** A [`Message`] is identified by its
//!    [`MessageHash`], a keccak256 commitment over the ABI-encoded message
//!    fields. Two implementations computing the same tuple get the same hash.
//!
//! 2. **Two independent status fields.** Every message has an outbox status
//!    (originating ledger) and an inbox status (receiving ledger), both drawn
//!    from the five-valued [`MessageStatus`]. The numeric discriminants are the
//!    on-ledger storage encoding.
//!
//! 3. **Stable failure reasons.** [`MessageBusError`] carries the exact reason
//!    strings facilitators branch on. Each error also reports an
//!    [`ErrorKind`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `mbus-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod message;
pub mod status;

pub use error::{ErrorKind, MessageBusError, ProofError};
pub use message::{
    hash_lock_of, IntentKind, Message, MessageHash, TransferIntent, MESSAGE_TYPE,
    REDEEM_INTENT_TYPE, STAKE_INTENT_TYPE,
};
pub use status::{MessageStatus, Side};

/// Re-exported primitive types so downstream crates agree on one definition.
pub use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
