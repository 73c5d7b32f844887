//! # mbus-state — Message State Machine
//!
//! The ledger-local half of the message bus:
//!
//! - [`MessageRegistry`]: one `{outbox, inbox}` record per message, moved
//!   only along the forward status graph.
//! - [`StateRootProvider`] / [`AnchoredRoots`]: trusted `height → root`
//!   snapshots of the counterpart ledger.
//! - [`MessageBus`]: declare, confirm, progress and revocation operations.
//!   Every claim about the counterpart ledger is authenticated by a storage
//!   proof against an anchored root.
//!
//! ## Execution Model
//!
//! Operations take `&mut self` and run to completion. The host serializes
//! calls per ledger. A failed call performs no write.

pub mod anchor;
pub mod bus;
pub mod registry;

pub use anchor::{AnchorError, AnchoredRoots, StateRootProvider};
pub use bus::{MessageBoxLayout, MessageBus};
pub use registry::{MessageRecord, MessageRegistry};
