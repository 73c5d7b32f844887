//! # mbus-crypto — Storage Proof Verification
//!
//! Authenticates claims about another ledger's storage:
//!
//! - **Proof verification** ([`mpt`]): walk an ordered list of RLP-encoded
//!   Merkle-Patricia trie nodes from a trusted root and return the value at a
//!   key. Every node is hash-checked against the reference held by its parent.
//!
//! - **Node codec** ([`node`]): branch, extension and leaf decoding with
//!   hex-prefix paths and hash or inline child references.
//!
//! - **Proof container** ([`proof`]): [`StorageProof`] and its serialized
//!   single-RLP-list form.
//!
//! - **Storage layout** ([`storage`]): slot and trie-key derivation for the
//!   outbox and inbox status mappings.
//!
//! - **In-memory trie** ([`trie`]): builds roots and proofs so facilitators
//!   and simulated ledgers can produce what the verifier consumes.
//!
//! ## Crate Policy
//!
//! - Depends only on `mbus-core` internally.
//! - Verification never panics on adversarial input.

pub mod mpt;
pub mod node;
pub mod proof;
pub mod storage;
pub mod trie;

pub use mpt::{verify_proof, verify_value};
pub use node::{NodeError, NodeRef, TrieNode};
pub use proof::StorageProof;
pub use storage::{
    encode_status, mapping_slot, message_slot, message_trie_key, trie_key,
    DEFAULT_MESSAGE_BOX_POSITION,
};
pub use trie::{MemoryTrie, EMPTY_ROOT};
