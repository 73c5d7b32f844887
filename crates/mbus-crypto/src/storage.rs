//! # Storage Layout
//!
//! Solidity mapping slot derivation for the outbox and inbox status mappings.
//!
//! The message box sits at storage position `P`. The outbox mapping is slot
//! `P`, the inbox mapping slot `P + 1`. The status of a message on one side
//! lives at `keccak256(messageHash ‖ uint256(P + offset))`, and the storage
//! trie indexes it under `keccak256(slot)` with value `rlp(uint8(status))`.

use alloy_primitives::{keccak256, B256, U256};
use mbus_core::{MessageHash, MessageStatus, Side};

/// Storage position of the message box when none is configured.
pub const DEFAULT_MESSAGE_BOX_POSITION: u64 = 7;

/// `keccak256(key ‖ uint256(position))`, the slot of `mapping[key]`.
pub fn mapping_slot(key: &B256, position: U256) -> B256 {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(key.as_slice());
    preimage[32..].copy_from_slice(&position.to_be_bytes::<32>());
    keccak256(preimage)
}

/// Trie key of a storage slot, `keccak256(slot)`.
pub fn trie_key(slot: &B256) -> B256 {
    keccak256(slot.as_slice())
}

/// Storage slot holding the `side` status of `hash`.
pub fn message_slot(position: u64, side: Side, hash: &MessageHash) -> B256 {
    let mapping = U256::from(position) + U256::from(side.slot_offset());
    mapping_slot(hash.as_b256(), mapping)
}

/// Trie key holding the `side` status of `hash`.
pub fn message_trie_key(position: u64, side: Side, hash: &MessageHash) -> B256 {
    trie_key(&message_slot(position, side, hash))
}

/// Trie value for a stored status, `rlp(uint8(status))`.
pub fn encode_status(status: MessageStatus) -> Vec<u8> {
    alloy_rlp::encode(status.as_u8())
}
