//! # Storage-Key Subcommand
//!
//! Prints the storage slot and trie key of a message's outbox or inbox
//! status, for requesting the matching proof from a ledger node.

use anyhow::Result;
use clap::Args;
use mbus_core::{MessageHash, Side, B256};
use mbus_crypto::{message_slot, message_trie_key, DEFAULT_MESSAGE_BOX_POSITION};

use crate::SideArg;

/// Arguments for the storage-key subcommand.
#[derive(Args, Debug)]
pub struct StorageKeyArgs {
    /// Message hash.
    pub message_hash: MessageHash,

    /// Which status mapping.
    #[arg(long, value_enum, default_value = "outbox")]
    pub side: SideArg,

    /// Storage position of the message box.
    #[arg(long, default_value_t = DEFAULT_MESSAGE_BOX_POSITION)]
    pub position: u64,
}

/// Slot and trie key of `hash` on `side`.
pub fn derive(hash: &MessageHash, side: Side, position: u64) -> (B256, B256) {
    (
        message_slot(position, side, hash),
        message_trie_key(position, side, hash),
    )
}

/// Execute the storage-key subcommand.
pub fn run_storage_key(args: &StorageKeyArgs) -> Result<u8> {
    let side = Side::from(args.side);
    let (slot, key) = derive(&args.message_hash, side, args.position);
    println!("  side:     {side}");
    println!("  slot:     {slot}");
    println!("  trie_key: {key}");
    Ok(0)
}
