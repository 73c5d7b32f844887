//! # Hash Subcommand
//!
//! Computes the intent hash, the message hash and the hash lock a
//! facilitator needs to locate and relay a transfer.

use anyhow::{bail, Result};
use clap::Args;
use mbus_core::{hash_lock_of, Address, Message, MessageHash, TransferIntent, B256, U256};
use serde::Serialize;

use crate::KindArg;

/// Arguments for the hash subcommand.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Intent kind.
    #[arg(long, value_enum, default_value = "stake")]
    pub kind: KindArg,

    /// Transferred amount.
    #[arg(long)]
    pub amount: U256,

    /// Recipient on the receiving ledger.
    #[arg(long)]
    pub beneficiary: Address,

    /// Address of the declaring gateway.
    #[arg(long)]
    pub gateway: Address,

    /// Account whose value is locked.
    #[arg(long)]
    pub sender: Address,

    /// Sender nonce.
    #[arg(long)]
    pub nonce: U256,

    /// Reward per gas unit.
    #[arg(long, default_value = "0")]
    pub gas_price: U256,

    /// Maximum rewarded gas units.
    #[arg(long, default_value = "0")]
    pub gas_limit: U256,

    /// Hash lock of the message.
    #[arg(long, conflicts_with = "secret")]
    pub hash_lock: Option<B256>,

    /// Unlock secret; the hash lock is derived from it.
    #[arg(long)]
    pub secret: Option<B256>,

    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Hashes derived from [`HashArgs`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HashReport {
    /// Hash of the stake or redeem intent.
    pub intent_hash: B256,
    /// keccak256 of the unlock secret, or the lock given directly.
    pub hash_lock: B256,
    /// Hash identifying the message on both ledgers.
    pub message_hash: MessageHash,
}

/// Compute the report for `args`.
pub fn compute(args: &HashArgs) -> Result<HashReport> {
    let hash_lock = match (args.hash_lock, args.secret) {
        (Some(lock), _) => lock,
        (None, Some(secret)) => hash_lock_of(&secret),
        (None, None) => bail!("one of --hash-lock or --secret is required"),
    };

    let intent = TransferIntent {
        kind: args.kind.into(),
        amount: args.amount,
        beneficiary: args.beneficiary,
        gateway: args.gateway,
    };
    let intent_hash = intent.hash();
    let message = Message {
        intent_hash,
        nonce: args.nonce,
        gas_price: args.gas_price,
        gas_limit: args.gas_limit,
        sender: args.sender,
        hash_lock,
    };
    Ok(HashReport {
        intent_hash,
        hash_lock,
        message_hash: message.hash(),
    })
}

/// Execute the hash subcommand.
pub fn run_hash(args: &HashArgs) -> Result<u8> {
    let report = compute(args)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("  intent_hash:  {}", report.intent_hash);
        println!("  hash_lock:    {}", report.hash_lock);
        println!("  message_hash: {}", report.message_hash);
    }
    Ok(0)
}
