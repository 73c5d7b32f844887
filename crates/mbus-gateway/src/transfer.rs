//! # Transfer Records
//!
//! Inputs to the gateway operations and the bookkeeping a gateway keeps per
//! in-flight message.

use mbus_core::{Address, IntentKind, Message, TransferIntent, B256, U256};
use serde::{Deserialize, Serialize};

/// Value owed to a beneficiary once a message completes.
///
/// Outgoing records are created at initiation, incoming records at intent
/// confirmation. Each is consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransfer {
    /// Recipient on the receiving ledger.
    pub beneficiary: Address,
    /// Transferred amount.
    pub amount: U256,
}

/// Facilitator bounty escrowed on the originating ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounty {
    /// Account that escrowed the bounty.
    pub payer: Address,
    /// Escrowed amount.
    pub amount: U256,
}

/// A new outgoing transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Amount to move.
    pub amount: U256,
    /// Recipient on the counterpart ledger.
    pub beneficiary: Address,
    /// Account whose value is locked.
    pub sender: Address,
    /// Reward per gas unit for the finalizing facilitator.
    pub gas_price: U256,
    /// Maximum rewarded gas units.
    pub gas_limit: U256,
    /// The sender's next outbox nonce.
    pub nonce: U256,
    /// `keccak256(secret)`.
    pub hash_lock: B256,
}

impl TransferRequest {
    /// The message this request declares on a gateway at `gateway`.
    pub fn to_message(&self, kind: IntentKind, gateway: Address) -> Message {
        let intent = TransferIntent {
            kind,
            amount: self.amount,
            beneficiary: self.beneficiary,
            gateway,
        };
        Message {
            intent_hash: intent.hash(),
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            sender: self.sender,
            hash_lock: self.hash_lock,
        }
    }
}

/// An incoming transfer as declared by the counterpart gateway.
///
/// This carries the same fields as the counterpart's [`TransferRequest`]; the
/// receiving gateway rebuilds the intent with its own view of the
/// counterpart's identity, so a proof for a message from any other gateway
/// does not match.
pub type IncomingIntent = TransferRequest;
