//! # Messages and Intents
//!
//! A message carries an intent hash plus the relay parameters (nonce, gas
//! price, gas limit, sender, hash lock). Its identity is the keccak256 hash of
//! the ABI encoding of those fields, prefixed by the message typehash.
//!
//! ## Encoding
//!
//! Every field is encoded as one 32-byte big-endian word. Addresses are
//! left-padded with zeros. The typehash is the keccak256 of the canonical type
//! string, so both ledgers reproduce the same hash from the same tuple.

use alloy_primitives::{keccak256, Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Canonical type string of [`Message`].
pub const MESSAGE_TYPE: &str = concat!(
    "Message(bytes32 intentHash,uint256 nonce,uint256 gasPrice,",
    "uint256 gasLimit,address sender,bytes32 hashLock)"
);

/// Canonical type string of a stake intent.
pub const STAKE_INTENT_TYPE: &str =
    "StakeIntent(uint256 amount,address beneficiary,address gateway)";

/// Canonical type string of a redeem intent.
pub const REDEEM_INTENT_TYPE: &str =
    "RedeemIntent(uint256 amount,address beneficiary,address gateway)";

// ─── Message Hash ────────────────────────────────────────────────────

/// Content-derived identity of a message.
///
/// The zero hash is never a valid message identity; operations that take a
/// hash reject it before reading any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageHash(pub B256);

impl MessageHash {
    /// The all-zero hash.
    pub const ZERO: MessageHash = MessageHash(B256::ZERO);

    /// Whether this is the all-zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == B256::ZERO
    }

    /// Access the underlying word.
    pub fn as_b256(&self) -> &B256 {
        &self.0
    }
}

impl From<B256> for MessageHash {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

impl From<MessageHash> for B256 {
    fn from(value: MessageHash) -> Self {
        value.0
    }
}

impl std::fmt::Display for MessageHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageHash {
    type Err = <B256 as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        B256::from_str(s).map(Self)
    }
}

// ─── Intents ─────────────────────────────────────────────────────────

/// Direction of a value transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    /// Lock on the origin ledger, mint on the auxiliary ledger.
    Stake,
    /// Burn on the auxiliary ledger, release on the origin ledger.
    Redeem,
}

impl IntentKind {
    /// Canonical type string for this intent kind.
    pub fn type_string(&self) -> &'static str {
        match self {
            Self::Stake => STAKE_INTENT_TYPE,
            Self::Redeem => REDEEM_INTENT_TYPE,
        }
    }

    /// keccak256 of the type string.
    pub fn typehash(&self) -> B256 {
        keccak256(self.type_string().as_bytes())
    }

    /// Returns the kind name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stake => "stake",
            Self::Redeem => "redeem",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The value-transfer payload a message commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferIntent {
    /// Stake or redeem.
    pub kind: IntentKind,
    /// Amount of value moved, in base units.
    pub amount: U256,
    /// Recipient on the receiving ledger.
    pub beneficiary: Address,
    /// Identity of the originating orchestrator.
    pub gateway: Address,
}

impl TransferIntent {
    /// `keccak256(abi.encode(TYPEHASH, amount, beneficiary, gateway))`.
    pub fn hash(&self) -> B256 {
        keccak256(abi_encode(&[
            self.kind.typehash(),
            B256::from(self.amount.to_be_bytes::<32>()),
            self.beneficiary.into_word(),
            self.gateway.into_word(),
        ]))
    }
}

// ─── Message ─────────────────────────────────────────────────────────

/// A cross-ledger message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Hash of the [`TransferIntent`] this message carries.
    pub intent_hash: B256,
    /// Per-sender sequence number.
    pub nonce: U256,
    /// Reward per gas unit offered to the facilitator.
    pub gas_price: U256,
    /// Number of gas units rewarded at most.
    pub gas_limit: U256,
    /// Account that initiated the transfer.
    pub sender: Address,
    /// `keccak256(secret)` for the unlock secret.
    pub hash_lock: B256,
}

impl Message {
    /// Compute the content-derived [`MessageHash`].
    pub fn hash(&self) -> MessageHash {
        let typehash = keccak256(MESSAGE_TYPE.as_bytes());
        MessageHash(keccak256(abi_encode(&[
            typehash,
            self.intent_hash,
            B256::from(self.nonce.to_be_bytes::<32>()),
            B256::from(self.gas_price.to_be_bytes::<32>()),
            B256::from(self.gas_limit.to_be_bytes::<32>()),
            self.sender.into_word(),
            self.hash_lock,
        ])))
    }

    /// `gas_price * gas_limit`, saturating at `U256::MAX`.
    pub fn max_reward(&self) -> U256 {
        self.gas_price.saturating_mul(self.gas_limit)
    }

    /// Whether `secret` opens this message's hash lock.
    pub fn unlocks_with(&self, secret: &B256) -> bool {
        hash_lock_of(secret) == self.hash_lock
    }
}

/// `keccak256(secret)`.
pub fn hash_lock_of(secret: &B256) -> B256 {
    keccak256(secret.as_slice())
}

fn abi_encode(words: &[B256]) -> Vec<u8> {
    let mut out = Vec::with_capacity(words.len() * 32);
    for word in words {
        out.extend_from_slice(word.as_slice());
    }
    out
}
